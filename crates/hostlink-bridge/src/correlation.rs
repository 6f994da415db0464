// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request/response correlation over the native boundary.
//
// Every outgoing call gets a `CorrelationId` and a oneshot slot in the
// pending map.  The call is then handed to the native module, and the slot is
// completed when a response carrying the same id comes back on the event
// channel.  Entries leave the map exactly once: on response, on deadline, when
// the caller stops waiting, or on shutdown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use hostlink_core::error::{HostlinkError, Result};
use hostlink_core::types::{CallEnvelope, CorrelationId, ResponseEnvelope};

use crate::traits::NativeModule;

type PendingMap = Arc<Mutex<HashMap<CorrelationId, PendingCall>>>;

/// The bridge's record of an issued but unresolved call.
struct PendingCall {
    /// Operation name, kept for logs and timeout errors.
    operation: String,
    /// Distinguishes this registration from a later one reusing the same id.
    token: u64,
    sender: oneshot::Sender<Result<Value>>,
}

/// Matches native responses to the calls that caused them.
///
/// The pending map is owned by the bridge instance; it is only reachable
/// through `send`/`invoke`/`dispatch`/`cancel_all`.
pub struct CorrelationBridge {
    native: Arc<dyn NativeModule>,
    pending: PendingMap,
    next_id: AtomicU64,
    next_token: AtomicU64,
    call_timeout: Option<Duration>,
}

impl CorrelationBridge {
    /// Create a bridge forwarding to `native`.
    ///
    /// `call_timeout` bounds how long each call waits for its response;
    /// `None` waits indefinitely.
    pub fn new(native: Arc<dyn NativeModule>, call_timeout: Option<Duration>) -> Self {
        Self {
            native,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            next_token: AtomicU64::new(1),
            call_timeout,
        }
    }

    /// Name of the native module behind this bridge.
    pub fn native_name(&self) -> &str {
        self.native.name()
    }

    /// Issue a call and wait for its result.
    pub async fn invoke(&self, name: &str, params: Vec<Value>) -> Result<Value> {
        self.send(name, params)?.wait().await
    }

    /// Issue a call under a freshly generated id.
    ///
    /// The call is registered and forwarded before this returns, so a
    /// response can be dispatched as soon as the native side produces one.
    pub fn send(&self, name: &str, params: Vec<Value>) -> Result<PendingResponse> {
        self.register_and_forward(None, name, params)
    }

    /// Issue a call under a caller-chosen id.
    ///
    /// Fails with `DuplicateCorrelationId` if that id is still pending; the
    /// existing call is left untouched.
    pub fn send_with_id(
        &self,
        id: CorrelationId,
        name: &str,
        params: Vec<Value>,
    ) -> Result<PendingResponse> {
        self.register_and_forward(Some(id), name, params)
    }

    #[instrument(skip(self, params), fields(operation = %name))]
    fn register_and_forward(
        &self,
        requested: Option<CorrelationId>,
        name: &str,
        params: Vec<Value>,
    ) -> Result<PendingResponse> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let deadline = self.call_timeout.map(|limit| Instant::now() + limit);

        let id = {
            let mut pending = lock(&self.pending);
            let id = match requested {
                Some(id) if pending.contains_key(&id) => {
                    warn!(%id, "correlation id already in flight");
                    return Err(HostlinkError::DuplicateCorrelationId(id));
                }
                Some(id) => id,
                None => self.allocate_id(&pending),
            };
            pending.insert(
                id,
                PendingCall {
                    operation: name.to_string(),
                    token,
                    sender: tx,
                },
            );
            id
        };

        let call = CallEnvelope {
            name: name.to_string(),
            params,
            id,
        };

        // The map lock is released before forwarding: a native module may
        // answer synchronously from inside `request`.
        if let Err(e) = self.native.request(call) {
            evict(&self.pending, id, token);
            warn!(%id, error = %e, "native module rejected call");
            return Err(match e {
                HostlinkError::Bridge(_) => e,
                other => HostlinkError::Bridge(other.to_string()),
            });
        }

        debug!(%id, "call forwarded to native module");
        Ok(PendingResponse {
            id,
            operation: name.to_string(),
            token,
            rx: Some(rx),
            pending: Arc::clone(&self.pending),
            deadline,
        })
    }

    /// Next counter value not currently pending.
    fn allocate_id(&self, pending: &HashMap<CorrelationId, PendingCall>) -> CorrelationId {
        loop {
            let id = CorrelationId(self.next_id.fetch_add(1, Ordering::Relaxed));
            // Explicit ids can land anywhere in the counter's range.
            if id.0 != 0 && !pending.contains_key(&id) {
                return id;
            }
        }
    }

    /// Complete the pending call matching `response.id`.
    ///
    /// Returns `false` (and changes nothing) when no such call is pending,
    /// which also covers redelivery of an already-resolved response.
    #[instrument(skip(self, response), fields(id = %response.id))]
    pub fn dispatch(&self, response: ResponseEnvelope) -> bool {
        let entry = lock(&self.pending).remove(&response.id);
        match entry {
            Some(call) => {
                debug!(operation = %call.operation, "resolving pending call");
                if call.sender.send(Ok(response.result)).is_err() {
                    debug!("caller stopped waiting before the response arrived");
                }
                true
            }
            None => {
                debug!("no pending call for response, dropping it");
                false
            }
        }
    }

    /// Fail every pending call with `Cancelled(reason)`.
    ///
    /// Returns the number of calls cancelled.
    pub fn cancel_all(&self, reason: &str) -> usize {
        let drained: Vec<(CorrelationId, PendingCall)> = lock(&self.pending).drain().collect();
        let count = drained.len();
        for (id, call) in drained {
            debug!(%id, operation = %call.operation, "cancelling pending call");
            if call
                .sender
                .send(Err(HostlinkError::Cancelled(reason.to_string())))
                .is_err()
            {
                debug!(%id, "caller stopped waiting before cancellation");
            }
        }
        if count > 0 {
            info!(count, reason, "cancelled pending calls");
        }
        count
    }

    /// Number of calls waiting for a response.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Whether a call with this id is waiting for a response.
    pub fn is_pending(&self, id: CorrelationId) -> bool {
        lock(&self.pending).contains_key(&id)
    }
}

/// Handle on one in-flight call.
///
/// Dropping it before the response arrives withdraws the call from the
/// pending map, so abandoned calls never accumulate.
pub struct PendingResponse {
    id: CorrelationId,
    operation: String,
    token: u64,
    rx: Option<oneshot::Receiver<Result<Value>>>,
    pending: PendingMap,
    /// Fixed when the call is sent, so time spent before `wait` counts.
    deadline: Option<Instant>,
}

impl PendingResponse {
    /// Correlation id the call was sent under.
    pub fn id(&self) -> CorrelationId {
        self.id
    }

    /// Wait for the native result.
    ///
    /// Fails with `Timeout` once the deadline set at send time passes (the
    /// entry is evicted first), or `Cancelled` if the bridge shut down.
    pub async fn wait(mut self) -> Result<Value> {
        let rx = self.rx.take().ok_or(HostlinkError::ChannelClosed)?;

        let received = match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, rx).await {
                Ok(received) => received,
                Err(_) => {
                    evict(&self.pending, self.id, self.token);
                    warn!(id = %self.id, operation = %self.operation, "call timed out");
                    return Err(HostlinkError::Timeout {
                        id: self.id,
                        operation: self.operation.clone(),
                    });
                }
            },
            None => rx.await,
        };

        received.map_err(|_| HostlinkError::ChannelClosed)?
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        if evict(&self.pending, self.id, self.token) {
            debug!(id = %self.id, "pending call abandoned");
        }
    }
}

/// Remove `id` only if it is still the registration identified by `token`.
fn evict(pending: &PendingMap, id: CorrelationId, token: u64) -> bool {
    let mut map = lock(pending);
    match map.get(&id) {
        Some(call) if call.token == token => {
            map.remove(&id);
            true
        }
        _ => false,
    }
}

fn lock(pending: &PendingMap) -> MutexGuard<'_, HashMap<CorrelationId, PendingCall>> {
    // The map holds no invariants a panicking holder could break halfway.
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
