// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process native module for desktop/CI builds where no host platform is
// present.
//
// It honours the same contract a real host module must: every call is
// answered with exactly one `RESPONSE_MESSAGE` on the event channel, and
// operation-level failure is encoded in the result, never as an error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use hostlink_core::error::{HostlinkError, Result};
use hostlink_core::types::{
    AppInfo, CallEnvelope, NativeEvent, Operation, PaymentInfo, ResponseEnvelope, Transaction,
    TransactionStatus,
};

use crate::listener::EventSender;
use crate::traits::NativeModule;

/// Native module that executes every operation in memory.
pub struct LoopbackModule {
    events: Mutex<Option<EventSender>>,
    store: Mutex<HashMap<String, String>>,
    running_app: Mutex<Option<String>>,
    user: String,
    hold_responses: AtomicBool,
}

impl LoopbackModule {
    /// Create a module that answers on `events` and records `user` on
    /// settled transactions.
    pub fn new(events: EventSender, user: impl Into<String>) -> Self {
        Self {
            events: Mutex::new(Some(events)),
            store: Mutex::new(HashMap::new()),
            running_app: Mutex::new(None),
            user: user.into(),
            hold_responses: AtomicBool::new(false),
        }
    }

    /// Emit an unsolicited `dismiss` event, as the host does when the user
    /// closes the sub-application from native UI.
    pub fn raise_dismiss(&self, payload: Value) -> Result<()> {
        info!("host-initiated dismiss");
        self.emit(NativeEvent::Dismiss(payload))
    }

    /// While set, calls are executed but never answered.
    pub fn hold_responses(&self, hold: bool) {
        self.hold_responses.store(hold, Ordering::SeqCst);
    }

    /// Id of the sub-application currently running, if any.
    pub fn running_app(&self) -> Option<String> {
        lock(&self.running_app).clone()
    }

    /// Drop the event sender so the bridge's listener can finish.
    pub fn disconnect(&self) {
        if lock(&self.events).take().is_some() {
            debug!("loopback module disconnected from event channel");
        }
    }

    fn emit(&self, event: NativeEvent) -> Result<()> {
        let events = lock(&self.events);
        let sender = events
            .as_ref()
            .ok_or_else(|| HostlinkError::Bridge("loopback module is disconnected".into()))?;
        sender
            .send(event)
            .map_err(|_| HostlinkError::Bridge("event listener has gone away".into()))
    }

    fn execute(&self, call: &CallEnvelope) -> Value {
        let Some(operation) = Operation::from_name(&call.name) else {
            warn!(name = %call.name, "unknown operation, answering null");
            return Value::Null;
        };

        match operation {
            Operation::StartApp => Value::Bool(self.start_app(call.params.first())),
            Operation::Dismiss => Value::Bool(lock(&self.running_app).take().is_some()),
            Operation::SetItem => {
                match (string_param(call, 0), string_param(call, 1)) {
                    (Some(key), Some(value)) => {
                        lock(&self.store).insert(key.to_string(), value.to_string());
                        Value::Bool(true)
                    }
                    _ => Value::Bool(false),
                }
            }
            Operation::GetItem => string_param(call, 0)
                .and_then(|key| lock(&self.store).get(key).cloned())
                .map_or(Value::Null, Value::String),
            Operation::RequestPayment => self.settle(call.params.first()),
        }
    }

    fn start_app(&self, param: Option<&Value>) -> bool {
        let info = param.and_then(|p| serde_json::from_value::<AppInfo>(p.clone()).ok());
        match info {
            Some(info) if !info.app_id.trim().is_empty() => {
                info!(app_id = %info.app_id, "sub-application started");
                *lock(&self.running_app) = Some(info.app_id);
                true
            }
            _ => {
                warn!("startApp without a usable app descriptor");
                false
            }
        }
    }

    fn settle(&self, param: Option<&Value>) -> Value {
        let Some(info) = param.and_then(|p| serde_json::from_value::<PaymentInfo>(p.clone()).ok())
        else {
            warn!("requestPayment without a usable payment descriptor");
            return Value::Null;
        };

        let accepted = info.amount.is_finite()
            && info.amount > 0.0
            && info.currency.len() == 3
            && info.currency.chars().all(|c| c.is_ascii_alphabetic());
        let status = if accepted {
            TransactionStatus::Successful
        } else {
            TransactionStatus::Failed
        };
        let now = Utc::now();

        let tx = Transaction {
            id: Uuid::new_v4().to_string(),
            service_id: info.service_id,
            app_id: info.app_id,
            user: self.user.clone(),
            total: info.amount,
            sub_total: info.amount,
            paid_total: if accepted { info.amount } else { 0.0 },
            discount_total: 0.0,
            tax_total: 0.0,
            currency: info.currency.to_ascii_uppercase(),
            status,
            canceled_at: None,
            created_at: now,
            updated_at: now,
            metadata: info.metadata,
        };
        info!(tx_id = %tx.id, status = ?tx.status, "payment settled");

        match serde_json::to_value(&tx) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "could not encode transaction");
                Value::Null
            }
        }
    }
}

impl NativeModule for LoopbackModule {
    fn name(&self) -> &str {
        "Loopback (in-process)"
    }

    #[instrument(skip(self, call), fields(id = %call.id, operation = %call.name))]
    fn request(&self, call: CallEnvelope) -> Result<()> {
        let result = self.execute(&call);
        if self.hold_responses.load(Ordering::SeqCst) {
            debug!("holding response");
            return Ok(());
        }
        self.emit(NativeEvent::Response(ResponseEnvelope::new(call.id, result)))
    }
}

fn string_param(call: &CallEnvelope, index: usize) -> Option<&str> {
    call.params.get(index).and_then(Value::as_str)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
