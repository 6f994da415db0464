// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native event channel and the task that drains it.
//
// Native code holds the sending half and emits one `RESPONSE_MESSAGE` per
// call, plus the occasional unsolicited `dismiss`.  The listener owns the
// receiving half: responses go straight to `CorrelationBridge::dispatch`, and
// each `dismiss` signal becomes an ordinary `PlatformApi::dismiss` call whose
// outcome is reported on the listener's dismissal channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hostlink_core::error::{HostlinkError, Result};
use hostlink_core::types::NativeEvent;

use crate::api::PlatformApi;

pub type EventSender = mpsc::UnboundedSender<NativeEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<NativeEvent>;

/// Results of the dismiss calls made on behalf of host `dismiss` signals.
pub type DismissOutcomes = mpsc::UnboundedReceiver<Result<bool>>;

/// A running listener task.
pub struct Listener {
    pub task: JoinHandle<()>,
    /// One entry per host `dismiss` signal, in completion order.
    pub dismissals: DismissOutcomes,
}

/// Create the channel native code reports on.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Parse a raw JSON event (as delivered by a string-based native emitter)
/// and push it onto the channel.
pub fn forward_raw(events: &EventSender, raw: &str) -> Result<()> {
    let event: NativeEvent = serde_json::from_str(raw)?;
    events.send(event).map_err(|_| HostlinkError::ChannelClosed)
}

/// Spawn the task that delivers native events to `api`.
///
/// The task ends when every sender is dropped; calls still pending at that
/// point are cancelled, since nothing can answer them any more.
pub fn spawn_listener(api: Arc<PlatformApi>, mut events: EventReceiver) -> Listener {
    let (outcomes, dismissals) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        info!(native = api.bridge().native_name(), "native event listener started");
        while let Some(event) = events.recv().await {
            handle_event(&api, &outcomes, event);
        }
        api.bridge().cancel_all("native event channel closed");
        info!("native event listener stopped");
    });
    Listener { task, dismissals }
}

fn handle_event(
    api: &Arc<PlatformApi>,
    outcomes: &mpsc::UnboundedSender<Result<bool>>,
    event: NativeEvent,
) {
    match event {
        NativeEvent::Response(response) => {
            api.bridge().dispatch(response);
        }
        NativeEvent::Dismiss(payload) => {
            // The dismiss call's own response arrives on this same channel,
            // so it must not be awaited here.
            info!("host requested dismiss");
            let api = Arc::clone(api);
            let outcomes = outcomes.clone();
            tokio::spawn(async move {
                let outcome = api.dismiss(payload).await;
                match &outcome {
                    Ok(closed) => debug!(closed, "host-initiated dismiss completed"),
                    Err(e) => warn!(error = %e, "host-initiated dismiss failed"),
                }
                if outcomes.send(outcome).is_err() {
                    debug!("no one is watching dismiss outcomes");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingModule;
    use hostlink_core::config::BridgeConfig;
    use hostlink_core::types::{CorrelationId, ResponseEnvelope};
    use serde_json::json;

    async fn until<F: Fn() -> bool>(condition: F) {
        while !condition() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn responses_are_dispatched() {
        let native = Arc::new(RecordingModule::default());
        let api = Arc::new(PlatformApi::new(native.clone(), &BridgeConfig::default()));
        let (tx, rx) = event_channel();
        let listener = spawn_listener(api.clone(), rx);

        let pending = api
            .bridge()
            .send_with_id(CorrelationId(1001), "getItem", vec![json!("k")])
            .expect("send");
        forward_raw(
            &tx,
            r#"{"event":"RESPONSE_MESSAGE","data":{"id":1001,"result":"v"}}"#,
        )
        .expect("forward");

        assert_eq!(pending.wait().await.expect("result"), json!("v"));
        drop(tx);
        listener.task.await.expect("listener");
    }

    #[tokio::test]
    async fn dismiss_signal_becomes_a_dismiss_call() {
        let native = Arc::new(RecordingModule::default());
        let api = Arc::new(PlatformApi::new(native.clone(), &BridgeConfig::default()));
        let (tx, rx) = event_channel();
        let mut listener = spawn_listener(api.clone(), rx);

        tx.send(NativeEvent::Dismiss(json!({"reason": "back"})))
            .expect("send dismiss");
        until(|| !native.calls().is_empty()).await;

        let call = native.calls().remove(0);
        assert_eq!(call.name, "dismiss");
        assert_eq!(call.params, vec![json!({"reason": "back"})]);

        tx.send(NativeEvent::Response(ResponseEnvelope::new(call.id, true)))
            .expect("send response");
        let outcome = listener.dismissals.recv().await.expect("dismiss outcome");
        assert!(outcome.expect("dismiss result"));
        assert_eq!(api.bridge().pending_count(), 0);
    }

    #[tokio::test]
    async fn rejected_dismiss_is_reported() {
        let native = Arc::new(RecordingModule::default());
        native.fail_requests(true);
        let api = Arc::new(PlatformApi::new(native.clone(), &BridgeConfig::default()));
        let (tx, rx) = event_channel();
        let mut listener = spawn_listener(api.clone(), rx);

        tx.send(NativeEvent::Dismiss(json!(null))).expect("send dismiss");
        let outcome = listener.dismissals.recv().await.expect("dismiss outcome");
        assert!(matches!(outcome, Err(HostlinkError::Bridge(_))));
    }

    #[tokio::test]
    async fn closing_the_channel_cancels_pending_calls() {
        let native = Arc::new(RecordingModule::default());
        let api = Arc::new(PlatformApi::new(native.clone(), &BridgeConfig::default()));
        let (tx, rx) = event_channel();
        let listener = spawn_listener(api.clone(), rx);

        let pending = api.bridge().send("getItem", vec![json!("k")]).expect("send");
        drop(tx);
        listener.task.await.expect("listener");

        let err = pending.wait().await.err().expect("cancelled");
        assert!(matches!(err, HostlinkError::Cancelled(_)));
    }

    #[test]
    fn malformed_raw_event_is_rejected() {
        let (tx, _rx) = event_channel();
        let err = forward_raw(&tx, r#"{"event":"RESPONSE_MESSAGE"}"#)
            .err()
            .expect("missing data");
        assert!(matches!(err, HostlinkError::Serialization(_)));

        let err = forward_raw(&tx, "not json").err().expect("not json");
        assert!(matches!(err, HostlinkError::Serialization(_)));
    }
}
