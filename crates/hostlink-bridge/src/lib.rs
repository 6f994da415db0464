// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hostlink Bridge — forwards host operations to the native module and
// correlates the asynchronous native responses back to their callers.

pub mod api;
pub mod correlation;
pub mod listener;
pub mod loopback;
pub mod traits;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use tokio::task::JoinHandle;

use hostlink_core::config::BridgeConfig;

pub use api::PlatformApi;
pub use correlation::{CorrelationBridge, PendingResponse};
pub use listener::{
    DismissOutcomes, EventReceiver, EventSender, Listener, event_channel, forward_raw,
    spawn_listener,
};
pub use loopback::LoopbackModule;
pub use traits::NativeModule;

/// A bridge wired to a native module, with its event listener running.
pub struct Connection {
    pub api: Arc<PlatformApi>,
    pub listener: JoinHandle<()>,
    /// Outcomes of dismiss calls triggered by the host's `dismiss` signal.
    pub dismissals: DismissOutcomes,
}

/// Wire `native` to a new `PlatformApi` and start draining `events`.
///
/// Must be called from within a Tokio runtime.
pub fn connect(
    native: Arc<dyn NativeModule>,
    events: EventReceiver,
    config: &BridgeConfig,
) -> Connection {
    let api = Arc::new(PlatformApi::new(native, config));
    let Listener { task, dismissals } = spawn_listener(Arc::clone(&api), events);
    Connection {
        api,
        listener: task,
        dismissals,
    }
}

/// Connect to an in-process `LoopbackModule`.
///
/// Call `LoopbackModule::disconnect` to let the listener finish.
pub fn loopback_bridge(config: &BridgeConfig) -> (Connection, Arc<LoopbackModule>) {
    let (tx, rx) = event_channel();
    let module = Arc::new(LoopbackModule::new(tx, config.loopback_user.clone()));
    let connection = connect(module.clone(), rx, config);
    (connection, module)
}
