// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait for the host's native module.
//
// The bridge only ever talks to native code through `NativeModule::request`.
// Results come back later, out of band, on the event channel handed to the
// module at construction time (see `listener`).

use hostlink_core::error::Result;
use hostlink_core::types::CallEnvelope;

/// Host-side executor of bridge operations.
pub trait NativeModule: Send + Sync {
    /// Human-readable module name (e.g. "Loopback (in-process)").
    fn name(&self) -> &str;

    /// Hand a call to native code.
    ///
    /// Returns as soon as the call has been handed over; the outcome arrives
    /// later as a `NativeEvent::Response` carrying `call.id`. An `Err` here
    /// means the call never reached native code.
    fn request(&self, call: CallEnvelope) -> Result<()>;
}
