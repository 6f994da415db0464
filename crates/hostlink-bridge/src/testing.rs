// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test double for the native boundary: records every call and never answers.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use hostlink_core::error::{HostlinkError, Result};
use hostlink_core::types::CallEnvelope;

use crate::traits::NativeModule;

/// Native module that only records what it was asked to do.
#[derive(Default)]
pub(crate) struct RecordingModule {
    calls: Mutex<Vec<CallEnvelope>>,
    fail: AtomicBool,
}

impl RecordingModule {
    pub(crate) fn calls(&self) -> Vec<CallEnvelope> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl NativeModule for RecordingModule {
    fn name(&self) -> &str {
        "Recording (test)"
    }

    fn request(&self, call: CallEnvelope) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HostlinkError::Bridge("native module unavailable".into()));
        }
        self.calls.lock().expect("calls lock").push(call);
        Ok(())
    }
}
