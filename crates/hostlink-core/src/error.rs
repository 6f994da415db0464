// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Hostlink.
//
// The native side never reports failure through this type: a declined
// payment or a refused app launch comes back inside the resolved payload.
// Everything here is raised by the bridge's own bookkeeping.

use thiserror::Error;

use crate::types::CorrelationId;

/// Top-level error type for all Hostlink operations.
#[derive(Debug, Error)]
pub enum HostlinkError {
    // -- Correlation --
    #[error("call {id} ({operation}) timed out waiting for a native response")]
    Timeout { id: CorrelationId, operation: String },

    #[error("call cancelled: {0}")]
    Cancelled(String),

    #[error("correlation id {0} is already pending")]
    DuplicateCorrelationId(CorrelationId),

    #[error("response channel closed before a result arrived")]
    ChannelClosed,

    // -- Native boundary --
    #[error("native bridge error: {0}")]
    Bridge(String),

    #[error("requestPayment is not available in this bridge variant")]
    PaymentsUnsupported,

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, HostlinkError>;
