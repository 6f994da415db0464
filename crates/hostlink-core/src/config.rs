// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HostlinkError, Result};

/// Persistent bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Per-call deadline in milliseconds. `None` waits for the native side
    /// forever.
    pub call_timeout_ms: Option<u64>,
    /// Whether `requestPayment` is exposed by this bridge.
    pub payments_enabled: bool,
    /// User recorded on transactions settled by the loopback module.
    pub loopback_user: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: Some(30_000),
            payments_enabled: true,
            loopback_user: "loopback-user".into(),
        }
    }
}

impl BridgeConfig {
    /// The per-call deadline, if one is configured.
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Reject settings the bridge cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.call_timeout_ms == Some(0) {
            return Err(HostlinkError::Config(
                "call_timeout_ms must be positive (use null to disable the deadline)".into(),
            ));
        }
        if self.loopback_user.trim().is_empty() {
            return Err(HostlinkError::Config("loopback_user must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BridgeConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.call_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"payments_enabled": false}"#).expect("parse");
        assert!(!config.payments_enabled);
        assert_eq!(config.call_timeout_ms, Some(30_000));
    }

    #[test]
    fn null_timeout_disables_deadline() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"call_timeout_ms": null}"#).expect("parse");
        assert_eq!(config.call_timeout(), None);
        config.validate().expect("no deadline is valid");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = BridgeConfig {
            call_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(HostlinkError::Config(_))));
    }
}
