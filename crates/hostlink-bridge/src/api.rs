// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed host operations on top of the correlation bridge.
//
// Each method is a thin specialization of `CorrelationBridge::invoke`: it
// packs its arguments into the positional `params` array the host expects
// and decodes the opaque result into a Rust type.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use hostlink_core::config::BridgeConfig;
use hostlink_core::error::{HostlinkError, Result};
use hostlink_core::types::{AppInfo, Operation, PaymentInfo, Transaction};

use crate::correlation::CorrelationBridge;
use crate::traits::NativeModule;

/// Host application operations available to in-process callers.
pub struct PlatformApi {
    bridge: CorrelationBridge,
    payments_enabled: bool,
}

impl PlatformApi {
    pub fn new(native: Arc<dyn NativeModule>, config: &BridgeConfig) -> Self {
        Self {
            bridge: CorrelationBridge::new(native, config.call_timeout()),
            payments_enabled: config.payments_enabled,
        }
    }

    /// The underlying correlation bridge (used by the event listener).
    pub fn bridge(&self) -> &CorrelationBridge {
        &self.bridge
    }

    /// Whether this bridge variant exposes `request_payment`.
    pub fn payments_enabled(&self) -> bool {
        self.payments_enabled
    }

    /// Launch a sub-application. Resolves to whether the host started it.
    #[instrument(skip(self, info), fields(app_id = %info.app_id))]
    pub async fn start_app(&self, info: &AppInfo) -> Result<bool> {
        let result = self
            .call(Operation::StartApp, vec![serde_json::to_value(info)?])
            .await?;
        decode_flag(result)
    }

    /// Close the running sub-application.
    pub async fn dismiss(&self, payload: Value) -> Result<bool> {
        let result = self.call(Operation::Dismiss, vec![payload]).await?;
        decode_flag(result)
    }

    /// Persist `value` under `key` in native storage.
    pub async fn set_item(&self, key: &str, value: &str) -> Result<bool> {
        let result = self
            .call(Operation::SetItem, vec![Value::from(key), Value::from(value)])
            .await?;
        decode_flag(result)
    }

    /// Read `key` from native storage. `None` means nothing is stored.
    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let result = self.call(Operation::GetItem, vec![Value::from(key)]).await?;
        decode(result)
    }

    /// Ask the host to settle a payment.
    ///
    /// A declined payment resolves normally with `status: failed`; only
    /// bridge-level problems are errors.
    #[instrument(skip(self, info), fields(service_id = %info.service_id, amount = info.amount))]
    pub async fn request_payment(&self, info: &PaymentInfo) -> Result<Transaction> {
        if !self.payments_enabled {
            return Err(HostlinkError::PaymentsUnsupported);
        }
        let result = self
            .call(Operation::RequestPayment, vec![serde_json::to_value(info)?])
            .await?;
        decode(result)
    }

    async fn call(&self, operation: Operation, params: Vec<Value>) -> Result<Value> {
        let result = self.bridge.invoke(operation.as_str(), params).await?;
        debug!(%operation, "native result received");
        Ok(result)
    }
}

/// Boolean results; a missing result counts as `false`.
fn decode_flag(result: Value) -> Result<bool> {
    match result {
        Value::Null => Ok(false),
        other => decode(other),
    }
}

fn decode<T: DeserializeOwned>(result: Value) -> Result<T> {
    Ok(serde_json::from_value(result)?)
}
