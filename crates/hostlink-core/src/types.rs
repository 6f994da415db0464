// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Hostlink bridge.
//
// Everything that crosses the native boundary is JSON-shaped and uses the
// camelCase field names the host platform expects.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies one in-flight call across the native boundary.
///
/// Serialized as a bare number because that is what the native module
/// echoes back in its response events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub u64);

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CorrelationId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Operations the host application understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Launch a sub-application.
    StartApp,
    /// Close the running sub-application.
    Dismiss,
    /// Persist a key-value pair in native storage.
    SetItem,
    /// Read a key from native storage.
    GetItem,
    /// Ask the host to settle a payment.
    RequestPayment,
}

impl Operation {
    /// Wire name sent in `CallEnvelope::name`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartApp => "startApp",
            Self::Dismiss => "dismiss",
            Self::SetItem => "setItem",
            Self::GetItem => "getItem",
            Self::RequestPayment => "requestPayment",
        }
    }

    /// Resolve a wire name back to an operation.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "startApp" => Some(Self::StartApp),
            "dismiss" => Some(Self::Dismiss),
            "setItem" => Some(Self::SetItem),
            "getItem" => Some(Self::GetItem),
            "requestPayment" => Some(Self::RequestPayment),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound call as handed to the native module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEnvelope {
    pub name: String,
    /// Positional arguments, in order.
    #[serde(default)]
    pub params: Vec<Value>,
    pub id: CorrelationId,
}

/// Native reply to exactly one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: CorrelationId,
    /// Opaque result; `null` when the native side sent nothing.
    #[serde(default)]
    pub result: Value,
}

impl ResponseEnvelope {
    pub fn new(id: CorrelationId, result: impl Into<Value>) -> Self {
        Self {
            id,
            result: result.into(),
        }
    }
}

/// Everything the native module can emit on its event channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum NativeEvent {
    /// Reply to a previously forwarded call.
    #[serde(rename = "RESPONSE_MESSAGE")]
    Response(ResponseEnvelope),
    /// Host-initiated request to close the sub-application. Carries no id.
    #[serde(rename = "dismiss")]
    Dismiss(Value),
}

/// Sub-application launch descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(default)]
    pub props: BTreeMap<String, String>,
}

impl AppInfo {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            debug: None,
            props: BTreeMap::new(),
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }
}

/// Payment request passed to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub service_id: String,
    pub app_id: String,
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub metadata: Value,
}

/// Settlement state reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Successful,
    Failed,
    Pending,
}

/// Payment outcome returned by `requestPayment`.
///
/// A declined payment is still a `Transaction` — with `status: failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub service_id: String,
    pub app_id: String,
    pub user: String,
    pub total: f64,
    pub sub_total: f64,
    pub paid_total: f64,
    pub discount_total: f64,
    pub tax_total: f64,
    pub currency: String,
    pub status: TransactionStatus,
    #[serde(default)]
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn call_envelope_wire_shape() {
        let call = CallEnvelope {
            name: Operation::SetItem.as_str().into(),
            params: vec![json!("theme"), json!("dark")],
            id: CorrelationId(1001),
        };
        assert_eq!(
            serde_json::to_value(&call).expect("serialize"),
            json!({"name": "setItem", "params": ["theme", "dark"], "id": 1001})
        );
    }

    #[test]
    fn response_without_result_is_null() {
        let resp: ResponseEnvelope = serde_json::from_str(r#"{"id": 3}"#).expect("parse");
        assert_eq!(resp.id, CorrelationId(3));
        assert!(resp.result.is_null());
    }

    #[test]
    fn native_events_parse_from_wire() {
        let resp: NativeEvent =
            serde_json::from_str(r#"{"event":"RESPONSE_MESSAGE","data":{"id":9,"result":true}}"#)
                .expect("parse response");
        assert_eq!(
            resp,
            NativeEvent::Response(ResponseEnvelope::new(CorrelationId(9), true))
        );

        let dismiss: NativeEvent =
            serde_json::from_str(r#"{"event":"dismiss","data":{"reason":"back"}}"#)
                .expect("parse dismiss");
        assert_eq!(dismiss, NativeEvent::Dismiss(json!({"reason": "back"})));
    }

    #[test]
    fn operation_names_round_trip() {
        for op in [
            Operation::StartApp,
            Operation::Dismiss,
            Operation::SetItem,
            Operation::GetItem,
            Operation::RequestPayment,
        ] {
            assert_eq!(Operation::from_name(op.as_str()), Some(op));
            assert_eq!(
                serde_json::to_value(op).expect("serialize"),
                json!(op.as_str())
            );
        }
        assert_eq!(Operation::from_name("reboot"), None);
    }

    #[test]
    fn app_info_omits_unset_debug() {
        let info = AppInfo::new("a1").with_prop("locale", "en");
        assert_eq!(
            serde_json::to_value(&info).expect("serialize"),
            json!({"appId": "a1", "props": {"locale": "en"}})
        );
    }

    #[test]
    fn transaction_parses_host_payload() {
        let payload = json!({
            "id": "tx-1",
            "serviceId": "svc",
            "appId": "a1",
            "user": "u1",
            "total": 12.5,
            "subTotal": 10.0,
            "paidTotal": 12.5,
            "discountTotal": 0.0,
            "taxTotal": 2.5,
            "currency": "EUR",
            "status": "failed",
            "createdAt": "2026-01-02T03:04:05Z",
            "updatedAt": "2026-01-02T03:04:06Z",
            "metadata": {"order": 42}
        });
        let tx: Transaction = serde_json::from_value(payload).expect("parse");
        assert_eq!(tx.status, TransactionStatus::Failed);
        assert!(tx.canceled_at.is_none());
        assert_eq!(tx.metadata["order"], 42);
    }
}
