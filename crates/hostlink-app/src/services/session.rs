// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted host session: drives every bridge operation once against the
// loopback module and reports each outcome as a JSON line.

use std::io::Write;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use hostlink_bridge::loopback_bridge;
use hostlink_core::error::{HostlinkError, Result};
use hostlink_core::types::{AppInfo, PaymentInfo};
use hostlink_core::BridgeConfig;

/// One line of session output.
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    fn from_outcome<T: Serialize>(step: &'static str, outcome: Result<T>) -> Self {
        match outcome.and_then(|value| Ok(serde_json::to_value(value)?)) {
            Ok(value) => Self {
                step,
                result: Some(value),
                error: None,
            },
            Err(e) => {
                warn!(step, error = %e, "session step failed");
                Self {
                    step,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Options for one scripted session.
pub struct SessionOptions {
    pub app_id: String,
    pub item_key: String,
    pub item_value: String,
    pub amount: f64,
    pub currency: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            app_id: "demo-app".into(),
            item_key: "greeting".into(),
            item_value: "hello".into(),
            amount: 4.5,
            currency: "EUR".into(),
        }
    }
}

/// Run the session and return one report per step.
pub async fn run_session(config: &BridgeConfig, options: &SessionOptions) -> Vec<StepReport> {
    let (mut connection, module) = loopback_bridge(config);
    let api = connection.api.clone();
    info!(native = api.bridge().native_name(), "session started");

    let mut reports = Vec::new();

    let launched = api.start_app(&AppInfo::new(&options.app_id)).await;
    reports.push(StepReport::from_outcome("startApp", launched));

    let stored = api.set_item(&options.item_key, &options.item_value).await;
    reports.push(StepReport::from_outcome("setItem", stored));

    let read_back = api.get_item(&options.item_key).await;
    reports.push(StepReport::from_outcome("getItem", read_back));

    let missing = api.get_item(&format!("{}.unset", options.item_key)).await;
    reports.push(StepReport::from_outcome("getItem(unset)", missing));

    if api.payments_enabled() {
        let payment = PaymentInfo {
            service_id: "hostlink-demo".into(),
            app_id: options.app_id.clone(),
            amount: options.amount,
            currency: options.currency.clone(),
            metadata: json!({"source": "session"}),
        };
        let settled = api.request_payment(&payment).await;
        reports.push(StepReport::from_outcome("requestPayment", settled));
    }

    // Host-initiated dismiss: the listener turns it into a dismiss call and
    // reports that call's outcome.
    let dismissed = match module.raise_dismiss(json!({"reason": "session-end"})) {
        Ok(()) => connection
            .dismissals
            .recv()
            .await
            .unwrap_or(Err(HostlinkError::ChannelClosed)),
        Err(e) => Err(e),
    };
    reports.push(StepReport::from_outcome("dismiss(host)", dismissed));

    module.disconnect();
    if let Err(e) = connection.listener.await {
        warn!(error = %e, "event listener ended abnormally");
    }
    info!(steps = reports.len(), "session finished");
    reports
}

/// Write each report as a JSON line.
pub fn write_reports(out: &mut impl Write, reports: &[StepReport]) -> Result<()> {
    for report in reports {
        serde_json::to_writer(&mut *out, report)?;
        writeln!(out).map_err(HostlinkError::Io)?;
    }
    Ok(())
}
