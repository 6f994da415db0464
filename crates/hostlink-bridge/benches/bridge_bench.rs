// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for call registration, response dispatch and native
// event parsing in the hostlink-bridge crate.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use hostlink_bridge::{CorrelationBridge, NativeModule};
use hostlink_core::error::Result;
use hostlink_core::types::{CallEnvelope, NativeEvent, ResponseEnvelope};

/// Native module that accepts every call and never answers.
struct SinkModule;

impl NativeModule for SinkModule {
    fn name(&self) -> &str {
        "sink"
    }

    fn request(&self, call: CallEnvelope) -> Result<()> {
        black_box(call);
        Ok(())
    }
}

fn bench_send_dispatch(c: &mut Criterion) {
    let bridge = CorrelationBridge::new(Arc::new(SinkModule), None);

    c.bench_function("send_then_dispatch", |b| {
        b.iter(|| {
            let pending = bridge
                .send("getItem", vec![json!("key")])
                .expect("send");
            let matched = bridge.dispatch(ResponseEnvelope::new(pending.id(), "value"));
            black_box(matched);
        })
    });

    c.bench_function("dispatch_unknown_id", |b| {
        let _held: Vec<_> = (0..1_000)
            .map(|_| bridge.send("getItem", vec![json!("key")]).expect("send"))
            .collect();
        b.iter(|| {
            black_box(bridge.dispatch(ResponseEnvelope::new(u64::MAX.into(), json!(null))))
        })
    });
}

fn bench_event_parsing(c: &mut Criterion) {
    let raw = r#"{"event":"RESPONSE_MESSAGE","data":{"id":1700000000000,"result":{"id":"tx-1","status":"successful"}}}"#;

    c.bench_function("parse_response_event", |b| {
        b.iter(|| {
            let event: NativeEvent = serde_json::from_str(black_box(raw)).expect("parse");
            black_box(event)
        })
    });
}

criterion_group!(benches, bench_send_dispatch, bench_event_parsing);
criterion_main!(benches);
