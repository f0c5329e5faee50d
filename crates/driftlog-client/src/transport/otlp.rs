// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! OTLP/HTTP JSON trace export.
//!
//! Spans are mapped to the OpenTelemetry Protocol JSON encoding:
//! timestamps become nanosecond strings (`ms * 1_000_000`), status codes
//! are 0/1/2 for unset/ok/error, and attribute values are typed as
//! `stringValue` / `intValue` / `boolValue` (int64 rendered as a string,
//! per the OTLP JSON mapping).

use async_trait::async_trait;
use serde::Serialize;

use crate::dsn::Dsn;
use crate::error::TransportError;
use crate::traces::{AttributeValue, Span, SpanStatus};
use crate::transport::BatchSender;

const SCOPE_NAME: &str = "driftlog-client";
const SCOPE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// SPAN_KIND_SERVER: every exported span models serving one request.
const SPAN_KIND_SERVER: u8 = 2;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TracePayload {
    resource_spans: Vec<ResourceSpans>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceSpans {
    resource: Resource,
    scope_spans: Vec<ScopeSpans>,
}

#[derive(Serialize)]
struct Resource {
    attributes: Vec<KeyValue>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScopeSpans {
    scope: InstrumentationScope,
    spans: Vec<OtlpSpan>,
}

#[derive(Serialize)]
struct InstrumentationScope {
    name: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OtlpSpan {
    trace_id: String,
    span_id: String,
    parent_span_id: String,
    name: String,
    kind: u8,
    start_time_unix_nano: String,
    end_time_unix_nano: String,
    attributes: Vec<KeyValue>,
    status: OtlpStatus,
}

#[derive(Serialize)]
struct OtlpStatus {
    code: u8,
}

#[derive(Serialize)]
struct KeyValue {
    key: String,
    value: AnyValue,
}

#[derive(Serialize)]
enum AnyValue {
    #[serde(rename = "stringValue")]
    Str(String),
    #[serde(rename = "intValue")]
    Int(String),
    #[serde(rename = "boolValue")]
    Bool(bool),
}

impl From<&AttributeValue> for AnyValue {
    fn from(value: &AttributeValue) -> AnyValue {
        match value {
            AttributeValue::Str(s) => AnyValue::Str(s.clone()),
            AttributeValue::Int(i) => AnyValue::Int(i.to_string()),
            AttributeValue::Bool(b) => AnyValue::Bool(*b),
        }
    }
}

fn status_code(status: SpanStatus) -> u8 {
    match status {
        SpanStatus::Unset => 0,
        SpanStatus::Ok => 1,
        SpanStatus::Error => 2,
    }
}

fn to_unix_nano(time_ms: i64) -> String {
    time_ms.saturating_mul(1_000_000).to_string()
}

fn build_trace_payload(spans: &[Span], service: &str) -> TracePayload {
    let otlp_spans = spans
        .iter()
        .map(|span| OtlpSpan {
            trace_id: span.trace_id.clone(),
            span_id: span.span_id.clone(),
            parent_span_id: span.parent_span_id.clone().unwrap_or_default(),
            name: span.name.clone(),
            kind: SPAN_KIND_SERVER,
            start_time_unix_nano: to_unix_nano(span.start_time_ms),
            // The span manager only releases finished spans; an absent end
            // time still maps to something well-formed.
            end_time_unix_nano: to_unix_nano(span.end_time_ms.unwrap_or(span.start_time_ms)),
            attributes: span
                .attributes
                .iter()
                .map(|(key, value)| KeyValue {
                    key: key.clone(),
                    value: AnyValue::from(value),
                })
                .collect(),
            status: OtlpStatus {
                code: status_code(span.status),
            },
        })
        .collect();

    TracePayload {
        resource_spans: vec![ResourceSpans {
            resource: Resource {
                attributes: vec![KeyValue {
                    key: "service.name".to_string(),
                    value: AnyValue::Str(service.to_string()),
                }],
            },
            scope_spans: vec![ScopeSpans {
                scope: InstrumentationScope {
                    name: SCOPE_NAME,
                    version: SCOPE_VERSION,
                },
                spans: otlp_spans,
            }],
        }],
    }
}

/// Sends span batches as `POST {base}/v1/otlp/traces` with the API key in
/// the `X-API-Key` header.
pub struct OtlpSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    service: String,
}

impl OtlpSender {
    #[must_use]
    pub fn new(client: reqwest::Client, dsn: &Dsn, service: String) -> OtlpSender {
        OtlpSender {
            client,
            endpoint: format!("{}/v1/otlp/traces", dsn.api_base_url),
            api_key: dsn.api_key.clone(),
            service,
        }
    }
}

#[async_trait]
impl BatchSender<Span> for OtlpSender {
    async fn send_batch(&self, batch: &[Span]) -> Result<(), TransportError> {
        if batch.is_empty() {
            return Ok(());
        }

        let payload = build_trace_payload(batch, &self.service);
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-Key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
