// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry delivery: batching, retry, circuit breaking, and the HTTP
//! senders behind them.
//!
//! # Architecture
//!
//! ```text
//!   capture_log / finish_span
//!            │ (enqueue, non-blocking)
//!            v
//!   ┌─────────────────┐     ┌─────────────────┐
//!   │ BatchTransport  │     │ BatchTransport  │
//!   │    (logs)       │     │    (spans)      │
//!   └────────┬────────┘     └────────┬────────┘
//!            │ batch                 │ batch
//!            v                       v
//!   ┌─────────────────┐     ┌─────────────────┐
//!   │ CircuitBreaker  │     │ CircuitBreaker  │
//!   └────────┬────────┘     └────────┬────────┘
//!            │ retry/backoff         │ retry/backoff
//!            v                       v
//!   ┌─────────────────┐     ┌─────────────────┐
//!   │  IngestSender   │     │   OtlpSender    │
//!   │ /api/v1/ingest  │     │ /v1/otlp/traces │
//!   └─────────────────┘     └─────────────────┘
//! ```
//!
//! The two pipelines share configuration values but nothing else: each
//! has its own queue, flush timer, and breaker.

pub mod batch;
pub mod circuit_breaker;
pub mod ingest;
pub mod otlp;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::error;

use crate::config::Config;
use crate::dsn::Dsn;
use crate::error::{ConfigError, TransportError};
use crate::logs::LogRecord;
use crate::traces::Span;

use self::batch::BatchTransport;
use self::ingest::IngestSender;
use self::otlp::OtlpSender;

/// Timeout applied to each collector request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Seam between the client and the delivery machinery.
///
/// `send_logs` and `send_spans` only enqueue and never suspend the
/// caller; `flush` suspends until queued and in-flight sends settle.
/// Custom implementations (e.g. a recording transport in tests) plug in
/// via [`Client::with_transport`](crate::client::Client::with_transport).
#[async_trait]
pub trait Transport: Send + Sync {
    fn send_logs(&self, logs: Vec<LogRecord>);

    fn send_spans(&self, spans: Vec<Span>);

    /// Drains both queues, waiting for in-flight sends. Resolves even
    /// when every underlying send failed.
    async fn flush(&self);

    /// Cancels periodic flushing and abandons queued records. Callers
    /// that need delivery must `flush()` first.
    fn destroy(&self);
}

/// Inner "send one batch" operation a [`BatchTransport`] delivers
/// through.
#[async_trait]
pub trait BatchSender<T>: Send + Sync {
    /// Delivers one batch. A non-2xx response or transport-level failure
    /// is an `Err`; the batching layer owns retries.
    async fn send_batch(&self, batch: &[T]) -> Result<(), TransportError>;
}

/// Default HTTP transport: one batching pipeline per telemetry kind.
pub struct DefaultTransport {
    logs: BatchTransport<LogRecord>,
    spans: BatchTransport<Span>,
}

impl DefaultTransport {
    /// Resolves credentials and wires both pipelines.
    ///
    /// Must be called from within a Tokio runtime: each pipeline spawns
    /// its periodic flush task at construction.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when credential resolution fails.
    pub fn new(config: &Config) -> Result<DefaultTransport, ConfigError> {
        let dsn = Dsn::resolve(config)?;
        let client = build_http_client();
        let service = config.service.clone().unwrap_or_else(|| "unknown".to_string());

        let logs = BatchTransport::new(
            "LOGS",
            Arc::new(IngestSender::new(client.clone(), &dsn)),
            config,
        );
        let spans = BatchTransport::new(
            "TRACES",
            Arc::new(OtlpSender::new(client, &dsn, service)),
            config,
        );

        Ok(DefaultTransport { logs, spans })
    }
}

#[async_trait]
impl Transport for DefaultTransport {
    fn send_logs(&self, logs: Vec<LogRecord>) {
        self.logs.enqueue(logs);
    }

    fn send_spans(&self, spans: Vec<Span>) {
        self.spans.enqueue(spans);
    }

    async fn flush(&self) {
        tokio::join!(self.logs.flush(), self.spans.flush());
    }

    fn destroy(&self) {
        self.logs.destroy();
        self.spans.destroy();
    }
}

/// Builds the shared HTTP client; falls back to reqwest defaults when the
/// configured builder fails, so construction never aborts telemetry.
fn build_http_client() -> reqwest::Client {
    match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {e}, using reqwest defaults");
            reqwest::Client::new()
        }
    }
}
