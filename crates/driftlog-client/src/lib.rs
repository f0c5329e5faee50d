// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! # Driftlog Client
//!
//! Telemetry client for the Driftlog collector: accepts application log
//! entries and trace spans, buffers them, and ships them over HTTP while
//! tolerating transient network failure without blocking the caller or
//! holding unbounded amounts of data.
//!
//! ## Architecture
//!
//! ```text
//!   caller ──► Client ──► (Scope enrichment) ──► BatchTransport queue
//!                                                      │
//!                                     size / timer / explicit flush
//!                                                      │
//!                                                      v
//!                                        CircuitBreaker-guarded send
//!                                                      │
//!                                                      v
//!                                              remote collector
//! ```
//!
//! Control flows downward only: nothing originating from delivery ever
//! escapes to application code. The user-visible failure surface is
//! misconfiguration at construction ([`error::ConfigError`]).
//!
//! ## Example
//!
//! ```rust,ignore
//! use driftlog_client::{Client, Config, LogLevel, SpanStatus, StartSpanOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(Config {
//!         dsn: Some("https://dl_APIKEY@ingest.example.com".to_string()),
//!         service: Some("checkout".to_string()),
//!         ..Default::default()
//!     })?;
//!
//!     let mut scope = client.create_scope(None);
//!     let span = client.start_span(StartSpanOptions::new("GET /orders"));
//!     scope.set_span_id(span.span_id.clone());
//!
//!     client.capture_log(LogLevel::Info, "order placed", None, Some(&scope));
//!     client.finish_span(&span.span_id, SpanStatus::Ok);
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

/// Bounded breadcrumb ring buffer and breadcrumb types.
pub mod breadcrumbs;

/// The composition root: capture, span, flush, and close APIs.
pub mod client;

/// Client configuration and defaults.
pub mod config;

/// DSN parsing and credential resolution.
pub mod dsn;

/// Error taxonomy for construction and delivery.
pub mod error;

/// Structured serialization of captured errors.
pub mod exception;

/// Integration registration contract.
pub mod integrations;

/// Log record types for the native ingest endpoint.
pub mod logs;

/// Per-request scope carrying trace identity, tags, and breadcrumbs.
pub mod scope;

/// Span types, lifecycle management, and trace-context propagation.
pub mod traces;

/// Batching, retry, circuit breaking, and the HTTP senders.
pub mod transport;

pub use breadcrumbs::{Breadcrumb, BreadcrumbBuffer};
pub use client::Client;
pub use config::Config;
pub use dsn::Dsn;
pub use error::{ConfigError, TransportError};
pub use exception::{serialize_error, SerializedException};
pub use integrations::Integration;
pub use logs::{LogLevel, LogRecord};
pub use scope::Scope;
pub use traces::propagation::{create_traceparent, parse_traceparent, TraceContext};
pub use traces::span_manager::SpanManager;
pub use traces::{
    generate_span_id, generate_trace_id, AttributeValue, Span, SpanStatus, StartSpanOptions,
};
pub use transport::{BatchSender, DefaultTransport, Transport};
