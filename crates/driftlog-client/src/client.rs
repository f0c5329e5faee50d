// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! The composition root: builds outgoing records, applies sampling, and
//! exposes the public capture/span/flush/close API.
//!
//! Every capture entry point (`capture_log`, `capture_error`,
//! `start_span`, `finish_span`) only mutates in-memory structures and
//! schedules work; none of them suspends the caller or surfaces delivery
//! failures. The only fallible operation is construction, which validates
//! credentials.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use tracing::debug;

use crate::breadcrumbs::{Breadcrumb, BreadcrumbBuffer};
use crate::config::Config;
use crate::error::ConfigError;
use crate::exception::serialize_error;
use crate::integrations::Integration;
use crate::logs::{LogLevel, LogRecord};
use crate::scope::Scope;
use crate::traces::span_manager::SpanManager;
use crate::traces::{generate_trace_id, Span, SpanStatus, StartSpanOptions, UNSAMPLED_SPAN_ID};
use crate::transport::{DefaultTransport, Transport};

/// Telemetry client: owns the delivery pipelines, the span lifecycle
/// manager, and the client-global breadcrumb buffer.
///
/// Construct once at startup and hand references (typically an `Arc`) to
/// request adapters; the crate deliberately provides no ambient global
/// accessor.
pub struct Client {
    config: Config,
    transport: Arc<dyn Transport>,
    span_manager: SpanManager,
    global_breadcrumbs: Mutex<BreadcrumbBuffer>,
    integrations: Mutex<Vec<Arc<dyn Integration>>>,
    initialized: AtomicBool,
}

impl Client {
    /// Builds a client with the default HTTP transport.
    ///
    /// Must be called from within a Tokio runtime; the transports spawn
    /// their periodic flush tasks here.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when neither a valid DSN nor an explicit
    /// `api_url` + `api_key` pair is configured.
    pub fn new(config: Config) -> Result<Client, ConfigError> {
        let transport = Arc::new(DefaultTransport::new(&config)?);
        Ok(Client::with_transport(config, transport))
    }

    /// Builds a client around a caller-supplied transport (used by tests
    /// and exotic deployments). Credentials are not validated.
    #[must_use]
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Client {
        let max_breadcrumbs = config.max_breadcrumbs;
        Client {
            config,
            transport,
            span_manager: SpanManager::new(),
            global_breadcrumbs: Mutex::new(BreadcrumbBuffer::new(max_breadcrumbs)),
            integrations: Mutex::new(Vec::new()),
            initialized: AtomicBool::new(true),
        }
    }

    /// False once [`close`](Client::close) has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn service(&self) -> Option<&str> {
        self.config.service.as_deref()
    }

    #[must_use]
    pub fn environment(&self) -> Option<&str> {
        self.config.environment.as_deref()
    }

    #[must_use]
    pub fn release(&self) -> Option<&str> {
        self.config.release.as_deref()
    }

    fn resolve_service(&self, scope: Option<&Scope>) -> String {
        scope
            .and_then(|s| s.service.clone())
            .or_else(|| self.config.service.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Captures one log record. Never blocks and never fails; delivery is
    /// handled entirely inside the transport.
    ///
    /// Metadata precedence, lowest to highest: call-site `metadata`, the
    /// client's `environment`/`release` tags, then the scope's tags and
    /// extras.
    pub fn capture_log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        metadata: Option<HashMap<String, serde_json::Value>>,
        scope: Option<&Scope>,
    ) {
        let mut merged = metadata.unwrap_or_default();
        if let Some(environment) = &self.config.environment {
            merged.insert(
                "environment".to_string(),
                serde_json::Value::String(environment.clone()),
            );
        }
        if let Some(release) = &self.config.release {
            merged.insert(
                "release".to_string(),
                serde_json::Value::String(release.clone()),
            );
        }
        if let Some(scope) = scope {
            merged.insert(
                "tags".to_string(),
                serde_json::to_value(&scope.tags).unwrap_or(serde_json::Value::Null),
            );
            for (key, value) in &scope.extras {
                merged.insert(key.clone(), value.clone());
            }
        }

        let breadcrumbs = match scope {
            Some(scope) => scope.breadcrumbs(),
            None => self
                .global_breadcrumbs
                .lock()
                .expect("breadcrumb buffer poisoned")
                .get_all(),
        };

        let record = LogRecord {
            service: self.resolve_service(scope),
            level,
            message: message.into(),
            time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            metadata: merged,
            trace_id: scope.map(|s| s.trace_id.clone()),
            span_id: scope.and_then(|s| s.span_id.clone()),
            breadcrumbs,
        };

        self.transport.send_logs(vec![record]);
    }

    /// Serializes an error (message, concrete type, cause chain) and
    /// captures it as an error-level log record under the `exception`
    /// metadata key.
    pub fn capture_error<E>(
        &self,
        error: &E,
        metadata: Option<HashMap<String, serde_json::Value>>,
        scope: Option<&Scope>,
    ) where
        E: std::error::Error + ?Sized,
    {
        let serialized = serialize_error(error);
        let mut merged = HashMap::from([(
            "exception".to_string(),
            serde_json::to_value(&serialized).unwrap_or(serde_json::Value::Null),
        )]);
        if let Some(metadata) = metadata {
            merged.extend(metadata);
        }
        self.capture_log(LogLevel::Error, serialized.message, Some(merged), scope);
    }

    /// Records a breadcrumb on the client-global buffer, used for records
    /// captured without a scope.
    pub fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        self.global_breadcrumbs
            .lock()
            .expect("breadcrumb buffer poisoned")
            .add(breadcrumb);
    }

    /// Snapshot of the client-global breadcrumbs, oldest first.
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.global_breadcrumbs
            .lock()
            .expect("breadcrumb buffer poisoned")
            .get_all()
    }

    /// Starts a span, applying the uniform sampling decision.
    ///
    /// Unsampled calls return a ghost span: valid shape, all-zero span
    /// id, never registered with the manager, so finishing it transmits
    /// nothing. Call sites treat both paths identically.
    pub fn start_span(&self, options: StartSpanOptions) -> Span {
        if rand::thread_rng().gen::<f64>() >= self.config.traces_sample_rate {
            return Span {
                trace_id: options.trace_id.unwrap_or_else(generate_trace_id),
                span_id: UNSAMPLED_SPAN_ID.to_string(),
                parent_span_id: options.parent_span_id,
                name: options.name,
                status: SpanStatus::Unset,
                start_time_ms: Utc::now().timestamp_millis(),
                end_time_ms: None,
                attributes: options.attributes,
            };
        }
        self.span_manager.start(options)
    }

    /// Finishes an open span and queues it for export. Unknown ids
    /// (ghost spans, double-finish) are no-ops.
    pub fn finish_span(&self, span_id: &str, status: SpanStatus) {
        if let Some(span) = self.span_manager.finish(span_id, status) {
            self.transport.send_spans(vec![span]);
        }
    }

    /// Creates a scope for one unit of work, with the supplied trace
    /// identity or a freshly generated one.
    #[must_use]
    pub fn create_scope(&self, trace_id: Option<String>) -> Scope {
        Scope::new(
            trace_id.unwrap_or_else(generate_trace_id),
            self.config.max_breadcrumbs,
        )
    }

    /// Registers an integration and runs its `setup`.
    pub fn add_integration(&self, integration: Arc<dyn Integration>) {
        debug!("Installing integration `{}`", integration.name());
        integration.setup(self);
        self.integrations
            .lock()
            .expect("integration list poisoned")
            .push(integration);
    }

    /// Drains both delivery pipelines, waiting for in-flight sends.
    /// Resolves even when the underlying sends failed.
    pub async fn flush(&self) {
        self.transport.flush().await;
    }

    /// Tears down integrations, flushes, destroys the transports, and
    /// marks the client uninitialized. Capture calls made afterwards
    /// queue into the destroyed transports (bounded) but are never sent;
    /// application wiring should gate on [`is_initialized`](Client::is_initialized).
    pub async fn close(&self) {
        let integrations: Vec<Arc<dyn Integration>> = self
            .integrations
            .lock()
            .expect("integration list poisoned")
            .drain(..)
            .collect();
        for integration in integrations {
            debug!("Tearing down integration `{}`", integration.name());
            integration.teardown();
        }

        self.flush().await;
        self.transport.destroy();
        self.initialized.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Transport;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    #[derive(Default)]
    struct RecordingTransport {
        logs: Mutex<Vec<LogRecord>>,
        spans: Mutex<Vec<Span>>,
        flushes: AtomicU32,
        destroyed: AtomicBool,
    }

    impl RecordingTransport {
        fn logs(&self) -> Vec<LogRecord> {
            self.logs.lock().unwrap().clone()
        }

        fn spans(&self) -> Vec<Span> {
            self.spans.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        fn send_logs(&self, logs: Vec<LogRecord>) {
            self.logs.lock().unwrap().extend(logs);
        }

        fn send_spans(&self, spans: Vec<Span>) {
            self.spans.lock().unwrap().extend(spans);
        }

        async fn flush(&self) {
            self.flushes.fetch_add(1, Ordering::SeqCst);
        }

        fn destroy(&self) {
            self.destroyed.store(true, Ordering::SeqCst);
        }
    }

    fn test_client(config: Config) -> (Client, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        (
            Client::with_transport(config, transport.clone()),
            transport,
        )
    }

    #[test]
    fn test_new_requires_credentials() {
        assert!(matches!(
            Client::new(Config::default()),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn test_capture_log_basic_record() {
        let (client, transport) = test_client(Config {
            service: Some("checkout".to_string()),
            ..Default::default()
        });

        client.capture_log(LogLevel::Info, "order placed", None, None);

        let logs = transport.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].service, "checkout");
        assert_eq!(logs[0].level, LogLevel::Info);
        assert_eq!(logs[0].message, "order placed");
        assert!(logs[0].trace_id.is_none());
        // RFC 3339 with millisecond precision.
        assert!(logs[0].time.ends_with('Z'));
    }

    #[test]
    fn test_capture_log_metadata_precedence() {
        let (client, transport) = test_client(Config {
            environment: Some("production".to_string()),
            release: Some("1.4.2".to_string()),
            ..Default::default()
        });

        let mut scope = client.create_scope(None);
        scope.set_tag("region", "eu-west-1");
        scope.set_extra("release", serde_json::json!("overridden-by-scope"));

        client.capture_log(
            LogLevel::Warn,
            "m",
            Some(HashMap::from([
                ("environment".to_string(), serde_json::json!("call-site")),
                ("attempt".to_string(), serde_json::json!(2)),
            ])),
            Some(&scope),
        );

        let metadata = &transport.logs()[0].metadata;
        // Client tags beat call-site metadata; scope extras beat both.
        assert_eq!(metadata["environment"], "production");
        assert_eq!(metadata["release"], "overridden-by-scope");
        assert_eq!(metadata["attempt"], 2);
        assert_eq!(metadata["tags"]["region"], "eu-west-1");
    }

    #[test]
    fn test_capture_log_attaches_scope_identity() {
        let (client, transport) = test_client(Config::default());
        let mut scope = client.create_scope(Some("4bf92f3577b34da6a3ce929d0e0e4736".to_string()));
        scope.set_span_id("00f067aa0ba902b7");

        client.capture_log(LogLevel::Info, "m", None, Some(&scope));

        let record = &transport.logs()[0];
        assert_eq!(
            record.trace_id.as_deref(),
            Some("4bf92f3577b34da6a3ce929d0e0e4736")
        );
        assert_eq!(record.span_id.as_deref(), Some("00f067aa0ba902b7"));
    }

    #[test]
    fn test_breadcrumb_source_selection() {
        let (client, transport) = test_client(Config::default());
        client.add_breadcrumb(Breadcrumb::new("global", "global crumb"));

        client.capture_log(LogLevel::Info, "no scope", None, None);
        assert_eq!(transport.logs()[0].breadcrumbs[0].message, "global crumb");

        let mut scope = client.create_scope(None);
        scope.add_breadcrumb(Breadcrumb::new("scoped", "scoped crumb"));
        client.capture_log(LogLevel::Info, "scoped", None, Some(&scope));
        let record = &transport.logs()[1];
        assert_eq!(record.breadcrumbs.len(), 1);
        assert_eq!(record.breadcrumbs[0].message, "scoped crumb");
    }

    #[test]
    fn test_capture_error_embeds_exception() {
        let (client, transport) = test_client(Config::default());
        let error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset");

        client.capture_error(&error, None, None);

        let record = &transport.logs()[0];
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.message, "peer reset");
        assert_eq!(record.metadata["exception"]["message"], "peer reset");
        assert!(record.metadata["exception"]["type"].is_string());
    }

    #[test]
    fn test_sampling_rate_zero_transmits_nothing() {
        let (client, transport) = test_client(Config {
            traces_sample_rate: 0.0,
            ..Default::default()
        });

        for _ in 0..50 {
            let span = client.start_span(StartSpanOptions::new("GET /x"));
            assert!(span.is_unsampled());
            assert_eq!(span.span_id, UNSAMPLED_SPAN_ID);
            client.finish_span(&span.span_id, SpanStatus::Ok);
        }
        assert!(transport.spans().is_empty());
        assert_eq!(client.span_manager.open_count(), 0);
    }

    #[test]
    fn test_sampling_rate_one_transmits_everything() {
        let (client, transport) = test_client(Config::default());

        for _ in 0..50 {
            let span = client.start_span(StartSpanOptions::new("GET /x"));
            assert!(!span.is_unsampled());
            client.finish_span(&span.span_id, SpanStatus::Ok);
        }
        assert_eq!(transport.spans().len(), 50);
    }

    #[test]
    fn test_finish_span_forwards_status() {
        let (client, transport) = test_client(Config::default());
        let span = client.start_span(StartSpanOptions::new("GET /x"));
        client.finish_span(&span.span_id, SpanStatus::Error);

        let sent = transport.spans();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].status, SpanStatus::Error);
        assert!(sent[0].end_time_ms.is_some());
    }

    #[test]
    fn test_create_scope_generates_trace_id() {
        let (client, _) = test_client(Config::default());
        let scope = client.create_scope(None);
        assert_eq!(scope.trace_id.len(), 32);

        let inherited =
            client.create_scope(Some("4bf92f3577b34da6a3ce929d0e0e4736".to_string()));
        assert_eq!(inherited.trace_id, "4bf92f3577b34da6a3ce929d0e0e4736");
    }

    struct TestIntegration {
        setup_calls: AtomicU32,
        teardown_calls: AtomicU32,
    }

    impl Integration for TestIntegration {
        fn name(&self) -> &'static str {
            "test"
        }

        fn setup(&self, _client: &Client) {
            self.setup_calls.fetch_add(1, Ordering::SeqCst);
        }

        fn teardown(&self) {
            self.teardown_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_close_lifecycle() {
        let (client, transport) = test_client(Config::default());
        let integration = Arc::new(TestIntegration {
            setup_calls: AtomicU32::new(0),
            teardown_calls: AtomicU32::new(0),
        });
        client.add_integration(integration.clone());
        assert_eq!(integration.setup_calls.load(Ordering::SeqCst), 1);

        assert!(client.is_initialized());
        client.close().await;

        assert_eq!(integration.teardown_calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.flushes.load(Ordering::SeqCst), 1);
        assert!(transport.destroyed.load(Ordering::SeqCst));
        assert!(!client.is_initialized());
    }

    #[tokio::test]
    async fn test_flush_delegates_to_transport() {
        let (client, transport) = test_client(Config::default());
        client.flush().await;
        assert_eq!(transport.flushes.load(Ordering::SeqCst), 1);
    }
}
