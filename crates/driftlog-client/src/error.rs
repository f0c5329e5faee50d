// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for client construction and telemetry delivery.
//!
//! Only [`ConfigError`] ever reaches application code, and only at client
//! construction. Delivery failures ([`TransportError`]) stay inside the
//! transport layer: they are retried, then logged and dropped.

/// Errors raised synchronously while constructing a client from options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The DSN string could not be parsed as a URL.
    #[error("invalid DSN: {0}")]
    InvalidDsn(String),

    /// The DSN parsed, but its userinfo segment carried no API key.
    #[error("missing API key in DSN")]
    MissingApiKey,

    /// Neither a DSN nor the explicit `api_url` + `api_key` pair was given.
    #[error("either `dsn` or both `api_url` and `api_key` must be provided")]
    MissingCredentials,
}

/// A single failed batch delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The collector answered with a non-2xx status. The response body text
    /// is carried as the failure reason.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (connect, TLS, timeout, ...).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}
