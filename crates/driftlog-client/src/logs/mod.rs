// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! Log record types shipped to the collector's native ingest endpoint.
//!
//! Records are built by the client, enriched from the active scope, queued
//! in the log transport, and POSTed as `{"logs": [...]}` batches. Wire
//! field names (`trace_id`, `span_id`, `time`) follow the collector's
//! ingest contract.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::breadcrumbs::Breadcrumb;

/// Log severity, rendered lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized level name.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("unrecognized log level")]
pub struct ParseLevelError;

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<LogLevel, ParseLevelError> {
        match s {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ParseLevelError),
        }
    }
}

/// One log entry, immutable once built; queued, then discarded after
/// delivery succeeds or the retry budget is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Service the record is attributed to.
    pub service: String,
    pub level: LogLevel,
    pub message: String,
    /// ISO-8601 timestamp with millisecond precision.
    pub time: String,
    /// Merged metadata: call-site fields, client environment/release tags,
    /// then scope tags and extras, later sources winning.
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    /// Recent breadcrumbs from the scope, or the client-global buffer when
    /// no scope was given.
    pub breadcrumbs: Vec<Breadcrumb>,
}
