// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! Trace span types, identifier generation, and context propagation.
//!
//! Spans are independent timed records linked only by `trace_id` /
//! `parent_span_id`; no nesting discipline is enforced and overlapping
//! spans are expected. An open span (no end time) never leaves the
//! process; [`span_manager::SpanManager::finish`] is the only way to
//! obtain a transmittable span.

pub mod propagation;
pub mod span_manager;

use std::collections::HashMap;

use rand::Rng;

/// Span identifier reserved for unsampled ("ghost") spans. Never produced
/// by the generator and never registered with the span manager.
pub const UNSAMPLED_SPAN_ID: &str = "0000000000000000";

/// Terminal state of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpanStatus {
    #[default]
    Unset,
    Ok,
    Error,
}

/// Typed span attribute value: the OTLP wire format carries strings,
/// 64-bit integers, and booleans.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> AttributeValue {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> AttributeValue {
        AttributeValue::Str(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> AttributeValue {
        AttributeValue::Int(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> AttributeValue {
        AttributeValue::Bool(value)
    }
}

/// A timed, named unit of work.
///
/// `end_time_ms == None` means the span is still open and must not be
/// transmitted. Once finished the span is detached from the manager and
/// never mutated again.
#[derive(Debug, Clone)]
pub struct Span {
    /// 32 lowercase hex characters.
    pub trace_id: String,
    /// 16 lowercase hex characters.
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub status: SpanStatus,
    /// Milliseconds since the Unix epoch.
    pub start_time_ms: i64,
    /// Set exactly once, by `finish`; always `>= start_time_ms`.
    pub end_time_ms: Option<i64>,
    pub attributes: HashMap<String, AttributeValue>,
}

impl Span {
    /// Whether this span is the unrecorded product of a negative sampling
    /// decision.
    #[must_use]
    pub fn is_unsampled(&self) -> bool {
        self.span_id == UNSAMPLED_SPAN_ID
    }
}

/// Options for starting a span.
#[derive(Debug, Clone, Default)]
pub struct StartSpanOptions {
    pub name: String,
    /// Inherited trace identity; a fresh one is generated when absent.
    pub trace_id: Option<String>,
    pub parent_span_id: Option<String>,
    pub attributes: HashMap<String, AttributeValue>,
}

impl StartSpanOptions {
    #[must_use]
    pub fn new(name: impl Into<String>) -> StartSpanOptions {
        StartSpanOptions {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> StartSpanOptions {
        self.trace_id = Some(trace_id.into());
        self
    }

    #[must_use]
    pub fn with_parent_span_id(mut self, parent_span_id: impl Into<String>) -> StartSpanOptions {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }

    #[must_use]
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> StartSpanOptions {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Generates a 32-hex-character trace identifier.
///
/// Uniqueness within a process lifetime is the only requirement; the
/// all-zero value is reserved by the trace-context wire spec and never
/// returned.
#[must_use]
pub fn generate_trace_id() -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id: u128 = rng.gen();
        if id != 0 {
            return format!("{id:032x}");
        }
    }
}

/// Generates a 16-hex-character span identifier; never all-zero.
#[must_use]
pub fn generate_span_id() -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id: u64 = rng.gen();
        if id != 0 {
            return format!("{id:016x}");
        }
    }
}
