// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! Span lifecycle: creation with generated identifiers, an open-span
//! index, and finalization.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use crate::traces::{generate_span_id, generate_trace_id, Span, SpanStatus, StartSpanOptions};

/// Tracks open spans from `start` until `finish` detaches them.
///
/// The index is keyed by span id; lookups for unknown ids (double-finish,
/// unsampled spans) are no-ops.
#[derive(Debug, Default)]
pub struct SpanManager {
    open: Mutex<HashMap<String, Span>>,
}

impl SpanManager {
    #[must_use]
    pub fn new() -> SpanManager {
        SpanManager::default()
    }

    /// Starts a span and registers it as open.
    ///
    /// Caller-supplied trace identity is used verbatim; otherwise a fresh
    /// 32-hex trace id is generated. The span id is always generated.
    pub fn start(&self, options: StartSpanOptions) -> Span {
        let span = Span {
            trace_id: options.trace_id.unwrap_or_else(generate_trace_id),
            span_id: generate_span_id(),
            parent_span_id: options.parent_span_id,
            name: options.name,
            status: SpanStatus::Unset,
            start_time_ms: Utc::now().timestamp_millis(),
            end_time_ms: None,
            attributes: options.attributes,
        };
        self.open
            .lock()
            .expect("open span index poisoned")
            .insert(span.span_id.clone(), span.clone());
        span
    }

    /// Finalizes an open span: stamps the end time and status, removes it
    /// from the index, and returns it for transmission.
    ///
    /// Returns `None` for unknown ids, so double-finishing is harmless.
    pub fn finish(&self, span_id: &str, status: SpanStatus) -> Option<Span> {
        let mut span = self
            .open
            .lock()
            .expect("open span index poisoned")
            .remove(span_id)?;
        span.end_time_ms = Some(Utc::now().timestamp_millis().max(span.start_time_ms));
        span.status = status;
        Some(span)
    }

    /// Number of spans currently open.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open.lock().expect("open span index poisoned").len()
    }
}
