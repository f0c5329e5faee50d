// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-request context: trace identity, tags, extras, and breadcrumbs.
//!
//! A scope is created for one logical unit of work (typically one inbound
//! request), threaded through capture calls, and simply dropped when the
//! unit of work ends.

use std::collections::HashMap;

use crate::breadcrumbs::{Breadcrumb, BreadcrumbBuffer};
use crate::traces::Span;

/// Context container binding trace identity, tags, extras, and a private
/// breadcrumb buffer to one unit of work.
#[derive(Debug)]
pub struct Scope {
    /// Trace identity every record captured under this scope inherits.
    pub trace_id: String,
    /// Active span, when the caller wants log/span correlation.
    pub span_id: Option<String>,
    /// Per-scope service override.
    pub service: Option<String>,
    pub tags: HashMap<String, String>,
    pub extras: HashMap<String, serde_json::Value>,
    breadcrumbs: BreadcrumbBuffer,
    spans: Vec<Span>,
}

impl Scope {
    #[must_use]
    pub fn new(trace_id: impl Into<String>, max_breadcrumbs: usize) -> Scope {
        Scope {
            trace_id: trace_id.into(),
            span_id: None,
            service: None,
            tags: HashMap::new(),
            extras: HashMap::new(),
            breadcrumbs: BreadcrumbBuffer::new(max_breadcrumbs),
            spans: Vec::new(),
        }
    }

    pub fn set_service(&mut self, service: impl Into<String>) -> &mut Scope {
        self.service = Some(service.into());
        self
    }

    pub fn set_span_id(&mut self, span_id: impl Into<String>) -> &mut Scope {
        self.span_id = Some(span_id.into());
        self
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Scope {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: serde_json::Value) -> &mut Scope {
        self.extras.insert(key.into(), value);
        self
    }

    pub fn add_breadcrumb(&mut self, breadcrumb: Breadcrumb) {
        self.breadcrumbs.add(breadcrumb);
    }

    /// Breadcrumbs recorded on this scope, oldest first.
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.breadcrumbs.get_all()
    }

    pub fn add_span(&mut self, span: Span) {
        self.spans.push(span);
    }

    /// Spans attached to this scope, in attachment order.
    #[must_use]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Empties breadcrumbs, spans, tags, and extras; the trace identity is
    /// kept.
    pub fn clear(&mut self) {
        self.breadcrumbs.clear();
        self.spans.clear();
        self.tags.clear();
        self.extras.clear();
    }
}

/// Cloning inherits trace identity, service, tags, extras, and
/// breadcrumbs. Attached spans stay with the original: a nested scope
/// diverges from its parent's span list.
impl Clone for Scope {
    fn clone(&self) -> Scope {
        Scope {
            trace_id: self.trace_id.clone(),
            span_id: self.span_id.clone(),
            service: self.service.clone(),
            tags: self.tags.clone(),
            extras: self.extras.clone(),
            breadcrumbs: self.breadcrumbs.clone(),
            spans: Vec::new(),
        }
    }
}
