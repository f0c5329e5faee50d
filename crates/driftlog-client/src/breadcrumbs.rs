// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! Breadcrumbs: lightweight timestamped events kept in a bounded ring
//! buffer and attached to log records for context.

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A single recorded event. Breadcrumbs are append-only; once the owning
/// buffer is full the oldest entry is evicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Event kind, e.g. `http`, `query`, `navigation`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional grouping category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Human-readable description of the event.
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Optional structured payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Breadcrumb {
    /// Creates a breadcrumb stamped with the current time.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Breadcrumb {
        Breadcrumb {
            kind: kind.into(),
            category: None,
            message: message.into(),
            timestamp: Utc::now().timestamp_millis(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Breadcrumb {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Breadcrumb {
        self.data = Some(data);
        self
    }
}

/// Fixed-capacity FIFO buffer of the most recent breadcrumbs.
#[derive(Debug, Clone)]
pub struct BreadcrumbBuffer {
    buffer: VecDeque<Breadcrumb>,
    capacity: usize,
}

impl BreadcrumbBuffer {
    /// Creates a buffer holding at most `capacity` breadcrumbs.
    #[must_use]
    pub fn new(capacity: usize) -> BreadcrumbBuffer {
        BreadcrumbBuffer {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a breadcrumb, evicting the oldest one when full.
    pub fn add(&mut self, breadcrumb: Breadcrumb) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(breadcrumb);
    }

    /// Returns a copy of the contents in insertion order.
    #[must_use]
    pub fn get_all(&self) -> Vec<Breadcrumb> {
        self.buffer.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
