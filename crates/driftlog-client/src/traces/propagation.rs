// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! W3C TraceContext `traceparent` codec.
//!
//! The header value is four hyphen-delimited hex fields:
//!
//! ```text
//! traceparent: 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01
//!              │  │                                │                │
//!              │  │                                │                └ flags (2 hex)
//!              │  │                                └ parent span id (16 hex)
//!              │  └ trace id (32 hex)
//!              └ version (2 hex)
//! ```
//!
//! Parsing is total: any malformed value yields `None` rather than an
//! error, so callers fall back to generating a fresh trace identity. The
//! all-zero trace id and all-zero parent id are reserved by the wire spec
//! and rejected.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TRACEPARENT_REGEX: Regex =
        Regex::new(r"(?i)^([a-f0-9]{2})-([a-f0-9]{32})-([a-f0-9]{16})-([a-f0-9]{2})$")
            .expect("failed creating regex");
    static ref INVALID_SEGMENT_REGEX: Regex = Regex::new(r"^0+$").expect("failed creating regex");
}

/// Trace identity extracted from an inbound `traceparent` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    /// 32 lowercase hex characters.
    pub trace_id: String,
    /// 16 lowercase hex characters; the caller becomes a child of this span.
    pub parent_span_id: String,
}

/// Parses a `traceparent` header value.
///
/// Returns `None` for anything that is not a well-formed four-field value
/// with non-zero trace and parent ids. Hex case is accepted on input;
/// extracted ids are normalized to lowercase.
#[must_use]
pub fn parse_traceparent(value: &str) -> Option<TraceContext> {
    let captures = TRACEPARENT_REGEX.captures(value.trim())?;

    let trace_id = &captures[2];
    let parent_span_id = &captures[3];
    if INVALID_SEGMENT_REGEX.is_match(trace_id) || INVALID_SEGMENT_REGEX.is_match(parent_span_id) {
        return None;
    }

    Some(TraceContext {
        trace_id: trace_id.to_ascii_lowercase(),
        parent_span_id: parent_span_id.to_ascii_lowercase(),
    })
}

/// Renders a version-00 `traceparent` value for an outbound response or
/// downstream request.
#[must_use]
pub fn create_traceparent(trace_id: &str, span_id: &str, sampled: bool) -> String {
    let flags = if sampled { "01" } else { "00" };
    format!("00-{trace_id}-{span_id}-{flags}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traces::{generate_span_id, generate_trace_id};

    #[test]
    fn test_parse_valid_header() {
        let context =
            parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01").unwrap();
        assert_eq!(context.trace_id, "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(context.parent_span_id, "00f067aa0ba902b7");
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let context =
            parse_traceparent("  00-4BF92F3577B34DA6A3CE929D0E0E4736-00F067AA0BA902B7-00  ")
                .unwrap();
        assert_eq!(context.trace_id, "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(context.parent_span_id, "00f067aa0ba902b7");
    }

    #[test]
    fn test_parse_rejects_malformed_values() {
        let malformed = [
            "",
            "garbage",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-extra",
            "00-tooshort-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e473g-00f067aa0ba902b7-01",
            "004bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        ];
        for value in malformed {
            assert!(parse_traceparent(value).is_none(), "accepted: {value}");
        }
    }

    #[test]
    fn test_parse_rejects_reserved_zero_ids() {
        assert!(
            parse_traceparent("00-00000000000000000000000000000000-00f067aa0ba902b7-01").is_none()
        );
        assert!(
            parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01").is_none()
        );
    }

    #[test]
    fn test_create_renders_flags() {
        assert_eq!(
            create_traceparent("4bf92f3577b34da6a3ce929d0e0e4736", "00f067aa0ba902b7", true),
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
        );
        assert_eq!(
            create_traceparent("4bf92f3577b34da6a3ce929d0e0e4736", "00f067aa0ba902b7", false),
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00"
        );
    }

    #[test]
    fn test_round_trip_law() {
        for _ in 0..32 {
            let trace_id = generate_trace_id();
            let span_id = generate_span_id();
            let context = parse_traceparent(&create_traceparent(&trace_id, &span_id, true))
                .expect("round trip failed");
            assert_eq!(context.trace_id, trace_id);
            assert_eq!(context.parent_span_id, span_id);
        }
    }
}
