// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! Serialization of errors into a structured exception shape for log
//! metadata.
//!
//! Rust errors carry no stack frames at capture time; the `source()` chain
//! takes their place, outermost error first.

use std::error::Error;

use serde::Serialize;

/// Structured form of a captured error, embedded under the `exception`
/// metadata key of the resulting log record.
#[derive(Debug, Clone, Serialize)]
pub struct SerializedException {
    /// Concrete Rust type of the error value.
    #[serde(rename = "type")]
    pub exception_type: String,
    /// Display rendering of the outermost error.
    pub message: String,
    /// Display renderings of the full cause chain, outermost first.
    pub chain: Vec<String>,
}

/// Serializes an error and its cause chain.
pub fn serialize_error<E>(error: &E) -> SerializedException
where
    E: Error + ?Sized,
{
    let mut chain = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }

    SerializedException {
        exception_type: std::any::type_name_of_val(error).to_string(),
        message: error.to_string(),
        chain,
    }
}
