// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! DSN parsing and credential resolution.
//!
//! A DSN is a single connection string carrying both the collector base URL
//! and the API key: `https://dl_APIKEY@ingest.example.com`. The userinfo
//! segment is the key; scheme, host, and port form the base URL. A path
//! segment (the legacy project-id form) is accepted and ignored.

use reqwest::Url;

use crate::config::Config;
use crate::error::ConfigError;

/// Resolved collector credentials, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    /// Collector base URL, guaranteed to carry no trailing slash.
    pub api_base_url: String,
    /// Non-empty API key sent as the `X-API-Key` header.
    pub api_key: String,
}

impl Dsn {
    /// Parses a connection string into its components.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDsn`] when the string is not a parseable URL,
    /// [`ConfigError::MissingApiKey`] when the userinfo segment is empty.
    pub fn parse(dsn: &str) -> Result<Dsn, ConfigError> {
        let url = Url::parse(dsn).map_err(|_| ConfigError::InvalidDsn(dsn.to_string()))?;

        let api_key = url.username();
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let host = url
            .host_str()
            .ok_or_else(|| ConfigError::InvalidDsn(dsn.to_string()))?;
        // Url::port() is None for the scheme's default port, so the base URL
        // only names a port when the DSN did.
        let api_base_url = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };

        Ok(Dsn {
            api_base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Resolves credentials from client options.
    ///
    /// A `dsn` string takes precedence over the explicit `api_url` +
    /// `api_key` pair; one trailing slash is stripped from an explicit URL.
    ///
    /// # Errors
    ///
    /// The parse errors above, or [`ConfigError::MissingCredentials`] when
    /// neither form is present.
    pub fn resolve(config: &Config) -> Result<Dsn, ConfigError> {
        if let Some(dsn) = &config.dsn {
            return Dsn::parse(dsn);
        }

        match (&config.api_url, &config.api_key) {
            (Some(api_url), Some(api_key)) => Ok(Dsn {
                api_base_url: api_url.strip_suffix('/').unwrap_or(api_url).to_string(),
                api_key: api_key.clone(),
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}
