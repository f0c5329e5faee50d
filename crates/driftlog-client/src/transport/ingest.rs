// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP sender for the collector's native log ingest endpoint.

use async_trait::async_trait;
use serde::Serialize;

use crate::dsn::Dsn;
use crate::error::TransportError;
use crate::logs::LogRecord;
use crate::transport::BatchSender;

#[derive(Serialize)]
struct IngestPayload<'a> {
    logs: &'a [LogRecord],
}

/// Sends log batches as `POST {base}/api/v1/ingest` with the API key in
/// the `X-API-Key` header and a JSON body of `{"logs": [...]}`.
pub struct IngestSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl IngestSender {
    #[must_use]
    pub fn new(client: reqwest::Client, dsn: &Dsn) -> IngestSender {
        IngestSender {
            client,
            endpoint: format!("{}/api/v1/ingest", dsn.api_base_url),
            api_key: dsn.api_key.clone(),
        }
    }
}

#[async_trait]
impl BatchSender<LogRecord> for IngestSender {
    async fn send_batch(&self, batch: &[LogRecord]) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-Key", &self.api_key)
            .json(&IngestPayload { logs: batch })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
