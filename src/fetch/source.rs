// src/fetch/source.rs
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{DatasetRequest, TableSource};
use crate::config::OefaSettings;
use crate::error::FetchError;
use crate::junar::{normalize, DataTable, RawTableResponse};

/// Largest datastream body accepted.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Plain fetch-and-normalize against the Junar API: no retries, no cache.
#[derive(Clone)]
pub struct JunarSource {
    client: Client,
    base_url: Url,
    auth_key: String,
}

impl JunarSource {
    /// Build the shared HTTP client. A blank auth key or an unusable base
    /// URL is rejected here, before any request is served.
    pub fn new(settings: &OefaSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| FetchError::Config(format!("building HTTP client: {}", e)))?;
        let base_url = Url::parse(settings.base_url.trim()).map_err(|e| {
            FetchError::Config(format!("invalid OEFA base url {:?}: {}", settings.base_url, e))
        })?;
        Self::with_client(client, base_url, &settings.auth_key)
    }

    pub fn with_client(client: Client, base_url: Url, auth_key: &str) -> Result<Self, FetchError> {
        let auth_key = auth_key.trim();
        if auth_key.is_empty() {
            return Err(FetchError::Config("OEFA auth key is not configured".into()));
        }
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Config(format!(
                "OEFA base url {} cannot carry a path",
                base_url
            )));
        }
        Ok(Self {
            client,
            base_url,
            auth_key: auth_key.to_string(),
        })
    }

    /// `{base}/datastreams/{guid}/data.json?auth_key=..&limit=..&offset=..`
    pub fn datastream_url(&self, req: &DatasetRequest) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["datastreams", req.dataset_id.as_str(), "data.json"]);
        }
        url.query_pairs_mut()
            .append_pair("auth_key", &self.auth_key)
            .append_pair("limit", &req.limit.to_string())
            .append_pair("offset", &req.offset.to_string());
        url
    }

    fn transport(req: &DatasetRequest, e: reqwest::Error) -> FetchError {
        // the url holds the auth key
        FetchError::Transport {
            dataset: req.dataset_id.clone(),
            source: e.without_url(),
        }
    }
}

#[async_trait]
impl TableSource for JunarSource {
    async fn fetch_table(&self, req: &DatasetRequest) -> Result<DataTable, FetchError> {
        debug!(dataset = %req.dataset_id, limit = req.limit, offset = req.offset, "GET datastream");

        let resp = self
            .client
            .get(self.datastream_url(req))
            .send()
            .await
            .map_err(|e| Self::transport(req, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                dataset: req.dataset_id.clone(),
                status,
            });
        }

        let too_large = || FetchError::BodyTooLarge {
            dataset: req.dataset_id.clone(),
            limit: MAX_BODY_BYTES,
        };
        if resp.content_length().map_or(false, |n| n > MAX_BODY_BYTES as u64) {
            return Err(too_large());
        }
        let body = resp.bytes().await.map_err(|e| Self::transport(req, e))?;
        if body.len() > MAX_BODY_BYTES {
            return Err(too_large());
        }

        let table = normalize(RawTableResponse::from_slice(&body));
        debug!(
            dataset = %req.dataset_id,
            headers = table.headers.len(),
            rows = table.rows.len(),
            "datastream normalized"
        );
        Ok(table)
    }
}
