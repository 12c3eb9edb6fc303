// src/error.rs
use thiserror::Error;

/// Everything that can go wrong between asking for a datastream and
/// holding its [`crate::junar::DataTable`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// Missing credentials or unusable base URL. Never retried.
    #[error("OEFA configuration error: {0}")]
    Config(String),

    #[error("error calling OEFA for {dataset}: {source}")]
    Transport {
        dataset: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("OEFA answered {status} for {dataset}")]
    Status {
        dataset: String,
        status: reqwest::StatusCode,
    },

    #[error("OEFA response for {dataset} exceeds {limit} bytes")]
    BodyTooLarge { dataset: String, limit: usize },

    /// Retries exhausted.
    #[error("dataset {dataset} failed after {attempts} attempt(s): {source}")]
    Dataset {
        dataset: String,
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Transport failures and HTTP error statuses are retried (any status, as
    /// the upstream catalog occasionally answers 4xx on transient faults).
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport { .. } | FetchError::Status { .. })
    }
}

/// Failures talking to the language model.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("language model is not configured: {0}")]
    NotConfigured(String),

    #[error("request to the language model failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("language model answered {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected language model response: {0}")]
    InvalidResponse(String),

    /// The reply carried no `<JSON>...</JSON>` block.
    #[error("reply carries no <JSON> block")]
    MissingJson,

    #[error("reply JSON does not parse: {0}")]
    Json(#[from] serde_json::Error),
}
