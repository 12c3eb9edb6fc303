// src/fetch/gateway.rs
use std::sync::Arc;
use tracing::{instrument, warn};

use super::{Cached, DatasetRequest, JunarSource, RetryPolicy, Retrying, TableSource};
use crate::config::Settings;
use crate::error::FetchError;
use crate::junar::DataTable;

/// Entry point for every datastream read in the service.
#[derive(Clone)]
pub struct Gateway {
    source: Arc<dyn TableSource>,
}

impl Gateway {
    pub fn new<S: TableSource + 'static>(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// `Cached -> Retrying -> JunarSource`, built once at startup.
    /// Fails when the provider credentials are unusable.
    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        let source = JunarSource::new(&settings.oefa)?;
        let retrying = Retrying::new(source, RetryPolicy::from(&settings.retry));
        Ok(Self::new(Cached::new(retrying, settings.cache.ttl())))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(
        &self,
        dataset_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<DataTable, FetchError> {
        self.source
            .fetch_table(&DatasetRequest::new(dataset_id, limit, offset))
            .await
    }

    /// Like [`Gateway::fetch`] but never fails: errors become an empty table
    /// titled with the dataset id and describing the error.
    pub async fn safe_fetch(&self, dataset_id: &str, limit: u32, offset: u32) -> DataTable {
        match self.fetch(dataset_id, limit, offset).await {
            Ok(table) => table,
            Err(e) => {
                warn!(dataset = %dataset_id, error = %e, "dataset unavailable, returning empty table");
                DataTable::unavailable(dataset_id, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheSettings, OefaSettings, RetrySettings};
    use crate::fetch::testing::{init_tracing, upstream, ScriptedSource};

    fn settings(base_url: String) -> Settings {
        Settings {
            oefa: OefaSettings {
                base_url,
                auth_key: "secret".into(),
                timeout_ms: 2_000,
            },
            retry: RetrySettings {
                max_attempts: 2,
                backoff_ms: 1,
                multiplier: 1.0,
            },
            cache: CacheSettings { ttl_secs: 60 },
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn passes_pagination_through() {
        let src = Arc::new(ScriptedSource::always_ok());
        let gateway = Gateway::new(Arc::clone(&src));
        gateway.fetch("X", 5, 15).await.unwrap();
        assert_eq!(src.seen.lock().unwrap()[0], DatasetRequest::new("X", 5, 15));
    }

    #[test]
    fn missing_auth_key_is_fatal_at_startup() {
        let mut s = settings("http://localhost/api/v2".into());
        s.oefa.auth_key.clear();
        assert!(matches!(Gateway::from_settings(&s), Err(FetchError::Config(_))));
    }

    #[tokio::test]
    async fn failing_dataset_does_not_affect_others() -> anyhow::Result<()> {
        init_tracing();
        let server = upstream::spawn().await;
        let gateway = Gateway::from_settings(&settings(server.base_url()))?;

        let (bad, good) = tokio::join!(
            gateway.safe_fetch(upstream::BROKEN, 20, 0),
            gateway.safe_fetch(upstream::GOOD, 20, 0),
        );

        assert_eq!(bad.title.as_deref(), Some(upstream::BROKEN));
        assert!(bad.rows.is_empty());
        assert!(bad.headers.is_empty());
        let description = bad.description.expect("error description");
        assert!(description.starts_with("Error:"));
        assert!(description.contains("2 attempt"));

        assert_eq!(good.rows.len(), 2);
        assert_eq!(good.title.as_deref(), Some("Monitoreo de calidad de agua"));
        Ok(())
    }

    #[tokio::test]
    async fn cache_avoids_second_outbound_call() -> anyhow::Result<()> {
        let server = upstream::spawn().await;
        let gateway = Gateway::from_settings(&settings(server.base_url()))?;

        gateway.fetch(upstream::GOOD, 20, 0).await?;
        gateway.fetch(upstream::GOOD, 20, 0).await?;
        assert_eq!(server.hits(), 1);

        gateway.fetch(upstream::GOOD, 20, 20).await?;
        gateway.fetch(upstream::GOOD, 10, 0).await?;
        assert_eq!(server.hits(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn failing_dataset_is_retried_then_reported() -> anyhow::Result<()> {
        init_tracing();
        let server = upstream::spawn().await;
        let gateway = Gateway::from_settings(&settings(server.base_url()))?;

        let err = gateway.fetch(upstream::BROKEN, 20, 0).await.unwrap_err();
        assert!(matches!(err, FetchError::Dataset { attempts: 2, .. }));
        assert_eq!(server.hits(), 2);
        Ok(())
    }
}
