// src/fetch/mod.rs
//! Resilient access to the OEFA datastreams.
//!
//! The layers compose around a plain fetch-and-normalize source:
//! `Gateway -> Cached -> Retrying -> JunarSource`.

pub mod cache;
pub mod gateway;
pub mod retry;
pub mod source;

pub use cache::Cached;
pub use gateway::Gateway;
pub use retry::{RetryPolicy, Retrying};
pub use source::JunarSource;

use async_trait::async_trait;
use std::{fmt, sync::Arc};

use crate::error::FetchError;
use crate::junar::DataTable;

pub const DEFAULT_LIMIT: u32 = 20;

/// One page of one datastream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetRequest {
    pub dataset_id: String,
    pub limit: u32,
    pub offset: u32,
}

impl DatasetRequest {
    pub fn new(dataset_id: impl Into<String>, limit: u32, offset: u32) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            limit,
            offset,
        }
    }

    /// `guid:limit:offset`
    pub fn cache_key(&self) -> String {
        format!("{}:{}:{}", self.dataset_id, self.limit, self.offset)
    }
}

impl fmt::Display for DatasetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (limit={}, offset={})",
            self.dataset_id, self.limit, self.offset
        )
    }
}

/// Anything able to produce a table for a request.
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn fetch_table(&self, req: &DatasetRequest) -> Result<DataTable, FetchError>;
}

#[async_trait]
impl<T: TableSource + ?Sized> TableSource for Arc<T> {
    async fn fetch_table(&self, req: &DatasetRequest) -> Result<DataTable, FetchError> {
        (**self).fetch_table(req).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory sources shared by the layer tests.
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    /// Route logs through the test harness; `RUST_LOG` still applies.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }

    /// Counts calls and answers from a script; the last answer repeats.
    pub struct ScriptedSource {
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<DatasetRequest>>,
        script: Mutex<Vec<Result<DataTable, FetchError>>>,
    }

    impl ScriptedSource {
        pub fn new(script: Vec<Result<DataTable, FetchError>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                script: Mutex::new(script),
            }
        }

        pub fn always_ok() -> Self {
            Self::new(vec![Ok(table("ok"))])
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    pub fn table(title: &str) -> DataTable {
        DataTable {
            title: Some(title.to_string()),
            description: None,
            headers: vec!["Valor".into()],
            rows: vec![[("Valor".to_string(), "1".to_string())].into_iter().collect()],
        }
    }

    pub fn bad_gateway(dataset: &str) -> FetchError {
        FetchError::Status {
            dataset: dataset.to_string(),
            status: reqwest::StatusCode::BAD_GATEWAY,
        }
    }

    fn replay(r: &Result<DataTable, FetchError>, dataset: &str) -> Result<DataTable, FetchError> {
        match r {
            Ok(t) => Ok(t.clone()),
            Err(FetchError::Config(m)) => Err(FetchError::Config(m.clone())),
            Err(_) => Err(bad_gateway(dataset)),
        }
    }

    #[async_trait]
    impl TableSource for ScriptedSource {
        async fn fetch_table(&self, req: &DatasetRequest) -> Result<DataTable, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(req.clone());
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                let next = script.remove(0);
                return next;
            }
            replay(&script[0], &req.dataset_id)
        }
    }

    /// A local stand-in for the Junar API.
    pub mod upstream {
        use serde_json::json;
        use std::{
            collections::HashMap,
            net::SocketAddr,
            sync::{Arc, Mutex},
        };
        use warp::{http::StatusCode, Filter};

        pub const GOOD: &str = "EAC-COMPO-AMBIE-AGUA";
        pub const UNKNOWN: &str = "NO-EXISTE";
        pub const BROKEN: &str = "ROTO";

        pub struct Upstream {
            addr: SocketAddr,
            queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
        }

        impl Upstream {
            pub fn base_url(&self) -> String {
                format!("http://{}/api/v2", self.addr)
            }

            pub fn queries(&self) -> Vec<HashMap<String, String>> {
                self.queries.lock().unwrap().clone()
            }

            pub fn hits(&self) -> usize {
                self.queries.lock().unwrap().len()
            }
        }

        pub fn water_payload() -> serde_json::Value {
            let cells: Vec<serde_json::Value> = [
                "Parámetro",
                "Valor",
                "Unidad de medida",
                "Fecha",
                "Plomo",
                "<0.005",
                "mg/L",
                "3/15/23",
                "pH",
                "7,36",
                "Unidad de pH",
                "4/2/23",
            ]
            .iter()
            .map(|s| json!({ "fStr": s, "fType": "TEXT" }))
            .collect();
            json!({
                "title": "Monitoreo de calidad de agua",
                "description": "EAT agua",
                "result": { "fLength": cells.len(), "fRows": 2, "fCols": 4, "fArray": cells }
            })
        }

        pub async fn spawn() -> Upstream {
            let queries = Arc::new(Mutex::new(Vec::new()));
            let log = Arc::clone(&queries);

            let route = warp::path!("api" / "v2" / "datastreams" / String / "data.json")
                .and(warp::query::<HashMap<String, String>>())
                .map(move |guid: String, query: HashMap<String, String>| {
                    log.lock().unwrap().push(query);
                    let (body, status) = match guid.as_str() {
                        GOOD => (water_payload(), StatusCode::OK),
                        BROKEN => (json!({ "error": "down" }), StatusCode::SERVICE_UNAVAILABLE),
                        _ => (json!({ "title": null, "result": null }), StatusCode::OK),
                    };
                    warp::reply::with_status(warp::reply::json(&body), status)
                });

            let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
            tokio::spawn(server);
            Upstream { addr, queries }
        }
    }
}
