// src/esb/mod.rs
//! Fan-out views combining several datastreams into one response.

use chrono::Utc;
use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, instrument};

use crate::catalog::{self, Theme};
use crate::fetch::Gateway;
use crate::junar::DataTable;

/// Page size used by the combined views when the caller gives none.
pub const DEFAULT_BUNDLE_LIMIT: u32 = 10;

pub type Tables = IndexMap<&'static str, DataTable>;

/// What a combined view is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Theme(Theme),
    General,
}

impl Subject {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "resumen" | "general" => Some(Subject::General),
            other => Theme::parse(other).map(Subject::Theme),
        }
    }
}

/// One theme with its indicators and related datastreams.
#[derive(Debug, Clone, Serialize)]
pub struct ThemeBundle {
    pub tema: &'static str,
    pub descripcion: &'static str,
    pub indicadores: Tables,
    #[serde(flatten)]
    pub related: Tables,
}

impl ThemeBundle {
    /// First indicator table, the one fed to the dashboard.
    pub fn lead_table(&self) -> Option<&DataTable> {
        self.indicadores.values().next()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneralSummary {
    pub timestamp: String,
    pub resumen: &'static str,
    pub fiscalizacion: Tables,
    pub supervision: Tables,
    pub evaluacion: IndexMap<&'static str, Tables>,
    pub politicas: Tables,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Bundle {
    Theme(ThemeBundle),
    General(GeneralSummary),
}

impl Bundle {
    pub fn lead_table(&self) -> Option<&DataTable> {
        match self {
            Bundle::Theme(b) => b.lead_table(),
            Bundle::General(s) => s.evaluacion.values().find_map(|t| t.values().next()),
        }
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    gateway: Gateway,
}

impl Orchestrator {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Fetch every `(key, dataset)` pair at once; failures become
    /// placeholder tables.
    async fn fetch_all(&self, wanted: &[(&'static str, &'static str)], limit: u32) -> Tables {
        let tables = join_all(
            wanted
                .iter()
                .map(|(_, id)| self.gateway.safe_fetch(id, limit, 0)),
        )
        .await;
        wanted.iter().map(|(key, _)| *key).zip(tables).collect()
    }

    pub async fn indicators(&self, theme: Theme, limit: u32) -> Tables {
        let wanted: Vec<_> = theme
            .indicators()
            .iter()
            .map(|(ind, id)| (ind.label(), *id))
            .collect();
        self.fetch_all(&wanted, limit).await
    }

    #[instrument(level = "info", skip(self))]
    pub async fn theme_bundle(&self, theme: Theme, limit: u32) -> ThemeBundle {
        let related: Vec<_> = theme.related().iter().map(|r| (r.key, r.id)).collect();
        let (indicadores, related) = tokio::join!(
            self.indicators(theme, limit),
            self.fetch_all(&related, limit)
        );
        info!(
            indicators = indicadores.len(),
            empty = indicadores.values().filter(|t| t.is_empty()).count(),
            "theme bundle ready"
        );
        ThemeBundle {
            tema: theme.title(),
            descripcion: theme.description(),
            indicadores,
            related,
        }
    }

    #[instrument(level = "info", skip(self))]
    pub async fn general_summary(&self, limit: u32) -> GeneralSummary {
        let fiscalizacion = [
            ("denuncias", catalog::DENUNCIAS),
            ("pedidosFiscalia", catalog::PEDIDOS_FISCALIA),
            ("resoluciones", catalog::RESOLUCIONES_MULTA),
        ];
        let supervision = [
            ("informes", catalog::INFORMES_SUPERVISION),
            ("medidas", catalog::MEDIDAS_ADMINISTRATIVAS),
            ("direccion", catalog::INFORMES_DIRECCION),
        ];
        let politicas = [
            ("proyectosNormativos", catalog::PROYECTOS_NORMATIVOS),
            ("actividadesAFA", catalog::ACTIVIDADES_AFA),
        ];

        let evaluacion = join_all(Theme::ALL.iter().map(|t| self.indicators(*t, limit)));
        let (fiscalizacion, supervision, politicas, evaluacion) = tokio::join!(
            self.fetch_all(&fiscalizacion, limit),
            self.fetch_all(&supervision, limit),
            self.fetch_all(&politicas, limit),
            evaluacion
        );

        GeneralSummary {
            timestamp: Utc::now().to_rfc3339(),
            resumen: "Integración OEFA SOA",
            fiscalizacion,
            supervision,
            evaluacion: Theme::ALL.iter().map(|t| t.key()).zip(evaluacion).collect(),
            politicas,
        }
    }

    pub async fn bundle(&self, subject: Subject, limit: u32) -> Bundle {
        match subject {
            Subject::Theme(theme) => Bundle::Theme(self.theme_bundle(theme, limit).await),
            Subject::General => Bundle::General(self.general_summary(limit).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::testing::bad_gateway;
    use crate::fetch::{Cached, DatasetRequest, TableSource};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers with a table titled after the requested id, except for the
    /// ids it was told to fail.
    struct ById {
        failing: Vec<&'static str>,
        seen: Mutex<Vec<DatasetRequest>>,
    }

    #[async_trait]
    impl TableSource for ById {
        async fn fetch_table(&self, req: &DatasetRequest) -> Result<DataTable, FetchError> {
            self.seen.lock().unwrap().push(req.clone());
            // stay pending once so concurrent fetches overlap
            tokio::task::yield_now().await;
            if self.failing.contains(&req.dataset_id.as_str()) {
                return Err(bad_gateway(&req.dataset_id));
            }
            Ok(DataTable {
                title: Some(req.dataset_id.clone()),
                description: None,
                headers: vec!["Valor".into()],
                rows: vec![[("Valor".to_string(), "1".to_string())].into_iter().collect()],
            })
        }
    }

    fn source(failing: Vec<&'static str>) -> std::sync::Arc<ById> {
        std::sync::Arc::new(ById {
            failing,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn orchestrator(failing: Vec<&'static str>) -> (Orchestrator, std::sync::Arc<ById>) {
        let source = source(failing);
        (Orchestrator::new(Gateway::new(source.clone())), source)
    }

    #[test]
    fn subjects() {
        assert_eq!(Subject::parse("Resumen"), Some(Subject::General));
        assert_eq!(Subject::parse("general"), Some(Subject::General));
        assert_eq!(Subject::parse("agua"), Some(Subject::Theme(Theme::Agua)));
        assert_eq!(Subject::parse("lava"), None);
    }

    #[tokio::test]
    async fn water_bundle_layout() {
        let (orch, source) = orchestrator(vec![]);
        let bundle = orch.theme_bundle(Theme::Agua, 5).await;

        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["tema"], "Agua");
        assert_eq!(json["indicadores"]["EAT"]["title"], "EAC-COMPO-AMBIE-AGUA");
        assert_eq!(json["indicadores"]["IPASH"]["title"], "IPASH-COMPO-AMBIE-AGUA");
        assert_eq!(json["denunciasRelacionadas"]["title"], catalog::DENUNCIAS);
        assert_eq!(json["normativas"]["title"], catalog::PROYECTOS_NORMATIVOS);

        let order: Vec<_> = bundle.indicadores.keys().copied().collect();
        assert_eq!(order, vec!["EAT", "EAS", "ISIM", "IPASH"]);

        let seen = source.seen.lock().unwrap();
        assert_eq!(seen.len(), 6);
        assert!(seen.iter().all(|r| r.limit == 5 && r.offset == 0));
    }

    #[tokio::test]
    async fn a_failing_indicator_does_not_sink_the_bundle() {
        let (orch, _) = orchestrator(vec!["ISIM-COMPO-AMBIE-AIRE"]);
        let bundle = orch.theme_bundle(Theme::Aire, 3).await;

        let isim = &bundle.indicadores["ISIM"];
        assert!(isim.is_empty());
        assert_eq!(isim.title.as_deref(), Some("ISIM-COMPO-AMBIE-AIRE"));
        assert!(isim.description.as_deref().unwrap().starts_with("Error:"));
        assert!(!bundle.indicadores["EAT"].is_empty());
        assert!(!bundle.related["supervision"].is_empty());
    }

    #[tokio::test]
    async fn general_summary_covers_every_area() {
        let (orch, _) = orchestrator(vec![catalog::ACTIVIDADES_AFA]);
        let summary = orch.general_summary(2).await;

        assert_eq!(summary.resumen, "Integración OEFA SOA");
        assert_eq!(summary.fiscalizacion.len(), 3);
        assert_eq!(summary.supervision.len(), 3);
        assert_eq!(summary.evaluacion.len(), Theme::ALL.len());
        assert_eq!(
            summary.evaluacion["ruido"]["EAT"].title.as_deref(),
            Some("EAC-RUIDO")
        );
        assert!(summary.politicas["actividadesAFA"].is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&summary.timestamp).is_ok());

        let bundle = Bundle::General(summary);
        assert_eq!(
            bundle.lead_table().and_then(|t| t.title.as_deref()),
            Some("EAC-COMPO-AMBIE-AGUA")
        );
    }

    #[tokio::test]
    async fn shared_datasets_are_fetched_once_behind_the_cache() {
        let source = source(vec![]);
        let cached = Cached::new(source.clone(), Duration::from_secs(60));
        let orch = Orchestrator::new(Gateway::new(cached));
        let summary = orch.general_summary(2).await;
        assert_eq!(
            summary.evaluacion["floraFauna"]["EAT"].title.as_deref(),
            Some("EAC-BIOTA")
        );

        let seen = source.seen.lock().unwrap();
        let mut ids: Vec<_> = seen.iter().map(|r| r.dataset_id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert!(ids.contains(&"ISIM-HIDRO"));
    }
}
