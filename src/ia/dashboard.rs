// src/ia/dashboard.rs
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::{analyze, truncate_chars, ChatClient};
use crate::analysis::{compact, CompactRecord};
use crate::error::LlmError;
use crate::esb::{Orchestrator, Subject};

/// Longest compacted-data excerpt embedded in the dashboard prompt.
pub const DASHBOARD_DATA_CHARS: usize = 6000;

const OPEN_TAG: &str = "<JSON>";
const CLOSE_TAG: &str = "</JSON>";

/// Body returned when the model's reply cannot be turned into JSON.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidReply {
    pub error: &'static str,
    pub raw: String,
    pub exception: String,
}

impl InvalidReply {
    fn new(raw: String, cause: &LlmError) -> Self {
        Self {
            error: "Respuesta IA inválida",
            raw,
            exception: cause.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub analysis: String,
}

/// Pull the JSON document out of a model reply.
///
/// Code fences are dropped and typographic double quotes become ASCII ones
/// before looking for the `<JSON>...</JSON>` block.
pub fn extract_json(raw: &str) -> Result<String, LlmError> {
    let clean = raw
        .replace("```json", "")
        .replace("```", "")
        .replace(['\u{201C}', '\u{201D}'], "\"");

    let start = clean.find(OPEN_TAG).ok_or(LlmError::MissingJson)? + OPEN_TAG.len();
    let end = clean[start..]
        .find(CLOSE_TAG)
        .ok_or(LlmError::MissingJson)?
        + start;
    Ok(clean[start..end].trim().to_string())
}

/// Instructions go first and the data last, so [`analyze`]'s cut only
/// ever shortens the data.
pub fn dashboard_prompt(tema: &str, records: &[CompactRecord]) -> String {
    let data = serde_json::to_string(records).unwrap_or_else(|_| "[]".to_string());
    let data = truncate_chars(&data, DASHBOARD_DATA_CHARS);
    format!(
        r#"Eres un motor de analítica ambiental especializado en datos del OEFA.
Tema a analizar: "{tema}".

Devuelve EXCLUSIVAMENTE un JSON válido con esta forma:
<JSON>
{{
  "tema": "{tema}",
  "descripcion": "string",
  "dashboard": {{
    "metricas_clave": {{"nombre_parametro": "string", "promedio": number | null, "min": number | null, "max": number | null}},
    "series_temporales": [{{"nombre": "string", "unidad": "string", "data": [{{"fecha": "YYYY-MM-DD", "valor": number}}]}}],
    "top_parametros": [{{"nombre": "string", "valor": number}}],
    "comparaciones": [{{"parametro": "string", "unidad": "string", "min": number, "max": number, "promedio": number}}]
  }}
}}
</JSON>

REGLAS:
- Responde solo dentro de <JSON></JSON>.
- No inventes datos; usa únicamente los valores numéricos dados.
- Si una serie temporal tiene un solo dato, agrega 1 o 2 fechas posteriores con el mismo valor, máximo 3 puntos, empezando por la fecha original.
- Formato de fecha: YYYY-MM-DD.

DATOS (parametro, valor numérico, unidad, fecha):
{data}"#
    )
}

pub fn summary_prompt(data: &str) -> String {
    format!(
        "Provide a concise summary (max 3 paragraphs) in Spanish of the \
         structured environmental data from Peru's OEFA below, explaining:\n\
         - Main environmental trends.\n\
         - Areas of concern or improvement.\n\
         - Possible causes or context.\n\n\
         {data}"
    )
}

/// Combines the orchestrated datasets with the language model.
#[derive(Clone)]
pub struct Analyst {
    orchestrator: Orchestrator,
    llm: Arc<dyn ChatClient>,
}

impl Analyst {
    pub fn new(orchestrator: Orchestrator, llm: Arc<dyn ChatClient>) -> Self {
        Self { orchestrator, llm }
    }

    /// Chart-ready dashboard for `subject`, built from its first indicator
    /// table.
    pub async fn dashboard(
        &self,
        tema: &str,
        subject: Subject,
        limit: u32,
    ) -> Result<Value, InvalidReply> {
        let bundle = self.orchestrator.bundle(subject, limit).await;
        let records = bundle
            .lead_table()
            .map(|t| compact(&t.rows))
            .unwrap_or_default();
        info!(tema, records = records.len(), "requesting dashboard");

        let raw = analyze(self.llm.as_ref(), &dashboard_prompt(tema, &records))
            .await
            .map_err(|e| {
                warn!(error = %e, "language model call failed");
                InvalidReply::new(String::new(), &e)
            })?;

        extract_json(&raw)
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(LlmError::from))
            .map_err(|e| {
                warn!(error = %e, "unusable dashboard reply");
                InvalidReply::new(raw, &e)
            })
    }

    /// Natural-language overview of every area.
    pub async fn summary(&self, limit: u32) -> Result<Summary, LlmError> {
        let general = self.orchestrator.general_summary(limit).await;
        let data = serde_json::to_string(&general)?;
        let analysis = analyze(self.llm.as_ref(), &summary_prompt(&data)).await?;
        Ok(Summary {
            kind: "Resumen Ambiental",
            analysis,
        })
    }
}
