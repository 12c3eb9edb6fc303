// src/server/mod.rs
//! HTTP surface of the gateway.

use chrono::Utc;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use tracing::{info, warn};
use warp::{
    http::StatusCode,
    reject::Rejection,
    reply::{self, Json, WithStatus},
    Filter, Reply,
};

use crate::analysis::{report, TableReport};
use crate::catalog::{Area, Indicator, Theme};
use crate::esb::{Orchestrator, Subject, DEFAULT_BUNDLE_LIMIT};
use crate::fetch::DEFAULT_LIMIT;
use crate::ia::Analyst;

type JsonReply = WithStatus<Json>;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub analyst: Analyst,
}

#[derive(Debug, Default, Deserialize)]
struct Page {
    limit: Option<u32>,
    offset: Option<u32>,
}

fn json_reply<T: Serialize>(body: &T, status: StatusCode) -> JsonReply {
    reply::with_status(reply::json(body), status)
}

fn ok<T: Serialize>(body: &T) -> Result<JsonReply, Rejection> {
    Ok(json_reply(body, StatusCode::OK))
}

fn error(status: StatusCode, message: String) -> Result<JsonReply, Rejection> {
    Ok(json_reply(&json!({ "error": message }), status))
}

/// Path segments arrive percent-encoded (`flora%20y%20fauna`).
fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

async fn health() -> Result<JsonReply, Rejection> {
    ok(&json!({ "status": "UP", "timestamp": Utc::now().to_rfc3339() }))
}

async fn app_info() -> Result<JsonReply, Rejection> {
    ok(&json!({
        "app": "OEFA SOA Backend",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Agregador de datos abiertos del OEFA",
    }))
}

async fn dataset(id: String, page: Page, state: AppState) -> Result<JsonReply, Rejection> {
    let table = state
        .orchestrator
        .gateway()
        .safe_fetch(
            &id,
            page.limit.unwrap_or(DEFAULT_LIMIT),
            page.offset.unwrap_or(0),
        )
        .await;
    ok(&table)
}

async fn catalog_dataset(
    area: Area,
    slug: String,
    page: Page,
    state: AppState,
) -> Result<JsonReply, Rejection> {
    match area.find(&slug) {
        Some(ds) => dataset(ds.id.to_string(), page, state).await,
        None => error(
            StatusCode::NOT_FOUND,
            format!("Dataset '{}' no reconocido", slug),
        ),
    }
}

async fn evaluation(
    indicator: String,
    theme: String,
    page: Page,
    state: AppState,
) -> Result<JsonReply, Rejection> {
    let theme_name = decode_segment(&theme);
    let id = Indicator::parse(&indicator)
        .zip(Theme::parse(&theme_name))
        .and_then(|(i, t)| t.indicator(i));
    match id {
        Some(id) => dataset(id.to_string(), page, state).await,
        None => error(
            StatusCode::NOT_FOUND,
            format!("Indicador '{}' no disponible para '{}'", indicator, theme_name),
        ),
    }
}

async fn theme_bundle(tema: String, page: Page, state: AppState) -> Result<JsonReply, Rejection> {
    let tema = decode_segment(&tema);
    let Some(subject) = Subject::parse(&tema) else {
        return error(StatusCode::NOT_FOUND, format!("Tema '{}' no reconocido", tema));
    };
    let bundle = state
        .orchestrator
        .bundle(subject, page.limit.unwrap_or(DEFAULT_BUNDLE_LIMIT))
        .await;
    ok(&bundle)
}

async fn analysis(tema: String, page: Page, state: AppState) -> Result<JsonReply, Rejection> {
    let tema = decode_segment(&tema);
    let Some(theme) = Theme::parse(&tema) else {
        return error(StatusCode::NOT_FOUND, format!("Tema '{}' no reconocido", tema));
    };
    let tables = state
        .orchestrator
        .indicators(theme, page.limit.unwrap_or(DEFAULT_LIMIT))
        .await;
    let indicadores: IndexMap<&str, TableReport> =
        tables.iter().map(|(k, t)| (*k, report(t))).collect();
    ok(&json!({ "tema": theme.title(), "indicadores": indicadores }))
}

async fn ia_dashboard(tema: String, page: Page, state: AppState) -> Result<JsonReply, Rejection> {
    let tema = decode_segment(&tema);
    let Some(subject) = Subject::parse(&tema) else {
        return error(StatusCode::BAD_REQUEST, format!("Tema no reconocido: {}", tema));
    };
    match state
        .analyst
        .dashboard(&tema, subject, page.limit.unwrap_or(DEFAULT_BUNDLE_LIMIT))
        .await
    {
        Ok(dashboard) => ok(&dashboard),
        Err(invalid) => ok(&invalid),
    }
}

async fn ia_summary(page: Page, state: AppState) -> Result<JsonReply, Rejection> {
    match state
        .analyst
        .summary(page.limit.unwrap_or(DEFAULT_BUNDLE_LIMIT))
        .await
    {
        Ok(summary) => ok(&summary),
        Err(e) => {
            warn!(error = %e, "summary failed");
            error(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Recurso no encontrado".to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Método no permitido".to_string())
    } else {
        warn!(?err, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "Error interno".to_string())
    };
    Ok(json_reply(&json!({ "error": message }), status))
}

/// Every route of the service, rejections rendered as JSON.
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_state = warp::any().map(move || state.clone());
    let page = warp::query::<Page>();

    let health_route = warp::path("health")
        .and(warp::path::end())
        .and_then(health);
    let api_health = warp::path!("api" / "health").and_then(health);
    let info_route = warp::path!("api" / "info").and_then(app_info);

    let datasets = warp::path!("api" / "datasets" / String)
        .and(page.clone())
        .and(with_state.clone())
        .and_then(dataset);

    let area_route = |name: &'static str, area: Area| {
        warp::path("api")
            .and(warp::path(name))
            .and(warp::path::param::<String>())
            .and(warp::path::end())
            .map(move |slug: String| (area, slug))
            .untuple_one()
    };
    let catalog = area_route("fiscalizacion", Area::Fiscalizacion)
        .or(area_route("supervision", Area::Supervision))
        .unify()
        .or(area_route("politicas", Area::Politicas))
        .unify()
        .and(page.clone())
        .and(with_state.clone())
        .and_then(catalog_dataset);

    let indicator_route = |prefix: &'static str| {
        warp::path("api")
            .and(warp::path(prefix))
            .and(warp::path::param::<String>())
            .and(warp::path::param::<String>())
            .and(warp::path::end())
    };
    let evaluacion = indicator_route("evaluacion")
        .or(indicator_route("indicadores"))
        .unify()
        .and(page.clone())
        .and(with_state.clone())
        .and_then(evaluation);

    let esb_route = warp::path!("api" / "esb" / String)
        .and(page.clone())
        .and(with_state.clone())
        .and_then(theme_bundle);

    let analisis = warp::path!("api" / "analisis" / String)
        .and(page.clone())
        .and(with_state.clone())
        .and_then(analysis);

    let ia_resumen = warp::path!("api" / "ia" / "resumen")
        .and(page.clone())
        .and(with_state.clone())
        .and_then(ia_summary);
    let ia_analizar = warp::path!("api" / "ia" / "analizar" / String)
        .and(page)
        .and(with_state)
        .and_then(ia_dashboard);

    warp::get()
        .and(
            health_route
                .or(api_health)
                .or(info_route)
                .or(datasets)
                .or(catalog)
                .or(evaluacion)
                .or(esb_route)
                .or(analisis)
                .or(ia_resumen)
                .or(ia_analizar),
        )
        .with(warp::log::custom(|i| {
            info!(
                method = %i.method(),
                path = i.path(),
                status = i.status().as_u16(),
                elapsed_ms = i.elapsed().as_millis() as u64,
                "request"
            )
        }))
        .recover(handle_rejection)
}
