use anyhow::{Context, Result};
use oefa_gateway::{
    config::Settings,
    esb::Orchestrator,
    fetch::Gateway,
    ia::{Analyst, GroqClient},
    server::{self, AppState},
};
use std::{env, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
    });
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) settings & upstream gateway ──────────────────────────────
    let settings = Settings::load().context("loading settings")?;
    let gateway = Gateway::from_settings(&settings).context("building OEFA gateway")?;
    info!(
        base_url = %settings.oefa.base_url,
        attempts = settings.retry.max_attempts,
        cache_ttl_secs = settings.cache.ttl_secs,
        "OEFA gateway ready"
    );

    // ─── 3) language model ───────────────────────────────────────────
    let groq = GroqClient::new(&settings.groq).context("building Groq client")?;
    if !groq.is_configured() {
        warn!("GROQ_API_KEY not set; /api/ia endpoints will report errors");
    }

    // ─── 4) serve ────────────────────────────────────────────────────
    let orchestrator = Orchestrator::new(gateway);
    let state = AppState {
        analyst: Analyst::new(orchestrator.clone(), Arc::new(groq)),
        orchestrator,
    };

    let port = settings.server.port;
    info!("Server starting on port {}", port);
    info!("Health check: http://localhost:{}/health", port);
    warp::serve(server::routes(state))
        .run(([0, 0, 0, 0], port))
        .await;

    Ok(())
}
