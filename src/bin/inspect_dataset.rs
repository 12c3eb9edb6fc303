//! Fetch one datastream through the full gateway and print what the API
//! would serve for it.
//!
//! Usage: inspect_dataset <GUID> [limit] [offset]
use anyhow::{bail, Context, Result};
use oefa_gateway::{analysis, config::Settings, fetch::{Gateway, DEFAULT_LIMIT}};
use serde_json::json;
use std::env;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let Some(dataset_id) = args.next() else {
        bail!("usage: inspect_dataset <GUID> [limit] [offset]");
    };
    let limit = match args.next() {
        Some(s) => s.parse().with_context(|| format!("invalid limit {:?}", s))?,
        None => DEFAULT_LIMIT,
    };
    let offset = match args.next() {
        Some(s) => s.parse().with_context(|| format!("invalid offset {:?}", s))?,
        None => 0,
    };

    let settings = Settings::load()?;
    let gateway = Gateway::from_settings(&settings)?;
    let table = gateway
        .fetch(&dataset_id, limit, offset)
        .await
        .with_context(|| format!("fetching {}", dataset_id))?;
    let report = analysis::report(&table);

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "table": table, "report": report }))?
    );
    Ok(())
}
