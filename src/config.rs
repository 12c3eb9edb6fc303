// src/config.rs
//! Runtime settings: an optional YAML file, then environment overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, str::FromStr, time::Duration};

pub const CONFIG_PATH_VAR: &str = "OEFA_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "oefa.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub oefa: OefaSettings,
    pub retry: RetrySettings,
    pub cache: CacheSettings,
    pub groq: GroqSettings,
    pub server: ServerSettings,
}

/// Junar provider endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OefaSettings {
    pub base_url: String,
    pub auth_key: String,
    pub timeout_ms: u64,
}

impl Default for OefaSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_key: String::new(),
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts, first call included.
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 1_000,
            multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 600 }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroqSettings {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for GroqSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1".into(),
            api_key: String::new(),
            model: "llama-3.1-8b-instant".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl Settings {
    /// Load from `$OEFA_CONFIG` (default `oefa.yaml`, optional) and the
    /// process environment.
    pub fn load() -> Result<Self> {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path), |key| env::var(key).ok())
    }

    /// Same as [`Settings::load`] with an explicit file and variable lookup.
    pub fn load_from<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = if path.is_file() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_yaml::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        } else {
            Settings::default()
        };
        settings.apply_env(lookup)?;
        Ok(settings)
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OEFA_BASE_URL") {
            self.oefa.base_url = v;
        }
        if let Some(v) = lookup("OEFA_AUTH_KEY") {
            self.oefa.auth_key = v;
        }
        if let Some(v) = lookup("GROQ_API_URL") {
            self.groq.api_url = v;
        }
        if let Some(v) = lookup("GROQ_API_KEY") {
            self.groq.api_key = v;
        }
        if let Some(v) = lookup("GROQ_MODEL") {
            self.groq.model = v;
        }
        override_parsed(&lookup, "OEFA_TIMEOUT_MS", &mut self.oefa.timeout_ms)?;
        override_parsed(&lookup, "RETRY_OEFA_MAX_ATTEMPTS", &mut self.retry.max_attempts)?;
        override_parsed(&lookup, "RETRY_OEFA_BACKOFF_MS", &mut self.retry.backoff_ms)?;
        override_parsed(&lookup, "RETRY_OEFA_MULTIPLIER", &mut self.retry.multiplier)?;
        override_parsed(&lookup, "CACHE_TTL_SECS", &mut self.cache.ttl_secs)?;
        override_parsed(&lookup, "PORT", &mut self.server.port)?;
        Ok(())
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *slot = raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw))?;
    }
    Ok(())
}
