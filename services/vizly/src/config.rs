use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;
use rand::RngCore;
use tracing::warn;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub media_root: PathBuf,

    pub retention_cap: usize,
    pub preview_rows: usize,
    pub max_upload_bytes: usize,

    pub secret_key: Vec<u8>,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    pub username: String,
    pub password: String,

    /// Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:data/vizly.db".to_string(),
            media_root: PathBuf::from("media"),
            retention_cap: 5,
            preview_rows: 5,
            max_upload_bytes: 10 * 1024 * 1024,
            secret_key: random_secret(),
            access_ttl_secs: 60 * 60,
            refresh_ttl_secs: 24 * 60 * 60,
            username: "admin".to_string(),
            password: "admin".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();

        let secret_key = match std::env::var("VIZLY_SECRET_KEY") {
            Ok(v) if !v.is_empty() => v.into_bytes(),
            _ => {
                warn!("VIZLY_SECRET_KEY not set: tokens will not survive a restart");
                d.secret_key
            }
        };

        let username = std::env::var("VIZLY_USERNAME").unwrap_or(d.username);
        let password = match std::env::var("VIZLY_PASSWORD") {
            Ok(v) => v,
            Err(_) => {
                warn!("VIZLY_PASSWORD not set: using the default password");
                d.password
            }
        };

        let cors_origins = std::env::var("VIZLY_CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();

        let cfg = Self {
            bind_addr: std::env::var("VIZLY_BIND_ADDR").unwrap_or(d.bind_addr),
            database_url: std::env::var("DATABASE_URL").unwrap_or(d.database_url),
            media_root: std::env::var("VIZLY_MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(d.media_root),
            retention_cap: parse_or("VIZLY_RETENTION_CAP", d.retention_cap)?,
            preview_rows: parse_or("VIZLY_PREVIEW_ROWS", d.preview_rows)?,
            max_upload_bytes: parse_or("VIZLY_MAX_UPLOAD_BYTES", d.max_upload_bytes)?,
            secret_key,
            access_ttl_secs: parse_or("VIZLY_ACCESS_TTL_SECS", d.access_ttl_secs)?,
            refresh_ttl_secs: parse_or("VIZLY_REFRESH_TTL_SECS", d.refresh_ttl_secs)?,
            username,
            password,
            cors_origins,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retention_cap == 0 {
            bail!("VIZLY_RETENTION_CAP must be at least 1");
        }
        if !self.database_url.starts_with("sqlite:") {
            bail!("DATABASE_URL must start with sqlite:");
        }
        if self.access_ttl_secs == 0 || self.refresh_ttl_secs == 0 {
            bail!("token lifetimes must be positive");
        }
        if self.username.is_empty() {
            bail!("VIZLY_USERNAME must not be empty");
        }
        for origin in &self.cors_origins {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid origin in VIZLY_CORS_ORIGINS: {origin}"))?;
        }
        Ok(())
    }
}

/// Comma-separated origins; `*` or an empty list allows any origin.
fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if origins.iter().any(|o| o == "*") {
        return Vec::new();
    }
    origins
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {v}")),
        Err(_) => Ok(default),
    }
}

fn random_secret() -> Vec<u8> {
    let mut key = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    key
}
