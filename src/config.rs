use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use url::Url;

use crate::repositories::StorageBackend;
use crate::utils::auth::parse_duration;

/// Deployment environment, used to decide how much internal detail gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Dev,
    Test,
    Production,
}

impl AppEnv {
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "development" => Ok(AppEnv::Dev),
            "test" => Ok(AppEnv::Test),
            "production" | "prod" => Ok(AppEnv::Production),
            other => Err(anyhow!(
                "Unsupported APP_ENV: {}. Supported values: dev, test, production",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Serialized origin of FRONTEND_URL (scheme://host[:port]), used as the only CORS origin.
    pub frontend_origin: String,
    pub database_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub jwt_expires_in: String,
    pub refresh_expires_in: String,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_app_env")]
    app_env: String,
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    jwt_secret: Option<String>,
    frontend_url: Option<String>,
    database_url: Option<String>,
    #[serde(default = "default_storage_backend")]
    storage_backend: String,
    #[serde(default = "default_jwt_expires_in")]
    jwt_expires_in: String,
    #[serde(default = "default_refresh_expires_in")]
    refresh_expires_in: String,
    #[serde(default = "default_bcrypt_cost")]
    bcrypt_cost: u32,
}

fn default_app_env() -> String {
    "dev".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3333
}

fn default_storage_backend() -> String {
    "postgres".to_string()
}

fn default_jwt_expires_in() -> String {
    "10m".to_string()
}

fn default_refresh_expires_in() -> String {
    "7d".to_string()
}

fn default_bcrypt_cost() -> u32 {
    10
}

impl Config {
    /// Load configuration from `.env` (if present) and the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .context("Failed to read configuration from environment")?;

        Self::from_settings(settings)
    }

    pub fn from_settings(settings: config::Config) -> anyhow::Result<Self> {
        let raw: RawConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        let jwt_secret = raw
            .jwt_secret
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("JWT_SECRET must be set"))?;

        let frontend_url = raw
            .frontend_url
            .ok_or_else(|| anyhow!("FRONTEND_URL must be set"))?;
        let frontend_url = Url::parse(frontend_url.trim())
            .with_context(|| format!("FRONTEND_URL is not a valid URL: {}", frontend_url))?;
        if !matches!(frontend_url.scheme(), "http" | "https") {
            bail!("FRONTEND_URL must use http or https");
        }
        let frontend_origin = frontend_url.origin().ascii_serialization();

        let storage_backend = StorageBackend::from_str(&raw.storage_backend)?;
        let database_url = raw.database_url.filter(|s| !s.trim().is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORAGE_BACKEND is postgres");
        }

        for (key, value) in [
            ("JWT_EXPIRES_IN", &raw.jwt_expires_in),
            ("REFRESH_EXPIRES_IN", &raw.refresh_expires_in),
        ] {
            parse_duration(value).map_err(|_| anyhow!("{} has an invalid duration: {}", key, value))?;
        }

        if !(4..=31).contains(&raw.bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31, got {}", raw.bcrypt_cost);
        }

        Ok(Config {
            app_env: AppEnv::from_str(&raw.app_env)?,
            host: raw.host,
            port: raw.port,
            jwt_secret,
            frontend_origin,
            database_url,
            storage_backend,
            jwt_expires_in: raw.jwt_expires_in,
            refresh_expires_in: raw.refresh_expires_in,
            bcrypt_cost: raw.bcrypt_cost,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        app_env: AppEnv::Test,
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: "test-secret".to_string(),
        frontend_origin: "http://localhost:5173".to_string(),
        database_url: None,
        storage_backend: StorageBackend::Memory,
        jwt_expires_in: "10m".to_string(),
        refresh_expires_in: "7d".to_string(),
        bcrypt_cost: 4,
    }
}
