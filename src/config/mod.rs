use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub mongodb: MongoConfig,
    pub pdf: PdfConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    // Populated from the ENVIRONMENT variable, the single switch for
    // prod-required settings and error response redaction alike.
    #[serde(skip, default = "default_environment")]
    pub environment: String,
}

#[derive(Debug, Clone, Default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub server_selection_timeout_secs: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PdfConfig {
    pub browser_path: String,
    pub render_timeout_secs: u64,
    pub logo_url: Option<String>,
    pub signature_url: Option<String>,
    pub asset_fetch_timeout_secs: u64,
}

fn default_port() -> u16 {
    5000
}

fn default_environment() -> String {
    "dev".to_string()
}

impl ServerConfig {
    pub fn is_prod(&self) -> bool {
        self.environment == "prod"
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let mut server: ServerConfig = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;
        server.environment =
            env::var("ENVIRONMENT").unwrap_or_else(|_| default_environment());

        let is_prod = server.is_prod();

        Ok(AppConfig {
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("invoice_db"), is_prod)?,
                server_selection_timeout_secs: get_env_u64("MONGODB_SELECTION_TIMEOUT_SECS", 5)?,
            },
            pdf: PdfConfig {
                browser_path: get_env("PDF_BROWSER_PATH", Some("chromium"), is_prod)?,
                render_timeout_secs: get_env_u64("PDF_RENDER_TIMEOUT_SECS", 30)?,
                logo_url: env::var("PDF_LOGO_URL").ok().filter(|v| !v.is_empty()),
                signature_url: env::var("PDF_SIGNATURE_URL").ok().filter(|v| !v.is_empty()),
                asset_fetch_timeout_secs: get_env_u64("PDF_ASSET_TIMEOUT_SECS", 10)?,
            },
            server,
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::Config(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::Config(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_env_u64(key: &str, default: u64) -> Result<u64, AppError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(val) => val
            .parse()
            .map_err(|e| AppError::Config(anyhow::anyhow!("{} must be an integer: {}", key, e))),
    }
}
