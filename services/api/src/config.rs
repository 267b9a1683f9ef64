//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub generation_base_url: String,
    pub generation_api_key: Option<String>,
    pub generation_model: String,
    pub storage_base_url: String,
    pub renderer_base_url: String,
    pub cors_origin: String,
    pub export_scale: f32,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Collaborator Endpoints ---
        let generation_base_url = std::env::var("GENERATION_BASE_URL")
            .map_err(|_| ConfigError::MissingVar("GENERATION_BASE_URL".to_string()))?;
        let generation_api_key = std::env::var("GENERATION_API_KEY").ok();
        let generation_model =
            std::env::var("GENERATION_MODEL").unwrap_or_else(|_| "draft-writer-1".to_string());

        let storage_base_url = std::env::var("STORAGE_BASE_URL")
            .map_err(|_| ConfigError::MissingVar("STORAGE_BASE_URL".to_string()))?;
        let renderer_base_url = std::env::var("RENDERER_BASE_URL")
            .map_err(|_| ConfigError::MissingVar("RENDERER_BASE_URL".to_string()))?;

        // --- Load Export and Web Settings ---
        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let export_scale_str =
            std::env::var("EXPORT_SCALE").unwrap_or_else(|_| "2.0".to_string());
        let export_scale = export_scale_str.parse::<f32>().map_err(|_| {
            ConfigError::InvalidValue(
                "EXPORT_SCALE".to_string(),
                format!("'{}' is not a valid scale factor", export_scale_str),
            )
        })?;
        if export_scale <= 0.0 {
            return Err(ConfigError::InvalidValue(
                "EXPORT_SCALE".to_string(),
                "scale factor must be positive".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            generation_base_url,
            generation_api_key,
            generation_model,
            storage_base_url,
            renderer_base_url,
            cors_origin,
            export_scale,
        })
    }
}
