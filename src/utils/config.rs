// utils/config.rs
use crate::utils::error::{ApiError, Result};
use dotenv::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    // API distante
    pub api_url: String,
    pub request_timeout_seconds: u64,

    // Cache des lectures
    pub cache_stale_seconds: u64,
    pub read_retries: u32,
    pub read_retry_delay_ms: u64,

    // Listes et filtres
    pub filter_debounce_ms: u64,
    pub default_page_size: u32,

    // Session
    pub credentials_path: PathBuf,
    pub login_path: String,

    // Valeurs par défaut des créneaux d'examen
    pub default_wilaya: String,
    pub default_center: String,

    // Logging
    pub log_level: String,
    pub log_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            request_timeout_seconds: 30,
            cache_stale_seconds: 30,
            read_retries: 1,
            read_retry_delay_ms: 1000,
            filter_debounce_ms: 300,
            default_page_size: 20,
            credentials_path: PathBuf::from(".auto-ecole/credentials.json"),
            login_path: "/auth/login".to_string(),
            default_wilaya: "M'Sila".to_string(),
            default_center: "Magra".to_string(),
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl ClientConfig {
    /// Charger la configuration depuis les variables d'environnement
    pub fn from_env() -> Result<Self> {
        // Charger le fichier .env si présent
        let _ = dotenv().ok();

        let defaults = Self::default();

        let config = ClientConfig {
            api_url: string_var("API_URL", &defaults.api_url),
            request_timeout_seconds: parsed_var(
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            )?,

            cache_stale_seconds: parsed_var("CACHE_STALE_SECONDS", defaults.cache_stale_seconds)?,
            read_retries: parsed_var("READ_RETRIES", defaults.read_retries)?,
            read_retry_delay_ms: parsed_var("READ_RETRY_DELAY_MS", defaults.read_retry_delay_ms)?,

            filter_debounce_ms: parsed_var("FILTER_DEBOUNCE_MS", defaults.filter_debounce_ms)?,
            default_page_size: parsed_var("DEFAULT_PAGE_SIZE", defaults.default_page_size)?,

            credentials_path: env::var("CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.credentials_path),
            login_path: string_var("LOGIN_PATH", &defaults.login_path),

            default_wilaya: string_var("DEFAULT_WILAYA", &defaults.default_wilaya),
            default_center: string_var("DEFAULT_CENTER", &defaults.default_center),

            log_level: string_var("LOG_LEVEL", &defaults.log_level),
            log_format: string_var("LOG_FORMAT", &defaults.log_format),
        };

        config.validate()?;
        Ok(config)
    }

    /// Remplacer l'URL de l'API (tests, CLI)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(ApiError::Config(format!(
                "API_URL must start with http:// or https://: {}",
                self.api_url
            )));
        }
        if self.default_page_size == 0 {
            return Err(ApiError::Config("DEFAULT_PAGE_SIZE must be positive".to_string()));
        }
        if !self.login_path.starts_with('/') {
            return Err(ApiError::Config("LOGIN_PATH must start with '/'".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.cache_stale_seconds)
    }

    pub fn read_retry_delay(&self) -> Duration {
        Duration::from_millis(self.read_retry_delay_ms)
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }
}

fn string_var(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ApiError::Config(format!("{} must be a number", name))),
        Err(_) => Ok(default),
    }
}
