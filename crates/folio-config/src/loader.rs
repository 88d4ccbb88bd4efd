//! Configuration loader with layered sources.

use crate::{AppConfig, CacheBackend};
use config::{Config, ConfigError, Environment, File};
use folio_core::FolioError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `FOLIO__` prefix
    pub fn new(config_dir: impl Into<String>) -> Result<Self, FolioError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, FolioError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    pub async fn reload(&self) -> Result<(), FolioError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Loads configuration from the specified directory.
    fn load_config(config_dir: &str) -> Result<AppConfig, FolioError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("FOLIO_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("FOLIO")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_folio_error)?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_folio_error)?;

        validate_config(&app_config)?;

        Ok(app_config)
    }

    /// Gets a specific configuration value by key path.
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;

        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }

        serde_json::from_value(current.clone()).ok()
    }
}

/// Validates the configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), FolioError> {
    let pagination = &config.pagination;
    if pagination.max_limit == 0 {
        return Err(FolioError::Configuration("pagination.max_limit must be positive".to_string()));
    }
    if pagination.default_limit == 0 || pagination.default_limit > pagination.max_limit {
        return Err(FolioError::Configuration(
            "pagination.default_limit must be between 1 and max_limit".to_string(),
        ));
    }
    if pagination.cursor_version == 0 {
        return Err(FolioError::Configuration("pagination.cursor_version must be positive".to_string()));
    }
    if pagination.id_field.trim().is_empty() {
        return Err(FolioError::Configuration("pagination.id_field is required".to_string()));
    }

    let cache = &config.cache;
    if cache.key_prefix.trim().is_empty() {
        return Err(FolioError::Configuration("cache.key_prefix is required".to_string()));
    }
    if cache.by_id_ttl_secs == 0
        || cache.query_ttl_secs == 0
        || cache.list_ttl_secs == 0
        || cache.version_ttl_secs == 0
    {
        return Err(FolioError::Configuration("cache TTLs must be positive".to_string()));
    }
    if cache.enabled && cache.backend == CacheBackend::Redis && config.redis.url.is_empty() {
        return Err(FolioError::Configuration(
            "Redis URL is required for the redis cache backend".to_string(),
        ));
    }

    Ok(())
}

fn config_error_to_folio_error(err: ConfigError) -> FolioError {
    FolioError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.pagination.max_limit, 100);
        assert_eq!(config.cache.key_prefix, "folio:cache");
    }

    #[test]
    fn test_rejects_default_limit_above_max() {
        let mut config = AppConfig::default();
        config.pagination.default_limit = 500;
        assert!(matches!(validate_config(&config), Err(FolioError::Configuration(_))));
    }

    #[test]
    fn test_rejects_zero_cursor_version() {
        let mut config = AppConfig::default();
        config.pagination.cursor_version = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_redis_backend_without_url() {
        let mut config = AppConfig::default();
        config.cache.backend = CacheBackend::Redis;
        config.redis.url = String::new();
        assert!(validate_config(&config).is_err());

        config.cache.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_loads_default_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[pagination]\nmax_limit = 50\ncursor_version = 3\n\n[cache]\nlist_ttl_secs = 30\n",
        )
        .unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy().to_string()).unwrap();
        let config = loader.get().await;
        assert_eq!(config.pagination.max_limit, 50);
        assert_eq!(config.pagination.cursor_version, 3);
        assert_eq!(config.pagination.default_limit, 20);
        assert_eq!(config.cache.list_ttl_secs, 30);

        let version: Option<u32> = loader.get_value("pagination.cursor_version").await;
        assert_eq!(version, Some(3));
    }

    #[tokio::test]
    async fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[pagination]\nmax_limit = 0\n").unwrap();

        let result = ConfigLoader::new(dir.path().to_string_lossy().to_string());
        assert!(matches!(result, Err(FolioError::Configuration(_))));
    }
}
