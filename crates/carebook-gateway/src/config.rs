use std::time::Duration;

use carebook_core::PATIENT_FILES_BUCKET;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Gateway configuration, loaded once at startup by [`loader::load_config`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl GatewayConfig {
    /// Checks every setting the gateway cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.backend.url.trim();
        if url.is_empty() {
            return Err(ConfigError::invalid("backend.url", "must not be empty"));
        }
        let parsed = url::Url::parse(url)
            .map_err(|e| ConfigError::invalid("backend.url", format!("is not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "backend.url",
                format!("must use http or https, got {}", parsed.scheme()),
            ));
        }
        if self.backend.anon_key.trim().is_empty() {
            return Err(ConfigError::invalid("backend.anon_key", "must not be empty"));
        }
        if self.backend.timeout_ms == 0 {
            return Err(ConfigError::invalid("backend.timeout_ms", "must be > 0"));
        }
        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::invalid("storage.bucket", "must not be empty"));
        }
        if self.storage.signed_url_ttl_secs == 0 {
            return Err(ConfigError::invalid("storage.signed_url_ttl_secs", "must be > 0"));
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("must be one of {valid_levels:?}"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Project URL of the hosted backend.
    #[serde(default)]
    pub url: String,
    /// Public (anonymous) access key.
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Lifetime of issued signed URLs.
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,
}

fn default_bucket() -> String {
    PATIENT_FILES_BUCKET.into()
}

fn default_signed_url_ttl_secs() -> u64 {
    3600
}

impl StorageSettings {
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            signed_url_ttl_secs: default_signed_url_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::GatewayConfig;
    use crate::error::ConfigError;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    /// File read when no explicit path is given, if present.
    pub const DEFAULT_CONFIG_FILE: &str = "carebook.toml";

    /// Prefix of environment overrides, e.g. `CAREBOOK__BACKEND__URL`.
    pub const ENV_PREFIX: &str = "CAREBOOK";

    /// Loads the optional config file, applies environment overrides and
    /// validates the result.
    ///
    /// An explicit `path` must exist; the default file is skipped when absent.
    pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
        load_config_with_env(path, None)
    }

    /// Like [`load_config`], reading overrides from `env` instead of the
    /// process environment when given.
    pub fn load_config_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<GatewayConfig, ConfigError> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::MissingFile(p.to_path_buf()));
                }
                builder = builder.add_source(File::from(p.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__")
                .source(env),
        );

        let merged: GatewayConfig = builder.build()?.try_deserialize()?;
        merged.validate()?;
        tracing::debug!(
            url = %merged.backend.url,
            bucket = %merged.storage.bucket,
            "configuration loaded"
        );
        Ok(merged)
    }
}
