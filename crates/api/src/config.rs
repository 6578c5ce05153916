//! Application configuration.
//!
//! Layered, later sources win:
//! 1. built-in defaults
//! 2. `config/piggybank.toml` (optional)
//! 3. environment variables prefixed `PIGGYBANK`, nested with `__`
//!    (e.g. `PIGGYBANK__SERVER__BIND=127.0.0.1:9000`)

use std::path::PathBuf;

use serde::Deserialize;

use piggybank_infra::PageLimits;
use piggybank_observability::LogFormat;

pub const DEFAULT_CONFIG_FILE: &str = "config/piggybank";
pub const ENV_PREFIX: &str = "PIGGYBANK";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transactions: TransactionsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive; `RUST_LOG` overrides it.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory for per-owner JSON snapshots. Memory-only when unset.
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "max_page_size")]
    pub max_page_size: u32,
}

impl Default for TransactionsConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: max_page_size(),
        }
    }
}

impl TransactionsConfig {
    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn max_page_size() -> u32 {
    500
}

impl AppConfig {
    /// Load from `config/piggybank.toml` (if present) and the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Some(DEFAULT_CONFIG_FILE))
    }

    /// Load from an optional file (extension inferred) plus the environment.
    pub fn load_from(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        let t = &self.transactions;
        if t.default_page_size == 0 || t.max_page_size == 0 || t.default_page_size > t.max_page_size {
            return Err(config::ConfigError::Message(format!(
                "transactions.default_page_size ({}) must be between 1 and transactions.max_page_size ({})",
                t.default_page_size, t.max_page_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_sources() {
        let config = AppConfig::load_from(None).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.transactions.default_page_size, 50);
        assert_eq!(config.transactions.max_page_size, 500);
        assert!(config.storage.snapshot_dir.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("piggybank.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
bind = "127.0.0.1:9999"

[log]
format = "pretty"

[storage]
snapshot_dir = "/tmp/piggybank"

[transactions]
default_page_size = 20
"#
        )
        .unwrap();

        let config = AppConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9999");
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert_eq!(config.log.filter, "info");
        assert_eq!(config.storage.snapshot_dir, Some(PathBuf::from("/tmp/piggybank")));
        assert_eq!(config.transactions.default_page_size, 20);
        assert_eq!(config.transactions.max_page_size, 500);
    }

    #[test]
    fn inconsistent_page_sizes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[transactions]\ndefault_page_size = 600\n").unwrap();

        assert!(AppConfig::load_from(path.to_str()).is_err());
    }
}
