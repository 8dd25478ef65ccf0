//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Recurring scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger configuration.
///
/// Bank-backed chart of account codes are generated as `{prefix}-{suffix}`;
/// the prefixes keep them out of the numeric range users pick for their own
/// accounts.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Code prefix for bank accounts mapped to assets.
    #[serde(default = "default_asset_code_prefix")]
    pub asset_code_prefix: String,
    /// Code prefix for bank accounts mapped to liabilities.
    #[serde(default = "default_liability_code_prefix")]
    pub liability_code_prefix: String,
}

fn default_asset_code_prefix() -> String {
    "BANK".to_string()
}

fn default_liability_code_prefix() -> String {
    "CRED".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            asset_code_prefix: default_asset_code_prefix(),
            liability_code_prefix: default_liability_code_prefix(),
        }
    }
}

/// Recurring entry scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// How many companies are processed concurrently by one runner.
    #[serde(default = "default_max_concurrent_companies")]
    pub max_concurrent_companies: usize,
}

fn default_max_concurrent_companies() -> usize {
    4
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_companies: default_max_concurrent_companies(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "tally=info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment_with_defaults() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally_test")),
                ("RUN_MODE", Some("test")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/tally_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.ledger.asset_code_prefix, "BANK");
                assert_eq!(config.ledger.liability_code_prefix, "CRED");
                assert_eq!(config.scheduler.max_concurrent_companies, 4);
                assert_eq!(config.log.filter, "tally=info");
                assert!(!config.log.json);
            },
        );
    }

    #[test]
    fn test_load_overrides_nested_sections() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally_test")),
                ("TALLY__LEDGER__ASSET_CODE_PREFIX", Some("1900")),
                ("TALLY__LOG__FILTER", Some("tally=debug")),
                ("RUN_MODE", Some("test")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.ledger.asset_code_prefix, "1900");
                assert_eq!(config.ledger.liability_code_prefix, "CRED");
                assert_eq!(config.log.filter, "tally=debug");
            },
        );
    }

    #[test]
    fn test_load_fails_without_database_url() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
