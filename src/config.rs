use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::domain::{PriceSeries, SyntheticPriceConfig};
use crate::error::Result;
use crate::rl::config::{EnvironmentConfig, HeuristicConfig, TrainingConfig, SYNTHETIC_SOURCE};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: EnvironmentConfig,
    /// Generator settings used when `environment.data_source` is `synthetic`
    pub synthetic: SyntheticPriceConfig,
    pub heuristics: HeuristicConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default `config` directory
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> std::result::Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("environment.data_source", SYNTHETIC_SOURCE)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("BATTERY_ARB_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (BATTERY_ARB_ENVIRONMENT__MAX_STEPS, etc.)
            .add_source(
                Environment::with_prefix("BATTERY_ARB")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate every section, reporting the first failing one
    pub fn validate(&self) -> Result<()> {
        self.environment.validate()?;
        self.training.validate()?;
        Ok(())
    }

    /// Effective configuration rendered as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolve a price locator (`synthetic` or a CSV/JSON path).
    ///
    /// `None` falls back to `environment.data_source`.
    pub fn load_prices(&self, locator: Option<&str>) -> Result<Arc<PriceSeries>> {
        let locator = locator.unwrap_or(&self.environment.data_source);

        let series = if locator.eq_ignore_ascii_case(SYNTHETIC_SOURCE) {
            PriceSeries::synthetic(&self.synthetic)?
        } else {
            PriceSeries::load(locator)?
        };

        Ok(Arc::new(series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_without_files_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path()).unwrap();

        assert_eq!(config.environment, EnvironmentConfig::default());
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            r#"
[environment]
max_steps = 48
settlement = "nominal"

[environment.battery]
capacity = 20.0

[training]
episodes = 5
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.environment.max_steps, 48);
        assert_eq!(
            config.environment.settlement,
            crate::rl::config::SettlementPolicy::Nominal
        );
        assert_eq!(config.environment.battery.capacity, 20.0);
        assert_eq!(config.environment.battery.charge_rate, 2.0);
        assert_eq!(config.training.episodes, 5);
        assert_eq!(config.training.learning_rate, 0.1);
    }

    #[test]
    fn test_validate_rejects_bad_battery() {
        let mut config = AppConfig::default();
        config.environment.battery.efficiency = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[environment.battery]"));

        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_synthetic_prices() {
        let mut config = AppConfig::default();
        config.synthetic.steps = 48;

        let prices = config.load_prices(None).unwrap();
        assert_eq!(prices.len(), 48);
        assert!(prices.source().starts_with(SYNTHETIC_SOURCE));
    }
}
