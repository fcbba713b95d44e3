//! Analytics configuration.
//!
//! The archive has a configured first trading day; lookback windows that
//! would reach before it are clamped to it rather than erroring or
//! returning a short series.

use serde::Deserialize;
use thiserror::Error;

use vol_core::types::Date;

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Underlying configuration source failed to load or deserialize.
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Runtime configuration for the analytics layer.
///
/// Loadable from a TOML file with `VOLTRA_`-prefixed environment
/// overrides, or constructed with [`Default`].
///
/// ```toml
/// data_start_date = "2005-01-03"
/// default_lookback_days = 252
/// ```
///
/// # Examples
/// ```
/// use vol_analytics::config::AnalyticsConfig;
/// use vol_core::types::Date;
///
/// let config = AnalyticsConfig::default();
/// let early = Date::from_ymd(1999, 6, 1).unwrap();
/// assert_eq!(config.clamp_window_start(early), config.data_start_date);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalyticsConfig {
    /// First trading day present in the archive.
    pub data_start_date: Date,
    /// Lookback window, in trading days, used when a caller does not
    /// specify one.
    pub default_lookback_days: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            // First day of the seeded archive.
            data_start_date: Date::from_ymd(2005, 1, 3).expect("valid constant date"),
            default_lookback_days: 252,
        }
    }
}

impl AnalyticsConfig {
    /// Loads configuration from a TOML file, then applies `VOLTRA_`
    /// environment variable overrides.
    ///
    /// # Errors
    /// `ConfigError::Load` when the file is missing/malformed or a field
    /// fails to deserialize.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("VOLTRA"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Clamps a lookback window start to the archive's first day.
    ///
    /// Windows never extend before the data start date; they are clamped,
    /// not shortened to an error.
    pub fn clamp_window_start(&self, window_start: Date) -> Date {
        if window_start < self.data_start_date {
            self.data_start_date
        } else {
            window_start
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.data_start_date, Date::from_ymd(2005, 1, 3).unwrap());
        assert_eq!(config.default_lookback_days, 252);
    }

    #[test]
    fn test_clamp_window_start_before_data_start() {
        let config = AnalyticsConfig::default();
        let early = Date::from_ymd(2003, 5, 1).unwrap();
        assert_eq!(config.clamp_window_start(early), config.data_start_date);
    }

    #[test]
    fn test_clamp_window_start_after_data_start() {
        let config = AnalyticsConfig::default();
        let later = Date::from_ymd(2019, 5, 1).unwrap();
        assert_eq!(config.clamp_window_start(later), later);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join("voltra_config_test.toml");
        std::fs::write(
            &path,
            "data_start_date = \"2010-06-01\"\ndefault_lookback_days = 504\n",
        )
        .unwrap();

        let config = AnalyticsConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.data_start_date, Date::from_ymd(2010, 6, 1).unwrap());
        assert_eq!(config.default_lookback_days, 504);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_from_file_missing() {
        let result = AnalyticsConfig::from_file("/nonexistent/voltra.toml");
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
