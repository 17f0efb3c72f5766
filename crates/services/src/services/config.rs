//! Runtime configuration read from the environment.

use std::time::Duration;

use thiserror::Error;

use super::obligation::WeeklyAnchor;

const DEFAULT_DATABASE_URL: &str = "sqlite://cooked.db";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub expo_access_token: Option<String>,
    pub weekly_anchor: WeeklyAnchor,
    /// Enables the in-process auto-fold sweep when set
    pub auto_fold_interval: Option<Duration>,
    pub sentry_dsn: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            expo_access_token: None,
            weekly_anchor: WeeklyAnchor::default(),
            auto_fold_interval: None,
            sentry_dsn: None,
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value,
            })?,
            None => defaults.port,
        };

        let weekly_anchor = match get("WEEKLY_ANCHOR") {
            Some(value) => value
                .trim()
                .to_lowercase()
                .parse::<WeeklyAnchor>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "WEEKLY_ANCHOR",
                    value,
                })?,
            None => defaults.weekly_anchor,
        };

        let auto_fold_interval = match get("AUTO_FOLD_INTERVAL_SECS") {
            Some(value) => {
                let secs = value.trim().parse::<u64>().unwrap_or(0);
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: "AUTO_FOLD_INTERVAL_SECS",
                        value,
                    });
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            host: get("HOST").unwrap_or(defaults.host),
            port,
            expo_access_token: get("EXPO_ACCESS_TOKEN"),
            weekly_anchor,
            auto_fold_interval,
            sentry_dsn: get("SENTRY_DSN"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<SchedulerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SchedulerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.database_url, "sqlite://cooked.db");
        assert_eq!(config.port, 3000);
        assert_eq!(config.weekly_anchor, WeeklyAnchor::Sunday);
        assert!(config.auto_fold_interval.is_none());
        assert!(config.expo_access_token.is_none());
    }

    #[test]
    fn test_reads_overrides() {
        let config = from_pairs(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("PORT", "8080"),
            ("WEEKLY_ANCHOR", "START_DATE"),
            ("AUTO_FOLD_INTERVAL_SECS", "900"),
            ("EXPO_ACCESS_TOKEN", "expo-token"),
        ])
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.port, 8080);
        assert_eq!(config.weekly_anchor, WeeklyAnchor::StartDate);
        assert_eq!(config.auto_fold_interval, Some(Duration::from_secs(900)));
        assert_eq!(config.expo_access_token.as_deref(), Some("expo-token"));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = from_pairs(&[("SENTRY_DSN", "  "), ("PORT", "")]).unwrap();
        assert!(config.sentry_dsn.is_none());
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            from_pairs(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
        assert!(matches!(
            from_pairs(&[("WEEKLY_ANCHOR", "monday")]),
            Err(ConfigError::InvalidValue { name: "WEEKLY_ANCHOR", .. })
        ));
        assert!(matches!(
            from_pairs(&[("AUTO_FOLD_INTERVAL_SECS", "0")]),
            Err(ConfigError::InvalidValue { name: "AUTO_FOLD_INTERVAL_SECS", .. })
        ));
    }
}
