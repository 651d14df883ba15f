use std::str::FromStr;

// ============================================================================
// Configuration - Environment-driven settings
// ============================================================================
//
//   EVENT_STORE_METRICS_PORT   metrics exporter port (0 disables it)
//   EVENT_STORE_LOG_FILTER     default tracing filter when RUST_LOG is unset
//   EVENT_STORE_SAVE_RETRIES   attempts per save, first one included
//
// Invalid values fall back to the default with a warning.
//
// ============================================================================

pub const METRICS_PORT_VAR: &str = "EVENT_STORE_METRICS_PORT";
pub const LOG_FILTER_VAR: &str = "EVENT_STORE_LOG_FILTER";
pub const SAVE_RETRIES_VAR: &str = "EVENT_STORE_SAVE_RETRIES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStoreConfig {
    pub metrics_port: u16,
    pub log_filter: String,
    pub save_retries: u32,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            metrics_port: 9090,
            log_filter: "info,timeline_event_store=debug".to_string(),
            save_retries: 3,
        }
    }
}

impl EventStoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            metrics_port: parse_or(&lookup, METRICS_PORT_VAR, defaults.metrics_port),
            log_filter: lookup(LOG_FILTER_VAR)
                .filter(|filter| !filter.trim().is_empty())
                .unwrap_or(defaults.log_filter),
            save_retries: parse_or(&lookup, SAVE_RETRIES_VAR, defaults.save_retries).max(1),
        }
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port != 0
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(name) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(
                    variable = name,
                    value = %raw,
                    default = %default,
                    "Invalid configuration value, using default"
                );
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> EventStoreConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EventStoreConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config, EventStoreConfig::default());
        assert!(config.metrics_enabled());
    }

    #[test]
    fn test_reads_every_variable() {
        let config = config_from(&[
            (METRICS_PORT_VAR, "0"),
            (LOG_FILTER_VAR, "warn"),
            (SAVE_RETRIES_VAR, "5"),
        ]);

        assert_eq!(config.metrics_port, 0);
        assert!(!config.metrics_enabled());
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.save_retries, 5);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            (METRICS_PORT_VAR, "not-a-port"),
            (LOG_FILTER_VAR, "  "),
            (SAVE_RETRIES_VAR, "0"),
        ]);

        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.log_filter, "info,timeline_event_store=debug");
        assert_eq!(config.save_retries, 1);
    }
}
