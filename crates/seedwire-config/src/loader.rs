//! Environment lookup.
//!
//! # Design
//! - `load_from_lookup` takes the variable source as a closure so tests never
//!   touch the process environment.
//! - Blank values count as unset.

use tracing::debug;

use crate::error::ConfigResult;
use crate::model::RelayConfig;
use crate::validate::{
    parse_bind_addr, parse_buffer, parse_flag, parse_log_format, parse_millis, parse_port,
};

/// Prefix shared by every variable.
pub const ENV_PREFIX: &str = "SEEDWIRE_";

const BIND_ADDR: &str = "SEEDWIRE_BIND_ADDR";
const HTTP_PORT: &str = "SEEDWIRE_HTTP_PORT";
const PROGRESS_WINDOW_MS: &str = "SEEDWIRE_PROGRESS_WINDOW_MS";
const SELECTION_WINDOW_MS: &str = "SEEDWIRE_SELECTION_WINDOW_MS";
const STATS_INTERVAL_MS: &str = "SEEDWIRE_STATS_INTERVAL_MS";
const OUTBOUND_BUFFER: &str = "SEEDWIRE_OUTBOUND_BUFFER";
const LOG_LEVEL: &str = "SEEDWIRE_LOG_LEVEL";
const LOG_FORMAT: &str = "SEEDWIRE_LOG_FORMAT";
const DEMO: &str = "SEEDWIRE_DEMO";

/// Load configuration from the process environment.
///
/// # Errors
///
/// Returns the first validation failure encountered.
pub fn load_from_env() -> ConfigResult<RelayConfig> {
    load_from_lookup(|name| std::env::var(name).ok())
}

/// Load configuration from an arbitrary variable source.
///
/// # Errors
///
/// Returns the first validation failure encountered.
pub fn load_from_lookup<F>(lookup: F) -> ConfigResult<RelayConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    let mut config = RelayConfig::default();

    if let Some(raw) = get(BIND_ADDR) {
        config.bind_addr = parse_bind_addr(&raw)?;
    }
    if let Some(raw) = get(HTTP_PORT) {
        config.http_port = parse_port(HTTP_PORT, &raw)?;
    }
    if let Some(raw) = get(PROGRESS_WINDOW_MS) {
        config.progress_window = parse_millis(PROGRESS_WINDOW_MS, &raw)?;
    }
    if let Some(raw) = get(SELECTION_WINDOW_MS) {
        config.selection_window = parse_millis(SELECTION_WINDOW_MS, &raw)?;
    }
    if let Some(raw) = get(STATS_INTERVAL_MS) {
        config.stats_interval = parse_millis(STATS_INTERVAL_MS, &raw)?;
    }
    if let Some(raw) = get(OUTBOUND_BUFFER) {
        config.outbound_buffer = parse_buffer(OUTBOUND_BUFFER, &raw)?;
    }
    if let Some(raw) = get(LOG_LEVEL) {
        config.log_level = raw.trim().to_string();
    }
    if let Some(raw) = get(LOG_FORMAT) {
        config.log_format = Some(parse_log_format(LOG_FORMAT, &raw)?);
    }
    if let Some(raw) = get(DEMO) {
        config.demo = parse_flag(DEMO, &raw)?;
    }

    debug!(addr = %config.socket_addr(), demo = config.demo, "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::error::ConfigError;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() -> ConfigResult<()> {
        let config = load_from_lookup(lookup(&[]))?;
        assert_eq!(config, RelayConfig::default());
        Ok(())
    }

    #[test]
    fn overrides_are_applied() -> ConfigResult<()> {
        let config = load_from_lookup(lookup(&[
            (BIND_ADDR, "0.0.0.0"),
            (HTTP_PORT, "9000"),
            (PROGRESS_WINDOW_MS, "500"),
            (SELECTION_WINDOW_MS, "750"),
            (STATS_INTERVAL_MS, "2000"),
            (OUTBOUND_BUFFER, "32"),
            (LOG_LEVEL, "seedwire_relay=debug"),
            (LOG_FORMAT, "json"),
            (DEMO, "yes"),
        ]))?;
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.progress_window, Duration::from_millis(500));
        assert_eq!(config.selection_window, Duration::from_millis(750));
        assert_eq!(config.stats_interval, Duration::from_secs(2));
        assert_eq!(config.outbound_buffer, 32);
        assert_eq!(config.log_level, "seedwire_relay=debug");
        assert_eq!(config.log_format.as_deref(), Some("json"));
        assert!(config.demo);
        Ok(())
    }

    #[test]
    fn blank_values_fall_back_to_defaults() -> ConfigResult<()> {
        let config = load_from_lookup(lookup(&[(HTTP_PORT, "  "), (DEMO, "")]))?;
        assert_eq!(config.http_port, RelayConfig::default().http_port);
        Ok(())
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = load_from_lookup(lookup(&[(STATS_INTERVAL_MS, "0")])).expect_err("invalid");
        assert_eq!(
            err,
            ConfigError::InvalidField {
                field: STATS_INTERVAL_MS,
                value: Some("0".into()),
                reason: "must be greater than zero",
            }
        );
        assert_eq!(err.to_string(), "invalid configuration field");
    }

    #[test]
    fn every_variable_shares_the_prefix() {
        for name in [
            BIND_ADDR,
            HTTP_PORT,
            PROGRESS_WINDOW_MS,
            SELECTION_WINDOW_MS,
            STATS_INTERVAL_MS,
            OUTBOUND_BUFFER,
            LOG_LEVEL,
            LOG_FORMAT,
            DEMO,
        ] {
            assert!(name.starts_with(ENV_PREFIX), "{name}");
        }
    }
}
