//! Per-field parsing for environment values.
//!
//! Every parser receives the variable name so errors identify the field.

use std::net::IpAddr;
use std::time::Duration;

use crate::defaults::{MAX_OUTBOUND_BUFFER, MAX_WINDOW};
use crate::error::{ConfigError, ConfigResult};

/// Parse a listener port in `1..=65535`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for non-numeric or zero ports.
pub fn parse_port(field: &'static str, raw: &str) -> ConfigResult<u16> {
    match raw.trim().parse::<u16>() {
        Ok(0) => Err(ConfigError::invalid(field, raw, "port must be non-zero")),
        Ok(port) => Ok(port),
        Err(_) => Err(ConfigError::invalid(field, raw, "port must be an integer")),
    }
}

/// Parse an IP address to bind.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBindAddr`] when the value is not an IP address.
pub fn parse_bind_addr(raw: &str) -> ConfigResult<IpAddr> {
    raw.trim()
        .parse::<IpAddr>()
        .map_err(|_| ConfigError::InvalidBindAddr {
            value: raw.to_string(),
        })
}

/// Parse a positive millisecond duration no longer than an hour.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for non-numeric, zero or oversized values.
pub fn parse_millis(field: &'static str, raw: &str) -> ConfigResult<Duration> {
    let millis = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::invalid(field, raw, "must be an integer millisecond count"))?;
    if millis == 0 {
        return Err(ConfigError::invalid(field, raw, "must be greater than zero"));
    }
    let duration = Duration::from_millis(millis);
    if duration > MAX_WINDOW {
        return Err(ConfigError::invalid(field, raw, "must not exceed one hour"));
    }
    Ok(duration)
}

/// Parse the per-connection outbound buffer size.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is zero or too large.
pub fn parse_buffer(field: &'static str, raw: &str) -> ConfigResult<usize> {
    let size = raw
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::invalid(field, raw, "must be an integer"))?;
    if size == 0 || size > MAX_OUTBOUND_BUFFER {
        return Err(ConfigError::invalid(field, raw, "must be between 1 and 65536"));
    }
    Ok(size)
}

/// Parse a boolean toggle (`1/true/yes/on` or `0/false/no/off`).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for any other value.
pub fn parse_flag(field: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(field, raw, "must be a boolean flag")),
    }
}

/// Parse the log format name.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] unless the value is `json` or `pretty`.
pub fn parse_log_format(field: &'static str, raw: &str) -> ConfigResult<String> {
    let format = raw.trim().to_ascii_lowercase();
    match format.as_str() {
        "json" | "pretty" => Ok(format),
        _ => Err(ConfigError::invalid(field, raw, "must be 'json' or 'pretty'")),
    }
}
