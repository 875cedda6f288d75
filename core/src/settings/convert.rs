//! Converters for values sourced from environment variables.
//!
//! A converter turns the raw (already trimmed) string form of a setting
//! into its typed value. Errors are plain strings; the caller wraps them
//! with the setting name and raw value for context.

use log::LevelFilter;

/// Parse a boolean from its common textual spellings.
///
/// Accepts `yes`/`y`/`true`/`t`/`on`/`1` and `no`/`n`/`false`/`f`/`off`/`0`,
/// case-insensitively.
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "on" | "1" => Ok(true),
        "no" | "n" | "false" | "f" | "off" | "0" => Ok(false),
        _ => Err(format!("'{raw}' is not a valid boolean")),
    }
}

/// Parse a log level filter by name (`off`, `error`, `warn`, `info`,
/// `debug`, `trace`), case-insensitively.
pub fn parse_level(raw: &str) -> Result<LevelFilter, String> {
    match raw.to_ascii_lowercase().as_str() {
        "off" => Ok(LevelFilter::Off),
        "error" => Ok(LevelFilter::Error),
        "warn" | "warning" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        _ => Err(format!("'{raw}' is not a valid log level")),
    }
}

/// Parse an unsigned 64-bit integer.
pub fn parse_u64(raw: &str) -> Result<u64, String> {
    raw.parse::<u64>()
        .map_err(|e| format!("'{raw}' is not a valid integer: {e}"))
}

/// Parse an unsigned 32-bit integer.
pub fn parse_u32(raw: &str) -> Result<u32, String> {
    raw.parse::<u32>()
        .map_err(|e| format!("'{raw}' is not a valid integer: {e}"))
}

/// Identity converter for settings that are plain strings.
pub fn parse_string(raw: &str) -> Result<String, String> {
    Ok(raw.to_string())
}
