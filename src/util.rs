//! Shared utility functions used across the codebase.

use chrono::{DateTime, TimeZone};

/// Parse an environment variable as a boolean, returning `default` if unset.
///
/// Recognises `1`, `true`, `yes`, `y`, `on` (case-insensitive) as `true`;
/// any other set value maps to `false`.
pub fn env_var_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => parse_bool(&value),
        Err(_) => default,
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// Name of a run's output folder: `output_<YYYY-mm-dd_HH-MM-SS>_<test>`.
pub fn output_folder_name<Tz: TimeZone>(test_name: &str, at: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("output_{}_{}", at.format("%Y-%m-%d_%H-%M-%S"), test_name)
}
