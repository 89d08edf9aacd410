use anyhow::{Result, bail};
use serde::Serialize;
use std::str::FromStr;

/// Environment variable consulted when `--format` is not given.
pub const FORMAT_ENV: &str = "SEMCONF_FORMAT";

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain text, one line per item
    #[default]
    Text,
    /// JSON - machine-parseable
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => bail!("Invalid format '{s}'. Use: text or json"),
        }
    }
}

impl OutputFormat {
    /// Pick the effective format: the explicit flag, then `SEMCONF_FORMAT`,
    /// then text.
    pub fn resolve(explicit: Option<Self>) -> Self {
        explicit
            .or_else(|| {
                std::env::var(FORMAT_ENV)
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or_default()
    }

    /// Serialize data as pretty JSON.
    pub fn to_json<T: Serialize>(data: &T) -> Result<String> {
        serde_json::to_string_pretty(data)
            .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))
    }
}
