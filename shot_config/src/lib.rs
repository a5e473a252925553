#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the shot analyser.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; `Config::default()` is a valid configuration.
use serde::Deserialize;
use std::path::Path;

/// Upper bound for any configured delay (ms).
pub const MAX_DELAY_MS: f64 = 60_000.0;

pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
pub const LOG_ROTATIONS: [&str; 3] = ["never", "daily", "hourly"];

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Analysis {
    /// Delay used to project the scale reading past a phase boundary.
    pub scale_delay_ms: f64,
    /// Delay used to project pressure, flow and pumped volume.
    pub sensor_delay_ms: f64,
    /// Try a high-latency sensor delay and keep it if it explains more exits.
    pub auto_sensor_delay: bool,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            scale_delay_ms: 800.0,
            sensor_delay_ms: 200.0,
            auto_sensor_delay: true,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Output {
    pub format: OutputFormat,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub analysis: Analysis,
    pub logging: Logging,
    pub output: Output,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config {}: {e}", path.display()))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid config {}: {e}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

fn delay_ok(ms: f64) -> bool {
    ms.is_finite() && (0.0..=MAX_DELAY_MS).contains(&ms)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Analysis
        if !delay_ok(self.analysis.scale_delay_ms) {
            eyre::bail!("analysis.scale_delay_ms must be finite and in [0, 60000]");
        }
        if !delay_ok(self.analysis.sensor_delay_ms) {
            eyre::bail!("analysis.sensor_delay_ms must be finite and in [0, 60000]");
        }

        // Logging
        if let Some(level) = &self.logging.level
            && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            eyre::bail!("logging.level must be one of error|warn|info|debug|trace, got {level:?}");
        }
        if let Some(rotation) = &self.logging.rotation
            && !LOG_ROTATIONS.contains(&rotation.to_ascii_lowercase().as_str())
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rotation:?}");
        }

        // Output: serde restricts to known formats

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let cfg = load_toml("").unwrap();
        assert_eq!(cfg, Config::default());
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = load_toml("[analysis]\nsensor_delay_ms = 150.0\n").unwrap();
        assert_eq!(cfg.analysis.sensor_delay_ms, 150.0);
        assert_eq!(cfg.analysis.scale_delay_ms, 800.0);
        assert!(cfg.analysis.auto_sensor_delay);
    }
}
