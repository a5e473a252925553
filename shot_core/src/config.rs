//! Configuration types for the analysis engine.
//!
//! These are the runtime structs passed to the engine. They are separate from
//! the TOML-deserialized config in `shot_config`.

use crate::error::{AnalysisError, Result};

/// Default delay (ms) used to project scale weight.
pub const DEFAULT_SCALE_DELAY_MS: f64 = 800.0;
/// Default delay (ms) used to project pressure, flow and pumped volume.
pub const DEFAULT_SENSOR_DELAY_MS: f64 = 200.0;

/// Resolved delays for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Lag of the scale behind the controller (ms).
    pub scale_delay_ms: f64,
    /// Lag of the pressure/flow sensors behind the controller (ms).
    pub sensor_delay_ms: f64,
    /// Reported back in the result; set when the sensor delay came from auto-calibration.
    pub is_auto_adjusted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scale_delay_ms: DEFAULT_SCALE_DELAY_MS,
            sensor_delay_ms: DEFAULT_SENSOR_DELAY_MS,
            is_auto_adjusted: false,
        }
    }
}

impl Settings {
    /// Reject delays the projections cannot use.
    pub fn validate(&self) -> Result<()> {
        check_delay(self.scale_delay_ms, "scale delay must be finite and >= 0")?;
        check_delay(self.sensor_delay_ms, "sensor delay must be finite and >= 0")
    }
}

/// Engine configuration: delays plus whether to auto-calibrate the sensor delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisCfg {
    pub scale_delay_ms: f64,
    /// Manual sensor delay; the starting point for auto-calibration.
    pub sensor_delay_ms: f64,
    /// Run the delay auto-calibrator before analysis.
    pub auto_sensor_delay: bool,
}

impl Default for AnalysisCfg {
    fn default() -> Self {
        Self {
            scale_delay_ms: DEFAULT_SCALE_DELAY_MS,
            sensor_delay_ms: DEFAULT_SENSOR_DELAY_MS,
            auto_sensor_delay: true,
        }
    }
}

impl AnalysisCfg {
    /// Settings that use the manual delays as given.
    pub fn manual_settings(&self) -> Settings {
        Settings {
            scale_delay_ms: self.scale_delay_ms,
            sensor_delay_ms: self.sensor_delay_ms,
            is_auto_adjusted: false,
        }
    }
}

fn check_delay(ms: f64, msg: &'static str) -> Result<()> {
    if ms.is_finite() && ms >= 0.0 {
        Ok(())
    } else {
        Err(eyre::Report::new(AnalysisError::InvalidSettings(msg)))
    }
}
