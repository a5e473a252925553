#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Espresso shot analysis (I/O-free).
//!
//! Takes a recorded shot (a time series of pressure, flow, weight and
//! temperature samples grouped into phases) and, optionally, the profile that
//! drove it, and explains what happened in each phase.
//!
//! ## Architecture
//!
//! - **Model**: shot, sample and profile records with their JSON wire names (`types`)
//! - **Segmentation**: grouping samples into phases with contiguous time spans (`segment`)
//! - **Statistics**: time-weighted start/end/min/max/avg per channel (`stats`)
//! - **Prediction**: projecting values across the sensor and scale delays (`predict`)
//! - **Exit detection**: which profile target ended each phase (`targets`)
//! - **Calibration**: choosing the sensor delay that explains more exits (`calibrate`)
//! - **Aggregation**: the full per-phase and whole-shot result (`metrics`)
//! - **Summary**: header facts such as dose, yield and ratio (`summary`)
//!
//! Everything here is a pure function of its inputs; the same shot, profile
//! and settings always produce the same result.

pub mod calibrate;
pub mod config;
pub mod conversions;
pub mod error;
pub mod metrics;
pub mod predict;
pub mod segment;
pub mod stats;
pub mod summary;
pub mod targets;
pub mod types;
pub mod util;

pub use calibrate::{DelayChoice, detect_auto_delay};
pub use config::{AnalysisCfg, Settings};
pub use error::{AnalysisError, Result};
pub use metrics::{ChannelStats, PhaseResult, ShotMetricsResult, TotalResult, calculate_shot_metrics};
pub use stats::MetricStats;
pub use summary::{ShotSummary, find_profile_for_shot};
pub use targets::{ExitType, HitStrategy, PhaseExit, stop_reason_label};
pub use types::{
    Channel, Operator, PhaseTransition, ProfilePhase, ProfileRecord, ProfileRef, Sample,
    ShotRecord, SystemInfo, Target, TargetType,
};

/// Analyse a shot end to end.
///
/// When `cfg.auto_sensor_delay` is set and a profile is given, the sensor
/// delay is first auto-calibrated; the result's `is_auto_adjusted` reports
/// whether the calibrated delay replaced the manual one.
pub fn analyze(
    shot: &ShotRecord,
    profile: Option<&ProfileRecord>,
    cfg: &AnalysisCfg,
) -> Result<ShotMetricsResult> {
    let mut settings = cfg.manual_settings();
    settings.validate()?;
    if shot.samples.is_empty() {
        return Err(eyre::Report::new(AnalysisError::MissingSamples));
    }

    if cfg.auto_sensor_delay {
        let choice = detect_auto_delay(shot, profile, cfg.sensor_delay_ms);
        settings.sensor_delay_ms = choice.delay_ms;
        settings.is_auto_adjusted = choice.auto;
    }

    tracing::debug!(
        samples = shot.samples.len(),
        has_profile = profile.is_some(),
        scale_delay_ms = settings.scale_delay_ms,
        sensor_delay_ms = settings.sensor_delay_ms,
        is_auto_adjusted = settings.is_auto_adjusted,
        "analysing shot"
    );
    calculate_shot_metrics(shot, profile, &settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_shot_is_rejected_before_calibration() {
        let err = analyze(&ShotRecord::default(), None, &AnalysisCfg::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AnalysisError>(),
            Some(&AnalysisError::MissingSamples)
        );
    }

    #[test]
    fn negative_delay_is_invalid() {
        let shot = ShotRecord::from_samples(vec![Sample::new(0, 0)]);
        let cfg = AnalysisCfg {
            sensor_delay_ms: -1.0,
            ..AnalysisCfg::default()
        };
        let err = analyze(&shot, None, &cfg).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::InvalidSettings(_))
        ));
    }

    #[test]
    fn without_profile_nothing_is_auto_adjusted() {
        let shot = ShotRecord::from_samples(vec![Sample::new(0, 0), Sample::new(1_000, 0)]);
        let r = analyze(&shot, None, &AnalysisCfg::default()).unwrap();
        assert!(!r.is_auto_adjusted);
        assert_eq!(r.phases.len(), 1);
    }
}
