//! Command handlers: config mapping, input loading and engine calls.

use crate::cli::{DelayArgs, Format};
use crate::input::{load_profiles, load_shot, select_profile};
use crate::output::{write_delay_choice, write_metrics, write_summary};
use shot_core::{AnalysisCfg, ShotSummary, analyze, detect_auto_delay};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Config values with command-line overrides applied.
pub fn resolve_analysis_cfg(
    cfg: &shot_config::Config,
    delays: &DelayArgs,
    auto_delay: bool,
    no_auto_delay: bool,
) -> AnalysisCfg {
    // Builder/config mapping: use From impls from shot_core::conversions
    let mut a: AnalysisCfg = (&cfg.analysis).into();
    if let Some(ms) = delays.sensor_delay_ms {
        a.sensor_delay_ms = ms;
    }
    if let Some(ms) = delays.scale_delay_ms {
        a.scale_delay_ms = ms;
    }
    if auto_delay {
        a.auto_sensor_delay = true;
    } else if no_auto_delay {
        a.auto_sensor_delay = false;
    }
    a
}

#[allow(clippy::too_many_arguments)]
pub fn run_analyze(
    out: &mut impl Write,
    cfg: &shot_config::Config,
    shot_path: &Path,
    profile_paths: &[PathBuf],
    delays: &DelayArgs,
    auto_delay: bool,
    no_auto_delay: bool,
    format: Option<Format>,
) -> eyre::Result<()> {
    let shot = load_shot(shot_path)?;
    let profiles = load_profiles(profile_paths)?;
    let profile = select_profile(&shot, &profiles);
    let analysis = resolve_analysis_cfg(cfg, delays, auto_delay, no_auto_delay);

    let result = analyze(&shot, profile, &analysis)?;
    tracing::info!(
        phases = result.phases.len(),
        profile = profile.map(|p| p.label.as_str()),
        duration_s = result.total.duration,
        auto_adjusted = result.is_auto_adjusted,
        "analysis complete"
    );
    let format = format.unwrap_or_else(|| cfg.output.format.into());
    write_metrics(out, &result, format)
}

pub fn run_summary(
    out: &mut impl Write,
    cfg: &shot_config::Config,
    shot_path: &Path,
    format: Option<Format>,
) -> eyre::Result<()> {
    let shot = load_shot(shot_path)?;
    let summary = ShotSummary::from_shot(&shot);
    write_summary(out, &summary, format.unwrap_or_else(|| cfg.output.format.into()))
}

pub fn run_calibrate(
    out: &mut impl Write,
    cfg: &shot_config::Config,
    shot_path: &Path,
    profile_paths: &[PathBuf],
    sensor_delay_ms: Option<f64>,
    format: Option<Format>,
) -> eyre::Result<()> {
    let shot = load_shot(shot_path)?;
    let profiles = load_profiles(profile_paths)?;
    let profile = select_profile(&shot, &profiles);
    let delays = DelayArgs {
        sensor_delay_ms,
        scale_delay_ms: None,
    };
    let analysis = resolve_analysis_cfg(cfg, &delays, false, false);
    analysis.manual_settings().validate()?;

    let choice = detect_auto_delay(&shot, profile, analysis.sensor_delay_ms);
    write_delay_choice(out, &choice, format.unwrap_or_else(|| cfg.output.format.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cfg = shot_config::Config::default();
        let delays = DelayArgs {
            sensor_delay_ms: Some(350.0),
            scale_delay_ms: None,
        };
        let a = resolve_analysis_cfg(&cfg, &delays, false, true);
        assert_eq!(a.sensor_delay_ms, 350.0);
        assert_eq!(a.scale_delay_ms, 800.0);
        assert!(!a.auto_sensor_delay);
    }

    #[test]
    fn auto_flag_turns_calibration_back_on() {
        let mut cfg = shot_config::Config::default();
        cfg.analysis.auto_sensor_delay = false;
        let a = resolve_analysis_cfg(&cfg, &DelayArgs::default(), true, false);
        assert!(a.auto_sensor_delay);
    }
}
