//! Assembly of the full shot analysis.

use serde::Serialize;

use crate::config::Settings;
use crate::error::{AnalysisError, Result};
use crate::segment::{PhaseSegment, find_segment, segment_phases};
use crate::stats::{MetricStats, integrate, metric_stats};
use crate::targets::{Boundary, PhaseExit, evaluate_exit};
use crate::types::{Channel, ProfilePhase, ProfileRecord, Sample, ShotRecord};
use crate::util::elapsed_secs;

/// Per-channel statistics for a phase or for the whole shot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub pressure: MetricStats,
    pub target_pressure: MetricStats,
    pub flow: MetricStats,
    pub target_flow: MetricStats,
    pub puck_flow: MetricStats,
    pub temperature: MetricStats,
    pub target_temperature: MetricStats,
    pub weight: MetricStats,
}

impl ChannelStats {
    pub fn from_samples<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = &'a Sample>,
        I::IntoIter: Clone,
    {
        let iter = samples.into_iter();
        let of = |channel| metric_stats(iter.clone(), channel);
        Self {
            pressure: of(Channel::Pressure),
            target_pressure: of(Channel::TargetPressure),
            flow: of(Channel::Flow),
            target_flow: of(Channel::TargetFlow),
            puck_flow: of(Channel::PuckFlow),
            temperature: of(Channel::Temperature),
            target_temperature: of(Channel::TargetTemperature),
            weight: of(Channel::Weight),
        }
    }

    /// Stats for `channel`; `ScaleFlow` is not aggregated and yields `None`.
    pub fn get(&self, channel: Channel) -> Option<&MetricStats> {
        match channel {
            Channel::Pressure => Some(&self.pressure),
            Channel::TargetPressure => Some(&self.target_pressure),
            Channel::Flow => Some(&self.flow),
            Channel::TargetFlow => Some(&self.target_flow),
            Channel::PuckFlow => Some(&self.puck_flow),
            Channel::Temperature => Some(&self.temperature),
            Channel::TargetTemperature => Some(&self.target_temperature),
            Channel::Weight => Some(&self.weight),
            Channel::ScaleFlow => None,
        }
    }
}

/// Analysis of one phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseResult {
    pub number: i64,
    /// Name from the shot's phase transitions.
    pub name: Option<String>,
    pub display_name: String,
    /// Seconds since shot start.
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    /// Water pumped during the phase (ml).
    pub water: f64,
    /// Cup weight at the phase's last sample (g).
    pub weight: f64,
    pub stats: ChannelStats,
    pub exit: PhaseExit,
    pub profile_phase: Option<ProfilePhase>,
    /// Scale reported disconnected during this phase.
    pub scale_lost: bool,
    /// Scale reported disconnected in this or any earlier phase.
    pub scale_permanently_lost: bool,
    pub predicted_final_weight: Option<f64>,
}

/// Whole-shot aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalResult {
    pub duration: f64,
    pub water: f64,
    pub weight: f64,
    pub stats: ChannelStats,
}

/// Immutable result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotMetricsResult {
    pub is_brew_by_weight: bool,
    pub global_scale_lost: bool,
    pub is_auto_adjusted: bool,
    pub phases: Vec<PhaseResult>,
    pub total: TotalResult,
    pub raw_samples: Vec<Sample>,
    /// Timestamp (ms) of the first sample.
    pub start_time: i64,
}

/// Analyse `shot` against an optional `profile` using the delays in `settings`.
///
/// Fails only when the shot has no samples or the settings are unusable.
pub fn calculate_shot_metrics(
    shot: &ShotRecord,
    profile: Option<&ProfileRecord>,
    settings: &Settings,
) -> Result<ShotMetricsResult> {
    settings.validate()?;
    let (Some(first), Some(last)) = (shot.samples.first(), shot.samples.last()) else {
        return Err(eyre::Report::new(AnalysisError::MissingSamples));
    };

    let is_brew_by_weight = first.started_volumetric();
    let global_scale_lost =
        is_brew_by_weight && shot.samples.iter().any(Sample::scale_disconnected);

    let segments = segment_phases(shot);
    let mut scale_lost_so_far = false;
    let mut phases = Vec::with_capacity(segments.len());
    for seg in &segments {
        let scale_lost = is_brew_by_weight && seg.samples.iter().any(|s| s.scale_disconnected());
        scale_lost_so_far |= scale_lost;
        phases.push(analyze_phase(
            seg,
            &segments,
            profile,
            settings,
            scale_lost,
            scale_lost_so_far,
        ));
    }

    let total = TotalResult {
        duration: elapsed_secs(first.t, last.t),
        water: integrate(&shot.samples, Channel::Flow),
        weight: last.value(Channel::Weight),
        stats: ChannelStats::from_samples(&shot.samples),
    };

    tracing::debug!(
        phases = phases.len(),
        duration_s = total.duration,
        is_brew_by_weight,
        global_scale_lost,
        "shot analysed"
    );

    Ok(ShotMetricsResult {
        is_brew_by_weight,
        global_scale_lost,
        is_auto_adjusted: settings.is_auto_adjusted,
        phases,
        total,
        raw_samples: shot.samples.clone(),
        start_time: first.t,
    })
}

fn analyze_phase(
    seg: &PhaseSegment<'_>,
    segments: &[PhaseSegment<'_>],
    profile: Option<&ProfileRecord>,
    settings: &Settings,
    scale_lost: bool,
    scale_permanently_lost: bool,
) -> PhaseResult {
    let water = seg.pumped_volume();
    let duration = seg.duration();
    let profile_phase = profile.and_then(|p| p.phase_named(seg.name.unwrap_or("")));

    let (exit, predicted_final_weight) = match profile_phase {
        Some(pp) => {
            let boundary = Boundary {
                profile_phase: pp,
                duration: seg.sample_span(),
                prev: seg.penultimate(),
                last: seg.last(),
                pumped: water,
                next_first: find_segment(segments, seg.number.saturating_add(1))
                    .map(|next| next.first()),
                scale_lost: scale_permanently_lost,
            };
            let d = evaluate_exit(&boundary, settings);
            (d.exit, d.predicted_weight)
        }
        None => {
            if profile.is_some() {
                tracing::debug!(phase = seg.number, "no matching profile phase");
            }
            (PhaseExit::default(), None)
        }
    };

    PhaseResult {
        number: seg.number,
        name: seg.name.map(str::to_string),
        display_name: seg.display_name(),
        start: seg.start,
        end: seg.end,
        duration,
        water,
        weight: seg.last().value(Channel::Weight),
        stats: ChannelStats::from_samples(seg.samples.iter().copied()),
        exit,
        profile_phase: profile_phase.cloned(),
        scale_lost,
        scale_permanently_lost,
        predicted_final_weight,
    }
}
