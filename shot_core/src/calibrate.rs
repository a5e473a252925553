//! Sensor-delay auto-calibration.
//!
//! Compares the user's sensor delay against a fixed high-latency candidate by
//! counting how many profile phases each one explains with a pressure, flow or
//! pumped target. Only measured and linearly projected values take part;
//! weight targets are left out because their projection uses the scale delay,
//! and tolerance/look-ahead hits belong to the full evaluator.

use serde::Serialize;

use crate::predict::Projection;
use crate::segment::{PhaseSegment, segment_phases};
use crate::types::{Channel, ProfileRecord, ShotRecord, Target, TargetType};

/// The fixed high-latency candidate (ms).
pub const AUTO_DELAY_CANDIDATE_MS: f64 = 800.0;

/// Delay selected by [`detect_auto_delay`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayChoice {
    pub delay_ms: f64,
    /// True when the candidate replaced the manual delay.
    pub auto: bool,
    pub manual_hits: usize,
    pub fallback_hits: usize,
}

/// Pick between `manual_delay_ms` and [`AUTO_DELAY_CANDIDATE_MS`].
///
/// The candidate is chosen only when it explains strictly more phases; ties
/// and a missing profile keep the manual delay.
pub fn detect_auto_delay(
    shot: &ShotRecord,
    profile: Option<&ProfileRecord>,
    manual_delay_ms: f64,
) -> DelayChoice {
    let manual = DelayChoice {
        delay_ms: manual_delay_ms,
        auto: false,
        manual_hits: 0,
        fallback_hits: 0,
    };
    let Some(profile) = profile else {
        return manual;
    };

    let segments = segment_phases(shot);
    let manual_hits = count_explained_phases(&segments, profile, manual_delay_ms);
    let fallback_hits = count_explained_phases(&segments, profile, AUTO_DELAY_CANDIDATE_MS);

    if fallback_hits > manual_hits {
        tracing::info!(
            manual_delay_ms,
            manual_hits,
            fallback_hits,
            delay_ms = AUTO_DELAY_CANDIDATE_MS,
            "sensor delay auto-adjusted"
        );
        DelayChoice {
            delay_ms: AUTO_DELAY_CANDIDATE_MS,
            auto: true,
            manual_hits,
            fallback_hits,
        }
    } else {
        DelayChoice {
            manual_hits,
            fallback_hits,
            ..manual
        }
    }
}

/// Number of profile-matched phases with at least one sensor target hit at
/// `delay_ms`.
pub fn count_explained_phases(
    segments: &[PhaseSegment<'_>],
    profile: &ProfileRecord,
    delay_ms: f64,
) -> usize {
    segments
        .iter()
        .filter(|seg| {
            let Some(phase) = profile.phase_named(seg.name.unwrap_or("")) else {
                return false;
            };
            if phase.targets.is_empty() {
                return false;
            }
            let projection =
                Projection::at_boundary(seg.penultimate(), seg.last(), seg.pumped_volume(), delay_ms);
            phase
                .targets
                .iter()
                .any(|t| sensor_target_hit(t, seg, &projection))
        })
        .count()
}

fn sensor_target_hit(target: &Target, seg: &PhaseSegment<'_>, projection: &Projection) -> bool {
    let last = seg.last();
    let (measured, projected) = match target.kind {
        TargetType::Pressure => (last.value(Channel::Pressure), projection.pressure),
        TargetType::Flow => (last.value(Channel::Flow), projection.flow),
        TargetType::Pumped => (seg.pumped_volume(), projection.pumped),
        _ => return false,
    };
    target.operator.holds(measured, target.value) || target.operator.holds(projected, target.value)
}
