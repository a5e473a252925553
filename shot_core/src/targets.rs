//! Exit diagnosis: why did a phase end?
//!
//! At each phase boundary the matched profile phase is checked first against
//! its planned duration, then target by target. A target counts as hit by the
//! first strategy that succeeds, in this order:
//!
//! 1. **Measured**: the last recorded value satisfies the operator.
//! 2. **Predicted**: the value projected forward by the sensor (or scale)
//!    delay satisfies it.
//! 3. **Tolerance**: the last value is within a fixed band of the threshold
//!    (pressure ±0.15 bar, flow ±0.3 ml/s; none for weight or volume).
//! 4. **Look-ahead**: for `gte` pressure/flow targets, the first sample of the
//!    next phase already satisfies it.
//!
//! When several targets hit, the explanation with the highest priority wins:
//! flow, then weight/volumetric, then pressure, then anything else.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::predict::{Projection, predict_weight};
use crate::types::{Channel, Operator, ProfilePhase, Sample, Target, TargetType};

/// Absolute tolerance (bar) for pressure targets.
pub const PRESSURE_TOLERANCE: f64 = 0.15;
/// Absolute tolerance (ml/s) for flow targets.
pub const FLOW_TOLERANCE: f64 = 0.3;
/// A phase within this many seconds of its planned duration ended on time.
pub const TIME_LIMIT_SLACK_S: f64 = 0.5;

/// What ended a phase: its planned duration or one of its targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ExitType {
    Duration,
    Target(TargetType),
}

impl ExitType {
    pub fn as_str(&self) -> &str {
        match self {
            ExitType::Duration => "duration",
            ExitType::Target(t) => t.as_str(),
        }
    }
}

impl fmt::Display for ExitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ExitType> for String {
    fn from(e: ExitType) -> Self {
        e.as_str().to_string()
    }
}

impl From<String> for ExitType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "duration" => ExitType::Duration,
            "pressure" => ExitType::Target(TargetType::Pressure),
            "flow" => ExitType::Target(TargetType::Flow),
            "pumped" => ExitType::Target(TargetType::Pumped),
            "weight" => ExitType::Target(TargetType::Weight),
            "volumetric" => ExitType::Target(TargetType::Volumetric),
            _ => ExitType::Target(TargetType::Other(s)),
        }
    }
}

/// Human-readable label for an exit, e.g. `"Water Drawn Limit"`.
///
/// Unknown types fall back to `"<Type> Limit"`. The engine never produces
/// such an exit itself (unknown targets never hit); the fallback labels exit
/// types read back from serialized results.
pub fn stop_reason_label(exit: &ExitType) -> String {
    let t = exit.as_str().to_lowercase();
    match t.as_str() {
        "" => String::new(),
        "duration" => "Time Limit".to_string(),
        "pumped" => "Water Drawn Limit".to_string(),
        "volumetric" | "weight" => "Weight Limit".to_string(),
        "pressure" => "Pressure Limit".to_string(),
        "flow" => "Flow Limit".to_string(),
        other => {
            let mut chars = other.chars();
            let head: String = chars.next().map(|c| c.to_uppercase().collect()).unwrap_or_default();
            format!("{head}{} Limit", chars.as_str())
        }
    }
}

/// Which detection strategy recognised a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HitStrategy {
    Measured,
    Predicted,
    Tolerance,
    LookAhead,
}

/// Explanation attached to a phase result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseExit {
    #[serde(rename = "type")]
    pub kind: Option<ExitType>,
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<HitStrategy>,
}

impl PhaseExit {
    fn new(kind: ExitType, via: Option<HitStrategy>) -> Self {
        Self {
            reason: Some(stop_reason_label(&kind)),
            kind: Some(kind),
            via,
        }
    }

    pub fn is_explained(&self) -> bool {
        self.kind.is_some()
    }
}

/// Everything known about a phase at its boundary.
#[derive(Debug, Clone, Copy)]
pub struct Boundary<'a> {
    pub profile_phase: &'a ProfilePhase,
    /// Span of the phase's own samples (s), compared against the planned duration.
    pub duration: f64,
    pub prev: &'a Sample,
    pub last: &'a Sample,
    /// Water pumped during the phase (ml).
    pub pumped: f64,
    /// First sample of the next phase, if there is one.
    pub next_first: Option<&'a Sample>,
    /// Scale lost at any point of the shot so far.
    pub scale_lost: bool,
}

/// Outcome of evaluating one boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitDiagnosis {
    pub exit: PhaseExit,
    /// Projected final weight; present whenever targets were examined.
    pub predicted_weight: Option<f64>,
}

/// True when `duration` reached, or came within the slack of, `planned`.
pub fn is_time_limited(duration: f64, planned: f64) -> bool {
    (duration - planned).abs() < TIME_LIMIT_SLACK_S || duration >= planned
}

/// Ordering key for competing explanations (lower wins).
pub fn exit_priority(kind: &TargetType) -> u8 {
    match kind {
        TargetType::Flow => 1,
        TargetType::Weight | TargetType::Volumetric => 2,
        TargetType::Pressure => 3,
        _ => 4,
    }
}

/// Diagnose why the phase described by `boundary` ended.
pub fn evaluate_exit(boundary: &Boundary<'_>, settings: &Settings) -> ExitDiagnosis {
    let planned = boundary.profile_phase.duration;
    let time_limited = planned.is_some_and(|p| is_time_limited(boundary.duration, p));
    let mut exit = if time_limited {
        PhaseExit::new(ExitType::Duration, None)
    } else {
        PhaseExit::default()
    };

    // Targets may only override a time explanation when the phase ended clearly early.
    if let Some(p) = planned
        && time_limited
        && boundary.duration >= p - TIME_LIMIT_SLACK_S
    {
        return ExitDiagnosis {
            exit,
            predicted_weight: None,
        };
    }

    let predicted_weight = predict_weight(
        boundary.last,
        settings.scale_delay_ms,
        boundary.scale_lost,
    );
    let projection = Projection::at_boundary(
        boundary.prev,
        boundary.last,
        boundary.pumped,
        settings.sensor_delay_ms,
    );

    let best = boundary
        .profile_phase
        .targets
        .iter()
        .enumerate()
        .filter_map(|(idx, t)| {
            target_hit(t, boundary, &projection, predicted_weight).map(|via| (idx, t, via))
        })
        .min_by_key(|(idx, t, _)| (exit_priority(&t.kind), *idx));

    if let Some((_, target, via)) = best {
        tracing::debug!(
            phase = %boundary.profile_phase.name,
            target = %target.kind.as_str(),
            value = target.value,
            ?via,
            "target explains phase exit"
        );
        exit = PhaseExit::new(ExitType::Target(target.kind.clone()), Some(via));
    }

    ExitDiagnosis {
        exit,
        predicted_weight: Some(predicted_weight),
    }
}

/// Decide whether `target` was reached at the boundary and how.
///
/// Weight and volumetric targets are never hit once the scale was lost.
/// Target types without a measurable channel are never hit.
pub fn target_hit(
    target: &Target,
    boundary: &Boundary<'_>,
    projection: &Projection,
    predicted_weight: f64,
) -> Option<HitStrategy> {
    if target.kind.is_scale_based() && boundary.scale_lost {
        return None;
    }
    let op = &target.operator;
    let last = boundary.last;
    let (measured, projected, tolerance, look_ahead) = match target.kind {
        TargetType::Pressure => (
            last.value(Channel::Pressure),
            projection.pressure,
            PRESSURE_TOLERANCE,
            Some(Channel::Pressure),
        ),
        TargetType::Flow => (
            last.value(Channel::Flow),
            projection.flow,
            FLOW_TOLERANCE,
            Some(Channel::Flow),
        ),
        TargetType::Weight | TargetType::Volumetric => {
            let w = last.value(Channel::Weight);
            let projected = if *op == Operator::Gte { predicted_weight } else { w };
            (w, projected, 0.0, None)
        }
        TargetType::Pumped => {
            let projected = if *op == Operator::Gte {
                projection.pumped
            } else {
                boundary.pumped
            };
            (boundary.pumped, projected, 0.0, None)
        }
        TargetType::Other(_) => return None,
    };

    if op.holds(measured, target.value) {
        return Some(HitStrategy::Measured);
    }
    if op.holds(projected, target.value) {
        return Some(HitStrategy::Predicted);
    }
    if tolerance > 0.0 && within_tolerance(op, measured, target.value, tolerance) {
        return Some(HitStrategy::Tolerance);
    }
    if let (Some(channel), Some(next), Operator::Gte) = (look_ahead, boundary.next_first, op)
        && next.value(channel) >= target.value
    {
        return Some(HitStrategy::LookAhead);
    }
    None
}

fn within_tolerance(op: &Operator, measured: f64, threshold: f64, tolerance: f64) -> bool {
    match op {
        Operator::Gte => measured >= threshold - tolerance,
        Operator::Lte => measured <= threshold + tolerance,
        Operator::Other(_) => false,
    }
}
