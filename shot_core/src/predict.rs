//! Forward projection of lagging readings.
//!
//! Pressure and flow sensors, the pumped-volume integral and the scale all
//! report a little behind the controller. These helpers estimate what a
//! channel would have read `delay_ms` after the last recorded sample.
//!
//! Weight projection uses fixed empirical bounds: the rate is scaled by
//! `delay_ms / 500` and the added mass is clamped to `[0, 8.0]` g. They are
//! calibrated constants, not configuration.

use crate::types::{Channel, Sample};
use crate::util::{elapsed_secs, ms_to_secs};

/// Divisor (ms) applied to the scale delay when projecting weight gain.
pub const WEIGHT_RATE_DIVISOR_MS: f64 = 500.0;
/// Upper bound (g) on the weight a projection may add.
pub const MAX_PREDICTED_WEIGHT_GAIN_G: f64 = 8.0;
/// Weight (g) a cup must show before projection is attempted.
pub const MIN_WEIGHT_FOR_PREDICTION_G: f64 = 0.1;

/// Linear extrapolation of `channel` from the last two samples.
///
/// `slope = (last - prev) / Δt`, `predicted = last + slope * delay`. With no
/// usable interval (single sample, equal or reversed timestamps) the last
/// value is returned unchanged.
pub fn extrapolate_linear(prev: &Sample, last: &Sample, channel: Channel, delay_ms: f64) -> f64 {
    let current = last.value(channel);
    let dt = elapsed_secs(prev.t, last.t);
    if dt <= 0.0 {
        return current;
    }
    let slope = (current - prev.value(channel)) / dt;
    current + slope * ms_to_secs(delay_ms)
}

/// Project a cumulative total forward using its instantaneous rate.
///
/// Only a positive rate advances the total.
pub fn project_total(total: f64, rate: f64, delay_ms: f64) -> f64 {
    if rate > 0.0 {
        total + rate * ms_to_secs(delay_ms)
    } else {
        total
    }
}

/// Weight the scale would show `delay_ms` after `last`.
///
/// The rate prefers the scale's own flow (`vf`) over pump flow (`fl`); when
/// both are absent it is zero and the weight is held. Projection is skipped
/// (the measured weight is returned) below [`MIN_WEIGHT_FOR_PREDICTION_G`] or
/// once the scale connection has been lost. The result never falls below the
/// measured weight.
pub fn predict_weight(last: &Sample, delay_ms: f64, scale_lost: bool) -> f64 {
    let weight = last.value(Channel::Weight);
    if weight <= MIN_WEIGHT_FOR_PREDICTION_G || scale_lost {
        return weight;
    }
    let rate = last
        .get(Channel::ScaleFlow)
        .unwrap_or_else(|| last.value(Channel::Flow));
    let added = (rate * (delay_ms / WEIGHT_RATE_DIVISOR_MS)).clamp(0.0, MAX_PREDICTED_WEIGHT_GAIN_G);
    weight + added
}

/// Projections of every target quantity at a phase boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub pressure: f64,
    pub flow: f64,
    pub pumped: f64,
}

impl Projection {
    /// Project pressure, flow and pumped volume with the sensor delay.
    pub fn at_boundary(prev: &Sample, last: &Sample, pumped: f64, sensor_delay_ms: f64) -> Self {
        Self {
            pressure: extrapolate_linear(prev, last, Channel::Pressure, sensor_delay_ms),
            flow: extrapolate_linear(prev, last, Channel::Flow, sensor_delay_ms),
            pumped: project_total(pumped, last.value(Channel::Flow), sensor_delay_ms),
        }
    }
}
