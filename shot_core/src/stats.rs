//! Time-weighted statistics over one channel of a sample sequence.

use serde::{Deserialize, Serialize};

use crate::types::{Channel, Sample};
use crate::util::elapsed_secs;

/// Summary of one channel over an ordered run of samples.
///
/// `avg` weights each sample by the interval leading up to it, so irregular
/// sampling does not bias the mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub start: f64,
    pub end: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Compute [`MetricStats`] for `channel` over `samples` (ascending `t`).
///
/// Intervals with a non-positive time delta carry no weight. When no interval
/// carries weight (a single sample, or identical timestamps) the average falls
/// back to the plain mean of the observed values, which keeps
/// `min <= avg <= max`. An empty input yields all zeros.
pub fn metric_stats<'a, I>(samples: I, channel: Channel) -> MetricStats
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut iter = samples.into_iter();
    let Some(first) = iter.next() else {
        return MetricStats::default();
    };

    let start = first.value(channel);
    let mut end = start;
    let mut min = start;
    let mut max = start;
    let mut plain_sum = start;
    let mut count = 1usize;
    let mut weighted_sum = 0.0;
    let mut total_time = 0.0;
    let mut prev_t = first.t;

    for s in iter {
        let v = s.value(channel);
        min = min.min(v);
        max = max.max(v);
        plain_sum += v;
        count += 1;
        let dt = elapsed_secs(prev_t, s.t);
        if dt > 0.0 {
            weighted_sum += v * dt;
            total_time += dt;
        }
        prev_t = s.t;
        end = v;
    }

    let avg = if total_time > 0.0 {
        weighted_sum / total_time
    } else {
        plain_sum / count as f64
    };
    // Rounding in the weighted sum can land a hair outside the observed range.
    let avg = avg.clamp(min, max);

    MetricStats {
        start,
        end,
        min,
        max,
        avg,
    }
}

/// Discrete integral of `channel` over time: Σ value[i] · Δt[i] for i > 0.
///
/// Used for cumulative pumped volume (ml) from pump flow (ml/s).
pub fn integrate<'a, I>(samples: I, channel: Channel) -> f64
where
    I: IntoIterator<Item = &'a Sample>,
{
    let mut total = 0.0;
    let mut prev_t: Option<i64> = None;
    for s in samples {
        if let Some(pt) = prev_t {
            let dt = elapsed_secs(pt, s.t);
            if dt > 0.0 {
                total += s.value(channel) * dt;
            }
        }
        prev_t = Some(s.t);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow_samples(points: &[(i64, f64)]) -> Vec<Sample> {
        points
            .iter()
            .map(|&(t, v)| Sample::new(t, 0).with(Channel::Flow, v))
            .collect()
    }

    #[test]
    fn weights_by_interval() {
        // 1 s at 2.0 then 3 s at 4.0 => (2 + 12) / 4
        let s = flow_samples(&[(0, 0.0), (1000, 2.0), (4000, 4.0)]);
        let m = metric_stats(&s, Channel::Flow);
        assert_eq!(m.start, 0.0);
        assert_eq!(m.end, 4.0);
        assert_eq!(m.min, 0.0);
        assert_eq!(m.max, 4.0);
        assert!((m.avg - 3.5).abs() < 1e-12);
    }

    #[test]
    fn missing_channel_reads_zero() {
        let s = flow_samples(&[(0, 1.0), (500, 2.0)]);
        let m = metric_stats(&s, Channel::Pressure);
        assert_eq!(m, MetricStats::default());
    }

    #[test]
    fn single_sample_collapses() {
        let s = flow_samples(&[(100, 2.5)]);
        let m = metric_stats(&s, Channel::Flow);
        assert_eq!((m.start, m.end, m.min, m.max, m.avg), (2.5, 2.5, 2.5, 2.5, 2.5));
    }

    #[test]
    fn non_positive_intervals_are_skipped() {
        let s = flow_samples(&[(0, 1.0), (0, 9.0), (1000, 3.0)]);
        let m = metric_stats(&s, Channel::Flow);
        assert_eq!(m.max, 9.0);
        assert!((m.avg - 3.0).abs() < 1e-12);
        assert!((integrate(&s, Channel::Flow) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_input_is_zero() {
        let s: Vec<Sample> = Vec::new();
        assert_eq!(metric_stats(&s, Channel::Flow), MetricStats::default());
        assert_eq!(integrate(&s, Channel::Flow), 0.0);
    }

    #[test]
    fn constant_flow_integrates_to_volume() {
        let s = flow_samples(&[(0, 2.0), (1000, 2.0), (2000, 2.0)]);
        assert!((integrate(&s, Channel::Flow) - 4.0).abs() < 1e-12);
    }
}
