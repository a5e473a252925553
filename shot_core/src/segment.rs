//! Phase segmentation of a shot's sample stream.

use std::collections::BTreeMap;

use crate::stats::integrate;
use crate::types::{Channel, Sample, ShotRecord};
use crate::util::elapsed_secs;

/// The samples of one phase plus its position on the shot timeline.
#[derive(Debug, Clone)]
pub struct PhaseSegment<'a> {
    pub number: i64,
    /// Name announced in the shot's phase transitions, if any.
    pub name: Option<&'a str>,
    pub samples: Vec<&'a Sample>,
    /// Seconds from the first sample of the shot to the first sample of this phase.
    pub start: f64,
    /// Seconds from shot start to the first sample of the following phase,
    /// or to this phase's own last sample for the final phase.
    pub end: f64,
}

impl<'a> PhaseSegment<'a> {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Seconds between this phase's own first and last samples.
    pub fn sample_span(&self) -> f64 {
        elapsed_secs(self.first().t, self.last().t)
    }

    /// `name`, or `"Phase <n>"` when the controller did not announce one.
    pub fn display_name(&self) -> String {
        match self.name {
            Some(n) => n.to_string(),
            None => format!("Phase {}", self.number),
        }
    }

    /// First sample of the phase. Segments are never empty.
    pub fn first(&self) -> &'a Sample {
        self.samples[0]
    }

    /// Last sample of the phase.
    pub fn last(&self) -> &'a Sample {
        self.samples[self.samples.len() - 1]
    }

    /// Sample before the last one; the last sample itself for single-sample phases.
    pub fn penultimate(&self) -> &'a Sample {
        let n = self.samples.len();
        self.samples[n.saturating_sub(2)]
    }

    /// Water pumped during this phase (ml), integrated over its own samples.
    pub fn pumped_volume(&self) -> f64 {
        integrate(self.samples.iter().copied(), Channel::Flow)
    }
}

/// Group `shot.samples` by phase number, ascending.
///
/// Every phase number present in the stream yields exactly one segment. An
/// empty shot yields no segments.
pub fn segment_phases(shot: &ShotRecord) -> Vec<PhaseSegment<'_>> {
    let Some(first) = shot.samples.first() else {
        return Vec::new();
    };
    let origin = first.t;

    let mut names: BTreeMap<i64, &str> = BTreeMap::new();
    for pt in &shot.phase_transitions {
        names.insert(pt.phase_number, pt.phase_name.as_str());
    }

    let mut groups: BTreeMap<i64, Vec<&Sample>> = BTreeMap::new();
    for s in &shot.samples {
        groups.entry(s.phase_number).or_default().push(s);
    }

    let starts: Vec<i64> = groups.values().map(|g| g[0].t).collect();
    groups
        .into_iter()
        .enumerate()
        .map(|(idx, (number, samples))| {
            let first_t = samples[0].t;
            let last_t = samples[samples.len() - 1].t;
            let end_t = match starts.get(idx + 1) {
                Some(&next) if next >= last_t => next,
                _ => last_t,
            };
            PhaseSegment {
                number,
                name: names.get(&number).copied(),
                samples,
                start: elapsed_secs(origin, first_t),
                end: elapsed_secs(origin, end_t),
            }
        })
        .collect()
}

/// Locate the segment for `number` in an ascending segment list.
pub fn find_segment<'s, 'a>(
    segments: &'s [PhaseSegment<'a>],
    number: i64,
) -> Option<&'s PhaseSegment<'a>> {
    segments
        .binary_search_by_key(&number, |s| s.number)
        .ok()
        .map(|i| &segments[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shot(points: &[(i64, i64)]) -> ShotRecord {
        ShotRecord::from_samples(points.iter().map(|&(t, p)| Sample::new(t, p)).collect())
    }

    #[test]
    fn groups_and_orders_by_phase_number() {
        let s = shot(&[(1000, 0), (1500, 0), (2000, 1), (2500, 1), (3000, 2)])
            .with_transition(1, "Bloom");
        let segs = segment_phases(&s);
        assert_eq!(segs.iter().map(|s| s.number).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(segs[0].display_name(), "Phase 0");
        assert_eq!(segs[1].display_name(), "Bloom");
        assert_eq!(segs[1].name, Some("Bloom"));
        assert_eq!((segs[0].start, segs[0].end), (0.0, 1.0));
        assert_eq!((segs[1].start, segs[1].end), (1.0, 2.0));
        assert_eq!((segs[2].start, segs[2].end), (2.0, 2.0));
    }

    #[test]
    fn durations_tile_the_shot() {
        let s = shot(&[(0, 0), (250, 0), (600, 1), (900, 1), (1400, 3), (2100, 3)]);
        let segs = segment_phases(&s);
        let sum: f64 = segs.iter().map(|s| s.duration()).sum();
        assert!((sum - 2.1).abs() < 1e-9);
    }

    #[test]
    fn sample_span_stops_at_own_last_sample() {
        let s = shot(&[(0, 0), (250, 0), (600, 1), (900, 1), (1400, 3)]);
        let segs = segment_phases(&s);
        assert_eq!(segs[0].duration(), 0.6);
        assert_eq!(segs[0].sample_span(), 0.25);
        assert_eq!(segs[1].sample_span(), 0.3);
        assert_eq!(segs[2].sample_span(), 0.0);
    }

    #[test]
    fn empty_shot_has_no_segments() {
        assert!(segment_phases(&ShotRecord::default()).is_empty());
    }

    #[test]
    fn neighbours_and_lookup() {
        let s = shot(&[(0, 3), (100, 3), (200, 3), (300, 5)]);
        let segs = segment_phases(&s);
        assert_eq!(segs[0].penultimate().t, 100);
        assert_eq!(segs[1].penultimate().t, 300);
        assert_eq!(find_segment(&segs, 5).map(|s| s.first().t), Some(300));
        assert!(find_segment(&segs, 4).is_none());
    }
}
