use proptest::prelude::*;
use shot_core::predict::{MAX_PREDICTED_WEIGHT_GAIN_G, predict_weight};
use shot_core::{
    AnalysisCfg, Channel, Operator, ProfilePhase, ProfileRecord, Sample, Settings, ShotRecord,
    Target, TargetType, analyze, calculate_shot_metrics,
};

// Per-sample (time step ms, phase advance, pressure, flow, weight).
type Tick = (i64, bool, f64, f64, f64);

prop_compose! {
    fn shot_strategy()(
        ticks in prop::collection::vec(
            (0i64..400, prop::bool::weighted(0.1), 0.0f64..12.0, 0.0f64..8.0, 0.0f64..60.0),
            1..80,
        )
    ) -> ShotRecord {
        build_shot(&ticks)
    }
}

fn build_shot(ticks: &[Tick]) -> ShotRecord {
    let mut t = 1_000;
    let mut phase = 0;
    let samples = ticks
        .iter()
        .map(|&(dt, advance, cp, fl, v)| {
            t += dt;
            if advance {
                phase += 1;
            }
            Sample::new(t, phase)
                .with(Channel::Pressure, cp)
                .with(Channel::Flow, fl)
                .with(Channel::Weight, v)
        })
        .collect();
    (0..=phase).fold(ShotRecord::from_samples(samples), |shot, n| {
        shot.with_transition(n, format!("P{n}"))
    })
}

fn profile_for(shot: &ShotRecord) -> ProfileRecord {
    let phases = shot
        .phase_transitions
        .iter()
        .map(|pt| ProfilePhase {
            name: pt.phase_name.clone(),
            duration: Some(60.0),
            targets: vec![
                Target::new(TargetType::Pressure, Operator::Gte, 9.0),
                Target::new(TargetType::Flow, Operator::Lte, 1.0),
                Target::new(TargetType::Weight, Operator::Gte, 36.0),
                Target::new(TargetType::Pumped, Operator::Gte, 50.0),
            ],
        })
        .collect();
    ProfileRecord {
        label: "prop".into(),
        phases,
    }
}

proptest! {
    #[test]
    fn stats_stay_within_observed_range(shot in shot_strategy()) {
        let r = calculate_shot_metrics(&shot, None, &Settings::default()).unwrap();
        let all = r.phases.iter().map(|p| &p.stats).chain(std::iter::once(&r.total.stats));
        for stats in all {
            for ch in Channel::STATS {
                let s = stats.get(ch).unwrap();
                prop_assert!(s.min <= s.avg && s.avg <= s.max, "{ch:?}: {s:?}");
                prop_assert!(s.min <= s.start && s.start <= s.max);
                prop_assert!(s.min <= s.end && s.end <= s.max);
            }
        }
    }

    #[test]
    fn single_sample_phase_is_flat(shot in shot_strategy()) {
        let r = calculate_shot_metrics(&shot, None, &Settings::default()).unwrap();
        for ph in &r.phases {
            let n = shot.samples.iter().filter(|s| s.phase_number == ph.number).count();
            if n != 1 {
                continue;
            }
            for ch in Channel::STATS {
                let s = ph.stats.get(ch).unwrap();
                prop_assert_eq!(s.start, s.end);
                prop_assert_eq!(s.min, s.max);
                prop_assert_eq!(s.avg, s.start);
                prop_assert_eq!(s.min, s.start);
            }
        }
    }

    #[test]
    fn phase_durations_sum_to_total(shot in shot_strategy()) {
        let r = calculate_shot_metrics(&shot, None, &Settings::default()).unwrap();
        let sum: f64 = r.phases.iter().map(|p| p.duration).sum();
        prop_assert!((sum - r.total.duration).abs() < 1e-6, "{} vs {}", sum, r.total.duration);
    }

    #[test]
    fn one_result_per_observed_phase(shot in shot_strategy()) {
        let r = calculate_shot_metrics(&shot, None, &Settings::default()).unwrap();
        let mut observed: Vec<i64> = shot.samples.iter().map(|s| s.phase_number).collect();
        observed.dedup();
        let numbers: Vec<i64> = r.phases.iter().map(|p| p.number).collect();
        prop_assert_eq!(numbers, observed);
    }

    #[test]
    fn analysis_is_idempotent(shot in shot_strategy()) {
        let profile = profile_for(&shot);
        let before = shot.clone();
        let a = analyze(&shot, Some(&profile), &AnalysisCfg::default()).unwrap();
        let b = analyze(&shot, Some(&profile), &AnalysisCfg::default()).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&shot, &before);
    }

    #[test]
    fn predicted_weight_is_clamped(
        weight in 0.0f64..100.0,
        rate in -50.0f64..500.0,
        delay in 0.0f64..5_000.0,
        lost in any::<bool>(),
    ) {
        let last = Sample::new(0, 0)
            .with(Channel::Weight, weight)
            .with(Channel::ScaleFlow, rate);
        let p = predict_weight(&last, delay, lost);
        prop_assert!(p >= weight);
        prop_assert!(p - weight <= MAX_PREDICTED_WEIGHT_GAIN_G + 1e-9);
    }

    #[test]
    fn empty_profile_never_adjusts(shot in shot_strategy(), manual in 0.0f64..2_000.0) {
        let empty = ProfileRecord::default();
        let cfg = AnalysisCfg { sensor_delay_ms: manual, ..AnalysisCfg::default() };
        let r = analyze(&shot, Some(&empty), &cfg).unwrap();
        prop_assert!(!r.is_auto_adjusted);
    }
}
