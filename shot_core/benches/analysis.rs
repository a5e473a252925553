use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use shot_core::{
    AnalysisCfg, Channel, Operator, ProfilePhase, ProfileRecord, Sample, Settings, ShotRecord,
    Target, TargetType, analyze, calculate_shot_metrics,
};

// Synthetic shot: 2 000 samples at 100 ms spread over four phases, with a
// pressure ramp, a steady flow and a cup weight that grows once flow starts.
fn synth_shot(n: usize) -> ShotRecord {
    let names = ["Fill", "Infuse", "Ramp", "Extract"];
    let per_phase = n.div_ceil(names.len()).max(1);
    let mut weight = 0.0;
    let samples = (0..n)
        .map(|i| {
            let phase = (i / per_phase) as i64;
            let t = i as f64 / 10.0;
            let pressure = (t * 0.8).min(9.0) + (t * 3.0).sin() * 0.1;
            let flow = if phase == 0 { 6.0 } else { 2.0 + (t * 1.7).cos() * 0.2 };
            if phase >= 2 {
                weight += flow * 0.1;
            }
            Sample::new(i as i64 * 100, phase)
                .with(Channel::Pressure, pressure)
                .with(Channel::TargetPressure, 9.0)
                .with(Channel::Flow, flow)
                .with(Channel::TargetFlow, 2.0)
                .with(Channel::Temperature, 93.0 + (t * 0.5).sin())
                .with(Channel::TargetTemperature, 93.0)
                .with(Channel::Weight, weight)
                .with(Channel::ScaleFlow, if phase >= 2 { flow } else { 0.0 })
        })
        .collect();
    names
        .iter()
        .enumerate()
        .fold(ShotRecord::from_samples(samples), |shot, (i, name)| {
            shot.with_transition(i as i64, *name)
        })
}

fn synth_profile() -> ProfileRecord {
    let phase = |name: &str, duration: f64, targets: Vec<Target>| ProfilePhase {
        name: name.into(),
        duration: Some(duration),
        targets,
    };
    ProfileRecord {
        label: "Bench".into(),
        phases: vec![
            phase("fill", 60.0, vec![Target::new(TargetType::Pumped, Operator::Gte, 80.0)]),
            phase("infuse", 60.0, vec![Target::new(TargetType::Pressure, Operator::Gte, 4.0)]),
            phase("ramp", 60.0, vec![Target::new(TargetType::Flow, Operator::Lte, 1.0)]),
            phase("extract", 60.0, vec![Target::new(TargetType::Weight, Operator::Gte, 36.0)]),
        ],
    }
}

pub fn bench_analysis(c: &mut Criterion) {
    let mut g = c.benchmark_group("analysis");
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(10));
        }
    } else {
        g.sample_size(50);
    }

    let shot = synth_shot(2_000);
    let profile = synth_profile();

    g.bench_function("metrics_2000", |b| {
        b.iter(|| {
            calculate_shot_metrics(
                black_box(&shot),
                black_box(Some(&profile)),
                &Settings::default(),
            )
        })
    });

    g.bench_function("analyze_auto_delay_2000", |b| {
        b.iter_batched(
            || AnalysisCfg::default(),
            |cfg| analyze(black_box(&shot), black_box(Some(&profile)), &cfg),
            BatchSize::SmallInput,
        )
    });

    g.finish();
}

criterion_group!(benches, bench_analysis);
criterion_main!(benches);
