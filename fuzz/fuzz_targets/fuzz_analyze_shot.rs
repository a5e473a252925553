#![no_main]
use libfuzzer_sys::fuzz_target;
use shot_core::{AnalysisCfg, ProfileRecord, ShotRecord, ShotSummary, analyze};

// Input: a shot document, optionally followed by a NUL byte and a profile document.
fuzz_target!(|data: &[u8]| {
    let (shot_bytes, profile_bytes) = match data.iter().position(|b| *b == 0) {
        Some(i) => (&data[..i], Some(&data[i + 1..])),
        None => (data, None),
    };
    let Ok(shot) = serde_json::from_slice::<ShotRecord>(shot_bytes) else {
        return;
    };
    let profile = profile_bytes.and_then(|b| serde_json::from_slice::<ProfileRecord>(b).ok());

    let _ = ShotSummary::from_shot(&shot);
    if let Ok(result) = analyze(&shot, profile.as_ref(), &AnalysisCfg::default()) {
        assert_eq!(result.phases.len(), {
            let mut n: Vec<i64> = shot.samples.iter().map(|s| s.phase_number).collect();
            n.sort_unstable();
            n.dedup();
            n.len()
        });
    }
});
