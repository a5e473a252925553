//! Rendering results as tables, JSON or CSV.

use crate::cli::Format;
use serde::Serialize;
use shot_core::{DelayChoice, HitStrategy, PhaseResult, ShotMetricsResult, ShotSummary};
use std::io::Write;

/// One CSV row: a phase or the `total` line.
#[derive(Serialize)]
struct CsvRow<'a> {
    phase: String,
    name: &'a str,
    start_s: f64,
    end_s: f64,
    duration_s: f64,
    water_ml: f64,
    weight_g: f64,
    pressure_avg: f64,
    pressure_max: f64,
    flow_avg: f64,
    flow_max: f64,
    temperature_avg: f64,
    exit_type: &'a str,
    exit_reason: &'a str,
    predicted_weight_g: Option<f64>,
}

impl<'a> CsvRow<'a> {
    fn phase(p: &'a PhaseResult) -> Self {
        Self {
            phase: p.number.to_string(),
            name: &p.display_name,
            start_s: p.start,
            end_s: p.end,
            duration_s: p.duration,
            water_ml: p.water,
            weight_g: p.weight,
            pressure_avg: p.stats.pressure.avg,
            pressure_max: p.stats.pressure.max,
            flow_avg: p.stats.flow.avg,
            flow_max: p.stats.flow.max,
            temperature_avg: p.stats.temperature.avg,
            exit_type: p.exit.kind.as_ref().map_or("", |k| k.as_str()),
            exit_reason: p.exit.reason.as_deref().unwrap_or(""),
            predicted_weight_g: p.predicted_final_weight,
        }
    }

    fn total(r: &ShotMetricsResult) -> Self {
        let t = &r.total;
        Self {
            phase: "total".to_string(),
            name: "",
            start_s: 0.0,
            end_s: t.duration,
            duration_s: t.duration,
            water_ml: t.water,
            weight_g: t.weight,
            pressure_avg: t.stats.pressure.avg,
            pressure_max: t.stats.pressure.max,
            flow_avg: t.stats.flow.avg,
            flow_max: t.stats.flow.max,
            temperature_avg: t.stats.temperature.avg,
            exit_type: "",
            exit_reason: "",
            predicted_weight_g: None,
        }
    }
}

pub fn write_metrics(out: &mut impl Write, r: &ShotMetricsResult, format: Format) -> eyre::Result<()> {
    match format {
        Format::Json => write_json(out, r),
        Format::Csv => {
            let mut w = csv::Writer::from_writer(out);
            for p in &r.phases {
                w.serialize(CsvRow::phase(p))?;
            }
            w.serialize(CsvRow::total(r))?;
            w.flush()?;
            Ok(())
        }
        Format::Table => {
            writeln!(
                out,
                "{:>3}  {:<18} {:>6} {:>6} {:>7} {:>7} {:>6} {:>6}  {}",
                "#", "phase", "start", "dur", "water", "weight", "P avg", "F avg", "exit"
            )?;
            for p in &r.phases {
                let exit = match (&p.exit.reason, p.exit.via) {
                    (Some(reason), Some(via)) => format!("{reason} ({})", via_label(via)),
                    (Some(reason), None) => reason.clone(),
                    (None, _) => "-".to_string(),
                };
                writeln!(
                    out,
                    "{:>3}  {:<18} {:>6.1} {:>6.1} {:>7.1} {:>7.1} {:>6.2} {:>6.2}  {}",
                    p.number,
                    truncate(&p.display_name, 18),
                    p.start,
                    p.duration,
                    p.water,
                    p.weight,
                    p.stats.pressure.avg,
                    p.stats.flow.avg,
                    exit
                )?;
            }
            let t = &r.total;
            writeln!(
                out,
                "{:>3}  {:<18} {:>6.1} {:>6.1} {:>7.1} {:>7.1} {:>6.2} {:>6.2}",
                "",
                "total",
                0.0,
                t.duration,
                t.water,
                t.weight,
                t.stats.pressure.avg,
                t.stats.flow.avg
            )?;
            let mut flags = Vec::new();
            if r.is_brew_by_weight {
                flags.push("brew-by-weight");
            }
            if r.global_scale_lost {
                flags.push("scale lost");
            }
            if r.is_auto_adjusted {
                flags.push("sensor delay auto-adjusted");
            }
            if !flags.is_empty() {
                writeln!(out, "notes: {}", flags.join(", "))?;
            }
            Ok(())
        }
    }
}

pub fn write_summary(out: &mut impl Write, s: &ShotSummary, format: Format) -> eyre::Result<()> {
    if format == Format::Json {
        return write_json(out, s);
    }
    let opt = |v: Option<f64>, unit: &str| v.map_or_else(|| "-".to_string(), |x| format!("{x:.1}{unit}"));
    writeln!(out, "profile:  {}", s.profile_name)?;
    if let Some(id) = &s.id {
        writeln!(out, "id:       {id}")?;
    }
    writeln!(out, "duration: {:.1}s", s.duration_s)?;
    writeln!(out, "dose in:  {}", opt(s.dose_in_g, "g"))?;
    writeln!(out, "dose out: {}", opt(s.dose_out_g, "g"))?;
    writeln!(
        out,
        "ratio:    {}",
        s.ratio.map_or_else(|| "-".to_string(), |r| format!("1:{r:.1}"))
    )?;
    if let Some(rating) = s.rating {
        writeln!(out, "rating:   {rating}")?;
    }
    Ok(())
}

pub fn write_delay_choice(out: &mut impl Write, c: &DelayChoice, format: Format) -> eyre::Result<()> {
    if format == Format::Json {
        return write_json(out, c);
    }
    writeln!(out, "manual hits:   {}", c.manual_hits)?;
    writeln!(out, "fallback hits: {}", c.fallback_hits)?;
    writeln!(
        out,
        "sensor delay:  {:.0} ms ({})",
        c.delay_ms,
        if c.auto { "auto-adjusted" } else { "manual" }
    )?;
    Ok(())
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> eyre::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn via_label(via: HitStrategy) -> &'static str {
    match via {
        HitStrategy::Measured => "measured",
        HitStrategy::Predicted => "predicted",
        HitStrategy::Tolerance => "tolerance",
        HitStrategy::LookAhead => "look-ahead",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}
