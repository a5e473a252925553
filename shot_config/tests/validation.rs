use rstest::rstest;
use shot_config::{OutputFormat, load_file, load_toml};
use std::io::Write;

#[rstest]
#[case("[analysis]\nsensor_delay_ms = -1.0\n", "analysis.sensor_delay_ms")]
#[case("[analysis]\nscale_delay_ms = -0.5\n", "analysis.scale_delay_ms")]
#[case("[analysis]\nscale_delay_ms = 60001.0\n", "analysis.scale_delay_ms")]
#[case("[analysis]\nsensor_delay_ms = nan\n", "analysis.sensor_delay_ms")]
#[case("[analysis]\nsensor_delay_ms = inf\n", "analysis.sensor_delay_ms")]
#[case("[logging]\nlevel = \"verbose\"\n", "logging.level")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_bad_values(#[case] toml: &str, #[case] key: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(format!("{err}").contains(key), "error {err} should name {key}");
}

#[rstest]
#[case("")]
#[case("[analysis]\nsensor_delay_ms = 0\nscale_delay_ms = 60000\n")]
#[case("[logging]\nlevel = \"DEBUG\"\nrotation = \"daily\"\n")]
#[case("[output]\nformat = \"csv\"\n")]
fn accepts_good_values(#[case] toml: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config");
}

#[test]
fn unknown_output_format_fails_to_parse() {
    assert!(load_toml("[output]\nformat = \"xml\"\n").is_err());
}

#[test]
fn full_document_round_trips_into_fields() {
    let toml = r#"
[analysis]
scale_delay_ms = 650.0
sensor_delay_ms = 120.0
auto_sensor_delay = false

[logging]
file = "shot.log"
level = "debug"
rotation = "hourly"

[output]
format = "json"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid");
    assert_eq!(cfg.analysis.scale_delay_ms, 650.0);
    assert_eq!(cfg.analysis.sensor_delay_ms, 120.0);
    assert!(!cfg.analysis.auto_sensor_delay);
    assert_eq!(cfg.logging.file.as_deref(), Some("shot.log"));
    assert_eq!(cfg.output.format, OutputFormat::Json);
}

#[test]
fn load_file_validates() {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(f, "[analysis]\nsensor_delay_ms = -5.0").expect("write");
    let err = load_file(f.path()).expect_err("invalid delay");
    assert!(format!("{err}").contains("analysis.sensor_delay_ms"));
}

#[test]
fn load_file_reports_missing_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_file(&dir.path().join("absent.toml")).expect_err("missing");
    assert!(format!("{err}").contains("failed to read config"));
}
