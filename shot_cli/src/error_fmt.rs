//! Human-readable error descriptions and structured JSON error formatting.

use crate::input::InputError;
use shot_core::AnalysisError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ae) = err.downcast_ref::<AnalysisError>() {
        return match ae {
            AnalysisError::MissingSamples => {
                "What happened: The shot contains no samples.\nLikely causes: The recording was aborted before the first tick, or the file is not a shot export.\nHow to fix: Export the shot again from the controller and check that its \"samples\" array is not empty.".to_string()
            }
            AnalysisError::InvalidSettings(msg) => format!(
                "What happened: Invalid analysis settings ({msg}).\nLikely causes: A negative or non-numeric delay on the command line.\nHow to fix: Pass --sensor-delay-ms / --scale-delay-ms values of 0 or more."
            ),
        };
    }

    if let Some(ie) = err.downcast_ref::<InputError>() {
        return match ie {
            InputError::Read { path, source } => format!(
                "What happened: Could not read {} ({source}).\nLikely causes: Wrong path or missing permissions.\nHow to fix: Check the file path and try again.",
                path.display()
            ),
            InputError::Parse { path, source } => format!(
                "What happened: {} is not a valid shot or profile file ({source}).\nLikely causes: The file is truncated, not JSON, or a different export format.\nHow to fix: Re-export the file from the controller; profile files may hold one profile or an array of profiles.",
                path.display()
            ),
        };
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("config") || lower.starts_with("analysis.") || lower.starts_with("logging.") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: A missing file or an out-of-range value in the TOML.\nHow to fix: Edit the config file (see etc/shot_config.toml), then rerun."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 missing samples, 4 invalid settings, 5 unusable input, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(ae) = err.downcast_ref::<AnalysisError>() {
        return match ae {
            AnalysisError::MissingSamples => 3,
            AnalysisError::InvalidSettings(_) => 4,
        };
    }
    if err.downcast_ref::<InputError>().is_some() {
        return 5;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(ae) = err.downcast_ref::<AnalysisError>() {
        return match ae {
            AnalysisError::MissingSamples => "MissingSamples",
            AnalysisError::InvalidSettings(_) => "InvalidSettings",
        };
    }
    match err.downcast_ref::<InputError>() {
        Some(InputError::Read { .. }) => "UnreadableInput",
        Some(InputError::Parse { .. }) => "MalformedInput",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    });
    if let Some(InputError::Read { path, .. } | InputError::Parse { path, .. }) =
        err.downcast_ref::<InputError>()
    {
        obj["details"] = json!({ "path": path.display().to_string() });
    }
    obj.to_string()
}
