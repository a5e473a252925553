//! Header metadata for a shot and profile lookup.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::types::{Channel, ProfileRecord, ShotRecord};
use crate::util::elapsed_secs;

/// Shown when a shot names no profile.
pub const UNKNOWN_PROFILE: &str = "Manual / Unknown";

// The unit must follow the number directly: "18g" matches, "18 g" does not.
static DOSE_IN_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)g\b").ok());

/// Derived header facts about a shot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotSummary {
    pub id: Option<String>,
    pub profile_name: String,
    /// Seconds since the Unix epoch.
    pub timestamp: Option<f64>,
    pub duration_s: f64,
    pub dose_in_g: Option<f64>,
    pub dose_out_g: Option<f64>,
    /// Output over input, e.g. `2.0` for a 1:2 shot.
    pub ratio: Option<f64>,
    pub rating: Option<f64>,
}

impl ShotSummary {
    pub fn from_shot(shot: &ShotRecord) -> Self {
        let profile_name = shot
            .profile
            .as_ref()
            .and_then(|p| p.display_name())
            .unwrap_or(UNKNOWN_PROFILE)
            .to_string();

        let dose_in_g = positive(shot.dose_in).or_else(|| dose_from_name(&profile_name));
        let dose_out_g = positive(shot.dose_out).or_else(|| {
            let max = shot
                .samples
                .iter()
                .map(|s| s.value(Channel::Weight))
                .fold(0.0_f64, f64::max);
            positive(Some(round_to_tenth(max)))
        });
        let ratio = positive(shot.ratio).or_else(|| match (dose_in_g, dose_out_g) {
            (Some(i), Some(o)) => Some(round_to_tenth(o / i)),
            _ => None,
        });
        let duration_s = match (shot.samples.first(), shot.samples.last()) {
            (Some(a), Some(b)) => elapsed_secs(a.t, b.t),
            _ => 0.0,
        };

        Self {
            id: shot.id.as_ref().map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            profile_name,
            timestamp: shot.timestamp,
            duration_s,
            dose_in_g,
            dose_out_g,
            ratio,
            rating: positive(shot.rating),
        }
    }
}

/// First profile whose label matches the shot's profile label, ignoring case.
pub fn find_profile_for_shot<'p>(
    shot: &ShotRecord,
    profiles: &'p [ProfileRecord],
) -> Option<&'p ProfileRecord> {
    let wanted = shot.profile.as_ref()?.label()?.to_lowercase();
    profiles.iter().find(|p| p.label.to_lowercase() == wanted)
}

/// Dose parsed from a name such as `"Classic 18g"`.
pub fn dose_from_name(name: &str) -> Option<f64> {
    let re = DOSE_IN_NAME.as_ref()?;
    let caps = re.captures(name)?;
    positive(caps.get(1)?.as_str().parse().ok())
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x > 0.0)
}

fn round_to_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
