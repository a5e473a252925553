//! Data model for recorded shots and brewing profiles.
//!
//! The field names on the wire follow the JSON the brewing controller writes
//! (`t`, `cp`, `fl`, `phaseTransitions`, ...). Profiles are parsed leniently:
//! a `phases` or `targets` entry that is not a list becomes empty instead of
//! failing the whole document.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

/// One scalar channel of a [`Sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Measured pressure (bar), `cp`.
    Pressure,
    /// Commanded pressure (bar), `tp`.
    TargetPressure,
    /// Pump flow (ml/s), `fl`.
    Flow,
    /// Commanded flow (ml/s), `tf`.
    TargetFlow,
    /// Flow through the puck (ml/s), `pf`.
    PuckFlow,
    /// Boiler temperature (°C), `ct`.
    Temperature,
    /// Commanded temperature (°C), `tt`.
    TargetTemperature,
    /// Cup weight (g), `v`.
    Weight,
    /// Flow rate reported by the scale (g/s), `vf`.
    ScaleFlow,
}

impl Channel {
    /// Channels reported in every phase and in the shot total.
    pub const STATS: [Channel; 8] = [
        Channel::Pressure,
        Channel::TargetPressure,
        Channel::Flow,
        Channel::TargetFlow,
        Channel::PuckFlow,
        Channel::Temperature,
        Channel::TargetTemperature,
        Channel::Weight,
    ];
}

/// Controller status flags attached to a sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bluetooth_scale_connected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shot_started_volumetric: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currently_volumetric: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumetric_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_recording: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

/// One telemetry tick. Absent channels read as `0.0` through [`Sample::value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Timestamp in milliseconds.
    pub t: i64,
    #[serde(default)]
    pub phase_number: i64,
    #[serde(rename = "cp", skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(rename = "tp", skip_serializing_if = "Option::is_none")]
    pub target_pressure: Option<f64>,
    #[serde(rename = "fl", skip_serializing_if = "Option::is_none")]
    pub flow: Option<f64>,
    #[serde(rename = "tf", skip_serializing_if = "Option::is_none")]
    pub target_flow: Option<f64>,
    #[serde(rename = "pf", skip_serializing_if = "Option::is_none")]
    pub puck_flow: Option<f64>,
    #[serde(rename = "ct", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "tt", skip_serializing_if = "Option::is_none")]
    pub target_temperature: Option<f64>,
    #[serde(rename = "v", skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(rename = "vf", skip_serializing_if = "Option::is_none")]
    pub scale_flow: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_info: Option<SystemInfo>,
}

impl Sample {
    /// A sample at `t` ms belonging to `phase_number`, with no channels set.
    pub fn new(t: i64, phase_number: i64) -> Self {
        Self {
            t,
            phase_number,
            ..Self::default()
        }
    }

    /// Set one channel (builder style).
    pub fn with(mut self, channel: Channel, value: f64) -> Self {
        *self.slot_mut(channel) = Some(value);
        self
    }

    /// Attach controller status flags (builder style).
    pub fn with_system_info(mut self, info: SystemInfo) -> Self {
        self.system_info = Some(info);
        self
    }

    /// Raw channel value, if the sample carries it.
    pub fn get(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Pressure => self.pressure,
            Channel::TargetPressure => self.target_pressure,
            Channel::Flow => self.flow,
            Channel::TargetFlow => self.target_flow,
            Channel::PuckFlow => self.puck_flow,
            Channel::Temperature => self.temperature,
            Channel::TargetTemperature => self.target_temperature,
            Channel::Weight => self.weight,
            Channel::ScaleFlow => self.scale_flow,
        }
    }

    /// Channel value with the missing-means-zero rule applied.
    #[inline]
    pub fn value(&self, channel: Channel) -> f64 {
        self.get(channel).unwrap_or(0.0)
    }

    /// True when the controller explicitly reported the scale as disconnected.
    pub fn scale_disconnected(&self) -> bool {
        self.system_info
            .as_ref()
            .and_then(|s| s.bluetooth_scale_connected)
            == Some(false)
    }

    /// True when the controller reported a brew-by-weight start on this sample.
    pub fn started_volumetric(&self) -> bool {
        self.system_info
            .as_ref()
            .and_then(|s| s.shot_started_volumetric)
            == Some(true)
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut Option<f64> {
        match channel {
            Channel::Pressure => &mut self.pressure,
            Channel::TargetPressure => &mut self.target_pressure,
            Channel::Flow => &mut self.flow,
            Channel::TargetFlow => &mut self.target_flow,
            Channel::PuckFlow => &mut self.puck_flow,
            Channel::Temperature => &mut self.temperature,
            Channel::TargetTemperature => &mut self.target_temperature,
            Channel::Weight => &mut self.weight,
            Channel::ScaleFlow => &mut self.scale_flow,
        }
    }
}

/// Maps a phase number to the name the controller announced for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTransition {
    pub phase_number: i64,
    #[serde(default)]
    pub phase_name: String,
}

/// Profile reference stored on a shot: either a bare label or a profile object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileRef {
    Label(String),
    Meta {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl ProfileRef {
    /// Label used to look the profile up in a library.
    pub fn label(&self) -> Option<&str> {
        match self {
            ProfileRef::Label(s) => Some(s),
            ProfileRef::Meta { label, .. } => label.as_deref(),
        }
    }

    /// Name shown to a user: the bare label, else `title`, else `label`.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            ProfileRef::Label(s) => Some(s),
            ProfileRef::Meta { title, label } => title.as_deref().or(label.as_deref()),
        }
    }
}

/// A recorded extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotRecord {
    #[serde(default, deserialize_with = "de_null_as_empty")]
    pub samples: Vec<Sample>,
    #[serde(default, deserialize_with = "de_null_as_empty")]
    pub phase_transitions: Vec<PhaseTransition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// Seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, alias = "bean_weight", skip_serializing_if = "Option::is_none")]
    pub dose_in: Option<f64>,
    #[serde(default, alias = "drink_weight", skip_serializing_if = "Option::is_none")]
    pub dose_out: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl ShotRecord {
    /// A shot made of `samples` with no metadata.
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            ..Self::default()
        }
    }

    /// Builder-style helper to name a phase.
    pub fn with_transition(mut self, phase_number: i64, phase_name: impl Into<String>) -> Self {
        self.phase_transitions.push(PhaseTransition {
            phase_number,
            phase_name: phase_name.into(),
        });
        self
    }
}

/// Quantity a profile target compares against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Pressure,
    Flow,
    Pumped,
    Weight,
    Volumetric,
    #[serde(untagged)]
    Other(String),
}

impl TargetType {
    pub fn as_str(&self) -> &str {
        match self {
            TargetType::Pressure => "pressure",
            TargetType::Flow => "flow",
            TargetType::Pumped => "pumped",
            TargetType::Weight => "weight",
            TargetType::Volumetric => "volumetric",
            TargetType::Other(s) => s,
        }
    }

    /// Weight-like targets depend on the scale connection.
    pub fn is_scale_based(&self) -> bool {
        matches!(self, TargetType::Weight | TargetType::Volumetric)
    }
}

/// Comparison a target applies: `measured >= value` or `measured <= value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Gte,
    Lte,
    #[serde(untagged)]
    Other(String),
}

impl Operator {
    /// Whether `measured` satisfies the comparison against `threshold`.
    /// Unknown operators never match.
    #[inline]
    pub fn holds(&self, measured: f64, threshold: f64) -> bool {
        match self {
            Operator::Gte => measured >= threshold,
            Operator::Lte => measured <= threshold,
            Operator::Other(_) => false,
        }
    }
}

/// A stop condition on a profile phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "type")]
    pub kind: TargetType,
    pub operator: Operator,
    pub value: f64,
}

impl Target {
    pub fn new(kind: TargetType, operator: Operator, value: f64) -> Self {
        Self {
            kind,
            operator,
            value,
        }
    }
}

/// One step of a brewing profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePhase {
    #[serde(default)]
    pub name: String,
    /// Planned duration in seconds; a phase without one is never time limited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient_list")]
    pub targets: Vec<Target>,
}

/// A declarative brewing recipe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub label: String,
    #[serde(default, deserialize_with = "de_lenient_list")]
    pub phases: Vec<ProfilePhase>,
}

impl ProfileRecord {
    /// Find the phase whose trimmed name equals `name`, ignoring case.
    pub fn phase_named(&self, name: &str) -> Option<&ProfilePhase> {
        let wanted = name.trim().to_lowercase();
        self.phases
            .iter()
            .find(|p| p.name.trim().to_lowercase() == wanted)
    }
}

fn de_null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// Accept any JSON value: a list keeps the entries that parse, anything else
/// is an empty list.
fn de_lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => return Ok(Vec::new()),
        _ => {
            tracing::debug!("ignoring non-list profile entry");
            return Ok(Vec::new());
        }
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<T>(item) {
            Ok(v) => out.push(v),
            Err(e) => tracing::debug!(error = %e, "skipping malformed profile entry"),
        }
    }
    Ok(out)
}
