// Wire types for the Tuya Web skill API
//
// The cloud is loose with types: numeric fields arrive as numbers or as
// decimal strings depending on firmware, and the power flag arrives as a
// boolean or the strings "true"/"false". The deserializers here absorb
// that so consumers only ever see clean Rust types.

use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Skill envelope ───────────────────────────────────────────────────

/// Response envelope returned by every `/homeassistant/skill` call:
/// `{ "header": { "code", "msg" }, "payload": ... }`.
/// `code` is `"SUCCESS"` on success; anything else is an API error.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct SkillResponse<T> {
    pub header: SkillHeader,
    #[serde(default)]
    pub payload: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct SkillHeader {
    pub code: String,
    #[serde(default)]
    pub msg: Option<String>,
}

// ── Device state ─────────────────────────────────────────────────────

/// A device state snapshot as reported by the cloud.
///
/// Exactly one of the level-bearing shapes is populated per device
/// class: flat `brightness` (dimmers, plain lights), a nested `color`
/// block (full-color lights), or `color_temp` (tunable-white lights).
/// Window coverings report a numeric motion code in `state` instead of
/// a power flag.
///
/// Uses `#[serde(flatten)]` to capture all fields beyond the core set,
/// so nothing from the cloud is silently dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceSnapshot {
    /// Whether the cloud currently considers the device reachable.
    #[serde(default)]
    pub online: Option<bool>,

    /// Power flag for lights/dimmers, or a raw motion code (1 = opening,
    /// 2 = closing, 3 = stopped) for window coverings.
    #[serde(default)]
    pub state: Option<ReportedState>,

    /// Flat brightness in the device value space (commonly 0-255).
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub brightness: Option<f64>,

    /// Some firmware reports dimmer level under `percentage` instead of
    /// `brightness`.
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub percentage: Option<f64>,

    /// Nested color block for full-color lights.
    #[serde(default)]
    pub color: Option<ColorState>,

    /// Color temperature in the device value space.
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub color_temp: Option<f64>,

    /// All remaining fields the cloud sends.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Color block of a full-color light, all in the device value space.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColorState {
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub brightness: Option<f64>,

    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub saturation: Option<f64>,

    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub hue: Option<f64>,
}

/// The overloaded `state` field: a power flag for lights, a motion code
/// for window coverings, either possibly string-encoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ReportedState {
    Flag(bool),
    Code(f64),
    Text(String),
}

impl ReportedState {
    /// Interpret the field as a power flag. Numeric codes are NOT
    /// treated as power -- a covering's motion code must never read
    /// as "on".
    pub fn as_power(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Text(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Self::Text(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Interpret the field as a numeric motion code.
    pub fn as_code(&self) -> Option<f64> {
        match self {
            Self::Code(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Flag(_) => None,
        }
    }
}

// ── Discovery ────────────────────────────────────────────────────────

/// One device from the discovery listing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeviceDescriptor {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Cloud device class, e.g. `"light"`, `"switch"`, `"cover"`.
    #[serde(default, rename = "dev_type")]
    pub device_type: Option<String>,

    /// Initial state snapshot, when the listing includes one.
    #[serde(default)]
    pub data: Option<DeviceSnapshot>,
}

// ── Commands ─────────────────────────────────────────────────────────

/// Payload of a control command, merged into the skill request payload.
/// `turnOnOff`, `brightnessSet`, `colorTemperatureSet` and `startStop`
/// carry `value`; `colorSet` carries `color`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CommandPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorCommand>,
}

impl CommandPayload {
    /// A `{ "value": n }` payload.
    pub fn value(value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// A `{ "color": { ... } }` payload.
    pub fn color(color: ColorCommand) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }
}

/// Color command body, already in the device value space.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColorCommand {
    pub brightness: f64,
    pub saturation: f64,
    pub hue: f64,
}

// ── Lenient deserializers ────────────────────────────────────────────

/// Accept a number, a string-encoded number, or null. Unparseable
/// strings become `None` rather than failing the whole snapshot.
fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("numeric field out of f64 range")),
        Value::String(s) => Ok(s.trim().parse().ok()),
        other => Err(D::Error::custom(format!(
            "expected number or string, got {other}"
        ))),
    }
}
