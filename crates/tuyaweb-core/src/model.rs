// ── Domain model ──
//
// Strong types shared by the cache and orchestration layers: device
// identity, the per-property key space, cacheable values, and the
// derived motion state of window coverings.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── DeviceId ─────────────────────────────────────────────────────────

/// Opaque cloud identifier of one device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ── Property ─────────────────────────────────────────────────────────

/// Logical property of an accessory, always addressed in the standard
/// value space. One cache key per property per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Property {
    Power,
    Brightness,
    Saturation,
    Hue,
    ColorTemperature,
    MotionState,
}

// ── StateValue ───────────────────────────────────────────────────────

/// A cacheable property value: numeric or boolean. On/off stays
/// boolean and never passes through a transformation pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateValue {
    Bool(bool),
    Number(f64),
}

impl StateValue {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            Self::Number(_) => None,
        }
    }

    pub fn as_number(self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n),
            Self::Bool(_) => None,
        }
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for StateValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

// ── Motion state ─────────────────────────────────────────────────────

/// Motion state of a window covering.
///
/// The device only ever reports `Opening`, `Closing` or `Stopped`;
/// `Open` and `Closed` are virtual values derived from the immediately
/// preceding state at the moment a `Stopped` observation arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MotionState {
    Opening,
    Closing,
    Stopped,
    Open,
    Closed,
}

/// Direction of travel as exposed at the accessory boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MotionDirection {
    Increasing,
    Decreasing,
    Stopped,
}

impl MotionState {
    /// Decode the numeric code used on the wire and in the cache.
    pub fn from_code(code: f64) -> Option<Self> {
        if !code.is_finite() {
            return None;
        }
        match code as i64 {
            1 => Some(Self::Opening),
            2 => Some(Self::Closing),
            3 => Some(Self::Stopped),
            4 => Some(Self::Open),
            5 => Some(Self::Closed),
            _ => None,
        }
    }

    /// The numeric code used on the wire and in the cache.
    pub fn code(self) -> f64 {
        match self {
            Self::Opening => 1.0,
            Self::Closing => 2.0,
            Self::Stopped => 3.0,
            Self::Open => 4.0,
            Self::Closed => 5.0,
        }
    }

    /// Transition function of the derived state machine.
    ///
    /// A `Stopped` observation resolves to the virtual `Open` or
    /// `Closed` depending on which way the covering was last moving;
    /// every other observation passes through unchanged.
    pub fn after(observed: Self, previous: Self) -> Self {
        match (observed, previous) {
            (Self::Stopped, Self::Opening | Self::Open) => Self::Open,
            (Self::Stopped, Self::Closing | Self::Closed) => Self::Closed,
            _ => observed,
        }
    }

    /// Position percentage at the accessory boundary.
    pub fn position(self) -> f64 {
        match self {
            Self::Opening | Self::Open => 100.0,
            Self::Closing | Self::Closed => 0.0,
            Self::Stopped => 50.0,
        }
    }

    /// Direction of travel at the accessory boundary.
    pub fn direction(self) -> MotionDirection {
        match self {
            Self::Opening => MotionDirection::Increasing,
            Self::Closing => MotionDirection::Decreasing,
            _ => MotionDirection::Stopped,
        }
    }
}
