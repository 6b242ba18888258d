// ── Numeric transformation pipeline ──
//
// Converts between the device value space (vendor-specific, commonly
// 0-255) and the standard value space at the accessory boundary
// (0-100 / 0-360 style ranges). A pipeline is an ordered list of steps
// folded over the input; read-side and write-side pipelines for the
// same property are configured independently and are NOT required to
// be inverses of each other.
//
// Pipelines never trap bad arithmetic: divide-by-zero and similar
// ill-conditioned operands propagate IEEE inf/NaN to the caller.

use serde::{Deserialize, Serialize};

/// One transformation step.
///
/// The serde form matches the operator-facing configuration:
/// `{ "type": "divide", "value": 255 }` for the arithmetic operations,
/// `{ "type": "floor" }` for the operand-free ones. An unknown `type`
/// or a missing `value` fails deserialization -- configuration errors
/// are loud, never defaulted away.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Transformation {
    Add { value: f64 },
    Subtract { value: f64 },
    Multiply { value: f64 },
    Divide { value: f64 },
    Truncate,
    Floor,
    Round,
}

impl Transformation {
    /// Apply this step to one value.
    pub fn apply(self, input: f64) -> f64 {
        match self {
            Self::Add { value } => input + value,
            Self::Subtract { value } => input - value,
            Self::Multiply { value } => input * value,
            Self::Divide { value } => input / value,
            Self::Truncate => input.trunc(),
            Self::Floor => input.floor(),
            Self::Round => input.round(),
        }
    }
}

/// An ordered sequence of transformation steps, applied left to right.
/// The empty pipeline is the identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pipeline {
    steps: Vec<Transformation>,
}

impl Pipeline {
    pub fn new(steps: Vec<Transformation>) -> Self {
        Self { steps }
    }

    /// The empty pipeline: passes values through unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    /// Fold the input through every step. Pure and deterministic.
    pub fn apply(&self, value: f64) -> f64 {
        self.steps
            .iter()
            .fold(value, |acc, step| step.apply(acc))
    }

    /// The shipped read-side default for level-style properties:
    /// device 0-255 to standard 0-100 via truncate, divide by 255,
    /// multiply by 100, floor. The matching write-side default is the
    /// identity; the asymmetry is intentional.
    pub fn level_from_device() -> Self {
        Self::new(vec![
            Transformation::Truncate,
            Transformation::Divide { value: 255.0 },
            Transformation::Multiply { value: 100.0 },
            Transformation::Floor,
        ])
    }
}

impl From<Vec<Transformation>> for Pipeline {
    fn from(steps: Vec<Transformation>) -> Self {
        Self::new(steps)
    }
}
