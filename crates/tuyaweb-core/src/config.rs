// ── Accessory configuration ──
//
// Fully-defaulted configuration structures, one per accessory class.
// Every recognized option is enumerated with an explicit default and
// unknown keys are rejected -- a typo fails construction instead of
// silently falling back to a default. Config *file* handling lives
// with the platform; these types only parse the per-device JSON blob
// handed in at accessory construction.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::transform::Pipeline;

/// Parse an accessory configuration from its JSON form, mapping any
/// serde failure (unknown key, unknown pipeline operation, missing
/// operand) into a loud configuration error.
pub fn from_json<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, CoreError> {
    serde_json::from_value(value).map_err(|e| CoreError::config(e.to_string()))
}

// ── Dimmer ───────────────────────────────────────────────────────────

/// Configuration of a [`Dimmer`](crate::accessory::Dimmer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DimmerConfig {
    pub use_cache: bool,
    pub to_device_brightness: Pipeline,
    pub from_device_brightness: Pipeline,
}

impl Default for DimmerConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            to_device_brightness: Pipeline::identity(),
            from_device_brightness: Pipeline::level_from_device(),
        }
    }
}

// ── Full-color light ─────────────────────────────────────────────────

/// Configuration of a [`Light`](crate::accessory::Light).
///
/// Flat `brightness` pipelines apply when the device reports a flat
/// level; the `color_*` pipelines apply to the nested color block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct LightConfig {
    pub use_cache: bool,
    pub to_device_brightness: Pipeline,
    pub from_device_brightness: Pipeline,
    pub to_device_color_brightness: Pipeline,
    pub from_device_color_brightness: Pipeline,
    pub to_device_saturation: Pipeline,
    pub from_device_saturation: Pipeline,
    pub to_device_hue: Pipeline,
    pub from_device_hue: Pipeline,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            to_device_brightness: Pipeline::identity(),
            from_device_brightness: Pipeline::level_from_device(),
            to_device_color_brightness: Pipeline::identity(),
            from_device_color_brightness: Pipeline::identity(),
            to_device_saturation: Pipeline::identity(),
            from_device_saturation: Pipeline::level_from_device(),
            to_device_hue: Pipeline::identity(),
            from_device_hue: Pipeline::level_from_device(),
        }
    }
}

// ── Tunable-white light ──────────────────────────────────────────────

/// Configuration of a
/// [`ColorTemperatureLight`](crate::accessory::ColorTemperatureLight).
/// Temperature pipelines default to the identity in both directions;
/// vendors disagree too much about the temperature scale for a useful
/// shipped conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ColorTemperatureConfig {
    pub use_cache: bool,
    pub to_device_brightness: Pipeline,
    pub from_device_brightness: Pipeline,
    pub to_device_color_temperature: Pipeline,
    pub from_device_color_temperature: Pipeline,
}

impl Default for ColorTemperatureConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            to_device_brightness: Pipeline::identity(),
            from_device_brightness: Pipeline::level_from_device(),
            to_device_color_temperature: Pipeline::identity(),
            from_device_color_temperature: Pipeline::identity(),
        }
    }
}

// ── Window covering ──────────────────────────────────────────────────

/// Configuration of a
/// [`WindowCovering`](crate::accessory::WindowCovering). Coverings
/// exchange fixed command values with the cloud, so no pipelines apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct WindowCoveringConfig {
    pub use_cache: bool,
}

impl Default for WindowCoveringConfig {
    fn default() -> Self {
        Self { use_cache: true }
    }
}
