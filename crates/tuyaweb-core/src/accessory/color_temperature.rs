// Tunable-white light adapter: power, brightness, color temperature.

use std::sync::Arc;

use tokio::sync::broadcast;

use tuyaweb_api::{CommandPayload, DeviceSnapshot, ReportedState};

use crate::accessory::{DEFAULT_BRIGHTNESS, DEFAULT_COLOR_TEMPERATURE};
use crate::bridge::{ControlCommand, DeviceApi, DeviceBridge, PropertyUpdate};
use crate::cache::StateCache;
use crate::config::ColorTemperatureConfig;
use crate::error::CoreError;
use crate::model::{DeviceId, Property, StateValue};

/// A white-spectrum light with adjustable color temperature.
pub struct ColorTemperatureLight<A> {
    bridge: DeviceBridge<A>,
    config: ColorTemperatureConfig,
}

impl<A: DeviceApi> ColorTemperatureLight<A> {
    pub fn new(
        device_id: DeviceId,
        api: Arc<A>,
        cache: Arc<StateCache>,
        config: ColorTemperatureConfig,
    ) -> Self {
        Self {
            bridge: DeviceBridge::new(device_id, api, cache),
            config,
        }
    }

    /// Subscribe to pushed property updates for this device.
    pub fn subscribe(&self) -> broadcast::Receiver<PropertyUpdate> {
        self.bridge.subscribe()
    }

    fn normalize(&self, snapshot: &DeviceSnapshot) -> Vec<(Property, StateValue)> {
        let mut values = Vec::new();
        if let Some(on) = snapshot.state.as_ref().and_then(ReportedState::as_power) {
            values.push((Property::Power, StateValue::Bool(on)));
        }
        if let Some(raw) = snapshot.brightness {
            values.push((
                Property::Brightness,
                StateValue::Number(self.config.from_device_brightness.apply(raw)),
            ));
        }
        if let Some(raw) = snapshot.color_temp {
            values.push((
                Property::ColorTemperature,
                StateValue::Number(self.config.from_device_color_temperature.apply(raw)),
            ));
        }
        values
    }

    async fn number(&self, property: Property, default: f64) -> Result<f64, CoreError> {
        let value = self
            .bridge
            .get_state(property, self.config.use_cache, |s| self.normalize(s))
            .await?;
        Ok(value.and_then(StateValue::as_number).unwrap_or(default))
    }

    // ── Power ────────────────────────────────────────────────────

    pub async fn power(&self) -> Result<bool, CoreError> {
        let value = self
            .bridge
            .get_state(Property::Power, self.config.use_cache, |s| {
                self.normalize(s)
            })
            .await?;
        Ok(value.and_then(StateValue::as_bool).unwrap_or(false))
    }

    pub async fn set_power(&self, on: bool) -> Result<(), CoreError> {
        let value = if on { 1.0 } else { 0.0 };
        self.bridge
            .set_state(
                Property::Power,
                ControlCommand::TurnOnOff,
                CommandPayload::value(value),
                StateValue::Bool(on),
            )
            .await
    }

    // ── Brightness ───────────────────────────────────────────────

    pub async fn brightness(&self) -> Result<f64, CoreError> {
        self.number(Property::Brightness, DEFAULT_BRIGHTNESS).await
    }

    pub async fn set_brightness(&self, percentage: f64) -> Result<(), CoreError> {
        let device_value = self.config.to_device_brightness.apply(percentage);
        self.bridge
            .set_state(
                Property::Brightness,
                ControlCommand::BrightnessSet,
                CommandPayload::value(device_value),
                StateValue::Number(percentage),
            )
            .await
    }

    // ── Color temperature ────────────────────────────────────────

    pub async fn color_temperature(&self) -> Result<f64, CoreError> {
        self.number(Property::ColorTemperature, DEFAULT_COLOR_TEMPERATURE)
            .await
    }

    pub async fn set_color_temperature(&self, value: f64) -> Result<(), CoreError> {
        let device_value = self.config.to_device_color_temperature.apply(value);
        self.bridge
            .set_state(
                Property::ColorTemperature,
                ControlCommand::ColorTemperatureSet,
                CommandPayload::value(device_value),
                StateValue::Number(value),
            )
            .await
    }

    /// Apply an out-of-band snapshot pushed by the platform.
    pub fn update(&self, snapshot: &DeviceSnapshot) {
        self.bridge.apply_update(snapshot, |s| self.normalize(s));
    }
}
