// Dimmer adapter: power plus a flat brightness channel.

use std::sync::Arc;

use tokio::sync::broadcast;

use tuyaweb_api::{CommandPayload, DeviceSnapshot, ReportedState};

use crate::accessory::DEFAULT_BRIGHTNESS;
use crate::bridge::{ControlCommand, DeviceApi, DeviceBridge, PropertyUpdate};
use crate::cache::StateCache;
use crate::config::DimmerConfig;
use crate::error::CoreError;
use crate::model::{DeviceId, Property, StateValue};

/// A dimmable light without color support.
pub struct Dimmer<A> {
    bridge: DeviceBridge<A>,
    config: DimmerConfig,
}

impl<A: DeviceApi> Dimmer<A> {
    pub fn new(
        device_id: DeviceId,
        api: Arc<A>,
        cache: Arc<StateCache>,
        config: DimmerConfig,
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

    /// Snapshot fields in standard space. Some firmware reports the
    /// dimmer level under `percentage` rather than `brightness`.
    fn normalize(&self, snapshot: &DeviceSnapshot) -> Vec<(Property, StateValue)> {
        let mut values = Vec::new();
        if let Some(on) = snapshot.state.as_ref().and_then(ReportedState::as_power) {
            values.push((Property::Power, StateValue::Bool(on)));
        }
        if let Some(raw) = snapshot.percentage.or(snapshot.brightness) {
            values.push((
                Property::Brightness,
                StateValue::Number(self.config.from_device_brightness.apply(raw)),
            ));
        }
        values
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

    /// Brightness percentage in the standard value space.
    pub async fn brightness(&self) -> Result<f64, CoreError> {
        let value = self
            .bridge
            .get_state(Property::Brightness, self.config.use_cache, |s| {
                self.normalize(s)
            })
            .await?;
        Ok(value
            .and_then(StateValue::as_number)
            .unwrap_or(DEFAULT_BRIGHTNESS))
    }

    /// Set the brightness percentage. The command carries the
    /// write-side pipeline's output; the cache keeps the percentage as
    /// accepted at the accessory boundary.
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

    /// Apply an out-of-band snapshot pushed by the platform.
    pub fn update(&self, snapshot: &DeviceSnapshot) {
        self.bridge.apply_update(snapshot, |s| self.normalize(s));
    }
}
