// Full-color light adapter.
//
// Brightness, saturation and hue are three independently cached,
// independently mutated properties. Setting one color component reads
// the other two (cache-first), patches the one that changed, and ships
// a single colorSet command carrying all three in device space.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use tuyaweb_api::{ColorCommand, CommandPayload, DeviceSnapshot, ReportedState};

use crate::accessory::{DEFAULT_BRIGHTNESS, DEFAULT_HUE, DEFAULT_SATURATION};
use crate::bridge::{ControlCommand, DeviceApi, DeviceBridge, PropertyUpdate};
use crate::cache::StateCache;
use crate::config::LightConfig;
use crate::error::CoreError;
use crate::model::{DeviceId, Property, StateValue};

/// A light with full color support.
pub struct Light<A> {
    bridge: DeviceBridge<A>,
    config: LightConfig,
}

impl<A: DeviceApi> Light<A> {
    pub fn new(
        device_id: DeviceId,
        api: Arc<A>,
        cache: Arc<StateCache>,
        config: LightConfig,
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

    /// Snapshot fields in standard space. Color-capable firmware
    /// reports a nested color block; otherwise only a flat brightness
    /// arrives, through its own pipeline.
    fn normalize(&self, snapshot: &DeviceSnapshot) -> Vec<(Property, StateValue)> {
        let mut values = Vec::new();
        if let Some(on) = snapshot.state.as_ref().and_then(ReportedState::as_power) {
            values.push((Property::Power, StateValue::Bool(on)));
        }
        if let Some(color) = &snapshot.color {
            if let Some(raw) = color.brightness {
                values.push((
                    Property::Brightness,
                    StateValue::Number(self.config.from_device_color_brightness.apply(raw)),
                ));
            }
            if let Some(raw) = color.saturation {
                values.push((
                    Property::Saturation,
                    StateValue::Number(self.config.from_device_saturation.apply(raw)),
                ));
            }
            if let Some(raw) = color.hue {
                values.push((
                    Property::Hue,
                    StateValue::Number(self.config.from_device_hue.apply(raw)),
                ));
            }
        } else if let Some(raw) = snapshot.brightness {
            values.push((
                Property::Brightness,
                StateValue::Number(self.config.from_device_brightness.apply(raw)),
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

    // ── Color components ─────────────────────────────────────────

    pub async fn brightness(&self) -> Result<f64, CoreError> {
        self.number(Property::Brightness, DEFAULT_BRIGHTNESS).await
    }

    /// Set brightness through the flat channel. Brightness has its own
    /// command; it does not ride on colorSet.
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

    pub async fn saturation(&self) -> Result<f64, CoreError> {
        self.number(Property::Saturation, DEFAULT_SATURATION).await
    }

    pub async fn set_saturation(&self, percentage: f64) -> Result<(), CoreError> {
        let brightness = self.brightness().await?;
        let hue = self.hue().await?;
        debug!(device = %self.bridge.device_id(), saturation = percentage, "updating color");
        self.write_color(brightness, percentage, hue).await
    }

    pub async fn hue(&self) -> Result<f64, CoreError> {
        self.number(Property::Hue, DEFAULT_HUE).await
    }

    pub async fn set_hue(&self, degrees: f64) -> Result<(), CoreError> {
        let brightness = self.brightness().await?;
        let saturation = self.saturation().await?;
        debug!(device = %self.bridge.device_id(), hue = degrees, "updating color");
        self.write_color(brightness, saturation, degrees).await
    }

    /// Ship one colorSet command and, on success, record all three
    /// components in standard space under one refreshed marker. A
    /// failure invalidates the whole device.
    async fn write_color(
        &self,
        brightness: f64,
        saturation: f64,
        hue: f64,
    ) -> Result<(), CoreError> {
        let payload = CommandPayload::color(ColorCommand {
            brightness: self.config.to_device_color_brightness.apply(brightness),
            saturation: self.config.to_device_saturation.apply(saturation),
            hue: self.config.to_device_hue.apply(hue),
        });

        self.bridge
            .send_command(ControlCommand::ColorSet, payload)
            .await?;

        self.bridge
            .write_cached(Property::Brightness, StateValue::Number(brightness));
        self.bridge
            .write_cached(Property::Saturation, StateValue::Number(saturation));
        self.bridge.write_cached(Property::Hue, StateValue::Number(hue));
        Ok(())
    }

    /// Apply an out-of-band snapshot pushed by the platform.
    pub fn update(&self, snapshot: &DeviceSnapshot) {
        self.bridge.apply_update(snapshot, |s| self.normalize(s));
    }
}
