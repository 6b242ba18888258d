#![allow(clippy::unwrap_used)]
// End-to-end adapter scenarios against an in-process fake of the cloud
// API: cache hits and misses, optimistic writes, failure invalidation,
// derived window-covering state, and concurrent reads.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use tuyaweb_api::{CommandPayload, DeviceSnapshot};
use tuyaweb_core::bridge::{ControlCommand, DeviceApi};
use tuyaweb_core::{
    ColorTemperatureConfig, ColorTemperatureLight, CoreError, DeviceId, Dimmer, DimmerConfig,
    Light, LightConfig, MotionDirection, MotionState, Property, StateCache, StateValue,
    WindowCovering, WindowCoveringConfig,
};

// ── Fake cloud API ──────────────────────────────────────────────────

struct FakeApi {
    snapshot: Mutex<DeviceSnapshot>,
    fail_fetch: AtomicBool,
    fail_command: AtomicBool,
    /// Delay inside fetch, to hold concurrent readers in flight.
    fetch_delay: Option<Duration>,
    fetches: AtomicUsize,
    commands: Mutex<Vec<(ControlCommand, CommandPayload)>>,
}

impl FakeApi {
    fn new(snapshot: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            snapshot: Mutex::new(serde_json::from_value(snapshot).unwrap()),
            fail_fetch: AtomicBool::new(false),
            fail_command: AtomicBool::new(false),
            fetch_delay: None,
            fetches: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        })
    }

    fn with_fetch_delay(snapshot: serde_json::Value, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            snapshot: Mutex::new(serde_json::from_value(snapshot).unwrap()),
            fail_fetch: AtomicBool::new(false),
            fail_command: AtomicBool::new(false),
            fetch_delay: Some(delay),
            fetches: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        })
    }

    fn set_snapshot(&self, snapshot: serde_json::Value) {
        *self.snapshot.lock().unwrap() = serde_json::from_value(snapshot).unwrap();
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn commands(&self) -> Vec<(ControlCommand, CommandPayload)> {
        self.commands.lock().unwrap().clone()
    }
}

impl DeviceApi for FakeApi {
    async fn fetch(&self, _device_id: &DeviceId) -> Result<DeviceSnapshot, tuyaweb_api::Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(tuyaweb_api::Error::Api {
                message: "device is offline".into(),
                code: Some("TargetOffline".into()),
            });
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn command(
        &self,
        _device_id: &DeviceId,
        command: ControlCommand,
        payload: CommandPayload,
    ) -> Result<(), tuyaweb_api::Error> {
        if self.fail_command.load(Ordering::SeqCst) {
            return Err(tuyaweb_api::Error::Api {
                message: "command rejected".into(),
                code: Some("ProcessFail".into()),
            });
        }
        self.commands.lock().unwrap().push((command, payload));
        Ok(())
    }
}

fn cache() -> Arc<StateCache> {
    Arc::new(StateCache::new(Duration::from_secs(10)))
}

// ── Dimmer scenarios ────────────────────────────────────────────────

#[tokio::test]
async fn dimmer_read_applies_the_default_level_pipeline() {
    let api = FakeApi::new(json!({ "state": "true", "brightness": "128" }));
    let dimmer = Dimmer::new(
        DeviceId::from("dim-1"),
        Arc::clone(&api),
        cache(),
        DimmerConfig::default(),
    );

    assert_eq!(dimmer.brightness().await.unwrap(), 50.0);
    assert!(dimmer.power().await.unwrap());
    // Both reads came from the single bulk-populated snapshot.
    assert_eq!(api.fetch_count(), 1);
}

#[tokio::test]
async fn dimmer_full_scale_reads_as_100() {
    let api = FakeApi::new(json!({ "state": "true", "brightness": 255 }));
    let dimmer = Dimmer::new(
        DeviceId::from("dim-1"),
        Arc::clone(&api),
        cache(),
        DimmerConfig::default(),
    );

    assert_eq!(dimmer.brightness().await.unwrap(), 100.0);
}

#[tokio::test]
async fn set_then_get_hits_the_optimistic_write() {
    let api = FakeApi::new(json!({ "state": "false", "brightness": 0 }));
    let dimmer = Dimmer::new(
        DeviceId::from("dim-1"),
        Arc::clone(&api),
        cache(),
        DimmerConfig::default(),
    );

    dimmer.set_brightness(75.0).await.unwrap();

    // Served from the cache in standard space, with no fetch at all.
    assert_eq!(dimmer.brightness().await.unwrap(), 75.0);
    assert_eq!(api.fetch_count(), 0);
}

#[tokio::test]
async fn write_side_default_pipeline_is_the_identity() {
    let api = FakeApi::new(json!({}));
    let dimmer = Dimmer::new(
        DeviceId::from("dim-1"),
        Arc::clone(&api),
        cache(),
        DimmerConfig::default(),
    );

    dimmer.set_brightness(42.0).await.unwrap();

    let commands = api.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].0, ControlCommand::BrightnessSet);
    // The percentage went out untransformed; read and write pipelines
    // are independent and deliberately not inverses.
    assert_eq!(commands[0].1, CommandPayload::value(42.0));
}

#[tokio::test]
async fn failed_set_invalidates_the_device() {
    let shared = cache();
    let device = DeviceId::from("dim-1");
    let api = FakeApi::new(json!({ "state": "true", "brightness": 255 }));
    let dimmer = Dimmer::new(
        device.clone(),
        Arc::clone(&api),
        Arc::clone(&shared),
        DimmerConfig::default(),
    );

    // Warm the cache, then fail a write.
    assert!(dimmer.power().await.unwrap());
    api.fail_command.store(true, Ordering::SeqCst);

    let result = dimmer.set_brightness(10.0).await;
    assert!(matches!(result, Err(CoreError::Remote(_))));
    assert!(!shared.is_valid(&device));

    // The next read goes back to ground truth.
    api.fail_command.store(false, Ordering::SeqCst);
    assert!(dimmer.power().await.unwrap());
    assert_eq!(api.fetch_count(), 2);
}

#[tokio::test]
async fn fetch_failure_propagates_and_invalidates() {
    let shared = cache();
    let device = DeviceId::from("dim-1");
    let api = FakeApi::new(json!({ "state": "true" }));
    let dimmer = Dimmer::new(
        device.clone(),
        Arc::clone(&api),
        Arc::clone(&shared),
        DimmerConfig { use_cache: false, ..DimmerConfig::default() },
    );

    api.fail_fetch.store(true, Ordering::SeqCst);

    let result = dimmer.power().await;
    assert!(matches!(result, Err(CoreError::Remote(_))));
    assert!(!shared.is_valid(&device));
}

#[tokio::test]
async fn use_cache_false_always_fetches() {
    let api = FakeApi::new(json!({ "state": "true", "brightness": 255 }));
    let dimmer = Dimmer::new(
        DeviceId::from("dim-1"),
        Arc::clone(&api),
        cache(),
        DimmerConfig { use_cache: false, ..DimmerConfig::default() },
    );

    dimmer.power().await.unwrap();
    dimmer.power().await.unwrap();

    assert_eq!(api.fetch_count(), 2);
}

#[tokio::test]
async fn push_update_transforms_and_notifies() {
    let api = FakeApi::new(json!({}));
    let dimmer = Dimmer::new(
        DeviceId::from("dim-1"),
        Arc::clone(&api),
        cache(),
        DimmerConfig::default(),
    );
    let mut updates = dimmer.subscribe();

    // Pushed raw values run through the same read-side pipelines as a
    // fetch; 128 on the wire is 50 percent at the boundary.
    dimmer.update(&serde_json::from_value(json!({ "state": "true", "percentage": "128" })).unwrap());

    let mut seen = Vec::new();
    while let Ok(update) = updates.try_recv() {
        seen.push((update.property, update.value));
    }
    assert!(seen.contains(&(Property::Power, StateValue::Bool(true))));
    assert!(seen.contains(&(Property::Brightness, StateValue::Number(50.0))));

    // And the cache reflects the push without any fetch.
    assert_eq!(dimmer.brightness().await.unwrap(), 50.0);
    assert_eq!(api.fetch_count(), 0);
}

// ── Concurrency ─────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_reads_during_an_invalid_window_each_fetch() {
    let api = FakeApi::with_fetch_delay(
        json!({ "state": "true", "brightness": 255 }),
        Duration::from_millis(20),
    );
    let dimmer = Dimmer::new(
        DeviceId::from("dim-1"),
        Arc::clone(&api),
        cache(),
        DimmerConfig::default(),
    );

    // Both handlers observe the invalid window and issue their own
    // fetch; neither result is corrupted. The duplicate round-trip is
    // accepted, not deduplicated.
    let (power, brightness) = tokio::join!(dimmer.power(), dimmer.brightness());

    assert!(power.unwrap());
    assert_eq!(brightness.unwrap(), 100.0);
    assert_eq!(api.fetch_count(), 2);
}

// ── Full-color light scenarios ──────────────────────────────────────

#[tokio::test]
async fn light_normalizes_the_color_block() {
    let api = FakeApi::new(json!({
        "state": true,
        "color": { "brightness": 255, "saturation": "128", "hue": 64 }
    }));
    let light = Light::new(
        DeviceId::from("rgb-1"),
        Arc::clone(&api),
        cache(),
        LightConfig::default(),
    );

    // Color brightness rides the identity default; saturation and hue
    // ride the level conversion.
    assert_eq!(light.brightness().await.unwrap(), 255.0);
    assert_eq!(light.saturation().await.unwrap(), 50.0);
    assert_eq!(light.hue().await.unwrap(), 25.0);
    assert_eq!(api.fetch_count(), 1);
}

#[tokio::test]
async fn set_saturation_patches_only_saturation() {
    let api = FakeApi::new(json!({
        "state": true,
        "color": { "brightness": 255, "saturation": 128, "hue": 64 }
    }));
    let light = Light::new(
        DeviceId::from("rgb-1"),
        Arc::clone(&api),
        cache(),
        LightConfig::default(),
    );

    light.set_saturation(80.0).await.unwrap();

    let commands = api.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].0, ControlCommand::ColorSet);
    let color = commands[0].1.color.clone().unwrap();
    assert_eq!(color.saturation, 80.0);
    assert_eq!(color.brightness, 255.0);
    assert_eq!(color.hue, 25.0);

    // All three are cached independently in standard space.
    assert_eq!(light.saturation().await.unwrap(), 80.0);
    assert_eq!(light.hue().await.unwrap(), 25.0);
    assert_eq!(light.brightness().await.unwrap(), 255.0);
    assert_eq!(api.fetch_count(), 1);
}

#[tokio::test]
async fn set_hue_does_not_disturb_saturation() {
    let api = FakeApi::new(json!({
        "state": true,
        "color": { "brightness": 255, "saturation": 128, "hue": 64 }
    }));
    let light = Light::new(
        DeviceId::from("rgb-1"),
        Arc::clone(&api),
        cache(),
        LightConfig::default(),
    );

    light.set_hue(300.0).await.unwrap();

    let color = api.commands()[0].1.color.clone().unwrap();
    assert_eq!(color.hue, 300.0);
    assert_eq!(color.saturation, 50.0);

    assert_eq!(light.hue().await.unwrap(), 300.0);
    assert_eq!(light.saturation().await.unwrap(), 50.0);
}

#[tokio::test]
async fn light_falls_back_to_flat_brightness_without_a_color_block() {
    let api = FakeApi::new(json!({ "state": "true", "brightness": "255" }));
    let light = Light::new(
        DeviceId::from("rgb-1"),
        Arc::clone(&api),
        cache(),
        LightConfig::default(),
    );

    // The flat channel has its own pipeline: 255 reads as 100.
    assert_eq!(light.brightness().await.unwrap(), 100.0);
}

#[tokio::test]
async fn failed_color_write_invalidates_the_device() {
    let shared = cache();
    let device = DeviceId::from("rgb-1");
    let api = FakeApi::new(json!({
        "state": true,
        "color": { "brightness": 255, "saturation": 128, "hue": 64 }
    }));
    let light = Light::new(
        device.clone(),
        Arc::clone(&api),
        Arc::clone(&shared),
        LightConfig::default(),
    );

    // Warm the cache so the color read succeeds, then fail the write.
    light.saturation().await.unwrap();
    api.fail_command.store(true, Ordering::SeqCst);

    let result = light.set_saturation(10.0).await;
    assert!(matches!(result, Err(CoreError::Remote(_))));
    assert!(!shared.is_valid(&device));
}

// ── Tunable-white light scenarios ───────────────────────────────────

#[tokio::test]
async fn color_temperature_round_trip() {
    let api = FakeApi::new(json!({ "state": "true", "brightness": 128, "color_temp": 4000 }));
    let light = ColorTemperatureLight::new(
        DeviceId::from("cct-1"),
        Arc::clone(&api),
        cache(),
        ColorTemperatureConfig::default(),
    );

    // Temperature defaults to the identity in both directions.
    assert_eq!(light.color_temperature().await.unwrap(), 4000.0);
    assert_eq!(light.brightness().await.unwrap(), 50.0);

    light.set_color_temperature(2700.0).await.unwrap();
    assert_eq!(light.color_temperature().await.unwrap(), 2700.0);

    let commands = api.commands();
    assert_eq!(commands[0].0, ControlCommand::ColorTemperatureSet);
    assert_eq!(commands[0].1, CommandPayload::value(2700.0));
}

// ── Window covering scenarios ───────────────────────────────────────

#[tokio::test]
async fn opening_then_stopping_settles_open() {
    let api = FakeApi::new(json!({}));
    let covering = WindowCovering::new(
        DeviceId::from("cov-1"),
        Arc::clone(&api),
        cache(),
        WindowCoveringConfig::default(),
    );

    covering.set_target_position(100.0).await.unwrap();
    covering.set_target_position(50.0).await.unwrap();

    assert_eq!(covering.motion_state().await.unwrap(), MotionState::Open);
    assert_eq!(covering.current_position().await.unwrap(), 100.0);
    assert_eq!(
        covering.position_state().await.unwrap(),
        MotionDirection::Stopped
    );
    // Both reads were served from the derived cache.
    assert_eq!(api.fetch_count(), 0);

    let commands = api.commands();
    assert_eq!(commands[0].0, ControlCommand::TurnOnOff);
    assert_eq!(commands[0].1, CommandPayload::value(1.0));
    assert_eq!(commands[1].0, ControlCommand::StartStop);
}

#[tokio::test]
async fn closing_then_stopping_settles_closed() {
    let api = FakeApi::new(json!({}));
    let covering = WindowCovering::new(
        DeviceId::from("cov-1"),
        Arc::clone(&api),
        cache(),
        WindowCoveringConfig::default(),
    );

    covering.set_target_position(0.0).await.unwrap();
    covering.set_target_position(50.0).await.unwrap();

    assert_eq!(covering.motion_state().await.unwrap(), MotionState::Closed);
    assert_eq!(covering.current_position().await.unwrap(), 0.0);

    let commands = api.commands();
    assert_eq!(commands[0].1, CommandPayload::value(0.0));
}

#[tokio::test]
async fn remote_read_derives_through_the_same_machine() {
    // Expired cache forces the remote path; the stopped observation
    // still resolves against the surviving previous state.
    let shared = Arc::new(StateCache::new(Duration::from_millis(30)));
    let api = FakeApi::new(json!({ "state": 3 }));
    let covering = WindowCovering::new(
        DeviceId::from("cov-1"),
        Arc::clone(&api),
        shared,
        WindowCoveringConfig::default(),
    );

    covering.set_target_position(100.0).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(covering.motion_state().await.unwrap(), MotionState::Open);
    assert_eq!(api.fetch_count(), 1);
    assert_eq!(covering.current_position().await.unwrap(), 100.0);
}

#[tokio::test]
async fn while_moving_the_direction_is_reported() {
    let api = FakeApi::new(json!({}));
    let covering = WindowCovering::new(
        DeviceId::from("cov-1"),
        Arc::clone(&api),
        cache(),
        WindowCoveringConfig::default(),
    );

    covering.set_target_position(100.0).await.unwrap();
    assert_eq!(
        covering.position_state().await.unwrap(),
        MotionDirection::Increasing
    );

    covering.set_target_position(0.0).await.unwrap();
    assert_eq!(
        covering.position_state().await.unwrap(),
        MotionDirection::Decreasing
    );
}

#[tokio::test]
async fn pushed_observations_drive_the_state_machine() {
    let api = FakeApi::new(json!({}));
    let covering = WindowCovering::new(
        DeviceId::from("cov-1"),
        Arc::clone(&api),
        cache(),
        WindowCoveringConfig::default(),
    );
    let mut updates = covering.subscribe();

    covering.update(&serde_json::from_value(json!({ "state": 2 })).unwrap());
    covering.update(&serde_json::from_value(json!({ "state": 3 })).unwrap());

    let first = updates.try_recv().unwrap();
    assert_eq!(first.value, StateValue::Number(MotionState::Closing.code()));
    let second = updates.try_recv().unwrap();
    assert_eq!(second.value, StateValue::Number(MotionState::Closed.code()));

    assert_eq!(covering.motion_state().await.unwrap(), MotionState::Closed);
}

#[tokio::test]
async fn targets_snap_to_the_three_wire_positions() {
    let api = FakeApi::new(json!({}));
    let covering = WindowCovering::new(
        DeviceId::from("cov-1"),
        Arc::clone(&api),
        cache(),
        WindowCoveringConfig::default(),
    );

    covering.set_target_position(90.0).await.unwrap();
    assert_eq!(covering.motion_state().await.unwrap(), MotionState::Opening);

    covering.set_target_position(10.0).await.unwrap();
    assert_eq!(covering.motion_state().await.unwrap(), MotionState::Closing);

    covering.set_target_position(40.0).await.unwrap();
    assert_eq!(covering.motion_state().await.unwrap(), MotionState::Closed);
}
