// Window covering adapter.
//
// The cloud only reports opening / closing / stopped, but the
// accessory boundary wants open and closed as well. The adapter
// derives them from history: when a stopped observation arrives, the
// previous cached state decides whether the covering settled open or
// closed. The previous state is always read before it is overwritten.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use tuyaweb_api::{CommandPayload, DeviceSnapshot, ReportedState};

use crate::bridge::{ControlCommand, DeviceApi, DeviceBridge, PropertyUpdate};
use crate::cache::StateCache;
use crate::config::WindowCoveringConfig;
use crate::error::CoreError;
use crate::model::{DeviceId, MotionDirection, MotionState, Property, StateValue};

/// A motorized window covering (blind, shutter, curtain).
pub struct WindowCovering<A> {
    bridge: DeviceBridge<A>,
    config: WindowCoveringConfig,
}

impl<A: DeviceApi> WindowCovering<A> {
    pub fn new(
        device_id: DeviceId,
        api: Arc<A>,
        cache: Arc<StateCache>,
        config: WindowCoveringConfig,
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

    // ── Derived state machine ────────────────────────────────────

    fn cached_motion(&self) -> Option<MotionState> {
        self.bridge
            .cached(Property::MotionState)
            .and_then(StateValue::as_number)
            .and_then(MotionState::from_code)
    }

    /// Run one observation through the state machine and record the
    /// result. The previous state is read before the write lands.
    fn record_observation(&self, observed: MotionState) -> MotionState {
        let previous = self.cached_motion().unwrap_or(MotionState::Stopped);
        let next = MotionState::after(observed, previous);
        debug!(device = %self.bridge.device_id(), %observed, %previous, %next, "motion transition");
        self.bridge
            .write_cached(Property::MotionState, StateValue::Number(next.code()));
        next
    }

    fn observed(&self, snapshot: &DeviceSnapshot) -> MotionState {
        let code = snapshot.state.as_ref().and_then(ReportedState::as_code);
        match code.and_then(MotionState::from_code) {
            Some(state) => state,
            None => {
                warn!(device = %self.bridge.device_id(), ?code, "unrecognized motion state, treating as stopped");
                MotionState::Stopped
            }
        }
    }

    /// Current derived motion state, cache-first. A remote read runs
    /// the observation through the same state machine as the cached
    /// path, so virtual open/closed resolve identically on both.
    pub async fn motion_state(&self) -> Result<MotionState, CoreError> {
        if self.config.use_cache && self.bridge.cache_valid() {
            if let Some(state) = self.cached_motion() {
                return Ok(state);
            }
        }

        let snapshot = self.bridge.fetch_raw().await?;
        let observed = self.observed(&snapshot);
        Ok(self.record_observation(observed))
    }

    // ── Accessory-boundary views ─────────────────────────────────

    /// Position percentage: open 100, closed 0, stopped 50.
    pub async fn current_position(&self) -> Result<f64, CoreError> {
        Ok(self.motion_state().await?.position())
    }

    /// Targets mirror the current travel: there is no positional
    /// feedback beyond the three derived states.
    pub async fn target_position(&self) -> Result<f64, CoreError> {
        Ok(self.motion_state().await?.position())
    }

    /// Direction of travel.
    pub async fn position_state(&self) -> Result<MotionDirection, CoreError> {
        Ok(self.motion_state().await?.direction())
    }

    /// Drive toward a target percentage. Only three positions exist on
    /// the wire, so targets snap: <= 25 closes, >= 75 opens, anything
    /// between stops. The derived transition is recorded up front; a
    /// failed command invalidates the device, wiping the provisional
    /// state.
    pub async fn set_target_position(&self, percentage: f64) -> Result<(), CoreError> {
        let (observed, command, value) = if percentage >= 75.0 {
            (MotionState::Opening, ControlCommand::TurnOnOff, 1.0)
        } else if percentage <= 25.0 {
            (MotionState::Closing, ControlCommand::TurnOnOff, 0.0)
        } else {
            (MotionState::Stopped, ControlCommand::StartStop, 0.0)
        };

        self.record_observation(observed);
        self.bridge
            .send_command(command, CommandPayload::value(value))
            .await
    }

    /// Apply an out-of-band snapshot pushed by the platform. The
    /// observation runs through the state machine before observers are
    /// notified of the derived result.
    pub fn update(&self, snapshot: &DeviceSnapshot) {
        let observed = self.observed(snapshot);
        let next = self.record_observation(observed);
        self.bridge
            .notify(Property::MotionState, StateValue::Number(next.code()));
    }
}
