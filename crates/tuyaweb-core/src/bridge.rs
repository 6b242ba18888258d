// ── Device state orchestration ──
//
// Composes the state cache, the transformation pipelines and the
// remote API behind the three operations every accessory adapter
// needs: cached-or-fetched reads, optimistic writes, and out-of-band
// push updates. Failure handling is uniform: any remote failure
// invalidates the whole device and propagates unchanged, so the next
// operation re-fetches ground truth. No retry, no backoff, and no
// deduplication of concurrent fetches -- two handlers racing through
// an invalid window may each hit the cloud, which is accepted.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use tuyaweb_api::{CommandPayload, DeviceSnapshot, TuyaClient};

use crate::cache::StateCache;
use crate::error::CoreError;
use crate::model::{DeviceId, Property, StateValue};

const UPDATE_CHANNEL_SIZE: usize = 64;

// ── Remote capability seam ───────────────────────────────────────────

/// The two remote capabilities this layer consumes: a snapshot fetch
/// and a control command. The production implementation is
/// [`TuyaClient`]; tests substitute in-process fakes.
pub trait DeviceApi: Send + Sync {
    fn fetch(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<DeviceSnapshot, tuyaweb_api::Error>> + Send;

    fn command(
        &self,
        device_id: &DeviceId,
        command: ControlCommand,
        payload: CommandPayload,
    ) -> impl Future<Output = Result<(), tuyaweb_api::Error>> + Send;
}

impl DeviceApi for TuyaClient {
    async fn fetch(&self, device_id: &DeviceId) -> Result<DeviceSnapshot, tuyaweb_api::Error> {
        self.get_device_state(device_id.as_str()).await
    }

    async fn command(
        &self,
        device_id: &DeviceId,
        command: ControlCommand,
        payload: CommandPayload,
    ) -> Result<(), tuyaweb_api::Error> {
        self.set_device_state(device_id.as_str(), command.as_str(), &payload)
            .await
    }
}

/// Control actions understood by the cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
pub enum ControlCommand {
    #[strum(serialize = "turnOnOff")]
    TurnOnOff,
    #[strum(serialize = "brightnessSet")]
    BrightnessSet,
    #[strum(serialize = "colorSet")]
    ColorSet,
    #[strum(serialize = "colorTemperatureSet")]
    ColorTemperatureSet,
    #[strum(serialize = "startStop")]
    StartStop,
}

impl ControlCommand {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

// ── Observer notification ────────────────────────────────────────────

/// One standard-space property change, broadcast to subscribed
/// observers after a push update lands in the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyUpdate {
    pub device_id: DeviceId,
    pub property: Property,
    pub value: StateValue,
}

// ── DeviceBridge ─────────────────────────────────────────────────────

/// Orchestrates one device's reads, writes and push updates against an
/// explicitly injected cache instance. Adapters supply the
/// snapshot-normalization step (their per-property read-side
/// pipelines) at each call, keeping this type free of per-class
/// knowledge.
pub struct DeviceBridge<A> {
    device_id: DeviceId,
    api: Arc<A>,
    cache: Arc<StateCache>,
    updates: broadcast::Sender<PropertyUpdate>,
}

impl<A: DeviceApi> DeviceBridge<A> {
    pub fn new(device_id: DeviceId, api: Arc<A>, cache: Arc<StateCache>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);
        Self {
            device_id,
            api,
            cache,
            updates,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Subscribe to standard-space property updates pushed from the
    /// remote side.
    pub fn subscribe(&self) -> broadcast::Receiver<PropertyUpdate> {
        self.updates.subscribe()
    }

    // ── Cache access ─────────────────────────────────────────────

    pub fn cache_valid(&self) -> bool {
        self.cache.is_valid(&self.device_id)
    }

    pub fn cached(&self, property: Property) -> Option<StateValue> {
        self.cache.read(&self.device_id, property)
    }

    pub fn write_cached(&self, property: Property, value: StateValue) {
        self.cache.write(&self.device_id, property, value);
    }

    pub fn invalidate(&self) {
        self.cache.invalidate(&self.device_id);
    }

    // ── Read path ────────────────────────────────────────────────

    /// Serve one property from the cache when allowed and fresh,
    /// otherwise fetch, normalize every reported field through
    /// `normalize`, repopulate the device wholesale, and return the
    /// requested property. `None` means the device did not report the
    /// field; adapters substitute their documented defaults.
    pub async fn get_state<F>(
        &self,
        property: Property,
        use_cache: bool,
        normalize: F,
    ) -> Result<Option<StateValue>, CoreError>
    where
        F: FnOnce(&DeviceSnapshot) -> Vec<(Property, StateValue)>,
    {
        if use_cache && self.cache_valid() {
            if let Some(value) = self.cached(property) {
                debug!(device = %self.device_id, %property, %value, "serving cached value");
                return Ok(Some(value));
            }
        }

        self.refresh(normalize).await?;
        Ok(self.cached(property))
    }

    /// Fetch a fresh snapshot and repopulate the whole device entry.
    pub async fn refresh<F>(&self, normalize: F) -> Result<(), CoreError>
    where
        F: FnOnce(&DeviceSnapshot) -> Vec<(Property, StateValue)>,
    {
        let snapshot = self.fetch_raw().await?;
        let values = normalize(&snapshot);
        debug!(device = %self.device_id, count = values.len(), "refreshed device state");
        self.cache.populate(&self.device_id, values);
        Ok(())
    }

    /// Fetch without touching cache contents on success. On failure the
    /// device is invalidated and the error propagates unchanged.
    pub async fn fetch_raw(&self) -> Result<DeviceSnapshot, CoreError> {
        match self.api.fetch(&self.device_id).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                warn!(device = %self.device_id, error = %e, "fetch failed, invalidating cache");
                self.cache.invalidate(&self.device_id);
                Err(e.into())
            }
        }
    }

    // ── Write path ───────────────────────────────────────────────

    /// Send a control command and, on success, optimistically record
    /// the standard-space value the accessory boundary just accepted --
    /// without re-fetching to confirm the device's own representation.
    /// On failure the whole device is invalidated, not just this key.
    pub async fn set_state(
        &self,
        property: Property,
        command: ControlCommand,
        payload: CommandPayload,
        standard_value: StateValue,
    ) -> Result<(), CoreError> {
        self.send_command(command, payload).await?;
        debug!(device = %self.device_id, %property, value = %standard_value, "optimistic cache write");
        self.cache.write(&self.device_id, property, standard_value);
        Ok(())
    }

    /// Send a control command without a cache write on success. Callers
    /// that record derived state up front (window coverings) or write
    /// several keys at once (color updates) handle the cache
    /// themselves; failure still invalidates the whole device.
    pub async fn send_command(
        &self,
        command: ControlCommand,
        payload: CommandPayload,
    ) -> Result<(), CoreError> {
        match self.api.command(&self.device_id, command, payload).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(device = %self.device_id, %command, error = %e, "command failed, invalidating cache");
                self.cache.invalidate(&self.device_id);
                Err(e.into())
            }
        }
    }

    // ── Push path ────────────────────────────────────────────────

    /// Apply an out-of-band snapshot pushed from the remote side. Runs
    /// the same normalization as the fetch path -- pushed raw values
    /// are never trusted to be in standard space -- then replaces the
    /// device entry and notifies observers of every reported property.
    pub fn apply_update<F>(&self, snapshot: &DeviceSnapshot, normalize: F)
    where
        F: FnOnce(&DeviceSnapshot) -> Vec<(Property, StateValue)>,
    {
        let values = normalize(snapshot);
        debug!(device = %self.device_id, count = values.len(), "applying pushed update");
        self.cache.populate(&self.device_id, values.iter().copied());
        for (property, value) in values {
            self.notify(property, value);
        }
    }

    /// Push one standard-space value to subscribed observers.
    pub fn notify(&self, property: Property, value: StateValue) {
        // Send errors only mean nobody is subscribed right now.
        let _ = self.updates.send(PropertyUpdate {
            device_id: self.device_id.clone(),
            property,
            value,
        });
    }
}
