// ── Per-device state cache ──
//
// Short-lived read cache between the accessory framework and the
// cloud. Freshness is tracked per device, not per property: a fetch, a
// push update, or a confirmed write refreshes the whole device's
// marker, and invalidation always drops the whole device. Expiry is
// passive -- checked on read, never on a timer.
//
// Lock-free concurrent storage on `DashMap`; concurrent property
// handlers on the same device may interleave freely. No cross-property
// atomicity is promised, only eventual consistency.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::model::{DeviceId, Property, StateValue};

/// Device-keyed value cache with an injected freshness window.
pub struct StateCache {
    ttl: Duration,
    devices: DashMap<DeviceId, DeviceEntry>,
}

struct DeviceEntry {
    values: HashMap<Property, StateValue>,
    /// Single freshness marker for the whole device. Partial per-key
    /// expiry is unsupported.
    recorded_at: Instant,
}

impl DeviceEntry {
    fn new(values: HashMap<Property, StateValue>) -> Self {
        Self {
            values,
            recorded_at: Instant::now(),
        }
    }
}

impl StateCache {
    /// Create a cache with the given freshness window.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            devices: DashMap::new(),
        }
    }

    /// The injected freshness window.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether the device has a snapshot younger than the TTL.
    pub fn is_valid(&self, device: &DeviceId) -> bool {
        self.devices
            .get(device)
            .is_some_and(|entry| entry.recorded_at.elapsed() < self.ttl)
    }

    /// Last recorded value for one property. A miss is not an error;
    /// callers check `is_valid` first -- this never fetches.
    pub fn read(&self, device: &DeviceId, property: Property) -> Option<StateValue> {
        self.devices
            .get(device)
            .and_then(|entry| entry.values.get(&property).copied())
    }

    /// Upsert one value and refresh the device-wide freshness marker.
    /// Creates the device entry lazily on first write.
    pub fn write(&self, device: &DeviceId, property: Property, value: StateValue) {
        let mut entry = self
            .devices
            .entry(device.clone())
            .or_insert_with(|| DeviceEntry::new(HashMap::new()));
        entry.values.insert(property, value);
        entry.recorded_at = Instant::now();
    }

    /// Replace the device's entry set wholesale with a fresh marker.
    /// Every fetch and push update lands here.
    pub fn populate(
        &self,
        device: &DeviceId,
        values: impl IntoIterator<Item = (Property, StateValue)>,
    ) {
        self.devices.insert(
            device.clone(),
            DeviceEntry::new(values.into_iter().collect()),
        );
    }

    /// Drop every entry for the device. `is_valid` stays false until
    /// the next `write`/`populate`.
    pub fn invalidate(&self, device: &DeviceId) {
        self.devices.remove(device);
    }
}
