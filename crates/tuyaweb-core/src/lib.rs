//! Device state caching and value transformation between a
//! home-automation hub's accessory abstraction and the Tuya Web
//! device-control API.
//!
//! This crate owns the reusable core every accessory adapter is built
//! on:
//!
//! - **[`Pipeline`]** — ordered numeric transformation steps converting
//!   between the device value space (commonly 0-255) and the standard
//!   value space at the accessory boundary (0-100 style ranges),
//!   configured independently per property and per direction.
//!
//! - **[`StateCache`]** — short-lived per-device read cache with a
//!   single device-wide freshness marker and an injected TTL. Avoids
//!   redundant cloud round-trips while reflecting local writes
//!   immediately.
//!
//! - **[`DeviceBridge`]** — orchestrates reads (cache-first, fetch and
//!   repopulate on miss), optimistic writes, push updates, and the
//!   invalidate-on-failure contract against a [`DeviceApi`]
//!   implementation.
//!
//! - **Accessory adapters** ([`accessory`]) — [`Dimmer`], [`Light`],
//!   [`ColorTemperatureLight`] and [`WindowCovering`], each exposing an
//!   async getter/setter pair per property for the hub to bind its
//!   GET/SET handlers to.

pub mod accessory;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod transform;

pub use accessory::{ColorTemperatureLight, Dimmer, Light, WindowCovering};
pub use bridge::{ControlCommand, DeviceApi, DeviceBridge, PropertyUpdate};
pub use cache::StateCache;
pub use config::{
    ColorTemperatureConfig, DimmerConfig, LightConfig, WindowCoveringConfig, from_json,
};
pub use error::CoreError;
pub use model::{DeviceId, MotionDirection, MotionState, Property, StateValue};
pub use transform::{Pipeline, Transformation};
