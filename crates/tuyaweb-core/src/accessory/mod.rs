// ── Accessory adapters ──
//
// One adapter per supported device class. Each exposes an async
// getter/setter pair per property -- the capability pair the hub's
// accessory framework binds its GET/SET handlers to -- plus an
// `update` entry point for out-of-band snapshots pushed by the
// platform. All of them consume the same bridge primitives; the only
// per-class knowledge here is which snapshot fields map to which
// properties through which pipelines.

mod color_temperature;
mod dimmer;
mod light;
mod window_covering;

pub use color_temperature::ColorTemperatureLight;
pub use dimmer::Dimmer;
pub use light::Light;
pub use window_covering::WindowCovering;

// Accessory-boundary defaults substituted when a device has never
// reported a field.
pub(crate) const DEFAULT_BRIGHTNESS: f64 = 100.0;
pub(crate) const DEFAULT_SATURATION: f64 = 100.0;
pub(crate) const DEFAULT_HUE: f64 = 359.0;
pub(crate) const DEFAULT_COLOR_TEMPERATURE: f64 = 100.0;
