// tuyaweb-api: Async Rust client for the Tuya Web device-control API

pub mod client;
pub mod error;
pub mod models;

pub use client::TuyaClient;
pub use error::Error;
pub use models::{
    ColorCommand, ColorState, CommandPayload, DeviceDescriptor, DeviceSnapshot, ReportedState,
};
