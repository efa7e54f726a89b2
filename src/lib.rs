//! HazardWatch firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod acquisition;
pub mod actuation;
pub mod alert;
pub mod app;
pub mod classification;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod handoff;
pub mod pins;
pub mod telemetry;

// Hardware-facing layers; the real implementations are guarded by cfg
// attributes inside, with simulation stubs on the host.
pub mod adapters;
pub mod drivers;
pub mod sensors;
