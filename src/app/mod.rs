//! Application core — the monitoring cycle and its ports.
//!
//! The business rules live in the sibling domain modules (acquisition,
//! alert, connectivity, telemetry, classification, actuation).  This module
//! wires them into one control cycle.  All interaction with hardware and the
//! network happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
