//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Driven adapters (sensors, outputs, network, cloud, classifier,
//! notifications) implement these traits.  The
//! [`MonitorService`](super::service::MonitorService) and the
//! [`ClassificationBridge`](crate::classification::ClassificationBridge)
//! consume them via generics, so the domain core never touches hardware
//! or sockets directly.
//!
//! All remote calls return [`CommsError`]; none of them is fatal to the
//! control cycle.

use crate::acquisition::{RawSample, SensorReading};
use crate::actuation::IndicatorColour;
use crate::alert::AlertLevel;
use crate::classification::FeatureWindow;
use crate::error::CommsError;
use crate::telemetry::TelemetryValue;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one synchronous read of every transducer.
pub trait SensorPort {
    fn read_raw(&mut self) -> RawSample;
}

// ───────────────────────────────────────────────────────────────
// Output ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Discrete on/off outputs.  Owned exclusively by the actuation controller.
pub trait ActuatorPort {
    /// Light exactly one indicator colour; `None` turns both off.
    fn set_indicator(&mut self, colour: Option<IndicatorColour>);

    fn set_buzzer(&mut self, on: bool);

    /// Drive the fan relay coil (true = energized).
    fn set_fan_relay(&mut self, energized: bool);

    /// De-energize every output.
    fn all_off(&mut self);
}

/// Character display.
pub trait DisplayPort {
    /// Replace the panel contents.  Lines beyond the panel height are dropped.
    fn render(&mut self, lines: &[&str]);
}

// ───────────────────────────────────────────────────────────────
// Network / cloud ports (owned by the connectivity manager)
// ───────────────────────────────────────────────────────────────

/// Station-mode network link.
pub trait NetworkPort {
    /// Start (or restart) association.  Returns immediately.
    fn begin_association(&mut self) -> Result<(), CommsError>;

    /// Non-blocking: is the link associated with an IP right now?
    fn is_associated(&mut self) -> bool;

    fn disconnect(&mut self);
}

/// Cloud telemetry store session.
pub trait CloudPort {
    /// Authenticate and open a session.
    fn handshake(&mut self) -> Result<(), CommsError>;

    /// Drop every piece of session state (tokens, connections).
    fn invalidate_session(&mut self);

    /// The session is still usable.  Goes `false` once the backend
    /// refuses the token, so the owner can sign in again.
    fn has_session(&self) -> bool;

    /// Write one field under `path`.
    fn write(&mut self, path: &str, value: &TelemetryValue) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Classification ports
// ───────────────────────────────────────────────────────────────

/// Read-side of the telemetry store, used by the classification bridge.
pub trait RecentReadingsPort {
    /// The most recent `window` readings, oldest first.
    fn read_recent(&mut self, window: usize) -> Result<FeatureWindow, CommsError>;
}

/// Remote SAFE / DANGER classifier.
pub trait ClassifierPort {
    fn classify(&mut self, features: &[SensorReading]) -> Result<AlertLevel, CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Notification port
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget human notifications.
pub trait NotifierPort {
    fn send_sms(&mut self, text: &str) -> Result<(), CommsError>;

    fn speak(&mut self, text: &str) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Time and events
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.
pub trait Clock {
    fn uptime_ms(&self) -> u64;
}

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
