//! Outbound application events.
//!
//! The [`MonitorService`](super::service::MonitorService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them.

use crate::acquisition::ReadFailure;
use crate::alert::AlertSource;
use crate::connectivity::LinkPhase;
use crate::error::CommsError;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started.
    Started,

    /// The connectivity state machine changed phase.
    LinkChanged { from: LinkPhase, to: LinkPhase },

    /// A sample was rejected and the cycle skipped.
    SampleRejected(ReadFailure),

    /// The effective verdict entered Danger.
    AlertRaised { source: AlertSource, hazards: u8 },

    /// The effective verdict returned to Safe.
    AlertCleared,

    /// A telemetry write failed and was discarded.
    TelemetryFailed(CommsError),

    /// A notification could not be dispatched.
    NotificationFailed(CommsError),

    /// The alarm pattern was cut short by a stop request.
    AlarmPreempted { elapsed_ms: u32 },

    /// The control loop exited and outputs are in safe idle.
    Stopped { cycles: u64 },
}
