//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            AppEvent::Started => info!("START | monitor running"),
            AppEvent::LinkChanged { from, to } => info!("LINK  | {} -> {}", from, to),
            AppEvent::SampleRejected(failure) => warn!("READ  | sample rejected: {}", failure),
            AppEvent::AlertRaised { source, hazards } => {
                error!(
                    "ALERT | DANGER source={:?} flame={} gas={}",
                    source,
                    hazards & crate::alert::Hazard::Flame.mask() != 0,
                    hazards & crate::alert::Hazard::Gas.mask() != 0,
                );
            }
            AppEvent::AlertCleared => info!("ALERT | cleared"),
            AppEvent::TelemetryFailed(e) => warn!("TELEM | publish failed: {}", e),
            AppEvent::NotificationFailed(e) => warn!("NOTIFY| dispatch failed: {}", e),
            AppEvent::AlarmPreempted { elapsed_ms } => {
                info!("ALARM | preempted after {}ms", elapsed_ms);
            }
            AppEvent::Stopped { cycles } => info!("STOP  | after {} cycles", cycles),
        }
    }
}
