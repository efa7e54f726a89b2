//! Telemetry sync — at-most-once, best-effort publishing of readings.
//!
//! Each reading is written as four fields (`temperature`, `humidity`,
//! `flame`, `gas`) under the configured path root.  When the link is not
//! `CloudReady` the publish is skipped; a rejected write is logged and
//! dropped.  Nothing is buffered and nothing is retried.

use heapless::String;
use log::{debug, warn};
use serde::Serialize;

use crate::acquisition::SensorReading;
use crate::app::ports::{CloudPort, NetworkPort};
use crate::config::PATH_ROOT_LEN;
use crate::connectivity::ConnectivityManager;
use crate::error::CommsError;

/// Longest full field path (`root` + `/` + field name).
pub const FIELD_PATH_LEN: usize = PATH_ROOT_LEN + 16;

pub const FIELD_TEMPERATURE: &str = "temperature";
pub const FIELD_HUMIDITY: &str = "humidity";
pub const FIELD_FLAME: &str = "flame";
pub const FIELD_GAS: &str = "gas";

/// One field value, serialized as a bare JSON scalar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Float(f32),
    Int(i32),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// The channel was not usable; not an error.
    Skipped,
    Failed(CommsError),
}

/// Running publish counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishCounters {
    pub published: u32,
    pub skipped: u32,
    pub failed: u32,
}

pub struct TelemetrySync {
    root: String<PATH_ROOT_LEN>,
    counters: PublishCounters,
}

impl TelemetrySync {
    pub fn new(root: &str) -> Self {
        Self {
            root: crate::config::truncated(root.trim_end_matches('/')),
            counters: PublishCounters::default(),
        }
    }

    /// `<root>/<field>`.
    pub fn field_path(&self, field: &str) -> String<FIELD_PATH_LEN> {
        let mut path: String<FIELD_PATH_LEN> = crate::config::truncated(&self.root);
        let _ = path.push('/');
        let _ = path.push_str(field);
        path
    }

    /// Write every field of `reading`.  Stops at the first rejected write.
    pub fn publish<N: NetworkPort, C: CloudPort>(
        &mut self,
        link: &mut ConnectivityManager<N, C>,
        reading: &SensorReading,
    ) -> PublishOutcome {
        let fields = [
            (FIELD_TEMPERATURE, TelemetryValue::Float(reading.temperature_c())),
            (FIELD_HUMIDITY, TelemetryValue::Float(reading.humidity_pct())),
            (FIELD_FLAME, TelemetryValue::Bool(reading.flame_detected())),
            (FIELD_GAS, TelemetryValue::Int(reading.gas_level())),
        ];
        let paths = fields.map(|(name, value)| (self.field_path(name), value));

        let Some(session) = link.session() else {
            self.counters.skipped = self.counters.skipped.wrapping_add(1);
            debug!("Telemetry: skipped, cloud not ready");
            return PublishOutcome::Skipped;
        };

        for (path, value) in &paths {
            if let Err(e) = session.write(path, value) {
                self.counters.failed = self.counters.failed.wrapping_add(1);
                warn!("Telemetry: write to {} failed ({}), reading dropped", path, e);
                return PublishOutcome::Failed(e);
            }
        }

        self.counters.published = self.counters.published.wrapping_add(1);
        debug!("Telemetry: published reading @{}ms", reading.timestamp_ms());
        PublishOutcome::Published
    }

    pub fn counters(&self) -> PublishCounters {
        self.counters
    }
}
