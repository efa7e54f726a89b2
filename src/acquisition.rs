//! Sensor acquisition — raw transducer values to a validated [`SensorReading`].
//!
//! A reading is only constructible when temperature and humidity are finite,
//! so a failed climate read can never reach the alert engine or telemetry.
//! Gas is clamped to the ADC range; saturation is a meaningful (very high)
//! value, not an error.  The flame input is active-low.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};
use serde::Serialize;

use crate::app::ports::SensorPort;
use crate::pins::GAS_ADC_MAX;

/// One unvalidated read of every transducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// NaN when the climate sensor read failed.
    pub temperature_c: f32,
    /// NaN when the climate sensor read failed.
    pub humidity_pct: f32,
    pub gas_raw: i32,
    /// Logic level of the flame sensor output (LOW = flame).
    pub flame_pin_high: bool,
}

/// Why a sample was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFailure {
    Temperature,
    Humidity,
}

impl core::fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature not a number"),
            Self::Humidity => write!(f, "humidity not a number"),
        }
    }
}

/// A fully defined reading.  Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    temperature_c: f32,
    humidity_pct: f32,
    gas_level: i32,
    flame_detected: bool,
    timestamp_ms: u64,
}

impl SensorReading {
    /// Build a reading, rejecting non-finite climate values.
    pub fn new(
        temperature_c: f32,
        humidity_pct: f32,
        gas_level: i32,
        flame_detected: bool,
        timestamp_ms: u64,
    ) -> Result<Self, ReadFailure> {
        if !temperature_c.is_finite() {
            return Err(ReadFailure::Temperature);
        }
        if !humidity_pct.is_finite() {
            return Err(ReadFailure::Humidity);
        }
        Ok(Self {
            temperature_c,
            humidity_pct,
            gas_level: gas_level.clamp(0, GAS_ADC_MAX),
            flame_detected,
            timestamp_ms,
        })
    }

    pub fn temperature_c(&self) -> f32 {
        self.temperature_c
    }

    pub fn humidity_pct(&self) -> f32 {
        self.humidity_pct
    }

    pub fn gas_level(&self) -> i32 {
        self.gas_level
    }

    pub fn flame_detected(&self) -> bool {
        self.flame_detected
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

/// Turn a raw sample into a reading.  Pure.
pub fn normalize(raw: RawSample, timestamp_ms: u64) -> Result<SensorReading, ReadFailure> {
    SensorReading::new(
        raw.temperature_c,
        raw.humidity_pct,
        raw.gas_raw,
        !raw.flame_pin_high,
        timestamp_ms,
    )
}

/// Per-cycle sampler with failure bookkeeping.
pub struct Acquisition {
    settle_delay_ms: u32,
    consecutive_failures: u32,
}

impl Acquisition {
    pub fn new(settle_delay_ms: u32) -> Self {
        Self {
            settle_delay_ms,
            consecutive_failures: 0,
        }
    }

    /// Read every sensor once and validate the result.
    pub fn sample(
        &mut self,
        sensors: &mut impl SensorPort,
        now_ms: u64,
    ) -> Result<SensorReading, ReadFailure> {
        let raw = sensors.read_raw();
        match normalize(raw, now_ms) {
            Ok(reading) => {
                if self.consecutive_failures > 0 {
                    debug!(
                        "Sensors: recovered after {} failed read(s)",
                        self.consecutive_failures
                    );
                }
                self.consecutive_failures = 0;
                Ok(reading)
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                warn!(
                    "Sensors: sample rejected ({}), {} in a row",
                    e, self.consecutive_failures
                );
                Err(e)
            }
        }
    }

    /// Bounded wait after a rejected sample so a glitching sensor is not hammered.
    pub fn settle(&self, delay: &mut impl DelayNs) {
        delay.delay_ms(self.settle_delay_ms);
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
