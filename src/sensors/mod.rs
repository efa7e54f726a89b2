//! Sensor subsystem — individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and produces one [`RawSample`] per
//! control cycle.  Validation happens in acquisition, not here.

pub mod climate;
pub mod flame;
pub mod gas;

use log::debug;

use crate::acquisition::RawSample;
use climate::ClimateSensor;
use flame::FlameSensor;
use gas::GasSensor;

/// Aggregates all sensor drivers.
pub struct SensorHub {
    pub climate: ClimateSensor,
    pub gas: GasSensor,
    pub flame: FlameSensor,
}

impl SensorHub {
    /// Construct a new hub.  Pass in pre-built drivers (built in main
    /// where peripheral ownership is established).
    pub fn new(climate: ClimateSensor, gas: GasSensor, flame: FlameSensor) -> Self {
        Self { climate, gas, flame }
    }

    /// One synchronous read of every transducer.
    pub fn read_all(&mut self) -> RawSample {
        let climate = self.climate.read();
        let sample = RawSample {
            temperature_c: climate.temperature_c,
            humidity_pct: climate.humidity_pct,
            gas_raw: self.gas.read_raw(),
            flame_pin_high: self.flame.pin_high(),
        };
        debug!(
            "Sensors: T={:.1} H={:.1} gas={} flame_pin={}",
            sample.temperature_c,
            sample.humidity_pct,
            sample.gas_raw,
            if sample.flame_pin_high { "HIGH" } else { "LOW" }
        );
        sample
    }
}
