//! MQ-2 combustible gas sensor, analog output on ADC1.
//!
//! The raw 12-bit count is the reading; there is no ppm conversion.  A
//! saturated ADC is a legitimate (very high) value.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: oneshot ADC read (unit initialised by hw_init).
//! On host/test: reads from a static AtomicI32 for injection.

use core::sync::atomic::AtomicI32;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

static SIM_GAS_RAW: AtomicI32 = AtomicI32::new(200);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gas_raw(raw: i32) {
    SIM_GAS_RAW.store(raw, Ordering::Relaxed);
}

pub struct GasSensor {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    channel: u32,
}

impl GasSensor {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }

    #[cfg(target_os = "espidf")]
    pub fn read_raw(&self) -> i32 {
        i32::from(hw_init::adc1_read(self.channel))
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read_raw(&self) -> i32 {
        SIM_GAS_RAW.load(Ordering::Relaxed)
    }
}
