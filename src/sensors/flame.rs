//! IR flame sensor module, digital comparator output.
//!
//! The output is active-low: the pin reads LOW while a flame is in view.
//! This driver reports the raw pin level; acquisition applies the polarity.

use core::sync::atomic::AtomicBool;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

static SIM_FLAME_PIN_HIGH: AtomicBool = AtomicBool::new(true);

/// Simulate the comparator output (`false` = flame in view).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_flame_pin(high: bool) {
    SIM_FLAME_PIN_HIGH.store(high, Ordering::Relaxed);
}

pub struct FlameSensor {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    gpio: i32,
}

impl FlameSensor {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    #[cfg(target_os = "espidf")]
    pub fn pin_high(&self) -> bool {
        hw_init::gpio_read(self.gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn pin_high(&self) -> bool {
        SIM_FLAME_PIN_HIGH.load(Ordering::Relaxed)
    }
}
