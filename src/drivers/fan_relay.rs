//! Exhaust fan relay.
//!
//! The coil polarity that means "fan idle" is a wiring choice and lives in
//! config; this driver only energizes or releases the coil.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the relay transistor GPIO via hw_init.
//! On host/test: tracks state in-memory only.

use log::debug;

use crate::drivers::hw_init;
use crate::pins;

pub struct FanRelay {
    energized: bool,
}

impl FanRelay {
    pub fn new() -> Self {
        Self { energized: false }
    }

    pub fn set(&mut self, energized: bool) {
        hw_init::gpio_write(pins::FAN_RELAY_GPIO, energized);
        if energized != self.energized {
            debug!("FanRelay: coil {}", if energized { "energized" } else { "released" });
        }
        self.energized = energized;
    }

    pub fn release(&mut self) {
        self.set(false);
    }

    pub fn is_energized(&self) -> bool {
        self.energized
    }
}

impl Default for FanRelay {
    fn default() -> Self {
        Self::new()
    }
}
