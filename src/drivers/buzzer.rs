//! Active piezo buzzer behind an NPN low-side switch.
//!
//! A dumb on/off actuator; the alarm pattern timing lives in the
//! actuation controller.

use crate::drivers::hw_init;
use crate::pins;

pub struct Buzzer {
    on: bool,
    toggles: u32,
}

impl Buzzer {
    pub fn new() -> Self {
        Self { on: false, toggles: 0 }
    }

    pub fn set(&mut self, on: bool) {
        hw_init::gpio_write(pins::BUZZER_GPIO, on);
        if on != self.on {
            self.toggles = self.toggles.wrapping_add(1);
        }
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Level changes since boot.
    pub fn toggles(&self) -> u32 {
        self.toggles
    }
}

impl Default for Buzzer {
    fn default() -> Self {
        Self::new()
    }
}
