//! Two-colour indicator (discrete red and green LEDs).
//!
//! At most one colour is lit at a time.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives two GPIO outputs via hw_init.
//! On host/test: tracks state in-memory only.

use crate::actuation::IndicatorColour;
use crate::drivers::hw_init;
use crate::pins;

pub struct Indicator {
    current: Option<IndicatorColour>,
}

impl Indicator {
    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn set(&mut self, colour: Option<IndicatorColour>) {
        hw_init::gpio_write(pins::LED_RED_GPIO, colour == Some(IndicatorColour::Red));
        hw_init::gpio_write(pins::LED_GREEN_GPIO, colour == Some(IndicatorColour::Green));
        self.current = colour;
    }

    pub fn off(&mut self) {
        self.set(None);
    }

    pub fn current(&self) -> Option<IndicatorColour> {
        self.current
    }
}

impl Default for Indicator {
    fn default() -> Self {
        Self::new()
    }
}
