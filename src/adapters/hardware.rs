//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`], the discrete output drivers and the character
//! display, exposing them through [`SensorPort`], [`ActuatorPort`] and
//! [`DisplayPort`].  This is the only module in the system that touches
//! actual hardware.  On non-espidf targets, the underlying drivers use
//! cfg-gated simulation stubs.

use embedded_hal::i2c::I2c;

use crate::acquisition::RawSample;
use crate::actuation::IndicatorColour;
use crate::app::ports::{ActuatorPort, DisplayPort, SensorPort};
use crate::drivers::buzzer::Buzzer;
use crate::drivers::fan_relay::FanRelay;
use crate::drivers::indicator::Indicator;
use crate::drivers::lcd::CharacterLcd;
use crate::sensors::SensorHub;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<B: I2c> {
    sensor_hub: SensorHub,
    indicator: Indicator,
    buzzer: Buzzer,
    fan: FanRelay,
    lcd: CharacterLcd<B>,
}

impl<B: I2c> HardwareAdapter<B> {
    pub fn new(sensor_hub: SensorHub, lcd: CharacterLcd<B>) -> Self {
        Self {
            sensor_hub,
            indicator: Indicator::new(),
            buzzer: Buzzer::new(),
            fan: FanRelay::new(),
            lcd,
        }
    }

    pub fn indicator(&self) -> Option<IndicatorColour> {
        self.indicator.current()
    }

    pub fn buzzer_on(&self) -> bool {
        self.buzzer.is_on()
    }

    pub fn fan_energized(&self) -> bool {
        self.fan.is_energized()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<B: I2c> SensorPort for HardwareAdapter<B> {
    fn read_raw(&mut self) -> RawSample {
        self.sensor_hub.read_all()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<B: I2c> ActuatorPort for HardwareAdapter<B> {
    fn set_indicator(&mut self, colour: Option<IndicatorColour>) {
        self.indicator.set(colour);
    }

    fn set_buzzer(&mut self, on: bool) {
        self.buzzer.set(on);
    }

    fn set_fan_relay(&mut self, energized: bool) {
        self.fan.set(energized);
    }

    fn all_off(&mut self) {
        self.buzzer.set(false);
        self.indicator.off();
        self.fan.release();
    }
}

// ── DisplayPort implementation ────────────────────────────────

impl<B: I2c> DisplayPort for HardwareAdapter<B> {
    fn render(&mut self, lines: &[&str]) {
        self.lcd.render(lines);
    }
}
