//! GPIO / peripheral pin assignments for the HazardWatch sensor node.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1)
// ---------------------------------------------------------------------------

/// MQ-2 combustible gas sensor, analog output via resistive divider.
/// ADC1 channel 4 (GPIO 5 on ESP32-S3).
pub const GAS_ADC_GPIO: i32 = 5;
/// ADC1 channel number for the gas sensor.
pub const GAS_ADC_CHANNEL: u32 = 4;
/// Full-scale raw value of the 12-bit ADC.
pub const GAS_ADC_MAX: i32 = 4095;

// ---------------------------------------------------------------------------
// Sensors — Digital
// ---------------------------------------------------------------------------

/// IR flame sensor digital output. LOW = flame present.
pub const FLAME_GPIO: i32 = 6;

/// DHT22 single-wire temperature/humidity sensor (open-drain, pulled up).
pub const DHT_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// I²C bus (PCF8574 backpack for the 16×2 character display)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// 7-bit address of the PCF8574 expander (A0..A2 pulled high).
pub const LCD_I2C_ADDR: u8 = 0x27;
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Red indicator LED (danger). Active HIGH.
pub const LED_RED_GPIO: i32 = 11;
/// Green indicator LED (safe). Active HIGH.
pub const LED_GREEN_GPIO: i32 = 12;
/// Active piezo buzzer through an NPN driver. Active HIGH.
pub const BUZZER_GPIO: i32 = 13;
/// Exhaust fan relay coil driver. HIGH = coil energized.
pub const FAN_RELAY_GPIO: i32 = 14;
