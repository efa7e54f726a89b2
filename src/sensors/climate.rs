//! DHT22 (AM2302) temperature / humidity sensor on a single-wire bus.
//!
//! A read returns NaN for both values when the frame is missing, times out
//! or fails its checksum; acquisition turns that into a `ReadFailure`.
//!
//! ## Frame
//!
//! 40 bits, MSB first: humidity ×10 (16 bit), temperature ×10 (15 bit +
//! sign bit), checksum = low byte of the sum of the first four bytes.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the bus with `esp_rom_delay_us` and the µs timer.
//! On host/test: returns values injected through static atomics.

use core::sync::atomic::AtomicU32;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

use log::warn;

use crate::error::SensorError;

static SIM_TEMP_BITS: AtomicU32 = AtomicU32::new(0x41C8_0000); // 25.0
static SIM_HUM_BITS: AtomicU32 = AtomicU32::new(0x4220_0000); // 40.0

/// Inject the next climate values (NaN simulates a failed read).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate(temperature_c: f32, humidity_pct: f32) {
    SIM_TEMP_BITS.store(temperature_c.to_bits(), Ordering::Relaxed);
    SIM_HUM_BITS.store(humidity_pct.to_bits(), Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl ClimateReading {
    const FAILED: Self = Self {
        temperature_c: f32::NAN,
        humidity_pct: f32::NAN,
    };
}

/// Decode a raw 5-byte frame into `(temperature_c, humidity_pct)`.
pub fn decode_frame(frame: &[u8; 5]) -> Result<(f32, f32), SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::ChecksumMismatch);
    }
    let humidity = u16::from_be_bytes([frame[0], frame[1]]) as f32 / 10.0;
    let magnitude = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]) as f32 / 10.0;
    let temperature = if frame[2] & 0x80 != 0 { -magnitude } else { magnitude };
    Ok((temperature, humidity))
}

pub struct ClimateSensor {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    gpio: i32,
}

impl ClimateSensor {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    pub fn read(&mut self) -> ClimateReading {
        match self.read_frame().and_then(|frame| decode_frame(&frame)) {
            Ok((temperature_c, humidity_pct)) => ClimateReading {
                temperature_c,
                humidity_pct,
            },
            Err(e) => {
                warn!("Sensors: DHT22 read failed ({})", e);
                ClimateReading::FAILED
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        let t = f32::from_bits(SIM_TEMP_BITS.load(Ordering::Relaxed));
        let h = f32::from_bits(SIM_HUM_BITS.load(Ordering::Relaxed));
        if !t.is_finite() || !h.is_finite() {
            return Err(SensorError::NoResponse);
        }
        Ok(encode_frame(t, h))
    }

    #[cfg(target_os = "espidf")]
    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        use esp_idf_svc::sys::*;

        // SAFETY: the DHT pin is owned by this driver; direction and level
        // writes target an already-configured pad from the control task only.
        unsafe {
            gpio_set_direction(self.gpio, gpio_mode_t_GPIO_MODE_OUTPUT_OD);
            gpio_set_level(self.gpio, 0);
            esp_rom_delay_us(1_200);
            gpio_set_level(self.gpio, 1);
            esp_rom_delay_us(30);
            gpio_set_direction(self.gpio, gpio_mode_t_GPIO_MODE_INPUT);
        }

        // Response: ~80 µs low, ~80 µs high, then the first bit's low.
        pulse_us(self.gpio, true, 60).map_err(|_| SensorError::NoResponse)?;
        pulse_us(self.gpio, false, 100).map_err(|_| SensorError::NoResponse)?;
        pulse_us(self.gpio, true, 100).map_err(|_| SensorError::NoResponse)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            pulse_us(self.gpio, false, 70)?;
            // ~27 µs high = 0, ~70 µs high = 1.
            let high = pulse_us(self.gpio, true, 100)?;
            if high > 40 {
                frame[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        Ok(frame)
    }
}

/// Microseconds the pin stays at `level`, or a timeout.
#[cfg(target_os = "espidf")]
fn pulse_us(gpio: i32, level: bool, timeout_us: i64) -> Result<u32, SensorError> {
    use esp_idf_svc::sys::{esp_timer_get_time, gpio_get_level};

    // SAFETY: read-only register and timer access.
    let start = unsafe { esp_timer_get_time() };
    loop {
        let now = unsafe { esp_timer_get_time() };
        if (unsafe { gpio_get_level(gpio) } != 0) != level {
            return Ok((now - start) as u32);
        }
        if now - start > timeout_us {
            return Err(SensorError::FrameTimeout);
        }
    }
}

/// Build a valid frame (simulation and tests).
#[cfg_attr(target_os = "espidf", allow(dead_code))]
pub(crate) fn encode_frame(temperature_c: f32, humidity_pct: f32) -> [u8; 5] {
    let hum = (humidity_pct * 10.0).round().clamp(0.0, 1000.0) as u16;
    let t = (temperature_c.abs() * 10.0).round().min(f32::from(0x7FFF_u16)) as u16;
    let [h0, h1] = hum.to_be_bytes();
    let [mut t0, t1] = t.to_be_bytes();
    if temperature_c < 0.0 {
        t0 |= 0x80;
    }
    let sum = h0.wrapping_add(h1).wrapping_add(t0).wrapping_add(t1);
    [h0, h1, t0, t1, sum]
}
