//! HD44780 16×2 character display behind a PCF8574 I²C backpack.
//!
//! The expander drives the controller in 4-bit mode:
//!
//! | PCF8574 bit | P7..P4 | P3        | P2 | P1 | P0 |
//! |-------------|--------|-----------|----|----|----|
//! | HD44780     | D7..D4 | backlight | EN | RW | RS |
//!
//! Each byte is sent as two nibbles, each latched by an EN high→low pulse,
//! so one character costs four bus bytes.  Lines are padded to the panel
//! width instead of clearing, which avoids the 1.5 ms clear command.
//!
//! Generic over [`embedded_hal::i2c::I2c`], so the same driver runs on the
//! `esp-idf-hal` I²C driver and on a recording bus in tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use heapless::Vec;
use log::{info, warn};

use crate::app::ports::DisplayPort;

pub const COLS: usize = 16;
pub const ROWS: usize = 2;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_FUNCTION_SET_4BIT_2LINE: u8 = 0x28;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_LEFT: u8 = 0x06;
const CMD_SET_DDRAM: u8 = 0x80;

const ROW_OFFSETS: [u8; ROWS] = [0x00, 0x40];

/// Expander bytes that transfer `value` to the controller.
///
/// `data` selects the data register (RS high) rather than the command register.
pub fn encode_byte(value: u8, data: bool) -> [u8; 4] {
    let flags = BACKLIGHT | if data { RS } else { 0 };
    let high = (value & 0xF0) | flags;
    let low = (value << 4) | flags;
    [high | EN, high, low | EN, low]
}

/// Panel byte for a character; anything outside printable ASCII shows as `?`.
fn glyph(c: char) -> u8 {
    if c.is_ascii() && !c.is_ascii_control() {
        c as u8
    } else {
        b'?'
    }
}

pub struct CharacterLcd<B: I2c> {
    bus: B,
    addr: u8,
    healthy: bool,
}

impl<B: I2c> CharacterLcd<B> {
    pub fn new(bus: B, addr: u8) -> Self {
        Self { bus, addr, healthy: true }
    }

    /// Power-on initialisation into 4-bit, two-line mode.
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), B::Error> {
        delay.delay_ms(50);
        // Three 8-bit function sets resynchronise the nibble phase.
        for wait_us in [4_500, 150, 150] {
            self.nibble(0x30)?;
            delay.delay_us(wait_us);
        }
        self.nibble(0x20)?;
        self.command(CMD_FUNCTION_SET_4BIT_2LINE)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_CLEAR)?;
        delay.delay_ms(2);
        self.command(CMD_ENTRY_LEFT)?;
        info!("Display: HD44780 ready at 0x{:02X}", self.addr);
        Ok(())
    }

    fn nibble(&mut self, high_nibble: u8) -> Result<(), B::Error> {
        let b = (high_nibble & 0xF0) | BACKLIGHT;
        self.bus.write(self.addr, &[b | EN, b])
    }

    fn command(&mut self, cmd: u8) -> Result<(), B::Error> {
        self.bus.write(self.addr, &encode_byte(cmd, false))
    }

    /// Overwrite one row, padded with spaces to the full width.
    pub fn write_row(&mut self, row: usize, text: &str) -> Result<(), B::Error> {
        let Some(offset) = ROW_OFFSETS.get(row) else {
            return Ok(());
        };
        self.command(CMD_SET_DDRAM | offset)?;

        let mut buf: Vec<u8, { COLS * 4 }> = Vec::new();
        let chars = text.chars().map(glyph).chain(core::iter::repeat(b' '));
        for byte in chars.take(COLS) {
            // Capacity is exactly COLS transfers.
            let _ = buf.extend_from_slice(&encode_byte(byte, true));
        }
        self.bus.write(self.addr, &buf)
    }

    pub fn render_lines(&mut self, lines: &[&str]) -> Result<(), B::Error> {
        for row in 0..ROWS {
            self.write_row(row, lines.get(row).copied().unwrap_or(""))?;
        }
        Ok(())
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }
}

impl<B: I2c> DisplayPort for CharacterLcd<B> {
    fn render(&mut self, lines: &[&str]) {
        match self.render_lines(lines) {
            Ok(()) => {
                if !self.healthy {
                    info!("Display: bus recovered");
                }
                self.healthy = true;
            }
            Err(e) => {
                if self.healthy {
                    warn!("Display: I2C write failed ({:?})", e);
                }
                self.healthy = false;
            }
        }
    }
}
