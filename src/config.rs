//! System configuration parameters
//!
//! All tunable parameters for the HazardWatch node.  Credentials and
//! endpoints are not part of this struct; they are baked in at build time.

use core::fmt;

use heapless::String;
use serde::{Deserialize, Serialize};

/// Longest SMS / voice alert text.
pub const ALERT_TEXT_LEN: usize = 96;
/// Longest telemetry path root.
pub const PATH_ROOT_LEN: usize = 32;

/// HTTP exchanges one control cycle can make after the outputs are set:
/// voice + SMS, the cloud handshake, four field writes and one history append.
pub const CYCLE_HTTP_EXCHANGES: u32 = 8;
/// Slack added to the worst-case cycle when sizing the task watchdog.
pub const WATCHDOG_MARGIN_MS: u32 = 5_000;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Local alert engine ---
    /// Raw gas reading strictly above which the node declares Danger.
    pub gas_danger_threshold: i32,

    // --- Timing ---
    /// Control cycle period (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Wait after a failed sensor read before the next attempt (milliseconds)
    pub sensor_settle_delay_ms: u32,

    // --- Remote classification ---
    /// Period of the classification pass (seconds)
    pub classify_interval_secs: u32,
    /// Number of recent readings fetched per classification pass
    pub classify_window: u16,

    // --- Connectivity ---
    /// Association polls per supervision tick
    pub connect_poll_attempts: u8,
    /// Wait between association polls (milliseconds)
    pub connect_poll_interval_ms: u32,
    /// Upper bound on the re-association backoff (supervision ticks)
    pub max_reassociate_backoff_ticks: u16,
    /// Per-exchange timeout for HTTP calls made from the control cycle
    /// (sign-in, telemetry writes, notifications)
    pub http_timeout_ms: u32,

    // --- Alarm ---
    /// Length of the buzzer pattern per Danger cycle (milliseconds)
    pub alarm_window_ms: u32,
    /// Buzzer on phase (milliseconds)
    pub buzzer_on_ms: u32,
    /// Buzzer off phase (milliseconds)
    pub buzzer_off_ms: u32,
    /// Fan relay coil energized while Safe (fan idle); released on Danger
    pub fan_relay_energized_when_safe: bool,

    // --- Notifications ---
    pub sms_text: String<ALERT_TEXT_LEN>,
    pub voice_text: String<ALERT_TEXT_LEN>,

    // --- Telemetry ---
    /// Path prefix under which the four telemetry fields are written
    pub telemetry_root: String<PATH_ROOT_LEN>,
    /// Log a status line every N cycles (0 disables)
    pub status_log_every_cycles: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            gas_danger_threshold: 1500,

            control_loop_interval_ms: 1000, // 1 Hz
            sensor_settle_delay_ms: 2000,   // DHT22 minimum sampling period

            classify_interval_secs: 30,
            classify_window: 10,

            connect_poll_attempts: 10,
            connect_poll_interval_ms: 200, // ≤ 2 s per tick
            max_reassociate_backoff_ticks: 16,
            http_timeout_ms: 2000,

            alarm_window_ms: 3000,
            buzzer_on_ms: 250,
            buzzer_off_ms: 250,
            fan_relay_energized_when_safe: true,

            sms_text: truncated("ALERT: Fire or gas leak detected! Evacuate immediately."),
            voice_text: truncated("Alert! Fire or gas leak detected. Please evacuate now."),

            telemetry_root: truncated("/monitor"),
            status_log_every_cycles: 60,
        }
    }
}

/// Copy `s` into a fixed-capacity string, dropping whatever does not fit.
pub fn truncated<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// Errors from configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` names the field.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(field) => write!(f, "validation failed: {}", field),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(field) => Self::Config(field),
        }
    }
}

impl SystemConfig {
    /// Reject out-of-range values.  Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |field| Err(ConfigError::ValidationFailed(field));

        if !(0..=crate::pins::GAS_ADC_MAX).contains(&self.gas_danger_threshold) {
            return fail("gas_danger_threshold");
        }
        if self.control_loop_interval_ms == 0 {
            return fail("control_loop_interval_ms");
        }
        if self.classify_interval_secs == 0 {
            return fail("classify_interval_secs");
        }
        if self.classify_window == 0
            || usize::from(self.classify_window) > crate::classification::MAX_FEATURE_WINDOW
        {
            return fail("classify_window");
        }
        if self.connect_poll_attempts == 0 {
            return fail("connect_poll_attempts");
        }
        // One supervision tick must not stall the cycle for more than 5 s.
        if u32::from(self.connect_poll_attempts) * self.connect_poll_interval_ms > 5_000 {
            return fail("connect_poll_interval_ms");
        }
        if self.max_reassociate_backoff_ticks == 0 {
            return fail("max_reassociate_backoff_ticks");
        }
        if !(100..=5_000).contains(&self.http_timeout_ms) {
            return fail("http_timeout_ms");
        }
        if self.alarm_window_ms > 30_000 {
            return fail("alarm_window_ms");
        }
        if self.buzzer_on_ms == 0 {
            return fail("buzzer_on_ms");
        }
        if self.buzzer_off_ms == 0 {
            return fail("buzzer_off_ms");
        }
        if self.sms_text.is_empty() {
            return fail("sms_text");
        }
        if self.voice_text.is_empty() {
            return fail("voice_text");
        }
        if !self.telemetry_root.starts_with('/') {
            return fail("telemetry_root");
        }
        Ok(())
    }

    /// Longest a single control cycle can block, every exchange timing out.
    pub fn worst_case_cycle_ms(&self) -> u32 {
        let link_tick = u32::from(self.connect_poll_attempts) * self.connect_poll_interval_ms;
        let completed = self.alarm_window_ms + link_tick + CYCLE_HTTP_EXCHANGES * self.http_timeout_ms;
        // Rejected sample: settle, then one supervision tick with its handshake.
        let rejected = self.sensor_settle_delay_ms + link_tick + self.http_timeout_ms;
        completed.max(rejected)
    }

    /// Task watchdog timeout that covers a worst-case cycle plus the idle
    /// wait before the next feed.
    pub fn watchdog_timeout_ms(&self) -> u32 {
        let needed = self.worst_case_cycle_ms() + self.control_loop_interval_ms + WATCHDOG_MARGIN_MS;
        needed.max(crate::drivers::watchdog::WATCHDOG_TIMEOUT_MS)
    }
}
