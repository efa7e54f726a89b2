//! Actuation & notification controller.
//!
//! Maps the effective [`AlertState`] to output commands and executes them.
//! The controller is the only owner of the physical outputs.
//!
//! ## Level vs edge
//!
//! | Output           | Kind  | Safe             | Danger                 |
//! |------------------|-------|------------------|------------------------|
//! | Indicator        | level | green            | red                    |
//! | Fan relay        | level | idle polarity    | inverted (fan running) |
//! | Buzzer           | level | off              | on/off pattern         |
//! | Display          | level | readings + SAFE  | readings + hazard      |
//! | Voice, SMS       | edge  | —                | once per entry         |
//!
//! Level outputs are re-asserted every cycle so a missed command heals on
//! the next one.  Notifications fire on every transition into `Danger`.
//!
//! ## Execution order
//!
//! Every level output, the buzzer's first phase included, is driven before
//! the first network exchange of the cycle.  Notifications follow, then the
//! rest of the alarm window.
//!
//! ## Alarm window
//!
//! The buzzer pattern occupies the cycle for `alarm_window_ms`.  It steps in
//! slices of at most [`MAX_ALARM_STEP_MS`] and checks the preemption
//! predicate before each slice.

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use heapless::{String, Vec};
use log::{error, info, warn};

use crate::acquisition::SensorReading;
use crate::alert::{AlertLevel, AlertState, Hazard};
use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorPort, DisplayPort, EventSink, NotifierPort};
use crate::config::{ALERT_TEXT_LEN, SystemConfig};

/// Character columns on the panel.
pub const DISPLAY_COLS: usize = 16;
/// Longest slice of the alarm pattern between preemption checks.
pub const MAX_ALARM_STEP_MS: u32 = 50;

pub type DisplayLine = String<DISPLAY_COLS>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorColour {
    Green,
    Red,
}

/// One-shot notification kinds, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Voice,
    Sms,
}

/// Everything the outputs should do this cycle.  Built fresh each cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuationCommand {
    pub level: AlertLevel,
    /// This cycle changed the effective level.
    pub edge: bool,
    pub indicator: IndicatorColour,
    pub buzzer_active: bool,
    pub fan_relay_energized: bool,
    pub display: [DisplayLine; 2],
    pub notifications: Vec<Notification, 2>,
}

/// Square-wave buzzer pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuzzerPattern {
    pub on_ms: u32,
    pub off_ms: u32,
}

impl BuzzerPattern {
    fn period(&self) -> u32 {
        (self.on_ms + self.off_ms).max(1)
    }

    /// Buzzer level `elapsed_ms` into the pattern.
    pub fn level_at(&self, elapsed_ms: u32) -> bool {
        elapsed_ms % self.period() < self.on_ms
    }

    /// Time until the level next changes.
    fn until_edge(&self, elapsed_ms: u32) -> u32 {
        let phase = elapsed_ms % self.period();
        if phase < self.on_ms {
            self.on_ms - phase
        } else {
            self.period() - phase
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmOutcome {
    Completed,
    Preempted { elapsed_ms: u32 },
}

pub struct ActuationController {
    pattern: BuzzerPattern,
    alarm_window_ms: u32,
    fan_energized_when_safe: bool,
    sms_text: String<ALERT_TEXT_LEN>,
    voice_text: String<ALERT_TEXT_LEN>,
    /// Effective level of the previous cycle.
    last_level: Option<AlertLevel>,
    notifications_sent: u32,
}

impl ActuationController {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            pattern: BuzzerPattern {
                on_ms: config.buzzer_on_ms,
                off_ms: config.buzzer_off_ms,
            },
            alarm_window_ms: config.alarm_window_ms,
            fan_energized_when_safe: config.fan_relay_energized_when_safe,
            sms_text: config.sms_text.clone(),
            voice_text: config.voice_text.clone(),
            last_level: None,
            notifications_sent: 0,
        }
    }

    // ── Planning ──────────────────────────────────────────────

    /// Derive this cycle's command from the effective state.
    ///
    /// `hazards` is the local [`Hazard`] mask, used only for display text.
    pub fn plan(&mut self, state: AlertState, reading: &SensorReading, hazards: u8) -> ActuationCommand {
        let danger = state.is_danger();
        let edge = self
            .last_level
            .map_or(danger, |previous| previous != state.level);
        self.last_level = Some(state.level);

        let mut notifications = Vec::new();
        if edge && danger {
            let _ = notifications.push(Notification::Voice);
            let _ = notifications.push(Notification::Sms);
        }

        ActuationCommand {
            level: state.level,
            edge,
            indicator: if danger { IndicatorColour::Red } else { IndicatorColour::Green },
            buzzer_active: danger,
            fan_relay_energized: danger != self.fan_energized_when_safe,
            display: display_lines(state.level, reading, hazards),
            notifications,
        }
    }

    // ── Execution ─────────────────────────────────────────────

    /// Drive the outputs.  Returns the alarm outcome when the buzzer
    /// pattern ran this cycle.
    pub fn execute(
        &mut self,
        cmd: &ActuationCommand,
        hw: &mut (impl ActuatorPort + DisplayPort),
        notifier: &mut impl NotifierPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
        mut preempt: impl FnMut() -> bool,
    ) -> Option<AlarmOutcome> {
        self.assert_levels(cmd, hw);

        for notification in &cmd.notifications {
            let result = match notification {
                Notification::Voice => notifier.speak(&self.voice_text),
                Notification::Sms => notifier.send_sms(&self.sms_text),
            };
            match result {
                Ok(()) => {
                    self.notifications_sent = self.notifications_sent.wrapping_add(1);
                    info!("Actuation: {:?} alert dispatched", notification);
                }
                Err(e) => {
                    warn!("Actuation: {:?} alert failed ({})", notification, e);
                    sink.emit(&AppEvent::NotificationFailed(e));
                }
            }
        }

        if !cmd.buzzer_active {
            return None;
        }

        if cmd.edge {
            error!("Actuation: ALARM for {}ms", self.alarm_window_ms);
        }
        let outcome = self.sound_alarm(hw, delay, &mut preempt);
        if let AlarmOutcome::Preempted { elapsed_ms } = outcome {
            warn!("Actuation: alarm preempted after {}ms", elapsed_ms);
            sink.emit(&AppEvent::AlarmPreempted { elapsed_ms });
        }
        Some(outcome)
    }

    /// Level outputs only.  Never blocks.
    pub fn assert_levels(&self, cmd: &ActuationCommand, hw: &mut (impl ActuatorPort + DisplayPort)) {
        hw.set_fan_relay(cmd.fan_relay_energized);
        hw.set_indicator(Some(cmd.indicator));
        hw.set_buzzer(cmd.buzzer_active && self.pattern.level_at(0));
        hw.render(&[cmd.display[0].as_str(), cmd.display[1].as_str()]);
    }

    fn sound_alarm(
        &self,
        hw: &mut impl ActuatorPort,
        delay: &mut impl DelayNs,
        preempt: &mut impl FnMut() -> bool,
    ) -> AlarmOutcome {
        let step = self
            .pattern
            .on_ms
            .min(self.pattern.off_ms)
            .clamp(1, MAX_ALARM_STEP_MS);
        let mut elapsed = 0;
        // Phase zero was driven by `assert_levels`.
        let mut buzzer = Some(self.pattern.level_at(0));

        while elapsed < self.alarm_window_ms {
            if preempt() {
                hw.set_buzzer(false);
                return AlarmOutcome::Preempted { elapsed_ms: elapsed };
            }
            let on = self.pattern.level_at(elapsed);
            if buzzer != Some(on) {
                hw.set_buzzer(on);
                buzzer = Some(on);
            }
            let slice = step
                .min(self.pattern.until_edge(elapsed))
                .min(self.alarm_window_ms - elapsed);
            delay.delay_ms(slice);
            elapsed += slice;
        }

        hw.set_buzzer(false);
        AlarmOutcome::Completed
    }

    /// Drive every output to the idle configuration (graceful stop).
    pub fn safe_idle(&mut self, hw: &mut (impl ActuatorPort + DisplayPort)) {
        hw.set_buzzer(false);
        hw.set_indicator(None);
        hw.set_fan_relay(self.fan_energized_when_safe);
        hw.render(&["HazardWatch", "STOPPED"]);
        self.last_level = None;
        info!("Actuation: outputs in safe idle");
    }

    pub fn notifications_sent(&self) -> u32 {
        self.notifications_sent
    }
}

fn display_lines(level: AlertLevel, reading: &SensorReading, hazards: u8) -> [DisplayLine; 2] {
    let mut climate: String<32> = String::new();
    let _ = write!(
        climate,
        "T{:.1}C H{:.0}%",
        reading.temperature_c(),
        reading.humidity_pct()
    );

    let status = if hazards & Hazard::Flame.mask() != 0 {
        "FLAME!"
    } else if hazards & Hazard::Gas.mask() != 0 {
        "GAS!"
    } else if level.is_danger() {
        "DANGER"
    } else {
        "SAFE"
    };
    let mut gas: String<32> = String::new();
    let _ = write!(gas, "G{} {}", reading.gas_level(), status);

    [
        crate::config::truncated(&climate),
        crate::config::truncated(&gas),
    ]
}
