//! Local alert engine and the escalation rule.
//!
//! The engine is a pure function of one reading: no hysteresis, no
//! debouncing.  Flame or gas above the threshold is `Danger` on the very
//! first detecting cycle.
//!
//! ## Escalation
//!
//! `Danger` from any source dominates.  [`reconcile`] and
//! [`AlertLevel::escalate`] only ever move a verdict towards `Danger`;
//! the overall state returns to `Safe` only when every source says `Safe`.

use core::fmt;

use serde::Serialize;

use crate::acquisition::SensorReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertLevel {
    Safe,
    Danger,
}

impl AlertLevel {
    /// Combine two verdicts; `Danger` wins.
    pub const fn escalate(self, other: Self) -> Self {
        match (self, other) {
            (Self::Safe, Self::Safe) => Self::Safe,
            _ => Self::Danger,
        }
    }

    pub const fn is_danger(self) -> bool {
        matches!(self, Self::Danger)
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Danger => write!(f, "DANGER"),
        }
    }
}

/// Which path produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertSource {
    LocalThreshold,
    RemoteClassifier,
    Reconciled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlertState {
    pub level: AlertLevel,
    pub source: AlertSource,
}

impl AlertState {
    pub const fn local(level: AlertLevel) -> Self {
        Self { level, source: AlertSource::LocalThreshold }
    }

    pub const fn remote(level: AlertLevel) -> Self {
        Self { level, source: AlertSource::RemoteClassifier }
    }

    pub const fn reconciled(level: AlertLevel) -> Self {
        Self { level, source: AlertSource::Reconciled }
    }

    pub const fn is_danger(&self) -> bool {
        self.level.is_danger()
    }
}

/// Individual hazard conditions, as a bitmask so several can be reported at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Hazard {
    Flame = 0b0000_0001,
    Gas = 0b0000_0010,
}

impl Hazard {
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flame => write!(f, "flame"),
            Self::Gas => write!(f, "gas"),
        }
    }
}

/// Deterministic threshold evaluation.
#[derive(Debug, Clone, Copy)]
pub struct LocalAlertEngine {
    gas_danger_threshold: i32,
}

impl LocalAlertEngine {
    pub fn new(gas_danger_threshold: i32) -> Self {
        Self { gas_danger_threshold }
    }

    /// Bitmask of [`Hazard`]s present in `reading`.
    pub fn hazards(&self, reading: &SensorReading) -> u8 {
        let mut mask = 0;
        if reading.flame_detected() {
            mask |= Hazard::Flame.mask();
        }
        // Strictly above: a reading equal to the threshold is still Safe.
        if reading.gas_level() > self.gas_danger_threshold {
            mask |= Hazard::Gas.mask();
        }
        mask
    }

    pub fn evaluate(&self, reading: &SensorReading) -> AlertState {
        let level = if self.hazards(reading) != 0 {
            AlertLevel::Danger
        } else {
            AlertLevel::Safe
        };
        AlertState::local(level)
    }

    pub fn gas_danger_threshold(&self) -> i32 {
        self.gas_danger_threshold
    }
}

/// Combine a local verdict with an optional classifier verdict.
///
/// `None` means the classifier gave no answer; the local verdict stands.
pub fn reconcile(local: AlertState, remote: Option<AlertLevel>) -> AlertState {
    let level = match remote {
        Some(remote) => local.level.escalate(remote),
        None => local.level,
    };
    AlertState::reconciled(level)
}
