//! Mock adapters for integration tests.
//!
//! Every mock records the calls it receives so tests can assert on the
//! full command history without touching GPIO, sockets or real time.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use hazardwatch::acquisition::{RawSample, SensorReading};
use hazardwatch::actuation::IndicatorColour;
use hazardwatch::alert::AlertLevel;
use hazardwatch::app::events::AppEvent;
use hazardwatch::app::ports::{
    ActuatorPort, ClassifierPort, Clock, CloudPort, DisplayPort, EventSink, NetworkPort,
    NotifierPort, RecentReadingsPort, SensorPort,
};
use hazardwatch::app::service::MonitorService;
use hazardwatch::classification::FeatureWindow;
use hazardwatch::config::SystemConfig;
use hazardwatch::connectivity::{ConnectivityManager, ReconnectPolicy};
use hazardwatch::error::CommsError;
use hazardwatch::telemetry::TelemetryValue;

// ── Samples ───────────────────────────────────────────────────

pub fn raw(temperature_c: f32, humidity_pct: f32, gas_raw: i32, flame: bool) -> RawSample {
    RawSample {
        temperature_c,
        humidity_pct,
        gas_raw,
        // Active-low input.
        flame_pin_high: !flame,
    }
}

pub fn calm() -> RawSample {
    raw(25.0, 40.0, 200, false)
}

// ── Hardware call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    Indicator(Option<IndicatorColour>),
    Buzzer(bool),
    FanRelay(bool),
    AllOff,
    Render(Vec<String>),
}

// ── MockHardware ──────────────────────────────────────────────

/// Sensors, outputs and display in one value, like the real adapter.
///
/// Queued samples are consumed one per read; the last one repeats.
pub struct MockHardware {
    pub samples: VecDeque<RawSample>,
    pub reads: u32,
    pub calls: Vec<HwCall>,
    /// When set, fan relay writes are stamped with the fake time.
    pub time: Option<FakeTime>,
    pub fan_set_at_ms: Vec<u64>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(samples: &[RawSample]) -> Self {
        Self {
            samples: samples.iter().copied().collect(),
            reads: 0,
            calls: Vec::new(),
            time: None,
            fan_set_at_ms: Vec::new(),
        }
    }

    pub fn stamped(mut self, time: &FakeTime) -> Self {
        self.time = Some(time.clone());
        self
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn indicator(&self) -> Option<IndicatorColour> {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                HwCall::Indicator(colour) => Some(*colour),
                HwCall::AllOff => Some(None),
                _ => None,
            })
            .flatten()
    }

    pub fn fan_energized(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            HwCall::FanRelay(on) => Some(*on),
            HwCall::AllOff => Some(false),
            _ => None,
        })
    }

    pub fn buzzer_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                HwCall::Buzzer(on) => Some(*on),
                HwCall::AllOff => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn buzzer_on_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == HwCall::Buzzer(true)).count()
    }

    pub fn last_render(&self) -> Option<&[String]> {
        self.calls.iter().rev().find_map(|c| match c {
            HwCall::Render(lines) => Some(lines.as_slice()),
            _ => None,
        })
    }
}

impl SensorPort for MockHardware {
    fn read_raw(&mut self) -> RawSample {
        self.reads += 1;
        if self.samples.len() > 1 {
            self.samples.pop_front().unwrap_or_else(calm)
        } else {
            self.samples.front().copied().unwrap_or_else(calm)
        }
    }
}

impl ActuatorPort for MockHardware {
    fn set_indicator(&mut self, colour: Option<IndicatorColour>) {
        self.calls.push(HwCall::Indicator(colour));
    }

    fn set_buzzer(&mut self, on: bool) {
        self.calls.push(HwCall::Buzzer(on));
    }

    fn set_fan_relay(&mut self, energized: bool) {
        if let Some(time) = &self.time {
            self.fan_set_at_ms.push(time.now_ms());
        }
        self.calls.push(HwCall::FanRelay(energized));
    }

    fn all_off(&mut self) {
        self.calls.push(HwCall::AllOff);
    }
}

impl DisplayPort for MockHardware {
    fn render(&mut self, lines: &[&str]) {
        self.calls
            .push(HwCall::Render(lines.iter().map(|l| (*l).to_string()).collect()));
    }
}

// ── Network / cloud ───────────────────────────────────────────

/// An access point that associates on request while it is in range.
///
/// The range flag is shared so a test can drop the link while the
/// connectivity manager owns the adapter.
#[derive(Default)]
pub struct MockNetwork {
    pub in_range: Rc<Cell<bool>>,
    pub associated: bool,
    pub begin_calls: u32,
    pub polls: u32,
    pub disconnects: u32,
}

#[allow(dead_code)]
impl MockNetwork {
    pub fn reachable() -> Self {
        let net = Self::default();
        net.in_range.set(true);
        net
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Handle for moving the access point in and out of range.
    pub fn range_handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.in_range)
    }
}

impl NetworkPort for MockNetwork {
    fn begin_association(&mut self) -> Result<(), CommsError> {
        self.begin_calls += 1;
        self.associated = self.in_range.get();
        Ok(())
    }

    fn is_associated(&mut self) -> bool {
        self.polls += 1;
        self.associated && self.in_range.get()
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.associated = false;
    }
}

#[derive(Default)]
pub struct MockCloud {
    /// Scripted handshake results; empty means success.
    pub handshake_results: VecDeque<Result<(), CommsError>>,
    pub handshakes: u32,
    pub invalidations: u32,
    pub session: bool,
    pub reject_writes: bool,
    /// The next write finds its token expired and ends the session.
    pub expire_next_write: bool,
    /// Every exchange burns this long; writes then time out.
    pub stall: Option<(FakeTime, u64)>,
    pub writes: Vec<(String, TelemetryValue)>,
}

impl CloudPort for MockCloud {
    fn handshake(&mut self) -> Result<(), CommsError> {
        self.handshakes += 1;
        if let Some((time, ms)) = &self.stall {
            time.advance_ms(*ms);
        }
        let result = self.handshake_results.pop_front().unwrap_or(Ok(()));
        self.session = result.is_ok();
        result
    }

    fn invalidate_session(&mut self) {
        self.invalidations += 1;
        self.session = false;
    }

    fn has_session(&self) -> bool {
        self.session
    }

    fn write(&mut self, path: &str, value: &TelemetryValue) -> Result<(), CommsError> {
        if !self.session {
            return Err(CommsError::NoSession);
        }
        if let Some((time, ms)) = &self.stall {
            time.advance_ms(*ms);
            return Err(CommsError::Timeout);
        }
        if self.expire_next_write {
            self.expire_next_write = false;
            self.session = false;
            return Err(CommsError::NoSession);
        }
        if self.reject_writes {
            return Err(CommsError::WriteRejected);
        }
        self.writes.push((path.to_string(), *value));
        Ok(())
    }
}

// ── Notifications ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Sms(String),
    Voice(String),
}

#[derive(Default)]
pub struct MockNotifier {
    pub sent: Vec<Sent>,
    pub fail: bool,
    /// Every request burns this long and then times out.
    pub stall: Option<(FakeTime, u64)>,
}

#[allow(dead_code)]
impl MockNotifier {
    pub fn sms_count(&self) -> usize {
        self.sent.iter().filter(|s| matches!(s, Sent::Sms(_))).count()
    }

    pub fn voice_count(&self) -> usize {
        self.sent.iter().filter(|s| matches!(s, Sent::Voice(_))).count()
    }
}

impl MockNotifier {
    fn stalled(&self) -> Result<(), CommsError> {
        match &self.stall {
            Some((time, ms)) => {
                time.advance_ms(*ms);
                Err(CommsError::Timeout)
            }
            None => Ok(()),
        }
    }
}

impl NotifierPort for MockNotifier {
    fn send_sms(&mut self, text: &str) -> Result<(), CommsError> {
        self.stalled()?;
        if self.fail {
            return Err(CommsError::NotificationRejected);
        }
        self.sent.push(Sent::Sms(text.to_string()));
        Ok(())
    }

    fn speak(&mut self, text: &str) -> Result<(), CommsError> {
        self.stalled()?;
        if self.fail {
            return Err(CommsError::NotificationRejected);
        }
        self.sent.push(Sent::Voice(text.to_string()));
        Ok(())
    }
}

// ── Classification ────────────────────────────────────────────

pub struct MockStore {
    pub result: Result<usize, CommsError>,
    pub fetches: u32,
}

impl MockStore {
    pub fn with(rows: usize) -> Self {
        Self {
            result: Ok(rows),
            fetches: 0,
        }
    }
}

impl RecentReadingsPort for MockStore {
    fn read_recent(&mut self, window: usize) -> Result<FeatureWindow, CommsError> {
        self.fetches += 1;
        let n = self.result?.min(window);
        let mut out = FeatureWindow::new();
        for i in 0..n {
            let r = SensorReading::new(25.0, 40.0, 200, false, i as u64 * 1000)
                .expect("finite reading");
            out.push(r).expect("within window");
        }
        Ok(out)
    }
}

pub struct MockClassifier {
    pub verdict: Result<AlertLevel, CommsError>,
    pub calls: u32,
}

impl MockClassifier {
    pub fn says(verdict: Result<AlertLevel, CommsError>) -> Self {
        Self { verdict, calls: 0 }
    }
}

impl ClassifierPort for MockClassifier {
    fn classify(&mut self, _features: &[SensorReading]) -> Result<AlertLevel, CommsError> {
        self.calls += 1;
        self.verdict
    }
}

// ── Time ──────────────────────────────────────────────────────

/// Shared fake time: the delay advances it, the clock reads it.
#[derive(Clone, Default)]
pub struct FakeTime(Rc<Cell<u64>>);

#[allow(dead_code)]
impl FakeTime {
    pub fn now_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }

    pub fn advance_ms(&self, ms: u64) {
        self.0.set(self.0.get() + ms * 1_000_000);
    }
}

pub struct RecordingDelay {
    pub time: FakeTime,
    pub total_ns: u64,
    pub ms_calls: Vec<u32>,
}

#[allow(dead_code)]
impl RecordingDelay {
    pub fn new(time: FakeTime) -> Self {
        Self {
            time,
            total_ns: 0,
            ms_calls: Vec::new(),
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.time.0.set(self.time.0.get() + u64::from(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ms_calls.push(ms);
        let ns = u64::from(ms) * 1_000_000;
        self.total_ns += ns;
        self.time.0.set(self.time.0.get() + ns);
    }
}

pub struct FakeClock(pub FakeTime);

impl Clock for FakeClock {
    fn uptime_ms(&self) -> u64 {
        self.0.now_ms()
    }
}

// ── Events ────────────────────────────────────────────────────

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Assembled service ─────────────────────────────────────────

pub type TestService =
    MonitorService<MockNetwork, MockCloud, MockNotifier, RecordingDelay, FakeClock>;

pub struct Rig {
    pub service: TestService,
    pub time: FakeTime,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: &SystemConfig, network: MockNetwork, cloud: MockCloud) -> Self {
        Self::assemble(config, FakeTime::default(), network, cloud, MockNotifier::default())
    }

    fn assemble(
        config: &SystemConfig,
        time: FakeTime,
        network: MockNetwork,
        cloud: MockCloud,
        notifier: MockNotifier,
    ) -> Self {
        let link = ConnectivityManager::new(network, cloud, ReconnectPolicy::from_config(config));
        let service = MonitorService::new(
            config,
            link,
            notifier,
            RecordingDelay::new(time.clone()),
            FakeClock(time.clone()),
        );
        Self { service, time }
    }

    /// Network reachable, but every cloud and notifier exchange hangs for
    /// `stall_ms` before timing out (the handshake still succeeds).
    pub fn hung(config: &SystemConfig, stall_ms: u64) -> Self {
        let time = FakeTime::default();
        let cloud = MockCloud {
            stall: Some((time.clone(), stall_ms)),
            ..MockCloud::default()
        };
        let notifier = MockNotifier {
            stall: Some((time.clone(), stall_ms)),
            ..MockNotifier::default()
        };
        Self::assemble(config, time, MockNetwork::reachable(), cloud, notifier)
    }

    /// Network reachable, cloud accepting everything.
    pub fn online(config: &SystemConfig) -> Self {
        Self::new(config, MockNetwork::reachable(), MockCloud::default())
    }

    pub fn offline(config: &SystemConfig) -> Self {
        Self::new(config, MockNetwork::unreachable(), MockCloud::default())
    }
}
