//! Monitor service — the hexagonal core.
//!
//! [`MonitorService`] owns one instance of every per-cycle stage and runs
//! them in a fixed order.  All I/O flows through port traits, making the
//! entire cycle testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────────┐ ──▶ EventSink
//!                 │          MonitorService           │
//! ActuatorPort ◀──│  Link · Acquire · Alert · Publish │──▶ NotifierPort
//!  DisplayPort ◀──│  Actuate                          │
//!                 └──────────────────────────────────┘
//!                        ▲ remote          │ local
//!                        └──── Handoff ◀───┘
//! ```
//!
//! ## Cycle order
//!
//! 1. Acquisition.  A rejected sample settles, supervises the link and
//!    ends the cycle there.
//! 2. Local evaluation, published to the local slot.
//! 3. Escalation with the latest classifier verdict.
//! 4. Actuation: level outputs first, then notifications, then the alarm
//!    window.
//! 5. Connectivity supervision (bounded wait).
//! 6. Telemetry publish (best effort).
//!
//! Nothing that can block on the network runs before step 4 has driven the
//! fan, indicator, buzzer and display.

use embedded_hal::delay::DelayNs;
use log::{debug, error, info};

use crate::acquisition::{Acquisition, ReadFailure, SensorReading};
use crate::actuation::{ActuationCommand, ActuationController, AlarmOutcome};
use crate::alert::{self, AlertLevel, AlertSource, AlertState, LocalAlertEngine};
use crate::config::SystemConfig;
use crate::connectivity::ConnectivityManager;
use crate::handoff::Handoff;
use crate::telemetry::{PublishOutcome, TelemetrySync};

use super::events::AppEvent;
use super::ports::{
    ActuatorPort, Clock, CloudPort, DisplayPort, EventSink, NetworkPort, NotifierPort, SensorPort,
};

/// Running counters, logged every `status_log_every_cycles` cycles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub read_failures: u32,
    pub published: u32,
    pub publish_skipped: u32,
    pub publish_failed: u32,
    pub alerts_raised: u32,
    pub alarms_preempted: u32,
}

/// What one completed cycle did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub reading: SensorReading,
    pub local: AlertState,
    pub effective: AlertState,
    pub publish: PublishOutcome,
    pub command: ActuationCommand,
    pub alarm: Option<AlarmOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The sample was rejected; only link supervision ran.
    ReadFailure(ReadFailure),
    Completed(CycleReport),
}

/// The control cycle orchestrator.
pub struct MonitorService<N, C, P, D, K>
where
    N: NetworkPort,
    C: CloudPort,
    P: NotifierPort,
    D: DelayNs,
    K: Clock,
{
    link: ConnectivityManager<N, C>,
    acquisition: Acquisition,
    engine: LocalAlertEngine,
    telemetry: TelemetrySync,
    controller: ActuationController,
    notifier: P,
    delay: D,
    clock: K,
    period_ms: u32,
    status_every: u32,
    stats: CycleStats,
}

impl<N, C, P, D, K> MonitorService<N, C, P, D, K>
where
    N: NetworkPort,
    C: CloudPort,
    P: NotifierPort,
    D: DelayNs,
    K: Clock,
{
    pub fn new(
        config: &SystemConfig,
        link: ConnectivityManager<N, C>,
        notifier: P,
        delay: D,
        clock: K,
    ) -> Self {
        Self {
            link,
            acquisition: Acquisition::new(config.sensor_settle_delay_ms),
            engine: LocalAlertEngine::new(config.gas_danger_threshold),
            telemetry: TelemetrySync::new(&config.telemetry_root),
            controller: ActuationController::new(config),
            notifier,
            delay,
            clock,
            period_ms: config.control_loop_interval_ms,
            status_every: config.status_log_every_cycles,
            stats: CycleStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, hw: &mut (impl ActuatorPort + DisplayPort), sink: &mut impl EventSink) {
        hw.all_off();
        hw.render(&["HazardWatch", "starting..."]);
        sink.emit(&AppEvent::Started);
        info!(
            "MonitorService started (period {}ms, gas threshold {})",
            self.period_ms,
            self.engine.gas_danger_threshold()
        );
    }

    /// Run cycles at the configured period until a stop is requested,
    /// then drive the outputs to safe idle.
    pub fn run(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort + DisplayPort),
        handoff: &Handoff,
        sink: &mut impl EventSink,
        mut feed_watchdog: impl FnMut(),
    ) {
        while !handoff.shutdown.is_requested() {
            let started = self.clock.uptime_ms();
            self.cycle(hw, handoff, sink);
            feed_watchdog();

            let spent = self.clock.uptime_ms().saturating_sub(started);
            if let Some(rest) = u64::from(self.period_ms).checked_sub(spent) {
                if rest > 0 && !handoff.shutdown.is_requested() {
                    self.delay.delay_ms(rest as u32);
                }
            }
        }
        self.stop(hw, sink);
    }

    /// Tear down the link and leave the outputs idle.
    pub fn stop(&mut self, hw: &mut (impl ActuatorPort + DisplayPort), sink: &mut impl EventSink) {
        info!("MonitorService stopping after {} cycle(s)", self.stats.cycles);
        self.link.shutdown(sink);
        self.controller.safe_idle(hw);
        sink.emit(&AppEvent::Stopped { cycles: self.stats.cycles });
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full control cycle.
    ///
    /// The `hw` parameter satisfies the sensor and output ports at once;
    /// this avoids a double mutable borrow while keeping the port boundary
    /// explicit.
    pub fn cycle(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort + DisplayPort),
        handoff: &Handoff,
        sink: &mut impl EventSink,
    ) -> CycleOutcome {
        self.stats.cycles += 1;

        // 1. Acquisition
        let now_ms = self.clock.uptime_ms();
        let reading = match self.acquisition.sample(hw, now_ms) {
            Ok(r) => r,
            Err(failure) => {
                self.stats.read_failures = self.stats.read_failures.wrapping_add(1);
                sink.emit(&AppEvent::SampleRejected(failure));
                self.acquisition.settle(&mut self.delay);
                self.link.ensure_connectivity(&mut self.delay, sink);
                return CycleOutcome::ReadFailure(failure);
            }
        };

        // 2. Local fast path
        let hazards = self.engine.hazards(&reading);
        let local = self.engine.evaluate(&reading);
        handoff.local.publish(local);

        // 3. Escalate with the classifier's verdict
        let effective = match handoff.remote.latest() {
            Some(remote) => alert::reconcile(local, Some(remote.level)),
            None => local,
        };

        // 4. Actuation
        let command = self.controller.plan(effective, &reading, hazards);
        if command.edge {
            self.report_edge(local, effective, hazards, sink);
        }
        let alarm = self.controller.execute(
            &command,
            hw,
            &mut self.notifier,
            &mut self.delay,
            sink,
            || handoff.shutdown.is_requested(),
        );
        if matches!(alarm, Some(AlarmOutcome::Preempted { .. })) {
            self.stats.alarms_preempted = self.stats.alarms_preempted.wrapping_add(1);
        }

        // 5. Connectivity supervision
        self.link.ensure_connectivity(&mut self.delay, sink);

        // 6. Telemetry
        let publish = self.telemetry.publish(&mut self.link, &reading);
        match publish {
            PublishOutcome::Published => self.stats.published = self.stats.published.wrapping_add(1),
            PublishOutcome::Skipped => {
                self.stats.publish_skipped = self.stats.publish_skipped.wrapping_add(1);
            }
            PublishOutcome::Failed(e) => {
                self.stats.publish_failed = self.stats.publish_failed.wrapping_add(1);
                sink.emit(&AppEvent::TelemetryFailed(e));
            }
        }

        debug!(
            "Cycle {}: gas={} flame={} local={} effective={} publish={:?}",
            self.stats.cycles,
            reading.gas_level(),
            reading.flame_detected(),
            local.level,
            effective.level,
            publish
        );
        self.log_status();

        CycleOutcome::Completed(CycleReport {
            reading,
            local,
            effective,
            publish,
            command,
            alarm,
        })
    }

    fn report_edge(
        &mut self,
        local: AlertState,
        effective: AlertState,
        hazards: u8,
        sink: &mut impl EventSink,
    ) {
        match effective.level {
            AlertLevel::Danger => {
                self.stats.alerts_raised = self.stats.alerts_raised.wrapping_add(1);
                let source = if local.is_danger() {
                    AlertSource::LocalThreshold
                } else {
                    AlertSource::RemoteClassifier
                };
                error!("Alert: DANGER raised by {:?} (hazards=0b{:02b})", source, hazards);
                sink.emit(&AppEvent::AlertRaised { source, hazards });
            }
            AlertLevel::Safe => {
                info!("Alert: cleared, all sources report SAFE");
                sink.emit(&AppEvent::AlertCleared);
            }
        }
    }

    fn log_status(&self) {
        if self.status_every == 0 || self.stats.cycles % u64::from(self.status_every) != 0 {
            return;
        }
        let s = &self.stats;
        info!(
            "Status: cycles={} link={} read_fail={} published={} skipped={} failed={} alerts={} notified={}",
            s.cycles,
            self.link.state().phase,
            s.read_failures,
            s.published,
            s.publish_skipped,
            s.publish_failed,
            s.alerts_raised,
            self.controller.notifications_sent()
        );
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    pub fn link(&self) -> &ConnectivityManager<N, C> {
        &self.link
    }

    pub fn notifier(&self) -> &P {
        &self.notifier
    }
}
