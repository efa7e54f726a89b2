//! Integration tests for the full control cycle:
//! acquisition → alert → actuation → link → telemetry.

use hazardwatch::actuation::{AlarmOutcome, IndicatorColour, Notification};
use hazardwatch::alert::{AlertLevel, AlertSource, AlertState, Hazard};
use hazardwatch::app::events::AppEvent;
use hazardwatch::app::service::CycleOutcome;
use hazardwatch::acquisition::ReadFailure;
use hazardwatch::config::SystemConfig;
use hazardwatch::connectivity::LinkPhase;
use hazardwatch::error::CommsError;
use hazardwatch::handoff::Handoff;
use hazardwatch::telemetry::{PublishOutcome, TelemetryValue};

use crate::mock_hw::{EventLog, MockCloud, MockHardware, MockNetwork, Rig, Sent, calm, raw};

fn completed(outcome: CycleOutcome) -> hazardwatch::app::service::CycleReport {
    match outcome {
        CycleOutcome::Completed(report) => report,
        CycleOutcome::ReadFailure(f) => panic!("unexpected read failure: {f}"),
    }
}

// ── Scenario A: calm reading while CloudReady ─────────────────

#[test]
fn scenario_a_safe_reading_publishes_and_idles() {
    let config = SystemConfig::default();
    let mut rig = Rig::online(&config);
    let mut hw = MockHardware::new(&[calm()]);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();

    let report = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));

    assert_eq!(rig.service.link().state().phase, LinkPhase::CloudReady);
    assert_eq!(report.local, AlertState::local(AlertLevel::Safe));
    assert_eq!(report.effective.level, AlertLevel::Safe);
    assert_eq!(report.publish, PublishOutcome::Published);
    assert!(report.command.notifications.is_empty());
    assert_eq!(report.alarm, None);

    assert_eq!(hw.indicator(), Some(IndicatorColour::Green));
    // Energized relay = fan idle with the default polarity.
    assert_eq!(hw.fan_energized(), Some(true));
    assert!(!hw.buzzer_on());
    assert!(rig.service.notifier().sent.is_empty());

    let writes = &rig.service.link().cloud().writes;
    assert_eq!(
        writes.as_slice(),
        &[
            ("/monitor/temperature".to_string(), TelemetryValue::Float(25.0)),
            ("/monitor/humidity".to_string(), TelemetryValue::Float(40.0)),
            ("/monitor/flame".to_string(), TelemetryValue::Bool(false)),
            ("/monitor/gas".to_string(), TelemetryValue::Int(200)),
        ]
    );
    assert_eq!(handoff.local.latest(), Some(AlertState::local(AlertLevel::Safe)));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::AlertRaised { .. })), 0);
}

// ── Scenario B: flame → full alarm and one notification burst ─

#[test]
fn scenario_b_flame_raises_alarm_and_notifies_once() {
    let config = SystemConfig::default();
    let mut rig = Rig::online(&config);
    let mut hw = MockHardware::new(&[raw(25.0, 40.0, 200, true)]);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();

    let report = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));

    assert_eq!(report.local.level, AlertLevel::Danger);
    assert!(report.command.edge);
    assert_eq!(
        report.command.notifications.as_slice(),
        &[Notification::Voice, Notification::Sms]
    );
    assert_eq!(report.alarm, Some(AlarmOutcome::Completed));

    assert_eq!(hw.indicator(), Some(IndicatorColour::Red));
    assert_eq!(hw.fan_energized(), Some(false), "fan runs in danger");
    // 250 ms on / 250 ms off across a 3 s window.
    assert_eq!(hw.buzzer_on_count(), 6);
    assert!(!hw.buzzer_on(), "buzzer silenced when the window ends");
    assert_eq!(rig.time.now_ms(), 3000 + 200);

    let sent = &rig.service.notifier().sent;
    assert_eq!(
        sent.as_slice(),
        &[
            Sent::Voice(config.voice_text.to_string()),
            Sent::Sms(config.sms_text.to_string()),
        ]
    );
    assert_eq!(
        sink.events
            .iter()
            .filter(|e| matches!(e, AppEvent::AlertRaised { .. }))
            .collect::<Vec<_>>(),
        vec![&AppEvent::AlertRaised {
            source: AlertSource::LocalThreshold,
            hazards: Hazard::Flame.mask(),
        }]
    );
    let render = hw.last_render().expect("display updated");
    assert_eq!(render[1], "G200 FLAME!");
}

// ── Scenario C: gas danger while disconnected ─────────────────

#[test]
fn scenario_c_danger_actuates_without_connectivity() {
    let config = SystemConfig::default();
    let mut rig = Rig::offline(&config);
    let mut hw = MockHardware::new(&[raw(25.0, 40.0, 1600, false)]);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();

    let report = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));

    assert_eq!(rig.service.link().state().phase, LinkPhase::Connecting);
    assert_eq!(report.local.level, AlertLevel::Danger);
    assert_eq!(report.publish, PublishOutcome::Skipped);
    assert_eq!(hw.indicator(), Some(IndicatorColour::Red));
    assert_eq!(hw.fan_energized(), Some(false));
    assert_eq!(report.alarm, Some(AlarmOutcome::Completed));
    assert_eq!(rig.service.notifier().sms_count(), 1);
    assert!(rig.service.link().cloud().writes.is_empty());
    // The alarm window plus one bounded reconnect wait (10 × 200 ms).
    assert_eq!(rig.time.now_ms(), 3000 + 2000);
    assert_eq!(rig.service.stats().publish_skipped, 1);
}

// ── Scenario D: sustained danger notifies once ────────────────

#[test]
fn scenario_d_consecutive_danger_cycles_notify_once() {
    let config = SystemConfig::default();
    let mut rig = Rig::online(&config);
    let flame = raw(25.0, 40.0, 200, true);
    let mut hw = MockHardware::new(&[flame, flame]);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();

    let first = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));
    assert!(first.command.edge);
    hw.clear_calls();

    let second = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));
    assert!(!second.command.edge);
    assert!(second.command.notifications.is_empty());

    // Level outputs are re-asserted on the second cycle too.
    assert_eq!(hw.indicator(), Some(IndicatorColour::Red));
    assert_eq!(hw.fan_energized(), Some(false));
    assert_eq!(hw.buzzer_on_count(), 6);
    assert_eq!(second.alarm, Some(AlarmOutcome::Completed));

    let notifier = rig.service.notifier();
    assert_eq!(notifier.sms_count(), 1);
    assert_eq!(notifier.voice_count(), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::AlertRaised { .. })), 1);
}

#[test]
fn every_danger_reentry_notifies_again() {
    let config = SystemConfig::default();
    let mut rig = Rig::online(&config);
    let flame = raw(25.0, 40.0, 200, true);
    let mut hw = MockHardware::new(&[flame, calm(), flame, calm(), flame]);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();

    for _ in 0..5 {
        rig.service.cycle(&mut hw, &handoff, &mut sink);
    }

    // Three entries a few seconds apart, three bursts.
    assert_eq!(rig.service.notifier().sms_count(), 3);
    assert_eq!(rig.service.notifier().voice_count(), 3);
    assert_eq!(sink.count(|e| *e == AppEvent::AlertCleared), 2);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::AlertRaised { .. })), 3);
}

// ── Read failures ─────────────────────────────────────────────

#[test]
fn read_failure_skips_decision_and_sync() {
    let config = SystemConfig::default();
    let mut rig = Rig::online(&config);
    let mut hw = MockHardware::new(&[raw(f32::NAN, 40.0, 4000, true), calm()]);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();

    let outcome = rig.service.cycle(&mut hw, &handoff, &mut sink);

    assert_eq!(outcome, CycleOutcome::ReadFailure(ReadFailure::Temperature));
    assert!(hw.calls.is_empty(), "no actuation on a rejected sample");
    assert!(rig.service.link().cloud().writes.is_empty());
    assert_eq!(handoff.local.latest(), None);
    assert_eq!(
        sink.count(|e| *e == AppEvent::SampleRejected(ReadFailure::Temperature)),
        1
    );
    // The settling delay, then the link still gets its supervision tick.
    assert_eq!(rig.time.now_ms(), u64::from(config.sensor_settle_delay_ms) + 200);
    assert_eq!(rig.service.link().state().phase, LinkPhase::CloudReady);

    let report = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));
    assert_eq!(report.local.level, AlertLevel::Safe);
    assert_eq!(rig.service.stats().read_failures, 1);
}

// ── Classifier verdict ────────────────────────────────────────

#[test]
fn remote_danger_escalates_a_safe_local_verdict() {
    let config = SystemConfig::default();
    let mut rig = Rig::online(&config);
    let mut hw = MockHardware::new(&[calm()]);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();
    handoff.remote.publish(AlertState::remote(AlertLevel::Danger));

    let report = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));

    assert_eq!(report.local.level, AlertLevel::Safe);
    assert_eq!(report.effective, AlertState::reconciled(AlertLevel::Danger));
    assert_eq!(hw.indicator(), Some(IndicatorColour::Red));
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::AlertRaised { source: AlertSource::RemoteClassifier, hazards: 0 }
        )),
        1
    );
    assert_eq!(hw.last_render().expect("display")[1], "G200 DANGER");

    // The classifier clears: the next cycle falls back to Safe.
    handoff.remote.publish(AlertState::remote(AlertLevel::Safe));
    let report = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));
    assert_eq!(report.effective.level, AlertLevel::Safe);
    assert_eq!(hw.indicator(), Some(IndicatorColour::Green));
}

#[test]
fn remote_safe_never_downgrades_local_danger() {
    let config = SystemConfig::default();
    let mut rig = Rig::online(&config);
    let mut hw = MockHardware::new(&[raw(25.0, 40.0, 2500, false)]);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();
    handoff.remote.publish(AlertState::remote(AlertLevel::Safe));

    let report = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));
    assert_eq!(report.effective.level, AlertLevel::Danger);
}

// ── Failures of collaborators ─────────────────────────────────

#[test]
fn rejected_telemetry_is_dropped_and_actuation_proceeds() {
    let config = SystemConfig::default();
    let cloud = MockCloud {
        reject_writes: true,
        ..MockCloud::default()
    };
    let mut rig = Rig::new(&config, MockNetwork::reachable(), cloud);
    let mut hw = MockHardware::new(&[raw(25.0, 40.0, 1700, false)]);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();

    let report = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));

    assert_eq!(report.publish, PublishOutcome::Failed(CommsError::WriteRejected));
    assert_eq!(
        sink.count(|e| *e == AppEvent::TelemetryFailed(CommsError::WriteRejected)),
        1
    );
    assert_eq!(hw.indicator(), Some(IndicatorColour::Red));
    assert_eq!(rig.service.stats().publish_failed, 1);
}

#[test]
fn expired_session_is_rebuilt_on_the_next_cycle() {
    let config = SystemConfig::default();
    let cloud = MockCloud {
        expire_next_write: true,
        ..MockCloud::default()
    };
    let mut rig = Rig::new(&config, MockNetwork::reachable(), cloud);
    let mut hw = MockHardware::new(&[calm()]);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();

    let first = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));
    assert_eq!(first.publish, PublishOutcome::Failed(CommsError::NoSession));

    let second = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));
    assert_eq!(second.publish, PublishOutcome::Published);
    let link = rig.service.link();
    assert_eq!(link.cloud().handshakes, 2);
    assert_eq!(link.network().begin_calls, 1, "association is kept");
    assert!(sink.events.contains(&AppEvent::LinkChanged {
        from: LinkPhase::CloudReady,
        to: LinkPhase::NetworkUp,
    }));
}

#[test]
fn hung_network_never_delays_the_outputs() {
    let config = SystemConfig::default();
    let stall = u64::from(config.http_timeout_ms);
    let mut rig = Rig::hung(&config, stall);
    let mut hw = MockHardware::new(&[raw(25.0, 40.0, 200, true)]).stamped(&rig.time);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();

    let report = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));

    // Fan released at the very start, before any exchange could hang.
    assert_eq!(hw.fan_set_at_ms, vec![0]);
    assert_eq!(hw.fan_energized(), Some(false));
    assert_eq!(report.alarm, Some(AlarmOutcome::Completed));
    assert_eq!(sink.count(|e| *e == AppEvent::NotificationFailed(CommsError::Timeout)), 2);
    assert_eq!(report.publish, PublishOutcome::Failed(CommsError::Timeout));

    // Voice + SMS, alarm, association poll, handshake, first write.
    let spent = rig.time.now_ms();
    assert_eq!(spent, 2 * stall + 3000 + 200 + stall + stall);
    assert!(spent <= u64::from(config.worst_case_cycle_ms()));
    assert!(
        spent + u64::from(config.control_loop_interval_ms)
            < u64::from(config.watchdog_timeout_ms())
    );
}

// ── Stop / preemption ─────────────────────────────────────────

#[test]
fn stop_request_preempts_the_alarm() {
    let config = SystemConfig::default();
    let mut rig = Rig::online(&config);
    let mut hw = MockHardware::new(&[raw(25.0, 40.0, 200, true)]);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();
    handoff.shutdown.request();

    let report = completed(rig.service.cycle(&mut hw, &handoff, &mut sink));

    assert_eq!(report.alarm, Some(AlarmOutcome::Preempted { elapsed_ms: 0 }));
    assert!(!hw.buzzer_on());
    assert_eq!(sink.count(|e| *e == AppEvent::AlarmPreempted { elapsed_ms: 0 }), 1);
    assert_eq!(rig.service.stats().alarms_preempted, 1);
    // Notifications are dispatched before the alarm starts.
    assert_eq!(rig.service.notifier().sms_count(), 1);
}

#[test]
fn run_loops_at_period_until_stopped_then_idles() {
    let config = SystemConfig::default();
    let mut rig = Rig::online(&config);
    let mut hw = MockHardware::new(&[calm()]);
    let handoff = Handoff::new();
    let mut sink = EventLog::default();
    let mut fed = 0;

    rig.service.start(&mut hw, &mut sink);
    rig.service.run(&mut hw, &handoff, &mut sink, || {
        fed += 1;
        if fed == 3 {
            handoff.shutdown.request();
        }
    });

    assert_eq!(fed, 3);
    assert_eq!(rig.service.stats().cycles, 3);
    // Two full periods; the loop does not sleep once a stop is pending.
    assert_eq!(rig.time.now_ms(), 2 * u64::from(config.control_loop_interval_ms));

    assert_eq!(sink.events.first(), Some(&AppEvent::Started));
    assert_eq!(sink.events.last(), Some(&AppEvent::Stopped { cycles: 3 }));
    assert!(sink.events.contains(&AppEvent::LinkChanged {
        from: LinkPhase::CloudReady,
        to: LinkPhase::Disconnected,
    }));

    // Safe idle: buzzer off, no indicator, relay back to its idle polarity.
    assert!(!hw.buzzer_on());
    assert_eq!(hw.indicator(), None);
    assert_eq!(hw.fan_energized(), Some(config.fan_relay_energized_when_safe));
    assert_eq!(
        hw.last_render().expect("display"),
        &["HazardWatch".to_string(), "STOPPED".to_string()]
    );
    assert_eq!(rig.service.link().network().disconnects, 1);
    assert_eq!(rig.service.link().state().phase, LinkPhase::Disconnected);
}
