//! Link supervision against a mock access point and cloud backend.

use std::collections::VecDeque;

use hazardwatch::app::events::AppEvent;
use hazardwatch::config::SystemConfig;
use hazardwatch::connectivity::{ConnectivityManager, LinkPhase, ReconnectPolicy};
use hazardwatch::error::CommsError;

use crate::mock_hw::{EventLog, FakeTime, MockCloud, MockNetwork, RecordingDelay};

type Link = ConnectivityManager<MockNetwork, MockCloud>;

fn link(network: MockNetwork, cloud: MockCloud) -> Link {
    ConnectivityManager::new(network, cloud, ReconnectPolicy::from_config(&SystemConfig::default()))
}

struct Ticker {
    delay: RecordingDelay,
    sink: EventLog,
}

impl Ticker {
    fn new() -> Self {
        Self {
            delay: RecordingDelay::new(FakeTime::default()),
            sink: EventLog::default(),
        }
    }

    fn tick(&mut self, link: &mut Link) -> LinkPhase {
        link.ensure_connectivity(&mut self.delay, &mut self.sink)
    }
}

#[test]
fn reaches_cloud_ready_in_one_tick() {
    let mut link = link(MockNetwork::reachable(), MockCloud::default());
    let mut t = Ticker::new();

    assert_eq!(t.tick(&mut link), LinkPhase::CloudReady);
    assert_eq!(t.delay.total_ms(), 200);
    assert_eq!(
        t.sink.events,
        vec![
            AppEvent::LinkChanged { from: LinkPhase::Disconnected, to: LinkPhase::Connecting },
            AppEvent::LinkChanged { from: LinkPhase::Connecting, to: LinkPhase::NetworkUp },
            AppEvent::LinkChanged { from: LinkPhase::NetworkUp, to: LinkPhase::CloudReady },
        ]
    );
}

#[test]
fn supervision_is_idempotent_once_ready() {
    let mut link = link(MockNetwork::reachable(), MockCloud::default());
    let mut t = Ticker::new();
    t.tick(&mut link);
    let waited = t.delay.total_ms();

    for _ in 0..5 {
        assert_eq!(t.tick(&mut link), LinkPhase::CloudReady);
    }
    assert_eq!(t.delay.total_ms(), waited, "no waiting while healthy");
    assert_eq!(link.cloud().handshakes, 1);
    assert_eq!(link.network().begin_calls, 1);
    assert_eq!(t.sink.events.len(), 3);
}

#[test]
fn failed_handshake_stays_network_up_and_retries_without_reassociating() {
    let cloud = MockCloud {
        handshake_results: VecDeque::from([Err(CommsError::HandshakeRejected)]),
        ..MockCloud::default()
    };
    let mut link = link(MockNetwork::reachable(), cloud);
    let mut t = Ticker::new();

    assert_eq!(t.tick(&mut link), LinkPhase::NetworkUp);
    assert_eq!(link.cloud().handshakes, 1);
    assert!(link.session().is_none());

    assert_eq!(t.tick(&mut link), LinkPhase::CloudReady);
    assert_eq!(link.cloud().handshakes, 2);
    assert_eq!(link.network().begin_calls, 1, "association is not repeated");
    assert_eq!(t.sink.count(|e| matches!(e, AppEvent::LinkChanged { to: LinkPhase::Disconnected, .. })), 0);
}

#[test]
fn link_loss_invalidates_session_and_rebuilds_it() {
    let network = MockNetwork::reachable();
    let range = network.range_handle();
    let mut link = link(network, MockCloud::default());
    let mut t = Ticker::new();
    t.tick(&mut link);

    range.set(false);
    assert_eq!(t.tick(&mut link), LinkPhase::Connecting);
    assert_eq!(link.cloud().invalidations, 1);
    assert!(!link.cloud().session);
    assert!(t.sink.events.contains(&AppEvent::LinkChanged {
        from: LinkPhase::CloudReady,
        to: LinkPhase::Disconnected,
    }));

    range.set(true);
    // The previous tick exhausted its budget, so this one is deferred and
    // only checks the link; the one after asks again.
    assert_eq!(t.tick(&mut link), LinkPhase::Connecting);
    assert_eq!(t.tick(&mut link), LinkPhase::CloudReady);
    assert_eq!(link.cloud().handshakes, 2);
    assert!(link.cloud().session);
}

#[test]
fn unreachable_network_backs_off_between_requests() {
    let mut link = link(MockNetwork::unreachable(), MockCloud::default());
    let mut t = Ticker::new();

    let mut request_ticks = Vec::new();
    for tick in 0..12 {
        let before = link.network().begin_calls;
        let before_ms = t.delay.total_ms();
        assert_eq!(t.tick(&mut link), LinkPhase::Connecting);
        let waited = t.delay.total_ms() - before_ms;
        if link.network().begin_calls != before {
            request_ticks.push(tick);
            assert_eq!(waited, 2000, "one bounded wait per request tick");
        } else {
            assert_eq!(waited, 0, "deferred ticks never block");
        }
    }
    // Deferrals double: 1, 2, then 4 ticks.
    assert_eq!(request_ticks, vec![0, 2, 5, 10]);
}

#[test]
fn shutdown_disconnects_and_drops_session() {
    let mut link = link(MockNetwork::reachable(), MockCloud::default());
    let mut t = Ticker::new();
    t.tick(&mut link);

    link.shutdown(&mut t.sink);

    assert_eq!(link.state().phase, LinkPhase::Disconnected);
    assert_eq!(link.network().disconnects, 1);
    assert_eq!(link.cloud().invalidations, 1);
    assert!(link.session().is_none());
}
