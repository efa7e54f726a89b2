//! Connectivity resilience manager.
//!
//! Owns the network link and the cloud session and is the only code that
//! mutates either.  Everything else asks [`ConnectivityManager::is_cloud_ready`]
//! or borrows the session through [`ConnectivityManager::session`].
//!
//! ```text
//!  Disconnected ──▶ Connecting ──▶ NetworkUp ──▶ CloudReady
//!       ▲                                │            │
//!       └──────────── link lost ─────────┴────────────┘
//! ```
//!
//! ## Bounded supervision
//!
//! [`ensure_connectivity`](ConnectivityManager::ensure_connectivity) is
//! called once per control cycle and waits at most
//! `poll_attempts × poll_interval_ms`.  When a tick's poll budget runs out
//! the next association request is deferred by 1, 2, 4 … ticks (capped);
//! a deferred tick still checks the link once, without waiting.
//!
//! ## Session lifecycle
//!
//! The cloud handshake runs once per `NetworkUp` entry.  A failed handshake
//! leaves the link in `NetworkUp` and is retried on the next tick without
//! touching the association.  Link loss invalidates the session; it is
//! rebuilt from scratch after the next association.  A session the backend
//! stops honouring (expired token) drops the link back to `NetworkUp`, so
//! the same tick signs in again.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{CloudPort, EventSink, NetworkPort};
use crate::config::SystemConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    Disconnected,
    Connecting,
    NetworkUp,
    CloudReady,
}

impl fmt::Display for LinkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::NetworkUp => write!(f, "network-up"),
            Self::CloudReady => write!(f, "cloud-ready"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityState {
    pub phase: LinkPhase,
    /// Association polls spent in the current reconnect attempt.
    pub retries: u32,
}

/// Wait budget and backoff bounds for one supervision tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub poll_attempts: u8,
    pub poll_interval_ms: u32,
    pub max_backoff_ticks: u16,
}

impl ReconnectPolicy {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            poll_attempts: config.connect_poll_attempts,
            poll_interval_ms: config.connect_poll_interval_ms,
            max_backoff_ticks: config.max_reassociate_backoff_ticks,
        }
    }
}

pub struct ConnectivityManager<N: NetworkPort, C: CloudPort> {
    network: N,
    cloud: C,
    state: ConnectivityState,
    policy: ReconnectPolicy,
    /// An association request is outstanding.
    association_pending: bool,
    /// Length of the next deferral, in ticks.
    backoff_ticks: u16,
    /// Ticks left before association may be requested again.
    deferral_remaining: u16,
}

impl<N: NetworkPort, C: CloudPort> ConnectivityManager<N, C> {
    pub fn new(network: N, cloud: C, policy: ReconnectPolicy) -> Self {
        Self {
            network,
            cloud,
            state: ConnectivityState {
                phase: LinkPhase::Disconnected,
                retries: 0,
            },
            policy,
            association_pending: false,
            backoff_ticks: 1,
            deferral_remaining: 0,
        }
    }

    // ── Supervision ───────────────────────────────────────────

    /// Advance the state machine by one supervision tick.
    pub fn ensure_connectivity(
        &mut self,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> LinkPhase {
        if matches!(self.state.phase, LinkPhase::NetworkUp | LinkPhase::CloudReady)
            && !self.network.is_associated()
        {
            warn!("Link: association lost in {}, invalidating session", self.state.phase);
            self.cloud.invalidate_session();
            self.transition(LinkPhase::Disconnected, sink);
        }

        if self.state.phase == LinkPhase::CloudReady && !self.cloud.has_session() {
            warn!("Link: cloud session revoked, signing in again");
            self.cloud.invalidate_session();
            self.transition(LinkPhase::NetworkUp, sink);
        }

        if self.state.phase == LinkPhase::Disconnected {
            self.state.retries = 0;
            self.association_pending = false;
            self.backoff_ticks = 1;
            self.deferral_remaining = 0;
            self.transition(LinkPhase::Connecting, sink);
        }

        if self.state.phase == LinkPhase::Connecting && self.supervise_association(delay) {
            self.transition(LinkPhase::NetworkUp, sink);
        }

        if self.state.phase == LinkPhase::NetworkUp {
            match self.cloud.handshake() {
                Ok(()) => {
                    info!("Link: cloud session established");
                    self.transition(LinkPhase::CloudReady, sink);
                }
                Err(e) => {
                    warn!("Link: cloud handshake failed ({}), retrying next tick", e);
                }
            }
        }

        self.state.phase
    }

    /// Returns `true` once the link is associated.
    fn supervise_association(&mut self, delay: &mut impl DelayNs) -> bool {
        if self.network.is_associated() {
            return self.associated();
        }

        if self.deferral_remaining > 0 {
            self.deferral_remaining -= 1;
            debug!(
                "Link: association deferred ({} tick(s) left)",
                self.deferral_remaining
            );
            return false;
        }

        if !self.association_pending {
            if let Err(e) = self.network.begin_association() {
                warn!("Link: association request failed ({})", e);
                self.back_off();
                return false;
            }
            self.association_pending = true;
        }

        for _ in 0..self.policy.poll_attempts {
            delay.delay_ms(self.policy.poll_interval_ms);
            self.state.retries = self.state.retries.saturating_add(1);
            if self.network.is_associated() {
                return self.associated();
            }
        }

        warn!(
            "Link: not associated after {} polls (total {}), backing off {} tick(s)",
            self.policy.poll_attempts, self.state.retries, self.backoff_ticks
        );
        self.association_pending = false;
        self.back_off();
        false
    }

    fn associated(&mut self) -> bool {
        info!("Link: associated after {} poll(s)", self.state.retries);
        self.association_pending = false;
        self.backoff_ticks = 1;
        self.deferral_remaining = 0;
        true
    }

    fn back_off(&mut self) {
        self.deferral_remaining = self.backoff_ticks;
        self.backoff_ticks = self
            .backoff_ticks
            .saturating_mul(2)
            .min(self.policy.max_backoff_ticks);
    }

    fn transition(&mut self, to: LinkPhase, sink: &mut impl EventSink) {
        let from = self.state.phase;
        if from == to {
            return;
        }
        info!("Link: {} -> {}", from, to);
        self.state.phase = to;
        sink.emit(&AppEvent::LinkChanged { from, to });
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_cloud_ready(&self) -> bool {
        self.state.phase == LinkPhase::CloudReady
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// The authenticated cloud session, only while `CloudReady`.
    pub fn session(&mut self) -> Option<&mut C> {
        if self.is_cloud_ready() {
            Some(&mut self.cloud)
        } else {
            None
        }
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn cloud(&self) -> &C {
        &self.cloud
    }

    /// Tear everything down (graceful stop).
    pub fn shutdown(&mut self, sink: &mut impl EventSink) {
        self.cloud.invalidate_session();
        self.network.disconnect();
        self.association_pending = false;
        self.transition(LinkPhase::Disconnected, sink);
    }
}
