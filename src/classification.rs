//! Remote classification bridge.
//!
//! Runs on its own, coarser cadence.  Each pass fetches a recent window of
//! readings from the telemetry store, asks the classifier for a verdict and
//! publishes that verdict, alone, to the `remote` slot.  The control cycle
//! escalates each fresh local verdict with it, so a local Danger seen by
//! this pass never outlives the readings that raised it.  If the fetch or
//! the classifier fails the slot is cleared: the remote path augments the
//! safety response but never gates it.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────┐
//!  │  classify thread (core 0)                                │
//!  │  futures_lite::block_on                                  │
//!  │  └─ edge_executor::LocalExecutor                         │
//!  │     └─ run():  or(shutdown.wait(), Timer::after(period)) │
//!  │                 └─ run_pass(): classifier ─▶ remote slot │
//!  └──────────────────────────────────────────────────────────┘
//! ```

use core::time::Duration;

use log::{debug, info, warn};

use crate::acquisition::SensorReading;
use crate::alert::{self, AlertLevel, AlertState};
use crate::app::ports::{ClassifierPort, RecentReadingsPort};
use crate::error::CommsError;
use crate::handoff::Handoff;

/// Largest window a single classification request can carry.
pub const MAX_FEATURE_WINDOW: usize = 32;

/// Recent readings, oldest first.
pub type FeatureWindow = heapless::Vec<SensorReading, MAX_FEATURE_WINDOW>;

pub struct ClassificationBridge<R: RecentReadingsPort, K: ClassifierPort> {
    readings: R,
    classifier: K,
    window: usize,
    passes: u32,
}

impl<R: RecentReadingsPort, K: ClassifierPort> ClassificationBridge<R, K> {
    pub fn new(readings: R, classifier: K, window: usize) -> Self {
        Self {
            readings,
            classifier,
            window: window.clamp(1, MAX_FEATURE_WINDOW),
            passes: 0,
        }
    }

    /// The classifier's independent verdict, or `None` when unavailable.
    pub fn corroborate(&mut self) -> Option<AlertLevel> {
        let features = match self.readings.read_recent(self.window) {
            Ok(f) => f,
            Err(CommsError::NoSession) => {
                debug!("Classify: cloud session not open, fetch skipped");
                return None;
            }
            Err(e) => {
                warn!("Classify: fetch of recent readings failed ({})", e);
                return None;
            }
        };
        if features.is_empty() {
            debug!("Classify: no readings in the store yet");
            return None;
        }
        match self.classifier.classify(&features) {
            Ok(level) => {
                debug!("Classify: {} readings -> {}", features.len(), level);
                Some(level)
            }
            Err(e) => {
                warn!("Classify: classifier unavailable ({}), keeping local verdict", e);
                None
            }
        }
    }

    pub fn reconcile(&mut self, local: AlertState) -> AlertState {
        alert::reconcile(local, self.corroborate())
    }

    /// One pass: classify, then publish the classifier's verdict (or clear
    /// the slot when there is none).
    ///
    /// Returns the verdict reconciled against the local slot as seen now,
    /// or `None` (touching nothing) until the control cycle has produced
    /// its first verdict.
    pub fn run_pass(&mut self, handoff: &Handoff) -> Option<AlertState> {
        let Some(local) = handoff.local.latest() else {
            debug!("Classify: no local verdict yet, pass skipped");
            return None;
        };
        let remote = self.corroborate();
        match remote {
            Some(level) => handoff.remote.publish(AlertState::remote(level)),
            None => handoff.remote.clear(),
        }
        let reconciled = alert::reconcile(local, remote);
        if reconciled.level != local.level {
            warn!("Classify: classifier escalates local {} to {}", local.level, reconciled.level);
        }
        self.passes = self.passes.wrapping_add(1);
        Some(reconciled)
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }
}

/// Periodic task body.  Returns the bridge once a stop is requested.
pub async fn run<R: RecentReadingsPort, K: ClassifierPort>(
    mut bridge: ClassificationBridge<R, K>,
    handoff: &Handoff,
    period: Duration,
) -> ClassificationBridge<R, K> {
    info!("Classify: task started (period {}ms)", period.as_millis());
    loop {
        let stop = futures_lite::future::or(
            async {
                handoff.shutdown.wait().await;
                true
            },
            async {
                async_io_mini::Timer::after(period).await;
                false
            },
        )
        .await;
        if stop {
            break;
        }
        bridge.run_pass(handoff);
    }
    info!("Classify: task stopped after {} pass(es)", bridge.passes());
    bridge
}

/// Spawn the classification task in a dedicated thread pinned to Core 0
/// (PRO_CPU), next to the network stack it talks through.
pub fn spawn<R, K>(
    bridge: ClassificationBridge<R, K>,
    handoff: &'static Handoff,
    period: Duration,
) -> std::io::Result<std::thread::JoinHandle<()>>
where
    R: RecentReadingsPort + Send + 'static,
    K: ClassifierPort + Send + 'static,
{
    crate::drivers::task_pin::spawn_on_core(
        crate::drivers::task_pin::Core::Pro,
        5,
        16,
        "classify\0",
        move || {
            let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
            let task = executor.spawn(run(bridge, handoff, period));
            futures_lite::future::block_on(executor.run(task));
        },
    )
}
