//! Cross-cadence handoff between the control cycle and the classification task.
//!
//! ```text
//!  control cycle ──local──▶ Slot ──▶ classification task
//!  control cycle ◀──remote─── Slot ◀── classification task
//!  cloud client ──token──▶ SharedToken ──▶ history reader
//! ```
//!
//! Each [`Slot`] keeps only the most recent value: last write wins, reads do
//! not consume, there is no queue and no backpressure.  [`Shutdown`] is the
//! explicit stop signal for both loops.

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::CriticalSectionMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::alert::AlertState;

/// Single-value, last-write-wins holder.
pub struct Slot<T: Copy> {
    inner: CriticalSectionMutex<Cell<Option<T>>>,
}

impl<T: Copy> Slot<T> {
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionMutex::new(Cell::new(None)),
        }
    }

    /// Replace whatever the slot holds.
    pub fn publish(&self, value: T) {
        self.inner.lock(|cell| cell.set(Some(value)));
    }

    /// Most recent value, if any has been published.  Non-consuming.
    pub fn latest(&self) -> Option<T> {
        self.inner.lock(Cell::get)
    }

    pub fn clear(&self) {
        self.inner.lock(|cell| cell.set(None));
    }
}

impl<T: Copy> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicit termination request shared by both cadences.
pub struct Shutdown {
    requested: AtomicBool,
    signal: Signal<CriticalSectionRawMutex, ()>,
}

impl Shutdown {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            signal: Signal::new(),
        }
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        self.signal.signal(());
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Resolves once [`request`](Self::request) has been called.
    pub async fn wait(&self) {
        while !self.is_requested() {
            self.signal.wait().await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// The cloud session token, lent by its single owner to readers on the
/// other core.
///
/// Only the owner sets it.  A reader that sees the token refused calls
/// [`revoke`](Self::revoke), which the owner observes on its next tick.
pub struct SharedToken {
    inner: CriticalSectionMutex<RefCell<Option<String>>>,
}

impl SharedToken {
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionMutex::new(RefCell::new(None)),
        }
    }

    pub fn set(&self, token: &str) {
        self.inner.lock(|cell| *cell.borrow_mut() = Some(token.to_string()));
    }

    pub fn clear(&self) {
        self.inner.lock(|cell| *cell.borrow_mut() = None);
    }

    /// Copy of the current token, if a session is open.
    pub fn get(&self) -> Option<String> {
        self.inner.lock(|cell| cell.borrow().clone())
    }

    pub fn is_set(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().is_some())
    }

    /// Drop `token` if it is still the current one.  A token replaced in
    /// the meantime is left alone.
    pub fn revoke(&self, token: &str) {
        self.inner.lock(|cell| {
            let mut current = cell.borrow_mut();
            if current.as_deref() == Some(token) {
                *current = None;
            }
        });
    }
}

impl Default for SharedToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the two cadences share.  Lives in a `static`.
pub struct Handoff {
    /// Latest local-threshold verdict (written by the control cycle).
    pub local: Slot<AlertState>,
    /// Latest classifier verdict (written by the classification task).
    /// Empty when the last pass had no usable verdict.
    pub remote: Slot<AlertState>,
    /// Cloud session token, owned by the control side's cloud client.
    pub session: SharedToken,
    pub shutdown: Shutdown,
}

impl Handoff {
    pub const fn new() -> Self {
        Self {
            local: Slot::new(),
            remote: Slot::new(),
            session: SharedToken::new(),
            shutdown: Shutdown::new(),
        }
    }
}

impl Default for Handoff {
    fn default() -> Self {
        Self::new()
    }
}
