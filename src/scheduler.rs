// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! One-shot delayed callbacks.
//!
//! The pulse engine never sleeps itself. It hands a callback and a delay to a
//! [`Scheduler`] and keeps the returned [`TimerHandle`] so it can cancel the callback
//! later. Cancelling is a request: a callback that has already been dispatched will
//! still run, so callbacks must re-check their own state when they execute.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::playsync::CancelHandle;

pub mod mock;
pub mod tokio;

pub use self::mock::ManualScheduler;
pub use self::tokio::TokioScheduler;

/// Global timer ID counter.
static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Work to run once a timer elapses.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// A source of delayed one-shot callbacks.
pub trait Scheduler: Send + Sync {
    /// Runs the callback once after the given delay, unless the returned handle is
    /// cancelled first. Must not block and must not run the callback inline.
    fn schedule(&self, delay: Duration, callback: Callback) -> TimerHandle;

    /// Cancels a pending callback. Cancelling twice, or cancelling a timer that has
    /// already fired, does nothing.
    fn cancel(&self, handle: &TimerHandle) {
        handle.cancel();
    }
}

/// Identifies a scheduled callback so that it can be cancelled.
#[derive(Clone)]
pub struct TimerHandle {
    id: u64,
    cancel_handle: CancelHandle,
}

impl TimerHandle {
    /// Creates a new, uncancelled timer handle.
    pub fn new() -> TimerHandle {
        TimerHandle {
            id: NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed),
            cancel_handle: CancelHandle::new(),
        }
    }

    /// The unique ID of this timer.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns true if the timer has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_handle.is_cancelled()
    }

    /// The cancel handle backing this timer.
    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel_handle
    }

    fn cancel(&self) {
        self.cancel_handle.cancel();
    }
}

impl Default for TimerHandle {
    fn default() -> Self {
        TimerHandle::new()
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
