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

//! A scheduler driven by a virtual clock. Nothing fires until [`ManualScheduler::advance`]
//! is called, which makes beat timing fully deterministic under test.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use super::{Callback, Scheduler, TimerHandle};

/// A timer waiting for the virtual clock to reach it.
struct PendingTimer {
    due: Duration,
    /// Insertion order, used to break ties between timers due at the same instant.
    seq: u64,
    handle: TimerHandle,
    callback: Callback,
}

/// A timer that has been taken off the queue but hasn't run yet. This is the window
/// in which a real timer has already been dispatched and cancelling it has no effect.
pub struct DispatchedTimer {
    due: Duration,
    handle: TimerHandle,
    callback: Callback,
}

impl DispatchedTimer {
    /// The virtual time at which the timer fired.
    pub fn due(&self) -> Duration {
        self.due
    }

    /// The handle of the timer.
    pub fn handle(&self) -> &TimerHandle {
        &self.handle
    }

    /// Runs the callback, whether or not the handle was cancelled in the meantime.
    pub fn run(self) {
        (self.callback)();
    }
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_seq: u64,
    timers: Vec<PendingTimer>,
    fired: Vec<Duration>,
}

/// A scheduler with a manually advanced clock.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    /// Creates a scheduler with its clock at zero.
    pub fn new() -> ManualScheduler {
        ManualScheduler::default()
    }

    /// The current virtual time.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// The number of timers that are scheduled and not cancelled.
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .timers
            .iter()
            .filter(|timer| !timer.handle.is_cancelled())
            .count()
    }

    /// The virtual time of the earliest live timer, if any.
    pub fn next_due(&self) -> Option<Duration> {
        self.state
            .lock()
            .timers
            .iter()
            .filter(|timer| !timer.handle.is_cancelled())
            .map(|timer| timer.due)
            .min()
    }

    /// The virtual times at which callbacks have run through [`ManualScheduler::advance`].
    pub fn fired(&self) -> Vec<Duration> {
        self.state.lock().fired.clone()
    }

    /// Takes the earliest live timer due at or before `now + by` off the queue and
    /// moves the clock to its due time. The callback is not run.
    pub fn dispatch_next(&self, by: Duration) -> Option<DispatchedTimer> {
        let mut state = self.state.lock();
        state.timers.retain(|timer| !timer.handle.is_cancelled());

        let limit = state.now + by;
        let index = state
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= limit)
            .min_by_key(|(_, timer)| (timer.due, timer.seq))
            .map(|(index, _)| index)?;

        let timer = state.timers.swap_remove(index);
        state.now = timer.due;
        Some(DispatchedTimer {
            due: timer.due,
            handle: timer.handle,
            callback: timer.callback,
        })
    }

    /// Moves the clock forward, running every timer that comes due on the way in
    /// order, including timers scheduled by callbacks along the way. Returns the
    /// number of callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut count = 0;

        loop {
            let remaining = target.saturating_sub(self.now());
            let Some(timer) = self.dispatch_next(remaining) else {
                break;
            };

            // The lock is released here, so the callback may schedule or cancel freely.
            trace!(timer = timer.handle.id(), due = ?timer.due, "Running timer");
            self.state.lock().fired.push(timer.due);
            timer.run();
            count += 1;
        }

        self.state.lock().now = target;
        count
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, callback: Callback) -> TimerHandle {
        let handle = TimerHandle::new();
        let mut state = self.state.lock();
        let due = state.now + delay;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.timers.push(PendingTimer {
            due,
            seq,
            handle: handle.clone(),
            callback,
        });
        handle
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now())
            .field("pending", &self.pending())
            .finish()
    }
}
