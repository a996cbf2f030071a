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

//! A scheduler backed by the tokio timer wheel.

use std::time::Duration;

use tokio::runtime::{Handle, TryCurrentError};
use tracing::trace;

use super::{Callback, Scheduler, TimerHandle};

/// Schedules callbacks as tasks on a tokio runtime. Timer resolution is whatever the
/// runtime offers (roughly a millisecond), which is plenty for an audible pulse.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Creates a scheduler that spawns onto the given runtime.
    pub fn new(runtime: Handle) -> TokioScheduler {
        TokioScheduler { runtime }
    }

    /// Creates a scheduler for the runtime the caller is running on.
    pub fn current() -> Result<TokioScheduler, TryCurrentError> {
        Ok(TokioScheduler::new(Handle::try_current()?))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, callback: Callback) -> TimerHandle {
        let handle = TimerHandle::new();
        let cancel_handle = handle.cancel_handle().clone();
        let id = handle.id();

        self.runtime.spawn(async move {
            tokio::select! {
                _ = cancel_handle.cancelled() => {
                    trace!(timer = id, "Timer cancelled before firing");
                }
                _ = tokio::time::sleep(delay) => {
                    if cancel_handle.is_cancelled() {
                        trace!(timer = id, "Timer cancelled while firing");
                    } else {
                        callback();
                    }
                }
            }
        });

        handle
    }
}
