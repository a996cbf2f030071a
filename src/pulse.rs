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

//! The timed pulse engine.
//!
//! The engine owns the tempo and the run state. While running it fires a beat,
//! asks the [`Trigger`] to make a sound, and schedules itself one beat period later.
//! The period is read from the tempo at the moment each tick fires, so a tempo change
//! takes effect from the next tick that gets scheduled, never on the one in flight.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::scheduler::{Scheduler, TimerHandle};
use crate::tempo::Tempo;


/// Something that makes a sound once per beat. Implementations must return
/// promptly and must swallow their own failures: a missed beat is fine, a stalled
/// pulse train is not.
pub trait Trigger: Send + Sync {
    fn trigger_once(&self);
}

/// Whether the pulse train is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

struct EngineState {
    tempo: Tempo,
    run_state: RunState,
    /// Bumped on every start, so ticks left over from a previous run can tell
    /// they're stale even if the engine has been restarted since.
    generation: u64,
    /// The one outstanding timer while running.
    pending: Option<TimerHandle>,
}

struct EngineInner {
    state: Mutex<EngineState>,
    scheduler: Arc<dyn Scheduler>,
    trigger: Arc<dyn Trigger>,
}

/// Produces a pulse at the configured tempo. Cloning is cheap and every clone
/// controls the same engine.
#[derive(Clone)]
pub struct PulseEngine {
    inner: Arc<EngineInner>,
}

impl PulseEngine {
    /// Creates a stopped engine at the default tempo.
    pub fn new(scheduler: Arc<dyn Scheduler>, trigger: Arc<dyn Trigger>) -> PulseEngine {
        PulseEngine::with_tempo(scheduler, trigger, Tempo::default())
    }

    /// Creates a stopped engine at the given tempo.
    pub fn with_tempo(
        scheduler: Arc<dyn Scheduler>,
        trigger: Arc<dyn Trigger>,
        tempo: Tempo,
    ) -> PulseEngine {
        PulseEngine {
            inner: Arc::new(EngineInner {
                state: Mutex::new(EngineState {
                    tempo,
                    run_state: RunState::Stopped,
                    generation: 0,
                    pending: None,
                }),
                scheduler,
                trigger,
            }),
        }
    }

    /// Sets the tempo, clamping it into range. A tick that is already scheduled keeps
    /// its original delay; the new period applies from the following tick on.
    pub fn set_bpm(&self, bpm: i64) {
        self.set_tempo(Tempo::clamped(bpm));
    }

    /// Sets the tempo from user-entered text. Text that isn't a number sets the
    /// slowest tempo.
    pub fn set_bpm_text(&self, text: &str) {
        self.set_tempo(Tempo::from_text(text));
    }

    /// Sets the tempo.
    pub fn set_tempo(&self, tempo: Tempo) {
        let mut state = self.inner.state.lock();
        if state.tempo != tempo {
            info!(bpm = tempo.bpm(), previous = state.tempo.bpm(), "Tempo changed");
        }
        state.tempo = tempo;
    }

    /// The current tempo in beats per minute.
    pub fn bpm(&self) -> u32 {
        self.inner.state.lock().tempo.bpm()
    }

    pub fn tempo(&self) -> Tempo {
        self.inner.state.lock().tempo
    }

    /// The beat period at the current tempo.
    pub fn period(&self) -> Duration {
        self.inner.state.lock().tempo.period()
    }

    /// Speeds up by one beat per minute, up to the maximum.
    pub fn increment(&self) {
        let mut state = self.inner.state.lock();
        state.tempo = state.tempo.incremented();
        debug!(bpm = state.tempo.bpm(), "Tempo incremented");
    }

    /// Slows down by one beat per minute, down to the minimum.
    pub fn decrement(&self) {
        let mut state = self.inner.state.lock();
        state.tempo = state.tempo.decremented();
        debug!(bpm = state.tempo.bpm(), "Tempo decremented");
    }

    /// Returns true while the pulse train is running.
    pub fn is_running(&self) -> bool {
        self.run_state() == RunState::Running
    }

    pub fn run_state(&self) -> RunState {
        self.inner.state.lock().run_state
    }

    /// Starts the pulse train. The first beat fires before this returns. Does nothing
    /// if the engine is already running.
    pub fn start(&self) {
        let generation = {
            let mut state = self.inner.state.lock();
            if state.run_state == RunState::Running {
                debug!("Start requested while already running");
                return;
            }
            state.run_state = RunState::Running;
            state.generation += 1;
            info!(bpm = state.tempo.bpm(), "Metronome started");
            state.generation
        };

        EngineInner::tick(&self.inner, generation);
    }

    /// Stops the pulse train and cancels the pending tick. Does nothing if the engine
    /// is already stopped.
    pub fn stop(&self) {
        let pending = {
            let mut state = self.inner.state.lock();
            if state.run_state == RunState::Stopped {
                debug!("Stop requested while already stopped");
                return;
            }
            state.run_state = RunState::Stopped;
            info!("Metronome stopped");
            state.pending.take()
        };

        if let Some(handle) = pending {
            self.inner.scheduler.cancel(&handle);
        }
    }

    /// Starts the engine if it's stopped, stops it if it's running.
    pub fn toggle(&self) {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
    }
}

impl EngineInner {
    /// One beat. Checks the run state as the tick executes rather than when it was
    /// scheduled, so a stop that lands after the timer fired still wins.
    fn tick(inner: &Arc<EngineInner>, generation: u64) {
        if !inner.is_current(generation) {
            trace!(generation, "Stale tick ignored");
            return;
        }

        // Never hold the state lock while making noise.
        inner.trigger.trigger_once();

        let mut state = inner.state.lock();
        if state.run_state != RunState::Running || state.generation != generation {
            trace!(generation, "Stopped during tick, not rescheduling");
            return;
        }

        let delay = state.tempo.period();
        let weak: Weak<EngineInner> = Arc::downgrade(inner);
        let handle = inner.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    EngineInner::tick(&inner, generation);
                }
            }),
        );
        trace!(timer = handle.id(), delay_ms = delay.as_millis(), "Next tick scheduled");
        state.pending = Some(handle);
    }

    fn is_current(&self, generation: u64) -> bool {
        let state = self.state.lock();
        state.run_state == RunState::Running && state.generation == generation
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if let Some(handle) = self.state.get_mut().pending.take() {
            self.scheduler.cancel(&handle);
        }
    }
}

impl fmt::Debug for PulseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PulseEngine")
            .field("bpm", &state.tempo.bpm())
            .field("run_state", &state.run_state)
            .field("pending", &state.pending)
            .finish()
    }
}
