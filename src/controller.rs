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
use std::io;
use std::sync::Arc;

use tokio::sync::mpsc::{self, Sender};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, span, Instrument, Level};

use crate::pulse::PulseEngine;
use crate::samples::{SampleError, SampleLibrary};

pub mod keyboard;

/// Controller events that will trigger behavior in the metronome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Starts the pulse if stopped, stops it if running.
    Toggle,

    /// Starts the pulse. Does nothing if already running.
    Start,

    /// Stops the pulse. Does nothing if already stopped.
    Stop,

    /// Speeds up by one BPM.
    Increment,

    /// Slows down by one BPM.
    Decrement,

    /// Sets the tempo from user text. Anything that isn't a number is the slowest tempo.
    SetBpm(String),

    /// Selects a sound by name. While stopped, the sound is also played once.
    Select(String),

    /// Logs every sound and whether it has loaded.
    ListSounds,

    /// Logs the tempo, run state and selected sound.
    Status,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Feeds events from a driver to the pulse engine and sample library.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(
        engine: PulseEngine,
        library: Arc<SampleLibrary>,
        driver: Arc<dyn Driver>,
    ) -> Controller {
        let span = span!(Level::INFO, "controller");
        Controller {
            handle: tokio::spawn(
                Controller::trigger_events(engine, library, driver).instrument(span),
            ),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Applies events from the driver until it closes, then stops the pulse.
    async fn trigger_events(
        engine: PulseEngine,
        library: Arc<SampleLibrary>,
        driver: Arc<dyn Driver>,
    ) {
        let (events_tx, mut events_rx) = mpsc::channel(1);
        let join_handle = driver.monitor_events(events_tx);

        info!(
            bpm = engine.bpm(),
            sound = library.current_name(),
            "Controller started."
        );

        while let Some(event) = events_rx.recv().await {
            info!(event = ?event, "Received event.");
            if let Err(e) = handle_event(&engine, &library, event) {
                error!("Error handling event: {}", e);
            }
        }

        info!("Controller closing.");
        engine.stop();
        match join_handle.await {
            Ok(Err(e)) => error!("Event monitor failed: {}", e),
            Err(e) => error!("Error waiting for event monitor to stop: {}", e),
            Ok(Ok(())) => {}
        }
    }
}

/// Applies a single event.
pub fn handle_event(
    engine: &PulseEngine,
    library: &SampleLibrary,
    event: Event,
) -> Result<(), SampleError> {
    match event {
        Event::Toggle => engine.toggle(),
        Event::Start => engine.start(),
        Event::Stop => engine.stop(),
        Event::Increment => engine.increment(),
        Event::Decrement => engine.decrement(),
        Event::SetBpm(text) => engine.set_bpm_text(&text),
        Event::Select(name) => {
            if engine.is_running() {
                library.select(&name)?
            } else {
                library.preview(&name)?
            }
        }
        Event::ListSounds => {
            let current = library.current_name();
            for name in library.names() {
                info!(
                    loaded = library.is_loaded(&name),
                    selected = name == current,
                    "Sound: {}",
                    name
                );
            }
        }
        Event::Status => info!(
            bpm = engine.bpm(),
            running = engine.is_running(),
            sound = library.current_name(),
            loaded = library.loaded_count(),
            sounds = library.names().len(),
            "Status"
        ),
    }
    Ok(())
}
