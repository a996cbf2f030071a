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
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, span, warn, Level};

use super::catalog::{Catalog, SoundEntry};
use super::error::SampleError;
use super::loader::{DecodedSample, SampleLoader};
use crate::audio::Device;
use crate::pulse::Trigger;

/// A catalog entry and, once decoding finishes, its buffer. The buffer is written at
/// most once and never cleared.
struct SoundSlot {
    entry: SoundEntry,
    buffer: OnceLock<DecodedSample>,
}

impl SoundSlot {
    fn name(&self) -> &str {
        self.entry.name()
    }
}

/// Owns the decoded sounds and the current selection, and plays the selection on
/// demand.
pub struct SampleLibrary {
    catalog: Catalog,
    slots: HashMap<String, Arc<SoundSlot>>,
    /// The currently selected sound. Changing it never waits on decoding.
    current: RwLock<Arc<SoundSlot>>,
    device: Arc<dyn Device>,
    initialized: AtomicBool,
}

impl SampleLibrary {
    /// Creates a library for the catalog that plays through the given device. The
    /// catalog's default sound starts out selected. Nothing is decoded until
    /// [`SampleLibrary::initialize`] is called.
    pub fn new(catalog: Catalog, device: Arc<dyn Device>) -> Result<SampleLibrary, SampleError> {
        let slots: HashMap<String, Arc<SoundSlot>> = catalog
            .entries()
            .iter()
            .map(|entry| {
                (
                    entry.name().to_string(),
                    Arc::new(SoundSlot {
                        entry: entry.clone(),
                        buffer: OnceLock::new(),
                    }),
                )
            })
            .collect();

        let current = slots
            .get(catalog.default_sound())
            .cloned()
            .ok_or_else(|| SampleError::UnknownSound(catalog.default_sound().to_string()))?;

        Ok(SampleLibrary {
            catalog,
            slots,
            current: RwLock::new(current),
            device,
            initialized: AtomicBool::new(false),
        })
    }

    /// Starts fetching and decoding every catalog entry, each as its own blocking task
    /// on the current tokio runtime. A failed entry is logged and stays unloaded; it
    /// doesn't affect the others. Returns the task handles in catalog order so callers
    /// can wait for loading to finish if they care to.
    pub fn initialize(&self, loader: SampleLoader) -> Result<Vec<JoinHandle<()>>, SampleError> {
        let runtime = Handle::try_current()?;
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(SampleError::AlreadyInitialized);
        }

        info!(sounds = self.catalog.len(), "Loading sounds");
        let handles = self
            .catalog
            .entries()
            .iter()
            .filter_map(|entry| self.slots.get(entry.name()).cloned())
            .map(|slot| {
                let loader = loader.clone();
                runtime.spawn_blocking(move || Self::decode_into(&loader, &slot))
            })
            .collect();

        Ok(handles)
    }

    fn decode_into(loader: &SampleLoader, slot: &SoundSlot) {
        let span = span!(Level::INFO, "decode", sound = slot.name());
        let _enter = span.enter();

        match loader.load(&slot.entry) {
            Ok(sample) => {
                if slot.buffer.set(sample).is_err() {
                    debug!("Sound was already decoded, keeping the first buffer");
                }
            }
            Err(e) => warn!(
                err = e.to_string(),
                locator = slot.entry.locator(),
                "Unable to load sound, it will stay silent"
            ),
        }
    }

    /// Selects the sound to play on each beat. An unknown name leaves the selection
    /// alone. The sound doesn't need to be decoded yet.
    pub fn select(&self, name: &str) -> Result<(), SampleError> {
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| SampleError::UnknownSound(name.to_string()))?;

        *self.current.write() = slot.clone();
        info!(sound = name, loaded = slot.buffer.get().is_some(), "Sound selected");
        Ok(())
    }

    /// The name of the selected sound.
    pub fn current_name(&self) -> String {
        self.current.read().name().to_string()
    }

    /// Plays the selected sound once from the start. Does nothing if the sound hasn't
    /// finished decoding, and playback failures are only logged: a skipped beat is
    /// better than a broken pulse.
    pub fn trigger_once(&self) {
        let slot = self.current.read().clone();
        let Some(sample) = slot.buffer.get() else {
            debug!(sound = slot.name(), "Sound not loaded, skipping beat");
            return;
        };

        if let Err(e) = self.device.play(sample) {
            warn!(err = e.to_string(), sound = slot.name(), "Unable to play sound");
        }
    }

    /// Selects a sound and plays it once so it can be heard before starting.
    pub fn preview(&self, name: &str) -> Result<(), SampleError> {
        self.select(name)?;
        self.trigger_once();
        Ok(())
    }

    /// Sound names in catalog order.
    pub fn names(&self) -> Vec<String> {
        self.catalog.names().map(str::to_string).collect()
    }

    /// Whether the named sound has finished decoding.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.slots
            .get(name)
            .is_some_and(|slot| slot.buffer.get().is_some())
    }

    /// The number of sounds that have finished decoding.
    pub fn loaded_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| slot.buffer.get().is_some())
            .count()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }
}

impl Trigger for SampleLibrary {
    fn trigger_once(&self) {
        SampleLibrary::trigger_once(self)
    }
}

impl fmt::Debug for SampleLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleLibrary")
            .field("current", &self.current_name())
            .field("sounds", &self.catalog.len())
            .field("loaded", &self.loaded_count())
            .field("device", &self.device.to_string())
            .finish()
    }
}
