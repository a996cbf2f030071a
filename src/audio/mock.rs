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
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::debug;

use super::PlaybackError;
use crate::samples::DecodedSample;

/// A mock device. Doesn't actually play anything, but remembers what it was asked to play.
#[derive(Clone)]
pub struct Device {
    name: String,
    played: Arc<Mutex<Vec<DecodedSample>>>,
    failing: Arc<AtomicBool>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            played: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Every sample played so far, in order.
    pub fn played(&self) -> Vec<DecodedSample> {
        self.played.lock().clone()
    }

    /// The number of play calls that succeeded.
    pub fn play_count(&self) -> usize {
        self.played.lock().len()
    }

    /// Makes subsequent play calls fail, as a disconnected device would.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }
}

impl crate::audio::Device for Device {
    fn play(&self, sample: &DecodedSample) -> Result<(), PlaybackError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(PlaybackError::Closed);
        }

        debug!(device = self.name, frames = sample.frames(), "Playing sample (mock)");
        self.played.lock().push(sample.clone());
        Ok(())
    }

    fn sample_rate(&self) -> Option<u32> {
        None
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
