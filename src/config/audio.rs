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
use serde::Deserialize;

use crate::audio::{mixer::DEFAULT_MAX_VOICES, DEFAULT_DEVICE};

fn default_device() -> String {
    DEFAULT_DEVICE.to_string()
}

/// A YAML representation of the audio configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct Audio {
    /// The audio device. "default" picks the host's default output.
    #[serde(default = "default_device")]
    device: String,

    /// Output sample rate in Hz. The device's default when unset.
    sample_rate: Option<u32>,

    /// How many clicks may sound at once before the oldest is cut off.
    max_voices: Option<usize>,
}

impl Audio {
    /// New will create a new Audio configuration.
    pub fn new(device: &str) -> Audio {
        Audio {
            device: device.to_string(),
            sample_rate: None,
            max_voices: None,
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn set_device(&mut self, device: &str) {
        self.device = device.to_string();
    }

    /// Returns the requested sample rate, if any.
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// Returns the voice limit, never less than one.
    pub fn max_voices(&self) -> usize {
        self.max_voices.unwrap_or(DEFAULT_MAX_VOICES).max(1)
    }
}

impl Default for Audio {
    fn default() -> Audio {
        Audio::new(DEFAULT_DEVICE)
    }
}
