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
use std::{fmt, sync::Arc};

use crate::config;
use crate::samples::DecodedSample;

pub mod cpal;
pub mod mixer;
pub mod mock;

/// The name that selects the host's default output device.
pub const DEFAULT_DEVICE: &str = "default";

/// Errors raised by playback devices.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// The device's output stream has gone away.
    #[error("audio output is closed")]
    Closed,

    #[error("no output device found with name {0}")]
    NotFound(String),

    #[error("audio device error: {0}")]
    Device(String),
}

/// Something that can play decoded samples.
pub trait Device: fmt::Display + Send + Sync {
    /// Starts an independent playback of the sample from its beginning. Must not
    /// block: earlier playbacks keep sounding underneath the new one.
    fn play(&self, sample: &DecodedSample) -> Result<(), PlaybackError>;

    /// The rate the device plays at, if it has one. Samples are resampled to it.
    fn sample_rate(&self) -> Option<u32>;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<cpal::DeviceInfo>, PlaybackError> {
    cpal::Device::list()
}

/// Gets the device for the given configuration.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Device>, PlaybackError> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device)));
    };

    Ok(Arc::new(cpal::Device::get(config)?))
}
