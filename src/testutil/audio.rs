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
use std::{error::Error, fs::File, path::Path};

use hound::{SampleFormat, WavSpec, WavWriter};

/// Writes a 32-bit float WAV file with one Vec per channel. Frames are interleaved
/// on the way out, so every channel must be the same length.
pub fn write_wav(
    path: impl AsRef<Path>,
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
) -> Result<(), Box<dyn Error>> {
    let num_channels = channels.len();
    if num_channels == 0 || num_channels > u16::MAX.into() {
        return Err(format!("unsupported channel count {}", num_channels).into());
    }
    let frames = channels[0].len();
    if channels.iter().any(|channel| channel.len() != frames) {
        return Err("channels must all be the same length".into());
    }

    let mut writer = WavWriter::new(
        File::create(path)?,
        WavSpec {
            channels: num_channels as u16,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        },
    )?;

    for frame in 0..frames {
        for channel in channels.iter() {
            writer.write_sample(channel[frame])?;
        }
    }
    writer.finalize()?;

    Ok(())
}

/// A mono sine tone, handy as a stand-in click.
pub fn sine_wave(frequency: f32, sample_rate: u32, frames: usize) -> Vec<f32> {
    (0..frames)
        .map(|i| {
            0.5 * (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin()
        })
        .collect()
}
