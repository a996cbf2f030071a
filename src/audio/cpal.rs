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
use std::{fmt, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info, span, Level};

use super::mixer::Mixer;
use super::{PlaybackError, DEFAULT_DEVICE};
use crate::config;
use crate::samples::DecodedSample;

/// A summary of an output device, for listing.
pub struct DeviceInfo {
    /// The name of the device.
    name: String,
    /// The maximum number of channels the device supports.
    max_channels: u16,
    /// The name of the host the device belongs to.
    host: String,
}

impl DeviceInfo {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name, self.max_channels, self.host
        )
    }
}

/// A playback device backed by a cpal output stream. Each play call hands a voice to
/// the stream's callback over a channel, so triggering never waits on the audio thread.
pub struct Device {
    /// The name of the device.
    name: String,
    /// Number of output channels.
    num_channels: u16,
    /// Sample rate of the output stream.
    sample_rate: u32,
    /// Channel for handing new voices to the audio callback.
    voice_tx: Sender<DecodedSample>,
    /// Keeps the output stream alive.
    _output_manager: OutputManager,
}

/// Owns the thread that owns the cpal stream. cpal streams can't move between
/// threads on every platform, so the stream is created and dropped on that thread.
struct OutputManager {
    /// Dropping this tells the output thread to shut down.
    shutdown_tx: Option<Sender<()>>,
    /// Handle to the output thread.
    output_thread: Option<thread::JoinHandle<()>>,
}

impl Drop for OutputManager {
    fn drop(&mut self) {
        self.shutdown_tx.take();
        if let Some(thread) = self.output_thread.take() {
            let _ = thread.join();
        }
    }
}

impl OutputManager {
    /// Starts the output thread and waits until the stream is playing.
    fn start(
        device: cpal::Device,
        stream_config: cpal::StreamConfig,
        sample_format: cpal::SampleFormat,
        mixer: Mixer,
        voice_rx: Receiver<DecodedSample>,
    ) -> Result<OutputManager, PlaybackError> {
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);

        let output_thread = thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let span = span!(Level::INFO, "audio output");
                let _enter = span.enter();

                let stream =
                    match build_stream(&device, &stream_config, sample_format, mixer, voice_rx) {
                        Ok(stream) => stream,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e.to_string()));
                            return;
                        }
                    };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
                info!("CPAL output stream started successfully");
                let _ = ready_tx.send(Ok(()));

                // Blocks until the shutdown sender is dropped.
                let _ = shutdown_rx.recv();
                info!("CPAL output stream stopped");
            })
            .map_err(|e| PlaybackError::Device(e.to_string()))?;

        let mut manager = OutputManager {
            shutdown_tx: Some(shutdown_tx),
            output_thread: Some(output_thread),
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(manager),
            Ok(Err(message)) => {
                if let Some(thread) = manager.output_thread.take() {
                    let _ = thread.join();
                }
                Err(PlaybackError::Device(message))
            }
            Err(_) => Err(PlaybackError::Closed),
        }
    }
}

/// Builds the output stream in whatever sample format the device wants.
fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    mixer: Mixer,
    voice_rx: Receiver<DecodedSample>,
) -> Result<cpal::Stream, cpal::BuildStreamError> {
    match sample_format {
        cpal::SampleFormat::F32 => build_typed_stream::<f32>(device, config, mixer, voice_rx),
        cpal::SampleFormat::I16 => build_typed_stream::<i16>(device, config, mixer, voice_rx),
        cpal::SampleFormat::I32 => build_typed_stream::<i32>(device, config, mixer, voice_rx),
        cpal::SampleFormat::U16 => build_typed_stream::<u16>(device, config, mixer, voice_rx),
        other => {
            error!(format = ?other, "Unsupported output sample format");
            Err(cpal::BuildStreamError::StreamConfigNotSupported)
        }
    }
}

fn build_typed_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut mixer: Mixer,
    voice_rx: Receiver<DecodedSample>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            while let Ok(sample) = voice_rx.try_recv() {
                mixer.add(sample);
            }

            // Only allocates when the host hands us a larger buffer than before.
            scratch.resize(data.len(), 0.0);
            mixer.process_into_output(&mut scratch);
            for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
                *dst = T::from_sample(src);
            }
        },
        |err| error!("CPAL output stream error: {}", err),
        None,
    )
}

#[allow(deprecated)]
fn device_name(device: &cpal::Device) -> String {
    device
        .name()
        .unwrap_or_else(|_| "unreadable device name".to_string())
}

fn device_error(e: impl fmt::Display) -> PlaybackError {
    PlaybackError::Device(e.to_string())
}

impl Device {
    /// Lists output devices across all available hosts.
    pub fn list() -> Result<Vec<DeviceInfo>, PlaybackError> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout().map_err(device_error)?;
        let _shh_stderr = shh::stderr().map_err(device_error)?;

        let mut devices: Vec<DeviceInfo> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host = cpal::host_from_id(host_id).map_err(device_error)?;
            let host_devices = match host.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let max_channels = match device.supported_output_configs() {
                    Ok(configs) => configs.map(|config| config.channels()).max().unwrap_or(0),
                    Err(_) => continue,
                };

                if max_channels > 0 {
                    devices.push(DeviceInfo {
                        name: device_name(&device),
                        max_channels,
                        host: host_id.name().to_string(),
                    });
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Opens the configured device and starts its output stream.
    pub fn get(config: &config::Audio) -> Result<Device, PlaybackError> {
        let device = Device::find(config.device())?;
        let name = device_name(&device);

        let supported = match config.sample_rate() {
            None => device.default_output_config().map_err(device_error)?,
            Some(rate) => device
                .supported_output_configs()
                .map_err(device_error)?
                .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
                .max_by_key(|range| {
                    (
                        range.sample_format() == cpal::SampleFormat::F32,
                        range.channels(),
                    )
                })
                .map(|range| range.with_sample_rate(rate))
                .ok_or_else(|| {
                    PlaybackError::Device(format!("{} does not support {} Hz", name, rate))
                })?,
        };

        let sample_format = supported.sample_format();
        let stream_config: cpal::StreamConfig = supported.into();
        let num_channels = stream_config.channels;
        let sample_rate = stream_config.sample_rate;

        let (voice_tx, voice_rx) = crossbeam_channel::unbounded();
        let mixer = Mixer::new(num_channels, config.max_voices());
        let output_manager =
            OutputManager::start(device, stream_config, sample_format, mixer, voice_rx)?;

        info!(
            device = name,
            channels = num_channels,
            sample_rate,
            "Audio device opened"
        );

        Ok(Device {
            name,
            num_channels,
            sample_rate,
            voice_tx,
            _output_manager: output_manager,
        })
    }

    /// Finds a cpal output device by name. "default" picks the host default.
    fn find(name: &str) -> Result<cpal::Device, PlaybackError> {
        if name == DEFAULT_DEVICE {
            return cpal::default_host()
                .default_output_device()
                .ok_or_else(|| PlaybackError::NotFound(name.to_string()));
        }

        for host_id in cpal::available_hosts() {
            let host = cpal::host_from_id(host_id).map_err(device_error)?;
            let Ok(devices) = host.output_devices() else {
                continue;
            };
            if let Some(device) = devices.into_iter().find(|d| device_name(d).trim() == name) {
                return Ok(device);
            }
        }

        Err(PlaybackError::NotFound(name.to_string()))
    }
}

impl crate::audio::Device for Device {
    fn play(&self, sample: &DecodedSample) -> Result<(), PlaybackError> {
        self.voice_tx
            .send(sample.clone())
            .map_err(|_| PlaybackError::Closed)
    }

    fn sample_rate(&self) -> Option<u32> {
        Some(self.sample_rate)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}, {} Hz)",
            self.name, self.num_channels, self.sample_rate
        )
    }
}
