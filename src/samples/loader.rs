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

//! Fetching and decoding of sounds.
//!
//! Sounds are decoded entirely into memory so that triggering one never touches the
//! disk or a decoder. Fetching raw bytes and decoding them are separate steps so that
//! either can be swapped out independently.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

use super::catalog::SoundEntry;
use super::error::SampleError;

/// A decoded sound that can be played back.
/// The sample data is stored in an Arc so that every voice playing it shares one copy.
#[derive(Clone)]
pub struct DecodedSample {
    /// The sample data as f32 samples (interleaved if multi-channel).
    data: Arc<Vec<f32>>,
    /// Number of channels in the sample.
    channel_count: u16,
    /// Sample rate of the audio data.
    sample_rate: u32,
}

impl DecodedSample {
    /// Creates a decoded sample from interleaved f32 data.
    pub fn new(data: Vec<f32>, channel_count: u16, sample_rate: u32) -> DecodedSample {
        DecodedSample {
            data: Arc::new(data),
            channel_count: channel_count.max(1),
            sample_rate,
        }
    }

    /// The interleaved sample data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the number of channels.
    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.data.len() / self.channel_count as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Returns true if both samples share the same underlying buffer.
    pub fn same_buffer(&self, other: &DecodedSample) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for DecodedSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedSample")
            .field("channels", &self.channel_count)
            .field("sample_rate", &self.sample_rate)
            .field("frames", &self.frames())
            .finish()
    }
}

/// Fetches the raw bytes of a sound.
pub trait Fetch: Send + Sync {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, SampleError>;
}

/// Turns raw bytes into a playable buffer.
pub trait Decode: Send + Sync {
    fn decode(&self, locator: &str, bytes: Vec<u8>) -> Result<DecodedSample, SampleError>;
}

/// Fetches sounds from the local filesystem.
#[derive(Clone, Debug)]
pub struct FileFetcher {
    /// Base path for resolving relative locators.
    base_path: PathBuf,
}

impl FileFetcher {
    pub fn new(base_path: impl Into<PathBuf>) -> FileFetcher {
        FileFetcher {
            base_path: base_path.into(),
        }
    }

    /// Resolves a locator against the base path. Absolute locators are left alone.
    pub fn resolve(&self, locator: &str) -> PathBuf {
        if Path::new(locator).is_absolute() {
            PathBuf::from(locator)
        } else {
            self.base_path.join(locator)
        }
    }
}

impl Fetch for FileFetcher {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, SampleError> {
        let path = self.resolve(locator);
        debug!(path = ?path, "Reading sound file");
        std::fs::read(&path).map_err(|source| SampleError::Fetch {
            locator: path.display().to_string(),
            source,
        })
    }
}

/// Decodes WAV, FLAC, MP3 and anything else symphonia understands, resampling to the
/// output rate when one is given.
#[derive(Clone, Debug, Default)]
pub struct SymphoniaDecoder {
    /// Target sample rate for transcoding (matches audio output).
    target_sample_rate: Option<u32>,
}

impl SymphoniaDecoder {
    /// Creates a decoder. With no target rate, samples keep their native rate.
    pub fn new(target_sample_rate: Option<u32>) -> SymphoniaDecoder {
        SymphoniaDecoder { target_sample_rate }
    }

    fn decode_error(locator: &str, error: impl fmt::Display) -> SampleError {
        SampleError::Decode {
            locator: locator.to_string(),
            message: error.to_string(),
        }
    }
}

impl Decode for SymphoniaDecoder {
    fn decode(&self, locator: &str, bytes: Vec<u8>) -> Result<DecodedSample, SampleError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        // Create a hint to help the format registry guess the format
        let mut hint = Hint::new();
        if let Some(extension) = Path::new(locator).extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Self::decode_error(locator, e))?;
        let mut format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Self::decode_error(locator, "no audio track found"))?;
        let track_id = track.id;
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Self::decode_error(locator, e))?;

        let mut samples: Vec<f32> = Vec::new();
        let mut channel_count: u16 = 0;
        let mut sample_rate: u32 = track.codec_params.sample_rate.unwrap_or(0);
        let mut buffer: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => return Err(Self::decode_error(locator, e)),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // A corrupt packet in a short one-shot isn't worth failing the whole sound.
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!(locator, error = e, "Skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(Self::decode_error(locator, e)),
            };

            let spec = *decoded.spec();
            channel_count = spec.channels.count() as u16;
            sample_rate = spec.rate;

            let buffer = buffer.get_or_insert_with(|| {
                SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)
            });
            if buffer.capacity() < decoded.capacity() * spec.channels.count() {
                *buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            }
            buffer.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buffer.samples());
        }

        if channel_count == 0 || sample_rate == 0 || samples.is_empty() {
            return Err(Self::decode_error(locator, "no audio data decoded"));
        }

        // Transcode if sample rate doesn't match
        match self.target_sample_rate {
            Some(target_rate) if target_rate != sample_rate => {
                debug!(
                    locator,
                    source_rate = sample_rate,
                    target_rate,
                    "Transcoding sample"
                );
                let transcoded =
                    transcode_samples(&samples, channel_count, sample_rate, target_rate);
                Ok(DecodedSample::new(transcoded, channel_count, target_rate))
            }
            _ => Ok(DecodedSample::new(samples, channel_count, sample_rate)),
        }
    }
}

/// Fetches and decodes catalog entries.
#[derive(Clone)]
pub struct SampleLoader {
    fetcher: Arc<dyn Fetch>,
    decoder: Arc<dyn Decode>,
}

impl SampleLoader {
    /// Creates a loader from a fetch and a decode step.
    pub fn new(fetcher: Arc<dyn Fetch>, decoder: Arc<dyn Decode>) -> SampleLoader {
        SampleLoader { fetcher, decoder }
    }

    /// Creates a loader that reads files under `base_path` and decodes them with
    /// symphonia at the given output rate.
    pub fn from_files(
        base_path: impl Into<PathBuf>,
        target_sample_rate: Option<u32>,
    ) -> SampleLoader {
        SampleLoader::new(
            Arc::new(FileFetcher::new(base_path)),
            Arc::new(SymphoniaDecoder::new(target_sample_rate)),
        )
    }

    /// Fetches and decodes a single entry. This blocks; run it off the timing path.
    pub fn load(&self, entry: &SoundEntry) -> Result<DecodedSample, SampleError> {
        let start = Instant::now();
        let bytes = self.fetcher.fetch(entry.locator())?;
        let loaded = self.decoder.decode(entry.locator(), bytes)?;

        info!(
            sound = entry.name(),
            channels = loaded.channel_count(),
            sample_rate = loaded.sample_rate(),
            duration_ms = loaded.duration().as_millis(),
            memory_kb = loaded.memory_size() / 1024,
            elapsed_ms = start.elapsed().as_millis(),
            "Sound loaded"
        );

        Ok(loaded)
    }
}

impl fmt::Debug for SampleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleLoader").finish_non_exhaustive()
    }
}

/// Transcodes samples from one sample rate to another using linear interpolation.
/// Linear interpolation is plenty for clicks and other short one-shots.
pub(crate) fn transcode_samples(
    samples: &[f32],
    channel_count: u16,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    let ratio = target_rate as f64 / source_rate as f64;
    let channels = channel_count as usize;
    let source_frames = samples.len() / channels;
    let target_frames = (source_frames as f64 * ratio).ceil() as usize;

    let mut output = Vec::with_capacity(target_frames * channels);

    for target_frame in 0..target_frames {
        let source_pos = target_frame as f64 / ratio;
        let source_frame = source_pos.floor() as usize;
        let frac = source_pos.fract() as f32;

        for channel in 0..channels {
            let idx0 = source_frame * channels + channel;
            let idx1 = (source_frame + 1) * channels + channel;

            let s0 = samples.get(idx0).copied().unwrap_or(0.0);
            let s1 = samples.get(idx1).copied().unwrap_or(s0);

            output.push(s0 + (s1 - s0) * frac);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::testutil::write_wav;

    use super::*;

    #[test]
    fn test_transcode_samples() {
        // Simple mono sine wave at 44100Hz
        let source_rate = 44100;
        let target_rate = 48000;
        let source_samples: Vec<f32> = (0..4410)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / source_rate as f32).sin())
            .collect();

        let result = transcode_samples(&source_samples, 1, source_rate, target_rate);

        // Should have more samples at higher rate
        let expected_len = (4410.0_f64 * 48000.0 / 44100.0).ceil() as usize;
        assert_eq!(result.len(), expected_len);
    }

    #[test]
    fn test_transcode_stereo() {
        // Stereo: L=1.0, R=-1.0 alternating
        let source_samples = vec![1.0f32, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];

        let result = transcode_samples(&source_samples, 2, 44100, 48000);

        // Check that channels are preserved
        assert!(result.len() >= 8);
        assert!((result[0] - 1.0).abs() < 0.1);
        assert!((result[1] - (-1.0)).abs() < 0.1);
    }

    #[test]
    fn test_decoded_sample_accessors() {
        let sample = DecodedSample::new(vec![0.0; 48000 * 2], 2, 48000);
        assert_eq!(sample.frames(), 48000);
        assert_eq!(sample.duration(), Duration::from_secs(1));
        assert_eq!(sample.memory_size(), 48000 * 2 * 4);

        let clone = sample.clone();
        assert!(clone.same_buffer(&sample));
        let other = DecodedSample::new(vec![0.0; 48000 * 2], 2, 48000);
        assert!(!other.same_buffer(&sample));
    }

    #[test]
    fn test_file_fetcher_resolve() {
        let fetcher = FileFetcher::new("/sounds");
        assert_eq!(fetcher.resolve("click.wav"), PathBuf::from("/sounds/click.wav"));
        assert_eq!(fetcher.resolve("/abs/beep.wav"), PathBuf::from("/abs/beep.wav"));
    }

    #[test]
    fn test_file_fetcher_missing_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let fetcher = FileFetcher::new(tempdir.path());
        assert!(matches!(
            fetcher.fetch("missing.wav"),
            Err(SampleError::Fetch { .. })
        ));
    }

    #[test]
    fn test_load_wav() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("click.wav");
        let left: Vec<f32> = (0..4410).map(|i| (i as f32 / 4410.0) - 0.5).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        write_wav(path, vec![left.clone(), right], 44100).unwrap();

        let loader = SampleLoader::from_files(tempdir.path(), None);
        let sample = loader.load(&SoundEntry::new("Click", "click.wav")).unwrap();
        assert_eq!(sample.channel_count(), 2);
        assert_eq!(sample.sample_rate(), 44100);
        assert_eq!(sample.frames(), 4410);
        assert!((sample.data()[0] - left[0]).abs() < 1e-6);
        assert!((sample.data()[1] + left[0]).abs() < 1e-6);
    }

    #[test]
    fn test_load_wav_resampled() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("beep.wav");
        write_wav(path, vec![vec![0.25f32; 4410]], 44100).unwrap();

        let loader = SampleLoader::from_files(tempdir.path(), Some(48000));
        let sample = loader.load(&SoundEntry::new("Beep", "beep.wav")).unwrap();
        assert_eq!(sample.channel_count(), 1);
        assert_eq!(sample.sample_rate(), 48000);
        let expected_frames = (4410.0_f64 * (48000.0 / 44100.0)).ceil() as usize;
        assert_eq!(sample.frames(), expected_frames);
    }

    #[test]
    fn test_decode_garbage() {
        let decoder = SymphoniaDecoder::new(None);
        let result = decoder.decode("noise.wav", b"definitely not a wav file".to_vec());
        assert!(matches!(result, Err(SampleError::Decode { .. })));
    }
}
