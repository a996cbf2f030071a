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
// Mixing of independent sample voices into an interleaved output buffer.
use tracing::warn;

use crate::samples::DecodedSample;

/// Default maximum number of concurrently sounding voices.
pub const DEFAULT_MAX_VOICES: usize = 32;

/// One playback of a sample, from its first frame to its last.
pub struct Voice {
    /// Monotonic ID, also used to find the oldest voice.
    id: u64,
    sample: DecodedSample,
    /// The next frame to play.
    position: usize,
}

impl Voice {
    fn is_finished(&self) -> bool {
        self.position >= self.sample.frames()
    }

    /// The sample value for an output channel at the given frame offset.
    #[inline]
    fn value(&self, frame: usize, output_channel: usize) -> f32 {
        let channels = self.sample.channel_count() as usize;
        let source_channel = if channels == 1 {
            0
        } else if output_channel < channels {
            output_channel
        } else {
            return 0.0;
        };
        self.sample
            .data()
            .get(frame * channels + source_channel)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Sums active voices. Each trigger adds its own voice, so rapid retriggers overlap
/// instead of cutting each other off.
pub struct Mixer {
    voices: Vec<Voice>,
    num_channels: u16,
    max_voices: usize,
    next_id: u64,
}

impl Mixer {
    /// Creates a new mixer.
    pub fn new(num_channels: u16, max_voices: usize) -> Mixer {
        Mixer {
            voices: Vec::with_capacity(max_voices),
            num_channels: num_channels.max(1),
            max_voices: max_voices.max(1),
            next_id: 0,
        }
    }

    /// Starts a new voice at offset zero. If the voice limit is reached the oldest
    /// voice is stolen.
    pub fn add(&mut self, sample: DecodedSample) {
        if self.voices.len() >= self.max_voices {
            if let Some(oldest) = self
                .voices
                .iter()
                .enumerate()
                .min_by_key(|(_, voice)| voice.id)
                .map(|(index, _)| index)
            {
                self.voices.remove(oldest);
                warn!(
                    max_voices = self.max_voices,
                    "Voice limit reached, stealing oldest"
                );
            }
        }

        self.voices.push(Voice {
            id: self.next_id,
            sample,
            position: 0,
        });
        self.next_id += 1;
    }

    /// Mixes the active voices into an interleaved buffer, overwriting its contents,
    /// and drops voices that have finished.
    pub fn process_into_output(&mut self, output: &mut [f32]) {
        output.fill(0.0);
        let channels = self.num_channels as usize;
        let frames = output.len() / channels;

        for voice in self.voices.iter_mut() {
            let available = voice.sample.frames().saturating_sub(voice.position);
            let to_mix = available.min(frames);
            for frame in 0..to_mix {
                for channel in 0..channels {
                    output[frame * channels + channel] +=
                        voice.value(voice.position + frame, channel);
                }
            }
            voice.position += to_mix;
        }

        self.voices.retain(|voice| !voice.is_finished());
    }

    /// Returns the number of voices still sounding.
    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }
}

impl std::fmt::Debug for Mixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mixer")
            .field("active_voices", &self.voices.len())
            .field("num_channels", &self.num_channels)
            .field("max_voices", &self.max_voices)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(values: &[f32]) -> DecodedSample {
        DecodedSample::new(values.to_vec(), 1, 44100)
    }

    #[test]
    fn test_single_voice_plays_from_start() {
        let mut mixer = Mixer::new(1, DEFAULT_MAX_VOICES);
        mixer.add(mono(&[0.1, 0.2, 0.3]));

        let mut output = vec![1.0; 5];
        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![0.1, 0.2, 0.3, 0.0, 0.0]);
        assert_eq!(mixer.active_count(), 0);
    }

    #[test]
    fn test_voices_span_buffers() {
        let mut mixer = Mixer::new(1, DEFAULT_MAX_VOICES);
        mixer.add(mono(&[0.1, 0.2, 0.3, 0.4]));

        let mut output = vec![0.0; 2];
        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![0.1, 0.2]);
        assert_eq!(mixer.active_count(), 1);

        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![0.3, 0.4]);
        assert_eq!(mixer.active_count(), 0);
    }

    #[test]
    fn test_retriggers_overlap() {
        let mut mixer = Mixer::new(1, DEFAULT_MAX_VOICES);
        let sample = mono(&[0.5, 0.5, 0.5, 0.5]);
        mixer.add(sample.clone());

        let mut output = vec![0.0; 2];
        mixer.process_into_output(&mut output);

        // The second trigger starts from zero while the first keeps going.
        mixer.add(sample);
        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![1.0, 1.0]);
        assert_eq!(mixer.active_count(), 1);

        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![0.5, 0.5]);
        assert_eq!(mixer.active_count(), 0);
    }

    #[test]
    fn test_mono_sample_fills_all_channels() {
        let mut mixer = Mixer::new(2, DEFAULT_MAX_VOICES);
        mixer.add(mono(&[0.25, 0.5]));

        let mut output = vec![0.0; 4];
        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![0.25, 0.25, 0.5, 0.5]);
    }

    #[test]
    fn test_stereo_sample_on_wider_output() {
        let mut mixer = Mixer::new(3, DEFAULT_MAX_VOICES);
        mixer.add(DecodedSample::new(vec![0.1, -0.1], 2, 44100));

        let mut output = vec![0.0; 3];
        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![0.1, -0.1, 0.0]);
    }

    #[test]
    fn test_voice_limit_steals_oldest() {
        let mut mixer = Mixer::new(1, 2);
        mixer.add(mono(&[1.0; 8]));
        mixer.add(mono(&[2.0; 8]));
        mixer.add(mono(&[4.0; 8]));
        assert_eq!(mixer.active_count(), 2);

        let mut output = vec![0.0; 1];
        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![6.0]);
    }
}
