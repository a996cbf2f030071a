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

//! Tempo handling. A tempo is always an integer number of beats per minute within
//! [`MIN_BPM`, `MAX_BPM`]; anything else is clamped on the way in.

use std::fmt;
use std::time::Duration;

/// The slowest supported tempo.
pub const MIN_BPM: u32 = 10;

/// The fastest supported tempo.
pub const MAX_BPM: u32 = 250;

/// The tempo the metronome starts at.
pub const DEFAULT_BPM: u32 = 80;

const MICROS_PER_MINUTE: u64 = 60_000_000;

/// A clamped tempo in beats per minute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tempo(u32);

impl Tempo {
    /// Creates a tempo, clamping the value into the supported range.
    pub fn clamped(bpm: i64) -> Tempo {
        Tempo(bpm.clamp(MIN_BPM as i64, MAX_BPM as i64) as u32)
    }

    /// Parses user-entered text. Anything that isn't a number becomes [`MIN_BPM`];
    /// fractional values are rounded before clamping.
    pub fn from_text(text: &str) -> Tempo {
        match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => {
                // Saturating cast keeps huge values on the right side of the clamp.
                Tempo::clamped(value.round() as i64)
            }
            _ => Tempo(MIN_BPM),
        }
    }

    /// The tempo in beats per minute.
    pub fn bpm(&self) -> u32 {
        self.0
    }

    /// The time between two consecutive beats (60000 / bpm milliseconds).
    pub fn period(&self) -> Duration {
        Duration::from_micros(MICROS_PER_MINUTE / self.0 as u64)
    }

    /// One beat per minute faster, saturating at [`MAX_BPM`].
    pub fn incremented(&self) -> Tempo {
        Tempo::clamped(self.0 as i64 + 1)
    }

    /// One beat per minute slower, saturating at [`MIN_BPM`].
    pub fn decremented(&self) -> Tempo {
        Tempo::clamped(self.0 as i64 - 1)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Tempo(DEFAULT_BPM)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_clamped() {
        assert_eq!(Tempo::clamped(120).bpm(), 120);
        assert_eq!(Tempo::clamped(10).bpm(), 10);
        assert_eq!(Tempo::clamped(250).bpm(), 250);
        assert_eq!(Tempo::clamped(9).bpm(), MIN_BPM);
        assert_eq!(Tempo::clamped(-40).bpm(), MIN_BPM);
        assert_eq!(Tempo::clamped(251).bpm(), MAX_BPM);
        assert_eq!(Tempo::clamped(i64::MAX).bpm(), MAX_BPM);
        assert_eq!(Tempo::clamped(i64::MIN).bpm(), MIN_BPM);
    }

    #[test]
    fn test_from_text() {
        assert_eq!(Tempo::from_text("140").bpm(), 140);
        assert_eq!(Tempo::from_text(" 96 ").bpm(), 96);
        assert_eq!(Tempo::from_text("999").bpm(), MAX_BPM);
        assert_eq!(Tempo::from_text("3").bpm(), MIN_BPM);
        assert_eq!(Tempo::from_text("120.6").bpm(), 121);
        assert_eq!(Tempo::from_text("1e9").bpm(), MAX_BPM);

        // Not numbers.
        assert_eq!(Tempo::from_text("").bpm(), MIN_BPM);
        assert_eq!(Tempo::from_text("fast").bpm(), MIN_BPM);
        assert_eq!(Tempo::from_text("NaN").bpm(), MIN_BPM);
        assert_eq!(Tempo::from_text("inf").bpm(), MIN_BPM);
    }

    #[test]
    fn test_period() {
        assert_eq!(Tempo::clamped(80).period(), Duration::from_millis(750));
        assert_eq!(Tempo::clamped(120).period(), Duration::from_millis(500));
        assert_eq!(Tempo::clamped(60).period(), Duration::from_secs(1));
        assert_eq!(Tempo::clamped(10).period(), Duration::from_secs(6));
        assert_eq!(Tempo::clamped(250).period(), Duration::from_millis(240));
    }

    #[test]
    fn test_increment_decrement_saturate() {
        let mut tempo = Tempo::clamped(MAX_BPM as i64 - 2);
        for _ in 0..10 {
            tempo = tempo.incremented();
        }
        assert_eq!(tempo.bpm(), MAX_BPM);

        for _ in 0..1000 {
            tempo = tempo.decremented();
            assert!(tempo.bpm() >= MIN_BPM);
        }
        assert_eq!(tempo.bpm(), MIN_BPM);
    }

    #[test]
    fn test_default_and_display() {
        assert_eq!(Tempo::default().bpm(), DEFAULT_BPM);
        assert_eq!(Tempo::clamped(100).to_string(), "100 BPM");
    }
}
