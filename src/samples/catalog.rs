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

//! The fixed set of named, selectable sounds.

use std::collections::HashSet;
use std::fmt;

use super::error::SampleError;

/// The sounds that ship with the metronome, by name and file.
pub const BUILTIN_SOUNDS: &[(&str, &str)] = &[
    ("High Tone", "high_tone.wav"),
    ("Low Tone", "low_tone.wav"),
    ("Beep", "beep.wav"),
    ("Click", "click.wav"),
    ("Block", "block.wav"),
    ("Cowbell", "cowbell.wav"),
    ("Triangle", "triangle.wav"),
    ("Drumstick", "high_stick.wav"),
];

/// The sound selected at startup when nothing else is configured.
pub const DEFAULT_SOUND: &str = "High Tone";

/// A named sound and where to fetch it from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundEntry {
    name: String,
    locator: String,
}

impl SoundEntry {
    /// Creates a new catalog entry.
    pub fn new(name: impl Into<String>, locator: impl Into<String>) -> SoundEntry {
        SoundEntry {
            name: name.into(),
            locator: locator.into(),
        }
    }

    /// The unique name of the sound.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path or URI the sound is fetched from.
    pub fn locator(&self) -> &str {
        &self.locator
    }
}

impl fmt::Display for SoundEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.locator)
    }
}

/// An ordered catalog of sounds with a default selection.
#[derive(Clone, Debug)]
pub struct Catalog {
    entries: Vec<SoundEntry>,
    default_sound: String,
}

impl Catalog {
    /// Creates a catalog. Names must be unique and the default must be one of them.
    pub fn new(entries: Vec<SoundEntry>, default_sound: &str) -> Result<Catalog, SampleError> {
        if entries.is_empty() {
            return Err(SampleError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for entry in entries.iter() {
            if !seen.insert(entry.name()) {
                return Err(SampleError::DuplicateSound(entry.name().to_string()));
            }
        }

        if !seen.contains(default_sound) {
            return Err(SampleError::UnknownSound(default_sound.to_string()));
        }

        Ok(Catalog {
            entries,
            default_sound: default_sound.to_string(),
        })
    }

    /// The built-in catalog, with locators relative to the sounds directory.
    pub fn builtin() -> Catalog {
        Catalog {
            entries: BUILTIN_SOUNDS
                .iter()
                .map(|(name, file)| SoundEntry::new(*name, *file))
                .collect(),
            default_sound: DEFAULT_SOUND.to_string(),
        }
    }

    /// All entries in catalog order.
    pub fn entries(&self) -> &[SoundEntry] {
        &self.entries
    }

    /// Looks up an entry by name.
    pub fn get(&self, name: &str) -> Option<&SoundEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The name of the sound selected at startup.
    pub fn default_sound(&self) -> &str {
        &self.default_sound
    }

    /// Sound names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 8);
        assert_eq!(catalog.default_sound(), "High Tone");
        assert!(catalog.contains("Cowbell"));
        assert_eq!(
            catalog.get("Drumstick").map(|entry| entry.locator()),
            Some("high_stick.wav")
        );
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec![
                "High Tone",
                "Low Tone",
                "Beep",
                "Click",
                "Block",
                "Cowbell",
                "Triangle",
                "Drumstick"
            ]
        );

        // The built-in catalog must satisfy the same rules as any other.
        assert!(Catalog::new(catalog.entries().to_vec(), catalog.default_sound()).is_ok());
    }

    #[test]
    fn test_catalog_validation() {
        assert!(matches!(
            Catalog::new(vec![], "A"),
            Err(SampleError::EmptyCatalog)
        ));
        assert!(matches!(
            Catalog::new(
                vec![SoundEntry::new("A", "a.wav"), SoundEntry::new("A", "b.wav")],
                "A"
            ),
            Err(SampleError::DuplicateSound(name)) if name == "A"
        ));
        assert!(matches!(
            Catalog::new(vec![SoundEntry::new("A", "a.wav")], "B"),
            Err(SampleError::UnknownSound(name)) if name == "B"
        ));

        let catalog = Catalog::new(
            vec![SoundEntry::new("A", "a.wav"), SoundEntry::new("B", "b.wav")],
            "B",
        )
        .unwrap();
        assert_eq!(catalog.default_sound(), "B");
        assert!(catalog.get("C").is_none());
    }
}
