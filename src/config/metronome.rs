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
use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};
use serde::Deserialize;
use tracing::info;

use super::audio::Audio;
use super::error::ConfigError;
use crate::samples::{Catalog, SoundEntry, DEFAULT_SOUND};
use crate::tempo::Tempo;

/// Where sound files live when the configuration doesn't say.
pub const DEFAULT_SOUNDS_PATH: &str = "audio";

/// A sound in the configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct Sound {
    /// The name shown to the user.
    name: String,
    /// The sound file, relative to the sounds path.
    file: String,
}

impl Sound {
    pub fn new(name: &str, file: &str) -> Sound {
        Sound {
            name: name.to_string(),
            file: file.to_string(),
        }
    }
}

/// The metronome configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Metronome {
    /// The audio output configuration.
    #[serde(default)]
    audio: Audio,

    /// The starting tempo. Kept as text so that anything unparseable falls back to
    /// the slowest tempo rather than failing the whole file.
    tempo: Option<String>,

    /// Base directory for relative sound files.
    sounds_path: Option<PathBuf>,

    /// The sound selected at startup.
    default_sound: Option<String>,

    /// The available sounds. The built-in set when unset.
    sounds: Option<Vec<Sound>>,

    /// The directory of the file this was read from.
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Metronome {
    /// Reads the configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Metronome, ConfigError> {
        let mut metronome = Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml))
            .build()?
            .try_deserialize::<Metronome>()?;
        metronome.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        info!(path = ?path, "Loaded configuration");
        Ok(metronome)
    }

    /// Reads the configuration from a YAML string. Relative paths resolve against the
    /// working directory.
    pub fn from_yaml(yaml: &str) -> Result<Metronome, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<Metronome>()?)
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut Audio {
        &mut self.audio
    }

    /// The starting tempo, clamped into range.
    pub fn tempo(&self) -> Tempo {
        self.tempo
            .as_deref()
            .map(Tempo::from_text)
            .unwrap_or_default()
    }

    /// The directory sound files are read from. Relative paths are relative to the
    /// configuration file.
    pub fn sounds_path(&self) -> PathBuf {
        match &self.sounds_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.base_dir.join(path),
            None => self.base_dir.join(DEFAULT_SOUNDS_PATH),
        }
    }

    /// Builds the sound catalog. Without a sound list this is the built-in catalog;
    /// with one, the default is the first listed sound unless one is named.
    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        let (entries, fallback_default) = match &self.sounds {
            Some(sounds) => (
                sounds
                    .iter()
                    .map(|sound| SoundEntry::new(sound.name.as_str(), sound.file.as_str()))
                    .collect::<Vec<SoundEntry>>(),
                sounds.first().map(|sound| sound.name.as_str()),
            ),
            None => (Catalog::builtin().entries().to_vec(), Some(DEFAULT_SOUND)),
        };

        let default_sound = self
            .default_sound
            .as_deref()
            .or(fallback_default)
            .ok_or_else(|| ConfigError::Invalid("no sounds configured".to_string()))?;

        Catalog::new(entries, default_sound).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::tempo::{DEFAULT_BPM, MAX_BPM, MIN_BPM};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Metronome::from_yaml("{}").unwrap();
        assert_eq!(config.audio().device(), "default");
        assert_eq!(config.tempo().bpm(), DEFAULT_BPM);
        assert_eq!(config.sounds_path(), PathBuf::from(DEFAULT_SOUNDS_PATH));

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 8);
        assert_eq!(catalog.default_sound(), "High Tone");
    }

    #[test]
    fn test_tempo_clamps() {
        let cases = [
            ("tempo: 120", 120),
            ("tempo: 1000", MAX_BPM),
            ("tempo: -5", MIN_BPM),
            ("tempo: 99.6", 100),
            ("tempo: fast", MIN_BPM),
        ];
        for (yaml, expected) in cases {
            let config = Metronome::from_yaml(yaml).unwrap();
            assert_eq!(config.tempo().bpm(), expected, "{}", yaml);
        }
    }

    #[test]
    fn test_custom_sounds() {
        let config = Metronome::from_yaml(
            r#"
            default_sound: Wood
            sounds:
              - name: Rim
                file: rim.wav
              - name: Wood
                file: wood.flac
            "#,
        )
        .unwrap();

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.names().collect::<Vec<&str>>(), vec!["Rim", "Wood"]);
        assert_eq!(catalog.default_sound(), "Wood");
        assert_eq!(catalog.get("Wood").unwrap().locator(), "wood.flac");
    }

    #[test]
    fn test_custom_sounds_default_to_first() {
        let config = Metronome::from_yaml(
            r#"
            sounds:
              - name: Rim
                file: rim.wav
            "#,
        )
        .unwrap();
        assert_eq!(config.catalog().unwrap().default_sound(), "Rim");
    }

    #[test]
    fn test_invalid_sounds() {
        let unknown_default = Metronome::from_yaml("default_sound: Kazoo").unwrap();
        assert!(matches!(
            unknown_default.catalog(),
            Err(ConfigError::Invalid(_))
        ));

        let duplicate = Metronome::from_yaml(
            r#"
            sounds:
              - name: Rim
                file: rim.wav
              - name: Rim
                file: rim2.wav
            "#,
        )
        .unwrap();
        assert!(matches!(duplicate.catalog(), Err(ConfigError::Invalid(_))));

        let empty = Metronome::from_yaml("sounds: []").unwrap();
        assert!(matches!(empty.catalog(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_deserialize_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("metronome.yaml");
        fs::write(
            &path,
            r#"
            audio:
              device: mock-device
              max_voices: 4
            tempo: 96
            sounds_path: clicks
            "#,
        )
        .unwrap();

        let config = Metronome::deserialize(&path).unwrap();
        assert_eq!(config.audio().device(), "mock-device");
        assert_eq!(config.audio().max_voices(), 4);
        assert_eq!(config.tempo().bpm(), 96);
        assert_eq!(config.sounds_path(), tempdir.path().join("clicks"));
    }

    #[test]
    fn test_deserialize_missing_file() {
        let result = Metronome::deserialize(Path::new("/definitely/not/here.yaml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
