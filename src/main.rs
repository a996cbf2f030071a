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
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use metronome::audio;
use metronome::config::Metronome;
use metronome::controller::{keyboard, Controller};
use metronome::pulse::PulseEngine;
use metronome::samples::{SampleLibrary, SampleLoader};
use metronome::scheduler::TokioScheduler;
use metronome::tempo::Tempo;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A metronome with a selectable library of click sounds."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Starts the metronome, controlled from the keyboard.
    Start {
        /// The path to the metronome config.
        #[arg(short, long)]
        config: Option<String>,
        /// The device name to play through. Overrides the config.
        #[arg(short, long)]
        device: Option<String>,
        /// The starting tempo. Overrides the config.
        #[arg(short, long)]
        bpm: Option<String>,
        /// The starting sound. Overrides the config.
        #[arg(short, long)]
        sound: Option<String>,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Loads every configured sound and reports how it went.
    Sounds {
        /// The path to the metronome config.
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn load_config(path: Option<String>) -> Result<Metronome, Box<dyn Error>> {
    Ok(match path {
        Some(path) => Metronome::deserialize(Path::new(&path))?,
        None => Metronome::default(),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            config,
            device,
            bpm,
            sound,
        } => {
            let mut config = load_config(config)?;
            if let Some(device) = device {
                config.audio_mut().set_device(&device);
            }
            let tempo = bpm
                .as_deref()
                .map(Tempo::from_text)
                .unwrap_or_else(|| config.tempo());

            let device = audio::get_device(config.audio())?;
            info!(device = device.to_string(), "Using audio device");

            let library = Arc::new(SampleLibrary::new(config.catalog()?, device.clone())?);
            library.initialize(SampleLoader::from_files(
                config.sounds_path(),
                device.sample_rate(),
            ))?;
            if let Some(sound) = sound {
                library.select(&sound)?;
            }

            let scheduler = Arc::new(TokioScheduler::current()?);
            let engine = PulseEngine::with_tempo(scheduler, library.clone(), tempo);
            let mut controller =
                Controller::new(engine, library, Arc::new(keyboard::Driver::new()));
            controller.join().await?;
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Sounds { config } => {
            let config = load_config(config)?;
            let catalog = config.catalog()?;
            let loader =
                SampleLoader::from_files(config.sounds_path(), config.audio().sample_rate());

            println!(
                "Sounds (count: {}, path: {}):",
                catalog.len(),
                config.sounds_path().display()
            );
            for entry in catalog.entries() {
                let marker = if entry.name() == catalog.default_sound() {
                    "*"
                } else {
                    "-"
                };
                match loader.load(entry) {
                    Ok(sample) => println!(
                        "{} {}: {} channel(s), {} Hz, {} ms",
                        marker,
                        entry,
                        sample.channel_count(),
                        sample.sample_rate(),
                        sample.duration().as_millis()
                    ),
                    Err(e) => println!("{} {}: failed to load: {}", marker, entry, e),
                }
            }
        }
    }

    Ok(())
}
