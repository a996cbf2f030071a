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

//! A metronome built from two pieces: a [`pulse::PulseEngine`] that owns tempo and
//! the run state and fires once per beat, and a [`samples::SampleLibrary`] that
//! decodes a small catalog of sounds into memory and plays the selected one on demand.

pub mod audio;
pub mod config;
pub mod controller;
pub mod playsync;
pub mod pulse;
pub mod samples;
pub mod scheduler;
pub mod tempo;
#[cfg(test)]
mod testutil;
