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

//! The sample library: a catalog of named sounds, decoded into memory in the
//! background, with one of them selected as the sound that plays on every beat.

mod catalog;
mod error;
mod library;
mod loader;

pub use catalog::{Catalog, SoundEntry, BUILTIN_SOUNDS, DEFAULT_SOUND};
pub use error::SampleError;
pub use library::SampleLibrary;
pub use loader::{Decode, DecodedSample, Fetch, FileFetcher, SampleLoader, SymphoniaDecoder};
