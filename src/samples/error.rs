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

/// Errors raised by the sample library.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// The requested sound is not in the catalog.
    #[error("unknown sound '{0}'")]
    UnknownSound(String),

    /// The library has already started loading its catalog.
    #[error("sample library has already been initialized")]
    AlreadyInitialized,

    /// Decoding needs a tokio runtime to run on.
    #[error("no tokio runtime available for decoding: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("the sound catalog is empty")]
    EmptyCatalog,

    #[error("sound '{0}' appears more than once in the catalog")]
    DuplicateSound(String),

    /// Fetching the raw bytes of a sound failed.
    #[error("failed to fetch {locator}: {source}")]
    Fetch {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    /// The raw bytes of a sound could not be turned into a playable buffer.
    #[error("failed to decode {locator}: {message}")]
    Decode { locator: String, message: String },
}
