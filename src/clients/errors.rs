use rspotify::ClientError;
use rspotify::model::IdError;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by rshuffle
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed Spotify track, artist or playlist ID
    #[error("Failed to parse Spotify ID: {0}")]
    ParseError(#[from] IdError),

    /// Spotify Web API or OAuth failure
    #[error("Spotify error: {0}")]
    SpotifyError(#[from] ClientError),

    /// Missing or invalid settings
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Library JSON could not be encoded
    #[error("Storage error: {0}")]
    StorageError(#[from] serde_json::Error),

    /// Library file could not be written
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A policy produced a negative or non-finite weight
    #[error("Invalid weight {weight} for song {song_id}, weights must be finite and non-negative")]
    InvalidWeight {
        /// Track the weight was computed for
        song_id: String,
        /// Offending weight
        weight: f64,
    },

    /// No song matches the ID or "Name - Artist"
    #[error("Unknown song: {0}")]
    UnknownSong(String),

    /// Several songs share the "Name - Artist" that was asked for
    #[error("{query} matches several songs, use one of the track IDs: {candidates:?}")]
    AmbiguousSong {
        /// Lookup as given by the user
        query: String,
        /// Track IDs sharing that name
        candidates: Vec<String>,
    },

    /// Nothing to shuffle and no Spotify connection to fetch from
    #[error("Library {0} is empty, run `rshuffle update` first")]
    EmptyLibrary(String),
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Error::ConfigurationError(err.to_string())
    }
}
