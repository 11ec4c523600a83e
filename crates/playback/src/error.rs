//! Playback errors.

use platform::{DecoderError, StorageError};

use crate::config::ConfigError;

/// Errors that end a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackError {
    /// The file could not be read (I/O error, short read, card removed).
    Storage(StorageError),
    /// The decoder link failed or stopped responding.
    Decoder(DecoderError),
    /// The player was built with an unusable configuration.
    Config(ConfigError),
}

impl From<StorageError> for PlaybackError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<DecoderError> for PlaybackError {
    fn from(e: DecoderError) -> Self {
        Self::Decoder(e)
    }
}

impl From<ConfigError> for PlaybackError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PlaybackError {}

impl core::fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "playback storage: {e}"),
            Self::Decoder(e) => write!(f, "playback decoder: {e}"),
            Self::Config(e) => write!(f, "playback config: {e}"),
        }
    }
}
