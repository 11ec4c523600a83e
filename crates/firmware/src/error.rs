//! Errors surfaced by the multi-track loop.

use platform::{DecoderError, StorageError};
use playback::{ConfigError, PlaybackError};

use crate::dispatch::SystemMessage;

/// Why [`App::handle_file`](crate::App::handle_file) gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandleError {
    /// A track could not be opened.
    Open(StorageError),
    /// The card failed while listing or streaming (and is still inserted).
    Storage(StorageError),
    /// The decoder stopped answering or the bus failed.
    Decoder(DecoderError),
    /// The player configuration was rejected.
    Config(ConfigError),
}

impl HandleError {
    /// Message code the file manager shows for this failure.
    pub const fn message(&self) -> SystemMessage {
        match self {
            Self::Open(_) | Self::Decoder(_) => SystemMessage::PlayerFailed,
            Self::Storage(_) => SystemMessage::FilesystemError,
            Self::Config(_) => SystemMessage::Unknown,
        }
    }
}

impl From<DecoderError> for HandleError {
    fn from(e: DecoderError) -> Self {
        Self::Decoder(e)
    }
}

impl From<ConfigError> for HandleError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<PlaybackError> for HandleError {
    fn from(e: PlaybackError) -> Self {
        match e {
            PlaybackError::Storage(e) => Self::Storage(e),
            PlaybackError::Decoder(e) => Self::Decoder(e),
            PlaybackError::Config(e) => Self::Config(e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HandleError {}

impl core::fmt::Display for HandleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Open(e) => write!(f, "cannot open track: {e}"),
            Self::Storage(e) => write!(f, "storage failed during playback: {e}"),
            Self::Decoder(e) => write!(f, "decoder failed during playback: {e}"),
            Self::Config(e) => write!(f, "invalid player configuration: {e}"),
        }
    }
}
