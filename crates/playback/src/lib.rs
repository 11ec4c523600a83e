//! Audio playback engine: streams a file to the VS1053 while a transport UI
//! drives play, pause, stop and track changes.
//!
//! # Modules
//!
//! - [`engine`]: the playback state machine and the two-phase decoder cancel
//! - [`session`]: one open file, its read buffer and report-point captures
//! - [`feeder`]: moves bytes from storage to the decoder in 32-byte chunks
//! - [`flush`]: end-of-stream padding and the final cancel
//! - [`player`]: the per-tick driver tying the above together
//! - [`volume`]: volume, mute and fast-forward state
//! - [`format`]: stream format detection from `SCI_HDAT1`
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod feeder;
pub mod flush;
pub mod format;
pub mod player;
pub mod session;
pub mod volume;

pub use command::{NextAction, TerminalAction, TransportCommand};
pub use config::{ConfigError, PlayerConfig, FILE_BUFFER_SIZE};
pub use engine::{PlaybackEngine, PlaybackState, Transition};
pub use error::PlaybackError;
pub use flush::FlushReport;
pub use format::{AudioFormat, StreamReport};
pub use player::{CommandEffect, Player, SessionEnd, Tick};
pub use session::PlaybackSession;
pub use volume::{VolumeChange, VolumeState};
