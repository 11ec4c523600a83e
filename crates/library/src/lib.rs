//! Track library over the removable FAT volume: which files are playable and
//! which one plays next.
//!
//! # Modules
//!
//! - [`scanner`]: extension filtering
//! - [`selection`]: next / previous / first / last track lookup
//!
//! No directory cache is kept. Every lookup re-reads the listing from
//! storage, so a card swapped between tracks is always seen as it is.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]
#![warn(missing_docs)]

pub mod scanner;
pub mod selection;

// Top-level re-exports for convenience
pub use scanner::{extension, is_audio_file, is_text_file, AUDIO_EXTENSIONS};
pub use selection::{select_track, Selection};
