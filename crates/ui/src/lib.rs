//! Application UI layer for the player screen: transport buttons, the
//! now-playing chrome and the file-manager directory cursor.
//!
//! This crate is `no_std` by default; it only uses `core`, `heapless` and
//! `embedded-graphics`.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]
#![warn(missing_docs)]

pub mod navigation;
pub mod now_playing;
pub mod transport;

pub use navigation::{DirectoryCursor, NavigationError, MAX_DEPTH, PAGE_SIZE};
pub use now_playing::{draw_header, PlaybackTimer, VolumeBar};
pub use transport::{hit_test, ButtonArea, TransportButton, TransportPanel, PRESS_FEEDBACK_MS};
