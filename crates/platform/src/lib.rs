//! Collaborator contracts for the touch audio player
//!
//! This crate defines the trait seams between the playback core and the
//! hardware it drives, so the core can be developed and tested on the host.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: handle_file, dispatch)
//!         ↓
//! Feature Layers (playback, ui, library)
//!         ↓
//! Platform contracts (this crate)
//!         ↓
//! Hardware Layer (VS1053 over SPI, FAT driver, touch controller, LCD)
//! ```
//!
//! # Collaborators
//!
//! - [`DecoderLink`] - VS10xx register and audio-data transactions
//! - [`Storage`] - FAT volume: files and directory listings
//! - [`TouchPanel`] - resistive touch controller queue
//! - [`DisplaySurface`] - LCD drawing surface with button artwork
//!
//! The [`vs1053`] module carries the register map, the decoder bring-up
//! sequence and the firmware patch loader, all written against
//! [`DecoderLink`] so they run unchanged over SPI or a mock.
//!
//! # Features
//!
//! - `std`: local-filesystem storage and the [`mocks`] test doubles
//! - `defmt`: `defmt::Format` derives on public types
//!
//! # Example
//!
//! ```no_run
//! use platform::{vs1053, DecoderLink};
//!
//! fn volume_of<L: DecoderLink>(link: &mut L) -> u16 {
//!     link.read_control(vs1053::SCI_VOL).unwrap_or(vs1053::VOL_SILENT)
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
// Pedantic lints suppressed for this hardware contract crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // register accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod config;
pub mod decoder;
pub mod display;
pub mod input;
pub mod storage;
pub mod vs1053;

#[cfg(feature = "std")]
pub mod storage_local;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export the collaborator traits
pub use decoder::{DecoderError, DecoderLink, MAX_TRANSFER_SIZE};
pub use display::{DisplaySurface, Icon, IconStyle, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use input::{TouchCalibration, TouchPanel};
pub use storage::{file_name, join_path, DirEntry, Directory, File, FileName, PathBuf, Storage, StorageError};
