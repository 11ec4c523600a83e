//! Touch audio player firmware
//!
//! Application layer of a handheld player that streams files from a FAT card
//! to a VS1053 decoder under a touch transport UI.
//!
//! # Architecture
//!
//! ```text
//! Application Layer (this crate: App, handle_file, dispatch)
//!         ↓
//! Feature Layers (playback, ui, library)
//!         ↓
//! Platform contracts (platform: DecoderLink, Storage, TouchPanel, DisplaySurface)
//!         ↓
//! Hardware Drivers (decoder: VS1053 over SPI)
//! ```
//!
//! # Features
//!
//! - `hardware` - defmt logging through every layer
//! - `emulator` - host runs with `tracing` events from the application loop
//! - `std` - Enable standard library (for emulator and testing)
//!
//! # Example
//!
//! ```no_run
//! # async fn run<S, L, T, G, D, V, M>(mut app: firmware::App<S, L, T, G, D>, viewer: &mut V, sink: &mut M)
//! # where
//! #     S: platform::Storage,
//! #     L: platform::DecoderLink,
//! #     T: platform::TouchPanel,
//! #     G: platform::DisplaySurface,
//! #     D: embedded_hal_async::delay::DelayNs,
//! #     V: firmware::TextViewer,
//! #     M: firmware::MessageSink,
//! # {
//! // the sink has already shown any failure; the code is for logging
//! let _shown = app.open_entry("SONG.MP3", viewer, sink).await;
//! # }
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// Logging discipline
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(async_fn_in_trait)] // single-threaded executor, Send bounds not needed

pub mod app;
pub mod decoder;
pub mod dispatch;
pub mod error;

pub use app::{App, HandleOutcome};
pub use decoder::Vs1053;
pub use dispatch::{EntryKind, MessageSink, SystemMessage, TextViewer};
pub use error::HandleError;
