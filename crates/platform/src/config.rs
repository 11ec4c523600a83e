//! Application configuration and constants
//!
//! Sizes shared by several crates live here so the storage contract, the
//! directory cursor and the track selector agree on the same bounds.

/// The application name
pub const APP_NAME: &str = "Touch Player";

/// Platform crate version, logged with the decoder bring-up banner
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Deepest directory level the file navigator will descend into.
pub const MAX_DIRECTORY_DEPTH: usize = 50;

/// Longest directory-entry name kept in memory (long file names included).
pub const MAX_NAME_LEN: usize = 64;

/// Longest absolute path handed to the storage collaborator.
pub const MAX_PATH_LEN: usize = 256;
