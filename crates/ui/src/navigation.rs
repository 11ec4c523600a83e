//! File-manager directory cursor: a bounded stack of visited directories
//! with a scroll position per level.
//!
//! The stack is capped at [`MAX_DEPTH`] levels including the root (no heap).
//! Entering past the cap is refused rather than silently dropped, because
//! the caller has to know which directory it is actually listing.

use heapless::Vec;
use platform::config::MAX_DIRECTORY_DEPTH;
use platform::{file_name, join_path, FileName, PathBuf, StorageError};

/// Deepest level the cursor descends to, root included.
pub const MAX_DEPTH: usize = MAX_DIRECTORY_DEPTH;

/// Entries shown per file-manager page.
pub const PAGE_SIZE: u16 = 10;

/// Why [`DirectoryCursor::enter`] refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavigationError {
    /// Already [`MAX_DEPTH`] levels deep.
    TooDeep,
    /// The directory name does not fit a [`FileName`].
    NameTooLong,
}

impl core::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooDeep => f.write_str("directory nesting too deep"),
            Self::NameTooLong => f.write_str("directory name too long"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NavigationError {}

#[derive(Debug, Clone)]
struct Level {
    name: FileName,
    scroll: u16,
}

/// Where the file manager is.
#[derive(Debug, Clone)]
pub struct DirectoryCursor {
    levels: Vec<Level, MAX_DEPTH>,
}

impl DirectoryCursor {
    /// Cursor at the top of the root directory.
    pub fn new() -> Self {
        let mut levels = Vec::new();
        // Always succeeds: the stack starts empty.
        levels.push(Level { name: FileName::new(), scroll: 0 }).ok();
        Self { levels }
    }

    /// Levels below the root.
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Whether the cursor is in the root directory.
    pub fn at_root(&self) -> bool {
        self.levels.len() <= 1
    }

    /// Name of the current directory, `/` at the root.
    pub fn current_name(&self) -> &str {
        match self.levels.last() {
            Some(level) if !self.at_root() => level.name.as_str(),
            _ => "/",
        }
    }

    /// Descend into subdirectory `name` of the current directory.
    pub fn enter(&mut self, name: &str) -> Result<(), NavigationError> {
        if self.levels.is_full() {
            return Err(NavigationError::TooDeep);
        }
        let name = file_name(name).map_err(|_| NavigationError::NameTooLong)?;
        self.levels
            .push(Level { name, scroll: 0 })
            .map_err(|_| NavigationError::TooDeep)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("enter depth {=usize}", self.depth());
        Ok(())
    }

    /// Go up one level. Returns `false` at the root.
    pub fn leave(&mut self) -> bool {
        if self.at_root() {
            return false;
        }
        self.levels.pop();
        true
    }

    /// Absolute path of the current directory.
    pub fn path(&self) -> Result<PathBuf, StorageError> {
        let mut path = PathBuf::new();
        path.push('/').map_err(|_| StorageError::NameTooLong)?;
        for level in self.levels.iter().skip(1) {
            path = join_path(&path, &level.name)?;
        }
        Ok(path)
    }

    /// Absolute path of entry `name` in the current directory.
    pub fn entry_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        join_path(&self.path()?, name)
    }

    /// Index of the first listed entry on the current page.
    pub fn scroll(&self) -> u16 {
        self.levels.last().map_or(0, |level| level.scroll)
    }

    /// Scroll one entry up. Returns `false` at the top.
    pub fn scroll_up(&mut self) -> bool {
        match self.levels.last_mut() {
            Some(level) if level.scroll > 0 => {
                level.scroll = level.scroll.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    /// Scroll one entry down in a listing of `total` entries. Returns `false`
    /// once the last page is fully shown.
    pub fn scroll_down(&mut self, total: u16) -> bool {
        match self.levels.last_mut() {
            Some(level) if level.scroll < total.saturating_sub(PAGE_SIZE) => {
                level.scroll = level.scroll.saturating_add(1);
                true
            }
            _ => false,
        }
    }

    /// Back to the root, e.g. after the card was pulled.
    pub fn reset(&mut self) {
        self.levels.truncate(1);
        if let Some(root) = self.levels.first_mut() {
            root.scroll = 0;
        }
    }
}

impl Default for DirectoryCursor {
    fn default() -> Self {
        Self::new()
    }
}
