//! Storage abstraction for the removable FAT volume
//!
//! Files are read-only and closed on drop. Directory listings are lazy,
//! finite and not restartable: scanning again means opening the directory
//! again, which also guarantees the listing reflects the card as it is now.

use crate::config::{MAX_NAME_LEN, MAX_PATH_LEN};

/// A directory-entry name.
pub type FileName = heapless::String<MAX_NAME_LEN>;

/// An absolute path on the volume, `/`-separated.
pub type PathBuf = heapless::String<MAX_PATH_LEN>;

/// Storage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// No file or directory at the given path.
    NotFound,
    /// The driver reported an I/O failure.
    Io,
    /// A read returned fewer bytes than the file size promises.
    ShortRead,
    /// The card was pulled; every open handle is now invalid.
    Removed,
    /// A name or path does not fit the fixed-size buffers.
    NameTooLong,
}

#[cfg(feature = "std")]
impl std::error::Error for StorageError {}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "no such file or directory"),
            Self::Io => write!(f, "storage I/O error"),
            Self::ShortRead => write!(f, "file ended before its recorded size"),
            Self::Removed => write!(f, "storage card removed"),
            Self::NameTooLong => write!(f, "name does not fit the path buffer"),
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name without any path component.
    pub name: FileName,
    /// `true` for sub-directories (including `.` and `..`).
    pub is_dir: bool,
}

/// Storage trait for file system access
pub trait Storage {
    /// File type
    type File: File;
    /// Directory listing type
    type Dir: Directory;

    /// Open a file for reading
    fn open_file(
        &mut self,
        path: &str,
    ) -> impl core::future::Future<Output = Result<Self::File, StorageError>>;

    /// Open a directory for a single forward scan
    fn open_dir(
        &mut self,
        path: &str,
    ) -> impl core::future::Future<Output = Result<Self::Dir, StorageError>>;

    /// Check if path exists
    fn exists(
        &mut self,
        path: &str,
    ) -> impl core::future::Future<Output = Result<bool, StorageError>>;

    /// Whether the card is currently inserted.
    fn is_present(&mut self) -> bool;
}

/// File trait for reading files
pub trait File {
    /// Read from current position. `Ok(0)` means end of file.
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, StorageError>>;

    /// Seek to an absolute position
    fn seek(&mut self, pos: u64) -> impl core::future::Future<Output = Result<u64, StorageError>>;

    /// Get file size
    fn size(&self) -> u64;
}

/// Forward-only directory scan
pub trait Directory {
    /// Next entry, or `None` once the listing is exhausted.
    fn next_entry(
        &mut self,
    ) -> impl core::future::Future<Output = Result<Option<DirEntry>, StorageError>>;
}

/// Join a directory path and an entry name with exactly one separator.
///
/// ```
/// use platform::join_path;
///
/// assert_eq!(join_path("/", "SONG.MP3").unwrap().as_str(), "/SONG.MP3");
/// assert_eq!(join_path("/MUSIC", "SONG.MP3").unwrap().as_str(), "/MUSIC/SONG.MP3");
/// ```
pub fn join_path(dir: &str, name: &str) -> Result<PathBuf, StorageError> {
    let mut path = PathBuf::new();
    path.push_str(dir).map_err(|_| StorageError::NameTooLong)?;
    if !dir.ends_with('/') {
        path.push('/').map_err(|_| StorageError::NameTooLong)?;
    }
    path.push_str(name).map_err(|_| StorageError::NameTooLong)?;
    Ok(path)
}

/// Copy a `&str` into a [`FileName`].
pub fn file_name(name: &str) -> Result<FileName, StorageError> {
    let mut out = FileName::new();
    out.push_str(name).map_err(|_| StorageError::NameTooLong)?;
    Ok(out)
}
