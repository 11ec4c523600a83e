//! Local filesystem Storage implementation for host runs.
//!
//! `LocalFileStorage` implements `platform::Storage` using `std::fs`.
//! Used when the `std` feature is enabled. All paths are resolved relative
//! to the card root provided at construction, and listings of
//! sub-directories start with `.` and `..` the way a FAT volume's do.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use crate::storage::{file_name, DirEntry, Directory, File, Storage, StorageError};

fn map_io(e: &std::io::Error) -> StorageError {
    match e.kind() {
        std::io::ErrorKind::NotFound => StorageError::NotFound,
        _ => StorageError::Io,
    }
}

/// An open file on the local filesystem.
pub struct LocalFile {
    inner: fs::File,
    size: u64,
}

impl File for LocalFile {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        Read::read(&mut self.inner, buf).map_err(|e| map_io(&e))
    }

    async fn seek(&mut self, pos: u64) -> Result<u64, StorageError> {
        Seek::seek(&mut self.inner, SeekFrom::Start(pos)).map_err(|e| map_io(&e))
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// A directory scan over `std::fs::read_dir`, sorted by name.
pub struct LocalDir {
    entries: std::vec::IntoIter<DirEntry>,
}

impl Directory for LocalDir {
    async fn next_entry(&mut self) -> Result<Option<DirEntry>, StorageError> {
        Ok(self.entries.next())
    }
}

/// A `platform::Storage` implementation backed by `std::fs`.
///
/// # Example
/// ```no_run
/// # async fn example() {
/// use platform::storage_local::LocalFileStorage;
/// use platform::Storage;
/// let mut storage = LocalFileStorage::new("/media/card");
/// let file = storage.open_file("/MUSIC/TRACK01.MP3").await.unwrap();
/// # }
/// ```
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Create a new storage rooted at `card_root`.
    #[must_use]
    pub fn new(card_root: &str) -> Self {
        Self { root: PathBuf::from(card_root) }
    }

    /// Create from the `MUSIC_PATH` environment variable.
    ///
    /// Returns `None` if `MUSIC_PATH` is not set or is not valid UTF-8.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("MUSIC_PATH").ok().map(|p| Self::new(&p))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Storage for LocalFileStorage {
    type File = LocalFile;
    type Dir = LocalDir;

    async fn open_file(&mut self, path: &str) -> Result<Self::File, StorageError> {
        let full = self.resolve(path);
        let file = fs::File::open(&full).map_err(|e| map_io(&e))?;
        let meta = file.metadata().map_err(|e| map_io(&e))?;
        if meta.is_dir() {
            return Err(StorageError::NotFound);
        }
        Ok(LocalFile { inner: file, size: meta.len() })
    }

    async fn open_dir(&mut self, path: &str) -> Result<Self::Dir, StorageError> {
        let full = self.resolve(path);
        let mut entries = Vec::new();
        if !path.trim_matches('/').is_empty() {
            for dot in [".", ".."] {
                entries.push(DirEntry { name: file_name(dot)?, is_dir: true });
            }
        }
        let mut listed = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| map_io(&e))? {
            let entry = entry.map_err(|e| map_io(&e))?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let is_dir = entry.file_type().map_err(|e| map_io(&e))?.is_dir();
            listed.push(DirEntry { name: file_name(&name)?, is_dir });
        }
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        entries.extend(listed);
        Ok(LocalDir { entries: entries.into_iter() })
    }

    async fn exists(&mut self, path: &str) -> Result<bool, StorageError> {
        Ok(self.resolve(path).exists())
    }

    fn is_present(&mut self) -> bool {
        self.root.is_dir()
    }
}
