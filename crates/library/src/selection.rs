//! Track selection: find the neighbour of the current file in its directory.
//!
//! The directory is opened and scanned from the start on every call. `.` and
//! `..` are skipped by name before anything else, and only files whose
//! extension [`is_audio_file`] accepts count as tracks. Sub-directories are
//! never tracks, whatever their name.
//!
//! Not finding a track is a normal outcome (`Ok(None)`): the caller stops
//! playback and returns to the file manager rather than wrapping around.

use platform::{DirEntry, Directory, FileName, Storage, StorageError};

use crate::scanner::is_audio_file;

/// Which track to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Selection {
    /// First track after the current file.
    Next,
    /// Last track before the current file.
    Previous,
    /// First track in the directory.
    First,
    /// Last track in the directory.
    Last,
}

fn is_track(entry: &DirEntry) -> bool {
    !entry.is_dir && is_audio_file(&entry.name)
}

fn is_dot_entry(entry: &DirEntry) -> bool {
    entry.name == "." || entry.name == ".."
}

/// Look up a track in directory `dir` relative to file `current`.
///
/// Returns `Ok(None)` when there is no such track, including when `current`
/// is not in the listing for [`Selection::Next`] and
/// [`Selection::Previous`]. Storage failures while listing are returned.
pub async fn select_track<S>(
    storage: &mut S,
    dir: &str,
    current: &str,
    selection: Selection,
) -> Result<Option<FileName>, StorageError>
where
    S: Storage,
{
    let mut listing = storage.open_dir(dir).await?;
    let mut seen_current = false;
    let mut candidate: Option<FileName> = None;

    while let Some(entry) = listing.next_entry().await? {
        if is_dot_entry(&entry) {
            continue;
        }
        let is_current = entry.name == current;
        match selection {
            Selection::Next => {
                if seen_current && is_track(&entry) {
                    candidate = Some(entry.name);
                    break;
                }
                seen_current |= is_current;
            }
            Selection::Previous => {
                if is_current {
                    seen_current = true;
                    break;
                }
                if is_track(&entry) {
                    candidate = Some(entry.name);
                }
            }
            Selection::First => {
                if is_track(&entry) {
                    candidate = Some(entry.name);
                    break;
                }
            }
            Selection::Last => {
                if is_track(&entry) {
                    candidate = Some(entry.name);
                }
            }
        }
    }

    if selection == Selection::Previous && !seen_current {
        candidate = None;
    }

    #[cfg(feature = "defmt")]
    match &candidate {
        Some(name) => defmt::debug!("{}: {=str}", selection, name.as_str()),
        None => defmt::debug!("{}: none after {=str}", selection, current),
    }

    Ok(candidate)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::MockStorage;

    fn album() -> MockStorage {
        MockStorage::new()
            .with_file("/ALBUM/INTRO.TXT", b"hi")
            .with_file("/ALBUM/A.MP3", b"a")
            .with_dir("/ALBUM/SUB.MP3")
            .with_file("/ALBUM/B.FLA", b"b")
            .with_file("/ALBUM/COVER.JPG", b"c")
            .with_file("/ALBUM/C.WAV", b"c")
    }

    async fn pick(storage: &mut MockStorage, current: &str, selection: Selection) -> Option<String> {
        select_track(storage, "/ALBUM", current, selection)
            .await
            .unwrap()
            .map(|name| name.as_str().to_owned())
    }

    #[tokio::test]
    async fn test_next_skips_non_tracks() {
        let mut storage = album();
        assert_eq!(pick(&mut storage, "A.MP3", Selection::Next).await.as_deref(), Some("B.FLA"));
        assert_eq!(pick(&mut storage, "B.FLA", Selection::Next).await.as_deref(), Some("C.WAV"));
        assert_eq!(pick(&mut storage, "C.WAV", Selection::Next).await, None);
    }

    #[tokio::test]
    async fn test_previous_is_last_track_before_current() {
        let mut storage = album();
        assert_eq!(pick(&mut storage, "C.WAV", Selection::Previous).await.as_deref(), Some("B.FLA"));
        assert_eq!(pick(&mut storage, "B.FLA", Selection::Previous).await.as_deref(), Some("A.MP3"));
        assert_eq!(pick(&mut storage, "A.MP3", Selection::Previous).await, None);
    }

    #[tokio::test]
    async fn test_first_and_last_ignore_current() {
        let mut storage = album();
        assert_eq!(pick(&mut storage, "B.FLA", Selection::First).await.as_deref(), Some("A.MP3"));
        assert_eq!(pick(&mut storage, "B.FLA", Selection::Last).await.as_deref(), Some("C.WAV"));
        assert_eq!(pick(&mut storage, "GONE.MP3", Selection::Last).await.as_deref(), Some("C.WAV"));
    }

    #[tokio::test]
    async fn test_missing_current_has_no_neighbours() {
        let mut storage = album();
        assert_eq!(pick(&mut storage, "GONE.MP3", Selection::Next).await, None);
        assert_eq!(pick(&mut storage, "GONE.MP3", Selection::Previous).await, None);
    }

    #[tokio::test]
    async fn test_every_call_reopens_the_directory() {
        let mut storage = album();
        pick(&mut storage, "A.MP3", Selection::Next).await;
        pick(&mut storage, "A.MP3", Selection::Next).await;
        assert_eq!(storage.dir_opens(), 2);
    }

    #[tokio::test]
    async fn test_root_listing_has_no_dot_entries() {
        let mut storage = MockStorage::new().with_file("/X.MP3", b"x").with_file("/Y.MP3", b"y");
        let found = select_track(&mut storage, "/", "X.MP3", Selection::Next).await.unwrap();
        assert_eq!(found.as_deref(), Some("Y.MP3"));
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let mut storage = album();
        let err = select_track(&mut storage, "/NOPE", "A.MP3", Selection::Next).await;
        assert_eq!(err, Err(StorageError::NotFound));
    }
}
