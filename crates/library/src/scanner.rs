//! Scanner: extension filtering for directory entries.

/// Extensions the decoder plays, compared case-insensitively. `fla` covers
/// FLAC files under 8.3 short names.
pub const AUDIO_EXTENSIONS: [&str; 6] = ["wav", "mp3", "fla", "flac", "wma", "m4a"];

/// The part of `name` after its last `.`, if any.
///
/// ```
/// assert_eq!(library::extension("SONG.MP3"), Some("MP3"));
/// assert_eq!(library::extension("README"), None);
/// assert_eq!(library::extension(".."), Some(""));
/// ```
pub fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Returns `true` when `name` carries one of [`AUDIO_EXTENSIONS`].
pub fn is_audio_file(name: &str) -> bool {
    extension(name).is_some_and(|ext| {
        AUDIO_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known))
    })
}

/// Returns `true` for `.txt` files, which go to the text viewer.
pub fn is_text_file(name: &str) -> bool {
    extension(name).is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}
