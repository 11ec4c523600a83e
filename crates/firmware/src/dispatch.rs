//! What happens when a file is picked in the file manager.
//!
//! | Extension      | Handler                         |
//! |----------------|---------------------------------|
//! | `.txt`         | [`TextViewer`]                  |
//! | audio          | [`App::handle_file`](crate::App::handle_file) |
//! | anything else  | [`SystemMessage::CannotOpen`]   |
//!
//! Failures are reported through a [`MessageSink`] as a numbered system
//! message followed by the file name.

use core::future::Future;

use library::{is_audio_file, is_text_file};

/// Numbered messages the file manager shows in its message box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemMessage {
    /// 0: no handler for this file.
    CannotOpen,
    /// 1: the text viewer could not open the file.
    TextOpenFailed,
    /// 2: the text file does not fit the viewer buffer.
    TextTooBig,
    /// 3: the card failed.
    FilesystemError,
    /// 4: anything else.
    Unknown,
    /// 5: the player gave up on the file.
    PlayerFailed,
}

impl SystemMessage {
    /// Numeric code.
    pub const fn code(self) -> u8 {
        match self {
            Self::CannotOpen => 0,
            Self::TextOpenFailed => 1,
            Self::TextTooBig => 2,
            Self::FilesystemError => 3,
            Self::Unknown => 4,
            Self::PlayerFailed => 5,
        }
    }

    /// Message for `code`; unknown codes map to [`SystemMessage::Unknown`].
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::CannotOpen,
            1 => Self::TextOpenFailed,
            2 => Self::TextTooBig,
            3 => Self::FilesystemError,
            5 => Self::PlayerFailed,
            _ => Self::Unknown,
        }
    }

    /// Text shown in front of the file name.
    pub const fn text(self) -> &'static str {
        match self {
            Self::CannotOpen => "Can't open the file:",
            Self::TextOpenFailed => "Failed to open txt file:",
            Self::TextTooBig => "Txt file too big to open:",
            Self::FilesystemError => "Filesystem error in file:",
            Self::Unknown => "Unknown error occurred:",
            Self::PlayerFailed => "Player failed in file:",
        }
    }
}

impl core::fmt::Display for SystemMessage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.text())
    }
}

/// Handler a picked file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryKind {
    /// Plain text, shown by the text viewer.
    Text,
    /// A track for the player.
    Audio,
    /// Nothing can open it.
    Other,
}

impl EntryKind {
    /// Classify by extension.
    pub fn of(name: &str) -> Self {
        if is_text_file(name) {
            Self::Text
        } else if is_audio_file(name) {
            Self::Audio
        } else {
            Self::Other
        }
    }
}

/// Text viewer collaborator.
pub trait TextViewer {
    /// Show the text file at `path` until the user closes it.
    fn open(&mut self, path: &str) -> impl Future<Output = Result<(), SystemMessage>>;
}

/// Message box collaborator.
pub trait MessageSink {
    /// Show `message` followed by `file`.
    fn show(&mut self, message: SystemMessage, file: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_and_unknown_fallback() {
        for code in 0..=5u8 {
            assert_eq!(SystemMessage::from_code(code).code(), code);
        }
        assert_eq!(SystemMessage::from_code(42), SystemMessage::Unknown);
    }

    #[test]
    fn test_message_texts() {
        assert_eq!(SystemMessage::CannotOpen.text(), "Can't open the file:");
        assert_eq!(SystemMessage::PlayerFailed.to_string(), "Player failed in file:");
    }

    #[test]
    fn test_entry_kind_by_extension() {
        assert_eq!(EntryKind::of("README.TXT"), EntryKind::Text);
        assert_eq!(EntryKind::of("song.Mp3"), EntryKind::Audio);
        assert_eq!(EntryKind::of("cover.jpg"), EntryKind::Other);
        assert_eq!(EntryKind::of("NOEXT"), EntryKind::Other);
    }
}
