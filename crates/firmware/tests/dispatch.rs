//! File-manager dispatch: which handler gets a picked entry and which
//! message code a failure produces.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use firmware::{App, MessageSink, SystemMessage, TextViewer};
use platform::mocks::{MockDecoder, MockDelay, MockStorage, MockSurface, MockTouch};
use playback::PlayerConfig;

type TestApp = App<MockStorage, MockDecoder, MockTouch, MockSurface, MockDelay>;

fn app(storage: MockStorage) -> TestApp {
    App::new(
        storage,
        MockDecoder::new(),
        MockTouch::new(),
        MockSurface::new(),
        MockDelay::new(),
        PlayerConfig::default(),
    )
}

#[derive(Default)]
struct Viewer {
    opened: Vec<String>,
    result: Option<SystemMessage>,
}

impl TextViewer for Viewer {
    async fn open(&mut self, path: &str) -> Result<(), SystemMessage> {
        self.opened.push(path.to_owned());
        self.result.map_or(Ok(()), Err)
    }
}

#[derive(Default)]
struct Messages(Vec<(u8, String)>);

impl MessageSink for Messages {
    fn show(&mut self, message: SystemMessage, file: &str) {
        self.0.push((message.code(), file.to_owned()));
    }
}

#[tokio::test]
async fn test_text_file_goes_to_the_viewer() {
    let mut app = app(MockStorage::new().with_file("/DOCS/README.TXT", b"hello"));
    app.cursor_mut().enter("DOCS").unwrap();
    let (mut viewer, mut messages) = (Viewer::default(), Messages::default());

    let shown = app.open_entry("README.TXT", &mut viewer, &mut messages).await;

    assert_eq!(shown, None);
    assert_eq!(viewer.opened, vec!["/DOCS/README.TXT".to_owned()]);
    assert!(messages.0.is_empty());
    assert!(app.link().audio().is_empty());
}

#[tokio::test]
async fn test_viewer_failure_code_is_shown() {
    let mut app = app(MockStorage::new().with_file("/BIG.TXT", b""));
    let mut viewer = Viewer { result: Some(SystemMessage::TextTooBig), ..Viewer::default() };
    let mut messages = Messages::default();

    let shown = app.open_entry("BIG.TXT", &mut viewer, &mut messages).await;

    assert_eq!(shown, Some(SystemMessage::TextTooBig));
    assert_eq!(messages.0, vec![(2, "BIG.TXT".to_owned())]);
}

#[tokio::test]
async fn test_unknown_extension_cannot_be_opened() {
    let mut app = app(MockStorage::new().with_file("/COVER.JPG", b""));
    let (mut viewer, mut messages) = (Viewer::default(), Messages::default());

    let shown = app.open_entry("COVER.JPG", &mut viewer, &mut messages).await;

    assert_eq!(shown, Some(SystemMessage::CannotOpen));
    assert_eq!(messages.0, vec![(0, "COVER.JPG".to_owned())]);
    assert!(viewer.opened.is_empty());
}

#[tokio::test]
async fn test_audio_file_plays_without_a_message() {
    let mut app = app(MockStorage::new().with_file("/SONG.MP3", &[0x5A; 256]));
    let (mut viewer, mut messages) = (Viewer::default(), Messages::default());

    let shown = app.open_entry("SONG.MP3", &mut viewer, &mut messages).await;

    assert_eq!(shown, None);
    assert!(messages.0.is_empty());
    assert!(app.link().audio().starts_with(&[0x5A; 256]));
}

#[tokio::test]
async fn test_player_failure_is_code_five() {
    let mut app = app(MockStorage::new().with_file("/SONG.MP3", &[0x5A; 256]));
    app.link_mut().set_unresponsive(true);
    let (mut viewer, mut messages) = (Viewer::default(), Messages::default());

    let shown = app.open_entry("SONG.MP3", &mut viewer, &mut messages).await;

    assert_eq!(shown, Some(SystemMessage::PlayerFailed));
    assert_eq!(messages.0, vec![(5, "SONG.MP3".to_owned())]);
}

#[tokio::test]
async fn test_pulled_card_resets_the_cursor() {
    let storage = MockStorage::new().with_file("/MUSIC/A.MP3", &[0x11; 2048]);
    storage.remove_after_reads(2);
    let mut app = app(storage);
    app.cursor_mut().enter("MUSIC").unwrap();
    let (mut viewer, mut messages) = (Viewer::default(), Messages::default());

    let shown = app.open_entry("A.MP3", &mut viewer, &mut messages).await;

    assert_eq!(shown, None, "a pulled card is not a player failure");
    assert!(app.cursor().at_root());
}
