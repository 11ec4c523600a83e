//! Application context and the multi-track playback loop.
//!
//! [`App`] owns every collaborator plus the state that outlives one file:
//! the volume, the file-manager cursor and the player tunables. The main
//! loop hands it the entry the user picked via [`App::open_entry`]; audio
//! files end up in [`App::handle_file`], which keeps playing neighbouring
//! tracks until the user leaves, the directory runs out or the card is
//! pulled.
//!
//! ```text
//! handle_file(name)
//!   clear screen
//!   loop while card present:
//!     open track ──fail──▶ Err(Open)
//!     header, timer, buttons, volume bar
//!     card check ▸ tick ▸ sample touch ▸ command ▸ redraw ▸ timer ▸ yield
//!     finish (flush) ▸ next action
//!     Leave ──▶ Left        no neighbour ──▶ NoMoreTracks
//!   SCI_VOL = 0xFEFE
//! ```

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};
use embedded_hal_async::delay::DelayNs;
use library::{select_track, Selection};
use platform::vs1053::{self, ChipInfo, InitError, Vs1053Config, SCI_VOL, VOL_SILENT};
use platform::{
    file_name, join_path, DecoderLink, DisplaySurface, File, FileName, Storage, StorageError, TouchPanel,
};
use playback::{NextAction, PlaybackError, Player, PlayerConfig, Tick, VolumeState};
use ui::{draw_header, DirectoryCursor, PlaybackTimer, TransportPanel, VolumeBar};

use crate::dispatch::{EntryKind, MessageSink, SystemMessage, TextViewer};
use crate::error::HandleError;

/// How a [`App::handle_file`] run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandleOutcome {
    /// The user went back to the file manager.
    Left,
    /// There was no next, previous, first or last track to move to.
    NoMoreTracks,
    /// The card was pulled.
    CardRemoved,
}

/// The player with its collaborators.
///
/// Generic over:
/// - `S`: [`Storage`] for the card
/// - `L`: [`DecoderLink`] to the VS1053
/// - `T`: [`TouchPanel`]
/// - `G`: [`DisplaySurface`]
/// - `D`: async [`DelayNs`] for press feedback
pub struct App<S, L, T, G, D> {
    storage: S,
    link: L,
    touch: T,
    surface: G,
    delay: D,
    volume: VolumeState,
    cursor: DirectoryCursor,
    config: PlayerConfig,
}

impl<S, L, T, G, D> App<S, L, T, G, D>
where
    S: Storage,
    L: DecoderLink,
    T: TouchPanel,
    G: DisplaySurface,
    D: DelayNs,
{
    /// Assemble the application; the decoder is not touched until [`init`](Self::init).
    pub fn new(storage: S, link: L, touch: T, surface: G, delay: D, config: PlayerConfig) -> Self {
        Self {
            storage,
            link,
            touch,
            surface,
            delay,
            volume: VolumeState::new(),
            cursor: DirectoryCursor::new(),
            config,
        }
    }

    /// Bring the decoder up and reset the volume to its power-on level.
    pub fn init<B>(&mut self, delay: &mut B, config: &Vs1053Config, patch: &[u16]) -> Result<ChipInfo, InitError>
    where
        B: embedded_hal::delay::DelayNs,
    {
        let info = vs1053::init(&mut self.link, delay, config, patch)?;
        self.volume = VolumeState::new();

        #[cfg(feature = "defmt")]
        defmt::info!(
            "{=str} {=str}: VS{=u16} up",
            platform::config::APP_NAME,
            platform::config::APP_VERSION,
            info.chip
        );

        #[cfg(feature = "emulator")]
        tracing::info!(
            app = platform::config::APP_NAME,
            version = platform::config::APP_VERSION,
            chip = info.chip,
            patch_writes = info.patch_writes,
            "decoder ready"
        );

        Ok(info)
    }

    /// Card storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Decoder link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Decoder link, mutably.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Touch panel.
    pub fn touch(&self) -> &T {
        &self.touch
    }

    /// Touch panel, mutably.
    pub fn touch_mut(&mut self) -> &mut T {
        &mut self.touch
    }

    /// Display surface.
    pub fn surface(&self) -> &G {
        &self.surface
    }

    /// Volume, mute and fast-forward state.
    pub fn volume(&self) -> &VolumeState {
        &self.volume
    }

    /// File-manager position.
    pub fn cursor(&self) -> &DirectoryCursor {
        &self.cursor
    }

    /// File-manager position, mutably.
    pub fn cursor_mut(&mut self) -> &mut DirectoryCursor {
        &mut self.cursor
    }

    /// Route the entry `name` of the current directory to its handler.
    ///
    /// Returns the message that was shown, if any. The cursor goes back to
    /// the root when the card is gone afterwards.
    pub async fn open_entry<V, M>(&mut self, name: &str, viewer: &mut V, messages: &mut M) -> Option<SystemMessage>
    where
        V: TextViewer,
        M: MessageSink,
    {
        let shown = match EntryKind::of(name) {
            EntryKind::Text => match self.cursor.entry_path(name) {
                Ok(path) => viewer.open(&path).await.err(),
                Err(_) => Some(SystemMessage::TextOpenFailed),
            },
            EntryKind::Audio => match self.handle_file(name).await {
                Ok(_) => None,
                Err(e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("player failed: {}", e);
                    #[cfg(feature = "emulator")]
                    tracing::warn!(error = %e, file = name, "player failed");
                    Some(e.message())
                }
            },
            EntryKind::Other => Some(SystemMessage::CannotOpen),
        };

        if let Some(message) = shown {
            messages.show(message, name);
        }
        if !self.storage.is_present() {
            self.cursor.reset();
        }
        shown
    }

    /// Play `name` from the current directory, then its neighbours as the
    /// transport buttons ask.
    ///
    /// The decoder is silenced on every exit path.
    pub async fn handle_file(&mut self, name: &str) -> Result<HandleOutcome, HandleError> {
        let result = self.play_tracks(name).await;
        let silenced = self.link.write_control(SCI_VOL, VOL_SILENT);

        #[cfg(feature = "emulator")]
        tracing::info!(outcome = ?result, "player closed");

        let outcome = result?;
        silenced?;
        Ok(outcome)
    }

    async fn play_tracks(&mut self, name: &str) -> Result<HandleOutcome, HandleError> {
        let dir = self.cursor.path().map_err(HandleError::Open)?;
        let mut current = file_name(name).map_err(HandleError::Open)?;
        let mut volume_set = false;

        self.surface.clear(Rgb565::WHITE).ok();

        while self.storage.is_present() {
            let path = join_path(&dir, &current).map_err(HandleError::Open)?;
            let file = match self.storage.open_file(&path).await {
                Ok(file) => file,
                Err(StorageError::Removed) => return Ok(HandleOutcome::CardRemoved),
                Err(e) => return Err(HandleError::Open(e)),
            };

            if !volume_set {
                if self.volume.is_audible() {
                    self.volume.apply(&mut self.link)?;
                }
                volume_set = true;
            }

            #[cfg(feature = "defmt")]
            defmt::info!("playing {=str}", path.as_str());
            #[cfg(feature = "emulator")]
            tracing::info!(path = path.as_str(), size = file.size(), "playing");

            let next = match self.play_one(file, &current).await {
                Ok(next) => next,
                Err(HandleError::Storage(StorageError::Removed)) => return Ok(HandleOutcome::CardRemoved),
                Err(e) => return Err(e),
            };

            let selection = match next {
                NextAction::Leave => return Ok(HandleOutcome::Left),
                NextAction::Forward => Selection::Next,
                NextAction::Back => Selection::Previous,
                NextAction::First => Selection::First,
                NextAction::Last => Selection::Last,
            };
            match select_track(&mut self.storage, &dir, &current, selection).await {
                Ok(Some(track)) => current = track,
                Ok(None) => return Ok(HandleOutcome::NoMoreTracks),
                Err(StorageError::Removed) => return Ok(HandleOutcome::CardRemoved),
                Err(e) => return Err(HandleError::Storage(e)),
            }
        }
        Ok(HandleOutcome::CardRemoved)
    }

    async fn play_one(&mut self, file: S::File, name: &FileName) -> Result<NextAction, HandleError> {
        draw_header(&mut self.surface, name, file.size()).ok();
        let mut player = Player::open(file, &mut self.link, self.config)?;

        let mut timer = PlaybackTimer::new();
        timer.draw(&mut self.surface).ok();
        let mut panel = TransportPanel::new();
        panel.draw_all(&mut self.surface, &self.volume);
        VolumeBar::draw(&mut self.surface, self.volume.step()).ok();

        loop {
            // paused and stopped sessions never read, so removal only shows up here
            if !self.storage.is_present() {
                player.abandon(StorageError::Removed);
            }
            match player.tick(&mut self.link).await? {
                Tick::Finished => break,
                Tick::Rewound => {
                    timer.reset();
                    timer.draw(&mut self.surface).ok();
                }
                Tick::Continue => {}
            }
            let fast_forward = self.volume.is_fast_forward();
            if let Some(command) = panel
                .sample(&mut self.touch, &mut self.surface, &mut self.delay, fast_forward)
                .await
            {
                let effect = player.command(command, &mut self.volume, &mut self.link)?;
                panel.show(&mut self.surface, command, effect, &self.volume);
            }
            if timer.update(player.decode_time(&mut self.link)?) {
                timer.draw(&mut self.surface).ok();
            }
            embassy_futures::yield_now().await;
        }

        match player.finish(&mut self.link, &mut self.volume) {
            Ok((next, _report)) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("flushed {=usize} bytes, next {}", _report.fill_bytes, next);
                Ok(next)
            }
            Err(PlaybackError::Storage(e)) if !self.storage.is_present() => {
                #[cfg(feature = "defmt")]
                defmt::warn!("card pulled during playback: {}", e);
                Err(HandleError::Storage(StorageError::Removed))
            }
            Err(e) => Err(e.into()),
        }
    }
}
