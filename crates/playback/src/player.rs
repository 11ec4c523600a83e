//! Per-tick playback driver.
//!
//! [`Player`] ties one [`PlaybackSession`] to its [`PlaybackEngine`]. The
//! caller owns the loop:
//!
//! ```text
//! let mut player = Player::open(file, &mut link, config)?;
//! while player.tick(&mut link).await? != Tick::Finished {
//!     if let Some(cmd) = ui.sample(..).await { player.command(cmd, &mut volume, &mut link)?; }
//!     timer.update(player.decode_time(&mut link)?);
//! }
//! let next = player.finish(&mut link, &mut volume)?;
//! ```
//!
//! Touch input is therefore only ever applied between ticks, never in the
//! middle of a sub-chunk.

use platform::vs1053::{PAR_PLAY_MODE, PAR_PLAY_MODE_PAUSE_ENA, SCI_DECODE_TIME};
use platform::{DecoderError, DecoderLink, File, StorageError};

use crate::command::{NextAction, TransportCommand};
use crate::config::PlayerConfig;
use crate::engine::{Acknowledged, PlaybackEngine, PlaybackState, Transition};
use crate::error::PlaybackError;
use crate::feeder::{fill, Fill};
use crate::flush::{flush, FlushReport};
use crate::format::StreamReport;
use crate::session::PlaybackSession;
use crate::volume::{VolumeChange, VolumeState};

/// Whether the caller should keep ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    /// Keep calling [`Player::tick`].
    Continue,
    /// A Stop completed: the file and decode time are back at zero. Keep ticking.
    Rewound,
    /// Feeding is over; call [`Player::finish`].
    Finished,
}

/// Why feeding ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionEnd {
    /// The file ran out.
    EndOfFile,
    /// A terminal command completed.
    Exit(NextAction),
    /// Storage failed mid-stream.
    Fault(StorageError),
}

/// Result of applying a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandEffect {
    /// A state-machine transition.
    Transport(Transition),
    /// A volume-path change.
    Volume(VolumeChange),
}

/// A playing file.
pub struct Player<F: File> {
    session: PlaybackSession<F>,
    engine: PlaybackEngine,
    config: PlayerConfig,
    end: Option<SessionEnd>,
}

impl<F: File> Player<F> {
    /// Start a session on an open file: decode time is reset to zero and the
    /// state machine starts in `Playing`.
    pub fn open<L>(file: F, link: &mut L, config: PlayerConfig) -> Result<Self, PlaybackError>
    where
        L: DecoderLink + ?Sized,
    {
        config.validate()?;
        reset_decode_time(link)?;
        let session = PlaybackSession::new(file);

        #[cfg(feature = "defmt")]
        defmt::info!("session open, {=u64} bytes", session.size());

        Ok(Self { session, engine: PlaybackEngine::new(), config, end: None })
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.engine.state()
    }

    /// The open session.
    pub fn session(&self) -> &PlaybackSession<F> {
        &self.session
    }

    /// Most recent report-point snapshot.
    pub fn report(&self) -> Option<StreamReport> {
        self.session.report()
    }

    /// Why feeding ended, once it has.
    pub fn end(&self) -> Option<SessionEnd> {
        self.end
    }

    /// Advance the session by one tick.
    ///
    /// Storage failures end feeding and are reported by [`finish`](Self::finish)
    /// after the flush. Decoder failures are returned immediately.
    pub async fn tick<L>(&mut self, link: &mut L) -> Result<Tick, PlaybackError>
    where
        L: DecoderLink + ?Sized,
    {
        if self.end.is_some() {
            return Ok(Tick::Finished);
        }
        let outcome = fill(&mut self.session, &mut self.engine, link, &self.config).await;
        let end = match outcome {
            Ok(Fill::Fed | Fill::Idle) => return Ok(Tick::Continue),
            Ok(Fill::Acknowledged(Acknowledged::Rewind)) => {
                self.rewind(link).await?;
                return Ok(Tick::Rewound);
            }
            Ok(Fill::Acknowledged(Acknowledged::Exit(next))) => SessionEnd::Exit(next),
            Ok(Fill::EndOfFile) => SessionEnd::EndOfFile,
            Err(PlaybackError::Storage(e)) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("storage fault at {=u64}: {}", self.session.offset(), e);
                SessionEnd::Fault(e)
            }
            Err(e) => return Err(e),
        };
        self.end = Some(end);
        Ok(Tick::Finished)
    }

    /// End feeding because the storage behind the file went away.
    ///
    /// The next [`tick`](Self::tick) reports [`Tick::Finished`] and
    /// [`finish`](Self::finish) returns the fault after the flush. An end
    /// that was already recorded is kept.
    pub fn abandon(&mut self, error: StorageError) {
        if self.end.is_none() {
            #[cfg(feature = "defmt")]
            defmt::warn!("session abandoned at {=u64}: {}", self.session.offset(), error);
            self.end = Some(SessionEnd::Fault(error));
        }
    }

    async fn rewind<L>(&mut self, link: &mut L) -> Result<(), PlaybackError>
    where
        L: DecoderLink + ?Sized,
    {
        if let Err(e) = self.session.rewind().await {
            self.end = Some(SessionEnd::Fault(e));
            return Ok(());
        }
        reset_decode_time(link)?;
        Ok(())
    }

    /// Apply one transport command between ticks.
    pub fn command<L>(
        &mut self,
        command: TransportCommand,
        volume: &mut VolumeState,
        link: &mut L,
    ) -> Result<CommandEffect, DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        if command.is_volume() {
            return volume.handle(command, link).map(CommandEffect::Volume);
        }
        let was_paused = self.engine.state() == PlaybackState::Paused;
        let transition = self.engine.apply(command);
        if self.config.hardware_pause {
            match transition {
                Transition::Paused => set_pause_flag(link, true)?,
                // the cancel handshake needs a running decoder
                _ if was_paused && self.engine.state() != PlaybackState::Paused => set_pause_flag(link, false)?,
                _ => {}
            }
        }
        if let Transition::Exit(next) = transition {
            if self.end.is_none() {
                self.end = Some(SessionEnd::Exit(next));
            }
        }
        Ok(CommandEffect::Transport(transition))
    }

    /// Seconds decoded, as reported by the decoder.
    pub fn decode_time<L>(&self, link: &mut L) -> Result<u16, DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        link.read_control(SCI_DECODE_TIME)
    }

    /// Flush the decoder, release fast-forward and close the file.
    ///
    /// Returns the action the caller should take next. A file that simply
    /// ended moves on to the next track. A storage fault is returned as an
    /// error, after the flush has run.
    pub fn finish<L>(
        mut self,
        link: &mut L,
        volume: &mut VolumeState,
    ) -> Result<(NextAction, FlushReport), PlaybackError>
    where
        L: DecoderLink + ?Sized,
    {
        if self.config.hardware_pause && self.engine.state() == PlaybackState::Paused {
            set_pause_flag(link, false)?;
        }
        let report = flush(
            link,
            &mut self.engine,
            self.session.end_fill_byte(),
            self.session.end_fill_bytes(),
            &self.config,
        )?;
        volume.end_session(link)?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "session closed at {=u64} of {=u64} bytes ({=str})",
            self.session.offset(),
            self.session.size(),
            self.session.format().as_str()
        );

        match self.end {
            Some(SessionEnd::Exit(next)) => Ok((next, report)),
            Some(SessionEnd::Fault(e)) => Err(PlaybackError::Storage(e)),
            Some(SessionEnd::EndOfFile) | None => Ok((NextAction::Forward, report)),
        }
    }
}

/// DECODE_TIME only latches after two consecutive writes.
fn reset_decode_time<L>(link: &mut L) -> Result<(), DecoderError>
where
    L: DecoderLink + ?Sized,
{
    link.write_control(SCI_DECODE_TIME, 0)?;
    link.write_control(SCI_DECODE_TIME, 0)
}

fn set_pause_flag<L>(link: &mut L, paused: bool) -> Result<(), DecoderError>
where
    L: DecoderLink + ?Sized,
{
    let mode = link.read_parameter(PAR_PLAY_MODE)?;
    let mode = if paused { mode | PAR_PLAY_MODE_PAUSE_ENA } else { mode & !PAR_PLAY_MODE_PAUSE_ENA };
    link.write_parameter(PAR_PLAY_MODE, mode)
}
