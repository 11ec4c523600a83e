//! Playback state machine.
//!
//! `PlaybackEngine` tracks whether the session is playing, paused, winding
//! down through the decoder's two-phase cancel, or stopped. It owns no file
//! and no buffer; the only I/O it performs is the cancel handshake itself,
//! so the handshake can be driven identically from the feeder (once per
//! sub-chunk) and from the flush protocol.
//!
//! ```text
//!            TogglePlayPause
//!   Playing ◄───────────────► Paused
//!      │  terminal command      │
//!      └──────────┬─────────────┘
//!                 ▼
//!          CancelRequested ── one SCI_MODE write ──► CancelAcknowledging
//!                                                        │ SM_CANCEL clear
//!                                                        ▼
//!                                                     Stopped
//! ```

use platform::vs1053::{SCI_MODE, SM_CANCEL};
use platform::{DecoderError, DecoderLink};

use crate::command::{NextAction, TerminalAction, TransportCommand};

/// Current playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    /// The feeder is pushing data.
    Playing,
    /// The feeder is idle; the position is kept.
    Paused,
    /// A terminal command arrived; the cancel bit has not been sent yet.
    CancelRequested,
    /// The cancel bit was sent; feeding continues until it reads clear.
    CancelAcknowledging,
    /// The decoder is idle. Either rewound after Stop or about to exit.
    Stopped,
}

impl PlaybackState {
    /// States in which the feeder may read the file and write audio.
    pub const fn is_feeding(self) -> bool {
        matches!(self, Self::Playing | Self::CancelRequested | Self::CancelAcknowledging)
    }
}

/// Side effect of a command the caller has to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// Nothing changed.
    None,
    /// Playing → Paused.
    Paused,
    /// Paused or Stopped → Playing.
    Resumed,
    /// A cancel is now queued or its recorded action changed.
    CancelQueued,
    /// The decoder is already idle; end the session with this action.
    Exit(NextAction),
}

/// What a completed cancel handshake means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Acknowledged {
    /// Rewind to offset 0 and stay open in `Stopped`.
    Rewind,
    /// Close the session with this action.
    Exit(NextAction),
}

/// Pure state machine for the playback session.
#[derive(Debug)]
pub struct PlaybackEngine {
    state: PlaybackState,
    pending: Option<TerminalAction>,
    cancel_polls: u32,
}

impl PlaybackEngine {
    /// A fresh session starts playing.
    pub const fn new() -> Self {
        Self { state: PlaybackState::Playing, pending: None, cancel_polls: 0 }
    }

    /// Return the current [`PlaybackState`].
    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    /// Action recorded for the cancel in flight.
    pub const fn pending(&self) -> Option<TerminalAction> {
        self.pending
    }

    /// Mode-register polls made while acknowledging the last cancel.
    pub const fn cancel_polls(&self) -> u32 {
        self.cancel_polls
    }

    /// Apply a transport command. Volume commands are not handled here and
    /// return [`Transition::None`].
    pub fn apply(&mut self, command: TransportCommand) -> Transition {
        use PlaybackState::{CancelAcknowledging, CancelRequested, Paused, Playing, Stopped};

        if command == TransportCommand::TogglePlayPause {
            return match self.state {
                Playing => {
                    self.state = Paused;
                    Transition::Paused
                }
                Paused | Stopped => {
                    self.state = Playing;
                    self.pending = None;
                    Transition::Resumed
                }
                CancelRequested | CancelAcknowledging => Transition::None,
            };
        }

        let Some(action) = command.terminal_action() else {
            return Transition::None;
        };
        match (self.state, action) {
            (Playing | Paused, _) => {
                self.state = CancelRequested;
                self.pending = Some(action);
                self.cancel_polls = 0;
                Transition::CancelQueued
            }
            (CancelRequested | CancelAcknowledging, TerminalAction::Stop) => {
                // Stop never downgrades a pending navigation.
                if self.pending.is_none() {
                    self.pending = Some(TerminalAction::Stop);
                }
                Transition::None
            }
            (CancelRequested | CancelAcknowledging, TerminalAction::Navigate(_)) => {
                self.pending = Some(action);
                Transition::CancelQueued
            }
            (Stopped, TerminalAction::Stop) => Transition::None,
            (Stopped, TerminalAction::Navigate(next)) => Transition::Exit(next),
        }
    }

    /// Queue a cancel for the end of the stream if none is in flight.
    ///
    /// Returns `true` when a handshake is (now) in progress.
    pub fn request_final_cancel(&mut self) -> bool {
        match self.state {
            PlaybackState::Playing | PlaybackState::Paused => {
                self.state = PlaybackState::CancelRequested;
                self.cancel_polls = 0;
                true
            }
            PlaybackState::CancelRequested | PlaybackState::CancelAcknowledging => true,
            PlaybackState::Stopped => false,
        }
    }

    /// In `CancelRequested`, read `SCI_MODE` and write it back once with
    /// `SM_CANCEL` set. No-op in any other state.
    pub fn fire_cancel<L>(&mut self, link: &mut L) -> Result<(), DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        if self.state != PlaybackState::CancelRequested {
            return Ok(());
        }
        let mode = link.read_control(SCI_MODE)?;
        link.write_control(SCI_MODE, mode | SM_CANCEL)?;
        self.state = PlaybackState::CancelAcknowledging;

        #[cfg(feature = "defmt")]
        defmt::debug!("cancel sent, mode {=u16:#06x}", mode);

        Ok(())
    }

    /// In `CancelAcknowledging`, poll `SCI_MODE` once.
    ///
    /// Returns what the session should do when the cancel bit has cleared;
    /// `None` while it is still set or when no cancel is in flight.
    pub fn poll_cancel<L>(&mut self, link: &mut L) -> Result<Option<Acknowledged>, DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        if self.state != PlaybackState::CancelAcknowledging {
            return Ok(None);
        }
        let mode = link.read_control(SCI_MODE)?;
        self.cancel_polls = self.cancel_polls.saturating_add(1);
        if mode & SM_CANCEL != 0 {
            return Ok(None);
        }
        self.state = PlaybackState::Stopped;

        #[cfg(feature = "defmt")]
        defmt::debug!("cancel acknowledged after {=u32} polls", self.cancel_polls);

        Ok(Some(match self.pending.take() {
            Some(TerminalAction::Stop) => Acknowledged::Rewind,
            Some(TerminalAction::Navigate(next)) => Acknowledged::Exit(next),
            None => Acknowledged::Exit(NextAction::Forward),
        }))
    }
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::MockDecoder;

    fn cancelled(engine: &mut PlaybackEngine, dec: &mut MockDecoder) -> (u32, Acknowledged) {
        engine.fire_cancel(dec).unwrap();
        let mut iterations = 0;
        loop {
            iterations += 1;
            if let Some(ack) = engine.poll_cancel(dec).unwrap() {
                return (iterations, ack);
            }
            assert!(iterations < 100, "cancel never acknowledged");
        }
    }

    #[test]
    fn test_engine_starts_playing() {
        let engine = PlaybackEngine::new();
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_toggle_pauses_and_resumes() {
        let mut engine = PlaybackEngine::new();
        assert_eq!(engine.apply(TransportCommand::TogglePlayPause), Transition::Paused);
        assert_eq!(engine.state(), PlaybackState::Paused);
        assert_eq!(engine.apply(TransportCommand::TogglePlayPause), Transition::Resumed);
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_terminal_from_paused_skips_playing() {
        let mut engine = PlaybackEngine::new();
        engine.apply(TransportCommand::TogglePlayPause);
        engine.apply(TransportCommand::SeekNext);
        assert_eq!(engine.state(), PlaybackState::CancelRequested);
        assert_eq!(engine.pending(), Some(TerminalAction::Navigate(NextAction::Forward)));
    }

    #[test]
    fn test_cancel_fires_exactly_one_mode_write() {
        let mut dec = MockDecoder::new().cancel_ack_after(Some(3));
        let mut engine = PlaybackEngine::new();
        engine.apply(TransportCommand::SeekPrevious);
        engine.fire_cancel(&mut dec).unwrap();
        engine.fire_cancel(&mut dec).unwrap();
        assert_eq!(dec.writes_to(SCI_MODE), vec![SM_CANCEL]);
        assert_eq!(engine.state(), PlaybackState::CancelAcknowledging);
    }

    #[test]
    fn test_cancel_takes_exactly_k_polls() {
        for k in 1..=6 {
            let mut dec = MockDecoder::new().cancel_ack_after(Some(k));
            let mut engine = PlaybackEngine::new();
            engine.apply(TransportCommand::SeekNext);
            let (iterations, ack) = cancelled(&mut engine, &mut dec);
            assert_eq!(iterations, k);
            assert_eq!(engine.cancel_polls(), k);
            assert_eq!(ack, Acknowledged::Exit(NextAction::Forward));
            assert_eq!(engine.state(), PlaybackState::Stopped);
        }
    }

    #[test]
    fn test_stop_acknowledges_as_rewind() {
        let mut dec = MockDecoder::new();
        let mut engine = PlaybackEngine::new();
        engine.apply(TransportCommand::Stop);
        let (_, ack) = cancelled(&mut engine, &mut dec);
        assert_eq!(ack, Acknowledged::Rewind);
        assert_eq!(engine.pending(), None);
    }

    #[test]
    fn test_navigation_replaces_pending_but_stop_does_not() {
        let mut engine = PlaybackEngine::new();
        engine.apply(TransportCommand::Stop);
        engine.apply(TransportCommand::SeekLast);
        assert_eq!(engine.pending(), Some(TerminalAction::Navigate(NextAction::Last)));
        engine.apply(TransportCommand::Stop);
        assert_eq!(engine.pending(), Some(TerminalAction::Navigate(NextAction::Last)));
        engine.apply(TransportCommand::LeaveToFileManager);
        assert_eq!(engine.pending(), Some(TerminalAction::Navigate(NextAction::Leave)));
    }

    #[test]
    fn test_toggle_ignored_during_cancel() {
        let mut engine = PlaybackEngine::new();
        engine.apply(TransportCommand::SeekFirst);
        assert_eq!(engine.apply(TransportCommand::TogglePlayPause), Transition::None);
        assert_eq!(engine.state(), PlaybackState::CancelRequested);
    }

    #[test]
    fn test_stopped_session_resumes_or_exits() {
        let mut dec = MockDecoder::new();
        let mut engine = PlaybackEngine::new();
        engine.apply(TransportCommand::Stop);
        cancelled(&mut engine, &mut dec);
        assert_eq!(engine.apply(TransportCommand::Stop), Transition::None);
        assert_eq!(
            engine.apply(TransportCommand::SeekNext),
            Transition::Exit(NextAction::Forward)
        );
        assert_eq!(engine.apply(TransportCommand::TogglePlayPause), Transition::Resumed);
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_final_cancel_only_when_not_stopped() {
        let mut engine = PlaybackEngine::new();
        assert!(engine.request_final_cancel());
        assert_eq!(engine.state(), PlaybackState::CancelRequested);

        let mut dec = MockDecoder::new();
        cancelled(&mut engine, &mut dec);
        assert!(!engine.request_final_cancel());
    }
}
