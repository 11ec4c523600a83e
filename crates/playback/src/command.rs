//! Transport commands and the actions that end a session.

/// What the caller should open after a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NextAction {
    /// Return to the file manager.
    Leave,
    /// Next eligible file in the directory.
    Forward,
    /// Previous eligible file in the directory.
    Back,
    /// First eligible file in the directory.
    First,
    /// Last eligible file in the directory.
    Last,
}

/// The action recorded when a cancel is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TerminalAction {
    /// Rewind and keep the session open.
    Stop,
    /// Close the session and move on.
    Navigate(NextAction),
}

/// A command emitted by the transport UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportCommand {
    /// Pause, or resume from pause or stop.
    TogglePlayPause,
    /// Rewind to the start and wait.
    Stop,
    /// Jump to the first track.
    SeekFirst,
    /// Jump to the last track.
    SeekLast,
    /// Jump to the next track.
    SeekNext,
    /// Jump to the previous track.
    SeekPrevious,
    /// Back to the file manager.
    LeaveToFileManager,
    /// One step louder.
    VolumeUp,
    /// One step quieter.
    VolumeDown,
    /// Mute or unmute.
    ToggleMute,
    /// Engage or release fast-forward.
    ToggleFastForward,
}

impl TransportCommand {
    /// The terminal action this command requests, if any.
    pub const fn terminal_action(self) -> Option<TerminalAction> {
        let next = match self {
            Self::Stop => return Some(TerminalAction::Stop),
            Self::SeekFirst => NextAction::First,
            Self::SeekLast => NextAction::Last,
            Self::SeekNext => NextAction::Forward,
            Self::SeekPrevious => NextAction::Back,
            Self::LeaveToFileManager => NextAction::Leave,
            _ => return None,
        };
        Some(TerminalAction::Navigate(next))
    }

    /// Handled by the volume path, never by the state machine.
    pub const fn is_volume(self) -> bool {
        matches!(
            self,
            Self::VolumeUp | Self::VolumeDown | Self::ToggleMute | Self::ToggleFastForward
        )
    }

    /// Disabled while fast-forward is engaged.
    pub const fn is_locked_by_fast_forward(self) -> bool {
        matches!(
            self,
            Self::SeekFirst
                | Self::SeekLast
                | Self::SeekNext
                | Self::SeekPrevious
                | Self::LeaveToFileManager
                | Self::ToggleMute
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_commands_map_to_next_actions() {
        assert_eq!(
            TransportCommand::SeekNext.terminal_action(),
            Some(TerminalAction::Navigate(NextAction::Forward))
        );
        assert_eq!(
            TransportCommand::SeekPrevious.terminal_action(),
            Some(TerminalAction::Navigate(NextAction::Back))
        );
        assert_eq!(TransportCommand::Stop.terminal_action(), Some(TerminalAction::Stop));
        assert_eq!(TransportCommand::TogglePlayPause.terminal_action(), None);
        assert_eq!(TransportCommand::VolumeUp.terminal_action(), None);
    }

    #[test]
    fn stop_and_play_survive_fast_forward() {
        assert!(!TransportCommand::Stop.is_locked_by_fast_forward());
        assert!(!TransportCommand::TogglePlayPause.is_locked_by_fast_forward());
        assert!(!TransportCommand::ToggleFastForward.is_locked_by_fast_forward());
        assert!(TransportCommand::ToggleMute.is_locked_by_fast_forward());
    }
}
