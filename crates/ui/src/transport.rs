//! Transport buttons on the player screen.
//!
//! Eleven fixed rectangles are hit-tested against one touch sample per tick.
//! Seeking, leaving and mute are disabled while fast-forward is engaged.
//!
//! ```text
//!  ┌──┐                                                       ┌──┐
//!  │⇧ │ name                     N bytes                       │🔈│
//!  └──┘                                                       ├──┤
//!       00:00:00                                              │▲ │
//!                                                             │▒ │
//!                                   ┌────┐                    │▒ │
//!                                   │ ⏩ │                    │▒ │
//!                                   └────┘                    │▒ │
//!     ┌────┐┌────┐┌────┐┌────┐┌────┐┌────┐                    │▒ │
//!     │ ⏮ ││ ◀◀ ││ ⏯ ││ ■  ││ ▶▶ ││ ⏭ │                    │▼ │
//!     └────┘└────┘└────┘└────┘└────┘└────┘                    └──┘
//! ```

use embedded_graphics::prelude::Point;
use embedded_hal_async::delay::DelayNs;
use platform::{DisplaySurface, Icon, IconStyle, TouchPanel};
use playback::{CommandEffect, Transition, TransportCommand, VolumeChange, VolumeState};

use crate::now_playing::VolumeBar;

/// How long a pressed button stays highlighted.
pub const PRESS_FEEDBACK_MS: u32 = 75;

/// Ticks before a pressed volume arrow returns to its idle artwork.
pub const ARROW_REDRAW_TICKS: u8 = 10;

/// Inclusive screen rectangle of one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonArea {
    /// Left column.
    pub x_start: u16,
    /// Top row.
    pub y_start: u16,
    /// Right column, inclusive.
    pub x_end: u16,
    /// Bottom row, inclusive.
    pub y_end: u16,
}

impl ButtonArea {
    const fn new(x_start: u16, y_start: u16, x_end: u16, y_end: u16) -> Self {
        Self { x_start, y_start, x_end, y_end }
    }

    /// Whether pixel `(x, y)` falls on the button.
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x_start && x <= self.x_end && y >= self.y_start && y <= self.y_end
    }

    /// Where the button artwork is blitted.
    pub fn top_left(&self) -> Point {
        Point::new(i32::from(self.x_start), i32::from(self.y_start))
    }
}

/// One of the player screen buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportButton {
    /// Pause or resume.
    PlayPause,
    /// Previous track.
    Back,
    /// Next track.
    Forward,
    /// Rewind and wait.
    Stop,
    /// First track.
    Start,
    /// Last track.
    End,
    /// Back to the file manager.
    FolderUp,
    /// One step quieter.
    VolumeDown,
    /// One step louder.
    VolumeUp,
    /// Mute or unmute.
    Mute,
    /// Engage or release fast-forward.
    FastForward,
}

impl TransportButton {
    /// Every button, in hit-test order. Play/pause shares its left column
    /// with Back and wins the overlap.
    pub const ALL: [Self; 11] = [
        Self::PlayPause,
        Self::Back,
        Self::Forward,
        Self::Stop,
        Self::Start,
        Self::End,
        Self::FolderUp,
        Self::VolumeDown,
        Self::VolumeUp,
        Self::Mute,
        Self::FastForward,
    ];

    /// Screen rectangle.
    pub const fn area(self) -> ButtonArea {
        match self {
            Self::FolderUp => ButtonArea::new(0, 0, 23, 23),
            Self::FastForward => ButtonArea::new(242, 114, 304, 177),
            Self::Start => ButtonArea::new(38, 182, 101, 245),
            Self::Back => ButtonArea::new(106, 182, 174, 245),
            Self::PlayPause => ButtonArea::new(174, 182, 237, 245),
            Self::Stop => ButtonArea::new(242, 182, 305, 245),
            Self::Forward => ButtonArea::new(310, 182, 373, 245),
            Self::End => ButtonArea::new(378, 182, 441, 245),
            Self::VolumeUp => ButtonArea::new(456, 32, 479, 56),
            Self::VolumeDown => ButtonArea::new(456, 248, 479, 271),
            Self::Mute => ButtonArea::new(456, 0, 479, 23),
        }
    }

    /// Command a press emits.
    pub const fn command(self) -> TransportCommand {
        match self {
            Self::PlayPause => TransportCommand::TogglePlayPause,
            Self::Back => TransportCommand::SeekPrevious,
            Self::Forward => TransportCommand::SeekNext,
            Self::Stop => TransportCommand::Stop,
            Self::Start => TransportCommand::SeekFirst,
            Self::End => TransportCommand::SeekLast,
            Self::FolderUp => TransportCommand::LeaveToFileManager,
            Self::VolumeDown => TransportCommand::VolumeDown,
            Self::VolumeUp => TransportCommand::VolumeUp,
            Self::Mute => TransportCommand::ToggleMute,
            Self::FastForward => TransportCommand::ToggleFastForward,
        }
    }

    /// Artwork shown when a session opens.
    pub const fn icon(self) -> Icon {
        match self {
            Self::PlayPause => Icon::Pause,
            Self::Back => Icon::Back,
            Self::Forward => Icon::Forward,
            Self::Stop => Icon::Stop,
            Self::Start => Icon::Start,
            Self::End => Icon::End,
            Self::FolderUp => Icon::FolderUp,
            Self::VolumeDown => Icon::ArrowDown,
            Self::VolumeUp => Icon::ArrowUp,
            Self::Mute => Icon::SpeakerOn,
            Self::FastForward => Icon::FastForward,
        }
    }
}

/// Find the button under pixel `(x, y)`.
///
/// Buttons whose command is locked while fast-forwarding are skipped, so a
/// touch on them emits nothing.
///
/// ```
/// use ui::{hit_test, TransportButton};
///
/// assert_eq!(hit_test(200, 200, false), Some(TransportButton::PlayPause));
/// assert_eq!(hit_test(120, 200, true), None);
/// assert_eq!(hit_test(10, 100, false), None);
/// ```
pub fn hit_test(x: u16, y: u16, fast_forward: bool) -> Option<TransportButton> {
    TransportButton::ALL.into_iter().find(|button| {
        button.area().contains(x, y)
            && !(fast_forward && button.command().is_locked_by_fast_forward())
    })
}

/// Touch sampling and button artwork bookkeeping for one player screen.
///
/// Draw failures are cosmetic and never stop playback, so every draw result
/// in here is discarded.
#[derive(Debug, Default)]
pub struct TransportPanel {
    ticks_since_press: u8,
    arrow_up_pressed: bool,
    arrow_down_pressed: bool,
}

impl TransportPanel {
    /// Panel with every button idle.
    pub const fn new() -> Self {
        Self { ticks_since_press: 0, arrow_up_pressed: false, arrow_down_pressed: false }
    }

    /// Paint every button in its idle state for a fresh session.
    pub fn draw_all<S>(&mut self, surface: &mut S, volume: &VolumeState)
    where
        S: DisplaySurface,
    {
        for button in TransportButton::ALL {
            let icon = match button {
                TransportButton::Mute if !volume.is_audible() => Icon::SpeakerOff,
                other => other.icon(),
            };
            let style = if button == TransportButton::FastForward && volume.is_fast_forward() {
                IconStyle::Pressed
            } else {
                IconStyle::Idle
            };
            surface.draw_icon(icon, style, button.area().top_left()).ok();
        }
        self.arrow_up_pressed = false;
        self.arrow_down_pressed = false;
        self.ticks_since_press = 0;
    }

    /// Sample the touch panel once.
    ///
    /// At most one coordinate is read and the rest of the controller queue is
    /// discarded. A hit plays its pressed feedback before the command is
    /// returned, and a pending volume-arrow redraw is advanced by one tick.
    pub async fn sample<T, S, D>(
        &mut self,
        touch: &mut T,
        surface: &mut S,
        delay: &mut D,
        fast_forward: bool,
    ) -> Option<TransportCommand>
    where
        T: TouchPanel + ?Sized,
        S: DisplaySurface,
        D: DelayNs,
    {
        let pressed = read_press(touch, fast_forward);
        touch.reset_queue();

        if let Some(button) = pressed {
            #[cfg(feature = "defmt")]
            defmt::debug!("button {}", button);
            self.press_feedback(button, surface, delay).await;
        }
        self.advance_redraw(surface);

        pressed.map(TransportButton::command)
    }

    async fn press_feedback<S, D>(&mut self, button: TransportButton, surface: &mut S, delay: &mut D)
    where
        S: DisplaySurface,
        D: DelayNs,
    {
        let at = button.area().top_left();
        match button {
            TransportButton::Back
            | TransportButton::Forward
            | TransportButton::Start
            | TransportButton::End
            | TransportButton::Stop => {
                surface.draw_icon(button.icon(), IconStyle::Pressed, at).ok();
                delay.delay_ms(PRESS_FEEDBACK_MS).await;
                surface.draw_icon(button.icon(), IconStyle::Idle, at).ok();
            }
            TransportButton::FolderUp => {
                // the screen is torn down right after, no idle redraw
                surface.draw_icon(button.icon(), IconStyle::Pressed, at).ok();
                delay.delay_ms(PRESS_FEEDBACK_MS).await;
            }
            TransportButton::VolumeUp | TransportButton::VolumeDown => {
                surface.draw_icon(button.icon(), IconStyle::Pressed, at).ok();
                if button == TransportButton::VolumeUp {
                    self.arrow_up_pressed = true;
                } else {
                    self.arrow_down_pressed = true;
                }
                self.ticks_since_press = 0;
            }
            TransportButton::PlayPause | TransportButton::Mute | TransportButton::FastForward => {
                delay.delay_ms(PRESS_FEEDBACK_MS).await;
            }
        }
    }

    fn advance_redraw<S>(&mut self, surface: &mut S)
    where
        S: DisplaySurface,
    {
        if self.ticks_since_press < ARROW_REDRAW_TICKS {
            self.ticks_since_press = self.ticks_since_press.saturating_add(1);
            return;
        }
        // one arrow per redraw; the other waits for the next round
        let arrow = if self.arrow_up_pressed {
            self.arrow_up_pressed = false;
            Some(TransportButton::VolumeUp)
        } else if self.arrow_down_pressed {
            self.arrow_down_pressed = false;
            Some(TransportButton::VolumeDown)
        } else {
            None
        };
        if let Some(arrow) = arrow {
            surface.draw_icon(arrow.icon(), IconStyle::Idle, arrow.area().top_left()).ok();
        }
        self.ticks_since_press = 0;
    }

    /// Reflect the outcome of an applied command on screen.
    pub fn show<S>(
        &mut self,
        surface: &mut S,
        command: TransportCommand,
        effect: CommandEffect,
        volume: &VolumeState,
    ) where
        S: DisplaySurface,
    {
        let play_pause = TransportButton::PlayPause.area().top_left();
        let mute = TransportButton::Mute.area().top_left();
        match effect {
            CommandEffect::Transport(Transition::Paused) => {
                surface.draw_icon(Icon::Play, IconStyle::Idle, play_pause).ok();
            }
            CommandEffect::Transport(Transition::Resumed) => {
                surface.draw_icon(Icon::Pause, IconStyle::Idle, play_pause).ok();
            }
            CommandEffect::Transport(Transition::CancelQueued)
                if command == TransportCommand::Stop =>
            {
                surface.draw_icon(Icon::Play, IconStyle::Idle, play_pause).ok();
            }
            CommandEffect::Transport(_) | CommandEffect::Volume(VolumeChange::None) => {}
            CommandEffect::Volume(change @ (VolumeChange::Louder | VolumeChange::Quieter)) => {
                VolumeBar::update(surface, change, volume.step()).ok();
            }
            CommandEffect::Volume(VolumeChange::Mute(muted)) => {
                let icon = if muted { Icon::SpeakerOff } else { Icon::SpeakerOn };
                surface.draw_icon(icon, IconStyle::Idle, mute).ok();
            }
            CommandEffect::Volume(VolumeChange::FastForward(on)) => {
                if !volume.is_muted() {
                    let icon = if on { Icon::SpeakerOff } else { Icon::SpeakerOn };
                    surface.draw_icon(icon, IconStyle::Idle, mute).ok();
                }
                let style = if on { IconStyle::Pressed } else { IconStyle::Idle };
                let at = TransportButton::FastForward.area().top_left();
                surface.draw_icon(Icon::FastForward, style, at).ok();
            }
        }
    }
}

fn read_press<T>(touch: &mut T, fast_forward: bool) -> Option<TransportButton>
where
    T: TouchPanel + ?Sized,
{
    if !touch.poll_event() || touch.queue_depth() == 0 {
        return None;
    }
    let (raw_x, raw_y) = touch.read_coordinate();
    let (x, y) = touch.normalize(raw_x, raw_y)?;
    hit_test(x, y, fast_forward)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use platform::mocks::{MockDecoder, MockDelay, MockSurface, MockTouch};

    fn center(button: TransportButton) -> (u16, u16) {
        let a = button.area();
        ((a.x_start + a.x_end) / 2, (a.y_start + a.y_end) / 2)
    }

    #[test]
    fn test_every_button_hits_itself() {
        for button in TransportButton::ALL {
            let (x, y) = center(button);
            assert_eq!(hit_test(x, y, false), Some(button), "{button:?}");
        }
    }

    #[test]
    fn test_edges_are_inclusive() {
        assert_eq!(hit_test(0, 0, false), Some(TransportButton::FolderUp));
        assert_eq!(hit_test(23, 23, false), Some(TransportButton::FolderUp));
        assert_eq!(hit_test(24, 23, false), None);
        assert_eq!(hit_test(479, 271, false), Some(TransportButton::VolumeDown));
    }

    #[test]
    fn test_shared_column_goes_to_play_pause() {
        assert_eq!(hit_test(174, 200, false), Some(TransportButton::PlayPause));
        assert_eq!(hit_test(173, 200, false), Some(TransportButton::Back));
    }

    #[test]
    fn test_fast_forward_locks_navigation_and_mute() {
        for button in [
            TransportButton::Back,
            TransportButton::Forward,
            TransportButton::Start,
            TransportButton::End,
            TransportButton::FolderUp,
            TransportButton::Mute,
        ] {
            let (x, y) = center(button);
            assert_eq!(hit_test(x, y, true), None, "{button:?}");
        }
        for button in [
            TransportButton::PlayPause,
            TransportButton::Stop,
            TransportButton::VolumeUp,
            TransportButton::VolumeDown,
            TransportButton::FastForward,
        ] {
            let (x, y) = center(button);
            assert_eq!(hit_test(x, y, true), Some(button), "{button:?}");
        }
    }

    #[test]
    fn test_empty_space_is_no_button() {
        assert_eq!(hit_test(100, 100, false), None);
        assert_eq!(hit_test(450, 150, false), None);
    }

    #[tokio::test]
    async fn test_sample_emits_command_and_resets_queue() {
        let mut touch = MockTouch::new().with_queue_extra(4);
        let (x, y) = center(TransportButton::Forward);
        touch.tap(x, y);
        let mut surface = MockSurface::new();
        let mut delay = MockDelay::new();
        let mut panel = TransportPanel::new();

        let cmd = panel.sample(&mut touch, &mut surface, &mut delay, false).await;
        assert_eq!(cmd, Some(TransportCommand::SeekNext));
        assert_eq!(touch.resets(), 1);
        assert_eq!(delay.total_ms(), 75);
        let at = TransportButton::Forward.area().top_left();
        assert_eq!(
            surface.icons(),
            &[(Icon::Forward, IconStyle::Pressed, at), (Icon::Forward, IconStyle::Idle, at)]
        );
    }

    #[tokio::test]
    async fn test_idle_poll_still_resets_queue() {
        let mut touch = MockTouch::new();
        touch.idle(1);
        let mut surface = MockSurface::new();
        let mut delay = MockDelay::new();
        let mut panel = TransportPanel::new();
        assert_eq!(panel.sample(&mut touch, &mut surface, &mut delay, false).await, None);
        assert_eq!(touch.resets(), 1);
        assert_eq!(delay.total_ns(), 0);
    }

    #[tokio::test]
    async fn test_border_touch_is_ignored() {
        let mut touch = MockTouch::new();
        touch.tap_raw(100, 2000);
        let mut surface = MockSurface::new();
        let mut delay = MockDelay::new();
        let mut panel = TransportPanel::new();
        assert_eq!(panel.sample(&mut touch, &mut surface, &mut delay, false).await, None);
        assert!(surface.icons().is_empty());
    }

    #[tokio::test]
    async fn test_locked_press_draws_nothing() {
        let mut touch = MockTouch::new();
        let (x, y) = center(TransportButton::Back);
        touch.tap(x, y);
        let mut surface = MockSurface::new();
        let mut delay = MockDelay::new();
        let mut panel = TransportPanel::new();
        assert_eq!(panel.sample(&mut touch, &mut surface, &mut delay, true).await, None);
        assert!(surface.icons().is_empty());
        assert_eq!(delay.total_ns(), 0);
    }

    #[tokio::test]
    async fn test_arrow_returns_to_idle_after_ten_ticks() {
        let mut touch = MockTouch::new();
        let (x, y) = center(TransportButton::VolumeUp);
        touch.tap(x, y).idle(20);
        let mut surface = MockSurface::new();
        let mut delay = MockDelay::new();
        let mut panel = TransportPanel::new();

        let cmd = panel.sample(&mut touch, &mut surface, &mut delay, false).await;
        assert_eq!(cmd, Some(TransportCommand::VolumeUp));
        let at = TransportButton::VolumeUp.area().top_left();
        assert_eq!(surface.icons(), &[(Icon::ArrowUp, IconStyle::Pressed, at)]);

        for _ in 0..9 {
            panel.sample(&mut touch, &mut surface, &mut delay, false).await;
        }
        assert_eq!(surface.icons().len(), 1);
        panel.sample(&mut touch, &mut surface, &mut delay, false).await;
        assert_eq!(surface.icons().last(), Some(&(Icon::ArrowUp, IconStyle::Idle, at)));
    }

    #[tokio::test]
    async fn test_draw_failure_does_not_lose_command() {
        let mut touch = MockTouch::new();
        let (x, y) = center(TransportButton::Stop);
        touch.tap(x, y);
        let mut surface = MockSurface::new();
        surface.set_failing(true);
        let mut delay = MockDelay::new();
        let mut panel = TransportPanel::new();
        let cmd = panel.sample(&mut touch, &mut surface, &mut delay, false).await;
        assert_eq!(cmd, Some(TransportCommand::Stop));
    }

    #[test]
    fn test_show_reflects_pause_and_mute() {
        let mut surface = MockSurface::new();
        let mut panel = TransportPanel::new();
        let volume = VolumeState::new();
        panel.show(
            &mut surface,
            TransportCommand::TogglePlayPause,
            CommandEffect::Transport(Transition::Paused),
            &volume,
        );
        panel.show(
            &mut surface,
            TransportCommand::ToggleMute,
            CommandEffect::Volume(VolumeChange::Mute(true)),
            &volume,
        );
        let icons: Vec<Icon> = surface.icons().iter().map(|(icon, _, _)| *icon).collect();
        assert_eq!(icons, vec![Icon::Play, Icon::SpeakerOff]);
    }

    #[test]
    fn test_show_fast_forward_keeps_user_mute_icon() {
        let mut dec = MockDecoder::new();
        let mut surface = MockSurface::new();
        let mut panel = TransportPanel::new();
        let mut volume = VolumeState::new();
        volume.toggle_mute(&mut dec).unwrap();
        let change = volume.toggle_fast_forward(&mut dec).unwrap();
        panel.show(&mut surface, TransportCommand::ToggleFastForward, CommandEffect::Volume(change), &volume);
        let at = TransportButton::FastForward.area().top_left();
        assert_eq!(surface.icons(), &[(Icon::FastForward, IconStyle::Pressed, at)]);
    }

    #[test]
    fn test_draw_all_reflects_mute() {
        let mut dec = MockDecoder::new();
        let mut surface = MockSurface::new();
        let mut volume = VolumeState::new();
        volume.toggle_mute(&mut dec).unwrap();
        TransportPanel::new().draw_all(&mut surface, &volume);
        assert_eq!(surface.icons().len(), 11);
        assert!(surface.icons().iter().any(|(icon, _, _)| *icon == Icon::SpeakerOff));
    }
}
