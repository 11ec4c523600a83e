//! Now-playing chrome: file header, playback timer and volume bar.
//!
//! Everything is black text on white at fixed positions. The timer counts
//! seconds from the decoder's `SCI_DECODE_TIME` register rather than from a
//! wall clock, so it stands still while paused.

use core::fmt::Write as _;

use embedded_graphics::mono_font::{ascii::FONT_10X20, MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use playback::VolumeChange;

/// Top-left of the file name.
pub const NAME_POSITION: Point = Point::new(29, 0);
/// Top-left of the file size.
pub const SIZE_POSITION: Point = Point::new(240, 0);
/// Top-left of the `hh:mm:ss` timer.
pub const TIMER_POSITION: Point = Point::new(30, 60);

/// Header strip cleared before a new file name is drawn.
const HEADER_AREA: Rectangle = Rectangle::new(Point::new(24, 0), Size::new(427, 32));

fn text_style() -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyleBuilder::new()
        .font(&FONT_10X20)
        .text_color(Rgb565::BLACK)
        .background_color(Rgb565::WHITE)
        .build()
}

/// Draw the file name and its size in bytes at the top of the screen.
pub fn draw_header<D>(target: &mut D, name: &str, size: u64) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    HEADER_AREA.into_styled(PrimitiveStyle::with_fill(Rgb565::WHITE)).draw(target)?;
    Text::with_baseline(name, NAME_POSITION, text_style(), Baseline::Top).draw(target)?;

    let mut label: heapless::String<32> = heapless::String::new();
    // u64::MAX plus " bytes" fits in 32 bytes
    write!(label, "{size} bytes").ok();
    Text::with_baseline(&label, SIZE_POSITION, text_style(), Baseline::Top).draw(target)?;
    Ok(())
}

/// Elapsed playback time, advanced once per tick in which the decoder's
/// decode-time counter moved forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackTimer {
    hours: u8,
    minutes: u8,
    seconds: u8,
    last_decode_time: u16,
}

impl PlaybackTimer {
    /// Timer at `00:00:00`.
    pub const fn new() -> Self {
        Self { hours: 0, minutes: 0, seconds: 0, last_decode_time: 0 }
    }

    /// Feed the latest `SCI_DECODE_TIME` value. Returns `true` when the
    /// displayed time changed.
    ///
    /// A value that went down (rewind, new file) is only remembered.
    pub fn update(&mut self, decode_time: u16) -> bool {
        let advanced = decode_time > self.last_decode_time;
        self.last_decode_time = decode_time;
        if advanced {
            self.tick_second();
        }
        advanced
    }

    fn tick_second(&mut self) {
        self.seconds = self.seconds.saturating_add(1);
        if self.seconds == 60 {
            self.seconds = 0;
            self.minutes = self.minutes.saturating_add(1);
            if self.minutes == 60 {
                self.minutes = 0;
                self.hours = self.hours.saturating_add(1).min(99);
            }
        }
    }

    /// Back to `00:00:00`.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// `(hours, minutes, seconds)`.
    pub const fn hms(&self) -> (u8, u8, u8) {
        (self.hours, self.minutes, self.seconds)
    }

    /// The time as `hh:mm:ss`.
    pub fn text(&self) -> heapless::String<8> {
        let mut out = heapless::String::new();
        write!(out, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds).ok();
        out
    }

    /// Draw the timer at [`TIMER_POSITION`].
    pub fn draw<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        Text::with_baseline(&self.text(), TIMER_POSITION, text_style(), Baseline::Top)
            .draw(target)?;
        Ok(())
    }
}

/// Vertical volume bar between the two volume arrows.
///
/// Rows `248 - step ..= 247` are black; the rest of the column is white. One
/// volume step moves the boundary by one pixel row.
pub struct VolumeBar;

impl VolumeBar {
    /// Left column.
    pub const X_START: i32 = 456;
    /// Right column, inclusive.
    pub const X_END: i32 = 479;
    /// Top row, inclusive.
    pub const Y_TOP: i32 = 56;
    /// Bottom row, inclusive.
    pub const Y_BOTTOM: i32 = 247;

    /// First black row for a given step.
    pub fn first_black_row(step: u8) -> i32 {
        Self::Y_BOTTOM.saturating_add(1).saturating_sub(i32::from(step))
    }

    /// Paint the whole bar for `step`.
    pub fn draw<D>(target: &mut D, step: u8) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let boundary = Self::first_black_row(step).clamp(Self::Y_TOP, Self::Y_BOTTOM.saturating_add(1));
        Self::fill_rows(target, Self::Y_TOP, boundary, Rgb565::WHITE)?;
        Self::fill_rows(target, boundary, Self::Y_BOTTOM.saturating_add(1), Rgb565::BLACK)
    }

    /// Repaint the single row a volume step changed. `step` is the value
    /// after the change.
    pub fn update<D>(target: &mut D, change: VolumeChange, step: u8) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let row = Self::first_black_row(step);
        match change {
            VolumeChange::Louder => Self::fill_rows(target, row, row.saturating_add(1), Rgb565::BLACK),
            VolumeChange::Quieter => {
                let row = row.saturating_sub(1);
                Self::fill_rows(target, row, row.saturating_add(1), Rgb565::WHITE)
            }
            _ => Ok(()),
        }
    }

    /// Fill rows `top..bottom`.
    fn fill_rows<D>(target: &mut D, top: i32, bottom: i32, color: Rgb565) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let width = Self::X_END.saturating_sub(Self::X_START).saturating_add(1);
        let height = bottom.saturating_sub(top);
        if height <= 0 {
            return Ok(());
        }
        let size = Size::new(width.unsigned_abs(), height.unsigned_abs());
        Rectangle::new(Point::new(Self::X_START, top), size)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(target)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::{MockDecoder, MockSurface};
    use playback::VolumeState;

    fn bar_column() -> Rectangle {
        Rectangle::with_corners(
            Point::new(VolumeBar::X_START, VolumeBar::Y_TOP),
            Point::new(VolumeBar::X_END, VolumeBar::Y_BOTTOM),
        )
    }

    #[test]
    fn test_timer_advances_only_on_increase() {
        let mut timer = PlaybackTimer::new();
        assert!(timer.update(1));
        assert!(!timer.update(1));
        assert!(timer.update(2));
        assert!(!timer.update(0), "rewind does not count");
        assert_eq!(timer.hms(), (0, 0, 2));
    }

    #[test]
    fn test_timer_rolls_over_minutes_and_hours() {
        let mut timer = PlaybackTimer::new();
        for t in 1..=3661u16 {
            timer.update(t);
        }
        assert_eq!(timer.hms(), (1, 1, 1));
        assert_eq!(timer.text().as_str(), "01:01:01");
    }

    #[test]
    fn test_timer_reset() {
        let mut timer = PlaybackTimer::new();
        timer.update(5);
        timer.reset();
        assert_eq!(timer.text().as_str(), "00:00:00");
    }

    #[test]
    fn test_timer_draws_text_at_position() {
        let mut surface = MockSurface::new();
        PlaybackTimer::new().draw(&mut surface).unwrap();
        let area = Rectangle::new(TIMER_POSITION, Size::new(80, 20));
        assert!(surface.count_in(&area, Rgb565::WHITE) > 0);
    }

    #[test]
    fn test_header_clears_and_draws() {
        let mut surface = MockSurface::new();
        draw_header(&mut surface, "SONG.MP3", 123_456).unwrap();
        assert!(surface.count_in(&HEADER_AREA, Rgb565::WHITE) > 0);
        assert!(surface.count_in(&HEADER_AREA, Rgb565::BLACK) > 0);
    }

    #[test]
    fn test_bar_initial_height_matches_step() {
        let mut surface = MockSurface::new();
        let step = VolumeState::new().step();
        VolumeBar::draw(&mut surface, step).unwrap();
        assert_eq!(VolumeBar::first_black_row(step), 83);
        assert_eq!(surface.count_in(&bar_column(), Rgb565::BLACK), 24 * usize::from(step));
    }

    #[test]
    fn test_bar_moves_one_row_per_step() {
        let mut dec = MockDecoder::new();
        let mut surface = MockSurface::new();
        let mut volume = VolumeState::new();
        VolumeBar::draw(&mut surface, volume.step()).unwrap();

        let change = volume.volume_up(&mut dec).unwrap();
        VolumeBar::update(&mut surface, change, volume.step()).unwrap();
        assert_eq!(surface.pixel(460, 82), Some(Rgb565::BLACK));
        assert_eq!(surface.count_in(&bar_column(), Rgb565::BLACK), 24 * 166);

        let change = volume.volume_down(&mut dec).unwrap();
        VolumeBar::update(&mut surface, change, volume.step()).unwrap();
        assert_eq!(surface.pixel(460, 82), Some(Rgb565::WHITE));
        assert_eq!(surface.count_in(&bar_column(), Rgb565::BLACK), 24 * 165);
    }
}
