//! Display surface abstraction
//!
//! The LCD is a 480×272 RGB565 panel behind a parallel-bus controller.
//! Rectangles and text go through [`embedded_graphics::draw_target::DrawTarget`];
//! button artwork lives in flash on the driver side and is blitted by
//! [`DisplaySurface::draw_icon`].

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};

/// Panel width in pixels.
pub const SCREEN_WIDTH: u32 = 480;
/// Panel height in pixels.
pub const SCREEN_HEIGHT: u32 = 272;

/// Drawing surface used by the transport UI.
pub trait DisplaySurface: DrawTarget<Color = Rgb565> {
    /// Blit a piece of button artwork with its top-left corner at `top_left`.
    fn draw_icon(
        &mut self,
        icon: Icon,
        style: IconStyle,
        top_left: Point,
    ) -> Result<(), Self::Error>;
}

/// Button artwork stored with the display driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Icon {
    /// Folder with an up arrow (leave to file manager).
    FolderUp,
    /// Speaker with sound waves.
    SpeakerOn,
    /// Crossed-out speaker.
    SpeakerOff,
    /// Volume-up arrow.
    ArrowUp,
    /// Volume-down arrow.
    ArrowDown,
    /// Fast-forward chevrons.
    FastForward,
    /// Skip to first track.
    Start,
    /// Previous track.
    Back,
    /// Play triangle.
    Play,
    /// Pause bars.
    Pause,
    /// Stop square.
    Stop,
    /// Next track.
    Forward,
    /// Skip to last track.
    End,
}

/// Idle or pressed variant of a piece of artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IconStyle {
    /// Resting artwork.
    Idle,
    /// Highlighted artwork shown while a press is acknowledged.
    Pressed,
}
