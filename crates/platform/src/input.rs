//! Touch input abstraction
//!
//! The touch controller keeps a FIFO of raw 12-bit samples. The transport UI
//! polls it once per player tick, reads at most one coordinate and then
//! discards whatever else queued up, so a held finger produces one command
//! per tick rather than a burst.

use crate::display::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Touch controller collaborator.
pub trait TouchPanel {
    /// Return `true` when the controller reports a touch.
    fn poll_event(&mut self) -> bool;

    /// Number of samples waiting in the controller FIFO.
    fn queue_depth(&mut self) -> u8;

    /// Pop one raw sample from the FIFO.
    fn read_coordinate(&mut self) -> (u16, u16);

    /// Map a raw sample to screen pixels; `None` outside the active area.
    fn normalize(&self, x: u16, y: u16) -> Option<(u16, u16)> {
        TouchCalibration::DEFAULT.normalize(x, y)
    }

    /// Drop every queued sample.
    fn reset_queue(&mut self);
}

/// Raw-to-pixel mapping for the resistive panel.
///
/// Samples outside `[x_min, x_max) × [y_min, y_max)` fall on the glass
/// border and are rejected. Inside, raw values are scaled by 1/10 and
/// stretched linearly over the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchCalibration {
    /// Smallest accepted raw x.
    pub x_min: u16,
    /// First rejected raw x.
    pub x_max: u16,
    /// Smallest accepted raw y.
    pub y_min: u16,
    /// First rejected raw y.
    pub y_max: u16,
}

impl TouchCalibration {
    /// Calibration measured on the 4.3" panel.
    pub const DEFAULT: Self = Self { x_min: 150, x_max: 3960, y_min: 240, y_max: 3860 };

    /// Map a raw sample to pixel coordinates.
    ///
    /// ```
    /// use platform::TouchCalibration;
    ///
    /// let cal = TouchCalibration::DEFAULT;
    /// assert_eq!(cal.normalize(150, 240), Some((0, 0)));
    /// assert_eq!(cal.normalize(3959, 3859), Some((479, 271)));
    /// assert_eq!(cal.normalize(100, 2000), None);
    /// ```
    pub fn normalize(&self, x: u16, y: u16) -> Option<(u16, u16)> {
        if !(self.x_min..self.x_max).contains(&x) || !(self.y_min..self.y_max).contains(&y) {
            return None;
        }
        let px = Self::scale(x, self.x_min, self.x_max, SCREEN_WIDTH)?;
        let py = Self::scale(y, self.y_min, self.y_max, SCREEN_HEIGHT)?;
        Some((px, py))
    }

    /// Approximate inverse of [`normalize`](Self::normalize): a raw sample
    /// that lands on or just past pixel `(x, y)`.
    pub fn raw_for_pixel(&self, x: u16, y: u16) -> Option<(u16, u16)> {
        let rx = Self::unscale(x, self.x_min, self.x_max, SCREEN_WIDTH)?;
        let ry = Self::unscale(y, self.y_min, self.y_max, SCREEN_HEIGHT)?;
        Some((rx, ry))
    }

    /// `((raw / 10) - min / 10) * (extent - 1) / span`
    fn scale(raw: u16, min: u16, max: u16, extent: u32) -> Option<u16> {
        let offset = u32::from(raw / 10).checked_sub(u32::from(min / 10))?;
        let span = Self::span(min, max)?;
        let px = offset.checked_mul(extent.checked_sub(1)?)?.checked_div(span)?;
        u16::try_from(px).ok()
    }

    fn unscale(px: u16, min: u16, max: u16, extent: u32) -> Option<u16> {
        let span = Self::span(min, max)?;
        let last = extent.checked_sub(1)?;
        // ceil(px * span / last) keeps the forward mapping at or above px
        let offset = u32::from(px)
            .checked_mul(span)?
            .checked_add(last.checked_sub(1)?)?
            .checked_div(last)?;
        let raw = offset.checked_add(u32::from(min / 10))?.checked_mul(10)?;
        u16::try_from(raw).ok()
    }

    fn span(min: u16, max: u16) -> Option<u32> {
        u32::from(max / 10)
            .checked_sub(u32::from(min / 10))?
            .checked_sub(1)
    }
}

impl Default for TouchCalibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}
