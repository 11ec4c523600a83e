//! Volume, mute and fast-forward state for the VS1053.
//!
//! SCI_VOL attenuates in 0.5 dB steps, so a *higher* level is *quieter*.
//! Both channels always carry the same level:
//!
//! ```text
//! register = level << 8 | level        (audible)
//! register = 0xFEFE                    (muted or fast-forwarding)
//! ```
//!
//! Mute and fast-forward both silence the output without touching `level`.
//! The register value is always derived from the three fields together by
//! [`VolumeState::register_value`], so releasing one never overrides the
//! other.

use platform::vs1053::{PAR_PLAY_SPEED, SCI_VOL, VOL_SILENT};
use platform::{DecoderError, DecoderLink};

use crate::command::TransportCommand;

/// Loudest level `VolumeUp` will reach.
pub const LEVEL_LOUDEST: u8 = 0x40;
/// Quietest level `VolumeDown` will reach.
pub const LEVEL_QUIETEST: u8 = 0xFD;
/// Level after decoder initialisation (-45 dB).
pub const LEVEL_DEFAULT: u8 = 0x5A;
/// `PAR_PLAY_SPEED` while fast-forwarding.
pub const FAST_FORWARD_SPEED: u16 = 128;
/// `PAR_PLAY_SPEED` at normal speed.
pub const NORMAL_SPEED: u16 = 1;

/// What a volume command changed, for the UI to reflect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VolumeChange {
    /// At a bound, locked out, or not a volume command.
    None,
    /// Level moved one step louder.
    Louder,
    /// Level moved one step quieter.
    Quieter,
    /// Mute flag toggled.
    Mute(bool),
    /// Fast-forward toggled.
    FastForward(bool),
}

/// Process-wide volume state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VolumeState {
    level: u8,
    step: u8,
    muted: bool,
    fast_forward: bool,
}

impl VolumeState {
    /// State after decoder initialisation.
    pub const fn new() -> Self {
        Self {
            level: LEVEL_DEFAULT,
            step: u8::MAX.saturating_sub(LEVEL_DEFAULT),
            muted: false,
            fast_forward: false,
        }
    }

    /// Attenuation level, 0 loudest.
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Volume-bar height in pixel rows.
    pub const fn step(&self) -> u8 {
        self.step
    }

    /// User mute flag.
    pub const fn is_muted(&self) -> bool {
        self.muted
    }

    /// Fast-forward engaged.
    pub const fn is_fast_forward(&self) -> bool {
        self.fast_forward
    }

    /// Whether the output should be heard right now.
    pub const fn is_audible(&self) -> bool {
        !self.muted && !self.fast_forward
    }

    /// SCI_VOL value for the stored level.
    pub const fn level_register(&self) -> u16 {
        (self.level as u16).wrapping_mul(0x0101)
    }

    /// SCI_VOL value the decoder should hold right now.
    pub const fn register_value(&self) -> u16 {
        if self.is_audible() {
            self.level_register()
        } else {
            VOL_SILENT
        }
    }

    /// Write [`register_value`](Self::register_value) to the decoder.
    pub fn apply<L>(&self, link: &mut L) -> Result<(), DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        link.write_control(SCI_VOL, self.register_value())
    }

    /// One step louder, down to [`LEVEL_LOUDEST`].
    pub fn volume_up<L>(&mut self, link: &mut L) -> Result<VolumeChange, DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        if self.level <= LEVEL_LOUDEST {
            return Ok(VolumeChange::None);
        }
        self.level = self.level.saturating_sub(1);
        self.step = self.step.saturating_add(1);
        if self.is_audible() {
            self.apply(link)?;
        }
        Ok(VolumeChange::Louder)
    }

    /// One step quieter, up to [`LEVEL_QUIETEST`].
    pub fn volume_down<L>(&mut self, link: &mut L) -> Result<VolumeChange, DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        if self.level >= LEVEL_QUIETEST {
            return Ok(VolumeChange::None);
        }
        self.level = self.level.saturating_add(1);
        self.step = self.step.saturating_sub(1);
        if self.is_audible() {
            self.apply(link)?;
        }
        Ok(VolumeChange::Quieter)
    }

    /// Flip the user mute flag. Locked while fast-forwarding.
    pub fn toggle_mute<L>(&mut self, link: &mut L) -> Result<VolumeChange, DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        if self.fast_forward {
            return Ok(VolumeChange::None);
        }
        self.muted = !self.muted;
        self.apply(link)?;
        Ok(VolumeChange::Mute(self.muted))
    }

    /// Engage or release fast-forward: play speed and forced silence.
    pub fn toggle_fast_forward<L>(&mut self, link: &mut L) -> Result<VolumeChange, DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        self.set_fast_forward(link, !self.fast_forward)?;
        Ok(VolumeChange::FastForward(self.fast_forward))
    }

    fn set_fast_forward<L>(&mut self, link: &mut L, on: bool) -> Result<(), DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        self.fast_forward = on;
        self.apply(link)?;
        link.write_parameter(PAR_PLAY_SPEED, if on { FAST_FORWARD_SPEED } else { NORMAL_SPEED })
    }

    /// Release fast-forward at the end of a session.
    pub fn end_session<L>(&mut self, link: &mut L) -> Result<(), DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        if self.fast_forward {
            self.set_fast_forward(link, false)?;
        }
        Ok(())
    }

    /// Dispatch a volume-path command.
    pub fn handle<L>(
        &mut self,
        command: TransportCommand,
        link: &mut L,
    ) -> Result<VolumeChange, DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        match command {
            TransportCommand::VolumeUp => self.volume_up(link),
            TransportCommand::VolumeDown => self.volume_down(link),
            TransportCommand::ToggleMute => self.toggle_mute(link),
            TransportCommand::ToggleFastForward => self.toggle_fast_forward(link),
            _ => Ok(VolumeChange::None),
        }
    }
}

impl Default for VolumeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::MockDecoder;

    #[test]
    fn test_initial_state_matches_bringup() {
        let v = VolumeState::new();
        assert_eq!(v.level(), 0x5A);
        assert_eq!(v.step(), 165);
        assert_eq!(v.register_value(), 0x5A5A);
    }

    #[test]
    fn test_volume_up_writes_both_channels() {
        let mut dec = MockDecoder::new();
        let mut v = VolumeState::new();
        assert_eq!(v.volume_up(&mut dec).unwrap(), VolumeChange::Louder);
        assert_eq!(dec.writes_to(SCI_VOL), vec![0x5959]);
        assert_eq!(v.step(), 166);
    }

    #[test]
    fn test_volume_stops_at_bounds() {
        let mut dec = MockDecoder::new();
        let mut v = VolumeState::new();
        for _ in 0..300 {
            v.volume_up(&mut dec).unwrap();
        }
        assert_eq!(v.level(), LEVEL_LOUDEST);
        assert_eq!(v.volume_up(&mut dec).unwrap(), VolumeChange::None);
        for _ in 0..300 {
            v.volume_down(&mut dec).unwrap();
        }
        assert_eq!(v.level(), LEVEL_QUIETEST);
        assert_eq!(v.step(), 2);
    }

    #[test]
    fn test_mute_round_trip_restores_register() {
        let mut dec = MockDecoder::new();
        let mut v = VolumeState::new();
        v.volume_up(&mut dec).unwrap();
        let before = v.register_value();
        v.toggle_mute(&mut dec).unwrap();
        assert_eq!(dec.register(SCI_VOL), VOL_SILENT);
        v.volume_down(&mut dec).unwrap();
        v.volume_up(&mut dec).unwrap();
        assert_eq!(dec.register(SCI_VOL), VOL_SILENT, "no audible write while muted");
        v.toggle_mute(&mut dec).unwrap();
        assert_eq!(dec.register(SCI_VOL), before);
    }

    #[test]
    fn test_fast_forward_silences_and_sets_speed() {
        let mut dec = MockDecoder::new();
        let mut v = VolumeState::new();
        v.toggle_fast_forward(&mut dec).unwrap();
        assert_eq!(dec.register(SCI_VOL), VOL_SILENT);
        assert_eq!(dec.parameter(PAR_PLAY_SPEED), 128);
        assert_eq!(v.toggle_mute(&mut dec).unwrap(), VolumeChange::None);
        v.toggle_fast_forward(&mut dec).unwrap();
        assert_eq!(dec.register(SCI_VOL), 0x5A5A);
        assert_eq!(dec.parameter(PAR_PLAY_SPEED), 1);
    }

    #[test]
    fn test_fast_forward_release_keeps_user_mute() {
        let mut dec = MockDecoder::new();
        let mut v = VolumeState::new();
        v.toggle_mute(&mut dec).unwrap();
        v.toggle_fast_forward(&mut dec).unwrap();
        v.toggle_fast_forward(&mut dec).unwrap();
        assert_eq!(dec.register(SCI_VOL), VOL_SILENT);
        assert!(v.is_muted());
    }

    #[test]
    fn test_end_session_releases_fast_forward() {
        let mut dec = MockDecoder::new();
        let mut v = VolumeState::new();
        v.end_session(&mut dec).unwrap();
        assert!(dec.control_writes().is_empty());
        v.toggle_fast_forward(&mut dec).unwrap();
        v.end_session(&mut dec).unwrap();
        assert!(!v.is_fast_forward());
        assert_eq!(dec.parameter(PAR_PLAY_SPEED), 1);
    }
}
