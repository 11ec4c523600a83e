//! Decoder link abstraction
//!
//! The playback core talks to the audio decoder through five blocking
//! register transactions. Every transaction may first wait on the decoder's
//! data-request (DREQ) line; implementations bound that wait and report
//! [`DecoderError::Unresponsive`] instead of spinning forever.
//!
//! Timing pre/post-conditions every implementation must honour:
//! - chip select is asserted only after DREQ reads high
//! - SCI and SDI chip selects are never asserted together
//! - an audio chunk is at most [`MAX_TRANSFER_SIZE`] bytes, because DREQ high
//!   only guarantees room for 32 bytes in the decoder FIFO

use crate::vs1053::{PatchError, SCI_WRAM, SCI_WRAMADDR};

/// Largest audio chunk the decoder accepts per DREQ-high window.
pub const MAX_TRANSFER_SIZE: usize = 32;

/// Errors raised by a [`DecoderLink`] transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderError {
    /// An audio chunk longer than [`MAX_TRANSFER_SIZE`] was offered.
    TransferTooLarge(usize),
    /// DREQ stayed low past the link's wait budget.
    Unresponsive,
    /// The underlying bus transfer or DREQ pin read failed.
    Bus,
}

#[cfg(feature = "std")]
impl std::error::Error for DecoderError {}

impl core::fmt::Display for DecoderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TransferTooLarge(len) => {
                write!(f, "audio chunk of {len} bytes exceeds the {MAX_TRANSFER_SIZE}-byte limit")
            }
            Self::Unresponsive => write!(f, "decoder did not raise DREQ in time"),
            Self::Bus => write!(f, "decoder bus transfer failed"),
        }
    }
}

/// Transactional link to a VS10xx-family decoder.
///
/// The control interface (SCI) carries 16-bit registers; the data interface
/// (SDI) carries the compressed audio stream. Parameter memory is reached
/// indirectly through `SCI_WRAMADDR` / `SCI_WRAM`, which the provided methods
/// implement on top of the two register primitives.
pub trait DecoderLink {
    /// Write a 16-bit SCI register.
    fn write_control(&mut self, addr: u8, value: u16) -> Result<(), DecoderError>;

    /// Read a 16-bit SCI register.
    fn read_control(&mut self, addr: u8) -> Result<u16, DecoderError>;

    /// Send one chunk of audio data over SDI.
    ///
    /// Fails with [`DecoderError::TransferTooLarge`] when
    /// `chunk.len() > MAX_TRANSFER_SIZE`; nothing is sent in that case.
    fn write_audio(&mut self, chunk: &[u8]) -> Result<(), DecoderError>;

    /// Read one 16-bit word of decoder parameter memory.
    fn read_parameter(&mut self, addr: u16) -> Result<u16, DecoderError> {
        self.write_control(SCI_WRAMADDR, addr)?;
        self.read_control(SCI_WRAM)
    }

    /// Write one 16-bit word of decoder parameter memory.
    fn write_parameter(&mut self, addr: u16, value: u16) -> Result<(), DecoderError> {
        self.write_control(SCI_WRAMADDR, addr)?;
        self.write_control(SCI_WRAM, value)
    }

    /// Read a free-running 32-bit counter from parameter memory.
    ///
    /// The counter can carry between the two halves, so the high word is
    /// read on both sides of the low word and the one consistent with the
    /// low word's top bit is kept.
    fn read_parameter_counter(&mut self, addr: u16) -> Result<u32, DecoderError> {
        self.write_control(SCI_WRAMADDR, addr.wrapping_add(1))?;
        let msb_before = self.read_control(SCI_WRAM)?;
        self.write_control(SCI_WRAMADDR, addr)?;
        let lsb = self.read_control(SCI_WRAM)?;
        let msb_after = self.read_control(SCI_WRAM)?;
        let msb = if lsb < 0x8000 { msb_after } else { msb_before };
        Ok(u32::from(msb).wrapping_shl(16) | u32::from(lsb))
    }

    /// Replay a run-length-encoded register-write script.
    ///
    /// Returns the number of register writes issued. See
    /// [`vs1053::load_patch`](crate::vs1053::load_patch) for the format.
    fn load_patch(&mut self, blob: &[u16]) -> Result<usize, PatchError> {
        crate::vs1053::load_patch(self, blob)
    }
}

impl<T: DecoderLink + ?Sized> DecoderLink for &mut T {
    fn write_control(&mut self, addr: u8, value: u16) -> Result<(), DecoderError> {
        (**self).write_control(addr, value)
    }

    fn read_control(&mut self, addr: u8) -> Result<u16, DecoderError> {
        (**self).read_control(addr)
    }

    fn write_audio(&mut self, chunk: &[u8]) -> Result<(), DecoderError> {
        (**self).write_audio(chunk)
    }
}
