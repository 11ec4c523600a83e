//! VS1053 hardware link over SPI
//!
//! The chip has two chip selects on one bus: xCS for the control interface
//! (SCI, 16-bit registers) and xDCS for the data interface (SDI, the audio
//! stream). Each is handed in as its own `SpiDevice`, so the bus sharing
//! layer guarantees they are never asserted together.
//!
//! # Wiring (reference board)
//!
//! | Signal | Direction | Notes |
//! |--------|-----------|-------|
//! | SCK/MOSI/MISO | shared | SPI mode 0, ≤ CLKI/7 before `SCI_CLOCKF` is set |
//! | xCS    | Host → Decoder | managed by the SCI `SpiDevice` |
//! | xDCS   | Host → Decoder | managed by the SDI `SpiDevice` |
//! | DREQ   | Decoder → Host | high when 32 bytes of FIFO space are free |
//!
//! # SCI frames
//!
//! ```text
//! write: 0x02 addr value_hi value_lo
//! read:  0x03 addr ---- ----   → value_hi value_lo clocked back
//! ```
//!
//! Every transaction waits for DREQ first. The wait is bounded by
//! [`Vs1053Config::dreq_polls`]; a decoder that never raises DREQ yields
//! [`DecoderError::Unresponsive`] instead of hanging the player loop.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use embedded_hal::spi::{Operation, SpiDevice};
use platform::vs1053::Vs1053Config;
use platform::{DecoderError, DecoderLink, MAX_TRANSFER_SIZE};

/// SCI write opcode.
pub const SCI_OP_WRITE: u8 = 0x02;
/// SCI read opcode.
pub const SCI_OP_READ: u8 = 0x03;

/// VS1053 driver.
///
/// Generic over:
/// - `SCI`: [`SpiDevice`] asserting xCS
/// - `SDI`: [`SpiDevice`] asserting xDCS
/// - `DREQ`: [`InputPin`], high when the decoder accepts a transaction
/// - `DELAY`: [`DelayNs`] paced between DREQ polls
pub struct Vs1053<SCI, SDI, DREQ, DELAY> {
    sci: SCI,
    sdi: SDI,
    dreq: DREQ,
    delay: DELAY,
    dreq_polls: u32,
    dreq_poll_interval_us: u32,
}

impl<SCI, SDI, DREQ, DELAY> Vs1053<SCI, SDI, DREQ, DELAY>
where
    SCI: SpiDevice,
    SDI: SpiDevice,
    DREQ: InputPin,
    DELAY: DelayNs,
{
    /// Wrap the two SPI devices, the DREQ pin and a delay source.
    pub fn new(sci: SCI, sdi: SDI, dreq: DREQ, delay: DELAY, config: &Vs1053Config) -> Self {
        Self {
            sci,
            sdi,
            dreq,
            delay,
            dreq_polls: config.dreq_polls.max(1),
            dreq_poll_interval_us: config.dreq_poll_interval_us,
        }
    }

    /// Give the bus devices, pin and delay back.
    pub fn release(self) -> (SCI, SDI, DREQ, DELAY) {
        (self.sci, self.sdi, self.dreq, self.delay)
    }

    fn wait_dreq(&mut self) -> Result<(), DecoderError> {
        for _ in 0..self.dreq_polls {
            if self.dreq.is_high().map_err(|_| DecoderError::Bus)? {
                return Ok(());
            }
            self.delay.delay_us(self.dreq_poll_interval_us);
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("DREQ low after {=u32} polls", self.dreq_polls);
        Err(DecoderError::Unresponsive)
    }
}

impl<SCI, SDI, DREQ, DELAY> DecoderLink for Vs1053<SCI, SDI, DREQ, DELAY>
where
    SCI: SpiDevice,
    SDI: SpiDevice,
    DREQ: InputPin,
    DELAY: DelayNs,
{
    fn write_control(&mut self, addr: u8, value: u16) -> Result<(), DecoderError> {
        self.wait_dreq()?;
        let [hi, lo] = value.to_be_bytes();
        self.sci.write(&[SCI_OP_WRITE, addr, hi, lo]).map_err(|_| DecoderError::Bus)
    }

    fn read_control(&mut self, addr: u8) -> Result<u16, DecoderError> {
        self.wait_dreq()?;
        let mut value = [0u8; 2];
        self.sci
            .transaction(&mut [Operation::Write(&[SCI_OP_READ, addr]), Operation::Read(&mut value)])
            .map_err(|_| DecoderError::Bus)?;
        Ok(u16::from_be_bytes(value))
    }

    fn write_audio(&mut self, chunk: &[u8]) -> Result<(), DecoderError> {
        if chunk.len() > MAX_TRANSFER_SIZE {
            return Err(DecoderError::TransferTooLarge(chunk.len()));
        }
        self.wait_dreq()?;
        self.sdi.write(chunk).map_err(|_| DecoderError::Bus)
    }
}
