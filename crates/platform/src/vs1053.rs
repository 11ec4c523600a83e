//! VS1053b register map, bring-up sequence and patch loader.
//!
//! Reference: VLSI Solution VS1053b datasheet v1.31, Section 9.6 (SCI
//! registers) and Section 10.11 (extra parameters).
//!
//! Everything here is written against [`DecoderLink`], so the same code
//! drives the SPI driver on target and [`MockDecoder`] on the host.
//!
//! [`MockDecoder`]: crate::mocks::MockDecoder

use embedded_hal::delay::DelayNs;

use crate::decoder::{DecoderError, DecoderLink};

// ── SCI registers ───────────────────────────────────────────────────────────

/// Mode control.
pub const SCI_MODE: u8 = 0x00;
/// Status; bits 7:4 carry the chip version code.
pub const SCI_STATUS: u8 = 0x01;
/// Built-in bass/treble control.
pub const SCI_BASS: u8 = 0x02;
/// Clock frequency and multiplier.
pub const SCI_CLOCKF: u8 = 0x03;
/// Decode time in seconds. Only latches after two consecutive writes.
pub const SCI_DECODE_TIME: u8 = 0x04;
/// Sample rate (bits 15:1) and stereo flag (bit 0).
pub const SCI_AUDATA: u8 = 0x05;
/// Parameter memory data port.
pub const SCI_WRAM: u8 = 0x06;
/// Parameter memory address port.
pub const SCI_WRAMADDR: u8 = 0x07;
/// Stream header data 0.
pub const SCI_HDAT0: u8 = 0x08;
/// Stream header data 1; identifies the detected stream format.
pub const SCI_HDAT1: u8 = 0x09;
/// Start address of application code.
pub const SCI_AIADDR: u8 = 0x0A;
/// Volume: high byte left, low byte right, 0.5 dB attenuation steps.
pub const SCI_VOL: u8 = 0x0B;
/// Last application control register; highest valid SCI address.
pub const SCI_AICTRL3: u8 = 0x0F;

// ── SCI_MODE bits ───────────────────────────────────────────────────────────

/// Differential output.
pub const SM_DIFF: u16 = 1 << 0;
/// Allow MPEG layers I and II.
pub const SM_LAYER12: u16 = 1 << 1;
/// Soft reset (self-clearing).
pub const SM_RESET: u16 = 1 << 2;
/// Cancel decoding the current file. Cleared by the decoder once it has
/// reached a stable point.
pub const SM_CANCEL: u16 = 1 << 3;
/// Allow SDI tests.
pub const SM_TESTS: u16 = 1 << 5;
/// Stream mode.
pub const SM_STREAM: u16 = 1 << 6;
/// Native SPI modes (required for the two-chip-select wiring).
pub const SM_SDINEW: u16 = 1 << 11;

// ── SCI_CLOCKF fields ───────────────────────────────────────────────────────

/// Clock multiplier 3.5×.
pub const SC_MULT_53_35X: u16 = 0x8000;
/// Allowed extra multiplier 1.0× for WMA/AAC peaks.
pub const SC_ADD_53_10X: u16 = 0x0800;

/// Convert a crystal frequency to the SC_FREQ field of SCI_CLOCKF.
///
/// Returns 0 (meaning the default 12.288 MHz) for crystals below 8 MHz.
#[allow(clippy::arithmetic_side_effects)] // hz >= 8 MHz checked first
#[allow(clippy::cast_possible_truncation)] // SC_FREQ is 11 bits wide
pub const fn hz_to_sc_freq(hz: u32) -> u16 {
    if hz < 8_000_000 {
        return 0;
    }
    (((hz - 8_000_000 + 2_000) / 4_000) & 0x07FF) as u16
}

// ── Parameter memory (extra parameters, VS1053b) ────────────────────────────

/// Chip ID, 32 bits.
pub const PAR_CHIP_ID: u16 = 0x1E00;
/// Parameter structure version.
pub const PAR_VERSION: u16 = 0x1E02;
/// Miscellaneous configuration (AAC SBR/PS handling).
pub const PAR_CONFIG1: u16 = 0x1E03;
/// Play speed: 0 or 1 is normal speed, N is N-times speed.
pub const PAR_PLAY_SPEED: u16 = 0x1E04;
/// Average byte rate of the current stream (bit rate / 8, FLAC / 32).
pub const PAR_BITRATE_PER_100: u16 = 0x1E05;
/// Byte value to pad the stream with once the file has been sent.
pub const PAR_END_FILL_BYTE: u16 = 0x1E06;
/// Play-mode flags.
pub const PAR_PLAY_MODE: u16 = 0x1E09;
/// Decoded sample counter, 32 bits.
pub const PAR_SAMPLE_COUNTER: u16 = 0x1E0A;
/// Playback position in milliseconds, 32 bits.
pub const PAR_POSITION_MSEC: u16 = 0x1E27;

/// AAC: upsample SBR streams only when the rate would otherwise be too low.
pub const PAR_CONFIG1_AAC_SBR_SELECTIVE_UPSAMPLE: u16 = 0x0010;
/// PAR_PLAY_MODE: pause decoding without dropping SDI data.
pub const PAR_PLAY_MODE_PAUSE_ENA: u16 = 1 << 1;

// ── Fixed values ────────────────────────────────────────────────────────────

/// SCI_VOL value that silences both channels.
pub const VOL_SILENT: u16 = 0xFEFE;
/// Value written to HDAT0 during the bring-up sanity check.
pub const SANITY_HDAT0: u16 = 0xABAD;
/// Value written to HDAT1 during the bring-up sanity check.
pub const SANITY_HDAT1: u16 = 0x1DEA;

/// Chip numbers indexed by the SCI_STATUS version code. Code 2 is shared by
/// VS1002 and VS1011e.
pub const CHIP_NUMBERS: [u16; 16] = [
    1001, 1011, 1011, 1003, 1053, 1033, 1063, 1103, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Chip number this firmware supports.
pub const SUPPORTED_CHIP: u16 = 1053;

/// Length-field flag marking a run-length record in a patch blob.
const PATCH_RLE_FLAG: u16 = 0x8000;

/// Extract the 4-bit version code from an SCI_STATUS value.
#[allow(clippy::cast_possible_truncation)] // masked to 4 bits
pub const fn version_code(status: u16) -> u8 {
    ((status >> 4) & 0x0F) as u8
}

/// Map an SCI_STATUS value to its chip number; 0 for unknown codes.
pub fn chip_number(status: u16) -> u16 {
    CHIP_NUMBERS
        .get(usize::from(version_code(status)))
        .copied()
        .unwrap_or(0)
}

// ── Bring-up ────────────────────────────────────────────────────────────────

/// Register values applied during [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vs1053Config {
    /// SCI_CLOCKF value.
    pub clockf: u16,
    /// PAR_CONFIG1 value.
    pub config1: u16,
    /// DREQ polls a link makes before reporting the decoder unresponsive.
    pub dreq_polls: u32,
    /// Microseconds between two DREQ polls.
    pub dreq_poll_interval_us: u32,
}

impl Default for Vs1053Config {
    /// 12.288 MHz crystal, 3.5× multiplier with 1.0× headroom, selective
    /// AAC SBR upsampling, 50 ms DREQ budget.
    fn default() -> Self {
        Self {
            clockf: hz_to_sc_freq(12_288_000) | SC_MULT_53_35X | SC_ADD_53_10X,
            config1: PAR_CONFIG1_AAC_SBR_SELECTIVE_UPSAMPLE,
            // 50 ms: a VS1053 at 3.5× drains its FIFO far sooner than that
            dreq_polls: 5_000,
            dreq_poll_interval_us: 10,
        }
    }
}

/// Identity of a decoder that passed [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipInfo {
    /// Chip number, e.g. 1053.
    pub chip: u16,
    /// Register writes issued by the firmware patch.
    pub patch_writes: usize,
}

/// Decoder bring-up failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// A register transaction failed.
    Link(DecoderError),
    /// HDAT0/HDAT1 did not read back what was written; usually SPI too fast.
    SanityCheck {
        /// Value read back from HDAT0.
        hdat0: u16,
        /// Value read back from HDAT1.
        hdat1: u16,
    },
    /// SCI_STATUS carried a version code with no known chip.
    UnknownVersion(u8),
    /// A known chip other than the VS1053 answered.
    WrongChip(u16),
    /// The firmware patch could not be applied.
    Patch(PatchError),
}

impl From<DecoderError> for InitError {
    fn from(e: DecoderError) -> Self {
        Self::Link(e)
    }
}

impl From<PatchError> for InitError {
    fn from(e: PatchError) -> Self {
        Self::Patch(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InitError {}

impl core::fmt::Display for InitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Link(e) => write!(f, "decoder init: {e}"),
            Self::SanityCheck { hdat0, hdat1 } => {
                write!(f, "decoder sanity check read back {hdat0:#06x}/{hdat1:#06x}")
            }
            Self::UnknownVersion(code) => write!(f, "unknown decoder version code {code}"),
            Self::WrongChip(chip) => write!(f, "incorrect chip: VS{chip}"),
            Self::Patch(e) => write!(f, "decoder patch: {e}"),
        }
    }
}

/// Bring the decoder from hardware reset to a silent, patched idle state.
///
/// Sequence:
/// 1. Dummy SCI_MODE read to settle the bus
/// 2. Soft reset with native SPI modes and SDI tests enabled
/// 3. HDAT0/HDAT1 write-read sanity check
/// 4. Chip version check (must be a VS1053)
/// 5. Clock multiplier, PAR_CONFIG1
/// 6. Volume to [`VOL_SILENT`] so nothing is heard before a file opens
/// 7. Firmware patch
///
/// The SPI clock must stay below CLKI/7 until step 5 completes; callers
/// may raise it afterwards.
pub fn init<L, D>(
    link: &mut L,
    delay: &mut D,
    config: &Vs1053Config,
    patch: &[u16],
) -> Result<ChipInfo, InitError>
where
    L: DecoderLink + ?Sized,
    D: DelayNs,
{
    link.read_control(SCI_MODE)?;
    link.write_control(SCI_MODE, SM_SDINEW | SM_TESTS | SM_RESET)?;
    delay.delay_us(5);

    link.write_control(SCI_HDAT0, SANITY_HDAT0)?;
    link.write_control(SCI_HDAT1, SANITY_HDAT1)?;
    let hdat0 = link.read_control(SCI_HDAT0)?;
    let hdat1 = link.read_control(SCI_HDAT1)?;
    if hdat0 != SANITY_HDAT0 || hdat1 != SANITY_HDAT1 {
        return Err(InitError::SanityCheck { hdat0, hdat1 });
    }

    let status = link.read_control(SCI_STATUS)?;
    match chip_number(status) {
        0 => return Err(InitError::UnknownVersion(version_code(status))),
        SUPPORTED_CHIP => {}
        other => return Err(InitError::WrongChip(other)),
    }

    link.write_control(SCI_CLOCKF, config.clockf)?;
    link.write_parameter(PAR_CONFIG1, config.config1)?;
    link.write_control(SCI_VOL, VOL_SILENT)?;

    let patch_writes = load_patch(link, patch)?;

    #[cfg(feature = "defmt")]
    defmt::info!("VS{=u16} ready, patch applied ({=usize} writes)", SUPPORTED_CHIP, patch_writes);

    Ok(ChipInfo { chip: SUPPORTED_CHIP, patch_writes })
}

// ── Patch loader ────────────────────────────────────────────────────────────

/// Malformed or failed firmware patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatchError {
    /// The blob ended in the middle of the record starting at `offset`.
    Truncated {
        /// Word offset of the incomplete record.
        offset: usize,
    },
    /// A record targets something other than an SCI register.
    BadAddress(u16),
    /// A register write failed while replaying the patch.
    Link(DecoderError),
}

impl From<DecoderError> for PatchError {
    fn from(e: DecoderError) -> Self {
        Self::Link(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PatchError {}

impl core::fmt::Display for PatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Truncated { offset } => write!(f, "patch truncated in record at word {offset}"),
            Self::BadAddress(addr) => write!(f, "patch targets invalid register {addr:#06x}"),
            Self::Link(e) => write!(f, "patch write failed: {e}"),
        }
    }
}

/// One decoded patch record.
enum Record<'a> {
    /// Write `value` to `reg` `count` times.
    Fill { reg: u8, value: u16, count: u16 },
    /// Write each value to `reg` in order.
    Copy { reg: u8, values: &'a [u16] },
}

/// Iterator over the records of a patch blob.
struct Records<'a> {
    blob: &'a [u16],
    pos: usize,
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>, PatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos;
        let rest = self.blob.get(start..)?;
        let (&addr, rest) = rest.split_first()?;
        let truncated = PatchError::Truncated { offset: start };

        let Some((&n, rest)) = rest.split_first() else {
            self.pos = self.blob.len();
            return Some(Err(truncated));
        };
        let reg = match u8::try_from(addr) {
            Ok(reg) if reg <= SCI_AICTRL3 => reg,
            _ => {
                self.pos = self.blob.len();
                return Some(Err(PatchError::BadAddress(addr)));
            }
        };

        let (record, used) = if n & PATCH_RLE_FLAG != 0 {
            let Some(&value) = rest.first() else {
                self.pos = self.blob.len();
                return Some(Err(truncated));
            };
            (Record::Fill { reg, value, count: n & !PATCH_RLE_FLAG }, 3)
        } else {
            let Some(values) = rest.get(..usize::from(n)) else {
                self.pos = self.blob.len();
                return Some(Err(truncated));
            };
            (Record::Copy { reg, values }, usize::from(n).saturating_add(2))
        };
        self.pos = start.saturating_add(used);
        Some(Ok(record))
    }
}

/// Replay a VLSI "compressed plugin" register script.
///
/// The blob is a sequence of records `addr, n, data…`. When bit 15 of `n`
/// is set the single following word is written `n & 0x7FFF` times;
/// otherwise the `n` following words are written in order. Every write
/// targets the SCI register `addr`.
///
/// The whole blob is validated before the first write, so a malformed
/// patch leaves the decoder untouched. Returns the number of writes issued.
pub fn load_patch<L>(link: &mut L, blob: &[u16]) -> Result<usize, PatchError>
where
    L: DecoderLink + ?Sized,
{
    for record in (Records { blob, pos: 0 }) {
        record?;
    }

    let mut writes = 0usize;
    for record in (Records { blob, pos: 0 }) {
        match record? {
            Record::Fill { reg, value, count } => {
                for _ in 0..count {
                    link.write_control(reg, value)?;
                }
                writes = writes.saturating_add(usize::from(count));
            }
            Record::Copy { reg, values } => {
                for &value in values {
                    link.write_control(reg, value)?;
                }
                writes = writes.saturating_add(values.len());
            }
        }
    }
    Ok(writes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mocks::{MockDecoder, MockDelay};

    #[test]
    fn clock_value_matches_12mhz_crystal() {
        assert_eq!(hz_to_sc_freq(12_288_000), 0x0430);
        assert_eq!(Vs1053Config::default().clockf, 0x8C30);
    }

    #[test]
    fn chip_number_decodes_status_bits() {
        assert_eq!(chip_number(0x0040), 1053);
        assert_eq!(chip_number(0x0030), 1003);
        assert_eq!(chip_number(0x00F0), 0);
    }

    #[test]
    fn init_succeeds_on_vs1053_and_leaves_output_silent() {
        let mut dec = MockDecoder::new();
        let mut delay = MockDelay::new();
        let info = init(&mut dec, &mut delay, &Vs1053Config::default(), &[]).unwrap();
        assert_eq!(info.chip, 1053);
        assert_eq!(dec.register(SCI_VOL), VOL_SILENT);
        assert_eq!(dec.register(SCI_CLOCKF), 0x8C30);
        assert_eq!(dec.parameter(PAR_CONFIG1), PAR_CONFIG1_AAC_SBR_SELECTIVE_UPSAMPLE);
        assert!(delay.total_ns() >= 5_000);
    }

    #[test]
    fn init_rejects_other_chip() {
        let mut dec = MockDecoder::new();
        dec.set_register(SCI_STATUS, 0x0030);
        let result = init(&mut dec, &mut MockDelay::new(), &Vs1053Config::default(), &[]);
        assert_eq!(result, Err(InitError::WrongChip(1003)));
    }

    #[test]
    fn init_reports_unknown_version_code() {
        let mut dec = MockDecoder::new();
        dec.set_register(SCI_STATUS, 0x00A0);
        let result = init(&mut dec, &mut MockDelay::new(), &Vs1053Config::default(), &[]);
        assert_eq!(result, Err(InitError::UnknownVersion(10)));
    }

    #[test]
    fn init_fails_sanity_check_when_hdat_is_stuck() {
        let mut dec = MockDecoder::new();
        dec.stick_register(SCI_HDAT1, 0x0000);
        let result = init(&mut dec, &mut MockDelay::new(), &Vs1053Config::default(), &[]);
        assert_eq!(
            result,
            Err(InitError::SanityCheck { hdat0: SANITY_HDAT0, hdat1: 0x0000 })
        );
    }

    #[test]
    fn patch_rle_record_replicates_value() {
        let mut dec = MockDecoder::new();
        // addr 0x06, run of 3 × 0x1234
        let writes = load_patch(&mut dec, &[0x0006, 0x8003, 0x1234]).unwrap();
        assert_eq!(writes, 3);
        let wram: Vec<_> = dec.control_writes().iter().filter(|(a, _)| *a == SCI_WRAM).collect();
        assert_eq!(wram.len(), 3);
        assert!(wram.iter().all(|(_, v)| *v == 0x1234));
    }

    #[test]
    fn patch_copy_record_writes_values_in_order() {
        let mut dec = MockDecoder::new();
        let blob = [0x0007, 0x0001, 0x8010, 0x0006, 0x0002, 0xAAAA, 0xBBBB];
        let writes = load_patch(&mut dec, &blob).unwrap();
        assert_eq!(writes, 3);
        assert_eq!(
            dec.control_writes(),
            &[(SCI_WRAMADDR, 0x8010), (SCI_WRAM, 0xAAAA), (SCI_WRAM, 0xBBBB)]
        );
    }

    #[test]
    fn truncated_patch_writes_nothing() {
        let mut dec = MockDecoder::new();
        let blob = [0x0006, 0x0001, 0x1111, 0x0006, 0x0003, 0x2222];
        assert_eq!(load_patch(&mut dec, &blob), Err(PatchError::Truncated { offset: 3 }));
        assert!(dec.control_writes().is_empty());
    }

    #[test]
    fn patch_with_memory_address_is_rejected() {
        let mut dec = MockDecoder::new();
        assert_eq!(
            load_patch(&mut dec, &[0x1E00, 0x0001, 0x0000]),
            Err(PatchError::BadAddress(0x1E00))
        );
    }
}
