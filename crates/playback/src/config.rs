//! Tunables for the playback loop.

use platform::MAX_TRANSFER_SIZE;

/// Size of the storage read buffer.
pub const FILE_BUFFER_SIZE: usize = 512;
/// Bytes between report points for most formats.
pub const REPORT_INTERVAL: u64 = 4096;
/// Bytes between report points for MIDI and unidentified streams.
pub const REPORT_INTERVAL_MIDI: u64 = 512;
/// Fill bytes written per poll while waiting out the end-of-file cancel.
pub const FINAL_CANCEL_STEP: usize = 2;

/// Runtime knobs for [`Player`](crate::Player).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlayerConfig {
    /// Audio bytes pushed per tick before touch input is sampled again.
    pub max_bytes_per_tick: usize,
    /// Report interval for most formats.
    pub report_interval: u64,
    /// Report interval for MIDI and unidentified streams.
    pub report_interval_midi: u64,
    /// Set the decoder's pause-enable flag while paused.
    pub hardware_pause: bool,
    /// Fill bytes allowed while waiting for the end-of-file cancel before
    /// the decoder is declared unresponsive.
    pub max_final_cancel_bytes: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_bytes_per_tick: FILE_BUFFER_SIZE,
            report_interval: REPORT_INTERVAL,
            report_interval_midi: REPORT_INTERVAL_MIDI,
            hardware_pause: false,
            max_final_cancel_bytes: 2048,
        }
    }
}

/// Rejected [`PlayerConfig`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `max_bytes_per_tick` is smaller than one sub-chunk.
    TickBudgetTooSmall,
    /// A report interval is zero.
    ZeroReportInterval,
    /// `max_final_cancel_bytes` cannot cover a single poll.
    FinalCancelBudgetTooSmall,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TickBudgetTooSmall => {
                write!(f, "tick budget must be at least {MAX_TRANSFER_SIZE} bytes")
            }
            Self::ZeroReportInterval => write!(f, "report interval must be non-zero"),
            Self::FinalCancelBudgetTooSmall => {
                write!(f, "final cancel budget must be at least {FINAL_CANCEL_STEP} bytes")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

impl PlayerConfig {
    /// Check the knobs are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes_per_tick < MAX_TRANSFER_SIZE {
            return Err(ConfigError::TickBudgetTooSmall);
        }
        if self.report_interval == 0 || self.report_interval_midi == 0 {
            return Err(ConfigError::ZeroReportInterval);
        }
        if self.max_final_cancel_bytes < FINAL_CANCEL_STEP {
            return Err(ConfigError::FinalCancelBudgetTooSmall);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(PlayerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn tiny_tick_budget_is_rejected() {
        let config = PlayerConfig { max_bytes_per_tick: 16, ..PlayerConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::TickBudgetTooSmall));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = PlayerConfig { report_interval_midi: 0, ..PlayerConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroReportInterval));
    }
}
