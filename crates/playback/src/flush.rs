//! End-of-stream flush.
//!
//! Runs once per session after feeding ends, whatever ended it. The decoder
//! is padded with the end-fill byte captured during playback so its internal
//! buffers drain, and if the file ended on its own the cancel handshake is
//! completed here, so the next file always starts on an idle decoder.

use platform::{DecoderError, DecoderLink, MAX_TRANSFER_SIZE};

use crate::config::{PlayerConfig, FINAL_CANCEL_STEP};
use crate::engine::PlaybackEngine;

/// What the flush sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlushReport {
    /// Fill bytes written in the main pass.
    pub fill_bytes: usize,
    /// Fill bytes written while waiting for the final cancel.
    pub cancel_bytes: usize,
    /// Mode-register polls of the final cancel.
    pub cancel_polls: u32,
}

/// Write `count` copies of `fill_byte`, then finish any cancel still owed.
///
/// Write failures are returned as-is and not retried. A decoder that keeps
/// `SM_CANCEL` set past `config.max_final_cancel_bytes` is reported as
/// [`DecoderError::Unresponsive`].
pub fn flush<L>(
    link: &mut L,
    engine: &mut PlaybackEngine,
    fill_byte: u8,
    count: usize,
    config: &PlayerConfig,
) -> Result<FlushReport, DecoderError>
where
    L: DecoderLink + ?Sized,
{
    let chunk = [fill_byte; MAX_TRANSFER_SIZE];
    let mut report = FlushReport::default();

    while report.fill_bytes < count {
        let n = count.saturating_sub(report.fill_bytes).min(MAX_TRANSFER_SIZE);
        link.write_audio(chunk.get(..n).unwrap_or(&chunk))?;
        report.fill_bytes = report.fill_bytes.saturating_add(n);
    }

    if engine.request_final_cancel() {
        engine.fire_cancel(link)?;
        let polls_before = engine.cancel_polls();
        loop {
            if engine.poll_cancel(link)?.is_some() {
                break;
            }
            if report.cancel_bytes >= config.max_final_cancel_bytes {
                #[cfg(feature = "defmt")]
                defmt::warn!("decoder ignored cancel after {=usize} fill bytes", report.cancel_bytes);
                return Err(DecoderError::Unresponsive);
            }
            link.write_audio(chunk.get(..FINAL_CANCEL_STEP).unwrap_or(&chunk))?;
            report.cancel_bytes = report.cancel_bytes.saturating_add(FINAL_CANCEL_STEP);
        }
        report.cancel_polls = engine.cancel_polls().saturating_sub(polls_before);
    }

    #[cfg(feature = "defmt")]
    defmt::debug!(
        "flushed {=usize} fill bytes, {=usize} during final cancel",
        report.fill_bytes,
        report.cancel_bytes
    );

    Ok(report)
}
