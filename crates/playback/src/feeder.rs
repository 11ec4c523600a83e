//! Stream feeder: storage → decoder, one tick at a time.
//!
//! The state machine is stepped at every sub-chunk boundary, so a cancel
//! takes effect within one sub-chunk and the handshake is polled once per
//! sub-chunk while it is in flight.

use platform::{DecoderLink, File, MAX_TRANSFER_SIZE};

use crate::config::PlayerConfig;
use crate::engine::{Acknowledged, PlaybackEngine, PlaybackState};
use crate::error::PlaybackError;
use crate::session::PlaybackSession;

/// Result of one [`fill`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fill {
    /// The tick budget was spent.
    Fed,
    /// The state machine is paused or stopped; nothing was sent.
    Idle,
    /// The cancel handshake completed during this tick.
    Acknowledged(Acknowledged),
    /// Storage has no more data.
    EndOfFile,
}

/// Push up to `config.max_bytes_per_tick` bytes to the decoder.
///
/// Storage failures come back as [`PlaybackError::Storage`]; the session is
/// still intact and must be flushed.
pub async fn fill<F, L>(
    session: &mut PlaybackSession<F>,
    engine: &mut PlaybackEngine,
    link: &mut L,
    config: &PlayerConfig,
) -> Result<Fill, PlaybackError>
where
    F: File,
    L: DecoderLink + ?Sized,
{
    let mut budget = config.max_bytes_per_tick;
    loop {
        engine.fire_cancel(link)?;
        if let Some(ack) = engine.poll_cancel(link)? {
            return Ok(Fill::Acknowledged(ack));
        }
        if !engine.state().is_feeding() {
            return Ok(Fill::Idle);
        }
        if budget == 0 {
            return Ok(Fill::Fed);
        }
        if session.pending() == 0 && !session.refill().await? {
            return Ok(Fill::EndOfFile);
        }

        let sent = session.feed_chunk(link, budget.min(MAX_TRANSFER_SIZE))?;
        budget = budget.saturating_sub(sent);

        if engine.state() == PlaybackState::Playing && session.report_due() {
            let _report = session.take_report(link, config)?;
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "{=u64} B, {=u16}s, {=str} {=u16} Hz",
                _report.offset,
                _report.decode_time,
                _report.format.as_str(),
                _report.sample_rate
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::{NextAction, TransportCommand};
    use platform::mocks::{MockDecoder, MockFile, MockStorage};
    use platform::vs1053::SCI_HDAT1;
    use platform::Storage;

    async fn open(data: &[u8]) -> PlaybackSession<MockFile> {
        let mut storage = MockStorage::new().with_file("/T.MP3", data);
        PlaybackSession::new(storage.open_file("/T.MP3").await.unwrap())
    }

    #[tokio::test]
    async fn one_tick_sends_one_buffer_in_sub_chunks() {
        let mut s = open(&[1u8; 2000]).await;
        let mut engine = PlaybackEngine::new();
        let mut dec = MockDecoder::new();
        let fill = fill(&mut s, &mut engine, &mut dec, &PlayerConfig::default()).await;
        assert_eq!(fill.unwrap(), Fill::Fed);
        assert_eq!(s.offset(), 512);
        assert_eq!(dec.chunk_lens(), &[32; 16]);
    }

    #[tokio::test]
    async fn paused_engine_sends_nothing() {
        let mut s = open(&[1u8; 2000]).await;
        let mut engine = PlaybackEngine::new();
        engine.apply(TransportCommand::TogglePlayPause);
        let mut dec = MockDecoder::new();
        let fill = fill(&mut s, &mut engine, &mut dec, &PlayerConfig::default()).await;
        assert_eq!(fill.unwrap(), Fill::Idle);
        assert!(dec.audio().is_empty());
    }

    #[tokio::test]
    async fn end_of_file_after_last_partial_chunk() {
        let mut s = open(&[1u8; 40]).await;
        let mut engine = PlaybackEngine::new();
        let mut dec = MockDecoder::new();
        let fill = fill(&mut s, &mut engine, &mut dec, &PlayerConfig::default()).await;
        assert_eq!(fill.unwrap(), Fill::EndOfFile);
        assert_eq!(dec.chunk_lens(), &[32, 8]);
        assert_eq!(s.offset(), 40);
    }

    #[tokio::test]
    async fn cancel_keeps_feeding_until_acknowledged() {
        let mut s = open(&[1u8; 4000]).await;
        let mut engine = PlaybackEngine::new();
        engine.apply(TransportCommand::SeekNext);
        let mut dec = MockDecoder::new().cancel_ack_after(Some(4));
        let fill = fill(&mut s, &mut engine, &mut dec, &PlayerConfig::default()).await;
        assert_eq!(fill.unwrap(), Fill::Acknowledged(Acknowledged::Exit(NextAction::Forward)));
        // polls 1..=3 see the bit set and each lets one sub-chunk through
        assert_eq!(dec.chunk_lens(), &[32, 32, 32]);
        assert_eq!(engine.cancel_polls(), 4);
        assert_eq!(s.pending(), 512 - 96);
    }

    #[tokio::test]
    async fn report_point_captures_fill_byte_in_playing_only() {
        let mut s = open(&[1u8; 1024]).await;
        let mut engine = PlaybackEngine::new();
        let mut dec = MockDecoder::new();
        dec.set_register(SCI_HDAT1, 0xFFE3);
        dec.set_parameter(platform::vs1053::PAR_END_FILL_BYTE, 0x0055);
        fill(&mut s, &mut engine, &mut dec, &PlayerConfig::default()).await.unwrap();
        assert_eq!(s.end_fill_byte(), 0x55);
        assert_eq!(s.end_fill_bytes(), 2050);
        assert_eq!(s.report().unwrap().offset, 32);
    }

    #[tokio::test]
    async fn storage_failure_is_reported() {
        let mut storage = MockStorage::new()
            .with_file("/T.MP3", &[1u8; 2000])
            .with_read_failure("/T.MP3", 512);
        let mut s = PlaybackSession::new(storage.open_file("/T.MP3").await.unwrap());
        let mut engine = PlaybackEngine::new();
        let mut dec = MockDecoder::new();
        let config = PlayerConfig::default();
        assert_eq!(fill(&mut s, &mut engine, &mut dec, &config).await.unwrap(), Fill::Fed);
        assert_eq!(
            fill(&mut s, &mut engine, &mut dec, &config).await,
            Err(PlaybackError::Storage(platform::StorageError::Io))
        );
        assert_eq!(s.offset(), 512);
    }
}
