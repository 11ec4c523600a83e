//! One open audio file being streamed to the decoder.

use platform::vs1053::{
    PAR_BITRATE_PER_100, PAR_END_FILL_BYTE, SCI_AUDATA, SCI_DECODE_TIME, SCI_HDAT1,
};
use platform::{DecoderError, DecoderLink, File, StorageError};

use crate::config::{PlayerConfig, FILE_BUFFER_SIZE};
use crate::format::{AudioFormat, StreamReport, END_FILL_BYTES};

/// An open file plus everything needed to resume, report and flush it.
///
/// `offset` counts bytes handed to the decoder and `read_pos` bytes pulled
/// from storage; the difference sits in the read buffer. Both only move
/// forward, except through [`rewind`](Self::rewind).
pub struct PlaybackSession<F: File> {
    file: F,
    size: u64,
    offset: u64,
    read_pos: u64,
    buf: [u8; FILE_BUFFER_SIZE],
    buf_start: usize,
    buf_end: usize,
    next_report: u64,
    end_fill_byte: u8,
    end_fill_bytes: usize,
    report: Option<StreamReport>,
}

impl<F: File> PlaybackSession<F> {
    /// Take ownership of an open file positioned at 0.
    pub fn new(file: F) -> Self {
        let size = file.size();
        Self {
            file,
            size,
            offset: 0,
            read_pos: 0,
            buf: [0; FILE_BUFFER_SIZE],
            buf_start: 0,
            buf_end: 0,
            next_report: 0,
            end_fill_byte: 0,
            end_fill_bytes: END_FILL_BYTES,
            report: None,
        }
    }

    /// Total file size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes sent to the decoder so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Format detected at the last report point.
    pub fn format(&self) -> AudioFormat {
        self.report.map(|r| r.format).unwrap_or_default()
    }

    /// Byte value replayed during flush.
    pub fn end_fill_byte(&self) -> u8 {
        self.end_fill_byte
    }

    /// Number of fill bytes the flush will send.
    pub fn end_fill_bytes(&self) -> usize {
        self.end_fill_bytes
    }

    /// Most recent report point snapshot.
    pub fn report(&self) -> Option<StreamReport> {
        self.report
    }

    /// Bytes read from storage but not yet sent.
    pub fn pending(&self) -> usize {
        self.buf_end.saturating_sub(self.buf_start)
    }

    /// Read the next buffer from storage.
    ///
    /// Returns `false` at end of file. A read that comes back short while
    /// the file size says more data should follow is a [`StorageError::ShortRead`].
    pub(crate) async fn refill(&mut self) -> Result<bool, StorageError> {
        let n = self.file.read(&mut self.buf).await?;
        let remaining = self.size.saturating_sub(self.read_pos);
        let n = n.min(usize::try_from(remaining).unwrap_or(usize::MAX));
        if n == 0 {
            return if remaining == 0 { Ok(false) } else { Err(StorageError::ShortRead) };
        }
        if n < FILE_BUFFER_SIZE && (n as u64) < remaining {
            return Err(StorageError::ShortRead);
        }
        self.buf_start = 0;
        self.buf_end = n;
        self.read_pos = self.read_pos.saturating_add(n as u64);
        Ok(true)
    }

    /// Send up to `max` pending bytes as one audio chunk.
    pub(crate) fn feed_chunk<L>(&mut self, link: &mut L, max: usize) -> Result<usize, DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        let end = self.buf_start.saturating_add(max).min(self.buf_end);
        let chunk = self.buf.get(self.buf_start..end).unwrap_or(&[]);
        if chunk.is_empty() {
            return Ok(0);
        }
        link.write_audio(chunk)?;
        let n = chunk.len();
        self.buf_start = end;
        self.offset = self.offset.saturating_add(n as u64);
        Ok(n)
    }

    /// Whether the offset has reached the next report point.
    pub(crate) fn report_due(&self) -> bool {
        self.offset >= self.next_report
    }

    /// Capture the end-fill byte and stream status while the decoder is
    /// actively decoding.
    pub(crate) fn take_report<L>(
        &mut self,
        link: &mut L,
        config: &PlayerConfig,
    ) -> Result<StreamReport, DecoderError>
    where
        L: DecoderLink + ?Sized,
    {
        let fill = link.read_parameter(PAR_END_FILL_BYTE)?;
        #[allow(clippy::cast_possible_truncation)] // low byte only
        let fill = (fill & 0xFF) as u8;
        let header = link.read_control(SCI_HDAT1)?;
        let format = AudioFormat::from_header(header);
        let audata = link.read_control(SCI_AUDATA)?;
        let mut byte_rate = u32::from(link.read_parameter(PAR_BITRATE_PER_100)?);
        if format == AudioFormat::Flac {
            // FLAC reports bit rate / 32 rather than / 8
            byte_rate = byte_rate.saturating_mul(4);
        }
        let decode_time = link.read_control(SCI_DECODE_TIME)?;

        let interval = if format.reports_often() {
            config.report_interval_midi
        } else {
            config.report_interval
        };
        self.next_report = self.next_report.saturating_add(interval);
        self.end_fill_byte = fill;
        self.end_fill_bytes = format.end_fill_bytes();

        let report = StreamReport {
            format,
            header,
            sample_rate: audata & 0xFFFE,
            stereo: audata & 1 != 0,
            byte_rate,
            decode_time,
            offset: self.offset,
        };
        self.report = Some(report);
        Ok(report)
    }

    /// Seek back to the start and forget buffered data.
    pub(crate) async fn rewind(&mut self) -> Result<(), StorageError> {
        self.file.seek(0).await?;
        self.offset = 0;
        self.read_pos = 0;
        self.buf_start = 0;
        self.buf_end = 0;
        self.next_report = 0;
        Ok(())
    }
}
