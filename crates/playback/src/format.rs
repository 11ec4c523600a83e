//! Stream format detection from the decoder's header registers.
//!
//! The VS1053 identifies the stream it is decoding in `SCI_HDAT1`. The value
//! is only meaningful once decoding has started, so it is sampled at the
//! feeder's report points rather than up front.

/// Fill bytes sent after a FLAC (or unidentified) stream.
pub const END_FILL_BYTES_FLAC: usize = 12_288;
/// Fill bytes sent after every other stream.
pub const END_FILL_BYTES: usize = 2_050;

/// Audio stream format as reported by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioFormat {
    /// Not recognised (yet).
    #[default]
    Unknown,
    /// RIFF / WAV
    Riff,
    /// Ogg Vorbis
    OggVorbis,
    /// MPEG 1 layer I
    Mp1,
    /// MPEG 1 layer II
    Mp2,
    /// MPEG 1 layer III
    Mp3,
    /// AAC in an MP4 container
    AacMp4,
    /// AAC ADTS
    AacAdts,
    /// AAC ADIF
    AacAdif,
    /// Free Lossless Audio Codec
    Flac,
    /// Windows Media Audio
    Wma,
    /// General MIDI
    Midi,
}

impl AudioFormat {
    /// Identify a stream from its `SCI_HDAT1` value.
    ///
    /// ```
    /// use playback::AudioFormat;
    ///
    /// assert_eq!(AudioFormat::from_header(0x664c), AudioFormat::Flac);
    /// assert_eq!(AudioFormat::from_header(0xfffb), AudioFormat::Mp3);
    /// assert_eq!(AudioFormat::from_header(0x0000), AudioFormat::Unknown);
    /// ```
    pub const fn from_header(hdat1: u16) -> Self {
        match hdat1 {
            0x7665 => Self::Riff,
            0x4154 => Self::AacAdts,
            0x4144 => Self::AacAdif,
            0x574d => Self::Wma,
            0x4f67 => Self::OggVorbis,
            0x664c => Self::Flac,
            0x4d34 => Self::AacMp4,
            0x4d54 => Self::Midi,
            h => match h & 0xffe6 {
                0xffe2 => Self::Mp3,
                0xffe4 => Self::Mp2,
                0xffe6 => Self::Mp1,
                _ => Self::Unknown,
            },
        }
    }

    /// How many end-fill bytes the decoder needs after this stream.
    ///
    /// Unidentified streams get the FLAC margin.
    pub const fn end_fill_bytes(self) -> usize {
        match self {
            Self::Flac | Self::Unknown => END_FILL_BYTES_FLAC,
            _ => END_FILL_BYTES,
        }
    }

    /// Whether report points should come at the short interval.
    pub const fn reports_often(self) -> bool {
        matches!(self, Self::Midi | Self::Unknown)
    }

    /// Short display name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Riff => "RIFF",
            Self::OggVorbis => "Ogg",
            Self::Mp1 => "MP1",
            Self::Mp2 => "MP2",
            Self::Mp3 => "MP3",
            Self::AacMp4 => "AAC MP4",
            Self::AacAdts => "AAC ADTS",
            Self::AacAdif => "AAC ADIF",
            Self::Flac => "FLAC",
            Self::Wma => "WMA",
            Self::Midi => "MIDI",
        }
    }
}

/// Snapshot of decoder status taken at a report point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamReport {
    /// Detected format.
    pub format: AudioFormat,
    /// Raw `SCI_HDAT1`.
    pub header: u16,
    /// Sample rate in Hz.
    pub sample_rate: u16,
    /// Stereo stream.
    pub stereo: bool,
    /// Average byte rate (bytes per second).
    pub byte_rate: u32,
    /// Seconds decoded so far.
    pub decode_time: u16,
    /// Bytes sent when the report was taken.
    pub offset: u64,
}

impl StreamReport {
    /// Bit rate in kbit/s.
    pub const fn kbps(&self) -> u32 {
        self.byte_rate.saturating_mul(8) / 1000
    }
}
