//! Line audio format declaration.

use echoline_core::BYTES_PER_SAMPLE;
use std::fmt;
use std::time::Duration;

/// Encoding carried by every echoline line.
///
/// Only one shape is ever opened: mono, signed 16-bit, little-endian PCM. The
/// sample rate is chosen by the caller. The byte order recorded here is the
/// same one the codec in [`echoline_core::pcm`] uses, so the declaration and
/// the bytes on the line always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Whether samples are signed integers.
    pub signed: bool,
    /// Whether the high byte comes first.
    pub big_endian: bool,
}

impl AudioFormat {
    /// Mono, signed 16-bit, little-endian PCM at `sample_rate`.
    pub const fn mono_i16(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            bits_per_sample: 16,
            channels: 1,
            signed: true,
            big_endian: false,
        }
    }

    /// Bytes occupied by one sample frame across all channels.
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    /// Encoded size of `frame_size` samples.
    pub fn frame_bytes(&self, frame_size: usize) -> usize {
        frame_size * self.bytes_per_frame()
    }

    /// Wall-clock duration of `frame_size` samples, zero for a zero rate.
    pub fn frame_duration(&self, frame_size: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(frame_size as f64 / f64::from(self.sample_rate))
    }

    /// Whether this is the mono 16-bit little-endian shape the codec speaks.
    pub fn is_codec_compatible(&self) -> bool {
        self.channels == 1
            && self.signed
            && !self.big_endian
            && self.bits_per_sample as usize == BYTES_PER_SAMPLE * 8
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::mono_i16(8000)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {}-bit, {}, {}, {}",
            self.sample_rate,
            self.bits_per_sample,
            if self.channels == 1 {
                "mono".to_string()
            } else {
                format!("{} channels", self.channels)
            },
            if self.signed { "signed" } else { "unsigned" },
            if self.big_endian {
                "big-endian"
            } else {
                "little-endian"
            },
        )
    }
}
