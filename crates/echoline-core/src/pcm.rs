//! Signed 16-bit little-endian PCM codec.
//!
//! Two consecutive bytes form one sample, low byte first. Decoding divides the
//! integer by [`PCM_SCALE`] so the full integer range maps onto `[-1.0, 1.0)`.
//!
//! Encoding multiplies by [`PCM_SCALE`], clamps to `[-32768, 32767]`, and
//! truncates toward zero. Out-of-range samples saturate instead of wrapping,
//! and `NaN` encodes as silence.
//!
//! | Bytes | Integer | Sample |
//! |-------|---------|--------|
//! | `00 00` | 0 | 0.0 |
//! | `FF 7F` | 32767 | 0.999969... |
//! | `00 80` | -32768 | -1.0 |
//! | `01 00` | 1 | 0.0000305... |

/// Scale between a 16-bit integer sample and its normalized `f64` value.
pub const PCM_SCALE: f64 = 32768.0;

/// Encoded width of one mono sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Convert one integer sample to its normalized value.
#[inline]
pub fn i16_to_sample(value: i16) -> f64 {
    f64::from(value) / PCM_SCALE
}

/// Convert one normalized sample to a 16-bit integer.
///
/// Values outside the representable range saturate at `i16::MIN` / `i16::MAX`.
#[inline]
pub fn sample_to_i16(sample: f64) -> i16 {
    let scaled = sample * PCM_SCALE;
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

/// Decode little-endian PCM bytes into normalized samples.
///
/// Decodes `min(bytes.len() / 2, out.len())` samples and returns that count.
/// A trailing odd byte is ignored.
pub fn decode_i16_le(bytes: &[u8], out: &mut [f64]) -> usize {
    let mut count = 0;
    for (pair, sample) in bytes.chunks_exact(BYTES_PER_SAMPLE).zip(out.iter_mut()) {
        *sample = i16_to_sample(i16::from_le_bytes([pair[0], pair[1]]));
        count += 1;
    }
    count
}

/// Encode normalized samples into little-endian PCM bytes.
///
/// Encodes `min(samples.len(), out.len() / 2)` samples and returns that count.
pub fn encode_i16_le(samples: &[f64], out: &mut [u8]) -> usize {
    let mut count = 0;
    for (&sample, pair) in samples.iter().zip(out.chunks_exact_mut(BYTES_PER_SAMPLE)) {
        pair.copy_from_slice(&sample_to_i16(sample).to_le_bytes());
        count += 1;
    }
    count
}
