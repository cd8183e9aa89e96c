//! Fixed-length floating-point frame buffer.
//!
//! A [`SignalBuffer`] holds one frame of mono audio as `f64` samples in the
//! normalized range `[-1.0, 1.0)`, together with the frame's level in dB. It
//! decodes frames from a [`FrameSource`] and encodes them to a [`FrameSink`]
//! using the 16-bit little-endian codec in [`crate::pcm`].
//!
//! # Memory
//!
//! The sample array and a scratch array of `2 * frame_size` bytes are
//! allocated once at construction. Capture, render, and copy never allocate,
//! and the frame size never changes after construction.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::device::{DeviceError, FrameSink, FrameSource};
use crate::level::{MIN_LEVEL_DB, rms_db};
use crate::pcm::{BYTES_PER_SAMPLE, decode_i16_le, encode_i16_le};

/// Errors from constructing or copying signal buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    /// Frame size must be at least one sample.
    #[error("invalid frame size: {0} (must be > 0)")]
    InvalidFrameSize(usize),

    /// A copy source holds fewer samples than the destination frame.
    #[error("source holds {source_len} samples, destination frame needs {needed}")]
    SourceTooShort {
        /// Length of the source buffer.
        source_len: usize,
        /// Frame size of the destination buffer.
        needed: usize,
    },
}

/// One frame of mono audio in floating point.
///
/// # Example
///
/// ```rust
/// use echoline_core::SignalBuffer;
///
/// let mut frame = SignalBuffer::new(4).unwrap();
/// frame.set_sample(1, 0.25);
/// assert_eq!(frame.samples(), &[0.0, 0.25, 0.0, 0.0]);
/// assert_eq!(frame.frame_size(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBuffer {
    samples: Vec<f64>,
    level_db: f64,
    /// Encoded bytes for the last capture or render
    scratch: Vec<u8>,
}

impl SignalBuffer {
    /// Allocates a zeroed frame of `frame_size` samples.
    pub fn new(frame_size: usize) -> Result<Self, SignalError> {
        if frame_size == 0 {
            return Err(SignalError::InvalidFrameSize(frame_size));
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("signal_buffer: {frame_size} samples");
        Ok(Self {
            samples: vec![0.0; frame_size],
            level_db: MIN_LEVEL_DB,
            scratch: vec![0; frame_size * BYTES_PER_SAMPLE],
        })
    }

    /// Number of samples in the frame.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.samples.len()
    }

    /// Level of the last captured frame in dB (see [`crate::level`]).
    #[inline]
    pub fn level_db(&self) -> f64 {
        self.level_db
    }

    /// All samples of the frame.
    #[inline]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Mutable access to the samples. The slice length is fixed.
    #[inline]
    pub fn samples_mut(&mut self) -> &mut [f64] {
        &mut self.samples
    }

    /// Sample at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= frame_size()`.
    #[inline]
    pub fn sample(&self, i: usize) -> f64 {
        self.samples[i]
    }

    /// Overwrite the sample at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= frame_size()`.
    #[inline]
    pub fn set_sample(&mut self, i: usize, value: f64) {
        self.samples[i] = value;
    }

    /// Zero every sample and reset the level to the floor.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
        self.level_db = MIN_LEVEL_DB;
    }

    /// Copy the first `frame_size()` samples of `other` verbatim.
    ///
    /// Extra samples in a longer source are ignored. The level is copied
    /// along with the samples.
    pub fn copy_from(&mut self, other: &SignalBuffer) -> Result<(), SignalError> {
        self.copy_from_slice(&other.samples)?;
        self.level_db = other.level_db;
        Ok(())
    }

    /// Copy the first `frame_size()` values of `source` verbatim.
    pub fn copy_from_slice(&mut self, source: &[f64]) -> Result<(), SignalError> {
        let needed = self.samples.len();
        if source.len() < needed {
            return Err(SignalError::SourceTooShort {
                source_len: source.len(),
                needed,
            });
        }
        self.samples.copy_from_slice(&source[..needed]);
        Ok(())
    }

    /// Capture one frame from `source`, blocking until it is complete.
    ///
    /// Reads exactly `2 * frame_size()` bytes, decodes them, and recomputes the
    /// level. On error the samples and level keep their previous values.
    pub fn capture_from<S: FrameSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<(), DeviceError> {
        source.read_frame(&mut self.scratch)?;
        decode_i16_le(&self.scratch, &mut self.samples);
        self.level_db = rms_db(&self.samples);
        Ok(())
    }

    /// Encode the frame and write it to `sink`, blocking until it is accepted.
    ///
    /// Writes exactly `2 * frame_size()` bytes. Samples outside `[-1.0, 1.0)`
    /// saturate.
    pub fn render_to<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), DeviceError> {
        encode_i16_le(&self.samples, &mut self.scratch);
        sink.write_frame(&self.scratch)
    }
}
