//! Device capabilities required by the signal path.
//!
//! The pipeline never talks to a platform audio API directly. Whatever sits on
//! either end of it only has to move encoded frames, blocking until the whole
//! frame has been transferred:
//!
//! - [`FrameSource`] - "read N encoded bytes, blocking" (capture)
//! - [`FrameSink`] - "write N encoded bytes, blocking" (playback)
//!
//! Frames are signed 16-bit little-endian PCM, two bytes per mono sample.
//! A source or sink that can no longer make progress reports a
//! [`DeviceError`]; the processor treats any such error as the end of the
//! stream.

#[cfg(not(feature = "std"))]
use alloc::string::String;

/// Mid-stream failure reported by a capture or playback device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The capture device has no more data to deliver.
    #[error("end of stream")]
    EndOfStream,

    /// The device handle was closed, possibly while a call was blocked on it.
    #[error("line closed")]
    Closed,

    /// The playback device refused or failed to accept a frame.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Any other device-side failure (I/O, backend error).
    #[error("device failure: {0}")]
    Backend(String),
}

/// Blocking source of encoded frames.
///
/// Implementations must fill `buf` completely or return an error. Partial
/// frames are never reported as success.
pub trait FrameSource {
    /// Read exactly `buf.len()` bytes, blocking until they are available.
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<(), DeviceError>;
}

/// Blocking sink of encoded frames.
pub trait FrameSink {
    /// Write all of `buf`, blocking until the device has accepted it.
    fn write_frame(&mut self, buf: &[u8]) -> Result<(), DeviceError>;
}

impl<T: FrameSource + ?Sized> FrameSource for &mut T {
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<(), DeviceError> {
        (**self).read_frame(buf)
    }
}

impl<T: FrameSink + ?Sized> FrameSink for &mut T {
    fn write_frame(&mut self, buf: &[u8]) -> Result<(), DeviceError> {
        (**self).write_frame(buf)
    }
}
