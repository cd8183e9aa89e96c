//! Audio I/O layer for echoline.
//!
//! This crate provides:
//!
//! - **Device catalog**: [`DeviceCatalog`], [`list_devices`], and [`find_device`]
//!   for enumerating endpoints and resolving them by name
//! - **Lines**: [`CaptureLine`] / [`PlaybackLine`] handles that move encoded
//!   frames and can be force-closed from another thread via [`CloseSignal`]
//! - **Backends**: [`CpalCatalog`] for hardware, [`WavCaptureLine`] /
//!   [`WavPlaybackLine`] for files, and the [`memory`] module for tests
//! - **Processing**: [`AudioProcessor`] runs capture → effect → playback on a
//!   dedicated thread; [`start_processing`] / [`stop_processing`] wrap it
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use echoline_io::{CpalCatalog, start_processing, stop_processing};
//!
//! let catalog = CpalCatalog::new();
//! let handle = start_processing(&catalog, "USB Audio Device", "Speakers", 8000, 1024)?;
//! std::thread::sleep(std::time::Duration::from_secs(5));
//! stop_processing(&handle);
//! println!("stopped: {}", handle.join());
//! ```
//!
//! ## Wire format
//!
//! Every line carries mono, signed 16-bit, little-endian PCM at the sample rate
//! requested on open. See [`AudioFormat`].

mod cpal_backend;
mod device;
mod format;
mod line;
mod processor;
mod session;
mod wav;

pub mod memory;

pub use cpal_backend::{CpalCaptureLine, CpalCatalog, CpalPlaybackLine};
pub use device::{
    DeviceCatalog, DeviceInfo, Direction, find_device, find_input_device, find_output_device,
    list_devices,
};
pub use format::AudioFormat;
pub use line::{CaptureLine, CloseSignal, Line, PlaybackLine};
pub use processor::{AudioProcessor, ProcessorHandle, ProcessorState, StopReason};
pub use session::{start_processing, start_processing_with_effect, stop_processing};
pub use wav::{WavCaptureLine, WavPlaybackLine};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No device matches the requested name.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The device exists but the line cannot be opened (in use, unsupported format).
    #[error("Line unavailable: {0}")]
    LineUnavailable(String),

    /// Frame size must be at least one sample.
    #[error("Invalid frame size: {0} (must be > 0)")]
    InvalidFrameSize(usize),

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Platform audio backend error.
    #[error("Audio backend error: {0}")]
    Backend(String),

    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The processing thread could not be spawned.
    #[error("Failed to spawn processing thread: {0}")]
    Thread(#[source] std::io::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
