//! Echoline Core - signal buffers and frame effects
//!
//! This crate holds everything in the echoline pipeline that does not touch a
//! platform audio API: the floating-point frame buffer, the 16-bit PCM codec
//! that feeds it, per-frame level metering, and the single effect slot.
//!
//! # Core Abstractions
//!
//! ## Signal Path
//!
//! - [`SignalBuffer`] - Fixed-length `f64` frame with a derived dB level
//! - [`FrameSource`] / [`FrameSink`] - Blocking "read N encoded frames" /
//!   "write N encoded frames" capabilities provided by devices
//! - [`DeviceError`] - Mid-stream device failures
//!
//! ## Codec
//!
//! Samples travel as signed 16-bit little-endian PCM. See the [`pcm`] module
//! for the exact scaling and clamping rules.
//!
//! ## Effects
//!
//! - [`FrameEffect`] - Object-safe trait for the processor's effect slot
//! - [`Passthrough`] - Identity copy (the default slot content)
//! - [`Echo`] - Frame-local feedback echo
//! - [`EchoLine`] - Echo with a persistent delay line that crosses frames
//!
//! # Example
//!
//! ```rust
//! use echoline_core::{Echo, FrameEffect, SignalBuffer};
//!
//! let mut input = SignalBuffer::new(8).unwrap();
//! let mut output = SignalBuffer::new(8).unwrap();
//! for i in 0..4 {
//!     input.set_sample(i, 1.0);
//! }
//!
//! let mut echo = Echo::new(2, 0.5);
//! echo.apply(&input, &mut output);
//! assert_eq!(output.sample(2), 1.5);
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: capture, render, and effect application never allocate
//! - **Fixed framing**: a buffer's length is chosen once and never changes
//! - **Object-safe traits**: devices and effects are used behind `dyn`

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod device;
pub mod echo;
pub mod effect;
pub mod level;
pub mod pcm;
pub mod signal;

// Re-export main types at crate root
pub use device::{DeviceError, FrameSink, FrameSource};
pub use echo::{Echo, EchoLine};
pub use effect::{FrameEffect, Passthrough};
pub use level::{MIN_LEVEL_DB, rms_db};
pub use pcm::{
    BYTES_PER_SAMPLE, PCM_SCALE, decode_i16_le, encode_i16_le, i16_to_sample, sample_to_i16,
};
pub use signal::{SignalBuffer, SignalError};
