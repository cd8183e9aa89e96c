//! The processor's effect slot.
//!
//! A [`FrameEffect`] transforms one input frame into one output frame. The
//! processor holds exactly one effect; there is no chaining.
//!
//! ## Design Decisions
//!
//! - **Frame-based**: effects see whole [`SignalBuffer`]s rather than single
//!   samples, because the frame-local echo reads back into the output buffer
//!   it is writing.
//!
//! - **Object-safe**: the processor stores its effect as
//!   `Box<dyn FrameEffect + Send>` and moves it onto the audio thread.
//!
//! - **No allocations**: `apply` runs once per frame on the audio thread.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

use crate::signal::SignalBuffer;

/// Transform applied to every frame between capture and render.
///
/// `input` and `output` always have the same frame size. `output` still holds
/// the previous frame's result when `apply` is called, which feedback effects
/// may read.
///
/// # Example
///
/// ```rust
/// use echoline_core::{FrameEffect, SignalBuffer};
///
/// struct Invert;
///
/// impl FrameEffect for Invert {
///     fn apply(&mut self, input: &SignalBuffer, output: &mut SignalBuffer) {
///         for (out, &x) in output.samples_mut().iter_mut().zip(input.samples()) {
///             *out = -x;
///         }
///     }
///
///     fn name(&self) -> &'static str {
///         "invert"
///     }
/// }
/// ```
pub trait FrameEffect {
    /// Write the processed version of `input` into `output`.
    fn apply(&mut self, input: &SignalBuffer, output: &mut SignalBuffer);

    /// Clear any state carried between frames.
    ///
    /// Default does nothing, for stateless effects.
    fn reset(&mut self) {}

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

impl<T: FrameEffect + ?Sized> FrameEffect for Box<T> {
    fn apply(&mut self, input: &SignalBuffer, output: &mut SignalBuffer) {
        (**self).apply(input, output);
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Identity effect: the output frame is a verbatim copy of the input frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Passthrough;

impl FrameEffect for Passthrough {
    fn apply(&mut self, input: &SignalBuffer, output: &mut SignalBuffer) {
        let n = output.frame_size().min(input.frame_size());
        output.samples_mut()[..n].copy_from_slice(&input.samples()[..n]);
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
