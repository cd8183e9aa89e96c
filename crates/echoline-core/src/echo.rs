//! Feedback echo effects.
//!
//! Both echoes compute `y[n] = x[n] + decay · y[n - delay]`. They differ in
//! how far back `y[n - delay]` can reach:
//!
//! | Effect | History | Tail across frames |
//! |--------|---------|--------------------|
//! | [`Echo`] | current output frame only | No |
//! | [`EchoLine`] | circular buffer of `delay` samples | Yes |
//!
//! [`Echo`] never reads before index 0 of the frame, so with
//! `delay >= frame_size` it degenerates into a pass-through. Use [`EchoLine`]
//! for echoes longer than a frame.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::effect::FrameEffect;
use crate::signal::SignalBuffer;

/// Frame-local feedback echo.
///
/// Immutable after construction and stateless: feedback is read from the
/// output frame being written, left to right.
///
/// ```text
/// for i in 0..frame_size:
///     sample = input[i]
///     if i >= delay:
///         sample += output[i - delay] * decay
///     output[i] = sample
/// ```
///
/// With `delay == 0` the feedback term reads `output[i]` before it is
/// overwritten, i.e. the previous frame's value at the same index.
///
/// # Example
///
/// ```rust
/// use echoline_core::{Echo, FrameEffect, SignalBuffer};
///
/// let mut input = SignalBuffer::new(8).unwrap();
/// input.samples_mut()[..4].fill(1.0);
/// let mut output = SignalBuffer::new(8).unwrap();
///
/// Echo::new(2, 0.5).apply(&input, &mut output);
/// assert_eq!(output.samples(), &[1.0, 1.0, 1.5, 1.5, 0.75, 0.75, 0.375, 0.375]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Echo {
    delay: usize,
    decay: f64,
}

impl Echo {
    /// Creates an echo with `delay` in samples and feedback gain `decay`.
    pub fn new(delay: usize, decay: f64) -> Self {
        Self { delay, decay }
    }

    /// Delay in samples.
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Feedback gain.
    pub fn decay(&self) -> f64 {
        self.decay
    }
}

impl FrameEffect for Echo {
    fn apply(&mut self, input: &SignalBuffer, output: &mut SignalBuffer) {
        debug_assert_eq!(input.frame_size(), output.frame_size());
        let input = input.samples();
        let output = output.samples_mut();
        let n = input.len().min(output.len());

        for i in 0..n {
            let mut sample = input[i];
            if i >= self.delay {
                sample += output[i - self.delay] * self.decay;
            }
            output[i] = sample;
        }
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

/// Feedback echo with a persistent delay line.
///
/// Keeps the last `delay` output samples in a circular buffer, so the echo
/// tail continues into the following frames regardless of frame size.
/// A delay of zero would feed a sample back into itself; it is treated as a
/// pass-through.
///
/// # Memory
///
/// The delay line is allocated at construction. `apply` never allocates.
///
/// # Example
///
/// ```rust
/// use echoline_core::{EchoLine, FrameEffect, SignalBuffer};
///
/// let mut echo = EchoLine::new(4, 0.5);
/// let mut input = SignalBuffer::new(2).unwrap();
/// let mut output = SignalBuffer::new(2).unwrap();
///
/// input.set_sample(0, 1.0);
/// echo.apply(&input, &mut output); // [1.0, 0.0]
/// input.clear();
/// echo.apply(&input, &mut output); // [0.0, 0.0]
/// echo.apply(&input, &mut output); // tail arrives in the third frame
/// assert_eq!(output.samples(), &[0.5, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct EchoLine {
    /// Past output samples, `delay` long
    history: Vec<f64>,
    /// Slot holding `y[n - delay]` for the next sample
    pos: usize,
    decay: f64,
}

impl EchoLine {
    /// Creates an echo line with `delay` in samples and feedback gain `decay`.
    pub fn new(delay: usize, decay: f64) -> Self {
        #[cfg(feature = "tracing")]
        tracing::debug!("echo_line: delay {delay} samples, decay {decay}");
        Self {
            history: vec![0.0; delay],
            pos: 0,
            decay,
        }
    }

    /// Delay in samples.
    pub fn delay(&self) -> usize {
        self.history.len()
    }

    /// Feedback gain.
    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Process a single sample through the delay line.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        if self.history.is_empty() {
            return input;
        }
        let output = input + self.history[self.pos] * self.decay;
        self.history[self.pos] = output;
        self.pos += 1;
        if self.pos == self.history.len() {
            self.pos = 0;
        }
        output
    }
}

impl FrameEffect for EchoLine {
    fn apply(&mut self, input: &SignalBuffer, output: &mut SignalBuffer) {
        debug_assert_eq!(input.frame_size(), output.frame_size());
        for (out, &x) in output.samples_mut().iter_mut().zip(input.samples()) {
            *out = self.process(x);
        }
    }

    fn reset(&mut self) {
        self.history.fill(0.0);
        self.pos = 0;
    }

    fn name(&self) -> &'static str {
        "echo_line"
    }
}
