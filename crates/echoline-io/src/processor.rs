//! Background capture → effect → playback loop.
//!
//! An [`AudioProcessor`] owns one capture line, one playback line, an input
//! and an output [`SignalBuffer`], and an effect. [`AudioProcessor::start`]
//! moves all of it onto a dedicated OS thread and returns a
//! [`ProcessorHandle`] for control and observation.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──start()──► Running ──loop exits──► Stopped
//! ```
//!
//! `start` consumes the processor, so a stopped processor cannot be restarted.
//! The loop exits when termination is requested, when capture fails
//! ([`StopReason::StreamEnded`]), or when playback fails
//! ([`StopReason::WriteFailed`]). Whatever the cause, both lines are closed
//! exactly once by the loop thread before the handle reports `Stopped`.
//!
//! ## Cancellation
//!
//! [`ProcessorHandle::terminate`] clears the running flag and fires the close
//! signal of both lines. The flag is observed at every iteration boundary; the
//! close signals force a capture or playback call that is blocked on the
//! device to return, so shutdown never waits on hardware.
//!
//! ## Observation
//!
//! After every frame the loop publishes copies of both buffers under a mutex,
//! using `try_lock` so the audio thread never waits on a reader. Readers
//! always see a complete frame, possibly one that is a few frames old.

use crate::{CaptureLine, CloseSignal, Error, Line, PlaybackLine, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use echoline_core::{DeviceError, FrameEffect, Passthrough, SignalBuffer};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, TryLockError};
use std::thread::JoinHandle;
use std::time::Duration;

const THREAD_NAME: &str = "echoline-audio";

/// Lifecycle state of a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    /// Constructed, loop not started.
    Created,
    /// Loop thread is executing.
    Running,
    /// Loop has exited and both lines are closed. Terminal.
    Stopped,
}

/// Why the processing loop exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Termination was requested.
    Terminated,
    /// The capture line failed or ran out of data.
    StreamEnded(String),
    /// The playback line rejected a frame.
    WriteFailed(String),
}

impl StopReason {
    /// Whether the loop stopped because it was asked to.
    pub fn is_requested(&self) -> bool {
        matches!(self, StopReason::Terminated)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Terminated => write!(f, "terminated"),
            StopReason::StreamEnded(cause) => write!(f, "stream ended: {cause}"),
            StopReason::WriteFailed(cause) => write!(f, "write failed: {cause}"),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Copy `frame` into `slot` unless a reader holds it; a poisoned slot is recovered.
fn publish(slot: &Mutex<SignalBuffer>, frame: &SignalBuffer) -> bool {
    let mut snapshot = match slot.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        Err(TryLockError::WouldBlock) => return false,
    };
    match snapshot.copy_from(frame) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "snapshot not published");
            false
        }
    }
}

/// Capture → effect → playback pipeline, not yet running.
pub struct AudioProcessor {
    input: Box<dyn CaptureLine>,
    output: Box<dyn PlaybackLine>,
    input_signal: SignalBuffer,
    output_signal: SignalBuffer,
    effect: Box<dyn FrameEffect + Send>,
}

impl AudioProcessor {
    /// Build a processor over two open lines with `frame_size` samples per frame.
    ///
    /// The effect defaults to [`Passthrough`].
    pub fn new(
        input: Box<dyn CaptureLine>,
        output: Box<dyn PlaybackLine>,
        frame_size: usize,
    ) -> Result<Self> {
        let input_signal =
            SignalBuffer::new(frame_size).map_err(|_| Error::InvalidFrameSize(frame_size))?;
        let output_signal = input_signal.clone();
        Ok(Self {
            input,
            output,
            input_signal,
            output_signal,
            effect: Box::new(Passthrough),
        })
    }

    /// Replace the effect applied between capture and playback.
    pub fn with_effect(mut self, effect: Box<dyn FrameEffect + Send>) -> Self {
        self.effect = effect;
        self
    }

    /// Samples per frame.
    pub fn frame_size(&self) -> usize {
        self.input_signal.frame_size()
    }

    /// Always [`ProcessorState::Created`]; a started processor is a [`ProcessorHandle`].
    pub fn state(&self) -> ProcessorState {
        ProcessorState::Created
    }

    /// Current input buffer.
    pub fn input_signal(&self) -> &SignalBuffer {
        &self.input_signal
    }

    /// Current output buffer.
    pub fn output_signal(&self) -> &SignalBuffer {
        &self.output_signal
    }

    /// Spawn the loop thread and return immediately.
    pub fn start(self) -> Result<ProcessorHandle> {
        let frame_size = self.frame_size();
        let closers = [self.input.close_signal(), self.output.close_signal()];
        let shared = Arc::new(Shared {
            running: AtomicBool::new(true),
            finished: AtomicBool::new(false),
            frames: AtomicU64::new(0),
            input: Mutex::new(self.input_signal.clone()),
            output: Mutex::new(self.output_signal.clone()),
            reason: OnceLock::new(),
        });
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(0);

        let worker_shared = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                let reason = self.run(&worker_shared);
                drop(done_tx);
                reason
            })
            .map_err(Error::Thread)?;

        tracing::info!(frame_size, "processor started");
        Ok(ProcessorHandle {
            shared,
            closers,
            done_rx,
            thread: Some(thread),
            frame_size,
        })
    }

    fn run(mut self, shared: &Shared) -> StopReason {
        let effect = self.effect.name();
        tracing::debug!(
            effect,
            input = %self.input.format(),
            output = %self.output.format(),
            "processing loop entered"
        );

        let reason = loop {
            if !shared.running.load(Ordering::Acquire) {
                break StopReason::Terminated;
            }
            if let Err(e) = self.input_signal.capture_from(&mut *self.input) {
                break shared.failure(e, StopReason::StreamEnded);
            }
            self.effect.apply(&self.input_signal, &mut self.output_signal);
            if let Err(e) = self.output_signal.render_to(&mut *self.output) {
                break shared.failure(e, StopReason::WriteFailed);
            }
            publish(&shared.input, &self.input_signal);
            publish(&shared.output, &self.output_signal);
            shared.frames.fetch_add(1, Ordering::Relaxed);
        };

        self.input.close();
        self.output.close();

        let frames = shared.frames.load(Ordering::Relaxed);
        match &reason {
            StopReason::Terminated => tracing::info!(frames, "processor terminated"),
            other => tracing::warn!(frames, reason = %other, "processor stopped"),
        }
        let _ = shared.reason.set(reason.clone());
        shared.finished.store(true, Ordering::Release);
        reason
    }
}

impl fmt::Debug for AudioProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioProcessor")
            .field("frame_size", &self.frame_size())
            .field("effect", &self.effect.name())
            .field("input", &self.input.format())
            .field("output", &self.output.format())
            .finish()
    }
}

struct Shared {
    running: AtomicBool,
    finished: AtomicBool,
    frames: AtomicU64,
    input: Mutex<SignalBuffer>,
    output: Mutex<SignalBuffer>,
    reason: OnceLock<StopReason>,
}

impl Shared {
    /// A device failure after a termination request is the termination itself.
    fn failure(&self, err: DeviceError, kind: fn(String) -> StopReason) -> StopReason {
        if self.running.load(Ordering::Acquire) {
            kind(err.to_string())
        } else {
            StopReason::Terminated
        }
    }
}

/// Control and observation handle for a running processor.
///
/// Dropping the handle requests termination without waiting for the thread.
pub struct ProcessorHandle {
    shared: Arc<Shared>,
    closers: [CloseSignal; 2],
    done_rx: Receiver<()>,
    thread: Option<JoinHandle<StopReason>>,
    frame_size: usize,
}

impl ProcessorHandle {
    /// Request termination and unblock any in-flight device call. Never blocks.
    pub fn terminate(&self) {
        if self.shared.running.swap(false, Ordering::AcqRel) {
            tracing::debug!("termination requested");
        }
        for closer in &self.closers {
            closer.close();
        }
    }

    /// [`ProcessorState::Running`] until the loop has exited and closed its
    /// lines, then [`ProcessorState::Stopped`].
    pub fn state(&self) -> ProcessorState {
        if self.shared.finished.load(Ordering::Acquire) {
            ProcessorState::Stopped
        } else {
            ProcessorState::Running
        }
    }

    /// Whether termination has been requested.
    pub fn is_terminating(&self) -> bool {
        !self.shared.running.load(Ordering::Acquire)
    }

    /// Frames fully captured, processed, and played so far.
    pub fn frames_processed(&self) -> u64 {
        self.shared.frames.load(Ordering::Relaxed)
    }

    /// Samples per frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Snapshot of the most recently published input frame.
    pub fn input_signal(&self) -> SignalBuffer {
        lock(&self.shared.input).clone()
    }

    /// Snapshot of the most recently published output frame.
    pub fn output_signal(&self) -> SignalBuffer {
        lock(&self.shared.output).clone()
    }

    /// Why the loop exited, once it has.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.shared.reason.get().cloned()
    }

    /// Wait up to `timeout` for the loop to exit. Returns `true` if it has.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.done_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    /// Block until the loop exits and return why it did.
    ///
    /// Does not request termination; call [`terminate`](Self::terminate)
    /// first to stop a live stream.
    pub fn join(mut self) -> StopReason {
        let Some(thread) = self.thread.take() else {
            return self.stop_reason().unwrap_or(StopReason::Terminated);
        };
        match thread.join() {
            Ok(reason) => reason,
            Err(_) => {
                tracing::error!("processing thread panicked");
                StopReason::StreamEnded("processing thread panicked".to_string())
            }
        }
    }
}

impl fmt::Debug for ProcessorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorHandle")
            .field("state", &self.state())
            .field("frame_size", &self.frame_size)
            .field("frames_processed", &self.frames_processed())
            .finish()
    }
}

impl Drop for ProcessorHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.terminate();
        }
    }
}
