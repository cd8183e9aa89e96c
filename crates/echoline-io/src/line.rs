//! Line handles and forced close.
//!
//! A line is an open capture or playback endpoint. Beyond moving frames
//! ([`FrameSource`] / [`FrameSink`]) every line exposes a [`CloseSignal`]: a
//! cloneable handle another thread can fire to make a blocked
//! `read_frame` / `write_frame` return [`DeviceError::Closed`] promptly.
//!
//! ## Cancellation contract
//!
//! - [`CloseSignal::close`] never blocks and may be called from any thread.
//! - After it fires, the owning line fails every call with
//!   [`DeviceError::Closed`], including a call that was already blocked.
//! - The platform resources of the line are released by [`Line::close`] on the
//!   thread that owns the line (or on drop). Closing twice is a no-op.
//!
//! [`DeviceError::Closed`]: echoline_core::DeviceError::Closed

use crate::AudioFormat;
use crossbeam_channel::{Receiver, Sender};
use echoline_core::{FrameSink, FrameSource};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Common behavior of capture and playback lines.
pub trait Line: Send {
    /// Format the line was opened with.
    fn format(&self) -> AudioFormat;

    /// Handle that can close this line from another thread.
    fn close_signal(&self) -> CloseSignal;

    /// Release the line. Idempotent and infallible.
    fn close(&mut self);

    /// Whether the line has been closed, from either side.
    fn is_closed(&self) -> bool {
        self.close_signal().is_closed()
    }
}

/// An open capture line: "read N encoded frames, blocking".
pub trait CaptureLine: Line + FrameSource {}

impl<T: Line + FrameSource> CaptureLine for T {}

/// An open playback line: "write N encoded frames, blocking".
pub trait PlaybackLine: Line + FrameSink {}

impl<T: Line + FrameSink> PlaybackLine for T {}

/// Thread-safe, one-shot close request shared by a line and its closers.
///
/// Blocking line implementations wait on [`CloseSignal::receiver`] alongside
/// their data source (for example in a `crossbeam_channel::select!`). The
/// receiver never yields a message; it becomes disconnected, and therefore
/// ready, the moment the signal fires.
#[derive(Clone)]
pub struct CloseSignal {
    inner: Arc<CloseInner>,
}

struct CloseInner {
    closed: AtomicBool,
    /// Dropped on close so `wake_rx` disconnects
    wake_tx: Mutex<Option<Sender<()>>>,
    wake_rx: Receiver<()>,
}

impl CloseSignal {
    /// Create an open (not yet fired) signal.
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(0);
        Self {
            inner: Arc::new(CloseInner {
                closed: AtomicBool::new(false),
                wake_tx: Mutex::new(Some(wake_tx)),
                wake_rx,
            }),
        }
    }

    /// Fire the signal. Returns `true` only for the call that fired it.
    pub fn close(&self) -> bool {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.inner
            .wake_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        true
    }

    /// Whether the signal has fired.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Receiver that becomes ready (disconnected) once the signal fires.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.inner.wake_rx
    }
}

impl Default for CloseSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CloseSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseSignal")
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn close_fires_once() {
        let signal = CloseSignal::new();
        assert!(!signal.is_closed());
        assert!(signal.close());
        assert!(!signal.close());
        assert!(signal.is_closed());
    }

    #[test]
    fn clones_share_state() {
        let signal = CloseSignal::new();
        let other = signal.clone();
        other.close();
        assert!(signal.is_closed());
    }

    #[test]
    fn receiver_wakes_blocked_thread() {
        let signal = CloseSignal::new();
        let waiter = signal.clone();
        let started = Instant::now();
        let thread = std::thread::spawn(move || waiter.receiver().recv().is_err());

        std::thread::sleep(Duration::from_millis(20));
        signal.close();
        assert!(thread.join().unwrap(), "receiver should disconnect");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn receiver_ready_after_close() {
        let signal = CloseSignal::new();
        signal.close();
        assert_eq!(
            signal.receiver().try_recv(),
            Err(crossbeam_channel::TryRecvError::Disconnected)
        );
    }

    #[test]
    fn debug_shows_state() {
        let signal = CloseSignal::new();
        assert!(format!("{signal:?}").contains("closed: false"));
    }
}
