//! In-memory lines and catalog.
//!
//! Deterministic stand-ins for hardware, used by tests and by anything that
//! wants to drive the processor without a sound card:
//!
//! - [`MemoryCaptureLine`] replays recorded bytes, optionally looping,
//!   pacing each frame, or holding the line open at the end of data
//! - [`MemoryPlaybackLine`] records everything written, optionally failing
//!   after a number of frames
//! - [`MemoryCatalog`] hands these lines out by device name
//! - [`LineTap`] observes a line after it has been moved into a processor

use crate::device::match_device;
use crate::{
    AudioFormat, CaptureLine, CloseSignal, DeviceCatalog, DeviceInfo, Direction, Error, Line,
    PlaybackLine, Result,
};
use echoline_core::{DeviceError, FrameSink, FrameSource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct TapState {
    releases: AtomicUsize,
    frames: AtomicUsize,
    bytes: Mutex<Vec<u8>>,
}

/// Observer for a memory line that has been handed to someone else.
#[derive(Debug, Clone)]
pub struct LineTap {
    close: CloseSignal,
    state: Arc<TapState>,
}

impl LineTap {
    /// Whether the line's close signal has fired.
    pub fn is_closed(&self) -> bool {
        self.close.is_closed()
    }

    /// How many times the line actually released itself. Should never exceed one.
    pub fn release_count(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }

    /// Frames successfully transferred so far.
    pub fn frames(&self) -> usize {
        self.state.frames.load(Ordering::SeqCst)
    }

    /// Bytes written to a playback line so far. Empty for capture lines.
    pub fn bytes(&self) -> Vec<u8> {
        lock(&self.state.bytes).clone()
    }
}

/// Capture line backed by a byte vector.
#[derive(Debug)]
pub struct MemoryCaptureLine {
    data: Vec<u8>,
    pos: usize,
    looping: bool,
    hold_open: bool,
    pace: Option<Duration>,
    format: AudioFormat,
    close: CloseSignal,
    released: bool,
    state: Arc<TapState>,
}

impl MemoryCaptureLine {
    /// Replay `data` once, then report end of stream.
    ///
    /// A trailing partial frame is never delivered.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            looping: false,
            hold_open: false,
            pace: None,
            format: AudioFormat::default(),
            close: CloseSignal::new(),
            released: false,
            state: Arc::default(),
        }
    }

    /// Replay `data` forever. Empty data behaves like an endless silent line.
    pub fn looping(data: Vec<u8>) -> Self {
        let mut line = Self::new(data);
        line.looping = true;
        line
    }

    /// Block at the end of data until the line is closed, like a microphone
    /// that never produces another frame.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Sleep for `pace` before delivering each frame.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    /// Set the reported format.
    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    /// Observer that stays valid after the line is moved.
    pub fn tap(&self) -> LineTap {
        LineTap {
            close: self.close.clone(),
            state: Arc::clone(&self.state),
        }
    }

    fn wait_for_close(&self) -> DeviceError {
        let _ = self.close.receiver().recv();
        DeviceError::Closed
    }

    fn fill(&mut self, buf: &mut [u8]) -> bool {
        if self.looping {
            if self.data.is_empty() {
                buf.fill(0);
                return true;
            }
            for byte in buf.iter_mut() {
                *byte = self.data[self.pos];
                self.pos = (self.pos + 1) % self.data.len();
            }
            return true;
        }
        let end = self.pos + buf.len();
        if end > self.data.len() {
            return false;
        }
        buf.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        true
    }
}

impl FrameSource for MemoryCaptureLine {
    fn read_frame(&mut self, buf: &mut [u8]) -> std::result::Result<(), DeviceError> {
        if self.close.is_closed() {
            return Err(DeviceError::Closed);
        }
        if let Some(pace) = self.pace
            && self.close.receiver().recv_timeout(pace).is_err()
            && self.close.is_closed()
        {
            return Err(DeviceError::Closed);
        }
        if self.fill(buf) {
            self.state.frames.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        }
        if self.hold_open {
            return Err(self.wait_for_close());
        }
        Err(DeviceError::EndOfStream)
    }
}

impl Line for MemoryCaptureLine {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn close_signal(&self) -> CloseSignal {
        self.close.clone()
    }

    fn close(&mut self) {
        self.close.close();
        if !self.released {
            self.released = true;
            self.state.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MemoryCaptureLine {
    fn drop(&mut self) {
        Line::close(self);
    }
}

/// Playback line that records every byte written to it.
#[derive(Debug)]
pub struct MemoryPlaybackLine {
    fail_after: Option<usize>,
    pace: Option<Duration>,
    format: AudioFormat,
    close: CloseSignal,
    released: bool,
    state: Arc<TapState>,
}

impl MemoryPlaybackLine {
    /// Record every frame.
    pub fn new() -> Self {
        Self {
            fail_after: None,
            pace: None,
            format: AudioFormat::default(),
            close: CloseSignal::new(),
            released: false,
            state: Arc::default(),
        }
    }

    /// Accept `frames` frames, then fail every write.
    pub fn failing_after(frames: usize) -> Self {
        let mut line = Self::new();
        line.fail_after = Some(frames);
        line
    }

    /// Sleep for `pace` before accepting each frame.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    /// Set the reported format.
    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    /// Observer that stays valid after the line is moved.
    pub fn tap(&self) -> LineTap {
        LineTap {
            close: self.close.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MemoryPlaybackLine {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for MemoryPlaybackLine {
    fn write_frame(&mut self, buf: &[u8]) -> std::result::Result<(), DeviceError> {
        if self.close.is_closed() {
            return Err(DeviceError::Closed);
        }
        if let Some(pace) = self.pace
            && self.close.receiver().recv_timeout(pace).is_err()
            && self.close.is_closed()
        {
            return Err(DeviceError::Closed);
        }
        let written = self.state.frames.load(Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| written >= limit) {
            return Err(DeviceError::WriteFailed(format!(
                "memory line refused frame {}",
                written
            )));
        }
        lock(&self.state.bytes).extend_from_slice(buf);
        self.state.frames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Line for MemoryPlaybackLine {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn close_signal(&self) -> CloseSignal {
        self.close.clone()
    }

    fn close(&mut self) {
        self.close.close();
        if !self.released {
            self.released = true;
            self.state.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MemoryPlaybackLine {
    fn drop(&mut self) {
        Line::close(self);
    }
}

/// Catalog of in-memory devices.
///
/// Each registered line can be opened once; a second open of the same
/// device reports [`Error::LineUnavailable`], like a device already in use.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    devices: Vec<DeviceInfo>,
    captures: Mutex<HashMap<String, MemoryCaptureLine>>,
    playbacks: Mutex<HashMap<String, MemoryPlaybackLine>>,
}

impl MemoryCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capture device that replays `data` once.
    pub fn with_capture(self, name: &str, data: Vec<u8>) -> Self {
        self.with_capture_line(name, MemoryCaptureLine::new(data))
    }

    /// Add a capture device backed by `line`.
    pub fn with_capture_line(mut self, name: &str, line: MemoryCaptureLine) -> Self {
        self.register(name, Direction::Capture);
        lock(&self.captures).insert(name.to_lowercase(), line);
        self
    }

    /// Add a playback device that records what it is given.
    pub fn with_playback(self, name: &str) -> Self {
        self.with_playback_line(name, MemoryPlaybackLine::new())
    }

    /// Add a playback device backed by `line`.
    pub fn with_playback_line(mut self, name: &str, line: MemoryPlaybackLine) -> Self {
        self.register(name, Direction::Playback);
        lock(&self.playbacks).insert(name.to_lowercase(), line);
        self
    }

    /// Add a device entry with no line behind it. Opening it reports
    /// [`Error::LineUnavailable`].
    pub fn with_device(mut self, info: DeviceInfo) -> Self {
        self.devices.push(info);
        self
    }

    fn register(&mut self, name: &str, direction: Direction) {
        if let Some(existing) = self.devices.iter_mut().find(|d| d.name_matches(name)) {
            match direction {
                Direction::Capture => existing.is_input = true,
                Direction::Playback => existing.is_output = true,
            }
            return;
        }
        self.devices.push(DeviceInfo {
            name: name.to_string(),
            vendor: "echoline".to_string(),
            description: "In-memory audio line".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            is_input: direction == Direction::Capture,
            is_output: direction == Direction::Playback,
            default_sample_rate: AudioFormat::default().sample_rate,
        });
    }
}

impl DeviceCatalog for MemoryCatalog {
    fn backend_name(&self) -> &str {
        "memory"
    }

    fn devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self.devices.clone())
    }

    fn open_capture(&self, name: &str, format: AudioFormat) -> Result<Box<dyn CaptureLine>> {
        let device = match_device(&self.devices, name, Some(Direction::Capture))?;
        let line = lock(&self.captures)
            .remove(&device.name.to_lowercase())
            .ok_or_else(|| Error::LineUnavailable(format!("'{}' is in use", device.name)))?;
        Ok(Box::new(line.with_format(format)))
    }

    fn open_playback(&self, name: &str, format: AudioFormat) -> Result<Box<dyn PlaybackLine>> {
        let device = match_device(&self.devices, name, Some(Direction::Playback))?;
        let line = lock(&self.playbacks)
            .remove(&device.name.to_lowercase())
            .ok_or_else(|| Error::LineUnavailable(format!("'{}' is in use", device.name)))?;
        Ok(Box::new(line.with_format(format)))
    }
}
