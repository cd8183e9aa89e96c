//! cpal-based device catalog and lines.
//!
//! [`CpalCatalog`] wraps [cpal](https://crates.io/crates/cpal) for
//! cross-platform device enumeration and line opening (ALSA on Linux,
//! CoreAudio on macOS, WASAPI on Windows).
//!
//! cpal is callback driven while the processor wants blocking reads and
//! writes, so each line owns a bounded crossbeam channel between the audio
//! callback and the processing thread:
//!
//! ```text
//! capture:  cpal callback ──Vec<i16>──► CpalCaptureLine::read_frame ──┐
//!                  ▲                                                  │
//!                  └──────────────── empty chunk ◄────────────────────┘
//! playback: CpalPlaybackLine::write_frame ──Vec<i16>──► cpal callback
//! ```
//!
//! The callback never blocks. Capture chunks are allocated once when the
//! line opens and recycled by the reader. When no empty chunk is available
//! (capture) or no data is queued (playback) the callback drops data or
//! plays silence and bumps a counter that is reported when the line closes.

use crate::device::match_device;
use crate::{
    AudioFormat, CaptureLine, CloseSignal, DeviceCatalog, DeviceInfo, Direction, Error, Line,
    PlaybackLine, Result,
};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};
use crossbeam_channel::{Receiver, Sender};
use echoline_core::{BYTES_PER_SAMPLE, DeviceError, FrameSink, FrameSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Chunks buffered between a cpal callback and the processing thread.
const CHANNEL_DEPTH: usize = 8;

/// Samples reserved per capture chunk.
const CHUNK_CAPACITY: usize = 4096;

fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Device catalog backed by the platform's default cpal host.
pub struct CpalCatalog {
    host: Host,
}

impl CpalCatalog {
    /// Connect to the default audio host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal catalog initialized");
        Self { host }
    }

    fn describe(&self, device: &Device, name: String) -> DeviceInfo {
        let input = device.default_input_config().ok();
        let output = device.default_output_config().ok();
        let default_sample_rate = input
            .as_ref()
            .or(output.as_ref())
            .map(|c| c.sample_rate())
            .unwrap_or(48000);
        let role = match (input.is_some(), output.is_some()) {
            (true, true) => "duplex",
            (true, false) => "capture",
            (false, true) => "playback",
            (false, false) => "inactive",
        };
        DeviceInfo {
            name,
            vendor: self.host.id().name().to_string(),
            description: format!("{} audio device: {}", self.host.id().name(), role),
            version: "Unknown Version".to_string(),
            is_input: input.is_some(),
            is_output: output.is_some(),
            default_sample_rate,
        }
    }

    fn resolve(&self, name: &str, direction: Direction) -> Result<Device> {
        let devices = self.devices()?;
        let info = match_device(&devices, name, Some(direction))?;
        let candidates = match direction {
            Direction::Capture => self.host.input_devices(),
            Direction::Playback => self.host.output_devices(),
        }
        .map_err(|e| Error::Backend(e.to_string()))?;

        for device in candidates {
            if let Ok(dev_name) = device_name(&device)
                && dev_name == info.name
            {
                return Ok(device);
            }
        }
        Err(Error::DeviceNotFound(format!(
            "{} device '{}' disappeared",
            direction.label(),
            name
        )))
    }
}

impl Default for CpalCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceCatalog for CpalCatalog {
    fn backend_name(&self) -> &str {
        "cpal"
    }

    fn devices(&self) -> Result<Vec<DeviceInfo>> {
        let mut devices: Vec<DeviceInfo> = Vec::new();
        let all = self
            .host
            .devices()
            .map_err(|e| Error::Backend(e.to_string()))?;

        for device in all {
            let Ok(name) = device_name(&device) else {
                continue;
            };
            if devices.iter().any(|d| d.name == name) {
                continue;
            }
            devices.push(self.describe(&device, name));
        }
        tracing::debug!(count = devices.len(), "enumerated cpal devices");
        Ok(devices)
    }

    fn open_capture(&self, name: &str, format: AudioFormat) -> Result<Box<dyn CaptureLine>> {
        let device = self.resolve(name, Direction::Capture)?;
        Ok(Box::new(CpalCaptureLine::open(&device, format)?))
    }

    fn open_playback(&self, name: &str, format: AudioFormat) -> Result<Box<dyn PlaybackLine>> {
        let device = self.resolve(name, Direction::Playback)?;
        Ok(Box::new(CpalPlaybackLine::open(&device, format)?))
    }
}

fn stream_config(format: AudioFormat) -> Result<cpal::StreamConfig> {
    if !format.is_codec_compatible() {
        return Err(Error::UnsupportedFormat(format.to_string()));
    }
    Ok(cpal::StreamConfig {
        channels: format.channels,
        sample_rate: format.sample_rate,
        buffer_size: cpal::BufferSize::Default,
    })
}

/// Capture line fed by a cpal input stream.
pub struct CpalCaptureLine {
    stream: Option<Stream>,
    data_rx: Receiver<Vec<i16>>,
    free_tx: Sender<Vec<i16>>,
    pending: Vec<u8>,
    format: AudioFormat,
    close: CloseSignal,
    overruns: Arc<AtomicU64>,
}

impl CpalCaptureLine {
    /// Open and start an input stream on `device`.
    pub fn open(device: &Device, format: AudioFormat) -> Result<Self> {
        let config = stream_config(format)?;
        let (feed, data_rx, free_tx) = CaptureFeed::new();
        let overruns = Arc::clone(&feed.overruns);
        let close = CloseSignal::new();

        let err_close = close.clone();
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| feed.push(data),
                move |err| {
                    tracing::error!(error = %err, "input stream error");
                    err_close.close();
                },
                None,
            )
            .map_err(|e| Error::LineUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| Error::LineUnavailable(e.to_string()))?;
        tracing::info!(format = %format, "input stream started");

        Ok(Self {
            stream: Some(stream),
            data_rx,
            free_tx,
            pending: Vec::with_capacity(CHUNK_CAPACITY * BYTES_PER_SAMPLE),
            format,
            close,
            overruns,
        })
    }
}

impl FrameSource for CpalCaptureLine {
    fn read_frame(&mut self, buf: &mut [u8]) -> std::result::Result<(), DeviceError> {
        while self.pending.len() < buf.len() {
            if self.close.is_closed() {
                return Err(DeviceError::Closed);
            }
            crossbeam_channel::select! {
                recv(self.data_rx) -> chunk => match chunk {
                    Ok(mut chunk) => {
                        self.pending.extend(chunk.iter().flat_map(|s| s.to_le_bytes()));
                        chunk.clear();
                        let _ = self.free_tx.try_send(chunk);
                    }
                    Err(_) => return Err(DeviceError::EndOfStream),
                },
                recv(self.close.receiver()) -> _ => return Err(DeviceError::Closed),
            }
        }
        buf.copy_from_slice(&self.pending[..buf.len()]);
        self.pending.drain(..buf.len());
        Ok(())
    }
}

impl Line for CpalCaptureLine {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn close_signal(&self) -> CloseSignal {
        self.close.clone()
    }

    fn close(&mut self) {
        self.close.close();
        if self.stream.take().is_some() {
            let overruns = self.overruns.load(Ordering::Relaxed);
            if overruns > 0 {
                tracing::warn!(overruns, "input stream dropped chunks");
            }
            tracing::info!("input stream closed");
        }
    }
}

impl Drop for CpalCaptureLine {
    fn drop(&mut self) {
        Line::close(self);
    }
}

/// Callback side of a capture line: copies each callback's samples into a
/// recycled chunk.
struct CaptureFeed {
    free_rx: Receiver<Vec<i16>>,
    data_tx: Sender<Vec<i16>>,
    overruns: Arc<AtomicU64>,
}

impl CaptureFeed {
    /// Returns the feed, the filled-chunk receiver, and the recycle sender.
    /// The pool holds `CHANNEL_DEPTH` chunks, so a taken chunk always fits in
    /// the data channel.
    fn new() -> (Self, Receiver<Vec<i16>>, Sender<Vec<i16>>) {
        let (data_tx, data_rx) = crossbeam_channel::bounded(CHANNEL_DEPTH);
        let (free_tx, free_rx) = crossbeam_channel::bounded(CHANNEL_DEPTH);
        for _ in 0..CHANNEL_DEPTH {
            let _ = free_tx.try_send(Vec::with_capacity(CHUNK_CAPACITY));
        }
        let feed = Self {
            free_rx,
            data_tx,
            overruns: Arc::new(AtomicU64::new(0)),
        };
        (feed, data_rx, free_tx)
    }

    fn push(&self, data: &[i16]) {
        let Ok(mut chunk) = self.free_rx.try_recv() else {
            self.overruns.fetch_add(1, Ordering::Relaxed);
            return;
        };
        chunk.extend_from_slice(data);
        let _ = self.data_tx.try_send(chunk);
    }
}

/// Playback line draining into a cpal output stream.
pub struct CpalPlaybackLine {
    stream: Option<Stream>,
    data_tx: Sender<Vec<i16>>,
    format: AudioFormat,
    close: CloseSignal,
    underruns: Arc<AtomicU64>,
}

impl CpalPlaybackLine {
    /// Open and start an output stream on `device`.
    pub fn open(device: &Device, format: AudioFormat) -> Result<Self> {
        let config = stream_config(format)?;
        let (data_tx, data_rx) = crossbeam_channel::bounded::<Vec<i16>>(CHANNEL_DEPTH);
        let close = CloseSignal::new();
        let underruns = Arc::new(AtomicU64::new(0));

        let cb_underruns = Arc::clone(&underruns);
        let err_close = close.clone();
        let mut pending: Vec<i16> = Vec::new();
        let mut cursor = 0usize;
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    let mut starved = false;
                    for out in data.iter_mut() {
                        if cursor >= pending.len() {
                            match data_rx.try_recv() {
                                Ok(chunk) => {
                                    pending = chunk;
                                    cursor = 0;
                                }
                                Err(_) => {
                                    starved = true;
                                    *out = 0;
                                    continue;
                                }
                            }
                        }
                        *out = pending.get(cursor).copied().unwrap_or(0);
                        cursor += 1;
                    }
                    if starved {
                        cb_underruns.fetch_add(1, Ordering::Relaxed);
                    }
                },
                move |err| {
                    tracing::error!(error = %err, "output stream error");
                    err_close.close();
                },
                None,
            )
            .map_err(|e| Error::LineUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| Error::LineUnavailable(e.to_string()))?;
        tracing::info!(format = %format, "output stream started");

        Ok(Self {
            stream: Some(stream),
            data_tx,
            format,
            close,
            underruns,
        })
    }
}

impl FrameSink for CpalPlaybackLine {
    fn write_frame(&mut self, buf: &[u8]) -> std::result::Result<(), DeviceError> {
        if self.close.is_closed() {
            return Err(DeviceError::Closed);
        }
        let samples: Vec<i16> = buf
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        crossbeam_channel::select! {
            send(self.data_tx, samples) -> sent => sent.map_err(|_| {
                DeviceError::WriteFailed("output stream stopped".to_string())
            }),
            recv(self.close.receiver()) -> _ => Err(DeviceError::Closed),
        }
    }
}

impl Line for CpalPlaybackLine {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn close_signal(&self) -> CloseSignal {
        self.close.clone()
    }

    fn close(&mut self) {
        self.close.close();
        if self.stream.take().is_some() {
            let underruns = self.underruns.load(Ordering::Relaxed);
            if underruns > 0 {
                tracing::warn!(underruns, "output stream starved");
            }
            tracing::info!("output stream closed");
        }
    }
}

impl Drop for CpalPlaybackLine {
    fn drop(&mut self) {
        Line::close(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_feed_recycles_preallocated_chunks() {
        let (feed, data_rx, free_tx) = CaptureFeed::new();

        for i in 0..CHANNEL_DEPTH {
            let v = i16::try_from(i).unwrap();
            feed.push(&[v, -v]);
        }
        // Pool exhausted: the callback drops the chunk instead of allocating.
        feed.push(&[99]);
        assert_eq!(feed.overruns.load(Ordering::Relaxed), 1);

        let mut chunk = data_rx.try_recv().unwrap();
        assert_eq!(chunk, [0, 0]);
        assert!(chunk.capacity() >= CHUNK_CAPACITY);
        let reused = chunk.as_ptr();
        chunk.clear();
        free_tx.try_send(chunk).unwrap();

        feed.push(&[7, 8, 9]);
        assert_eq!(feed.overruns.load(Ordering::Relaxed), 1);
        let last = data_rx.try_iter().last().unwrap();
        assert_eq!(last, [7, 8, 9]);
        assert_eq!(last.as_ptr(), reused);
    }

    #[test]
    fn catalog_backend_name() {
        let catalog = CpalCatalog::new();
        assert_eq!(catalog.backend_name(), "cpal");
    }

    #[test]
    fn catalog_lists_without_panicking() {
        let catalog = CpalCatalog::new();
        // Availability depends on the machine; only enumeration must not panic.
        let _ = catalog.devices();
    }

    #[test]
    fn unknown_device_is_not_found() {
        let catalog = CpalCatalog::new();
        let result = catalog.open_capture("no such device 0x5f3759df", AudioFormat::default());
        assert!(matches!(
            result,
            Err(Error::DeviceNotFound(_)) | Err(Error::Backend(_))
        ));
    }

    #[test]
    fn stereo_format_rejected() {
        let format = AudioFormat {
            channels: 2,
            ..AudioFormat::mono_i16(8000)
        };
        assert!(matches!(
            stream_config(format),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
