//! WAV-file lines.
//!
//! File-backed [`Line`]s let the processor run offline: a
//! [`WavCaptureLine`] plays the role of a microphone and a
//! [`WavPlaybackLine`] the role of a speaker.

use crate::{AudioFormat, CloseSignal, Error, Line, Result};
use echoline_core::{BYTES_PER_SAMPLE, DeviceError, FrameSink, FrameSource};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Capture line that reads a mono 16-bit PCM WAV file.
///
/// The final partial frame is padded with silence; the read after it reports
/// [`DeviceError::EndOfStream`].
pub struct WavCaptureLine {
    reader: WavReader<BufReader<File>>,
    format: AudioFormat,
    close: CloseSignal,
    exhausted: bool,
}

impl WavCaptureLine {
    /// Open `path` for reading.
    ///
    /// Fails with [`Error::UnsupportedFormat`] unless the file is mono,
    /// 16-bit integer PCM.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();
        if spec.channels != 1
            || spec.bits_per_sample != 16
            || spec.sample_format != SampleFormat::Int
        {
            return Err(Error::UnsupportedFormat(format!(
                "{}: {} channel(s), {}-bit {:?} (need mono 16-bit integer)",
                path.as_ref().display(),
                spec.channels,
                spec.bits_per_sample,
                spec.sample_format
            )));
        }
        tracing::debug!(
            path = %path.as_ref().display(),
            sample_rate = spec.sample_rate,
            samples = reader.len(),
            "opened wav capture"
        );
        Ok(Self {
            reader,
            format: AudioFormat::mono_i16(spec.sample_rate),
            close: CloseSignal::new(),
            exhausted: false,
        })
    }

    /// Number of samples in the file.
    pub fn len(&self) -> u32 {
        self.reader.len()
    }

    /// Whether the file holds no samples.
    pub fn is_empty(&self) -> bool {
        self.reader.len() == 0
    }
}

impl FrameSource for WavCaptureLine {
    fn read_frame(&mut self, buf: &mut [u8]) -> std::result::Result<(), DeviceError> {
        if self.close.is_closed() {
            return Err(DeviceError::Closed);
        }
        if self.exhausted {
            return Err(DeviceError::EndOfStream);
        }

        let mut filled = 0;
        let mut samples = self.reader.samples::<i16>();
        for chunk in buf.chunks_exact_mut(BYTES_PER_SAMPLE) {
            match samples.next() {
                Some(Ok(sample)) => {
                    chunk.copy_from_slice(&sample.to_le_bytes());
                    filled += 1;
                }
                Some(Err(e)) => return Err(DeviceError::Backend(e.to_string())),
                None => chunk.fill(0),
            }
        }

        if filled == 0 {
            self.exhausted = true;
            return Err(DeviceError::EndOfStream);
        }
        if filled * BYTES_PER_SAMPLE < buf.len() {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl Line for WavCaptureLine {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn close_signal(&self) -> CloseSignal {
        self.close.clone()
    }

    fn close(&mut self) {
        self.close.close();
    }
}

/// Playback line that writes a mono 16-bit PCM WAV file.
///
/// The header is finalized on [`Line::close`] or drop.
pub struct WavPlaybackLine {
    writer: Option<WavWriter<BufWriter<File>>>,
    path: PathBuf,
    format: AudioFormat,
    close: CloseSignal,
}

impl WavPlaybackLine {
    /// Create (or truncate) `path` for writing at `format.sample_rate`.
    pub fn create<P: AsRef<Path>>(path: P, format: AudioFormat) -> Result<Self> {
        if !format.is_codec_compatible() {
            return Err(Error::UnsupportedFormat(format.to_string()));
        }
        let spec = WavSpec {
            channels: 1,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(path.as_ref(), spec)?;
        Ok(Self {
            writer: Some(writer),
            path: path.as_ref().to_path_buf(),
            format,
            close: CloseSignal::new(),
        })
    }

    /// Destination file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSink for WavPlaybackLine {
    fn write_frame(&mut self, buf: &[u8]) -> std::result::Result<(), DeviceError> {
        if self.close.is_closed() {
            return Err(DeviceError::Closed);
        }
        let writer = self.writer.as_mut().ok_or(DeviceError::Closed)?;
        for chunk in buf.chunks_exact(BYTES_PER_SAMPLE) {
            writer
                .write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))
                .map_err(|e| DeviceError::WriteFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Line for WavPlaybackLine {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn close_signal(&self) -> CloseSignal {
        self.close.clone()
    }

    fn close(&mut self) {
        self.close.close();
        if let Some(writer) = self.writer.take() {
            match writer.finalize() {
                Ok(()) => tracing::debug!(path = %self.path.display(), "wav playback finalized"),
                Err(e) => {
                    tracing::error!(
                        path = %self.path.display(),
                        error = %e,
                        "failed to finalize wav"
                    );
                }
            }
        }
    }
}

impl Drop for WavPlaybackLine {
    fn drop(&mut self) {
        Line::close(self);
    }
}
