//! One-call start/stop over a device catalog.

use crate::{AudioFormat, AudioProcessor, DeviceCatalog, Error, ProcessorHandle, Result};
use echoline_core::{FrameEffect, Passthrough};

/// Open both lines by name and start a pass-through processor.
///
/// Fails with [`Error::DeviceNotFound`] or [`Error::LineUnavailable`] when a
/// device cannot be opened at mono 16-bit `sample_rate`, and with
/// [`Error::InvalidFrameSize`] for a zero frame size. No line is left open
/// on failure.
pub fn start_processing<C: DeviceCatalog + ?Sized>(
    catalog: &C,
    input_device: &str,
    output_device: &str,
    sample_rate: u32,
    frame_size: usize,
) -> Result<ProcessorHandle> {
    start_processing_with_effect(
        catalog,
        input_device,
        output_device,
        sample_rate,
        frame_size,
        Box::new(Passthrough),
    )
}

/// Like [`start_processing`], applying `effect` to every frame.
pub fn start_processing_with_effect<C: DeviceCatalog + ?Sized>(
    catalog: &C,
    input_device: &str,
    output_device: &str,
    sample_rate: u32,
    frame_size: usize,
    effect: Box<dyn FrameEffect + Send>,
) -> Result<ProcessorHandle> {
    if frame_size == 0 {
        return Err(Error::InvalidFrameSize(frame_size));
    }
    if sample_rate == 0 {
        return Err(Error::LineUnavailable(
            "sample rate must be greater than 0".to_string(),
        ));
    }

    let format = AudioFormat::mono_i16(sample_rate);
    tracing::info!(
        backend = catalog.backend_name(),
        input = input_device,
        output = output_device,
        format = %format,
        frame_size,
        effect = effect.name(),
        "starting processing"
    );

    let input = catalog.open_capture(input_device, format)?;
    let output = catalog.open_playback(output_device, format)?;
    AudioProcessor::new(input, output, frame_size)?
        .with_effect(effect)
        .start()
}

/// Request termination of a running processor. Does not wait for it to stop.
pub fn stop_processing(handle: &ProcessorHandle) {
    handle.terminate();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryCaptureLine, MemoryCatalog};
    use crate::{ProcessorState, StopReason};
    use std::time::Duration;

    #[test]
    fn zero_frame_size_opens_nothing() {
        let catalog = MemoryCatalog::new()
            .with_capture("mic", Vec::new())
            .with_playback("spk");
        assert!(matches!(
            start_processing(&catalog, "mic", "spk", 8000, 0),
            Err(Error::InvalidFrameSize(0))
        ));
        // Lines are still available.
        assert!(start_processing(&catalog, "mic", "spk", 8000, 4).is_ok());
    }

    #[test]
    fn unknown_output_is_not_found() {
        let catalog = MemoryCatalog::new().with_capture("mic", Vec::new());
        assert!(matches!(
            start_processing(&catalog, "mic", "nowhere", 8000, 4),
            Err(Error::DeviceNotFound(_))
        ));
    }

    #[test]
    fn zero_rate_is_unavailable() {
        let catalog = MemoryCatalog::new()
            .with_capture("mic", Vec::new())
            .with_playback("spk");
        assert!(matches!(
            start_processing(&catalog, "mic", "spk", 0, 4),
            Err(Error::LineUnavailable(_))
        ));
    }

    #[test]
    fn stop_processing_terminates() {
        let catalog = MemoryCatalog::new()
            .with_capture_line("Mic", MemoryCaptureLine::looping(vec![0; 4]))
            .with_playback("Speakers");
        let handle = start_processing(&catalog, "MIC", "speakers", 16000, 2).unwrap();
        stop_processing(&handle);
        assert!(handle.wait_timeout(Duration::from_secs(5)));
        assert_eq!(handle.state(), ProcessorState::Stopped);
        assert_eq!(handle.join(), StopReason::Terminated);
    }
}
