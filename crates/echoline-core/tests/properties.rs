//! Property-based tests for echoline-core.
//!
//! Verifies codec round trips, copy semantics, and echo boundary behavior
//! using proptest for randomized input generation.

use echoline_core::{
    DeviceError, Echo, EchoLine, FrameEffect, FrameSink, FrameSource, MIN_LEVEL_DB, SignalBuffer,
    decode_i16_le, encode_i16_le, i16_to_sample, sample_to_i16,
};
use proptest::prelude::*;

/// Loopback device: whatever is rendered can be captured back.
#[derive(Default)]
struct Loopback {
    bytes: Vec<u8>,
}

impl FrameSink for Loopback {
    fn write_frame(&mut self, buf: &[u8]) -> Result<(), DeviceError> {
        self.bytes.extend_from_slice(buf);
        Ok(())
    }
}

impl FrameSource for Loopback {
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<(), DeviceError> {
        if self.bytes.len() < buf.len() {
            return Err(DeviceError::EndOfStream);
        }
        buf.copy_from_slice(&self.bytes[..buf.len()]);
        self.bytes.drain(..buf.len());
        Ok(())
    }
}

fn frame(values: &[f64]) -> SignalBuffer {
    let mut buffer = SignalBuffer::new(values.len()).unwrap();
    buffer.samples_mut().copy_from_slice(values);
    buffer
}

#[test]
fn every_i16_survives_decode_encode() {
    for value in i16::MIN..=i16::MAX {
        assert_eq!(sample_to_i16(i16_to_sample(value)), value);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Raw bytes decoded and re-encoded come back unchanged.
    #[test]
    fn bytes_round_trip(values in prop::collection::vec(any::<i16>(), 1..256)) {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut samples = vec![0.0; values.len()];
        decode_i16_le(&bytes, &mut samples);

        let mut encoded = vec![0u8; bytes.len()];
        encode_i16_le(&samples, &mut encoded);
        prop_assert_eq!(encoded, bytes);
    }

    /// Render then capture through a loopback reproduces the quantized frame.
    #[test]
    fn render_capture_round_trip(values in prop::collection::vec(-1.0f64..1.0, 1..128)) {
        let mut source = frame(&values);
        let mut device = Loopback::default();
        source.render_to(&mut device).unwrap();

        let mut captured = SignalBuffer::new(values.len()).unwrap();
        captured.capture_from(&mut device).unwrap();

        for (&original, &back) in values.iter().zip(captured.samples()) {
            prop_assert!((original - back).abs() <= 1.0 / 32768.0);
        }
        prop_assert!(captured.level_db() >= MIN_LEVEL_DB);
    }

    /// Encoding never wraps: any finite sample lands on the same side of zero.
    #[test]
    fn encode_saturates(sample in -100.0f64..100.0) {
        let encoded = sample_to_i16(sample);
        if sample >= 1.0 / 32768.0 {
            prop_assert!(encoded > 0);
        } else if sample <= -1.0 / 32768.0 {
            prop_assert!(encoded < 0);
        }
    }

    /// Copying from a longer buffer takes exactly the first frame_size values.
    #[test]
    fn copy_from_takes_prefix(
        values in prop::collection::vec(-1.0f64..1.0, 2..64),
        cut in 1usize..64,
    ) {
        let frame_size = cut.min(values.len());
        let source = frame(&values);
        let mut target = SignalBuffer::new(frame_size).unwrap();
        target.copy_from(&source).unwrap();
        prop_assert_eq!(target.samples(), &values[..frame_size]);
    }

    /// A delay at or beyond the frame size never applies feedback.
    #[test]
    fn echo_long_delay_is_identity(
        values in prop::collection::vec(-1.0f64..1.0, 1..64),
        extra in 0usize..32,
        decay in 0.0f64..1.0,
    ) {
        let input = frame(&values);
        let mut output = SignalBuffer::new(values.len()).unwrap();
        Echo::new(values.len() + extra, decay).apply(&input, &mut output);
        prop_assert_eq!(output.samples(), input.samples());
    }

    /// The delay line gives the same stream regardless of how it is framed.
    #[test]
    fn echo_line_is_frame_size_independent(
        values in prop::collection::vec(-1.0f64..1.0, 64),
        delay in 1usize..40,
        decay in 0.0f64..0.95,
        frame_size in prop::sample::select(vec![1usize, 4, 16, 64]),
    ) {
        let mut whole = EchoLine::new(delay, decay);
        let expected: Vec<f64> = values.iter().map(|&x| whole.process(x)).collect();

        let mut framed = EchoLine::new(delay, decay);
        let mut output = SignalBuffer::new(frame_size).unwrap();
        let mut actual = Vec::with_capacity(values.len());
        for chunk in values.chunks(frame_size) {
            framed.apply(&frame(chunk), &mut output);
            actual.extend_from_slice(output.samples());
        }
        prop_assert_eq!(actual, expected);
    }
}
