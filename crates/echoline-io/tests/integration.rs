//! Integration tests for echoline-io: catalog lookup, the processing loop,
//! and WAV-backed lines.

use echoline_core::{Echo, EchoLine};
use echoline_io::memory::{MemoryCaptureLine, MemoryCatalog, MemoryPlaybackLine};
use echoline_io::{
    AudioFormat, AudioProcessor, DeviceCatalog, DeviceInfo, Error, Line, ProcessorState, StopReason,
    WavCaptureLine, WavPlaybackLine, find_device, find_input_device, find_output_device,
    list_devices, start_processing, start_processing_with_effect, stop_processing,
};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

const WAIT: Duration = Duration::from_secs(5);

fn encode(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

fn decode(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

// ---------------------------------------------------------------------------
// Device catalog
// ---------------------------------------------------------------------------

#[test]
fn catalog_lists_registered_devices() {
    let catalog = MemoryCatalog::new()
        .with_capture("USB Audio Device", Vec::new())
        .with_playback("Speakers (Realtek)");
    let devices = list_devices(&catalog).unwrap();
    let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["USB Audio Device", "Speakers (Realtek)"]);
    for device in &devices {
        assert!(!device.vendor.is_empty());
        assert!(!device.description.is_empty());
        assert!(!device.version.is_empty());
    }
}

#[test]
fn lookup_is_case_insensitive_and_exact() {
    let catalog = MemoryCatalog::new()
        .with_capture("USB Audio Device", Vec::new())
        .with_playback("Speakers");

    assert_eq!(
        find_device(&catalog, "usb audio DEVICE").unwrap().name,
        "USB Audio Device"
    );
    assert!(find_input_device(&catalog, "USB AUDIO DEVICE").is_ok());
    assert!(find_output_device(&catalog, "speakers").is_ok());

    assert!(matches!(
        find_device(&catalog, "USB Audio"),
        Err(Error::DeviceNotFound(_))
    ));
    assert!(matches!(
        find_output_device(&catalog, "USB Audio Device"),
        Err(Error::DeviceNotFound(_))
    ));
}

#[test]
fn device_without_line_is_unavailable() {
    let catalog = MemoryCatalog::new()
        .with_device(DeviceInfo {
            name: "Busy Mic".to_string(),
            vendor: "Acme".to_string(),
            description: "held by another application".to_string(),
            version: "2.1".to_string(),
            is_input: true,
            is_output: false,
            default_sample_rate: 44100,
        })
        .with_playback("Speakers");

    assert!(matches!(
        start_processing(&catalog, "busy mic", "Speakers", 8000, 256),
        Err(Error::LineUnavailable(_))
    ));
}

#[test]
fn lines_open_at_requested_format() {
    let catalog = MemoryCatalog::new()
        .with_capture("mic", Vec::new())
        .with_playback("spk");
    let format = AudioFormat::mono_i16(22050);
    assert_eq!(catalog.open_capture("mic", format).unwrap().format(), format);
    assert_eq!(catalog.open_playback("spk", format).unwrap().format(), format);
}

// ---------------------------------------------------------------------------
// Processing loop
// ---------------------------------------------------------------------------

#[test]
fn passthrough_reproduces_input_bytes() {
    let input: Vec<i16> = (0..64).map(|i| (i * 997 % 65536 - 32768) as i16).collect();
    let data = encode(&input);
    let output = MemoryPlaybackLine::new();
    let tap = output.tap();
    let catalog = MemoryCatalog::new()
        .with_capture("mic", data.clone())
        .with_playback_line("spk", output);

    let handle = start_processing(&catalog, "mic", "spk", 8000, 16).unwrap();
    assert!(matches!(handle.join(), StopReason::StreamEnded(_)));
    assert_eq!(tap.bytes(), data);
}

#[test]
fn frame_echo_feeds_back_within_frame() {
    let input = encode(&[16384, 16384, 16384, 16384, 0, 0, 0, 0]);
    let output = MemoryPlaybackLine::new();
    let tap = output.tap();
    let catalog = MemoryCatalog::new()
        .with_capture("mic", input)
        .with_playback_line("spk", output);

    let handle = start_processing_with_effect(
        &catalog,
        "mic",
        "spk",
        8000,
        8,
        Box::new(Echo::new(2, 0.5)),
    )
    .unwrap();
    handle.join();

    // 0.5 in, 0.5 * decay fed back from two samples earlier
    assert_eq!(
        decode(&tap.bytes()),
        [16384, 16384, 24576, 24576, 12288, 12288, 6144, 6144]
    );
}

#[test]
fn echo_line_tail_crosses_frames() {
    let input = encode(&[16384, 0, 0, 0, 0, 0, 0, 0]);
    let output = MemoryPlaybackLine::new();
    let tap = output.tap();
    let catalog = MemoryCatalog::new()
        .with_capture("mic", input)
        .with_playback_line("spk", output);

    let handle = start_processing_with_effect(
        &catalog,
        "mic",
        "spk",
        8000,
        4,
        Box::new(EchoLine::new(6, 0.5)),
    )
    .unwrap();
    handle.join();

    let out = decode(&tap.bytes());
    assert_eq!(out.len(), 8);
    assert_eq!(out[0], 16384);
    assert_eq!(out[6], 8192, "echo lands in the second frame");
}

#[test]
fn capture_end_reports_stream_ended() {
    let input = MemoryCaptureLine::new(encode(&[1, 2, 3, 4]));
    let input_tap = input.tap();
    let output = MemoryPlaybackLine::new();
    let output_tap = output.tap();

    let handle = AudioProcessor::new(Box::new(input), Box::new(output), 2)
        .unwrap()
        .start()
        .unwrap();
    assert!(handle.wait_timeout(WAIT));
    assert_eq!(handle.state(), ProcessorState::Stopped);
    assert_eq!(handle.frames_processed(), 2);
    assert_eq!(
        handle.stop_reason(),
        Some(StopReason::StreamEnded("end of stream".to_string()))
    );
    assert_eq!(input_tap.release_count(), 1);
    assert_eq!(output_tap.release_count(), 1);
}

#[test]
fn playback_failure_reports_write_failed() {
    let output = MemoryPlaybackLine::failing_after(5);
    let tap = output.tap();
    let catalog = MemoryCatalog::new()
        .with_capture_line("mic", MemoryCaptureLine::looping(encode(&[7; 32])))
        .with_playback_line("spk", output);

    let handle = start_processing(&catalog, "mic", "spk", 8000, 32).unwrap();
    let reason = handle.join();
    assert!(matches!(reason, StopReason::WriteFailed(_)), "{reason}");
    assert_eq!(tap.frames(), 5);
    assert_eq!(tap.release_count(), 1);
}

#[test]
fn terminate_unblocks_silent_device_promptly() {
    let input = MemoryCaptureLine::new(Vec::new()).hold_open();
    let input_tap = input.tap();
    let output = MemoryPlaybackLine::new();
    let output_tap = output.tap();
    let catalog = MemoryCatalog::new()
        .with_capture_line("mic", input)
        .with_playback_line("spk", output);

    let handle = start_processing(&catalog, "mic", "spk", 8000, 1024).unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(handle.state(), ProcessorState::Running);
    assert_eq!(handle.frames_processed(), 0);

    let started = Instant::now();
    stop_processing(&handle);
    assert!(handle.wait_timeout(WAIT));
    assert!(started.elapsed() < Duration::from_secs(1));

    assert!(input_tap.is_closed());
    assert!(output_tap.is_closed());
    assert_eq!(input_tap.release_count(), 1);
    assert_eq!(output_tap.release_count(), 1);
    assert_eq!(handle.join(), StopReason::Terminated);
}

#[test]
fn terminate_unblocks_stalled_playback() {
    let output = MemoryPlaybackLine::new().with_pace(Duration::from_secs(60));
    let tap = output.tap();
    let catalog = MemoryCatalog::new()
        .with_capture_line("mic", MemoryCaptureLine::looping(encode(&[1, 2])))
        .with_playback_line("spk", output);

    let handle = start_processing(&catalog, "mic", "spk", 8000, 2).unwrap();
    std::thread::sleep(Duration::from_millis(50));
    stop_processing(&handle);
    assert!(handle.wait_timeout(WAIT));
    assert_eq!(handle.stop_reason(), Some(StopReason::Terminated));
    assert_eq!(tap.release_count(), 1);
}

#[test]
fn terminate_is_idempotent() {
    let catalog = MemoryCatalog::new()
        .with_capture_line("mic", MemoryCaptureLine::looping(Vec::new()))
        .with_playback("spk");
    let handle = start_processing(&catalog, "mic", "spk", 8000, 64).unwrap();
    stop_processing(&handle);
    stop_processing(&handle);
    handle.terminate();
    assert_eq!(handle.join(), StopReason::Terminated);
}

#[test]
fn snapshots_are_whole_frames() {
    // Alternating frames of +0.5 and -0.5; a torn read would mix signs.
    let mut samples = vec![16384i16; 64];
    samples.extend(vec![-16384i16; 64]);
    let catalog = MemoryCatalog::new()
        .with_capture_line(
            "mic",
            MemoryCaptureLine::looping(encode(&samples)).with_pace(Duration::from_micros(200)),
        )
        .with_playback("spk");

    let handle = start_processing(&catalog, "mic", "spk", 8000, 64).unwrap();
    let deadline = Instant::now() + Duration::from_millis(200);
    while Instant::now() < deadline {
        for frame in [handle.input_signal(), handle.output_signal()] {
            let first = frame.sample(0);
            assert!(frame.samples().iter().all(|&s| s == first));
        }
    }
    stop_processing(&handle);
    handle.join();
}

#[test]
fn frame_size_is_fixed_for_the_run() {
    let catalog = MemoryCatalog::new()
        .with_capture_line("mic", MemoryCaptureLine::looping(encode(&[100; 10])))
        .with_playback("spk");
    let handle = start_processing(&catalog, "mic", "spk", 8000, 10).unwrap();
    assert_eq!(handle.frame_size(), 10);
    assert_eq!(handle.input_signal().frame_size(), 10);
    stop_processing(&handle);
    handle.join();
}

// ---------------------------------------------------------------------------
// WAV lines
// ---------------------------------------------------------------------------

fn write_wav(path: &std::path::Path, samples: &[i16], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn wav_to_wav_with_echo() {
    let input_file = NamedTempFile::new().unwrap();
    let output_file = NamedTempFile::new().unwrap();
    write_wav(input_file.path(), &[16384, 16384, 0, 0, 0], 16000);

    let input = WavCaptureLine::open(input_file.path()).unwrap();
    let format = input.format();
    assert_eq!(format.sample_rate, 16000);
    let output = WavPlaybackLine::create(output_file.path(), format).unwrap();

    let handle = AudioProcessor::new(Box::new(input), Box::new(output), 4)
        .unwrap()
        .with_effect(Box::new(Echo::new(2, 0.5)))
        .start()
        .unwrap();
    assert!(matches!(handle.join(), StopReason::StreamEnded(_)));

    let reader = hound::WavReader::open(output_file.path()).unwrap();
    assert_eq!(reader.spec().sample_rate, 16000);
    let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
    // Second frame is the padded tail; frame-local echo does not carry over.
    assert_eq!(samples, [16384, 16384, 8192, 8192, 0, 0, 0, 0]);
}

#[test]
fn wav_playback_rejects_big_endian() {
    let file = NamedTempFile::new().unwrap();
    let format = AudioFormat {
        big_endian: true,
        ..AudioFormat::mono_i16(8000)
    };
    assert!(matches!(
        WavPlaybackLine::create(file.path(), format),
        Err(Error::UnsupportedFormat(_))
    ));
}
