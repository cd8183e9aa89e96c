//! Echo tail demo: frame-local `Echo` versus the cross-frame `EchoLine`.
//!
//! Run with: cargo run -p echoline-core --example echo_tail_demo

use echoline_core::{Echo, EchoLine, FrameEffect, SignalBuffer};

const FRAME_SIZE: usize = 8;
const FRAMES: usize = 4;

fn run(effect: &mut dyn FrameEffect) {
    let mut input = SignalBuffer::new(FRAME_SIZE).unwrap();
    let mut output = SignalBuffer::new(FRAME_SIZE).unwrap();

    println!("--- {} ---", effect.name());
    for frame in 0..FRAMES {
        input.clear();
        if frame == 0 {
            input.set_sample(0, 1.0);
        }
        effect.apply(&input, &mut output);

        let cells: Vec<String> = output.samples().iter().map(|s| format!("{s:>6.3}")).collect();
        println!(
            "frame {frame}: [{}]  level {:>7.1} dB",
            cells.join(" "),
            rms(&output)
        );
    }
    println!();
}

fn rms(frame: &SignalBuffer) -> f64 {
    echoline_core::rms_db(frame.samples())
}

fn main() {
    println!("Impulse through a delay of 6 samples, decay 0.5, {FRAME_SIZE}-sample frames\n");
    run(&mut Echo::new(6, 0.5));
    run(&mut EchoLine::new(6, 0.5));
}
