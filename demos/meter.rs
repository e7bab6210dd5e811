use std::io::{self, Write};

use soundmeter::*;

const WIDTH: usize = 40;

#[derive(Default)]
struct Terminal {
    loudness: String,
    peak_loudness: String,
    frequency: String,
    peak_frequency: String,
    lowest_frequency: String,
    intensity: Option<f32>,
    pitch: Option<f32>,
}

fn bar(position: Option<f32>) -> String {
    let mut bar = vec!['-'; WIDTH + 1];
    if let Some(position) = position {
        bar[(position * WIDTH as f32).round() as usize] = '|';
    }
    bar.into_iter().collect()
}

impl Terminal {
    fn redraw(&self) {
        print!(
            "\r{:>4} dB (peak {:>3}) [{}]  {:>5} Hz (peak {:>5}, low {:>8}) [{}]",
            self.loudness,
            self.peak_loudness,
            bar(self.intensity),
            self.frequency,
            self.peak_frequency,
            self.lowest_frequency,
            bar(self.pitch),
        );
        let _ = io::stdout().flush();
    }
}

impl Surface for Terminal {
    fn set_readout(&mut self, readout: Readout, text: &str) {
        let slot = match readout {
            Readout::Loudness => &mut self.loudness,
            Readout::PeakLoudness => &mut self.peak_loudness,
            Readout::Frequency => &mut self.frequency,
            Readout::PeakFrequency => &mut self.peak_frequency,
            Readout::LowestFrequency => &mut self.lowest_frequency,
        };
        *slot = text.to_string();
    }
    fn create_marker(&mut self, _: Scale) {}
    fn move_marker(&mut self, scale: Scale, position: f32) {
        match scale {
            Scale::Intensity => self.intensity = Some(position),
            Scale::Frequency => {
                self.pitch = Some(position);
                self.redraw();
            }
        }
    }
    fn set_controls(&mut self, controls: Controls) {
        if controls.stop_enabled {
            println!("Listening. Press Ctrl+C to stop.");
        }
    }
    fn show_error(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

fn main() {
    env_logger::init();
    let mut meter = Meter::new(Microphone::new(), Terminal::default());
    if meter.start().is_err() {
        return;
    }
    let stop = meter.stop_handle().unwrap();
    ctrlc::set_handler(move || stop.cancel()).unwrap();
    let ticks = meter.run(FrameClock::default());
    let extrema = meter.extrema();
    println!();
    println!(
        "{} frames, peak {} dB, {} to {} Hz",
        ticks,
        extrema.peak_loudness,
        format_hz(extrema.min_frequency),
        format_hz(extrema.peak_frequency)
    );
}
