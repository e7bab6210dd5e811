use std::collections::{HashMap, VecDeque};

use soundmeter::*;

/// One frame of scripted analyser output
#[derive(Clone)]
struct Script {
    amplitudes: Vec<u8>,
    magnitudes: Vec<f32>,
}

impl Script {
    fn new(amplitude: u8, peak: usize) -> Self {
        let mut magnitudes = vec![-100.0; BINS];
        magnitudes[peak] = -20.0;
        Script {
            amplitudes: vec![amplitude; BINS],
            magnitudes,
        }
    }
}

const BINS: usize = 512;
const SAMPLE_RATE: u32 = 44100;

struct Scripted {
    frames: VecDeque<Script>,
    last: Script,
    error: Option<CaptureError>,
}

impl Analyser for Scripted {
    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
    fn frequency_bin_count(&self) -> usize {
        BINS
    }
    fn byte_frequency_data(&mut self, data: &mut [u8]) {
        if let Some(next) = self.frames.pop_front() {
            self.last = next;
        }
        data.copy_from_slice(&self.last.amplitudes);
    }
    fn float_frequency_data(&mut self, data: &mut [f32]) {
        data.copy_from_slice(&self.last.magnitudes);
    }
    fn take_error(&mut self) -> Option<CaptureError> {
        self.error.take()
    }
}

#[derive(Default)]
struct FakeCapture {
    outcomes: VecDeque<Result<Vec<Script>, CaptureError>>,
    opened: usize,
}

impl FakeCapture {
    fn granting(frames: Vec<Script>) -> Self {
        let mut capture = FakeCapture::default();
        capture.outcomes.push_back(Ok(frames));
        capture
    }
}

impl Capture for FakeCapture {
    type Analyser = Scripted;
    fn open(&mut self, fft_size: usize) -> CaptureResult<Scripted> {
        assert_eq!(fft_size, 1024);
        let frames = self
            .outcomes
            .pop_front()
            .unwrap_or(Err(CaptureError::PermissionDenied))?;
        self.opened += 1;
        Ok(Scripted {
            frames: frames.into(),
            last: Script::new(0, 0),
            error: None,
        })
    }
}

#[derive(Default)]
struct Screen {
    readouts: HashMap<Readout, String>,
    markers: HashMap<Scale, f32>,
    created: Vec<Scale>,
    controls: Vec<Controls>,
    error: Option<String>,
}

impl Screen {
    fn text(&self, readout: Readout) -> &str {
        self.readouts.get(&readout).map(String::as_str).unwrap_or("")
    }
}

impl Surface for Screen {
    fn set_readout(&mut self, readout: Readout, text: &str) {
        self.readouts.insert(readout, text.to_string());
    }
    fn create_marker(&mut self, scale: Scale) {
        self.created.push(scale);
    }
    fn move_marker(&mut self, scale: Scale, position: f32) {
        assert!(self.created.contains(&scale));
        self.markers.insert(scale, position);
    }
    fn set_controls(&mut self, controls: Controls) {
        self.controls.push(controls);
    }
    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }
}

fn hz(bin: usize) -> f32 {
    bin as f32 * (SAMPLE_RATE as f32 / 2.0) / BINS as f32
}

#[test]
fn stop_before_start_is_a_no_op() {
    let mut screen = Screen::default();
    let mut meter = Meter::new(FakeCapture::default(), &mut screen);
    meter.stop();
    meter.stop();
    assert_eq!(meter.state(), State::Idle);
    assert!(meter.tick().is_none());
    drop(meter);
    assert_eq!(screen.controls, vec![Controls::IDLE]);
}

#[test]
fn denied_capture_shows_message_and_stays_idle() {
    let mut screen = Screen::default();
    let mut meter = Meter::new(FakeCapture::default(), &mut screen);
    let err = meter.start().unwrap_err();
    assert!(matches!(err, CaptureError::PermissionDenied));
    assert_eq!(meter.state(), State::Idle);
    assert!(meter.stop_handle().is_none());
    drop(meter);
    assert_eq!(screen.error.as_deref(), Some(CAPTURE_UNAVAILABLE));
    assert_eq!(screen.controls, vec![Controls::IDLE]);
}

#[test]
fn silent_frames_read_zero_and_leave_frequencies() {
    let frames = vec![Script::new(0, 0), Script::new(1, 0)];
    let mut meter = Meter::new(FakeCapture::granting(frames), Screen::default());
    meter.start().unwrap();
    for _ in 0..2 {
        let frame = meter.tick().unwrap();
        assert_eq!(frame.loudness, 0);
        assert_eq!(frame.dominant_frequency, 0.0);
    }
    assert_eq!(*meter.extrema(), Extrema::default());
    let screen = meter.surface();
    assert_eq!(screen.text(Readout::Loudness), "0");
    assert_eq!(screen.text(Readout::LowestFrequency), "Infinity");
    assert_eq!(screen.markers[&Scale::Intensity], 0.0);
    assert_eq!(screen.markers[&Scale::Frequency], 0.0);
}

#[test]
fn extrema_accumulate_across_ticks() {
    let frames = vec![
        Script::new(50, 20),
        Script::new(200, 5),
        Script::new(10, 0),
        Script::new(100, 40),
    ];
    let expected: Vec<i32> = [50u8, 200, 10, 100]
        .iter()
        .map(|&a| (20.0 * f64::from(a).log10()).round() as i32)
        .collect();
    let mut meter = Meter::new(FakeCapture::granting(frames), Screen::default());
    meter.start().unwrap();
    let mut peak = 0;
    for &loudness in &expected {
        let frame = meter.tick().unwrap();
        assert_eq!(frame.loudness, loudness);
        peak = peak.max(loudness);
        assert_eq!(meter.extrema().peak_loudness, peak);
    }
    let extrema = *meter.extrema();
    assert_eq!(extrema.peak_loudness, 46);
    assert_eq!(extrema.peak_frequency, hz(40));
    assert_eq!(extrema.min_frequency, hz(5));

    let screen = meter.surface();
    assert_eq!(screen.text(Readout::Loudness), "40");
    assert_eq!(screen.text(Readout::PeakLoudness), "46");
    assert_eq!(screen.text(Readout::Frequency), format_hz(hz(40)));
    assert_eq!(screen.text(Readout::PeakFrequency), format_hz(hz(40)));
    assert_eq!(screen.text(Readout::LowestFrequency), format_hz(hz(5)));
    assert_eq!(screen.created, vec![Scale::Intensity, Scale::Frequency]);
    assert_eq!(screen.markers[&Scale::Intensity], 0.4);
}

#[test]
fn ties_resolve_to_the_lowest_bin() {
    let mut tied = Script::new(30, 7);
    tied.magnitudes[3] = -20.0;
    tied.magnitudes[9] = -20.0;
    let mut meter = Meter::new(FakeCapture::granting(vec![tied]), Screen::default());
    meter.start().unwrap();
    assert_eq!(meter.tick().unwrap().dominant_frequency, hz(3));
}

#[test]
fn stop_releases_and_restart_keeps_extrema() {
    let mut capture = FakeCapture::granting(vec![Script::new(100, 10)]);
    capture.outcomes.push_back(Ok(vec![Script::new(20, 30)]));
    let mut meter = Meter::new(capture, Screen::default());

    meter.start().unwrap();
    meter.tick().unwrap();
    meter.stop();
    assert_eq!(meter.state(), State::Idle);
    assert!(meter.session().is_none());
    assert!(meter.tick().is_none());

    meter.start().unwrap();
    assert_eq!(meter.capture().opened, 2);
    meter.tick().unwrap();
    let extrema = meter.extrema();
    assert_eq!(extrema.peak_loudness, 40);
    assert_eq!(extrema.peak_frequency, hz(30));
    assert_eq!(extrema.min_frequency, hz(10));
    assert_eq!(
        meter.surface().controls,
        vec![Controls::IDLE, Controls::ACTIVE, Controls::IDLE, Controls::ACTIVE]
    );
}

#[test]
fn cancelled_handle_stops_the_run() {
    let frames = (0..10).map(|i| Script::new(10 * i as u8, i + 1)).collect();
    let mut meter = Meter::new(FakeCapture::granting(frames), Screen::default());
    meter.start().unwrap();
    let handle = meter.stop_handle().unwrap();
    for _ in 0..3 {
        meter.tick().unwrap();
    }
    handle.cancel();
    assert!(meter.tick().is_none());
    assert_eq!(meter.state(), State::Idle);
    assert_eq!(meter.surface().controls.last(), Some(&Controls::IDLE));
    assert!(meter.tick().is_none());
}

#[test]
fn restart_after_cancelled_handle_opens_a_new_session() {
    let mut capture = FakeCapture::granting(vec![Script::new(100, 10)]);
    capture.outcomes.push_back(Ok(vec![Script::new(20, 30)]));
    let mut meter = Meter::new(capture, Screen::default());
    meter.start().unwrap();
    meter.tick().unwrap();
    meter.stop_handle().unwrap().cancel();
    assert_eq!(meter.state(), State::Idle);

    meter.start().unwrap();
    assert_eq!(meter.state(), State::Active);
    assert_eq!(meter.capture().opened, 2);
    assert_eq!(
        meter.surface().controls,
        vec![Controls::IDLE, Controls::ACTIVE, Controls::IDLE, Controls::ACTIVE]
    );
    assert_eq!(meter.session().unwrap().ticks(), 0);
    assert_eq!(meter.tick().unwrap().dominant_frequency, hz(30));
}

#[test]
fn run_ticks_until_stopped() {
    struct StopAfter {
        clock: ManualClock,
        limit: u64,
        handle: CancelToken,
    }
    impl Clock for StopAfter {
        fn wait_for_frame(&mut self) {
            self.clock.wait_for_frame();
            if self.clock.frames == self.limit {
                self.handle.cancel();
            }
        }
    }

    let mut meter = Meter::new(FakeCapture::granting(Vec::new()), Screen::default());
    meter.start().unwrap();
    let clock = StopAfter {
        clock: ManualClock::default(),
        limit: 5,
        handle: meter.stop_handle().unwrap(),
    };
    assert_eq!(meter.run(clock), 5);
    assert!(!meter.is_active());
}

#[test]
fn capture_error_during_tick_returns_to_idle() {
    let mut meter = Meter::new(
        Failing(FakeCapture::granting(Vec::new())),
        Screen::default(),
    );
    meter.start().unwrap();
    assert!(meter.tick().is_none());
    assert_eq!(meter.state(), State::Idle);
    assert_eq!(meter.surface().error.as_deref(), Some(CAPTURE_UNAVAILABLE));
    assert_eq!(meter.surface().controls.last(), Some(&Controls::IDLE));
}

/// Wraps a capture so every opened analyser reports a lost stream
struct Failing(FakeCapture);

impl Capture for Failing {
    type Analyser = Scripted;
    fn open(&mut self, fft_size: usize) -> CaptureResult<Scripted> {
        let mut analyser = self.0.open(fft_size)?;
        analyser.error = Some(CaptureError::NoDevice);
        Ok(analyser)
    }
}

#[test]
fn out_of_range_markers_are_clamped() {
    let mut loud = Script::new(255, 511);
    loud.magnitudes[511] = 0.0;
    let mut meter = Meter::new(FakeCapture::granting(vec![loud]), Screen::default());
    meter.start().unwrap();
    meter.tick().unwrap();
    let screen = meter.surface();
    assert_eq!(screen.markers[&Scale::Intensity], 0.48);
    // 22 kHz is past the top of the four decade scale
    assert_eq!(screen.markers[&Scale::Frequency], 1.0);
    assert!(screen.markers.values().all(|&p| (0.0..=1.0).contains(&p)));
}
