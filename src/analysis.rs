//! Per-frame loudness and dominant frequency estimation

use log::trace;

use crate::Analyser;

/// Averages below this are raised to it before taking the logarithm,
/// so silence reads as 0 instead of negative infinity
pub const LOUDNESS_FLOOR: f64 = 1.0;

/// The values derived from a single analysis frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    /// Decibel-like loudness, rounded to an integer
    pub loudness: i32,
    /// Frequency of the loudest bin in Hz
    pub dominant_frequency: f32,
}

/// Arithmetic mean of the amplitude samples, or 0 if there are none
pub fn average_amplitude(amplitudes: &[u8]) -> f64 {
    if amplitudes.is_empty() {
        return 0.0;
    }
    let sum: u64 = amplitudes.iter().map(|&a| u64::from(a)).sum();
    sum as f64 / amplitudes.len() as f64
}

/// `20 * log10(max(average, 1))`, rounded
pub fn loudness(amplitudes: &[u8]) -> i32 {
    let average = average_amplitude(amplitudes).max(LOUDNESS_FLOOR);
    (20.0 * average.log10()).round() as i32
}

/// Index of the largest magnitude
///
/// Ties resolve to the first index. Returns 0 if no value is greater than
/// negative infinity.
pub fn dominant_bin(magnitudes: &[f32]) -> usize {
    let mut max = f32::NEG_INFINITY;
    let mut bin = 0;
    for (i, &m) in magnitudes.iter().enumerate() {
        if m > max {
            max = m;
            bin = i;
        }
    }
    bin
}

/// Center frequency of a bin of a real transform spanning up to Nyquist
pub fn bin_frequency(bin: usize, sample_rate: u32, bin_count: usize) -> f32 {
    if bin_count == 0 {
        return 0.0;
    }
    bin as f32 * (sample_rate as f32 / 2.0) / bin_count as f32
}

/// Running maxima and minima across frames
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extrema {
    pub peak_loudness: i32,
    pub peak_frequency: f32,
    /// Positive infinity until a non-zero frequency is seen
    pub min_frequency: f32,
}

impl Default for Extrema {
    fn default() -> Self {
        Extrema {
            peak_loudness: 0,
            peak_frequency: 0.0,
            min_frequency: f32::INFINITY,
        }
    }
}

impl Extrema {
    /// Folds a frame in. A dominant frequency of 0 leaves the frequency extrema alone.
    pub fn update(&mut self, frame: &Frame) {
        self.peak_loudness = self.peak_loudness.max(frame.loudness);
        if frame.dominant_frequency > 0.0 {
            self.peak_frequency = self.peak_frequency.max(frame.dominant_frequency);
            self.min_frequency = self.min_frequency.min(frame.dominant_frequency);
        }
    }
    pub fn lowest_frequency(&self) -> Option<f32> {
        if self.min_frequency.is_finite() {
            Some(self.min_frequency)
        } else {
            None
        }
    }
}

/// The frame buffers of a session, overwritten on every tick
pub struct FrameAnalyzer {
    amplitudes: Vec<u8>,
    magnitudes: Vec<f32>,
}

impl FrameAnalyzer {
    pub fn new(bin_count: usize) -> Self {
        FrameAnalyzer {
            amplitudes: vec![0; bin_count],
            magnitudes: vec![f32::NEG_INFINITY; bin_count],
        }
    }
    pub fn bin_count(&self) -> usize {
        self.magnitudes.len()
    }
    pub fn amplitudes(&self) -> &[u8] {
        &self.amplitudes
    }
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }
    /// Reads both buffers from the analyser and derives the frame values
    pub fn analyze<A>(&mut self, analyser: &mut A) -> Frame
    where
        A: Analyser + ?Sized,
    {
        analyser.byte_frequency_data(&mut self.amplitudes);
        analyser.float_frequency_data(&mut self.magnitudes);
        let loudness = loudness(&self.amplitudes);
        let bin = dominant_bin(&self.magnitudes);
        let dominant_frequency = bin_frequency(bin, analyser.sample_rate(), self.bin_count());
        trace!("frame: {} dB, bin {} ({} Hz)", loudness, bin, dominant_frequency);
        Frame {
            loudness,
            dominant_frequency,
        }
    }
}
