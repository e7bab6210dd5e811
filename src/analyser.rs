use std::{collections::VecDeque, f32::consts::PI, sync::Arc};

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::CaptureError;

pub const DEFAULT_FFT_SIZE: usize = 1024;
pub const DEFAULT_MIN_DECIBELS: f32 = -100.0;
pub const DEFAULT_MAX_DECIBELS: f32 = -30.0;
pub const DEFAULT_SMOOTHING: f32 = 0.8;

/// A frequency-analysis transform over a live signal
///
/// Both data getters fill at most `frequency_bin_count` values, starting at bin 0.
pub trait Analyser {
    fn sample_rate(&self) -> u32;
    fn frequency_bin_count(&self) -> usize;
    /// Bin magnitudes mapped onto `0..=255`
    fn byte_frequency_data(&mut self, data: &mut [u8]);
    /// Bin magnitudes in decibels
    fn float_frequency_data(&mut self, data: &mut [f32]);
    /// Takes a failure reported by the underlying signal source, if any
    fn take_error(&mut self) -> Option<CaptureError> {
        None
    }
}

impl<A> Analyser for Box<A>
where
    A: Analyser + ?Sized,
{
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }
    fn frequency_bin_count(&self) -> usize {
        (**self).frequency_bin_count()
    }
    fn byte_frequency_data(&mut self, data: &mut [u8]) {
        (**self).byte_frequency_data(data)
    }
    fn float_frequency_data(&mut self, data: &mut [f32]) {
        (**self).float_frequency_data(data)
    }
    fn take_error(&mut self) -> Option<CaptureError> {
        (**self).take_error()
    }
}

pub struct FftAnalyserBuilder {
    pub fft_size: usize,
    pub min_decibels: f32,
    pub max_decibels: f32,
    pub smoothing: f32,
}

impl FftAnalyserBuilder {
    pub fn fft_size(self, fft_size: usize) -> Self {
        FftAnalyserBuilder { fft_size, ..self }
    }
    pub fn decibels(self, min_decibels: f32, max_decibels: f32) -> Self {
        FftAnalyserBuilder {
            min_decibels,
            max_decibels,
            ..self
        }
    }
    pub fn smoothing(self, smoothing: f32) -> Self {
        FftAnalyserBuilder {
            smoothing: smoothing.max(0.0).min(1.0),
            ..self
        }
    }
    pub fn build(self, sample_rate: u32) -> FftAnalyser {
        let fft_size = self.fft_size.max(2);
        let bins = fft_size / 2;
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let (min_decibels, max_decibels) = if self.min_decibels < self.max_decibels {
            (self.min_decibels, self.max_decibels)
        } else {
            (DEFAULT_MIN_DECIBELS, DEFAULT_MAX_DECIBELS)
        };
        FftAnalyser {
            fft,
            window: blackman(fft_size),
            samples: std::iter::repeat(0.0).take(fft_size).collect(),
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; bins],
            decibels: vec![f32::NEG_INFINITY; bins],
            stale: true,
            sample_rate,
            min_decibels,
            max_decibels,
            smoothing: self.smoothing,
        }
    }
}

/// An FFT analyser fed with time-domain samples
///
/// Holds the most recent `fft_size` samples. Spectra are windowed with a Blackman
/// window and smoothed over time, then reported in decibels or on a byte scale
/// between the configured decibel bounds.
pub struct FftAnalyser {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    samples: VecDeque<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    decibels: Vec<f32>,
    stale: bool,
    sample_rate: u32,
    min_decibels: f32,
    max_decibels: f32,
    smoothing: f32,
}

impl FftAnalyser {
    pub fn builder() -> FftAnalyserBuilder {
        FftAnalyserBuilder {
            fft_size: DEFAULT_FFT_SIZE,
            min_decibels: DEFAULT_MIN_DECIBELS,
            max_decibels: DEFAULT_MAX_DECIBELS,
            smoothing: DEFAULT_SMOOTHING,
        }
    }
    pub fn new(sample_rate: u32) -> Self {
        Self::builder().build(sample_rate)
    }
    pub fn fft_size(&self) -> usize {
        self.window.len()
    }
    /// Appends samples, discarding the oldest beyond `fft_size`
    pub fn push_samples<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = f32>,
    {
        let before = self.samples.len();
        self.samples.extend(samples);
        if self.samples.len() == before {
            return;
        }
        let excess = self.samples.len().saturating_sub(self.fft_size());
        self.samples.drain(..excess);
        self.stale = true;
    }
    fn refresh(&mut self) {
        if !self.stale {
            return;
        }
        self.stale = false;
        for ((slot, &s), &w) in self.scratch.iter_mut().zip(&self.samples).zip(&self.window) {
            *slot = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.scratch);
        let n = self.scratch.len() as f32;
        let k = self.smoothing;
        for (i, (smoothed, db)) in self
            .smoothed
            .iter_mut()
            .zip(self.decibels.iter_mut())
            .enumerate()
        {
            let magnitude = self.scratch[i].norm() / n;
            let magnitude = if magnitude.is_finite() { magnitude } else { 0.0 };
            *smoothed = k * *smoothed + (1.0 - k) * magnitude;
            *db = 20.0 * smoothed.log10();
        }
    }
}

impl Analyser for FftAnalyser {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    fn frequency_bin_count(&self) -> usize {
        self.decibels.len()
    }
    fn byte_frequency_data(&mut self, data: &mut [u8]) {
        self.refresh();
        let scale = 255.0 / (self.max_decibels - self.min_decibels);
        for (byte, &db) in data.iter_mut().zip(&self.decibels) {
            *byte = ((db - self.min_decibels) * scale).floor().max(0.0).min(255.0) as u8;
        }
    }
    fn float_frequency_data(&mut self, data: &mut [f32]) {
        self.refresh();
        for (out, &db) in data.iter_mut().zip(&self.decibels) {
            *out = db;
        }
    }
}

fn blackman(len: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    let n = len as f32;
    (0..len)
        .map(|i| {
            let x = i as f32 / n;
            A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos()
        })
        .collect()
}
