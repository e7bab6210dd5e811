use std::sync::mpsc;

use crate::cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, InputCallbackInfo, Sample, SampleFormat, Stream, StreamConfig, StreamError,
    SupportedStreamConfig,
};
use log::{error, info};

use crate::{Analyser, Capture, CaptureError, CaptureResult, FftAnalyser};

/// Input blocks held between reads; newer blocks are dropped once full
const BLOCK_BACKLOG: usize = 64;

/// Audio input from a `cpal` device
///
/// Uses the default input device and its first supported config at the highest
/// sample rate unless told otherwise.
#[derive(Default)]
pub struct Microphone<'a> {
    pub device: Option<&'a Device>,
    pub config: Option<SupportedStreamConfig>,
}

impl<'a> Microphone<'a> {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn device(self, device: &'a Device) -> Self {
        Microphone {
            device: Some(device),
            ..self
        }
    }
    pub fn config(self, config: SupportedStreamConfig) -> Self {
        Microphone {
            config: Some(config),
            ..self
        }
    }
}

impl<'a> Capture for Microphone<'a> {
    type Analyser = MicrophoneAnalyser;
    fn open(&mut self, fft_size: usize) -> CaptureResult<MicrophoneAnalyser> {
        let default_device;
        let device = if let Some(device) = self.device {
            device
        } else {
            let host = cpal::default_host();
            default_device = host.default_input_device().ok_or(CaptureError::NoDevice)?;
            &default_device
        };
        let config = if let Some(config) = &self.config {
            config.clone()
        } else {
            let mut supported_configs_range = device.supported_input_configs()?;
            supported_configs_range
                .next()
                .ok_or(CaptureError::NoConfig)?
                .with_max_sample_rate()
        };
        let sample_format = config.sample_format();
        let config: StreamConfig = config.into();
        let channels = usize::from(config.channels.max(1));
        let (send, recv) = mpsc::sync_channel::<Vec<f32>>(BLOCK_BACKLOG);
        let (err_send, errors) = mpsc::sync_channel(1);
        let err_fn = move |err: StreamError| {
            error!("An error occurred on the input audio stream: {}", err);
            let _ = err_send.try_send(err);
        };
        macro_rules! input_stream {
            ($sample:ty) => {
                device.build_input_stream(
                    &config,
                    move |data: &[$sample], _: &InputCallbackInfo| {
                        let mono = data.iter().step_by(channels).map(Sample::to_f32).collect();
                        let _ = send.try_send(mono);
                    },
                    err_fn,
                )
            };
        }
        let stream = match sample_format {
            SampleFormat::F32 => input_stream!(f32),
            SampleFormat::I16 => input_stream!(i16),
            SampleFormat::U16 => input_stream!(u16),
        }?;

        stream.play()?;

        info!(
            "Opened input {:?}: {} Hz, {} channel(s), {:?}",
            device.name().unwrap_or_default(),
            config.sample_rate.0,
            channels,
            sample_format
        );
        Ok(MicrophoneAnalyser {
            _stream: stream,
            recv,
            errors,
            analyser: FftAnalyser::builder()
                .fft_size(fft_size)
                .build(config.sample_rate.0),
        })
    }
}

/// An FFT analyser fed by a live input stream
///
/// Dropping it closes the stream.
pub struct MicrophoneAnalyser {
    _stream: Stream,
    recv: mpsc::Receiver<Vec<f32>>,
    errors: mpsc::Receiver<StreamError>,
    analyser: FftAnalyser,
}

impl MicrophoneAnalyser {
    fn drain(&mut self) {
        let analyser = &mut self.analyser;
        for block in self.recv.try_iter() {
            analyser.push_samples(block);
        }
    }
}

impl Analyser for MicrophoneAnalyser {
    fn sample_rate(&self) -> u32 {
        self.analyser.sample_rate()
    }
    fn frequency_bin_count(&self) -> usize {
        self.analyser.frequency_bin_count()
    }
    fn byte_frequency_data(&mut self, data: &mut [u8]) {
        self.drain();
        self.analyser.byte_frequency_data(data)
    }
    fn float_frequency_data(&mut self, data: &mut [f32]) {
        self.drain();
        self.analyser.float_frequency_data(data)
    }
    fn take_error(&mut self) -> Option<CaptureError> {
        self.errors.try_recv().ok().map(CaptureError::from)
    }
}
