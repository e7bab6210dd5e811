/// The message shown in the error slot whenever the microphone can't be used
pub const CAPTURE_UNAVAILABLE: &str = "Error accessing microphone. Please allow permission.";

/// Reasons an audio capture could not be started or kept running
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[cfg(feature = "input")]
    #[error("{0}")]
    Stream(#[from] cpal::BuildStreamError),
    #[cfg(feature = "input")]
    #[error("{0}")]
    Play(#[from] cpal::PlayStreamError),
    #[cfg(feature = "input")]
    #[error("{0}")]
    Configs(#[from] cpal::SupportedStreamConfigsError),
    #[cfg(feature = "input")]
    #[error("{0}")]
    Lost(#[from] cpal::StreamError),
    #[error("No config available for device")]
    NoConfig,
    #[error("No device available")]
    NoDevice,
    #[error("Permission to record audio was denied")]
    PermissionDenied,
}

impl CaptureError {
    /// The human-readable message for the error display.
    ///
    /// Every kind of capture failure is presented the same way.
    pub fn user_message(&self) -> &'static str {
        CAPTURE_UNAVAILABLE
    }
}

/// Result of opening or running a capture
pub type CaptureResult<T> = Result<T, CaptureError>;
