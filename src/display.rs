use crate::{Extrema, Frame};

/// A textual value on the display
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Readout {
    Loudness,
    PeakLoudness,
    Frequency,
    PeakFrequency,
    LowestFrequency,
}

/// A scale carrying a movable marker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scale {
    Intensity,
    Frequency,
}

impl Scale {
    fn index(self) -> usize {
        match self {
            Scale::Intensity => 0,
            Scale::Frequency => 1,
        }
    }
}

/// Which of the start and stop controls can be triggered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

impl Controls {
    pub const IDLE: Controls = Controls {
        start_enabled: true,
        stop_enabled: false,
    };
    pub const ACTIVE: Controls = Controls {
        start_enabled: false,
        stop_enabled: true,
    };
}

/// Something the meter can be drawn onto
pub trait Surface {
    fn set_readout(&mut self, readout: Readout, text: &str);
    /// Adds a marker to a scale. Called at most once per scale.
    fn create_marker(&mut self, scale: Scale);
    /// Moves a scale's marker to a position in `[0, 1]`
    fn move_marker(&mut self, scale: Scale, position: f32);
    fn set_controls(&mut self, controls: Controls);
    fn show_error(&mut self, message: &str);
}

impl<S> Surface for &mut S
where
    S: Surface + ?Sized,
{
    fn set_readout(&mut self, readout: Readout, text: &str) {
        (**self).set_readout(readout, text)
    }
    fn create_marker(&mut self, scale: Scale) {
        (**self).create_marker(scale)
    }
    fn move_marker(&mut self, scale: Scale, position: f32) {
        (**self).move_marker(scale, position)
    }
    fn set_controls(&mut self, controls: Controls) {
        (**self).set_controls(controls)
    }
    fn show_error(&mut self, message: &str) {
        (**self).show_error(message)
    }
}

/// Clamps a marker position into `[0, 1]`, sending NaN to 0
pub fn clamp_position(position: f32) -> f32 {
    if position.is_nan() {
        0.0
    } else {
        position.max(0.0).min(1.0)
    }
}

/// Linear position of a loudness on a 0 to 100 scale
pub fn intensity_position(loudness: i32) -> f32 {
    clamp_position(loudness as f32 / 100.0)
}

/// Logarithmic position of a frequency over four decades
pub fn frequency_position(frequency: f32) -> f32 {
    clamp_position((frequency + 1.0).log10() / 4.0)
}

/// Formats a frequency as whole hertz
pub fn format_hz(frequency: f32) -> String {
    if frequency.is_finite() {
        format!("{}", frequency.round() as i64)
    } else if frequency.is_nan() {
        "NaN".into()
    } else if frequency > 0.0 {
        "Infinity".into()
    } else {
        "-Infinity".into()
    }
}

/// Renders frames onto a surface, creating scale markers on first use
pub struct Display<S> {
    surface: S,
    markers: [bool; 2],
}

impl<S> Display<S>
where
    S: Surface,
{
    pub fn new(surface: S) -> Self {
        Display {
            surface,
            markers: [false; 2],
        }
    }
    pub fn surface(&self) -> &S {
        &self.surface
    }
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
    pub fn into_surface(self) -> S {
        self.surface
    }
    pub fn render(&mut self, frame: &Frame, extrema: &Extrema) {
        let surface = &mut self.surface;
        surface.set_readout(Readout::Loudness, &frame.loudness.to_string());
        surface.set_readout(Readout::PeakLoudness, &extrema.peak_loudness.to_string());
        surface.set_readout(Readout::Frequency, &format_hz(frame.dominant_frequency));
        surface.set_readout(Readout::PeakFrequency, &format_hz(extrema.peak_frequency));
        surface.set_readout(Readout::LowestFrequency, &format_hz(extrema.min_frequency));
        self.place_marker(Scale::Intensity, intensity_position(frame.loudness));
        self.place_marker(Scale::Frequency, frequency_position(frame.dominant_frequency));
    }
    fn place_marker(&mut self, scale: Scale, position: f32) {
        let created = &mut self.markers[scale.index()];
        if !*created {
            self.surface.create_marker(scale);
            *created = true;
        }
        self.surface.move_marker(scale, clamp_position(position));
    }
}
