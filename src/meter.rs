use log::{debug, error, info, warn};

use crate::{
    Analyser, CancelToken, CaptureResult, Clock, Controls, Display, Extrema, Frame,
    FrameAnalyzer, Surface,
};

/// The transform size every session is opened with
pub const FFT_SIZE: usize = 1024;

/// A source of analysed audio input
pub trait Capture {
    type Analyser: Analyser;
    /// Acquires the input and connects it to a transform of the given size
    fn open(&mut self, fft_size: usize) -> CaptureResult<Self::Analyser>;
}

impl<C> Capture for &mut C
where
    C: Capture + ?Sized,
{
    type Analyser = C::Analyser;
    fn open(&mut self, fft_size: usize) -> CaptureResult<Self::Analyser> {
        (**self).open(fft_size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Active,
}

/// Everything that lives between a start and a stop
pub struct Session<A> {
    analyser: A,
    frames: FrameAnalyzer,
    token: CancelToken,
    ticks: u64,
}

impl<A> Session<A>
where
    A: Analyser,
{
    pub fn sample_rate(&self) -> u32 {
        self.analyser.sample_rate()
    }
    pub fn buffer_length(&self) -> usize {
        self.frames.bin_count()
    }
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
    pub fn frames(&self) -> &FrameAnalyzer {
        &self.frames
    }
}

/// A sound level and dominant frequency meter
///
/// Owns a capture source and a display. While a session is active, every
/// [`tick`](Meter::tick) analyses one frame, folds it into the running extrema
/// and renders it. The extrema outlive sessions.
pub struct Meter<C, S>
where
    C: Capture,
{
    capture: C,
    display: Display<S>,
    session: Option<Session<C::Analyser>>,
    extrema: Extrema,
}

impl<C, S> Meter<C, S>
where
    C: Capture,
    S: Surface,
{
    pub fn new(capture: C, mut surface: S) -> Self {
        surface.set_controls(Controls::IDLE);
        Meter {
            capture,
            display: Display::new(surface),
            session: None,
            extrema: Extrema::default(),
        }
    }
    pub fn state(&self) -> State {
        if self.is_active() {
            State::Active
        } else {
            State::Idle
        }
    }
    pub fn is_active(&self) -> bool {
        self.session.as_ref().map_or(false, Session::is_active)
    }
    pub fn session(&self) -> Option<&Session<C::Analyser>> {
        self.session.as_ref()
    }
    pub fn extrema(&self) -> &Extrema {
        &self.extrema
    }
    pub fn surface(&self) -> &S {
        self.display.surface()
    }
    pub fn capture(&self) -> &C {
        &self.capture
    }
    /// A token that stops the active session on its next tick when cancelled
    pub fn stop_handle(&self) -> Option<CancelToken> {
        self.session.as_ref().map(|session| session.token.clone())
    }
    /// Opens the capture and begins ticking
    ///
    /// Starting while already active does nothing. On failure the error
    /// message is shown and the meter stays idle.
    pub fn start(&mut self) -> CaptureResult<()> {
        if self.is_active() {
            warn!("Capture already active, ignoring start");
            return Ok(());
        }
        // a session cancelled through its handle but not yet ticked
        self.stop();
        let analyser = match self.capture.open(FFT_SIZE) {
            Ok(analyser) => analyser,
            Err(e) => {
                error!("Unable to start capture: {}", e);
                self.display.surface_mut().show_error(e.user_message());
                return Err(e);
            }
        };
        let frames = FrameAnalyzer::new(analyser.frequency_bin_count());
        info!(
            "Capture started: {} Hz, {} bins",
            analyser.sample_rate(),
            frames.bin_count()
        );
        self.session = Some(Session {
            analyser,
            frames,
            token: CancelToken::new(),
            ticks: 0,
        });
        self.display.surface_mut().set_controls(Controls::ACTIVE);
        Ok(())
    }
    /// Releases the capture and cancels further ticks. Does nothing while idle.
    pub fn stop(&mut self) {
        let Session {
            analyser,
            token,
            ticks,
            ..
        } = match self.session.take() {
            Some(session) => session,
            None => {
                debug!("Capture not active, ignoring stop");
                return;
            }
        };
        drop(analyser);
        token.cancel();
        self.display.surface_mut().set_controls(Controls::IDLE);
        info!("Capture stopped after {} ticks", ticks);
    }
    /// Runs one analysis frame
    ///
    /// Returns `None`, and schedules nothing further, once the session is no
    /// longer active.
    pub fn tick(&mut self) -> Option<Frame> {
        let session = self.session.as_mut()?;
        if session.token.is_cancelled() {
            self.stop();
            return None;
        }
        if let Some(e) = session.analyser.take_error() {
            error!("Capture failed: {}", e);
            self.display.surface_mut().show_error(e.user_message());
            self.stop();
            return None;
        }
        let frame = session.frames.analyze(&mut session.analyser);
        session.ticks += 1;
        self.extrema.update(&frame);
        self.display.render(&frame, &self.extrema);
        Some(frame)
    }
    /// Ticks once per frame of `clock` until the session stops
    ///
    /// Returns the number of frames analysed.
    pub fn run<K>(&mut self, mut clock: K) -> u64
    where
        K: Clock,
    {
        let mut ticks = 0;
        while self.tick().is_some() {
            ticks += 1;
            clock.wait_for_frame();
        }
        ticks
    }
}
