use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

pub const DEFAULT_FPS: u32 = 60;

/// A shared flag that stops a repeating task once set
///
/// Clones observe the same flag, so a token can be handed to another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Paces repeating ticks
pub trait Clock {
    /// Returns once the next frame is due
    fn wait_for_frame(&mut self);
}

impl<C> Clock for &mut C
where
    C: Clock + ?Sized,
{
    fn wait_for_frame(&mut self) {
        (**self).wait_for_frame()
    }
}

/// A clock that ticks at a fixed rate
///
/// Frames missed because a tick overran are skipped rather than run back to back.
#[derive(Debug)]
pub struct FrameClock {
    period: Duration,
    next: Option<Instant>,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        FrameClock {
            period: Duration::from_secs(1) / fps.max(1),
            next: None,
        }
    }
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl Clock for FrameClock {
    fn wait_for_frame(&mut self) {
        let now = Instant::now();
        let deadline = match self.next {
            Some(next) if next > now => next,
            _ => now,
        };
        if deadline > now {
            thread::sleep(deadline - now);
        }
        self.next = Some(deadline + self.period);
    }
}

/// A clock that never waits and counts the frames it was asked for
#[derive(Debug, Default)]
pub struct ManualClock {
    pub frames: u64,
}

impl Clock for ManualClock {
    fn wait_for_frame(&mut self) {
        self.frames += 1;
    }
}
