//! A real-time sound level and dominant frequency meter
//!
//! A [`Meter`] opens an audio [`Capture`], analyses one frame per tick and
//! renders the loudness, the dominant frequency and their running extrema onto
//! a [`Surface`].

mod analyser;
mod analysis;
mod display;
mod error;
#[cfg(feature = "input")]
mod input;
mod meter;
mod schedule;

pub use analyser::*;
pub use analysis::*;
pub use display::*;
pub use error::*;
#[cfg(feature = "input")]
pub use input::*;
pub use meter::*;
pub use schedule::*;

#[cfg(feature = "input")]
pub use cpal;
