//! Resampling and real-time mixing
//!
//! The mixer is the only component that runs on the audio callback thread;
//! it pulls already-decoded channel PCM through a windowed-sinc resampler,
//! sums into a 32-bit accumulator and clips to the 16-bit output range.

pub mod engine;
pub mod resampler;

pub use engine::{AudioEngine, Mixer};
pub use resampler::{PullSource, StreamResampler};
