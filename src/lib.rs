//! CD-XA ADPCM Audio Core for PlayStation Disc Images
//!
//! Decodes the PlayStation's CD-ROM/XA streaming audio sectors into linear
//! PCM, demultiplexes the interleaved logical channels of an XA sequence,
//! resamples the selected channel to the host output rate and mixes it into
//! a continuous real-time 16-bit stereo stream.
//!
//! # Features
//! - Bit-exact XA ADPCM decode (4-bit and 8-bit, mono and stereo)
//! - Per-(file, channel) demultiplexing of interleaved XA sequences
//! - Corrupt-sector recovery (redundant header verification)
//! - Windowed-sinc resampling from 18900/37800 Hz to the device rate
//! - Real-time mixer with play/stop/filter-select control surface
//! - WAV export of decoded channels
//!
//! # Crate feature flags
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ## Decode and inspect an XA stream
//! ```no_run
//! use cdxa::xa::Stream;
//! let data = std::fs::read("music.xa").unwrap();
//! let stream = Stream::load(&data).unwrap();
//! for (filter, channel) in stream.channels() {
//!     println!("{:04X}: {} Hz, {} frames", filter, channel.sample_rate, channel.frames());
//! }
//! ```
//!
//! ## Real-time playback
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use cdxa::{AudioDevice, AudioEngine, StreamConfig};
//! let data = std::fs::read("music.xa").unwrap();
//! let rate = AudioDevice::preferred_sample_rate();
//! let engine = AudioEngine::new(rate);
//! engine.load(&data).unwrap();
//! engine.play();
//! let _dev = AudioDevice::open(engine.clone(), StreamConfig::stable(rate)).unwrap();
//! // keep the device alive while playing
//! # }
//! ```

#![warn(missing_docs)]

// Domain modules
pub mod adpcm; // ADPCM sample decoding (core codec)
pub mod mixer; // Resampling and real-time mixing
#[cfg(feature = "streaming")]
pub mod streaming; // Audio device output
pub mod wav; // WAV export
pub mod xa; // XA sector format and channel registry

/// Error types for CD-XA audio operations
#[derive(thiserror::Error, Debug)]
pub enum CdxaError {
    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XA stream ends in the middle of a sector record
    #[error("Truncated XA stream: {0} trailing bytes (sectors are {1} bytes)")]
    TruncatedSector(usize, usize),

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),
}

/// Result type for CD-XA audio operations
pub type Result<T> = std::result::Result<T, CdxaError>;

// Public API exports
pub use adpcm::Decoder;
pub use mixer::{AudioEngine, PullSource, StreamResampler};
#[cfg(feature = "streaming")]
pub use streaming::{AudioDevice, StreamConfig};
pub use xa::{filter_id, Channel, SectorDecoder, Stream, SubHeader};
