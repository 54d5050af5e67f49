//! Audio device output
//!
//! Connects an [`crate::AudioEngine`] to the host's default output device.
//! The device pulls fixed chunks of interleaved stereo frames; each chunk
//! refill locks the engine exactly once and runs the mixer synchronously.

pub mod device;

pub use device::AudioDevice;

/// Default sample rate when the device cannot report one (44.1 kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Configuration for streaming playback
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Output sample rate in Hz; the engine must mix at the same rate
    pub sample_rate: u32,

    /// Stereo frames mixed per engine lock
    /// Larger chunks = fewer lock acquisitions but more latency
    pub chunk_frames: usize,
}

impl StreamConfig {
    /// Chunking optimized for low latency
    /// 256 frames ≈ 5.8ms @ 44.1kHz
    pub fn low_latency(sample_rate: u32) -> Self {
        StreamConfig {
            sample_rate,
            chunk_frames: 256,
        }
    }

    /// Chunking optimized for stability
    /// 1024 frames ≈ 23ms @ 44.1kHz
    pub fn stable(sample_rate: u32) -> Self {
        StreamConfig {
            sample_rate,
            chunk_frames: 1024,
        }
    }

    /// Chunk latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.chunk_frames as f32) / (self.sample_rate as f32) * 1000.0
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::stable(DEFAULT_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_config_latency() {
        let config = StreamConfig::low_latency(44100);
        let latency = config.latency_ms();
        assert!(latency > 5.0 && latency < 7.0);
    }

    #[test]
    fn test_stream_config_default() {
        let config = StreamConfig::default();
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);
        assert!(config.latency_ms() > 20.0);
    }
}
