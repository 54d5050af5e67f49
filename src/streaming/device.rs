//! Default-output audio device
//!
//! Opens the host's default playback device through rodio and drives the
//! mixer from the backend's callback thread via an infinite [`rodio::Source`]
//! adapter.

use std::time::Duration;

use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

use crate::mixer::AudioEngine;
use crate::streaming::{StreamConfig, DEFAULT_SAMPLE_RATE};
use crate::{CdxaError, Result};

/// Handle to an open output device.
///
/// Playback runs for as long as the device is alive; dropping it closes the
/// stream.
pub struct AudioDevice {
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
}

impl AudioDevice {
    /// Query the default output device's native sample rate.
    ///
    /// Falls back to 44100 Hz when no device or format is available; the
    /// engine should be constructed with the returned rate.
    pub fn preferred_sample_rate() -> u32 {
        rodio::cpal::default_host()
            .default_output_device()
            .and_then(|device| device.default_output_config().ok())
            .map(|config| config.sample_rate().0)
            .unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Open the default output device and start pulling from the engine.
    ///
    /// Fails fast when no device can be opened; there is no steady-state
    /// error path after this.
    pub fn open(engine: AudioEngine, config: StreamConfig) -> Result<AudioDevice> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| CdxaError::AudioDeviceError(e.to_string()))?;
        let sink =
            Sink::try_new(&handle).map_err(|e| CdxaError::AudioDeviceError(e.to_string()))?;

        sink.append(EngineSource::new(engine, config));

        Ok(AudioDevice {
            _stream: stream,
            _handle: handle,
            sink,
        })
    }

    /// Pause the device without touching engine state
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resume a paused device
    pub fn resume(&self) {
        self.sink.play();
    }
}

/// Infinite source adapter: one engine lock per chunk refill.
struct EngineSource {
    engine: AudioEngine,
    sample_rate: u32,
    chunk: Vec<i16>,
    cursor: usize,
}

impl EngineSource {
    fn new(engine: AudioEngine, config: StreamConfig) -> Self {
        let chunk = vec![0; config.chunk_frames.max(1) * 2];
        EngineSource {
            engine,
            sample_rate: config.sample_rate,
            // Start exhausted so the first sample already mixes
            cursor: chunk.len(),
            chunk,
        }
    }
}

impl Iterator for EngineSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.cursor == self.chunk.len() {
            self.engine.mix(&mut self.chunk);
            self.cursor = 0;
        }

        let sample = self.chunk[self.cursor];
        self.cursor += 1;
        Some(sample)
    }
}

impl Source for EngineSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_source_yields_chunked_silence() {
        let engine = AudioEngine::new(44100);
        let mut source = EngineSource::new(engine, StreamConfig::low_latency(44100));

        // No stream loaded: the adapter must still produce an endless run of
        // silent samples across chunk boundaries.
        for _ in 0..(256 * 2 * 3) {
            assert_eq!(source.next(), Some(0));
        }
        assert_eq!(source.channels(), 2);
        assert_eq!(source.sample_rate(), 44100);
    }
}
