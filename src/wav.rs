//! WAV export of decoded channels
//!
//! Offline inspection helper: dumps a channel's interleaved stereo PCM to a
//! 16-bit WAV file at its native sample rate.

use std::path::Path;

use crate::{CdxaError, Result};

/// Write interleaved stereo PCM to a 16-bit WAV file.
pub fn write_pcm<P: AsRef<Path>>(path: P, pcm: &[i16], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| CdxaError::AudioFileError(e.to_string()))?;
    for &sample in pcm {
        writer
            .write_sample(sample)
            .map_err(|e| CdxaError::AudioFileError(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| CdxaError::AudioFileError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_pcm_round_trips() {
        let dir = std::env::temp_dir().join("cdxa-wav-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.wav");

        let pcm: Vec<i16> = vec![0, 1, -1, 32767, -32767, 128];
        write_pcm(&path, &pcm, 37800).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 37800);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, pcm);
    }
}
