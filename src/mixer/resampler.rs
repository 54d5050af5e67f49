//! Pull-based sample-rate conversion
//!
//! Wraps a windowed-sinc resampler ([`rubato::SincFixedOut`]) behind a pull
//! interface: the mixer asks for output-rate frames and the resampler pulls
//! whatever native-rate input it needs from a [`PullSource`]. Sources that
//! run dry are padded with silence, never treated as errors.
//!
//! All buffers are sized at construction, so steady-state resampling does no
//! allocation on the real-time path.

use std::collections::VecDeque;

use log::error;
use rubato::{
    Resampler, SincFixedOut, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Output frames produced per sinc kernel pass
const CHUNK_FRAMES: usize = 512;

/// Supplies native-rate interleaved stereo PCM on demand.
///
/// Implementations fill up to `out.len() / 2` frames and report how many they
/// actually served; short or zero returns mean the remainder is silence and
/// must not advance whatever cursor backs the source.
pub trait PullSource {
    /// Fill `out` with up to `out.len() / 2` frames, returning the count served
    fn pull(&mut self, out: &mut [i16]) -> usize;
}

/// Windowed-sinc converter from one fixed rate to another.
///
/// Construction fixes both rates; switching channels or rates means building
/// a fresh instance, which also resets the sinc phase and history.
pub struct StreamResampler {
    inner: SincFixedOut<f32>,
    /// Planar input staging, resized to the kernel's demand each pass
    input: Vec<Vec<f32>>,
    /// Planar output staging at the kernel's maximum chunk size
    output: Vec<Vec<f32>>,
    /// Interleaved pull scratch at the kernel's maximum input demand
    native: Vec<i16>,
    /// Resampled frames awaiting consumption
    ready: VecDeque<(i32, i32)>,
}

impl StreamResampler {
    /// Create a converter from `input_rate` to `output_rate` (both in Hz).
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self, rubato::ResamplerConstructionError> {
        let params = SincInterpolationParameters {
            sinc_len: 64,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 128,
            window: WindowFunction::BlackmanHarris2,
        };

        let inner = SincFixedOut::<f32>::new(
            f64::from(output_rate) / f64::from(input_rate),
            1.0,
            params,
            CHUNK_FRAMES,
            2,
        )?;

        let input = inner.input_buffer_allocate(true);
        let output = inner.output_buffer_allocate(true);
        let native = vec![0i16; inner.input_frames_max() * 2];

        Ok(StreamResampler {
            inner,
            input,
            output,
            native,
            ready: VecDeque::with_capacity(CHUNK_FRAMES),
        })
    }

    /// Mix `accum.len() / 2` output-rate frames into the accumulation buffer.
    ///
    /// Pulls native input from `source` as needed; input the source cannot
    /// supply is taken as silence. Never fails: an internal kernel error
    /// degrades to silence for the remaining frames.
    pub fn resample(&mut self, source: &mut dyn PullSource, accum: &mut [i32]) {
        let frames = accum.len() / 2;
        let mut filled = 0;

        while filled < frames {
            if let Some((l, r)) = self.ready.pop_front() {
                accum[filled * 2] += l;
                accum[filled * 2 + 1] += r;
                filled += 1;
                continue;
            }

            if !self.produce_chunk(source) {
                break;
            }
        }
    }

    /// Run one kernel pass, refilling `ready`. Returns false on kernel error.
    fn produce_chunk(&mut self, source: &mut dyn PullSource) -> bool {
        let need = self.inner.input_frames_next();

        let native = &mut self.native[..need * 2];
        let served = source.pull(native);
        native[served * 2..].fill(0);

        for (ch, plane) in self.input.iter_mut().enumerate() {
            plane.resize(need, 0.0);
            for (frame, sample) in plane.iter_mut().enumerate() {
                *sample = f32::from(native[frame * 2 + ch]);
            }
        }

        let produced = match self
            .inner
            .process_into_buffer(&self.input, &mut self.output, None)
        {
            Ok((_, produced)) => produced,
            Err(e) => {
                error!("resampler kernel failure: {e}");
                return false;
            }
        };

        for frame in 0..produced {
            self.ready.push_back((
                self.output[0][frame].round() as i32,
                self.output[1][frame].round() as i32,
            ));
        }
        true
    }
}
