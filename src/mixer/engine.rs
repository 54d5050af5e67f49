//! Real-time mixer and control surface
//!
//! [`Mixer`] owns the loaded stream, the playback cursor and the resampler;
//! [`AudioEngine`] shares it between the control thread and the audio
//! callback thread behind a single mutex. Control commands and each mixing
//! callback hold the lock for their whole duration.
//!
//! Nothing on the mixing path blocks on I/O, allocates unboundedly or
//! returns an error: every condition that would (stopped, unmatched filter,
//! end of buffer) degrades to digital silence.

use std::sync::Arc;

use log::error;
use parking_lot::Mutex;

use crate::mixer::resampler::{PullSource, StreamResampler};
use crate::xa::{filter_id, Stream};
use crate::Result;

/// Cursor-advancing pull adapter over one channel's PCM buffer.
///
/// Advances the shared playback position only by frames actually served, so
/// end-of-buffer is reported truthfully to the resampler.
struct ChannelCursor<'a> {
    pcm: &'a [i16],
    position: &'a mut usize,
}

impl PullSource for ChannelCursor<'_> {
    fn pull(&mut self, out: &mut [i16]) -> usize {
        let total = self.pcm.len() / 2;
        let have = total.saturating_sub(*self.position).min(out.len() / 2);

        let start = *self.position * 2;
        out[..have * 2].copy_from_slice(&self.pcm[start..start + have * 2]);
        *self.position += have;
        have
    }
}

/// Streaming-audio mixer state.
///
/// All fields are guarded together by [`AudioEngine`]'s mutex; the struct is
/// public for direct single-threaded use (offline mixdown, tests).
pub struct Mixer {
    output_rate: u32,
    stream: Stream,
    filter: u16,
    position: usize,
    playing: bool,
    resampler: Option<StreamResampler>,
    accum: Vec<i32>,
}

impl Mixer {
    /// Create a stopped mixer with no stream for the given device rate
    pub fn new(output_rate: u32) -> Self {
        Mixer {
            output_rate,
            stream: Stream::new(),
            filter: 0,
            position: 0,
            playing: false,
            resampler: None,
            accum: Vec::new(),
        }
    }

    /// Replace the loaded stream wholesale.
    ///
    /// Decodes and buffers every channel up front, stops playback, rewinds
    /// the cursor and selects the sequence's default filter. On failure the
    /// previous stream is untouched.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let stream = Stream::load(data)?;

        self.playing = false;
        self.position = 0;
        self.filter = stream.default_filter().unwrap_or(0);
        self.stream = stream;
        self.rearm();
        Ok(())
    }

    /// Begin producing audio from the current cursor
    pub fn play(&mut self) {
        self.playing = true;
        self.rearm();
    }

    /// Halt output; takes effect at the next callback
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Switch the active stream, rewinding the cursor.
    ///
    /// A filter with no matching channel is a valid selection that mixes
    /// silence. Takes effect immediately, also mid-play.
    pub fn set_filter(&mut self, file: u8, channel: u8) {
        self.filter = filter_id(file, channel);
        self.position = 0;
        self.rearm();
    }

    /// Whether playback is active
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// The active filter id
    pub fn filter(&self) -> u16 {
        self.filter
    }

    /// Current playback cursor in stereo frames
    pub fn position(&self) -> usize {
        self.position
    }

    /// The loaded stream's channel registry
    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    /// Rebuild the resampler for the selected channel's native rate.
    ///
    /// Re-arming resets the sinc phase and history; required on every channel
    /// or rate change.
    fn rearm(&mut self) {
        self.resampler = match self.stream.channel(self.filter) {
            Some(channel) => match StreamResampler::new(channel.sample_rate, self.output_rate) {
                Ok(rs) => Some(rs),
                Err(e) => {
                    error!("cannot resample {} Hz: {e}", channel.sample_rate);
                    None
                }
            },
            None => None,
        };
    }

    /// Fill `output` with interleaved 16-bit stereo frames (real-time path).
    ///
    /// Accumulates in 32 bits, clips to [-32767, 32767] and narrows; frames
    /// no source could produce stay at digital silence.
    pub fn mix(&mut self, output: &mut [i16]) {
        let len = (output.len() / 2) * 2;

        if self.accum.len() < len {
            self.accum.resize(len, 0);
        }
        let accum = &mut self.accum[..len];
        accum.fill(0);

        if self.playing {
            if let (Some(resampler), Some(channel)) =
                (self.resampler.as_mut(), self.stream.channel(self.filter))
            {
                let mut cursor = ChannelCursor {
                    pcm: &channel.pcm,
                    position: &mut self.position,
                };
                resampler.resample(&mut cursor, accum);
            }
        }

        for (dst, &acc) in output.iter_mut().zip(accum.iter()) {
            *dst = acc.clamp(-0x7FFF, 0x7FFF) as i16;
        }
        // An odd trailing half-frame is still filled, with silence
        if output.len() > len {
            output[len] = 0;
        }
    }
}

/// Shared handle to the mixer: the crate's control surface.
///
/// Constructed once with the device output rate and cloned to whoever needs
/// it (game logic, the audio device adapter). Every method holds the single
/// state mutex for its full duration.
#[derive(Clone)]
pub struct AudioEngine {
    mixer: Arc<Mutex<Mixer>>,
}

impl AudioEngine {
    /// Create an engine mixing at the given device output rate
    pub fn new(output_rate: u32) -> Self {
        AudioEngine {
            mixer: Arc::new(Mutex::new(Mixer::new(output_rate))),
        }
    }

    /// Load an XA sequence; does not start playback
    pub fn load(&self, data: &[u8]) -> Result<()> {
        self.mixer.lock().load(data)
    }

    /// Begin playback from the current cursor
    pub fn play(&self) {
        self.mixer.lock().play();
    }

    /// Halt output
    pub fn stop(&self) {
        self.mixer.lock().stop();
    }

    /// Select the active (file, channel) stream
    pub fn set_filter(&self, file: u8, channel: u8) {
        self.mixer.lock().set_filter(file, channel);
    }

    /// Whether playback is active
    pub fn is_playing(&self) -> bool {
        self.mixer.lock().is_playing()
    }

    /// Fill `output` with interleaved stereo frames (audio callback entry)
    pub fn mix(&self, output: &mut [i16]) {
        self.mixer.lock().mix(output);
    }

    /// Run `f` against the locked mixer (channel listing, diagnostics)
    pub fn with_mixer<R>(&self, f: impl FnOnce(&Mixer) -> R) -> R {
        f(&self.mixer.lock())
    }
}
