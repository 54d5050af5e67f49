//! PlayStation ADPCM sample decoding
//!
//! The PSX compresses audio as blocks of 4-bit (or, for XA, optionally 8-bit)
//! residuals plus a per-block quantization header. Each sample is predicted
//! from the two previous decoded samples through one of a handful of fixed
//! filter coefficient pairs, so decoding is stateful: a [`Decoder`] carries
//! the two history values and must stay with its logical channel.
//!
//! The same primitive serves both SPU ADPCM (16-byte voice blocks) and CD-XA
//! streaming sectors; the XA sector layout lives in [`crate::xa`].

/// Predictor coefficient pairs `(f0, f1)` applied to the two previous samples.
///
/// SPU ADPCM addresses all five defined filters with a 3-bit selector; XA
/// headers only carry a 2-bit selector, so filter 4 is SPU-only. The reserved
/// selectors decode through zero taps.
const FILTERS: [(i32, i32); 8] = [
    (0, 0),
    (60, 0),
    (115, -52),
    (98, -55),
    (122, -60),
    (0, 0),
    (0, 0),
    (0, 0),
];

/// Look up the filter taps for a header's filter selector.
pub(crate) fn filter_taps(filter: u8) -> (i32, i32) {
    FILTERS[(filter & 0x07) as usize]
}

/// Clamp a quantization shift to the valid range.
///
/// Shifts above 12 only occur in corrupted headers; real hardware substitutes
/// 9 and keeps decoding, so we do the same rather than erroring.
pub(crate) fn clamp_shift(shift: u8) -> u8 {
    if shift > 12 {
        9
    } else {
        shift
    }
}

/// Stateful ADPCM decoder for one logical audio channel.
///
/// Holds the two most recent decoded samples. Stereo XA uses two independent
/// decoders, one per side; they are never shared across channels.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    old: i32,
    older: i32,
}

impl Decoder {
    /// Create a decoder with zeroed history
    pub fn new() -> Self {
        Decoder::default()
    }

    /// Reset the filter history to zero (channel start)
    pub fn reset(&mut self) {
        self.old = 0;
        self.older = 0;
    }

    /// Decode one 4-bit compressed sample.
    ///
    /// `shift` must already be clamped via [`clamp_shift`]; `f0`/`f1` are the
    /// filter taps for the block's filter selector.
    pub fn decode_nibble(&mut self, nibble: u8, shift: u8, f0: i32, f1: i32) -> i16 {
        // Sign extend nibble
        let mut t = i32::from(nibble & 0x0F);
        if t & 0x8 != 0 {
            t -= 0x10;
        }

        self.step(t << 12, shift, f0, f1)
    }

    /// Decode one 8-bit compressed sample.
    pub fn decode_byte(&mut self, byte: u8, shift: u8, f0: i32, f1: i32) -> i16 {
        // Sign extend byte
        let mut t = i32::from(byte);
        if t & 0x80 != 0 {
            t -= 0x100;
        }

        self.step(t << 8, shift, f0, f1)
    }

    /// Shared quantize/filter/clip step.
    ///
    /// The output range is [-32767, 32767]: hardware never emits -32768, and
    /// the clipped value (not the raw sum) feeds back into the history.
    fn step(&mut self, t: i32, shift: u8, f0: i32, f1: i32) -> i16 {
        let mut s = (t >> shift) + (self.old * f0 + self.older * f1 + 32) / 64;

        if s < -0x7FFF {
            s = -0x7FFF;
        }
        if s > 0x7FFF {
            s = 0x7FFF;
        }

        self.older = self.old;
        self.old = s;

        s as i16
    }

    /// Decode one 16-byte SPU ADPCM block into 28 samples.
    ///
    /// Byte 0 carries the shift (low nibble) and 3-bit filter selector, byte 1
    /// the loop flags (ignored here), bytes 2..16 the nibbles, low nibble
    /// first. This is the shared codec primitive; SPU voice playback itself is
    /// out of scope for this crate.
    pub fn decode_spu_block(&mut self, block: &[u8; 16], out: &mut [i16; 28]) {
        let shift = clamp_shift(block[0] & 0x0F);
        let (f0, f1) = filter_taps((block[0] >> 4) & 0x07);

        for (i, byte) in block[2..16].iter().enumerate() {
            out[i * 2] = self.decode_nibble(byte & 0x0F, shift, f0, f1);
            out[i * 2 + 1] = self.decode_nibble(byte >> 4, shift, f0, f1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_taps_reserved_selectors_are_zero() {
        assert_eq!(filter_taps(0), (0, 0));
        assert_eq!(filter_taps(2), (115, -52));
        assert_eq!(filter_taps(4), (122, -60));
        for reserved in 5..8 {
            assert_eq!(filter_taps(reserved), (0, 0));
        }
    }

    #[test]
    fn test_clamp_shift_substitutes_nine() {
        for valid in 0..=12 {
            assert_eq!(clamp_shift(valid), valid);
        }
        for invalid in 13..=15 {
            assert_eq!(clamp_shift(invalid), 9);
        }
    }

    #[test]
    fn test_decode_nibble_identity_at_full_shift() {
        // Shift 12 cancels the fixed-point scaling; with filter 0 the decoded
        // sample is exactly the sign-extended nibble.
        let mut dec = Decoder::new();
        assert_eq!(dec.decode_nibble(0x1, 12, 0, 0), 1);
        assert_eq!(dec.decode_nibble(0x7, 12, 0, 0), 7);
        assert_eq!(dec.decode_nibble(0x8, 12, 0, 0), -8);
        assert_eq!(dec.decode_nibble(0xF, 12, 0, 0), -1);
    }

    #[test]
    fn test_decode_nibble_asymmetric_clip() {
        // Nibble -8 at shift 0 is -32768, which must clip to -32767.
        let mut dec = Decoder::new();
        assert_eq!(dec.decode_nibble(0x8, 0, 0, 0), -32767);
        // The clipped value, not -32768, is what entered the history.
        assert_eq!(dec.old, -32767);
    }

    #[test]
    fn test_decode_output_always_in_range() {
        // Hammer the decoder across header space with worst-case input and
        // whatever history accumulates; output must stay inside the
        // symmetric 16-bit range.
        for filter in 0..4u8 {
            let (f0, f1) = filter_taps(filter);
            for shift in 0..=12u8 {
                let mut dec = Decoder::new();
                for nibble in (0..16u8).cycle().take(256) {
                    let s = dec.decode_nibble(nibble, shift, f0, f1);
                    assert!((-32767..=32767).contains(&i32::from(s)));
                }
                let mut dec = Decoder::new();
                for byte in (0..=255u8).cycle().take(512) {
                    let s = dec.decode_byte(byte, shift, f0, f1);
                    assert!((-32767..=32767).contains(&i32::from(s)));
                }
            }
        }
    }

    #[test]
    fn test_decode_deterministic_from_reset() {
        let data: Vec<u8> = (0..=255).collect();
        let (f0, f1) = filter_taps(2);

        let mut dec = Decoder::new();
        let first: Vec<i16> = data.iter().map(|&b| dec.decode_byte(b, 4, f0, f1)).collect();

        dec.reset();
        let second: Vec<i16> = data.iter().map(|&b| dec.decode_byte(b, 4, f0, f1)).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_depends_on_history() {
        let data: Vec<u8> = (0..=255).collect();
        let (f0, f1) = filter_taps(2);

        let mut dec = Decoder::new();
        let fresh: Vec<i16> = data.iter().map(|&b| dec.decode_byte(b, 4, f0, f1)).collect();

        // Resume without a reset: the retained history must change the output.
        let resumed: Vec<i16> = data.iter().map(|&b| dec.decode_byte(b, 4, f0, f1)).collect();
        assert_ne!(fresh, resumed);
    }

    #[test]
    fn test_decode_spu_block_known_samples() {
        // Header 0x00: shift 0, filter 0. First data byte 0x18 decodes as
        // low nibble 8 (clips to -32767) then high nibble 1 (4096).
        let mut block = [0u8; 16];
        block[2] = 0x18;

        let mut dec = Decoder::new();
        let mut out = [0i16; 28];
        dec.decode_spu_block(&block, &mut out);

        assert_eq!(out[0], -32767);
        assert_eq!(out[1], 4096);
        assert!(out[2..].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_decode_spu_block_invalid_shift_recovers() {
        // Shift nibble 15 substitutes shift 9: nibble 1 becomes 1 << 12 >> 9.
        let mut block = [0u8; 16];
        block[0] = 0x0F;
        block[2] = 0x01;

        let mut dec = Decoder::new();
        let mut out = [0i16; 28];
        dec.decode_spu_block(&block, &mut out);

        assert_eq!(out[0], 8);
    }
}
