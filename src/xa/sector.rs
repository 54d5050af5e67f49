//! XA sector layout and ADPCM payload decoding
//!
//! A Mode 2 Form 2 audio sector is 0x920 bytes: an 8-byte region holding two
//! copies of the subheader, then 18 sub-blocks of 128 bytes. Every sub-block
//! starts with a 16-byte header region in which the 8 quantization headers
//! are mirrored on both sides (bytes 0..4 repeat 4..8, bytes 12..16 repeat
//! 8..12), followed by 28 little-endian 32-bit sample words carrying the
//! interleaved compressed units.
//!
//! Redundancy failures never raise: a sector whose subheader copies or
//! sub-block mirrors disagree simply decodes to zero samples.

use bitflags::bitflags;

use crate::adpcm::{clamp_shift, filter_taps, Decoder};
use crate::xa::filter_id;

/// Size of one XA sector record in bytes
pub const SECTOR_SIZE: usize = 0x920;

/// Sub-blocks per sector
const SUB_BLOCKS: usize = 0x12;

/// Bytes per sub-block
const SUB_BLOCK_SIZE: usize = 0x80;

/// Sample words per decode unit
const UNIT_SAMPLES: usize = 28;

bitflags! {
    /// Subheader submode bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SubMode: u8 {
        /// End of record
        const EOR = 0x01;
        /// Sector carries video data
        const VIDEO = 0x02;
        /// Sector carries ADPCM audio data
        const AUDIO = 0x04;
        /// Sector carries plain data
        const DATA = 0x08;
        /// Trigger interrupt on this sector
        const TRIGGER = 0x10;
        /// Mode 2 Form 2 sector
        const FORM2 = 0x20;
        /// Real-time sector
        const REAL_TIME = 0x40;
        /// End of file
        const EOF_MARKER = 0x80;
    }
}

/// Coding-info byte of an audio sector's subheader.
///
/// Three 2-bit fields select channel count, sample rate and bit depth. The
/// reserved field values (2 and 3) fall back to the 0 default rather than
/// erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coding(
    /// Raw coding-info byte
    pub u8,
);

impl Coding {
    /// Stereo layout (units alternate left/right)
    pub fn is_stereo(self) -> bool {
        (self.0 & 0x03) == 0x01
    }

    /// 18900 Hz sample rate (else 37800 Hz)
    pub fn is_18900hz(self) -> bool {
        ((self.0 >> 2) & 0x03) == 0x01
    }

    /// 8-bit samples (else 4-bit)
    pub fn is_8bit(self) -> bool {
        ((self.0 >> 4) & 0x03) == 0x01
    }

    /// Native sample rate in Hz
    pub fn sample_rate(self) -> u32 {
        if self.is_18900hz() {
            18900
        } else {
            37800
        }
    }
}

/// XA sector subheader: one logical stream address plus format flags.
///
/// Stored twice at the start of the sector for integrity; both copies must
/// match byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubHeader {
    /// File number of the logical stream
    pub file: u8,
    /// Channel number of the logical stream
    pub channel: u8,
    /// Sector type flags
    pub submode: SubMode,
    /// Audio format flags
    pub coding: Coding,
}

impl SubHeader {
    /// Parse the duplicated subheader from a sector.
    ///
    /// Returns `None` when the two copies disagree (corrupt sector) or the
    /// buffer is too short to hold them.
    pub fn parse(sector: &[u8]) -> Option<SubHeader> {
        if sector.len() < 8 || sector[0..4] != sector[4..8] {
            return None;
        }

        Some(SubHeader {
            file: sector[0],
            channel: sector[1],
            submode: SubMode::from_bits_truncate(sector[2]),
            coding: Coding(sector[3]),
        })
    }

    /// The 16-bit filter id addressing this sector's stream
    pub fn filter(&self) -> u16 {
        filter_id(self.file, self.channel)
    }

    /// Whether the sector carries ADPCM audio
    pub fn is_audio(&self) -> bool {
        self.submode.contains(SubMode::AUDIO)
    }
}

/// Decoded PCM output of one sector.
///
/// Samples are interleaved stereo regardless of source layout; mono sectors
/// duplicate each sample into both slots. A corrupt sector leaves the buffer
/// empty.
#[derive(Debug, Clone, Default)]
pub struct SectorPcm {
    /// Interleaved stereo samples
    pub samples: Vec<i16>,
    /// Native sample rate in Hz
    pub sample_rate: u32,
}

impl SectorPcm {
    /// Number of stereo frames decoded
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    /// True when the sector decoded to nothing (corrupt or non-audio)
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Decodes the ADPCM payload of successive sectors belonging to one stream.
///
/// Owns the left/right [`Decoder`] pair whose filter history must persist
/// across all sectors of the stream.
#[derive(Debug, Clone, Default)]
pub struct SectorDecoder {
    left: Decoder,
    right: Decoder,
}

impl SectorDecoder {
    /// Create a decoder pair with zeroed history
    pub fn new() -> Self {
        SectorDecoder::default()
    }

    /// Reset both filter histories (stream start)
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }

    /// Decode one sector into `out`, reusing its allocation.
    ///
    /// `out.samples` ends up empty for a bad sector (wrong length, subheader
    /// mismatch, sub-block mirror mismatch). Mirror failures abort the whole
    /// sector even mid-way; history mutated by earlier sub-blocks is kept, as
    /// on hardware.
    pub fn decode(&mut self, raw: &[u8], out: &mut SectorPcm) {
        out.samples.clear();

        if raw.len() != SECTOR_SIZE {
            return;
        }
        let Some(sub) = SubHeader::parse(raw) else {
            return;
        };

        let coding = sub.coding;
        out.sample_rate = coding.sample_rate();

        let stereo = coding.is_stereo();
        let eight_bit = coding.is_8bit();

        // 8 * 28 * 18 frames, halved for 8-bit, halved again for stereo
        let mut frames = 8 * UNIT_SAMPLES * SUB_BLOCKS;
        if eight_bit {
            frames /= 2;
        }
        if stereo {
            frames /= 2;
        }
        out.samples.reserve(frames * 2);

        let units = if eight_bit { 4 } else { 8 };
        let unit_step = if stereo { 2 } else { 1 };

        for block in raw[8..].chunks_exact(SUB_BLOCK_SIZE).take(SUB_BLOCKS) {
            // The 8 quantization headers sit at 4..12, mirrored into 0..4
            // and 12..16; any disagreement voids the sector.
            if block[0..4] != block[4..8] || block[8..12] != block[12..16] {
                out.samples.clear();
                return;
            }
            let headers = &block[4..12];
            let words = &block[16..];

            let mut unit = 0;
            while unit < units {
                let hdr_l = headers[unit];
                let shift_l = clamp_shift(hdr_l & 0x0F);
                let (f0_l, f1_l) = filter_taps((hdr_l >> 4) & 0x03);

                // Stereo pairs units: even = left, odd = right
                let hdr_r = headers[if stereo { unit + 1 } else { unit }];
                let shift_r = clamp_shift(hdr_r & 0x0F);
                let (f0_r, f1_r) = filter_taps((hdr_r >> 4) & 0x03);

                for w in 0..UNIT_SAMPLES {
                    let word = u32::from_le_bytes([
                        words[w * 4],
                        words[w * 4 + 1],
                        words[w * 4 + 2],
                        words[w * 4 + 3],
                    ]);

                    let (sample_l, sample_r) = if eight_bit {
                        let byte_l = (word >> (unit * 8)) as u8;
                        let l = self.left.decode_byte(byte_l, shift_l, f0_l, f1_l);
                        if stereo {
                            let byte_r = (word >> ((unit + 1) * 8)) as u8;
                            (l, self.right.decode_byte(byte_r, shift_r, f0_r, f1_r))
                        } else {
                            (l, l)
                        }
                    } else {
                        let nib_l = ((word >> (unit * 4)) & 0xF) as u8;
                        let l = self.left.decode_nibble(nib_l, shift_l, f0_l, f1_l);
                        if stereo {
                            let nib_r = ((word >> ((unit + 1) * 4)) & 0xF) as u8;
                            (l, self.right.decode_nibble(nib_r, shift_r, f0_r, f1_r))
                        } else {
                            (l, l)
                        }
                    };

                    out.samples.push(sample_l);
                    out.samples.push(sample_r);
                }

                unit += unit_step;
            }
        }
    }
}
