//! XA channel demultiplexer and registry
//!
//! A loaded [`Stream`] owns one [`Channel`] per (file, channel) pair seen in
//! the sequence. Loading decodes every audio sector up front, so playback
//! only ever touches already-decoded memory.

use std::collections::HashMap;

use log::{debug, warn};

use crate::xa::filter_id;
use crate::xa::sector::{SectorDecoder, SectorPcm, SubHeader, SECTOR_SIZE};
use crate::{CdxaError, Result};

/// One demultiplexed logical audio stream.
pub struct Channel {
    /// Coding-info byte captured from the channel's first sector
    pub coding: crate::xa::Coding,
    /// Native sample rate in Hz
    pub sample_rate: u32,
    /// Decoded PCM, interleaved stereo, appended in sector arrival order
    pub pcm: Vec<i16>,
    decoder: SectorDecoder,
}

impl Channel {
    fn new(coding: crate::xa::Coding) -> Self {
        Channel {
            coding,
            sample_rate: coding.sample_rate(),
            pcm: Vec::new(),
            decoder: SectorDecoder::new(),
        }
    }

    /// Number of stereo frames buffered
    pub fn frames(&self) -> usize {
        self.pcm.len() / 2
    }
}

/// All channels demultiplexed from one XA sequence.
///
/// Replaced wholesale on every load; the registry never outlives its stream.
#[derive(Default)]
pub struct Stream {
    channels: HashMap<u16, Channel>,
    default_filter: Option<u16>,
}

impl Stream {
    /// Create an empty stream (initial engine state)
    pub fn new() -> Self {
        Stream::default()
    }

    /// Demultiplex and decode a whole XA sequence.
    ///
    /// Iterates the fixed-size sector records in file order, creating a
    /// channel the first time a filter id appears and appending every matching
    /// audio sector's samples to it. Non-audio sectors are skipped; corrupt
    /// sectors decode to nothing and are logged. A trailing partial record is
    /// a load failure.
    pub fn load(data: &[u8]) -> Result<Stream> {
        let trailing = data.len() % SECTOR_SIZE;
        if trailing != 0 {
            return Err(CdxaError::TruncatedSector(trailing, SECTOR_SIZE));
        }

        let mut stream = Stream::new();
        let mut scratch = SectorPcm::default();

        for (index, raw) in data.chunks_exact(SECTOR_SIZE).enumerate() {
            // The first sector names the default filter, audio or not
            if stream.default_filter.is_none() {
                stream.default_filter = Some(filter_id(raw[0], raw[1]));
            }

            let Some(sub) = SubHeader::parse(raw) else {
                warn!("sector {index}: subheader copies disagree, dropped");
                continue;
            };
            if !sub.is_audio() {
                continue;
            }

            let channel = stream.channels.entry(sub.filter()).or_insert_with(|| {
                debug!(
                    "sector {index}: new channel {:04X} ({} Hz)",
                    sub.filter(),
                    sub.coding.sample_rate()
                );
                Channel::new(sub.coding)
            });

            channel.decoder.decode(raw, &mut scratch);
            if scratch.is_empty() {
                warn!("sector {index}: corrupt audio payload, dropped");
                continue;
            }
            channel.pcm.extend_from_slice(&scratch.samples);
        }

        Ok(stream)
    }

    /// Look up a channel by filter id
    pub fn channel(&self, filter: u16) -> Option<&Channel> {
        self.channels.get(&filter)
    }

    /// Iterate all channels with their filter ids
    pub fn channels(&self) -> impl Iterator<Item = (u16, &Channel)> {
        self.channels.iter().map(|(&f, c)| (f, c))
    }

    /// Filter id of the first sector in the sequence, if any
    pub fn default_filter(&self) -> Option<u16> {
        self.default_filter
    }

    /// Number of demultiplexed channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xa::sector::tests::{make_sector, make_sector_submode};

    #[test]
    fn test_load_demultiplexes_by_filter() {
        // Interleave 0x0101 (nibble 1) and 0x0202 (nibble 2) sectors.
        let mut data = Vec::new();
        data.extend(make_sector(0x01, 0x01, 0x00, 0x0C, 0x1111_1111));
        data.extend(make_sector(0x02, 0x02, 0x00, 0x0C, 0x2222_2222));
        data.extend(make_sector(0x01, 0x01, 0x00, 0x0C, 0x1111_1111));

        let stream = Stream::load(&data).unwrap();
        assert_eq!(stream.channel_count(), 2);
        assert_eq!(stream.default_filter(), Some(0x0101));

        let a = stream.channel(0x0101).unwrap();
        let b = stream.channel(0x0202).unwrap();

        // Two sectors of 4032 frames vs one
        assert_eq!(a.frames(), 2 * 8 * 28 * 18);
        assert_eq!(b.frames(), 8 * 28 * 18);
        assert!(a.pcm.iter().all(|&s| s == 1));
        assert!(b.pcm.iter().all(|&s| s == 2));
    }

    #[test]
    fn test_non_audio_sectors_are_skipped() {
        // Submode without the audio bit: no channel may be created.
        let data = make_sector_submode(0x01, 0x01, 0x28, 0x00, 0x0C, 0);
        let stream = Stream::load(&data).unwrap();
        assert_eq!(stream.channel_count(), 0);
        // It still names the default filter.
        assert_eq!(stream.default_filter(), Some(0x0101));
    }

    #[test]
    fn test_corrupt_sector_appends_nothing() {
        let mut second = make_sector(0x01, 0x01, 0x00, 0x0C, 0x1111_1111);
        second[5] ^= 0xFF;

        let mut data = make_sector(0x01, 0x01, 0x00, 0x0C, 0x1111_1111);
        data.extend(second);

        let stream = Stream::load(&data).unwrap();
        let a = stream.channel(0x0101).unwrap();
        assert_eq!(a.frames(), 8 * 28 * 18);
    }

    #[test]
    fn test_truncated_stream_is_a_load_error() {
        let mut data = make_sector(0x01, 0x01, 0x00, 0x0C, 0);
        data.pop();
        assert!(matches!(
            Stream::load(&data),
            Err(CdxaError::TruncatedSector(..))
        ));
    }

    #[test]
    fn test_empty_stream_loads() {
        let stream = Stream::load(&[]).unwrap();
        assert_eq!(stream.channel_count(), 0);
        assert_eq!(stream.default_filter(), None);
    }

    #[test]
    fn test_decoder_state_persists_across_sectors() {
        // With a predictive filter the second sector continues from the
        // first's history, so two identical sectors decode differently.
        // Header 0x24: shift 4, filter 2.
        let mut data = make_sector(0x01, 0x01, 0x00, 0x24, 0x3333_3333);
        data.extend(make_sector(0x01, 0x01, 0x00, 0x24, 0x3333_3333));

        let stream = Stream::load(&data).unwrap();
        let pcm = &stream.channel(0x0101).unwrap().pcm;
        let half = pcm.len() / 2;
        assert_ne!(&pcm[..half], &pcm[half..]);
    }
}
