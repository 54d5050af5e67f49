//! CD-ROM/XA streaming audio sectors
//!
//! An XA sequence interleaves several logical audio streams across
//! sequential 2336-byte Mode 2 sectors. Each sector names its stream with a
//! (file, channel) pair; [`sector`] decodes one sector's ADPCM payload and
//! [`stream`] demultiplexes a whole sequence into per-stream PCM buffers.

pub mod sector;
pub mod stream;

pub use sector::{Coding, SectorDecoder, SectorPcm, SubHeader, SubMode, SECTOR_SIZE};
pub use stream::{Channel, Stream};

/// Combine a subheader's file and channel numbers into the 16-bit filter id
/// used to key the channel registry.
pub fn filter_id(file: u8, channel: u8) -> u16 {
    (u16::from(file) << 8) | u16::from(channel)
}
