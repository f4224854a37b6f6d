//! 64b/66b blocks and SERDES interface words.

use crate::constants::{baser_sync, BLOCK_BITS, HEADER_BITS};
use crate::utils::mask_u128;

/// Block sync header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncHeader {
    /// Eight data lanes.
    Data,
    /// Payload starts with a block type tag.
    Ctrl,
}

impl SyncHeader {
    /// Parses a raw 2-bit header. `0b00` and `0b11` are invalid.
    pub fn from_bits(hdr: u8) -> Option<Self> {
        match hdr & 0b11 {
            baser_sync::DATA => Some(Self::Data),
            baser_sync::CTRL => Some(Self::Ctrl),
            _ => None,
        }
    }

    /// Returns the raw 2-bit header.
    pub fn bits(self) -> u8 {
        match self {
            Self::Data => baser_sync::DATA,
            Self::Ctrl => baser_sync::CTRL,
        }
    }
}

/// One 66-bit block: raw 2-bit sync header and 64-bit payload.
///
/// The header is kept raw so that misaligned or corrupted blocks can be carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Block {
    /// Sync header bits.
    pub hdr: u8,
    /// Payload, first transmitted bit in bit 0.
    pub data: u64,
}

impl Block {
    /// Creates a block.
    pub const fn new(hdr: SyncHeader, data: u64) -> Self {
        let hdr = match hdr {
            SyncHeader::Data => baser_sync::DATA,
            SyncHeader::Ctrl => baser_sync::CTRL,
        };
        Self { hdr, data }
    }

    /// Returns the sync header, if valid.
    pub fn sync_header(&self) -> Option<SyncHeader> { SyncHeader::from_bits(self.hdr) }

    /// Returns the block as 66 bits, header in bits 0 and 1.
    pub fn to_bits(self) -> u128 { u128::from(self.hdr & 0b11) | (u128::from(self.data) << HEADER_BITS) }

    /// Builds a block from its 66-bit serial form. Upper bits are ignored.
    pub fn from_bits(bits: u128) -> Self {
        let bits = bits & mask_u128(BLOCK_BITS);
        Self { hdr: (bits & 0b11) as u8, data: (bits >> HEADER_BITS) as u64 }
    }
}

/// One SERDES interface cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerdesWord {
    /// Data bits, `width` bits wide.
    pub data: u64,
    /// Sync header. Only meaningful while `hdr_valid` is set.
    pub hdr: u8,
    /// `data` carries bits this cycle.
    pub data_valid: bool,
    /// `hdr` carries the header of a new block this cycle.
    pub hdr_valid: bool,
}

impl SerdesWord {
    /// A gearbox stall cycle.
    pub const STALL: Self = Self { data: 0, hdr: 0, data_valid: false, hdr_valid: false };

    /// A cycle starting a new block.
    pub const fn with_header(data: u64, hdr: u8) -> Self { Self { data, hdr, data_valid: true, hdr_valid: true } }

    /// A cycle continuing the current block, or a raw serial cycle.
    pub const fn data_only(data: u64) -> Self { Self { data, hdr: 0, data_valid: true, hdr_valid: false } }
}
