//! Gearbox: block realignment, serial width conversion and stall sequencing.

use std::collections::BTreeSet;

use arrayvec::ArrayVec;

use crate::constants::BLOCK_BITS;
use crate::error::ConfigError;
use crate::types::Block;
use crate::utils::mask_u128;

/// Gearbox sequence configuration.
///
/// A sequence of `seq_len` cycles of which the cycles in `stall_cycles` move no data. The
/// active cycles carry whole 66-bit blocks on one side and `line_bits` bits on the other, so
/// `seq_len * line_bits == (seq_len - stalls) * 66` must hold exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GearboxConfig {
    seq_len: usize,
    stall_cycles: BTreeSet<usize>,
    line_bits: usize,
}

impl GearboxConfig {
    /// Creates a gearbox configuration.
    pub fn new<I: IntoIterator<Item = usize>>(seq_len: usize, stall_cycles: I) -> Result<Self, ConfigError> {
        if seq_len == 0 {
            return Err(ConfigError::EmptyGearboxSequence);
        }

        let stall_cycles = stall_cycles.into_iter().collect::<BTreeSet<_>>();
        if let Some(&cycle) = stall_cycles.iter().find(|c| **c >= seq_len) {
            return Err(ConfigError::BadStallCycle { cycle, seq_len });
        }

        let active = seq_len - stall_cycles.len();
        let line_bits = BLOCK_BITS * active / seq_len;
        if line_bits == 0 || seq_len * line_bits != active * BLOCK_BITS {
            return Err(ConfigError::BadGearboxRatio {
                seq_len,
                stall_cycles: stall_cycles.len(),
                in_bits: line_bits,
                out_bits: BLOCK_BITS,
            });
        }

        Ok(Self { seq_len, stall_cycles, line_bits })
    }

    /// Returns the sequence length in cycles.
    pub fn seq_len(&self) -> usize { self.seq_len }

    /// Returns true if `cycle` is a stall cycle.
    pub fn is_stall(&self, cycle: usize) -> bool { self.stall_cycles.contains(&cycle) }

    /// Returns the gearbox ratio as (line bits per cycle, block bits per active cycle).
    pub fn ratio(&self) -> (usize, usize) { (self.line_bits, BLOCK_BITS) }
}

/// Position within a gearbox sequence.
#[derive(Debug, Clone)]
pub struct GearboxSeq {
    config: GearboxConfig,
    seq: usize,
}

impl GearboxSeq {
    /// Creates a sequence counter at position 0.
    pub fn new(config: GearboxConfig) -> Self { Self { config, seq: 0 } }

    /// Moves to the next cycle. Returns true if it is a stall cycle.
    pub fn advance(&mut self) -> bool {
        self.seq = (self.seq + 1) % self.config.seq_len;
        self.config.is_stall(self.seq)
    }

    /// Returns true if the current cycle is a stall cycle.
    pub fn is_stall(&self) -> bool { self.config.is_stall(self.seq) }

    /// Returns true if the next cycle will be a stall cycle.
    pub fn next_is_stall(&self) -> bool { self.config.is_stall((self.seq + 1) % self.config.seq_len) }

    /// Restarts the sequence so the current cycle is cycle 0.
    pub fn sync(&mut self) { self.seq = 0; }

    /// Returns true at the first cycle of the sequence.
    pub fn at_start(&self) -> bool { self.seq == 0 }

    /// Returns to position 0.
    pub fn reset(&mut self) { self.seq = 0; }
}

/// Realigns whole blocks by a bit offset.
///
/// Each output block is the 66 bits starting `offset` bits before the current input block, so
/// a stream delayed by `k` bits is restored by an aligner at `66 - k`.
#[derive(Debug, Clone, Default)]
pub struct BitAligner {
    offset: usize,
    last: u128,
}

impl BitAligner {
    /// Creates an aligner at offset 0.
    pub fn new() -> Self { Self::default() }

    /// Returns the offset, always in `[0, 66)`.
    pub fn offset(&self) -> usize { self.offset }

    /// Sets the offset, modulo 66.
    pub fn set_offset(&mut self, offset: usize) { self.offset = offset % BLOCK_BITS; }

    /// Moves the offset by one bit.
    pub fn slip(&mut self) { self.offset = (self.offset + 1) % BLOCK_BITS; }

    /// Aligns the next block.
    pub fn align(&mut self, block: Block) -> Block {
        let d = block.to_bits();
        let out = if self.offset == 0 {
            d
        } else {
            ((d << self.offset) | (self.last >> (BLOCK_BITS - self.offset))) & mask_u128(BLOCK_BITS)
        };
        self.last = d;
        Block::from_bits(out)
    }

    /// Returns to offset 0 with an empty history.
    pub fn reset(&mut self) { *self = Self::default(); }
}

/// Serializes 66-bit blocks onto a narrower word, first bit in bit 0.
#[derive(Debug, Clone, Default)]
pub struct SerialGearbox {
    buf: u128,
    count: usize,
    offset: usize,
}

impl SerialGearbox {
    /// Creates an empty gearbox.
    pub fn new() -> Self { Self::default() }

    /// Returns the number of slips taken, modulo 66.
    pub fn offset(&self) -> usize { self.offset }

    /// Returns the next `width` bits, pulling blocks from `next` as needed.
    pub fn pop<F: FnMut() -> u128>(&mut self, width: usize, mut next: F) -> u64 {
        let mut out = 0u128;
        let mut got = 0;
        while got < width {
            if self.count == 0 {
                self.buf = next() & mask_u128(BLOCK_BITS);
                self.count = BLOCK_BITS;
            }
            let take = (width - got).min(self.count);
            out |= (self.buf & mask_u128(take)) << got;
            self.buf >>= take;
            self.count -= take;
            got += take;
        }
        out as u64
    }

    /// Drops one bit from the stream.
    pub fn slip<F: FnMut() -> u128>(&mut self, mut next: F) {
        if self.count == 0 {
            self.buf = next() & mask_u128(BLOCK_BITS);
            self.count = BLOCK_BITS;
        }
        self.buf >>= 1;
        self.count -= 1;
        self.offset = (self.offset + 1) % BLOCK_BITS;
    }

    /// Empties the gearbox.
    pub fn reset(&mut self) { *self = Self::default(); }
}

/// Collects 66-bit blocks from narrower words, first bit in bit 0.
#[derive(Debug, Clone, Default)]
pub struct SerialDegearbox {
    buf: u128,
    count: usize,
    skip: usize,
    offset: usize,
}

impl SerialDegearbox {
    /// Creates an empty gearbox.
    pub fn new() -> Self { Self::default() }

    /// Returns the number of slips taken, modulo 66.
    pub fn offset(&self) -> usize { self.offset }

    /// Drops the next incoming bit.
    pub fn slip(&mut self) {
        self.skip += 1;
        self.offset = (self.offset + 1) % BLOCK_BITS;
    }

    /// Pushes the low `width` bits of `word`. Returns the blocks completed by it.
    pub fn push(&mut self, word: u64, width: usize) -> ArrayVec<u128, 2> {
        let mut blocks = ArrayVec::new();
        let mut word = u128::from(word) & mask_u128(width);
        let mut remaining = width;

        while self.skip > 0 && remaining > 0 {
            word >>= 1;
            remaining -= 1;
            self.skip -= 1;
        }

        while remaining > 0 {
            let take = remaining.min(BLOCK_BITS - self.count);
            self.buf |= (word & mask_u128(take)) << self.count;
            self.count += take;
            word >>= take;
            remaining -= take;
            if self.count == BLOCK_BITS {
                blocks.push(self.buf);
                self.buf = 0;
                self.count = 0;
            }
        }

        blocks
    }

    /// Empties the gearbox.
    pub fn reset(&mut self) { *self = Self::default(); }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    use super::*;
    use crate::types::SyncHeader;

    fn random_blocks(n: usize, seed: u64) -> Vec<Block> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| Block::new(SyncHeader::Data, rng.next_u64())).collect()
    }

    #[test]
    fn ratio_64_66() {
        let config = GearboxConfig::new(33, [0]).unwrap();
        assert_eq!(config.ratio(), (64, 66));
        assert!(config.is_stall(0));
        assert!(!config.is_stall(1));
    }

    #[test]
    fn ratio_32_66() {
        // 17 stalls leave 16 active cycles.
        let config = GearboxConfig::new(33, (0..33).filter(|c| c % 2 == 0)).unwrap();
        assert_eq!(config.ratio(), (32, 66));
        assert!(config.is_stall(32));
        assert!(!config.is_stall(31));
    }

    #[test]
    fn bad_ratio() {
        assert!(matches!(GearboxConfig::new(7, [0]), Err(ConfigError::BadGearboxRatio { .. })));
        assert!(matches!(GearboxConfig::new(2, [0, 1]), Err(ConfigError::BadGearboxRatio { .. })));
        assert!(matches!(GearboxConfig::new(33, [33]), Err(ConfigError::BadStallCycle { cycle: 33, seq_len: 33 })));
        assert_eq!(GearboxConfig::new(0, []), Err(ConfigError::EmptyGearboxSequence));
    }

    #[test]
    fn duplicate_stalls_count_once() {
        let config = GearboxConfig::new(33, [5, 5]).unwrap();
        assert_eq!(config.ratio(), (64, 66));
    }

    #[test]
    fn sequence_wraps() {
        let mut seq = GearboxSeq::new(GearboxConfig::new(33, [0]).unwrap());
        let stalls = (0..66).filter(|_| seq.advance()).count();
        assert_eq!(stalls, 2);
        assert!(seq.at_start());
        assert!(!seq.next_is_stall());
    }

    #[test]
    fn aligner_pair_restores_stream() {
        for k in [1, 2, 33, 65] {
            let blocks = random_blocks(10, k as u64);
            let mut tx = BitAligner::new();
            let mut rx = BitAligner::new();
            tx.set_offset(k);
            rx.set_offset(BLOCK_BITS - k);

            let out = blocks.iter().map(|b| rx.align(tx.align(*b))).collect::<Vec<_>>();
            // One block of latency through the pair.
            assert_eq!(&out[1..], &blocks[..9], "offset {}", k);
        }
    }

    #[test]
    fn aligner_offset_stays_in_range() {
        let mut aligner = BitAligner::new();
        for i in 0..1000 {
            aligner.slip();
            assert!(aligner.offset() < BLOCK_BITS);
            assert_eq!(aligner.offset(), (i + 1) % BLOCK_BITS);
        }
        aligner.set_offset(200);
        assert_eq!(aligner.offset(), 200 % 66);
    }

    #[test]
    fn serial_round_trip() {
        for width in [8, 16, 32, 40, 64] {
            let blocks = random_blocks(20, width as u64);
            let mut tx = SerialGearbox::new();
            let mut rx = SerialDegearbox::new();
            let mut source = blocks.iter().map(|b| b.to_bits());

            let mut out = Vec::new();
            while out.len() < 16 {
                let word = tx.pop(width, || source.next().unwrap_or_default());
                out.extend(rx.push(word, width).into_iter().map(Block::from_bits));
            }
            assert_eq!(&out[..16], &blocks[..16], "width {}", width);
        }
    }

    #[test]
    fn serial_slip_drops_one_bit() {
        let mut tx = SerialGearbox::new();
        let mut blocks = [0b1011u128, 0].into_iter();
        tx.slip(|| blocks.next().unwrap_or_default());
        assert_eq!(tx.offset(), 1);
        assert_eq!(tx.pop(8, || 0), 0b101);

        let mut rx = SerialDegearbox::new();
        rx.slip();
        assert!(rx.push(u64::MAX, 64).is_empty());
        let blocks = rx.push(u64::MAX, 64);
        assert_eq!(blocks.as_slice(), &[mask_u128(BLOCK_BITS)]);
    }
}
