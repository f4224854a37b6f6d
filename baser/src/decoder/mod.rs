//! Receive pipeline: aligned 64b/66b blocks to XGMII lanes.

pub mod block_lock;
pub mod deframer;

use log::{trace, warn};

use crate::block_type::decode_block;
use crate::config::CodecConfig;
use crate::error::{ConfigError, DecodeError};
use crate::fsm::Fsm;
use crate::scrambler::Descrambler;
use crate::types::{Block, XgmiiLanes};

use self::block_lock::{BerMonitor, BlockLock};

/// Receive counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Blocks received.
    pub blocks: u64,
    /// Blocks with a sync header other than DATA or CTRL.
    pub bad_sync_header: u64,
    /// Control blocks with an unknown block type.
    pub bad_block_type: u64,
    /// TERM seen with no frame in progress.
    pub term_without_frame: u64,
    /// Frames received.
    pub frames: u64,
    /// Frames closed by a control character other than TERM.
    pub error_frames: u64,
    /// Bit slips requested by the block lock state machine.
    pub slips: u64,
}

impl DecoderStats {
    /// Counts a decode error.
    pub fn record(&mut self, error: DecodeError) {
        match error {
            DecodeError::BadSyncHeader(_) => self.bad_sync_header += 1,
            DecodeError::BadBlockType(_) => self.bad_block_type += 1,
            DecodeError::FrameTermWithoutData => self.term_without_frame += 1,
        }
    }

    /// Returns the number of line coding errors.
    pub fn errors(&self) -> u64 { self.bad_sync_header + self.bad_block_type }
}

/// Block decoder: descrambles and decodes one block per step.
///
/// With block lock enabled, blocks received while unlocked or in high BER decode to ERROR
/// lanes, and [`Decoder::take_slip`] reports when the aligner should move by one bit.
#[derive(Debug, Clone)]
pub struct Decoder {
    descrambler: Option<Descrambler>,
    block_lock: Option<(BlockLock, BerMonitor)>,
    slip: bool,
    stats: DecoderStats,
}

impl Decoder {
    /// Creates a decoder.
    pub fn new(config: &CodecConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let descrambler = if config.scramble { Some(Descrambler::new(config.scrambler)?) } else { None };
        let block_lock = config.block_lock.map(|c| (BlockLock::new(c), BerMonitor::new(c)));
        Ok(Self { descrambler, block_lock, slip: false, stats: DecoderStats::default() })
    }

    /// Returns true while block lock is held. Always true without block lock.
    pub fn block_lock(&self) -> bool { self.block_lock.as_ref().map_or(true, |(lock, _)| lock.locked()) }

    /// Returns the high BER flag. Always false without block lock.
    pub fn high_ber(&self) -> bool { self.block_lock.as_ref().map_or(false, |(_, ber)| ber.high_ber()) }

    /// Returns and clears the pending slip request.
    pub fn take_slip(&mut self) -> bool { std::mem::take(&mut self.slip) }

    /// Returns the counters.
    pub fn stats(&self) -> DecoderStats { self.stats }
}

impl Fsm for Decoder {
    type Input = Block;
    type Output = XgmiiLanes;

    fn step(&mut self, mut block: Block) -> XgmiiLanes {
        self.stats.blocks += 1;

        let valid = block.sync_header().is_some();
        let usable = match &mut self.block_lock {
            Some((lock, ber)) => {
                if lock.step(valid) {
                    self.slip = true;
                    self.stats.slips += 1;
                }
                let high_ber = ber.step(valid);
                lock.locked() && !high_ber
            }
            None => true,
        };

        // The descrambler runs on every block so that it stays in step with the line.
        if let Some(descrambler) = &mut self.descrambler {
            block.data = descrambler.step(block.data);
        }

        if !usable {
            return XgmiiLanes::ERROR;
        }

        match decode_block(block) {
            Ok(lanes) => {
                trace!("RX {:?}", lanes);
                lanes
            }
            Err(e) => {
                warn!("{}", e);
                self.stats.record(e);
                XgmiiLanes::ERROR
            }
        }
    }

    fn reset(&mut self) {
        if let Some(descrambler) = &mut self.descrambler {
            descrambler.reset();
        }
        if let Some((lock, ber)) = &mut self.block_lock {
            lock.reset();
            ber.reset();
        }
        self.slip = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{baser_sync, block_type, xgmii_ctrl};
    use crate::decoder::block_lock::BlockLockConfig;
    use crate::encoder::Encoder;
    use crate::types::SyncHeader;

    fn config() -> CodecConfig { CodecConfig::default() }

    #[test]
    fn decodes_encoded_blocks() {
        let mut encoder = Encoder::new(&config()).unwrap();
        let mut decoder = Decoder::new(&config()).unwrap();
        let mut start = XgmiiLanes::from_data([0x55; 8]);
        start.data[0] = xgmii_ctrl::START;
        start.ctrl[0] = true;
        let lanes = [XgmiiLanes::IDLE, start, XgmiiLanes::from_data([1, 2, 3, 4, 5, 6, 7, 8]), XgmiiLanes::IDLE];

        let out = decoder.run(encoder.run(lanes));
        assert_eq!(out, lanes);
        assert_eq!(decoder.stats().errors(), 0);
    }

    #[test]
    fn bad_block_type_is_recovered() {
        let mut decoder = Decoder::new(&config().scramble(false)).unwrap();
        let bad = Block { hdr: baser_sync::CTRL, data: 0 };
        let idle = Block::new(SyncHeader::Ctrl, u64::from(block_type::CTRL));
        assert_eq!(decoder.run([bad, idle]), vec![XgmiiLanes::ERROR, XgmiiLanes::IDLE]);
        assert_eq!(decoder.stats().bad_block_type, 1);
    }

    #[test]
    fn bad_sync_header_is_recovered() {
        let mut decoder = Decoder::new(&config().scramble(false)).unwrap();
        let idle = Block::new(SyncHeader::Ctrl, u64::from(block_type::CTRL));
        assert_eq!(decoder.run([Block { hdr: 0b11, ..idle }, idle]), vec![XgmiiLanes::ERROR, XgmiiLanes::IDLE]);
        assert_eq!(decoder.stats().bad_sync_header, 1);
    }

    #[test]
    fn unlocked_outputs_error() {
        let block_lock = BlockLockConfig { ber_window: 100, ..Default::default() };
        let mut decoder = Decoder::new(&config().scramble(false).block_lock(block_lock)).unwrap();
        let idle = Block::new(SyncHeader::Ctrl, u64::from(block_type::CTRL));

        let out = decoder.run(std::iter::repeat(idle).take(63));
        assert!(out.iter().all(|l| *l == XgmiiLanes::ERROR));
        assert!(!decoder.block_lock());
        assert_eq!(decoder.step(idle), XgmiiLanes::IDLE);
        assert!(decoder.block_lock());

        assert!(!decoder.take_slip());
        decoder.step(Block { hdr: 0, ..idle });
        assert_eq!(decoder.stats().slips, 0);
        decoder.reset();
        assert!(!decoder.block_lock());
        decoder.step(Block { hdr: 0, ..idle });
        assert!(decoder.take_slip());
        assert!(!decoder.take_slip());
        assert_eq!(decoder.stats().slips, 1);
    }
}
