//! SERDES transmit model.

use log::info;

use crate::config::{CodecConfig, LineInterface};
use crate::encoder::framer::XgmiiSource;
use crate::encoder::{Encoder, EncoderStats};
use crate::error::{ConfigError, SendError};
use crate::fsm::Fsm;
use crate::gearbox::{BitAligner, GearboxSeq, SerialGearbox};
use crate::types::{Block, SerdesWord, XgmiiFrame};
use crate::constants::BLOCK_BITS;
use crate::utils::{bit_reverse, mask_u64};

/// Drives a SERDES interface from a queue of frames, one word per [`SerdesSource::tick`].
#[derive(Debug, Clone)]
pub struct SerdesSource {
    config: CodecConfig,
    xgmii: XgmiiSource,
    encoder: Encoder,
    aligner: BitAligner,
    serial: SerialGearbox,
    gearbox: Option<GearboxSeq>,
    gbx_sync: bool,
    block: Block,
    pack_seq: usize,
}

/// Pulls the next lane vector through the encoder and the bit aligner.
fn next_block(xgmii: &mut XgmiiSource, encoder: &mut Encoder, aligner: &mut BitAligner) -> Block {
    aligner.align(encoder.step(xgmii.next_lanes()))
}

impl SerdesSource {
    /// Creates a source.
    pub fn new(config: CodecConfig) -> Result<Self, ConfigError> {
        let encoder = Encoder::new(&config)?;
        log_config("source", &config);

        Ok(Self {
            gearbox: config.gearbox.clone().map(GearboxSeq::new),
            config,
            xgmii: XgmiiSource::new(),
            encoder,
            aligner: BitAligner::new(),
            serial: SerialGearbox::new(),
            gbx_sync: false,
            block: Block::default(),
            pack_seq: 0,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CodecConfig { &self.config }

    /// Returns the frame source.
    pub fn xgmii(&self) -> &XgmiiSource { &self.xgmii }

    /// Returns the frame source, to set the gap or queue limits.
    pub fn xgmii_mut(&mut self) -> &mut XgmiiSource { &mut self.xgmii }

    /// Queues a frame.
    pub fn send(&mut self, frame: XgmiiFrame) -> Result<(), SendError> { self.xgmii.send(frame) }

    /// Returns the number of queued frames.
    pub fn count(&self) -> usize { self.xgmii.queue_len() }

    /// Returns true if no frame is queued.
    pub fn is_empty(&self) -> bool { self.xgmii.is_empty() }

    /// Returns true if no frame is queued or being sent.
    pub fn is_idle(&self) -> bool { self.xgmii.is_idle() }

    /// Drops every queued frame.
    pub fn clear(&mut self) { self.xgmii.clear(); }

    /// Returns the transmit bit offset, in `[0, 66)`.
    pub fn bit_offset(&self) -> usize {
        match self.config.interface {
            LineInterface::HeaderData => self.aligner.offset(),
            LineInterface::Serial => (self.aligner.offset() + self.serial.offset()) % BLOCK_BITS,
        }
    }

    /// Sets the block aligner offset.
    pub fn set_bit_offset(&mut self, offset: usize) { self.aligner.set_offset(offset); }

    /// Returns true in the first cycle of the gearbox sequence.
    pub fn gbx_sync(&self) -> bool { self.gbx_sync }

    /// Returns the encoder counters.
    pub fn stats(&self) -> EncoderStats { self.encoder.stats() }

    /// Produces the next interface word.
    ///
    /// `slip` moves the transmit bit offset by one. On the header/data interface it is sampled
    /// when a new block starts; on the serial interface it drops one line bit this cycle.
    pub fn tick(&mut self, slip: bool) -> SerdesWord {
        if let Some(gearbox) = &mut self.gearbox {
            let stall = gearbox.advance();
            self.gbx_sync = gearbox.at_start();
            if stall {
                return SerdesWord::STALL;
            }
        }

        let width = self.config.width;
        let Self { xgmii, encoder, aligner, serial, .. } = self;

        match self.config.interface {
            LineInterface::HeaderData => {
                let pack_count = self.config.pack_count();
                let first = self.pack_seq == 0;
                if first {
                    if slip {
                        aligner.slip();
                    }
                    self.block = next_block(xgmii, encoder, aligner);
                    self.pack_seq = pack_count;
                }

                let mut data = (self.block.data >> (width * (pack_count - self.pack_seq))) & mask_u64(width);
                self.pack_seq -= 1;
                if self.config.reverse {
                    data = bit_reverse(data, width);
                }

                if first {
                    let hdr = if self.config.reverse { bit_reverse(u64::from(self.block.hdr), 2) as u8 } else { self.block.hdr };
                    SerdesWord::with_header(data, hdr)
                } else {
                    SerdesWord::data_only(data)
                }
            }
            LineInterface::Serial => {
                if slip {
                    serial.slip(|| next_block(xgmii, encoder, aligner).to_bits());
                }
                let mut data = serial.pop(width, || next_block(xgmii, encoder, aligner).to_bits());
                if self.config.reverse {
                    data = bit_reverse(data, width);
                }
                SerdesWord::data_only(data)
            }
        }
    }

    /// Returns the transmit path to its initial state. Queued frames are kept; a frame being
    /// sent is dropped.
    pub fn reset(&mut self) {
        self.xgmii.reset();
        self.encoder.reset();
        self.aligner.reset();
        self.serial.reset();
        if let Some(gearbox) = &mut self.gearbox {
            gearbox.reset();
        }
        self.gbx_sync = false;
        self.block = Block::default();
        self.pack_seq = 0;
    }
}

pub(crate) fn log_config(side: &str, config: &CodecConfig) {
    info!("BASE-R serdes {} model configuration", side);
    info!("  Interface: {:?}", config.interface);
    info!("  Data width: {} bits", config.width);
    info!("  Enable scrambler: {}", config.scramble);
    info!("  Bit reverse: {}", config.reverse);
    match &config.gearbox {
        Some(gearbox) => {
            let (line_bits, block_bits) = gearbox.ratio();
            info!("  Gearbox ratio: {}:{} over {} cycles", line_bits, block_bits, gearbox.seq_len());
        }
        None => info!("  Gearbox disabled"),
    }
}
