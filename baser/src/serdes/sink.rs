//! SERDES receive model.

use std::collections::VecDeque;

use log::warn;

use crate::config::{CodecConfig, LineInterface};
use crate::constants::BLOCK_BITS;
use crate::decoder::deframer::Deframer;
use crate::decoder::{Decoder, DecoderStats};
use crate::error::ConfigError;
use crate::fsm::Fsm;
use crate::gearbox::{BitAligner, GearboxSeq, SerialDegearbox};
use crate::types::{Block, SerdesWord, XgmiiFrame};
use crate::utils::bit_reverse;

use super::source::log_config;

/// Receives frames from a SERDES interface, one word per [`SerdesSink::tick`].
#[derive(Debug, Clone)]
pub struct SerdesSink {
    config: CodecConfig,
    decoder: Decoder,
    deframer: Deframer,
    aligner: BitAligner,
    serial: SerialDegearbox,
    /// Stall request generator and receive sequence.
    gearbox: Option<(GearboxSeq, GearboxSeq)>,
    sync_bad: bool,
    data: u64,
    hdr: u8,
    pack_seq: usize,
    queue: VecDeque<XgmiiFrame>,
}

impl SerdesSink {
    /// Creates a sink.
    pub fn new(config: CodecConfig) -> Result<Self, ConfigError> {
        let decoder = Decoder::new(&config)?;
        log_config("sink", &config);

        Ok(Self {
            gearbox: config.gearbox.clone().map(|c| (GearboxSeq::new(c.clone()), GearboxSeq::new(c))),
            config,
            decoder,
            deframer: Deframer::new(),
            aligner: BitAligner::new(),
            serial: SerialDegearbox::new(),
            sync_bad: true,
            data: 0,
            hdr: 0,
            pack_seq: 0,
            queue: VecDeque::new(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CodecConfig { &self.config }

    /// Takes the oldest received frame.
    pub fn recv(&mut self) -> Option<XgmiiFrame> { self.queue.pop_front() }

    /// Returns the number of received frames not yet taken.
    pub fn count(&self) -> usize { self.queue.len() }

    /// Returns true if no received frame is waiting.
    pub fn is_empty(&self) -> bool { self.queue.is_empty() }

    /// Drops every received frame.
    pub fn clear(&mut self) { self.queue.clear(); }

    /// Returns true while block lock is held.
    pub fn block_lock(&self) -> bool { self.decoder.block_lock() }

    /// Returns the high BER flag.
    pub fn high_ber(&self) -> bool { self.decoder.high_ber() }

    /// Returns the receive bit offset, in `[0, 66)`.
    pub fn bit_offset(&self) -> usize {
        match self.config.interface {
            LineInterface::HeaderData => self.aligner.offset(),
            LineInterface::Serial => (self.aligner.offset() + self.serial.offset()) % BLOCK_BITS,
        }
    }

    /// Sets the block aligner offset. A stream sent at offset `k` is realigned at `66 - k`.
    pub fn set_bit_offset(&mut self, offset: usize) { self.aligner.set_offset(offset); }

    /// Returns true if the sink asks for a stall in the next cycle.
    pub fn req_stall(&self) -> bool { self.gearbox.as_ref().map_or(false, |(req, _)| req.next_is_stall()) }

    /// Returns the receive counters.
    pub fn stats(&self) -> DecoderStats {
        let frames = self.deframer.stats();
        DecoderStats {
            term_without_frame: frames.term_without_frame,
            frames: frames.frames,
            error_frames: frames.error_frames,
            ..self.decoder.stats()
        }
    }

    /// Consumes one interface word.
    pub fn tick(&mut self, word: SerdesWord) { self.tick_with_sync(word, false) }

    /// Consumes one interface word. `gbx_sync` restarts the gearbox sequence at this cycle.
    pub fn tick_with_sync(&mut self, word: SerdesWord, gbx_sync: bool) {
        if let Some((req, seq)) = &mut self.gearbox {
            req.advance();
            let mut stall = seq.advance();
            if gbx_sync {
                seq.sync();
                stall = seq.is_stall();
            }
            if stall {
                return;
            }
        }

        if !word.data_valid {
            if self.gearbox.is_some() && !self.sync_bad {
                self.sync_bad = true;
                warn!("data not valid outside of gearbox stall cycle");
            }
            return;
        }
        self.sync_bad = false;

        let width = self.config.width;
        let (data, hdr) = if self.config.reverse {
            (bit_reverse(word.data, width), bit_reverse(u64::from(word.hdr), 2) as u8)
        } else {
            (word.data, word.hdr)
        };

        match self.config.interface {
            LineInterface::HeaderData => {
                let pack_count = self.config.pack_count();
                if pack_count == 1 {
                    self.process_block(Block { hdr, data });
                    return;
                }

                if word.hdr_valid {
                    self.data = data;
                    self.hdr = hdr;
                    self.pack_seq = 1;
                    return;
                }

                self.data |= data << (width * self.pack_seq);
                self.pack_seq += 1;
                if self.pack_seq == pack_count {
                    self.pack_seq = 0;
                    self.process_block(Block { hdr: self.hdr, data: self.data });
                }
            }
            LineInterface::Serial => {
                for bits in self.serial.push(data, width) {
                    self.process_block(Block::from_bits(bits));
                }
            }
        }
    }

    fn process_block(&mut self, block: Block) {
        let lanes = self.decoder.step(self.aligner.align(block));
        if self.decoder.take_slip() {
            match self.config.interface {
                LineInterface::HeaderData => self.aligner.slip(),
                LineInterface::Serial => self.serial.slip(),
            }
        }
        self.queue.extend(self.deframer.step(lanes));
    }

    /// Returns the receive path to its initial state. A frame being received is dropped;
    /// frames already received stay queued.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.deframer.reset();
        self.aligner.reset();
        self.serial.reset();
        if let Some((req, seq)) = &mut self.gearbox {
            req.reset();
            seq.reset();
        }
        self.sync_bad = true;
        self.data = 0;
        self.hdr = 0;
        self.pack_seq = 0;
    }
}
