//! Codec configuration.

use crate::constants::{HEADER_DATA_WIDTHS, PAYLOAD_BITS};
use crate::decoder::block_lock::BlockLockConfig;
use crate::error::ConfigError;
use crate::gearbox::GearboxConfig;
use crate::scrambler::ScramblerConfig;

/// SERDES interface kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineInterface {
    /// 2-bit sync header plus `width` data bits. A block spans `64 / width` cycles.
    #[default]
    HeaderData,
    /// `width` raw line bits per cycle.
    Serial,
}

/// Configuration shared by [`SerdesSource`](crate::serdes::SerdesSource) and
/// [`SerdesSink`](crate::serdes::SerdesSink).
///
/// Both ends of a link should be built from equal configurations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Bits per interface word.
    pub width: usize,
    /// Interface kind.
    pub interface: LineInterface,
    /// Scramble on transmit and descramble on receive.
    pub scramble: bool,
    /// Reverse the bit order of each interface word and header.
    pub reverse: bool,
    /// Gearbox sequence, or `None` for one word every cycle.
    pub gearbox: Option<GearboxConfig>,
    /// Scrambler register.
    pub scrambler: ScramblerConfig,
    /// Receive block lock and BER monitor, or `None` to trust the incoming alignment.
    pub block_lock: Option<BlockLockConfig>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            width: PAYLOAD_BITS,
            interface: LineInterface::HeaderData,
            scramble: true,
            reverse: false,
            gearbox: None,
            scrambler: ScramblerConfig::default(),
            block_lock: None,
        }
    }
}

impl CodecConfig {
    /// Sets the interface width.
    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Sets the interface kind.
    pub fn interface(mut self, interface: LineInterface) -> Self {
        self.interface = interface;
        self
    }

    /// Enables or disables scrambling.
    pub fn scramble(mut self, scramble: bool) -> Self {
        self.scramble = scramble;
        self
    }

    /// Enables or disables bit reversal.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Sets the gearbox sequence.
    pub fn gearbox(mut self, gearbox: GearboxConfig) -> Self {
        self.gearbox = Some(gearbox);
        self
    }

    /// Sets the scrambler register.
    pub fn scrambler(mut self, scrambler: ScramblerConfig) -> Self {
        self.scrambler = scrambler;
        self
    }

    /// Enables receive block lock.
    pub fn block_lock(mut self, block_lock: BlockLockConfig) -> Self {
        self.block_lock = Some(block_lock);
        self
    }

    /// Number of cycles that carry one block on the header/data interface.
    pub fn pack_count(&self) -> usize {
        match self.interface {
            LineInterface::HeaderData => PAYLOAD_BITS / self.width,
            LineInterface::Serial => 1,
        }
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let width_ok = match self.interface {
            LineInterface::HeaderData => HEADER_DATA_WIDTHS.contains(&self.width),
            LineInterface::Serial => (1..=PAYLOAD_BITS).contains(&self.width),
        };
        if !width_ok {
            return Err(ConfigError::BadWidth { width: self.width });
        }

        self.scrambler.validate()?;

        if let Some(block_lock) = &self.block_lock {
            block_lock.validate()?;
        }

        Ok(())
    }
}
