//! Errors.

use thiserror::Error;

/// Configuration errors, raised once when a source or sink is built.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported data width: {width} bits")]
    BadWidth { width: usize },

    #[error("gearbox sequence is empty")]
    EmptyGearboxSequence,

    #[error("stall cycle {cycle} is outside of the {seq_len}-cycle gearbox sequence")]
    BadStallCycle { cycle: usize, seq_len: usize },

    #[error(
        "gearbox sequence of {seq_len} cycles with {stall_cycles} stalls does not reconcile {in_bits}:{out_bits}"
    )]
    BadGearboxRatio { seq_len: usize, stall_cycles: usize, in_bits: usize, out_bits: usize },

    #[error("bad scrambler taps {tap_low}/{tap_high} for a {width}-bit register")]
    BadScramblerTaps { tap_low: usize, tap_high: usize, width: usize },

    #[error("bad block lock configuration: {0}")]
    BadBlockLock(String),
}

/// Line coding errors found while decoding.
///
/// These never leave the receive pipeline. They are counted in
/// [`DecoderStats`](crate::decoder::DecoderStats) and the affected lanes are replaced with
/// ERROR control characters.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid sync header {0:#04b}")]
    BadSyncHeader(u8),

    #[error("invalid block type {0:#04x}")]
    BadBlockType(u8),

    #[error("terminate without a frame in progress")]
    FrameTermWithoutData,
}

/// Errors returned when queueing a frame for transmission.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("transmit queue is full")]
    QueueFull,

    #[error("frame does not begin with a preamble byte")]
    MissingPreamble,
}
