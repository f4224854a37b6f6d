//! Constants for the 10GBASE-R line code.

use static_assertions::*;

/// Number of XGMII lanes carried by one 64b/66b block.
pub const LANES: usize = 8;

/// Number of bits in one 64b/66b block (sync header and payload).
pub const BLOCK_BITS: usize = 66;

/// Number of payload bits in one block.
pub const PAYLOAD_BITS: usize = 64;

/// Number of sync header bits in one block.
pub const HEADER_BITS: usize = 2;

const_assert_eq!(PAYLOAD_BITS + HEADER_BITS, BLOCK_BITS);
const_assert_eq!(LANES * 8, PAYLOAD_BITS);

/// Ethernet preamble bytes.
pub mod eth_pre {
    /// Preamble byte.
    pub const PRE: u8 = 0x55;
    /// Start frame delimiter.
    pub const SFD: u8 = 0xd5;
    /// Number of preamble bytes before the SFD.
    pub const PRE_LEN: usize = 7;
    /// Length of the frame check sequence.
    pub const FCS_LEN: usize = 4;
}

/// XGMII control characters.
#[allow(missing_docs)]
pub mod xgmii_ctrl {
    pub const IDLE: u8 = 0x07;
    pub const LPI: u8 = 0x06;
    pub const START: u8 = 0xfb;
    pub const TERM: u8 = 0xfd;
    pub const ERROR: u8 = 0xfe;
    pub const SEQ_OS: u8 = 0x9c;
    pub const RES_0: u8 = 0x1c;
    pub const RES_1: u8 = 0x3c;
    pub const RES_2: u8 = 0x7c;
    pub const RES_3: u8 = 0xbc;
    pub const RES_4: u8 = 0xdc;
    pub const RES_5: u8 = 0xf7;
    pub const SIG_OS: u8 = 0x5c;
}

/// 7-bit BASE-R control codes.
#[allow(missing_docs)]
pub mod baser_ctrl {
    pub const IDLE: u8 = 0x00;
    pub const LPI: u8 = 0x06;
    pub const ERROR: u8 = 0x1e;
    pub const RES_0: u8 = 0x2d;
    pub const RES_1: u8 = 0x33;
    pub const RES_2: u8 = 0x4b;
    pub const RES_3: u8 = 0x55;
    pub const RES_4: u8 = 0x66;
    pub const RES_5: u8 = 0x78;
}

/// 4-bit BASE-R ordered set codes.
#[allow(missing_docs)]
pub mod baser_o {
    pub const SEQ_OS: u8 = 0x0;
    pub const SIG_OS: u8 = 0xf;
}

/// Sync header values, bit 0 first on the wire.
#[allow(missing_docs)]
pub mod baser_sync {
    pub const DATA: u8 = 0b10;
    pub const CTRL: u8 = 0b01;
}

macro_rules! term_block_types {
    ($($lane:literal => $tag:literal),* $(,)?) => {
        ::paste::paste! {
            $(
                #[doc = "Terminate in lane " $lane "."]
                pub const [<TERM_ $lane>]: u8 = $tag;
            )*

            /// Terminate block types, indexed by terminating lane.
            pub const TERM: [u8; $crate::constants::LANES] = [$($tag),*];
        }
    };
}

/// Block type tags (first payload byte of a control block).
pub mod block_type {
    /// All control.
    pub const CTRL: u8 = 0x1e;
    /// Control in lanes 0-3, ordered set in lane 4.
    pub const OS_4: u8 = 0x2d;
    /// Control in lanes 0-3, start in lane 4.
    pub const START_4: u8 = 0x33;
    /// Ordered set in lane 0, start in lane 4.
    pub const OS_START: u8 = 0x66;
    /// Ordered sets in lanes 0 and 4.
    pub const OS_04: u8 = 0x55;
    /// Start in lane 0.
    pub const START_0: u8 = 0x78;
    /// Ordered set in lane 0, control in lanes 4-7.
    pub const OS_0: u8 = 0x4b;

    term_block_types! {
        0 => 0x87,
        1 => 0x99,
        2 => 0xaa,
        3 => 0xb4,
        4 => 0xcc,
        5 => 0xd2,
        6 => 0xe1,
        7 => 0xff,
    }
}

/// Constants for the scrambler.
pub mod scrambler {
    /// Low feedback tap (x^39).
    pub const TAP_LOW: usize = 38;
    /// High feedback tap (x^58).
    pub const TAP_HIGH: usize = 57;
    /// Register width.
    pub const WIDTH: usize = 58;
    /// Reset value shared by both ends of the link.
    pub const INITIAL_STATE: u64 = 0;

    use static_assertions::*;
    const_assert!(TAP_LOW < TAP_HIGH);
    const_assert!(TAP_HIGH < WIDTH);
    const_assert!(WIDTH <= 64);
}

/// Constants for the XGMII frame source.
pub mod framing {
    /// Inter-frame gap in bytes.
    pub const IFG: usize = 12;
    /// Deficit idle count enabled.
    pub const ENABLE_DIC: bool = true;
}

/// Constants for the receive block lock and BER monitor.
pub mod block_lock {
    /// Valid sync headers in a row required to acquire block lock.
    pub const LOCK_COUNT: usize = 64;
    /// Invalid sync headers within `LOCK_COUNT` headers that drop block lock.
    pub const UNLOCK_INVALID_COUNT: usize = 16;
    /// Blocks to wait after a bit slip before testing headers again.
    pub const SLIP_HOLDOFF: usize = 7;
    /// Blocks in a 125 us BER window at 156.25 MHz.
    pub const COUNT_125US: usize = 19531;
    /// Invalid sync headers within one BER window that assert high BER.
    pub const BER_THRESHOLD: usize = 16;

    use static_assertions::*;
    const_assert!(UNLOCK_INVALID_COUNT <= LOCK_COUNT);
    const_assert!(BER_THRESHOLD > 0);
}

/// Data widths accepted by the header/data interface.
pub const HEADER_DATA_WIDTHS: [usize; 4] = [8, 16, 32, 64];
