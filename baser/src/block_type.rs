//! Block type classification and the XGMII/BASE-R control code tables.
//!
//! Control block payload layouts, most significant byte first (`BT` is the tag in byte 0,
//! `Cn` a 7-bit control code for lane n, `On` a 4-bit ordered set code, `Dn` a data byte):
//!
//! ```text
//! CTRL      C7 C6 C5 C4 C3 C2 C1 C0 BT
//! OS_4      D7 D6 D5 O4 C3 C2 C1 C0 BT
//! START_4   D7 D6 D5    C3 C2 C1 C0 BT
//! OS_START  D7 D6 D5    O0 D3 D2 D1 BT
//! OS_04     D7 D6 D5 O4 O0 D3 D2 D1 BT
//! START_0   D7 D6 D5 D4 D3 D2 D1    BT
//! OS_0      C7 C6 C5 C4 O0 D3 D2 D1 BT
//! TERM_0    C7 C6 C5 C4 C3 C2 C1    BT
//! TERM_1    C7 C6 C5 C4 C3 C2    D0 BT
//! ...
//! TERM_7       D6 D5 D4 D3 D2 D1 D0 BT
//! ```

use crate::constants::{baser_ctrl, baser_o, block_type, xgmii_ctrl, LANES};
use crate::error::DecodeError;
use crate::types::{Block, SyncHeader, XgmiiLanes};
use crate::utils::mask_u64;

/// Control block types.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Ctrl,
    Os4,
    Start4,
    OsStart,
    Os04,
    Start0,
    Os0,
    Term0,
    Term1,
    Term2,
    Term3,
    Term4,
    Term5,
    Term6,
    Term7,
}

/// Block contents as classified from an XGMII lane vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Data block.
    Data,
    /// Control block with the given type.
    Ctrl(BlockType),
}

/// Result of encoding one lane vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedBlock {
    /// Unscrambled block.
    pub block: Block,
    /// Block contents.
    pub kind: BlockKind,
    /// No rule matched; the lanes were sent as an all-control block with data lanes replaced by
    /// ERROR.
    pub fallback: bool,
}

impl BlockType {
    /// Every block type.
    pub const ALL: [BlockType; 15] = [
        Self::Ctrl,
        Self::Os4,
        Self::Start4,
        Self::OsStart,
        Self::Os04,
        Self::Start0,
        Self::Os0,
        Self::Term0,
        Self::Term1,
        Self::Term2,
        Self::Term3,
        Self::Term4,
        Self::Term5,
        Self::Term6,
        Self::Term7,
    ];

    /// Classification order for control lane vectors. The first type whose pattern matches
    /// wins, so the order is part of the encoding: START before ordered sets (a START in lane 4
    /// absorbs an ordered set in lane 0 into `OsStart`), ordered sets before TERM, and `Ctrl`
    /// last so that a TERM followed by idles is never folded into an all-control block.
    pub const PRIORITY: [BlockType; 15] = [
        Self::Start0,
        Self::OsStart,
        Self::Start4,
        Self::Os04,
        Self::Os0,
        Self::Os4,
        Self::Term0,
        Self::Term1,
        Self::Term2,
        Self::Term3,
        Self::Term4,
        Self::Term5,
        Self::Term6,
        Self::Term7,
        Self::Ctrl,
    ];

    const TERMS: [BlockType; LANES] = [
        Self::Term0,
        Self::Term1,
        Self::Term2,
        Self::Term3,
        Self::Term4,
        Self::Term5,
        Self::Term6,
        Self::Term7,
    ];

    /// Returns the terminate block type for `lane`.
    pub fn term(lane: usize) -> Option<Self> { Self::TERMS.get(lane).copied() }

    /// Returns the terminating lane of a terminate block type.
    pub fn term_lane(self) -> Option<usize> { Self::TERMS.iter().position(|t| *t == self) }

    /// Returns the block type tag.
    pub fn tag(self) -> u8 {
        match self {
            Self::Ctrl => block_type::CTRL,
            Self::Os4 => block_type::OS_4,
            Self::Start4 => block_type::START_4,
            Self::OsStart => block_type::OS_START,
            Self::Os04 => block_type::OS_04,
            Self::Start0 => block_type::START_0,
            Self::Os0 => block_type::OS_0,
            term => block_type::TERM[term.term_lane().unwrap_or_default()],
        }
    }

    /// Parses a block type tag.
    pub fn from_tag(tag: u8) -> Option<Self> { Self::ALL.iter().copied().find(|t| t.tag() == tag) }

    /// Returns true if the control lane vector `l` has this block type's pattern.
    pub fn matches(self, l: &XgmiiLanes) -> bool {
        match self {
            Self::Start0 => l.is_ctrl_char(0, xgmii_ctrl::START) && !l.any_ctrl(1..8),
            Self::OsStart => {
                l.is_ctrl_char(4, xgmii_ctrl::START) && !l.any_ctrl(5..8) && l.is_ordered_set(0) && !l.any_ctrl(1..4)
            }
            Self::Start4 => l.is_ctrl_char(4, xgmii_ctrl::START) && !l.any_ctrl(5..8),
            Self::Os04 => l.is_ordered_set(0) && !l.any_ctrl(1..4) && l.is_ordered_set(4) && !l.any_ctrl(5..8),
            Self::Os0 => l.is_ordered_set(0) && !l.any_ctrl(1..4),
            Self::Os4 => l.is_ordered_set(4) && !l.any_ctrl(5..8),
            Self::Ctrl => l.ctrl.iter().all(|c| *c),
            term => match term.term_lane() {
                Some(lane) => l.is_ctrl_char(lane, xgmii_ctrl::TERM) && !l.any_ctrl(0..lane),
                None => false,
            },
        }
    }
}

/// Maps an XGMII control character to its 7-bit BASE-R code.
pub fn xgmii_to_baser(c: u8) -> u8 {
    match c {
        xgmii_ctrl::IDLE => baser_ctrl::IDLE,
        xgmii_ctrl::LPI => baser_ctrl::LPI,
        xgmii_ctrl::ERROR => baser_ctrl::ERROR,
        xgmii_ctrl::RES_0 => baser_ctrl::RES_0,
        xgmii_ctrl::RES_1 => baser_ctrl::RES_1,
        xgmii_ctrl::RES_2 => baser_ctrl::RES_2,
        xgmii_ctrl::RES_3 => baser_ctrl::RES_3,
        xgmii_ctrl::RES_4 => baser_ctrl::RES_4,
        xgmii_ctrl::RES_5 => baser_ctrl::RES_5,
        _ => baser_ctrl::ERROR,
    }
}

/// Maps a 7-bit BASE-R code to its XGMII control character.
pub fn baser_to_xgmii(c: u8) -> u8 {
    match c & 0x7f {
        baser_ctrl::IDLE => xgmii_ctrl::IDLE,
        baser_ctrl::LPI => xgmii_ctrl::LPI,
        baser_ctrl::ERROR => xgmii_ctrl::ERROR,
        baser_ctrl::RES_0 => xgmii_ctrl::RES_0,
        baser_ctrl::RES_1 => xgmii_ctrl::RES_1,
        baser_ctrl::RES_2 => xgmii_ctrl::RES_2,
        baser_ctrl::RES_3 => xgmii_ctrl::RES_3,
        baser_ctrl::RES_4 => xgmii_ctrl::RES_4,
        baser_ctrl::RES_5 => xgmii_ctrl::RES_5,
        _ => xgmii_ctrl::ERROR,
    }
}

fn ordered_set_code(c: u8) -> u64 {
    if c == xgmii_ctrl::SIG_OS {
        u64::from(baser_o::SIG_OS)
    } else {
        u64::from(baser_o::SEQ_OS)
    }
}

fn ordered_set_char(o: u8) -> u8 {
    match o & 0xf {
        baser_o::SEQ_OS => xgmii_ctrl::SEQ_OS,
        baser_o::SIG_OS => xgmii_ctrl::SIG_OS,
        _ => xgmii_ctrl::ERROR,
    }
}

/// Packs the 7-bit codes of all lanes, lane n at bit 7n. Data lanes pack as ERROR.
fn ctrl_codes(l: &XgmiiLanes) -> u64 {
    l.pairs()
        .enumerate()
        .map(|(i, (d, c))| u64::from(if c { xgmii_to_baser(d) } else { baser_ctrl::ERROR }) << (7 * i))
        .fold(0, |acc, code| acc | code)
}

/// Packs data lanes `lanes` of `l` into payload bytes starting at byte `at`.
fn data_bytes(l: &XgmiiLanes, lanes: std::ops::Range<usize>, at: usize) -> u64 {
    lanes.enumerate().map(|(k, lane)| u64::from(l.data[lane]) << (8 * (at + k))).fold(0, |acc, b| acc | b)
}

/// Classifies a lane vector. Returns `None` if no block type matches.
pub fn classify(l: &XgmiiLanes) -> Option<BlockKind> {
    if l.is_data() {
        return Some(BlockKind::Data);
    }
    BlockType::PRIORITY.iter().copied().find(|t| t.matches(l)).map(BlockKind::Ctrl)
}

/// Builds the control block payload of type `t` from `l`.
///
/// `l` should match `t`; lanes that do not fit the layout are dropped or sent as ERROR.
pub fn encode_ctrl(t: BlockType, l: &XgmiiLanes) -> u64 {
    let tag = u64::from(t.tag());
    let ctrl = ctrl_codes(l);
    let ctrl_0_3 = ctrl & mask_u64(28);
    let ctrl_4_7 = ctrl & (mask_u64(28) << 28);

    match t {
        BlockType::Ctrl => tag | ctrl << 8,
        BlockType::Start0 => tag | data_bytes(l, 1..8, 1),
        BlockType::OsStart => {
            tag | data_bytes(l, 1..4, 1) | ordered_set_code(l.data[0]) << 32 | data_bytes(l, 5..8, 5)
        }
        BlockType::Start4 => tag | ctrl_0_3 << 8 | data_bytes(l, 5..8, 5),
        BlockType::Os04 => {
            tag | data_bytes(l, 1..4, 1)
                | ordered_set_code(l.data[0]) << 32
                | ordered_set_code(l.data[4]) << 36
                | data_bytes(l, 5..8, 5)
        }
        BlockType::Os0 => tag | data_bytes(l, 1..4, 1) | ordered_set_code(l.data[0]) << 32 | ctrl_4_7 << 8,
        BlockType::Os4 => tag | ctrl_0_3 << 8 | ordered_set_code(l.data[4]) << 36 | data_bytes(l, 5..8, 5),
        term => {
            let lane = term.term_lane().unwrap_or_default();
            let ctrl_after = ctrl & mask_u64(56) & !mask_u64(7 * (lane + 1));
            tag | data_bytes(l, 0..lane, 1) | ctrl_after << 8
        }
    }
}

/// Encodes one lane vector into an unscrambled block.
pub fn encode_lanes(l: &XgmiiLanes) -> EncodedBlock {
    match classify(l) {
        Some(BlockKind::Data) => {
            EncodedBlock { block: Block::new(SyncHeader::Data, l.data_u64()), kind: BlockKind::Data, fallback: false }
        }
        Some(BlockKind::Ctrl(t)) => EncodedBlock {
            block: Block::new(SyncHeader::Ctrl, encode_ctrl(t, l)),
            kind: BlockKind::Ctrl(t),
            fallback: false,
        },
        None => EncodedBlock {
            block: Block::new(SyncHeader::Ctrl, encode_ctrl(BlockType::Ctrl, l)),
            kind: BlockKind::Ctrl(BlockType::Ctrl),
            fallback: true,
        },
    }
}

/// Decodes one descrambled block into a lane vector.
pub fn decode_block(block: Block) -> Result<XgmiiLanes, DecodeError> {
    let data = block.data;
    let db = data.to_le_bytes();
    let ctrl = |lane: usize| baser_to_xgmii((data >> (7 * lane + 8)) as u8);

    let t = match block.sync_header() {
        None => return Err(DecodeError::BadSyncHeader(block.hdr)),
        Some(SyncHeader::Data) => return Ok(XgmiiLanes::from_data(db)),
        Some(SyncHeader::Ctrl) => BlockType::from_tag(db[0]).ok_or(DecodeError::BadBlockType(db[0]))?,
    };

    let mut l = XgmiiLanes::IDLE;
    let set_ctrl = |l: &mut XgmiiLanes, lane: usize, c: u8| {
        l.data[lane] = c;
        l.ctrl[lane] = true;
    };
    let set_data = |l: &mut XgmiiLanes, lane: usize, d: u8| {
        l.data[lane] = d;
        l.ctrl[lane] = false;
    };

    match t {
        BlockType::Ctrl => (0..8).for_each(|i| set_ctrl(&mut l, i, ctrl(i))),
        BlockType::Os4 => {
            (0..4).for_each(|i| set_ctrl(&mut l, i, ctrl(i)));
            set_ctrl(&mut l, 4, ordered_set_char(db[4] >> 4));
            (5..8).for_each(|i| set_data(&mut l, i, db[i]));
        }
        BlockType::Start4 => {
            (0..4).for_each(|i| set_ctrl(&mut l, i, ctrl(i)));
            set_ctrl(&mut l, 4, xgmii_ctrl::START);
            (5..8).for_each(|i| set_data(&mut l, i, db[i]));
        }
        BlockType::OsStart => {
            set_ctrl(&mut l, 0, ordered_set_char(db[4]));
            (1..4).for_each(|i| set_data(&mut l, i, db[i]));
            set_ctrl(&mut l, 4, xgmii_ctrl::START);
            (5..8).for_each(|i| set_data(&mut l, i, db[i]));
        }
        BlockType::Os04 => {
            set_ctrl(&mut l, 0, ordered_set_char(db[4]));
            (1..4).for_each(|i| set_data(&mut l, i, db[i]));
            set_ctrl(&mut l, 4, ordered_set_char(db[4] >> 4));
            (5..8).for_each(|i| set_data(&mut l, i, db[i]));
        }
        BlockType::Start0 => {
            set_ctrl(&mut l, 0, xgmii_ctrl::START);
            (1..8).for_each(|i| set_data(&mut l, i, db[i]));
        }
        BlockType::Os0 => {
            set_ctrl(&mut l, 0, ordered_set_char(db[4]));
            (1..4).for_each(|i| set_data(&mut l, i, db[i]));
            (4..8).for_each(|i| set_ctrl(&mut l, i, ctrl(i)));
        }
        term => {
            let lane = term.term_lane().unwrap_or_default();
            (0..lane).for_each(|i| set_data(&mut l, i, db[i + 1]));
            set_ctrl(&mut l, lane, xgmii_ctrl::TERM);
            (lane + 1..8).for_each(|i| set_ctrl(&mut l, i, ctrl(i)));
        }
    }

    Ok(l)
}
