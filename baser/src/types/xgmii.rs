//! XGMII lane vectors.

use std::fmt;

use itertools::izip;

use crate::constants::{xgmii_ctrl, LANES};

/// One XGMII cycle: eight (byte, control) lanes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct XgmiiLanes {
    /// Lane bytes.
    pub data: [u8; LANES],
    /// Lane control flags.
    pub ctrl: [bool; LANES],
}

impl XgmiiLanes {
    /// All lanes IDLE.
    pub const IDLE: Self = Self::fill_ctrl(xgmii_ctrl::IDLE);

    /// All lanes ERROR.
    pub const ERROR: Self = Self::fill_ctrl(xgmii_ctrl::ERROR);

    /// Creates a lane vector.
    pub const fn new(data: [u8; LANES], ctrl: [bool; LANES]) -> Self { Self { data, ctrl } }

    /// Creates a lane vector of ordinary data bytes.
    pub const fn from_data(data: [u8; LANES]) -> Self { Self { data, ctrl: [false; LANES] } }

    /// Creates a lane vector with every lane holding the control character `c`.
    pub const fn fill_ctrl(c: u8) -> Self { Self { data: [c; LANES], ctrl: [true; LANES] } }

    /// Creates a lane vector from `(byte, control)` pairs.
    pub fn from_pairs(pairs: [(u8, bool); LANES]) -> Self {
        let mut lanes = Self::IDLE;
        for (i, (d, c)) in pairs.into_iter().enumerate() {
            lanes.data[i] = d;
            lanes.ctrl[i] = c;
        }
        lanes
    }

    /// Returns the lanes as `(byte, control)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (u8, bool)> + '_ {
        izip!(self.data.iter().copied(), self.ctrl.iter().copied())
    }

    /// Returns true if `lane` carries the control character `c`.
    #[inline]
    pub fn is_ctrl_char(&self, lane: usize, c: u8) -> bool { self.ctrl[lane] && self.data[lane] == c }

    /// Returns true if `lane` carries a sequence or signal ordered set.
    #[inline]
    pub fn is_ordered_set(&self, lane: usize) -> bool {
        self.is_ctrl_char(lane, xgmii_ctrl::SEQ_OS) || self.is_ctrl_char(lane, xgmii_ctrl::SIG_OS)
    }

    /// Returns true if any lane in `range` is a control lane.
    #[inline]
    pub fn any_ctrl(&self, range: std::ops::Range<usize>) -> bool { self.ctrl[range].iter().any(|c| *c) }

    /// Returns true if no lane is a control lane.
    #[inline]
    pub fn is_data(&self) -> bool { !self.any_ctrl(0..LANES) }

    /// Returns the data lanes packed little endian.
    pub fn data_u64(&self) -> u64 { u64::from_le_bytes(self.data) }
}

impl Default for XgmiiLanes {
    fn default() -> Self { Self::IDLE }
}

impl fmt::Debug for XgmiiLanes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("XgmiiLanes[")?;
        for (i, (d, c)) in self.pairs().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if c {
                write!(f, "C{:02x}", d)?;
            } else {
                write!(f, "{:02x}", d)?;
            }
        }
        f.write_str("]")
    }
}
