//! Frame check sequence.
//!
//! The codec itself never looks at frame contents. Received frames expose
//! [`XgmiiFrame::check_fcs_with`](crate::types::XgmiiFrame::check_fcs_with) so a MAC model can
//! plug in its own check; [`Crc32`] is the IEEE 802.3 CRC used by default.

/// A frame check sequence algorithm.
pub trait Fcs {
    /// Computes the FCS over `data`.
    fn compute(&self, data: &[u8]) -> u32;

    /// Returns true if the last four bytes of `data` are a valid little-endian FCS over the
    /// bytes before them.
    fn verify(&self, data: &[u8]) -> bool {
        if data.len() < 4 {
            return false;
        }
        let (body, fcs) = data.split_at(data.len() - 4);
        let expected = u32::from_le_bytes([fcs[0], fcs[1], fcs[2], fcs[3]]);
        self.compute(body) == expected
    }
}

/// Ethernet CRC-32.
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32;

impl Fcs for Crc32 {
    fn compute(&self, data: &[u8]) -> u32 { crc32fast::hash(data) }
}
