//! XGMII frames.

use std::fmt;

use crate::constants::eth_pre::*;
use crate::fcs::{Crc32, Fcs};

/// A frame as seen on XGMII: preamble, SFD, payload and FCS.
///
/// Received frames keep the first preamble byte (the START lane is replaced by `PRE`), so a
/// frame built with [`XgmiiFrame::from_payload`] compares equal to its decoded counterpart.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct XgmiiFrame {
    /// Frame bytes, starting with the preamble.
    pub data: Vec<u8>,
    /// Per-byte control flags. `None` when every byte is ordinary data.
    pub ctrl: Option<Vec<bool>>,
    /// Lane holding START when the frame was sent or received.
    pub start_lane: usize,
    /// The frame was closed by a control character other than TERM.
    pub error: bool,
}

impl XgmiiFrame {
    /// Creates a frame from raw bytes, preamble included.
    pub fn new(data: Vec<u8>) -> Self { Self { data, ..Default::default() } }

    /// Creates a frame with preamble, SFD and FCS around `payload`.
    pub fn from_payload(payload: &[u8]) -> Self { Self::from_payload_with(payload, &Crc32) }

    /// Creates a frame with preamble, SFD and an FCS computed by `fcs`.
    pub fn from_payload_with<F: Fcs>(payload: &[u8], fcs: &F) -> Self {
        let mut data = Vec::with_capacity(PRE_LEN + 1 + payload.len() + FCS_LEN);
        data.extend(std::iter::repeat(PRE).take(PRE_LEN));
        data.push(SFD);
        data.extend_from_slice(payload);
        data.extend_from_slice(&fcs.compute(payload).to_le_bytes());
        Self::new(data)
    }

    /// Returns the index of the SFD, the first `SFD` byte of the frame.
    pub fn sfd_position(&self) -> Option<usize> { self.data.iter().position(|b| *b == SFD) }

    /// Returns the bytes between the SFD and the FCS.
    ///
    /// Returns an empty slice when the frame has no SFD or is too short to hold the FCS.
    pub fn payload(&self) -> &[u8] {
        let body = self.body();
        if body.len() < FCS_LEN {
            return &[];
        }
        &body[..body.len() - FCS_LEN]
    }

    /// Returns the bytes after the SFD, FCS included.
    pub fn body(&self) -> &[u8] {
        match self.sfd_position() {
            Some(sfd) => &self.data[sfd + 1..],
            None => &[],
        }
    }

    /// Checks the FCS with the Ethernet CRC-32.
    pub fn check_fcs(&self) -> bool { self.check_fcs_with(&Crc32) }

    /// Checks the FCS with `fcs`.
    pub fn check_fcs_with<F: Fcs>(&self, fcs: &F) -> bool { !self.error && fcs.verify(self.body()) }

    /// Returns control flags for every byte.
    pub fn ctrl_flags(&self) -> Vec<bool> {
        match &self.ctrl {
            Some(ctrl) => ctrl.clone(),
            None => vec![false; self.data.len()],
        }
    }

    /// Makes `ctrl` explicit for every byte.
    pub fn normalize(&mut self) {
        let mut ctrl = self.ctrl_flags();
        ctrl.resize(self.data.len(), false);
        self.ctrl = Some(ctrl);
    }

    /// Drops `ctrl` if no byte is a control character.
    pub fn compact(&mut self) {
        if let Some(ctrl) = &self.ctrl {
            if !ctrl.iter().any(|c| *c) {
                self.ctrl = None;
            }
        }
    }

    /// Returns the number of bytes.
    pub fn len(&self) -> usize { self.data.len() }

    /// Returns true if the frame holds no bytes.
    pub fn is_empty(&self) -> bool { self.data.is_empty() }
}

impl fmt::Debug for XgmiiFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XgmiiFrame")
            .field("len", &self.data.len())
            .field("start_lane", &self.start_lane)
            .field("error", &self.error)
            .field("ctrl", &self.ctrl.as_ref().map(|c| c.iter().filter(|c| **c).count()))
            .finish()
    }
}
