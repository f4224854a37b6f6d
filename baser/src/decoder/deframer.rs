//! Frame reassembly from decoded XGMII lanes.

use arrayvec::ArrayVec;
use log::{debug, info};

use crate::constants::{eth_pre, xgmii_ctrl, LANES};
use crate::decoder::DecoderStats;
use crate::error::DecodeError;
use crate::fsm::Fsm;
use crate::types::{XgmiiFrame, XgmiiLanes};

/// Most frames that can end within one lane vector.
pub const MAX_FRAMES_PER_CYCLE: usize = LANES / 2;

#[derive(Debug, Clone)]
enum RxState {
    WaitStart,
    InFrame { data: Vec<u8>, ctrl: Vec<bool>, start_lane: usize },
}

/// Reassembles frames from START to the first following control character.
///
/// START is replaced by the preamble byte. A frame closed by a control character other than
/// TERM keeps that character as its last byte, flagged as control, and is marked as an error.
#[derive(Debug, Clone)]
pub struct Deframer {
    state: RxState,
    stats: DecoderStats,
}

impl Default for Deframer {
    fn default() -> Self { Self { state: RxState::WaitStart, stats: DecoderStats::default() } }
}

impl Deframer {
    /// Creates a deframer waiting for START.
    pub fn new() -> Self { Self::default() }

    /// Returns true while a frame is being received.
    pub fn in_frame(&self) -> bool { matches!(self.state, RxState::InFrame { .. }) }

    /// Returns the frame counters. Only `frames`, `error_frames` and `term_without_frame` are
    /// counted here.
    pub fn stats(&self) -> DecoderStats { self.stats }

    fn finish(&mut self, data: Vec<u8>, ctrl: Vec<bool>, start_lane: usize, error: bool) -> XgmiiFrame {
        let mut frame = XgmiiFrame { data, ctrl: Some(ctrl), start_lane, error };
        frame.compact();
        info!("RX frame: {:?}", frame);
        self.stats.frames += 1;
        if error {
            self.stats.error_frames += 1;
        }
        frame
    }
}

impl Fsm for Deframer {
    type Input = XgmiiLanes;
    type Output = ArrayVec<XgmiiFrame, MAX_FRAMES_PER_CYCLE>;

    fn step(&mut self, lanes: XgmiiLanes) -> Self::Output {
        let mut frames = ArrayVec::new();

        for (lane, (d, c)) in lanes.pairs().enumerate() {
            match &mut self.state {
                RxState::WaitStart => {
                    if c && d == xgmii_ctrl::START {
                        self.state = RxState::InFrame { data: vec![eth_pre::PRE], ctrl: vec![false], start_lane: lane };
                    } else if c && d == xgmii_ctrl::TERM {
                        debug!("{} in lane {}", DecodeError::FrameTermWithoutData, lane);
                        self.stats.record(DecodeError::FrameTermWithoutData);
                    }
                }
                RxState::InFrame { data, ctrl, start_lane } => {
                    if !c {
                        data.push(d);
                        ctrl.push(false);
                        continue;
                    }

                    let error = d != xgmii_ctrl::TERM;
                    if error {
                        data.push(d);
                        ctrl.push(true);
                    }
                    let (data, ctrl, start_lane) = (std::mem::take(data), std::mem::take(ctrl), *start_lane);
                    self.state = RxState::WaitStart;
                    frames.push(self.finish(data, ctrl, start_lane, error));
                }
            }
        }

        frames
    }

    fn reset(&mut self) { self.state = RxState::WaitStart; }
}
