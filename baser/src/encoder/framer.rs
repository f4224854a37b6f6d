//! XGMII frame source: queued frames to lane vectors, with inter-frame gap and deficit idle
//! count.

use std::collections::VecDeque;

use log::{info, trace};

use crate::constants::framing::*;
use crate::constants::{eth_pre, xgmii_ctrl, LANES};
use crate::error::SendError;
use crate::types::{XgmiiFrame, XgmiiLanes};

#[derive(Debug, Clone)]
enum TxState {
    Idle,
    InFrame { data: Vec<u8>, ctrl: Vec<bool>, offset: usize },
}

/// Produces one XGMII lane vector per cycle from a queue of frames.
///
/// The first preamble byte of each frame is replaced by START and TERM is appended. START
/// lands on lane 0 or lane 4 only. With the deficit idle count enabled, the gap after a frame
/// may be shortened by up to 3 bytes to start the next frame on lane 0, and the deficit is
/// repaid later so that the average gap is the configured IFG.
#[derive(Debug, Clone)]
pub struct XgmiiSource {
    queue: VecDeque<XgmiiFrame>,
    queue_bytes: usize,
    limit_bytes: Option<usize>,
    limit_frames: Option<usize>,

    ifg: usize,
    enable_dic: bool,
    force_offset_start: bool,

    state: TxState,
    ifg_count: isize,
    deficit_idle_count: isize,
}

impl Default for XgmiiSource {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            queue_bytes: 0,
            limit_bytes: None,
            limit_frames: None,
            ifg: IFG,
            enable_dic: ENABLE_DIC,
            force_offset_start: false,
            state: TxState::Idle,
            ifg_count: 0,
            deficit_idle_count: 0,
        }
    }
}

impl XgmiiSource {
    /// Creates an idle source with an empty queue.
    pub fn new() -> Self { Self::default() }

    /// Sets the inter-frame gap in bytes, TERM included.
    pub fn set_ifg(&mut self, ifg: usize) { self.ifg = ifg; }

    /// Enables or disables the deficit idle count.
    pub fn set_enable_dic(&mut self, enable_dic: bool) { self.enable_dic = enable_dic; }

    /// Starts every frame on lane 4.
    pub fn set_force_offset_start(&mut self, force_offset_start: bool) {
        self.force_offset_start = force_offset_start;
    }

    /// Limits the queue by bytes and frames. `None` is unlimited.
    pub fn set_queue_limits(&mut self, limit_bytes: Option<usize>, limit_frames: Option<usize>) {
        self.limit_bytes = limit_bytes;
        self.limit_frames = limit_frames;
    }

    /// Queues a frame. It must begin with a preamble byte.
    pub fn send(&mut self, frame: XgmiiFrame) -> Result<(), SendError> {
        let first_ctrl = frame.ctrl.as_ref().and_then(|ctrl| ctrl.first().copied()).unwrap_or(false);
        if frame.data.first() != Some(&eth_pre::PRE) || first_ctrl {
            return Err(SendError::MissingPreamble);
        }
        if self.limit_frames.map_or(false, |limit| self.queue.len() >= limit)
            || self.limit_bytes.map_or(false, |limit| self.queue_bytes + frame.len() > limit)
        {
            return Err(SendError::QueueFull);
        }

        self.queue_bytes += frame.len();
        self.queue.push_back(frame);
        Ok(())
    }

    /// Returns the number of queued frames.
    pub fn queue_len(&self) -> usize { self.queue.len() }

    /// Returns true if no frame is queued.
    pub fn is_empty(&self) -> bool { self.queue.is_empty() }

    /// Returns true if no frame is queued or being sent.
    pub fn is_idle(&self) -> bool { self.is_empty() && matches!(self.state, TxState::Idle) }

    /// Drops every queued frame. A frame being sent is finished.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.queue_bytes = 0;
    }

    /// Drops the frame being sent and restarts the gap counters. Queued frames are kept.
    pub fn reset(&mut self) {
        self.state = TxState::Idle;
        self.ifg_count = 0;
        self.deficit_idle_count = 0;
    }

    fn start_frame(&mut self, frame: XgmiiFrame) {
        info!("TX frame: {:?}", frame);
        self.queue_bytes -= frame.len();

        let mut ctrl = frame.ctrl_flags();
        ctrl.resize(frame.data.len(), false);
        let mut data = frame.data;
        if let (Some(d), Some(c)) = (data.first_mut(), ctrl.first_mut()) {
            *d = xgmii_ctrl::START;
            *c = true;
        }
        data.push(xgmii_ctrl::TERM);
        ctrl.push(true);

        let min_ifg = if self.enable_dic { 3 - self.deficit_idle_count } else { 0 };
        if self.ifg_count > min_ifg || self.force_offset_start {
            self.ifg_count -= 4;
            data = [xgmii_ctrl::IDLE; 4].into_iter().chain(data).collect();
            ctrl = [true; 4].into_iter().chain(ctrl).collect();
            trace!("offset start");
        }

        if self.enable_dic {
            self.deficit_idle_count = (self.deficit_idle_count + self.ifg_count).max(0);
        }
        self.ifg_count = 0;
        self.state = TxState::InFrame { data, ctrl, offset: 0 };
    }

    /// Produces the lane vector for the next cycle.
    pub fn next_lanes(&mut self) -> XgmiiLanes {
        if self.ifg_count + self.deficit_idle_count > LANES as isize - 1 || (!self.enable_dic && self.ifg_count > 4) {
            self.ifg_count -= LANES as isize;
            if self.ifg_count < 0 {
                if self.enable_dic {
                    self.deficit_idle_count = (self.deficit_idle_count + self.ifg_count).max(0);
                }
                self.ifg_count = 0;
            }
        } else if matches!(self.state, TxState::Idle) {
            match self.queue.pop_front() {
                Some(frame) => self.start_frame(frame),
                None => {
                    self.deficit_idle_count = 0;
                    self.ifg_count = 0;
                }
            }
        }

        let mut lanes = XgmiiLanes::IDLE;
        let (data, ctrl, offset) = match &mut self.state {
            TxState::Idle => return lanes,
            TxState::InFrame { data, ctrl, offset } => (data, ctrl, offset),
        };

        let mut done = false;
        for lane in 0..LANES {
            lanes.data[lane] = data[*offset];
            lanes.ctrl[lane] = ctrl[*offset];
            *offset += 1;
            if *offset >= data.len() {
                self.ifg_count = (self.ifg as isize - (LANES - lane) as isize).max(0);
                done = true;
                break;
            }
        }
        if done {
            self.state = TxState::Idle;
        }
        lanes
    }
}

impl Iterator for XgmiiSource {
    type Item = XgmiiLanes;

    fn next(&mut self) -> Option<XgmiiLanes> { Some(self.next_lanes()) }
}
