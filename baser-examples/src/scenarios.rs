//! Loopback runs of a source driving a sink.

use baser::block_type::BlockType;
use baser::constants::baser_sync;
use baser::{BlockLockConfig, CodecConfig, ConfigError, SerdesSink, SerdesSource, XgmiiFrame};
use itertools::Itertools;
use log::{error, info};

const MAX_CYCLES: usize = 10_000;

fn link(config: CodecConfig) -> Result<(SerdesSource, SerdesSink), ConfigError> {
    Ok((SerdesSource::new(config.clone())?, SerdesSink::new(config)?))
}

fn tick(source: &mut SerdesSource, sink: &mut SerdesSink) {
    let word = source.tick(false);
    sink.tick_with_sync(word, source.gbx_sync());
}

fn payload(len: usize) -> Vec<u8> { (0..len).map(|i| i as u8).collect() }

/// Runs the link until `frames` frames are waiting, and returns the cycle count.
fn run_until(source: &mut SerdesSource, sink: &mut SerdesSink, frames: usize) -> Option<usize> {
    for cycle in 0..MAX_CYCLES {
        if sink.count() >= frames {
            return Some(cycle);
        }
        tick(source, sink);
    }
    None
}

fn send(source: &mut SerdesSource, len: usize) {
    if let Err(e) = source.send(XgmiiFrame::from_payload(&payload(len))) {
        error!("  {} bytes not sent: {}", len, e);
    }
}

fn check(sent: &[u8], frame: Option<XgmiiFrame>) {
    match frame {
        Some(frame) if frame.payload() == sent && frame.check_fcs() => {
            info!("  {} bytes from lane {}: ok", sent.len(), frame.start_lane)
        }
        Some(frame) => error!("  {} bytes sent, got {:?}", sent.len(), frame),
        None => error!("  {} bytes sent, nothing received", sent.len()),
    }
}

pub fn idle_link() -> Result<(), ConfigError> {
    info!("idle link");
    let (mut source, mut sink) = link(CodecConfig::default())?;
    for _ in 0..1000 {
        tick(&mut source, &mut sink);
    }
    info!("  {:?}", sink.stats());
    Ok(())
}

pub fn start_lanes() -> Result<(), ConfigError> {
    info!("start lanes");
    for (force_offset_start, width) in [false, true].into_iter().cartesian_product([64, 32, 16, 8]) {
        info!(" width {}, force offset start {}", width, force_offset_start);
        let (mut source, mut sink) = link(CodecConfig::default().width(width))?;
        source.xgmii_mut().set_force_offset_start(force_offset_start);

        let lengths = (60..68).collect_vec();
        for len in &lengths {
            send(&mut source, *len);
        }
        if run_until(&mut source, &mut sink, lengths.len()).is_none() {
            error!("  timed out with {} frames", sink.count());
        }
        for len in lengths {
            check(&payload(len), sink.recv());
        }
    }
    Ok(())
}

pub fn corrupt_block_type() -> Result<(), ConfigError> {
    info!("corrupt block type");
    let (mut source, mut sink) = link(CodecConfig::default().scramble(false))?;
    let lengths = [60, 61];
    for len in lengths {
        send(&mut source, len);
    }

    let mut corrupted = false;
    for _ in 0..100 {
        let mut word = source.tick(false);
        let term = word.hdr == baser_sync::CTRL
            && BlockType::from_tag(word.data as u8).and_then(BlockType::term_lane).is_some();
        if term && !corrupted {
            word.data &= !0xff;
            corrupted = true;
        }
        sink.tick(word);
    }

    let frames = std::iter::from_fn(|| sink.recv()).collect_vec();
    info!(
        "  received [{}]",
        frames.iter().map(|f| format!("{} bytes{}", f.len(), if f.error { " (error)" } else { "" })).join(", ")
    );
    info!("  {:?}", sink.stats());
    Ok(())
}

pub fn slip_relock() -> Result<(), ConfigError> {
    info!("slip and relock");
    let block_lock = BlockLockConfig { ber_window: 195, ..Default::default() };
    let (mut source, mut sink) = link(CodecConfig::default().block_lock(block_lock))?;

    for _ in 0..100 {
        tick(&mut source, &mut sink);
    }
    info!("  block lock {}, high BER {}", sink.block_lock(), sink.high_ber());

    let word = source.tick(true);
    sink.tick(word);
    let lost = (1..=MAX_CYCLES).find(|_| {
        tick(&mut source, &mut sink);
        !sink.block_lock()
    });
    info!("  lock lost after {:?} cycles, high BER {}", lost, sink.high_ber());

    let relock = (1..=MAX_CYCLES).find(|_| {
        tick(&mut source, &mut sink);
        sink.block_lock() && !sink.high_ber()
    });
    match relock {
        Some(cycles) => info!("  relocked at offset {} after {} cycles", sink.bit_offset(), cycles),
        None => error!("  no relock after {} cycles", MAX_CYCLES),
    }
    info!("  {} slips", sink.stats().slips);

    sink.clear();
    send(&mut source, 100);
    if run_until(&mut source, &mut sink, 1).is_none() {
        error!("  timed out waiting for a frame after relock");
    }
    check(&payload(100), sink.recv());
    Ok(())
}
