//! Source to sink loopback over the SERDES interface.

use baser::block_type::BlockType;
use baser::constants::baser_sync;
use baser::*;

fn link(config: CodecConfig) -> (SerdesSource, SerdesSink) {
    (SerdesSource::new(config.clone()).unwrap(), SerdesSink::new(config).unwrap())
}

fn tick(source: &mut SerdesSource, sink: &mut SerdesSink) {
    let word = source.tick(false);
    sink.tick_with_sync(word, source.gbx_sync());
}

/// Runs the link until `frames` frames are waiting in the sink.
fn run_until(source: &mut SerdesSource, sink: &mut SerdesSink, frames: usize) {
    for _ in 0..200_000 {
        if sink.count() >= frames {
            return;
        }
        tick(source, sink);
    }
    panic!("received {} of {} frames", sink.count(), frames);
}

fn payload(len: usize) -> Vec<u8> { (0..len).map(|i| i as u8).collect() }

fn round_trip(config: CodecConfig) {
    for force_offset_start in [false, true] {
        let (mut source, mut sink) = link(config.clone());
        source.xgmii_mut().set_force_offset_start(force_offset_start);

        // Eight consecutive lengths put TERM in every lane.
        let payloads = (60..68).chain([512, 1514, 9214]).map(payload).collect::<Vec<_>>();
        for p in &payloads {
            source.send(XgmiiFrame::from_payload(p)).unwrap();
        }
        run_until(&mut source, &mut sink, payloads.len());

        for p in &payloads {
            let frame = sink.recv().unwrap();
            assert_eq!(frame.payload(), &p[..]);
            assert!(frame.check_fcs());
            assert!(!frame.error);
            assert_eq!(frame.ctrl, None);
            if force_offset_start {
                assert_eq!(frame.start_lane, 4);
            }
        }
        assert_eq!(sink.stats().errors(), 0);
        assert_eq!(sink.stats().frames, payloads.len() as u64);
        assert_eq!(source.stats().fallback_blocks, 0);
    }
}

macro_rules! round_trip_tests {
    ($($name:ident: $config:expr;)*) => {
        paste::paste! {
            $(
                #[test]
                fn [<round_trip_ $name>]() { round_trip($config) }
            )*
        }
    };
}

round_trip_tests! {
    unscrambled: CodecConfig::default().scramble(false);
    width_64: CodecConfig::default();
    width_32: CodecConfig::default().width(32);
    width_16: CodecConfig::default().width(16);
    width_8: CodecConfig::default().width(8);
    reverse: CodecConfig::default().width(16).reverse(true);
    gearbox_64: CodecConfig::default().gearbox(GearboxConfig::new(33, [0]).unwrap());
    gearbox_32: CodecConfig::default().width(32).gearbox(GearboxConfig::new(33, [32]).unwrap());
    serial_64: CodecConfig::default().interface(LineInterface::Serial);
    serial_40: CodecConfig::default().interface(LineInterface::Serial).width(40);
    serial_8_reverse: CodecConfig::default().interface(LineInterface::Serial).width(8).reverse(true);
    serial_gearbox: CodecConfig::default().interface(LineInterface::Serial).gearbox(GearboxConfig::new(33, [5]).unwrap());
}

#[test]
fn idle_link() {
    let (mut source, mut sink) = link(CodecConfig::default().scramble(false));
    for _ in 0..100 {
        tick(&mut source, &mut sink);
    }
    assert!(sink.is_empty());
    let stats = sink.stats();
    assert_eq!(stats.blocks, 100);
    assert_eq!(stats.errors(), 0);
    assert_eq!(stats.frames, 0);
    assert_eq!(stats.term_without_frame, 0);
}

#[test]
fn frame_60_at_both_start_lanes() {
    for (force_offset_start, start_lane) in [(false, 0), (true, 4)] {
        let (mut source, mut sink) = link(CodecConfig::default());
        source.xgmii_mut().set_ifg(12);
        source.xgmii_mut().set_enable_dic(true);
        source.xgmii_mut().set_force_offset_start(force_offset_start);

        source.send(XgmiiFrame::from_payload(&payload(60))).unwrap();
        run_until(&mut source, &mut sink, 1);

        let frame = sink.recv().unwrap();
        assert_eq!(frame.payload(), &payload(60)[..]);
        assert_eq!(frame.start_lane, start_lane);
        assert!(frame.check_fcs());
        assert!(!frame.error);
    }
}

#[test]
fn corrupt_block_type() {
    let (mut source, mut sink) = link(CodecConfig::default().scramble(false));
    source.send(XgmiiFrame::from_payload(&payload(60))).unwrap();
    source.send(XgmiiFrame::from_payload(&payload(61))).unwrap();

    let mut corrupted = false;
    for _ in 0..100 {
        let mut word = source.tick(false);
        let term = word.hdr == baser_sync::CTRL
            && BlockType::from_tag(word.data as u8).and_then(BlockType::term_lane).is_some();
        if term && !corrupted {
            // 0x00 is not a block type.
            word.data &= !0xff;
            corrupted = true;
        }
        sink.tick(word);
    }
    assert!(corrupted);

    let first = sink.recv().unwrap();
    assert!(first.error);
    assert!(!first.check_fcs());
    assert_eq!(first.data.last(), Some(&baser::constants::xgmii_ctrl::ERROR));

    let second = sink.recv().unwrap();
    assert_eq!(second.payload(), &payload(61)[..]);
    assert!(second.check_fcs());
    assert!(sink.is_empty());

    let stats = sink.stats();
    assert_eq!(stats.bad_block_type, 1);
    assert_eq!(stats.error_frames, 1);
    assert_eq!(stats.frames, 2);
}

#[test]
fn slip_relock() {
    let block_lock = BlockLockConfig { ber_window: 195, ..Default::default() };
    let (mut source, mut sink) = link(CodecConfig::default().block_lock(block_lock));

    for _ in 0..100 {
        tick(&mut source, &mut sink);
    }
    assert!(sink.block_lock());
    assert!(!sink.high_ber());

    source.send(XgmiiFrame::from_payload(&payload(100))).unwrap();
    run_until(&mut source, &mut sink, 1);
    assert_eq!(sink.recv().unwrap().payload(), &payload(100)[..]);

    // One bit of slip on the transmit side.
    let word = source.tick(true);
    sink.tick(word);
    for _ in 0..100 {
        tick(&mut source, &mut sink);
    }
    assert!(!sink.block_lock());
    assert!(sink.high_ber());

    let mut cycles = 0;
    while !sink.block_lock() || sink.high_ber() {
        tick(&mut source, &mut sink);
        cycles += 1;
        assert!(cycles < 5000, "no relock after {} cycles", cycles);
    }
    assert!(sink.stats().slips > 0);
    assert_eq!(sink.bit_offset(), 65);

    sink.clear();
    for len in [60, 61, 62, 63] {
        source.send(XgmiiFrame::from_payload(&payload(len))).unwrap();
    }
    run_until(&mut source, &mut sink, 4);
    for len in [60, 61, 62, 63] {
        let frame = sink.recv().unwrap();
        assert_eq!(frame.payload(), &payload(len)[..]);
        assert!(frame.check_fcs());
    }
}

#[test]
fn bit_offset_pair() {
    for offset in [1, 33, 65] {
        let (mut source, mut sink) = link(CodecConfig::default());
        source.set_bit_offset(offset);
        sink.set_bit_offset(66 - offset);

        for _ in 0..4 {
            tick(&mut source, &mut sink);
        }
        source.send(XgmiiFrame::from_payload(&payload(64))).unwrap();
        run_until(&mut source, &mut sink, 1);
        assert_eq!(sink.recv().unwrap().payload(), &payload(64)[..]);
    }
}

#[test]
fn reset_drops_frames_in_flight() {
    let (mut source, mut sink) = link(CodecConfig::default().width(32));
    source.send(XgmiiFrame::from_payload(&payload(200))).unwrap();
    source.send(XgmiiFrame::from_payload(&payload(60))).unwrap();
    for _ in 0..10 {
        tick(&mut source, &mut sink);
    }

    source.reset();
    source.reset();
    sink.reset();
    sink.reset();
    assert_eq!(source.count(), 1);

    run_until(&mut source, &mut sink, 1);
    let frame = sink.recv().unwrap();
    assert_eq!(frame.payload(), &payload(60)[..]);
    for _ in 0..100 {
        tick(&mut source, &mut sink);
    }
    assert!(sink.is_empty());
    assert_eq!(sink.stats().errors(), 0);
}

#[test]
fn bad_config() {
    assert!(matches!(GearboxConfig::new(7, [0]), Err(ConfigError::BadGearboxRatio { .. })));
    assert!(matches!(SerdesSource::new(CodecConfig::default().width(24)), Err(ConfigError::BadWidth { width: 24 })));
    let taps = ScramblerConfig { tap_low: 60, ..Default::default() };
    assert!(matches!(SerdesSink::new(CodecConfig::default().scrambler(taps)), Err(ConfigError::BadScramblerTaps { .. })));
}

#[test]
fn queue_full() {
    let (mut source, _) = link(CodecConfig::default());
    source.xgmii_mut().set_queue_limits(None, Some(1));
    source.send(XgmiiFrame::from_payload(&payload(60))).unwrap();
    assert_eq!(source.send(XgmiiFrame::from_payload(&payload(60))), Err(SendError::QueueFull));
}
