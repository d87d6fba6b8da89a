use std::thread;
use std::time::Duration;

use cancycle::payload::{FLAGS_FRAME_ID, STATUS_FRAME_ID, WAVEFORM_FRAME_ID};
use cancycle::{
    Bitrate, CanFrame, DriverError, EngineConfig, EngineError, MockDriver, Session, SessionState,
};

fn fast_config() -> EngineConfig {
    EngineConfig {
        tx_period_ms: 5,
        ..EngineConfig::default()
    }
}

fn running_session(config: EngineConfig) -> (Session<MockDriver>, MockDriver) {
    let driver = MockDriver::new();
    let mut session = Session::new(driver.clone(), config).unwrap();
    session.start().unwrap();
    (session, driver)
}

#[test]
fn failed_initialize_leaves_session_fully_stopped() {
    let driver = MockDriver::new();
    driver.fail_next_initialize(DriverError::HardwareUnavailable);

    let mut session = Session::new(driver.clone(), fast_config()).unwrap();
    let result = session.start();

    assert!(matches!(
        result,
        Err(EngineError::StartFailed(DriverError::HardwareUnavailable))
    ));
    assert_eq!(session.state(), SessionState::Stopped);

    // Nothing was spawned: no transmissions appear and the never-acquired
    // handle is never released.
    thread::sleep(Duration::from_millis(40));
    assert_eq!(driver.written_count(), 0);
    assert_eq!(driver.uninitialize_calls(), 0);
    assert!(session.log().is_empty());
}

#[test]
fn running_session_transmits_the_cyclic_frame_set() {
    let (mut session, driver) = running_session(fast_config());
    thread::sleep(Duration::from_millis(80));
    session.stop();

    let written = driver.written_frames();
    assert!(
        written.len() >= 3,
        "expected at least one full tick, saw {} frames",
        written.len()
    );

    let status = written.iter().find(|f| f.id == u32::from(STATUS_FRAME_ID));
    assert_eq!(status.map(|f| f.dlc), Some(8));

    let waveform = written
        .iter()
        .find(|f| f.id == u32::from(WAVEFORM_FRAME_ID));
    assert_eq!(waveform.map(|f| f.dlc), Some(2));

    let flags = written.iter().find(|f| f.id == u32::from(FLAGS_FRAME_ID));
    let flags = flags.expect("control flags frame was never sent");
    assert_eq!(flags.dlc, 4);
    assert_eq!(&flags.data[..4], &[0x01, 0x02, 0x04, 0x08]);

    let stats = session.stats();
    assert_eq!(stats.frames_sent as usize, driver.written_count());
    assert!(stats.ticks >= 1);
}

#[test]
fn received_frame_appears_at_the_front_rendered_as_hex() {
    let (mut session, driver) = running_session(fast_config());

    driver.inject_frame(CanFrame::new(0x7FF, &[0xAB, 0xCD]));
    thread::sleep(Duration::from_millis(50));

    let front = session.log().front().expect("frame never reached the sink");
    assert_eq!(front.id_hex.as_str(), "7FF");
    assert_eq!(front.dlc, 2);
    assert_eq!(front.data_hex.as_str(), "AB CD");

    assert!(session.stats().frames_received >= 1);
    session.stop();
}

#[test]
fn delivery_preserves_read_order_newest_first() {
    let (mut session, driver) = running_session(fast_config());

    driver.inject_frame(CanFrame::new(0x101, &[0x01]));
    driver.inject_frame(CanFrame::new(0x102, &[0x02]));
    driver.inject_frame(CanFrame::new(0x103, &[0x03]));
    thread::sleep(Duration::from_millis(50));
    session.stop();

    let snapshot = session.log().snapshot();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot[0].id_hex.as_str(), "103");
    assert_eq!(snapshot[1].id_hex.as_str(), "102");
    assert_eq!(snapshot[2].id_hex.as_str(), "101");
}

#[test]
fn stop_halts_transmission_and_releases_the_adapter_once() {
    let (mut session, driver) = running_session(fast_config());
    thread::sleep(Duration::from_millis(40));

    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(driver.uninitialize_calls(), 1);
    assert!(!driver.is_initialized());

    let written_at_stop = driver.written_count();
    thread::sleep(Duration::from_millis(40));
    assert_eq!(driver.written_count(), written_at_stop);

    // Double stop: no-op, never touches the already-released handle.
    session.stop();
    assert_eq!(driver.uninitialize_calls(), 1);
}

#[test]
fn start_while_running_is_a_noop() {
    let (mut session, driver) = running_session(fast_config());

    assert!(session.start().is_ok());
    assert_eq!(driver.initialize_calls(), 1);
    assert_eq!(session.state(), SessionState::Running);

    session.stop();
}

#[test]
fn stopped_session_can_be_restarted() {
    let (mut session, driver) = running_session(fast_config());
    session.stop();

    session.start().unwrap();
    assert_eq!(session.state(), SessionState::Running);
    assert_eq!(driver.initialize_calls(), 2);
    assert!(driver.is_initialized());

    driver.inject_frame(CanFrame::new(0x123, &[0xEE]));
    thread::sleep(Duration::from_millis(50));
    let front = session.log().front().expect("no frame after restart");
    assert_eq!(front.id_hex.as_str(), "123");

    session.stop();
}

#[test]
fn dropping_a_running_session_releases_the_adapter() {
    let driver = MockDriver::new();
    {
        let mut session = Session::new(driver.clone(), fast_config()).unwrap();
        session.start().unwrap();
        thread::sleep(Duration::from_millis(20));
    }

    assert_eq!(driver.uninitialize_calls(), 1);
    assert!(!driver.is_initialized());
}

#[test]
fn sink_stays_bounded_under_sustained_traffic() {
    let config = EngineConfig {
        tx_period_ms: 5,
        log_capacity: 5,
        ..EngineConfig::default()
    };
    let (mut session, driver) = running_session(config);

    for seq in 0..12u8 {
        driver.inject_frame(CanFrame::new(0x400, &[seq]));
    }
    thread::sleep(Duration::from_millis(60));
    session.stop();

    let log = session.log();
    assert_eq!(log.len(), 5);
    assert_eq!(log.evicted(), 7);
    assert_eq!(session.stats().entries_evicted, 7);

    // Exactly the last five, newest first.
    let data: Vec<_> = log
        .snapshot()
        .iter()
        .map(|e| e.data_hex.as_str().to_owned())
        .collect();
    assert_eq!(data, vec!["0B", "0A", "09", "08", "07"]);
}

#[test]
fn write_failures_are_swallowed_and_counted() {
    let (mut session, driver) = running_session(fast_config());
    driver.set_fail_writes(true);
    thread::sleep(Duration::from_millis(50));

    // Still running; failures only show up in the counters.
    assert_eq!(session.state(), SessionState::Running);
    assert!(session.stats().tx_errors > 0);

    driver.set_fail_writes(false);
    let sent_before = session.stats().frames_sent;
    thread::sleep(Duration::from_millis(50));
    assert!(session.stats().frames_sent > sent_before);

    session.stop();
}

#[test]
fn invalid_configuration_is_rejected_at_construction() {
    let config = EngineConfig {
        log_capacity: 0,
        ..EngineConfig::default()
    };
    let result = Session::new(MockDriver::new(), config);
    assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
}

#[test]
fn session_honours_configured_bitrate() {
    let config = EngineConfig {
        bitrate: Bitrate::Rate250K,
        tx_period_ms: 5,
        ..EngineConfig::default()
    };
    let (mut session, driver) = running_session(config);

    assert_eq!(driver.bitrate(), Some(Bitrate::Rate250K));
    session.stop();
    assert_eq!(driver.bitrate(), None);
}
