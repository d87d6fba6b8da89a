//! Session lifecycle controller.
//!
//! Owns the bus handle and both I/O contexts (cyclic transmit timer,
//! receive loop) as one atomic lifecycle: either a start attempt brings all
//! of them up, or it rolls everything back and the session stays Stopped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::config::EngineConfig;
use crate::driver::{CanDriver, DriverError};
use crate::error::EngineError;
use crate::logsink::FrameLog;
use crate::payload::CyclicPayload;
use crate::rx::ReceiveLoop;
use crate::timer::CyclicTimer;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    Running,
}

/// Engine counters, updated lock-free from the timer and receive contexts.
#[derive(Debug, Default)]
pub(crate) struct EngineCounters {
    ticks: AtomicU64,
    frames_sent: AtomicU64,
    tx_errors: AtomicU64,
    frames_received: AtomicU64,
}

impl EngineCounters {
    pub(crate) fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tx_error(&self) {
        self.tx_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }
}

/// State shared with the timer callback and the receive loop.
///
/// Both contexts only ever read the running flag; the session controller is
/// its sole writer.
#[derive(Debug, Default)]
pub(crate) struct SessionShared {
    running: AtomicBool,
    pub(crate) counters: EngineCounters,
}

impl SessionShared {
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }
}

/// Point-in-time snapshot of the engine counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EngineStats {
    pub ticks: u64,
    pub frames_sent: u64,
    pub tx_errors: u64,
    pub frames_received: u64,
    pub entries_evicted: u64,
}

/// The session controller.
///
/// State machine: Stopped → Running on [`start`] (adapter initialized at the
/// configured bitrate; on failure nothing is spawned), Running → Stopped on
/// [`stop`] (both contexts signalled and joined, then the adapter released).
/// `start` while Running and `stop` while Stopped are no-ops. Dropping a
/// running session runs `stop`, so the bus handle is never leaked across an
/// abrupt teardown.
///
/// [`start`]: Session::start
/// [`stop`]: Session::stop
pub struct Session<D: CanDriver + 'static> {
    driver: Arc<Mutex<D>>,
    config: EngineConfig,
    shared: Arc<SessionShared>,
    log: FrameLog,
    timer: CyclicTimer,
    rx_handle: Option<JoinHandle<()>>,
}

impl<D: CanDriver + 'static> Session<D> {
    /// Takes exclusive ownership of the driver for the session's lifetime.
    pub fn new(driver: D, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let log = FrameLog::with_capacity(config.log_capacity);

        Ok(Self {
            driver: Arc::new(Mutex::new(driver)),
            config,
            shared: Arc::new(SessionShared::default()),
            log,
            timer: CyclicTimer::new(),
            rx_handle: None,
        })
    }

    pub fn state(&self) -> SessionState {
        if self.shared.is_running() {
            SessionState::Running
        } else {
            SessionState::Stopped
        }
    }

    /// A handle onto the receive log, valid across start/stop cycles.
    pub fn log(&self) -> FrameLog {
        self.log.clone()
    }

    pub fn stats(&self) -> EngineStats {
        let counters = &self.shared.counters;
        EngineStats {
            ticks: counters.ticks.load(Ordering::Relaxed),
            frames_sent: counters.frames_sent.load(Ordering::Relaxed),
            tx_errors: counters.tx_errors.load(Ordering::Relaxed),
            frames_received: counters.frames_received.load(Ordering::Relaxed),
            entries_evicted: self.log.evicted(),
        }
    }

    /// Acquires the bus and brings up both I/O contexts.
    ///
    /// No-op when already Running. On any failure the session is left fully
    /// Stopped: the adapter is released and nothing keeps running.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.shared.is_running() {
            debug!("start requested while already running");
            return Ok(());
        }

        {
            let Ok(mut driver) = self.driver.lock() else {
                return Err(EngineError::StartFailed(DriverError::HardwareUnavailable));
            };
            driver
                .initialize(self.config.bitrate)
                .map_err(EngineError::StartFailed)?;
        }

        self.shared.set_running(true);

        let rx = ReceiveLoop::new(
            Arc::clone(&self.driver),
            Arc::clone(&self.shared),
            self.log.clone(),
        );
        match rx.spawn() {
            Ok(handle) => self.rx_handle = Some(handle),
            Err(err) => {
                self.teardown();
                return Err(err.into());
            }
        }

        let mut payload = CyclicPayload::new();
        let driver = Arc::clone(&self.driver);
        let shared = Arc::clone(&self.shared);
        let tick = move || {
            // A fire can land after stop was requested but before the timer
            // thread is cancelled; that race is expected.
            if !shared.is_running() {
                return;
            }

            let frames = payload.next_frames();
            let Ok(mut driver) = driver.lock() else {
                return;
            };
            for frame in &frames {
                match driver.write(&frame.to_wire()) {
                    Ok(()) => shared.counters.record_sent(),
                    Err(err) => {
                        // Never raised out of the timer context.
                        shared.counters.record_tx_error();
                        trace!(id = frame.id(), error = ?err, "bus write rejected");
                    }
                }
            }
            shared.counters.record_tick();
        };

        if let Err(err) = self.timer.start(self.config.tx_period(), tick) {
            self.teardown();
            return Err(err.into());
        }

        info!(
            bitrate = self.config.bitrate.bits_per_sec(),
            period_ms = self.config.tx_period_ms,
            "session running"
        );
        Ok(())
    }

    /// Signals both contexts, joins them, and releases the bus handle.
    ///
    /// No-op when already Stopped; a second call never touches the released
    /// adapter. The joins are bounded: the receive loop observes the flag
    /// within one poll backoff and the timer within one period.
    pub fn stop(&mut self) {
        if !self.shared.is_running() {
            return;
        }

        self.teardown();
        info!("session stopped");
    }

    // Flag down, workers joined, adapter released; also unwinds a partial
    // start.
    fn teardown(&mut self) {
        self.shared.set_running(false);
        self.timer.stop();
        if let Some(handle) = self.rx_handle.take() {
            let _ = handle.join();
        }
        self.release_driver();
    }

    fn release_driver(&self) {
        if let Ok(mut driver) = self.driver.lock() {
            if let Err(err) = driver.uninitialize() {
                warn!(error = %err, "adapter release failed");
            }
        }
    }
}

impl<D: CanDriver + 'static> Drop for Session<D> {
    fn drop(&mut self) {
        self.stop();
    }
}
