//! In-memory adapter for tests and the demo binary.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::driver::{Bitrate, CanDriver, DriverError, RxFrame};
use crate::frame::{CanFrame, WireFrame};

// Synthetic device clock advance per injected frame.
const INJECT_CLOCK_STEP_US: u64 = 100;

#[derive(Debug, Default)]
struct MockInner {
    initialized: bool,
    bitrate: Option<Bitrate>,
    rx_queue: VecDeque<RxFrame>,
    written: Vec<WireFrame>,
    fail_initialize: Option<DriverError>,
    fail_writes: bool,
    clock_us: u64,
    initialize_calls: u32,
    uninitialize_calls: u32,
}

/// Shared-handle mock adapter.
///
/// Cloning yields another handle onto the same simulated channel, so a test
/// (or the demo binary's simulated remote node) can keep injecting inbound
/// frames and inspecting outbound ones after the engine has taken ownership
/// of its handle.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    inner: Arc<Mutex<MockInner>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `initialize` call fail with `err`.
    pub fn fail_next_initialize(&self, err: DriverError) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_initialize = Some(err);
        }
    }

    /// Toggles failure of all subsequent writes.
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_writes = fail;
        }
    }

    /// Queues an inbound frame as if it had arrived from the bus, stamped
    /// with the advancing synthetic device clock.
    pub fn inject_frame(&self, frame: CanFrame) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.clock_us += INJECT_CLOCK_STEP_US;
            let timestamp_us = inner.clock_us;
            inner.rx_queue.push_back(RxFrame {
                frame: frame.to_wire(),
                timestamp_us,
            });
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().map(|i| i.initialized).unwrap_or(false)
    }

    pub fn bitrate(&self) -> Option<Bitrate> {
        self.inner.lock().ok().and_then(|i| i.bitrate)
    }

    /// Every frame written to the simulated bus, in write order.
    pub fn written_frames(&self) -> Vec<WireFrame> {
        self.inner.lock().map(|i| i.written.clone()).unwrap_or_default()
    }

    pub fn written_count(&self) -> usize {
        self.inner.lock().map(|i| i.written.len()).unwrap_or(0)
    }

    pub fn initialize_calls(&self) -> u32 {
        self.inner.lock().map(|i| i.initialize_calls).unwrap_or(0)
    }

    pub fn uninitialize_calls(&self) -> u32 {
        self.inner.lock().map(|i| i.uninitialize_calls).unwrap_or(0)
    }
}

impl CanDriver for MockDriver {
    fn initialize(&mut self, bitrate: Bitrate) -> Result<(), DriverError> {
        let Ok(mut inner) = self.inner.lock() else {
            return Err(DriverError::HardwareUnavailable);
        };
        inner.initialize_calls += 1;
        if let Some(err) = inner.fail_initialize.take() {
            return Err(err);
        }
        if inner.initialized {
            return Err(DriverError::ChannelInUse);
        }
        inner.initialized = true;
        inner.bitrate = Some(bitrate);
        Ok(())
    }

    fn write(&mut self, frame: &WireFrame) -> nb::Result<(), DriverError> {
        let Ok(mut inner) = self.inner.lock() else {
            return Err(nb::Error::Other(DriverError::HardwareUnavailable));
        };
        if !inner.initialized {
            return Err(nb::Error::Other(DriverError::NotInitialized));
        }
        if inner.fail_writes {
            return Err(nb::Error::Other(DriverError::TxBufferFull));
        }
        inner.written.push(*frame);
        Ok(())
    }

    fn read(&mut self) -> nb::Result<RxFrame, DriverError> {
        let Ok(mut inner) = self.inner.lock() else {
            return Err(nb::Error::Other(DriverError::HardwareUnavailable));
        };
        if !inner.initialized {
            return Err(nb::Error::Other(DriverError::NotInitialized));
        }
        inner.rx_queue.pop_front().ok_or(nb::Error::WouldBlock)
    }

    fn uninitialize(&mut self) -> Result<(), DriverError> {
        let Ok(mut inner) = self.inner.lock() else {
            return Err(DriverError::HardwareUnavailable);
        };
        inner.uninitialize_calls += 1;
        if !inner.initialized {
            return Err(DriverError::NotInitialized);
        }
        inner.initialized = false;
        inner.bitrate = None;
        Ok(())
    }
}
