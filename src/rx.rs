//! Dedicated receive-polling thread.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace};

use crate::driver::CanDriver;
use crate::logsink::{FrameLog, LogEntry};
use crate::session::SessionShared;

// Backoff after an empty or failed read; bounds CPU without materially
// delaying delivery, and bounds how long stop() waits for this thread.
const POLL_BACKOFF: Duration = Duration::from_millis(1);

pub(crate) struct ReceiveLoop<D> {
    driver: Arc<Mutex<D>>,
    shared: Arc<SessionShared>,
    log: FrameLog,
}

impl<D: CanDriver + 'static> ReceiveLoop<D> {
    pub(crate) fn new(driver: Arc<Mutex<D>>, shared: Arc<SessionShared>, log: FrameLog) -> Self {
        Self {
            driver,
            shared,
            log,
        }
    }

    pub(crate) fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("can-rx".into())
            .spawn(move || self.run())
    }

    fn run(self) {
        debug!("receive loop started");
        while self.shared.is_running() {
            let result = {
                let Ok(mut driver) = self.driver.lock() else {
                    break;
                };
                driver.read()
            };

            match result {
                Ok(rx) => {
                    // Drain bursts back-to-back; only empty reads back off.
                    self.shared.counters.record_received();
                    self.log.insert(LogEntry::from_rx(&rx));
                }
                Err(nb::Error::WouldBlock) => thread::sleep(POLL_BACKOFF),
                Err(nb::Error::Other(err)) => {
                    // The driver encodes transient conditions here; treated
                    // the same as "no data".
                    trace!(error = %err, "read failed, retrying");
                    thread::sleep(POLL_BACKOFF);
                }
            }
        }
        debug!("receive loop exited");
    }
}
