//! High-resolution cyclic timer on a dedicated thread.
//!
//! General-purpose sleeps resolve to multiple milliseconds on most hosts,
//! which is too coarse for deterministic 10 ms bus cycling. The timer thread
//! therefore runs an absolute-deadline loop: a coarse `thread::sleep` until
//! shortly before each deadline, then yield/spin across the final window.
//! Nothing global (no platform-wide timer resolution) is modified, so there
//! is nothing to restore when the timer stops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

// Hand the final stretch before a deadline to the yield/spin loop; OS sleep
// overshoot is typically below this on a tickless kernel.
const SPIN_WINDOW: Duration = Duration::from_micros(1500);

// Within this distance of the deadline, spin without yielding.
const BUSY_WINDOW: Duration = Duration::from_micros(100);

fn sleep_until(deadline: Instant, cancel: &AtomicBool) {
    loop {
        if cancel.load(Ordering::Acquire) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        let remaining = deadline - now;
        if remaining > SPIN_WINDOW {
            thread::sleep(remaining - SPIN_WINDOW);
        } else if remaining > BUSY_WINDOW {
            thread::yield_now();
        } else {
            std::hint::spin_loop();
        }
    }
}

struct TimerThread {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Owned periodic timer resource.
///
/// `start` spawns the timer thread, `stop` cancels and joins it, and `Drop`
/// runs `stop`, so cancellation happens on every exit path. A fire can land
/// after `stop` is requested but before the thread observes the flag; the
/// callback installed by the session tolerates that by re-checking session
/// state on entry.
#[derive(Default)]
pub struct CyclicTimer {
    active: Option<TimerThread>,
}

impl CyclicTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins firing `tick` every `period`.
    ///
    /// Calling `start` while already running restarts cleanly: the previous
    /// timer thread is stopped and joined before the new one spawns.
    ///
    /// If the loop ever falls more than one period behind (host suspend,
    /// scheduler stall) it resynchronizes to the current instant instead of
    /// firing a catch-up burst.
    pub fn start<F>(&mut self, period: Duration, mut tick: F) -> std::io::Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        self.stop();

        let cancel = Arc::new(AtomicBool::new(false));
        let thread_cancel = Arc::clone(&cancel);

        let handle = thread::Builder::new()
            .name("can-tx-timer".into())
            .spawn(move || {
                debug!(period_us = period.as_micros() as u64, "cyclic timer started");
                let mut next = Instant::now() + period;
                loop {
                    sleep_until(next, &thread_cancel);
                    if thread_cancel.load(Ordering::Acquire) {
                        break;
                    }
                    tick();
                    next += period;
                    let now = Instant::now();
                    if now > next + period {
                        next = now + period;
                    }
                }
                debug!("cyclic timer stopped");
            })?;

        self.active = Some(TimerThread { cancel, handle });
        Ok(())
    }

    /// Cancels future firings and joins the timer thread.
    ///
    /// Safe to call when never started; idempotent.
    pub fn stop(&mut self) {
        if let Some(timer) = self.active.take() {
            timer.cancel.store(true, Ordering::Release);
            let _ = timer.handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for CyclicTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
