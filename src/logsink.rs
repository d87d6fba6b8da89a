//! Bounded, newest-first receive log.
//!
//! The receive loop is the single writer, the display/consumer the single
//! reader; the interior lock is the one cross-context hand-off point in the
//! engine, so the consumer never observes a half-built entry.

use std::collections::VecDeque;
use std::fmt;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use arrayvec::ArrayString;

use crate::driver::RxFrame;
use crate::frame::{CanFrame, CAN_MAX_DLC};

/// Default sink capacity, matching a one-screen log view.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

// "AA BB ...": two hex digits per byte plus separating spaces.
const DATA_HEX_CAPACITY: usize = CAN_MAX_DLC * 3 - 1;

/// One received frame, rendered for display.
///
/// Owned by the sink from insertion until eviction. Fixed-capacity strings
/// keep entries `Copy` and free of heap traffic on the receive path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    /// Adapter capture timestamp, microseconds.
    pub timestamp_us: u64,
    /// Identifier rendered as uppercase hex, e.g. `7FF`.
    pub id_hex: ArrayString<8>,
    pub dlc: u8,
    /// First `dlc` payload bytes as space-separated hex pairs, e.g. `AB CD`.
    pub data_hex: ArrayString<DATA_HEX_CAPACITY>,
}

impl LogEntry {
    /// Renders a decoded frame. Only the first `dlc` bytes are rendered;
    /// the buffer beyond them is never inspected.
    pub fn from_frame(frame: &CanFrame, timestamp_us: u64) -> Self {
        let mut id_hex = ArrayString::new();
        let _ = write!(id_hex, "{:X}", frame.id());

        let mut data_hex = ArrayString::new();
        for (i, byte) in frame.data().iter().enumerate() {
            if i > 0 {
                let _ = data_hex.try_push(' ');
            }
            let _ = write!(data_hex, "{byte:02X}");
        }

        Self {
            timestamp_us,
            id_hex,
            dlc: frame.dlc(),
            data_hex,
        }
    }

    pub fn from_rx(rx: &RxFrame) -> Self {
        Self::from_frame(&CanFrame::from_wire(&rx.frame), rx.timestamp_us)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.timestamp_us / 1_000_000;
        let micros = self.timestamp_us % 1_000_000;
        write!(
            f,
            "{secs:>6}.{micros:06}  {:>3}  [{}]  {}",
            self.id_hex, self.dlc, self.data_hex
        )
    }
}

#[derive(Debug)]
struct LogInner {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    evicted: u64,
}

/// Capacity-bounded, insertion-ordered (newest-first) log sink.
///
/// `insert` places at the front; once full, each insertion evicts the back
/// (oldest) entry: strict FIFO-by-recency, size never exceeds capacity at
/// any point. Cloning yields another handle onto the same sink. The sink is
/// never cleared implicitly; it survives stop/start of its session, and
/// [`clear`](FrameLog::clear) exists for consumers that want a fresh view.
#[derive(Debug, Clone)]
pub struct FrameLog {
    inner: Arc<Mutex<LogInner>>,
}

impl FrameLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LogInner {
                entries: VecDeque::with_capacity(capacity.min(DEFAULT_LOG_CAPACITY * 4)),
                capacity,
                evicted: 0,
            })),
        }
    }

    /// Inserts at the front, evicting from the back when full.
    pub fn insert(&self, entry: LogEntry) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.push_front(entry);
            while inner.entries.len() > inner.capacity {
                inner.entries.pop_back();
                inner.evicted += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().map(|i| i.capacity).unwrap_or(0)
    }

    /// Lifetime count of entries dropped off the back.
    pub fn evicted(&self) -> u64 {
        self.inner.lock().map(|i| i.evicted).unwrap_or(0)
    }

    /// Most recent entry, if any.
    pub fn front(&self) -> Option<LogEntry> {
        self.inner
            .lock()
            .ok()
            .and_then(|i| i.entries.front().copied())
    }

    /// Copies the current contents newest-first for the consumer.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.inner
            .lock()
            .map(|i| i.entries.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.clear();
        }
    }
}

impl Default for FrameLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}
