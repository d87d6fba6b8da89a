//! # Cyclic CAN-Bus Transceiver Engine
//!
//! A real-time CAN-bus transceiver engine: a dedicated high-resolution timer
//! thread transmits a fixed cyclic frame set (default every 10 ms) while a
//! dedicated polling thread receives frames into a bounded, newest-first log
//! observed by a single consumer.
//!
//! ## Features
//!
//! - **Sub-millisecond transmit scheduling**: absolute-deadline timer thread
//!   with a hybrid sleep/spin loop, independent of cooperative schedulers
//! - **Continuous reception**: 1 ms-backoff polling with burst draining
//! - **Bounded memory**: capacity-limited newest-first log sink, heapless
//!   per-tick frame batches
//! - **Atomic lifecycle**: one session controller owning the bus handle and
//!   both I/O threads; no partial starts, teardown on every exit path
//! - **Testable by construction**: adapter trait with a fault-injecting mock
//!
//! ## Quick Start
//!
//! ```rust
//! use cancycle::{CanFrame, EngineConfig, MockDriver, Session};
//!
//! let driver = MockDriver::new();
//! let mut session = Session::new(driver.clone(), EngineConfig::default()).unwrap();
//!
//! session.start().unwrap();
//!
//! // Simulate a remote node; the receive loop picks this up within ~1 ms.
//! driver.inject_frame(CanFrame::new(0x7FF, &[0xAB, 0xCD]));
//! std::thread::sleep(std::time::Duration::from_millis(50));
//!
//! let front = session.log().front().unwrap();
//! assert_eq!(front.id_hex.as_str(), "7FF");
//!
//! session.stop();
//! ```
//!
//! ## Architecture
//!
//! - [`frame`] - frame codec: logical [`CanFrame`] vs. adapter [`WireFrame`]
//! - [`driver`] - bus adapter trait and bitrate profiles
//! - [`mock`] - in-memory adapter with fault injection
//! - [`timer`] - RAII cyclic timer on a dedicated thread
//! - [`payload`] - the three-frame cyclic transmit set
//! - [`logsink`] - bounded newest-first receive log
//! - [`session`] - lifecycle controller and engine statistics

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod driver;
pub mod error;
pub mod frame;
pub mod logsink;
pub mod mock;
pub mod payload;
mod rx;
pub mod session;
pub mod timer;

// Re-export the main public types for convenience
pub use config::EngineConfig;
pub use driver::{Bitrate, CanDriver, DriverError, RxFrame};
pub use error::EngineError;
pub use frame::{CanFrame, WireFrame};
pub use logsink::{FrameLog, LogEntry};
pub use mock::MockDriver;
pub use session::{EngineStats, Session, SessionState};
