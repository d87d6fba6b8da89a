//! Bus adapter driver interface.
//!
//! The engine is written against this trait; concrete adapters (hardware
//! bindings, [`MockDriver`]) live behind it. All read/write status uses
//! `nb::Result`: `WouldBlock` means "nothing to do right now, retry on the
//! next tick or poll iteration", which is exactly how the engine treats
//! every other driver error as well.
//!
//! [`MockDriver`]: crate::mock::MockDriver

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frame::WireFrame;

/// Standard CAN bitrate profiles, 75% sample point assumed by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Bitrate {
    Rate1M,
    #[default]
    Rate500K,
    Rate250K,
    Rate125K,
    Rate100K,
}

impl Bitrate {
    pub fn bits_per_sec(self) -> u32 {
        match self {
            Bitrate::Rate1M => 1_000_000,
            Bitrate::Rate500K => 500_000,
            Bitrate::Rate250K => 250_000,
            Bitrate::Rate125K => 125_000,
            Bitrate::Rate100K => 100_000,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    #[error("channel not initialized")]
    NotInitialized,
    #[error("channel already in use")]
    ChannelInUse,
    #[error("controller in bus-off state")]
    BusOff,
    #[error("transmit buffer full")]
    TxBufferFull,
    #[error("adapter hardware unavailable")]
    HardwareUnavailable,
}

/// A frame read from the bus together with the adapter's capture timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxFrame {
    pub frame: WireFrame,
    /// Device timestamp, microseconds. Sub-second resolution is all the
    /// engine relies on.
    pub timestamp_us: u64,
}

/// Adapter driver contract.
///
/// `initialize` acquires the channel at the given bitrate; a non-success
/// result is fatal to the start attempt. `write` and `read` are
/// non-blocking; any non-success result means "retry later". `uninitialize`
/// releases the channel; its result is diagnostic only.
pub trait CanDriver: Send {
    fn initialize(&mut self, bitrate: Bitrate) -> Result<(), DriverError>;

    fn write(&mut self, frame: &WireFrame) -> nb::Result<(), DriverError>;

    fn read(&mut self) -> nb::Result<RxFrame, DriverError>;

    fn uninitialize(&mut self) -> Result<(), DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitrate_profiles_map_to_rates() {
        assert_eq!(Bitrate::Rate1M.bits_per_sec(), 1_000_000);
        assert_eq!(Bitrate::Rate500K.bits_per_sec(), 500_000);
        assert_eq!(Bitrate::Rate100K.bits_per_sec(), 100_000);
        assert_eq!(Bitrate::default(), Bitrate::Rate500K);
    }
}
