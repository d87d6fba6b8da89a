//! Cyclic transmit payload policy.
//!
//! The timer is generic over its callback; this module is the application
//! layer above it, building the fixed three-frame set sent on every tick.

use crate::frame::CanFrame;

/// Status/heartbeat frame: little-endian 64-bit tick counter.
pub const STATUS_FRAME_ID: u16 = 0x100;

/// Simulated analog value: little-endian 12-bit sine sample.
pub const WAVEFORM_FRAME_ID: u16 = 0x200;

/// Static control flags.
pub const FLAGS_FRAME_ID: u16 = 0x300;

/// Upper bound on frames produced per tick.
pub const MAX_FRAMES_PER_TICK: usize = 8;

const CONTROL_FLAGS: [u8; 4] = [0x01, 0x02, 0x04, 0x08];

// One full sine sweep per this many ticks (1 s at the default 10 ms period).
const WAVE_PERIOD_TICKS: u64 = 100;

// 12-bit sample centered at half scale.
const WAVE_AMPLITUDE: f32 = 2047.0;
const WAVE_OFFSET: f32 = 2048.0;

/// Per-tick frame batch. `heapless` keeps the transmit path allocation-free.
pub type TickFrames = heapless::Vec<CanFrame, MAX_FRAMES_PER_TICK>;

/// Builds the cyclic frame set, advancing its tick counter on every call.
#[derive(Debug, Default)]
pub struct CyclicPayload {
    tick: u64,
}

impl CyclicPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// The frames to transmit on the current tick.
    pub fn next_frames(&mut self) -> TickFrames {
        let mut frames = TickFrames::new();

        let _ = frames.push(CanFrame::new(STATUS_FRAME_ID, &self.tick.to_le_bytes()));
        let _ = frames.push(CanFrame::new(
            WAVEFORM_FRAME_ID,
            &self.waveform_sample().to_le_bytes(),
        ));
        let _ = frames.push(CanFrame::new(FLAGS_FRAME_ID, &CONTROL_FLAGS));

        self.tick = self.tick.wrapping_add(1);
        frames
    }

    fn waveform_sample(&self) -> u16 {
        let phase = (self.tick % WAVE_PERIOD_TICKS) as f32 / WAVE_PERIOD_TICKS as f32;
        let value = (phase * core::f32::consts::TAU).sin() * WAVE_AMPLITUDE + WAVE_OFFSET;
        value as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_the_three_frame_set() {
        let mut payload = CyclicPayload::new();
        let frames = payload.next_frames();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].id(), STATUS_FRAME_ID);
        assert_eq!(frames[0].dlc(), 8);
        assert_eq!(frames[1].id(), WAVEFORM_FRAME_ID);
        assert_eq!(frames[1].dlc(), 2);
        assert_eq!(frames[2].id(), FLAGS_FRAME_ID);
        assert_eq!(frames[2].dlc(), 4);
        assert_eq!(frames[2].data(), &CONTROL_FLAGS);
    }

    #[test]
    fn status_counter_advances_every_tick() {
        let mut payload = CyclicPayload::new();

        for expected in 0..5u64 {
            let frames = payload.next_frames();
            let mut counter = [0u8; 8];
            counter.copy_from_slice(frames[0].data());
            assert_eq!(u64::from_le_bytes(counter), expected);
        }
    }

    #[test]
    fn waveform_stays_in_12_bit_range_and_varies() {
        let mut payload = CyclicPayload::new();
        let mut samples = Vec::new();

        for _ in 0..WAVE_PERIOD_TICKS {
            let frames = payload.next_frames();
            let mut raw = [0u8; 2];
            raw.copy_from_slice(frames[1].data());
            samples.push(u16::from_le_bytes(raw));
        }

        assert!(samples.iter().all(|&s| s < 4096));
        let min = samples.iter().min().copied().unwrap();
        let max = samples.iter().max().copied().unwrap();
        assert!(max > min, "waveform never varied");
        // Full sweep touches both extremes of the sine.
        assert!(max > 3500);
        assert!(min < 600);
    }
}
