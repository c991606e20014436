//! Quantization of continuous scroll motion into wheel ticks.

use embassy_time::{Duration, Instant};

use crate::store::NUM_SENSORS;

/// Raw scroll units per standard-resolution wheel notch
pub const TICK: i32 = 120;
/// A partial notch is dropped after this long without new scroll motion
pub const STALE_TIMEOUT: Duration = Duration::from_micros(1_000_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Accumulator {
    value: i32,
    last_update: Instant,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            value: 0,
            last_update: Instant::from_ticks(0),
        }
    }
}

/// Per sensor axis scroll accumulators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollQuantizer {
    accumulators: [[Accumulator; 2]; NUM_SENSORS],
}

impl ScrollQuantizer {
    /// Convert a scroll delta of one sensor axis into the value reported to the host.
    ///
    /// In high-resolution mode the delta is passed through. Otherwise it's accumulated and
    /// whole ticks are returned, the remainder stays for the following cycles.
    pub fn quantize(&mut self, sensor: usize, axis: usize, delta: i16, high_res: bool, now: Instant) -> i16 {
        if high_res {
            return delta;
        }

        let acc = &mut self.accumulators[sensor][axis];
        if delta != 0 {
            acc.last_update = now;
            acc.value += delta as i32;
            let ticks = acc.value / TICK;
            acc.value -= ticks * TICK;
            ticks as i16
        } else {
            if acc.value != 0 && now.saturating_duration_since(acc.last_update) > STALE_TIMEOUT {
                trace!("Dropping stale scroll remainder {} of sensor {} axis {}", acc.value, sensor, axis);
                acc.value = 0;
            }
            0
        }
    }

    /// Current partial tick of a sensor axis
    pub fn accumulated(&self, sensor: usize, axis: usize) -> i32 {
        self.accumulators[sensor][axis].value
    }

    /// Drop the partial tick of a sensor axis
    pub fn reset(&mut self, sensor: usize, axis: usize) {
        self.accumulators[sensor][axis].value = 0;
    }
}
