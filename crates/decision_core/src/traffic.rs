//! Synthetic traffic level: an integer congestion proxy in `{0, 1, 2}`.
//!
//! There is no telemetry behind this. Two policies exist:
//!
//! - [`RandomTraffic`]: a uniform draw from an injected generator (match flow).
//! - [`SeededTraffic`]: a draw from a generator seeded by the trip itself
//!   (pricing flow). Identical `(distance_km, duration_min, hour, day)` tuples
//!   always produce the same level, and the draw matches numpy's legacy
//!   `RandomState(seed).choice([0, 1, 2])` exactly so the pricing model sees
//!   the distribution it was trained on.

use rand::{Rng, RngCore};
use serde::Serialize;
use thiserror::Error;

use crate::temporal::TemporalFeatures;

/// Number of distinct traffic levels.
pub const TRAFFIC_LEVELS: u32 = 3;

#[derive(Debug, Error, PartialEq)]
pub enum TrafficError {
    #[error("traffic seed {0} is outside 0..=4294967295")]
    SeedOutOfRange(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TrafficLevel(u8);

impl TrafficLevel {
    pub const LIGHT: Self = Self(0);
    pub const MODERATE: Self = Self(1);
    pub const HEAVY: Self = Self(2);

    pub fn new(level: u8) -> Option<Self> {
        (u32::from(level) < TRAFFIC_LEVELS).then_some(Self(level))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// What a traffic estimator may look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficInputs {
    pub distance_km: f64,
    pub duration_min: f64,
    pub temporal: TemporalFeatures,
}

pub trait TrafficEstimator {
    fn estimate(&mut self, inputs: &TrafficInputs) -> Result<TrafficLevel, TrafficError>;
}

/// Uniform draw from an injected generator; reproducible only if the
/// generator is.
#[derive(Debug)]
pub struct RandomTraffic<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomTraffic<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> TrafficEstimator for RandomTraffic<R> {
    fn estimate(&mut self, _inputs: &TrafficInputs) -> Result<TrafficLevel, TrafficError> {
        let level = self.rng.gen_range(0..TRAFFIC_LEVELS);
        Ok(TrafficLevel(level as u8))
    }
}

/// Deterministic level derived from the trip.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeededTraffic;

impl SeededTraffic {
    /// `trunc(distance_km * 1000 + duration_min + hour + day_of_week)`, summed
    /// left to right in f64.
    pub fn derive_seed(inputs: &TrafficInputs) -> Result<u32, TrafficError> {
        let raw = inputs.distance_km * 1000.0
            + inputs.duration_min
            + f64::from(inputs.temporal.hour_of_day)
            + f64::from(inputs.temporal.day_of_week);
        let truncated = raw.trunc();
        if !(0.0..=f64::from(u32::MAX)).contains(&truncated) {
            return Err(TrafficError::SeedOutOfRange(truncated));
        }
        Ok(truncated as u32)
    }
}

impl TrafficEstimator for SeededTraffic {
    fn estimate(&mut self, inputs: &TrafficInputs) -> Result<TrafficLevel, TrafficError> {
        let seed = Self::derive_seed(inputs)?;
        let level = draw_level(&mut Mt19937::new(seed));
        tracing::trace!(seed, level = level.value(), "seeded traffic level");
        Ok(level)
    }
}

/// Bounded draw over `0..TRAFFIC_LEVELS` using bitmask rejection, the
/// sampling numpy's legacy generator uses for small ranges.
pub fn draw_level(rng: &mut impl RngCore) -> TrafficLevel {
    let max = TRAFFIC_LEVELS - 1;
    let mask = u32::MAX >> (max.leading_zeros());
    loop {
        let candidate = rng.next_u32() & mask;
        if candidate <= max {
            return TrafficLevel(candidate as u8);
        }
    }
}

const MT_N: usize = 624;
const MT_M: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// 32-bit Mersenne Twister, seeded with `init_genrand`.
#[derive(Clone)]
pub struct Mt19937 {
    state: [u32; MT_N],
    index: usize,
}

impl std::fmt::Debug for Mt19937 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mt19937").field("index", &self.index).finish()
    }
}

impl Mt19937 {
    pub fn new(seed: u32) -> Self {
        let mut state = [0u32; MT_N];
        state[0] = seed;
        for i in 1..MT_N {
            let prev = state[i - 1];
            state[i] = 1_812_433_253u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        Self { state, index: MT_N }
    }

    fn twist(&mut self) {
        for i in 0..MT_N {
            let y = (self.state[i] & UPPER_MASK) | (self.state[(i + 1) % MT_N] & LOWER_MASK);
            let mut next = self.state[(i + MT_M) % MT_N] ^ (y >> 1);
            if y & 1 != 0 {
                next ^= MATRIX_A;
            }
            self.state[i] = next;
        }
        self.index = 0;
    }
}

impl RngCore for Mt19937 {
    fn next_u32(&mut self) -> u32 {
        if self.index >= MT_N {
            self.twist();
        }
        let mut y = self.state[self.index];
        self.index += 1;

        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^ (y >> 18)
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.next_u32());
        let high = u64::from(self.next_u32());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let word = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
