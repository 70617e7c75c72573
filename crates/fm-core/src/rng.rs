//! Deterministic per-robot RNG for lane-retry jitter.
//!
//! # Determinism strategy
//!
//! Each robot gets its own independent `SmallRng` seeded by:
//!
//!   seed = config_seed XOR (robot_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive robot IDs uniformly across the seed space.
//! Two robots contending for the same corridor therefore draw different
//! backoffs even when spawned back to back.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::RobotId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-robot RNG owned by the robot's movement worker.
pub struct RetryRng(SmallRng);

impl RetryRng {
    /// Seed deterministically from the configured seed and a robot ID.
    pub fn new(seed: u64, robot: RobotId) -> Self {
        let seed = seed ^ (robot.0 as u64).wrapping_mul(MIXING_CONSTANT);
        RetryRng(SmallRng::seed_from_u64(seed))
    }

    /// A uniformly distributed delay in `[0, max]`.  Returns zero without
    /// touching the RNG when `max` is zero.
    pub fn jitter(&mut self, max: Duration) -> Duration {
        if max.is_zero() {
            return Duration::ZERO;
        }
        let nanos = max.as_nanos().min(u64::MAX as u128) as u64;
        Duration::from_nanos(self.0.gen_range(0..=nanos))
    }

    /// `base` plus a jitter drawn from `[0, jitter]`.
    #[inline]
    pub fn backoff(&mut self, base: Duration, jitter: Duration) -> Duration {
        base + self.jitter(jitter)
    }
}
