//! Random source construction for optimizers.
//!
//! Each optimizer owns one `StdRng` seeded exactly once, either from an explicit
//! seed (reproducible runs and tests) or from the system clock. Nothing in the
//! crate reseeds per call.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Fallback seed used when the clock reads as zero.
const FALLBACK_SEED: u64 = 0x9e3779b97f4a7c15;

/// Seed derived from the current time.
pub fn seed_from_time() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    if nanos == 0 {
        FALLBACK_SEED
    } else {
        nanos
    }
}

/// Create a generator from an explicit seed, or from the clock when `None`.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    StdRng::seed_from_u64(seed.unwrap_or_else(seed_from_time))
}
