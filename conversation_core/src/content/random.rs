//! Random sources for picking among content variants.
//!
//! Variant selection is random in production so the bot's phrasing varies.
//! Tests inject [`SeededRandom`] or [`FixedIndex`] to make the choice
//! reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Picks an index in `0..len`. Callers never pass `len == 0`.
pub trait RandomSource: Send + Sync {
    fn pick(&self, len: usize) -> usize;
}

/// Uniform choice from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Uniform choice from a seeded generator; the same seed yields the same
/// sequence of picks.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn pick(&self, len: usize) -> usize {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0..len),
            Err(poisoned) => poisoned.into_inner().gen_range(0..len),
        }
    }
}

/// Always picks the same index (clamped to the range). Handy for asserting an
/// exact variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedIndex(pub usize);

impl RandomSource for FixedIndex {
    fn pick(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}
