//! Canned answers and the process-wide random source used to pick among them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Mutex;

pub const ANSWER_KEY_MIN: u32 = 1;
pub const ANSWER_KEY_MAX: u32 = 9;

/// Read-only lookup of canned answers keyed 1..=9. Built once at startup.
#[derive(Debug, Clone, Default)]
pub struct CannedAnswers {
    answers: HashMap<u32, String>,
}

impl CannedAnswers {
    pub fn new(entries: impl IntoIterator<Item = (u32, String)>) -> Self {
        Self {
            answers: entries
                .into_iter()
                .filter(|(k, _)| Self::key_range().contains(k))
                .collect(),
        }
    }

    /// Keys a draw may land on.
    pub fn key_range() -> RangeInclusive<u32> {
        ANSWER_KEY_MIN..=ANSWER_KEY_MAX
    }

    /// Answer for `key`; an unconfigured key yields "".
    pub fn get(&self, key: u32) -> &str {
        self.answers.get(&key).map(String::as_str).unwrap_or("")
    }

    pub fn configured(&self) -> usize {
        self.answers.len()
    }
}

/// Single random source for the whole process, seeded once.
pub struct Dice {
    rng: Mutex<StdRng>,
}

impl Dice {
    /// Seed from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic dice for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Uniform draw from an inclusive range.
    pub fn roll(&self, range: RangeInclusive<u32>) -> u32 {
        // A poisoned lock still holds a usable rng.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(range)
    }

    /// Uniform index into a collection of `len` items; None when empty.
    pub fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Some(rng.gen_range(0..len))
    }
}

impl std::fmt::Debug for Dice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dice").finish_non_exhaustive()
    }
}
