//! The per-post randomization that gives each reader a stable-within-session,
//! shuffled ordering of their candidate posts.
//!
//! A single [`ReaderRng`] is seeded once per request and threaded through
//! every candidate in iteration order, so two requests sharing
//! `(seed, candidate order)` produce byte-identical `rand_id`s.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A request-scoped, reader-seeded randomizer. Consumed in candidate
/// iteration order; never reset mid-request.
pub struct ReaderRng(StdRng);

impl ReaderRng {
    pub fn new(seed: i64) -> Self {
        Self(StdRng::seed_from_u64(seed as u64))
    }
}

/// Shuffle the characters of `s` under `rng`, then hash the shuffled string.
///
/// This is deliberately not a great hash function — it only needs to spread
/// `cid_rev` values across the `i64` range given the rng's current state, not
/// resist collisions under adversarial input.
pub fn hashcode(s: &str, rng: &mut ReaderRng) -> i64 {
    let mut chars: Vec<char> = s.chars().collect();
    chars.shuffle(&mut rng.0);
    let shuffled: String = chars.into_iter().collect();

    let mut hasher = DefaultHasher::new();
    shuffled.hash(&mut hasher);
    hasher.finish() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_and_order_is_deterministic() {
        let candidates = ["abc", "def", "ghi"];

        let mut rng1 = ReaderRng::new(5);
        let first: Vec<i64> = candidates.iter().map(|s| hashcode(s, &mut rng1)).collect();

        let mut rng2 = ReaderRng::new(5);
        let second: Vec<i64> = candidates.iter().map(|s| hashcode(s, &mut rng2)).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn different_seed_usually_differs() {
        let mut rng1 = ReaderRng::new(1);
        let mut rng2 = ReaderRng::new(2);
        let a = hashcode("abcdefgh", &mut rng1);
        let b = hashcode("abcdefgh", &mut rng2);
        assert_ne!(a, b);
    }
}
