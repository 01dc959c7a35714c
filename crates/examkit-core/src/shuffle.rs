//! Seeded, deterministic Fisher–Yates shuffle.
//!
//! All randomness flows from the seed string: the generator is
//! `Pcg64Mcg`, a fixed published algorithm, so the same `(items, seed)`
//! pair produces a bit-for-bit identical permutation on any machine and
//! any release. Nothing here reads the clock or any other ambient state.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

use crate::seed::seed_to_u64;

/// Return a seeded permutation of `items`. The input is never mutated;
/// an empty input yields an empty output.
pub fn shuffle<T: Clone>(items: &[T], seed: &str) -> Vec<T> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed_to_u64(seed));
    let mut shuffled = items.to_vec();
    // Fisher-Yates, one fresh draw per step.
    for i in (1..shuffled.len()).rev() {
        let j = (rng.next_u64() % (i as u64 + 1)) as usize;
        shuffled.swap(i, j);
    }
    shuffled
}
