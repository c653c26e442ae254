//! Deterministic shuffling and train/dev partitioning.
//!
//! Every shuffle seeds a fresh RNG, so the permutation depends only on the
//! seed and the current order, never on how many shuffles ran before.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Fraction of examples assigned to the training set.
pub const TRAIN_FRACTION: f64 = 0.8;

/// Shuffle a slice in place with a seeded Fisher-Yates permutation.
pub fn shuffle<T>(items: &mut [T], seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    items.shuffle(&mut rng);
}

/// Shuffle, then split at `floor(0.8 * N)` into (train, dev).
///
/// The two sets are disjoint and concatenate back to the shuffled list;
/// an empty input yields two empty sets.
pub fn partition<T>(mut items: Vec<T>, seed: u64) -> (Vec<T>, Vec<T>) {
    shuffle(&mut items, seed);
    let split = (TRAIN_FRACTION * items.len() as f64) as usize;
    let dev = items.split_off(split);
    (items, dev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_shuffle_is_deterministic() {
        let mut a: Vec<usize> = (0..100).collect();
        let mut b: Vec<usize> = (0..100).collect();
        shuffle(&mut a, 324);
        shuffle(&mut b, 324);
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_resets_rng_state_per_call() {
        // A second shuffle with the same seed applies the same permutation
        // function, regardless of prior calls with other seeds.
        let mut a: Vec<usize> = (0..50).collect();
        shuffle(&mut a, 7);
        let after_first = a.clone();

        let mut b: Vec<usize> = (0..50).collect();
        shuffle(&mut b, 99);
        b.copy_from_slice(&(0..50).collect::<Vec<_>>());
        shuffle(&mut b, 7);
        assert_eq!(after_first, b);
    }

    #[test]
    fn test_repeated_shuffles_compose_and_stay_reproducible() {
        // Shuffling epoch after epoch with the one run seed keeps permuting:
        // the second epoch's order differs from the first, yet replaying the
        // whole sequence from the same start reproduces every order.
        let mut a: Vec<usize> = (0..100).collect();
        shuffle(&mut a, 324);
        let epoch1 = a.clone();
        shuffle(&mut a, 324);
        let epoch2 = a.clone();
        assert_ne!(epoch1, epoch2);

        let mut b: Vec<usize> = (0..100).collect();
        shuffle(&mut b, 324);
        assert_eq!(b, epoch1);
        shuffle(&mut b, 324);
        assert_eq!(b, epoch2);
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut a: Vec<usize> = (0..100).collect();
        let mut b: Vec<usize> = (0..100).collect();
        shuffle(&mut a, 1);
        shuffle(&mut b, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_partition_sizes_floor() {
        for n in [0usize, 1, 4, 5, 9, 10, 101] {
            let items: Vec<usize> = (0..n).collect();
            let (train, dev) = partition(items, 324);
            assert_eq!(train.len(), (0.8 * n as f64) as usize);
            assert_eq!(train.len() + dev.len(), n);
        }
    }

    #[test]
    fn test_partition_is_deterministic_and_disjoint() {
        let items: Vec<usize> = (0..40).collect();
        let (train_a, dev_a) = partition(items.clone(), 324);
        let (train_b, dev_b) = partition(items, 324);
        assert_eq!(train_a, train_b);
        assert_eq!(dev_a, dev_b);

        let mut seen: HashSet<usize> = HashSet::new();
        for &x in train_a.iter().chain(dev_a.iter()) {
            assert!(seen.insert(x));
        }
        assert_eq!(seen.len(), 40);
    }

    #[test]
    fn test_empty_input() {
        let (train, dev) = partition(Vec::<usize>::new(), 324);
        assert!(train.is_empty());
        assert!(dev.is_empty());
    }
}
