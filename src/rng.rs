//! Labeled RNG streams for deterministic replay.
//!
//! Every stochastic component owns its own stream derived from the single
//! master seed and a string label, so the fault pipeline can never perturb
//! the price trajectory (and vice versa). The DEX process uses the labels
//! `"DEX"` (engine) and `"DEX_TICKER"` (faults); the oracle process uses
//! `"ORACLE"` and `"ORACLE_TICKER"`.
//!
//! Label derivation is `seed ^ fnv1a64(label)`. FNV-1a is fixed here (not
//! `DefaultHasher`) so the derived seeds are stable across runs, machines and
//! compiler versions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Stable 64-bit FNV-1a over the label bytes.
pub fn fnv1a64(label: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in label.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Derive an independent PRNG stream from the master seed and a label.
pub fn labeled_rng(seed: u64, label: &str) -> StdRng {
    StdRng::seed_from_u64(seed ^ fnv1a64(label))
}

/// Bernoulli draw. `probability <= 0` never fires, `>= 1` always fires.
pub fn happens(rng: &mut StdRng, probability: f64) -> bool {
    if probability <= 0.0 {
        return false;
    }
    if probability >= 1.0 {
        return true;
    }
    rng.gen::<f64>() < probability
}

/// Uniform integer in `[min, max]` inclusive. Returns `min` when the range is
/// empty or inverted.
pub fn sample_range(rng: &mut StdRng, min: u64, max: u64) -> u64 {
    if min >= max {
        return min;
    }
    rng.gen_range(min..=max)
}

/// Uniform float in `[min, max]`. Returns `min` when the range is empty or
/// inverted.
pub fn sample_range_f64(rng: &mut StdRng, min: f64, max: f64) -> f64 {
    if min >= max {
        return min;
    }
    rng.gen_range(min..=max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_label_is_deterministic() {
        let mut rng1 = labeled_rng(42, "TEST");
        let mut rng2 = labeled_rng(42, "TEST");

        for _ in 0..100 {
            assert_eq!(
                sample_range(&mut rng1, 0, 1000),
                sample_range(&mut rng2, 0, 1000)
            );
        }
    }

    #[test]
    fn different_labels_diverge() {
        let mut rng1 = labeled_rng(42, "LABEL_A");
        let mut rng2 = labeled_rng(42, "LABEL_B");

        let mut all_same = true;
        for _ in 0..100 {
            if sample_range(&mut rng1, 0, 1000) != sample_range(&mut rng2, 0, 1000) {
                all_same = false;
                break;
            }
        }
        assert!(!all_same);
    }

    #[test]
    fn fnv1a64_is_stable() {
        // Pinned values guard against accidental changes to the hash: the
        // derived seeds must never move between releases.
        assert_eq!(fnv1a64(""), FNV_OFFSET_BASIS);
        assert_eq!(fnv1a64("DEX"), 0xe036_7019_91be_7b0e);
        assert_eq!(fnv1a64("DEX_TICKER"), 0x1b4a_f3ca_ff39_610d);
        assert_eq!(fnv1a64("ORACLE"), 0x4216_aa75_de4b_ea17);
        assert_eq!(fnv1a64("ORACLE_TICKER"), 0x4388_1d42_e0b3_9f46);
    }

    #[test]
    fn sample_range_inclusive_bounds() {
        let mut rng = labeled_rng(42, "TEST");
        for _ in 0..1000 {
            let val = sample_range(&mut rng, 10, 100);
            assert!((10..=100).contains(&val));
        }
        assert_eq!(sample_range(&mut rng, 7, 7), 7);
        assert_eq!(sample_range(&mut rng, 9, 3), 9);
    }

    #[test]
    fn sample_range_f64_bounds() {
        let mut rng = labeled_rng(42, "TEST");
        for _ in 0..1000 {
            let val = sample_range_f64(&mut rng, 0.25, 0.75);
            assert!((0.25..=0.75).contains(&val));
        }
        assert_eq!(sample_range_f64(&mut rng, 1.5, 1.5), 1.5);
    }

    #[test]
    fn happens_edge_probabilities() {
        let mut rng = labeled_rng(42, "TEST");

        for _ in 0..100 {
            assert!(!happens(&mut rng, 0.0));
        }
        for _ in 0..100 {
            assert!(happens(&mut rng, 1.0));
        }
    }

    #[test]
    fn happens_half_is_roughly_fair() {
        let mut rng = labeled_rng(123, "TEST");
        let fired = (0..10_000).filter(|_| happens(&mut rng, 0.5)).count();
        assert!((4500..=5500).contains(&fired), "fired {} / 10000", fired);
    }
}
