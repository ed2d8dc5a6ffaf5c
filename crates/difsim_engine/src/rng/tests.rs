//! Unit tests for the RNG module.
//!
//! This module contains tests verifying:
//! - Seed reproducibility and reseeding
//! - Gaussian pair caching order and draw consumption
//! - `RngCore` composition of raw draws
//! - Distribution properties (uniform range, normal moments)

use super::*;
use approx::assert_relative_eq;
use rand::RngCore;

const REFERENCE_KEY: [u32; 4] = [0x123, 0x234, 0x345, 0x456];

/// First raw outputs of the published reference sequence.
const REFERENCE_HEAD: [u32; 11] = [
    1_067_595_299,
    955_945_823,
    477_289_528,
    4_107_218_783,
    4_228_976_476,
    3_344_332_714,
    3_355_579_695,
    227_628_506,
    810_200_273,
    2_591_290_167,
    2_560_260_675,
];

#[test]
fn test_reference_head() {
    let mut rng = MersenneTwister::from_seed_array(&REFERENCE_KEY);
    for &expected in &REFERENCE_HEAD {
        assert_eq!(rng.next_u32(), expected);
    }
}

#[test]
fn test_seed_reproducibility() {
    let mut rng1 = MersenneTwister::from_seed_array(&[12345, 678]);
    let mut rng2 = MersenneTwister::from_seed_array(&[12345, 678]);

    for _ in 0..2000 {
        assert_eq!(rng1.next_u32(), rng2.next_u32());
    }
    for _ in 0..100 {
        assert_eq!(rng1.next_gaussian(), rng2.next_gaussian());
    }
}

#[test]
fn test_reseed_restarts_sequence_and_clears_cache() {
    let mut rng = MersenneTwister::from_seed_array(&REFERENCE_KEY);
    let _ = rng.next_gaussian();
    assert!(rng.has_cached_gaussian());

    rng.reseed(&REFERENCE_KEY);
    assert!(!rng.has_cached_gaussian());
    assert_eq!(rng.next_u32(), REFERENCE_HEAD[0]);
}

#[test]
fn test_empty_key_seeds_like_zero_word() {
    let mut empty = MersenneTwister::from_seed_array(&[]);
    let mut zero = MersenneTwister::from_seed_array(&[0]);
    for _ in 0..10 {
        assert_eq!(empty.next_u32(), zero.next_u32());
    }
}

#[test]
fn test_long_key_is_accepted() {
    let key: Vec<u32> = (0..1000).collect();
    let mut rng = MersenneTwister::from_seed_array(&key);
    let mut other = MersenneTwister::from_seed_array(&key[..999]);
    let a: Vec<u32> = (0..8).map(|_| rng.next_u32()).collect();
    let b: Vec<u32> = (0..8).map(|_| other.next_u32()).collect();
    assert_ne!(a, b);
}

/// The y branch of a Box-Muller pair comes first, the cached x branch
/// second, and the cached value costs no draws.
#[test]
fn test_gaussian_pair_order_and_cache() {
    let mut rng = MersenneTwister::from_seed_array(&REFERENCE_KEY);

    let g1 = rng.next_gaussian();
    assert!(rng.has_cached_gaussian());
    let g2 = rng.next_gaussian();
    assert!(!rng.has_cached_gaussian());

    assert_relative_eq!(g1, -0.797_023_741_626_261_4, max_relative = 1e-12);
    assert_relative_eq!(g2, -0.722_341_023_812_017_6, max_relative = 1e-12);

    // The first trial was accepted: only two raw draws were consumed.
    assert_eq!(rng.next_u32(), REFERENCE_HEAD[2]);
}

#[test]
fn test_gaussian_rejection_consumes_draws() {
    let mut rng = MersenneTwister::from_seed_array(&REFERENCE_KEY);
    let values: Vec<f64> = (0..4).map(|_| rng.next_gaussian()).collect();

    assert_relative_eq!(values[2], 0.408_946_088_529_154_54, max_relative = 1e-12);
    assert_relative_eq!(values[3], -1.232_241_486_386_825_8, max_relative = 1e-12);

    // Second pair needed four trials: ten draws in total.
    assert_eq!(rng.next_u32(), REFERENCE_HEAD[10]);
}

#[test]
fn test_real2_range() {
    let mut rng = MersenneTwister::from_seed_array(&[42]);
    for _ in 0..10_000 {
        let value = rng.next_real2();
        assert!((0.0..1.0).contains(&value), "real2 value {} out of range", value);
    }
}

#[test]
fn test_rng_core_next_u64_high_word_first() {
    let mut rng = MersenneTwister::from_seed_array(&REFERENCE_KEY);
    assert_eq!(RngCore::next_u64(&mut rng), 0x3fa2_3623_38fa_935f);
}

#[test]
fn test_rng_core_fill_bytes_little_endian() {
    let mut rng = MersenneTwister::from_seed_array(&REFERENCE_KEY);
    let mut buffer = [0u8; 6];
    rng.fill_bytes(&mut buffer);
    assert_eq!(buffer, [35, 54, 162, 63, 95, 147]);

    // The partial trailing word consumed a whole draw
    assert_eq!(rng.next_u32(), REFERENCE_HEAD[2]);
}

#[test]
fn test_entropy_instances_differ() {
    let mut a = MersenneTwister::from_entropy().expect("entropy available");
    let mut b = MersenneTwister::from_entropy().expect("entropy available");
    let xs: Vec<u32> = (0..16).map(|_| a.next_u32()).collect();
    let ys: Vec<u32> = (0..16).map(|_| b.next_u32()).collect();
    assert_ne!(xs, ys);
}

#[test]
fn test_gaussian_moments() {
    let mut rng = MersenneTwister::from_seed_array(&[2024, 10, 18]);
    let n = 200_000;
    let samples: Vec<f64> = (0..n).map(|_| rng.next_gaussian()).collect();

    let mean = samples.iter().sum::<f64>() / n as f64;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;

    assert!(mean.abs() < 0.01, "mean {} too far from 0", mean);
    assert!((variance - 1.0).abs() < 0.02, "variance {} too far from 1", variance);
}
