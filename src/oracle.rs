//! Random oracle: digest → (nearly) uniform integer in `[0, n)`
//!
//! A digest is read as a **little-endian** 256-bit integer.
//!
//! - `n = 2^k`: keep the low `k` bits. Exact, since the digest bits are
//!   uniform. `k` may go up to the full digest width (see [`oracle_pow2_bits`]).
//! - otherwise: rejection sampling. With `ε = 1e-20`, draw `i` from the
//!   power-of-two range `2^k`, `k = ⌈log2(n/ε)⌉`, and accept only when
//!   `i < ⌊2^k / n⌋·n`. The bias of the accepted draws is at most `ε`; the
//!   rejected ones surface as [`OracleError::Rejected`] and callers treat them
//!   as "predicate false".

#![forbid(unsafe_code)]

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

use crate::Digest;

/// Upper bound on the bias of the rejection sampler.
pub const EPS_FAIL: f64 = 1e-20;

/// Number of bits in a digest.
pub const DIGEST_BITS: u32 = 256;

/// Failures of the oracle. Both are recoverable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The oracle was asked to sample `[0, 0)`.
    #[error("oracle modulus must be non-zero")]
    InvalidModulus,
    /// The rejection sampler discarded the draw.
    #[error("oracle draw rejected for modulus {modulus} (bias correction)")]
    Rejected {
        /// Modulus the draw was taken for.
        modulus: u64,
    },
}

/// Exact power-of-two test (single set bit; `0` is not a power of two).
#[inline]
pub fn is_power_of_two(n: u64) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Low `bits` bits of the digest read as a little-endian integer.
///
/// `bits` is clamped to the digest width, so `bits = 256` returns the whole
/// digest.
pub fn oracle_pow2_bits(digest: &Digest, bits: u32) -> BigUint {
    let bits = bits.min(DIGEST_BITS);
    let x = BigUint::from_bytes_le(digest);
    let mask = (BigUint::one() << bits) - BigUint::one();
    x & mask
}

/// Sample `[0, n)` for a power-of-two `n`.
pub fn oracle_pow2(digest: &Digest, n: u64) -> Result<u64, OracleError> {
    if n == 0 {
        return Err(OracleError::InvalidModulus);
    }
    debug_assert!(is_power_of_two(n), "oracle_pow2 needs a power of two (got {n})");
    // n ≤ 2^63, so the low limb holds every bit we keep.
    let bits = n.trailing_zeros();
    let mut limb = [0u8; 8];
    limb.copy_from_slice(&digest[..8]);
    let x = u64::from_le_bytes(limb);
    Ok(x & ((1u64 << bits) - 1))
}

/// Sample `[0, n)` for any `n ≥ 1`.
pub fn oracle(digest: &Digest, n: u64) -> Result<u64, OracleError> {
    if n == 0 {
        return Err(OracleError::InvalidModulus);
    }
    if is_power_of_two(n) {
        return oracle_pow2(digest, n);
    }

    let k = rejection_bits(n);
    let n_big = BigUint::from(n);
    let range = BigUint::one() << k;
    let accepted = (&range / &n_big) * &n_big;

    let i = oracle_pow2_bits(digest, k);
    if i >= accepted {
        return Err(OracleError::Rejected { modulus: n });
    }
    (i % &n_big).to_u64().ok_or(OracleError::Rejected { modulus: n })
}

/// `⌈log2(n / ε)⌉`, the width of the rejection-sampling range for modulus `n`.
#[inline]
pub fn rejection_bits(n: u64) -> u32 {
    ((n as f64) / EPS_FAIL).log2().ceil() as u32
}

/// Probability that a uniform draw is rejected for modulus `n`:
/// `1 − ⌊2^k/n⌋·n / 2^k`. Zero for powers of two.
pub fn rejection_rate(n: u64) -> f64 {
    if n == 0 || is_power_of_two(n) {
        return 0.0;
    }
    let k = rejection_bits(n);
    let n_big = BigUint::from(n);
    let range = BigUint::one() << k;
    let accepted = (&range / &n_big) * &n_big;
    let gap = &range - &accepted;
    if gap.is_zero() {
        return 0.0;
    }
    // gap < n < 2^64 and 2^k fits in f64's exponent range.
    gap.to_f64().unwrap_or(0.0) / range.to_f64().unwrap_or(f64::INFINITY)
}

/// `oracle(digest, m) == 0`; rejected draws count as "not accepted".
#[inline]
pub fn accept(digest: &Digest, m: u64) -> bool {
    matches!(oracle(digest, m), Ok(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Blake2b256, DigestPrimitive};
    use proptest::prelude::*;

    fn digest_of(i: u64) -> Digest {
        Blake2b256::digest(&i.to_le_bytes())
    }

    #[test]
    fn power_of_two_test_is_exact() {
        assert!(!is_power_of_two(0));
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(1 << 63));
        assert!(!is_power_of_two((1 << 53) + 1));
        assert!(!is_power_of_two(u64::MAX));
    }

    #[test]
    fn zero_modulus_is_invalid() {
        let d = digest_of(0);
        assert_eq!(oracle(&d, 0), Err(OracleError::InvalidModulus));
        assert_eq!(oracle_pow2(&d, 0), Err(OracleError::InvalidModulus));
    }

    #[test]
    fn modulus_one_always_yields_zero() {
        for i in 0..32 {
            assert_eq!(oracle(&digest_of(i), 1), Ok(0));
        }
    }

    #[test]
    fn full_width_extraction_returns_whole_digest() {
        let d = digest_of(42);
        assert_eq!(oracle_pow2_bits(&d, 256), BigUint::from_bytes_le(&d));
        assert_eq!(oracle_pow2_bits(&d, 512), BigUint::from_bytes_le(&d));
        assert!(oracle_pow2_bits(&d, 0).is_zero());
    }

    #[test]
    fn pow2_output_is_roughly_uniform() {
        let n = 8u64;
        let trials = 8_000u64;
        let mut counts = [0u64; 8];
        for i in 0..trials {
            counts[oracle(&digest_of(i), n).unwrap() as usize] += 1;
        }
        let expected = trials / n;
        for c in counts {
            // ~6 standard deviations for a binomial(8000, 1/8).
            assert!(c.abs_diff(expected) < 200, "bucket count {c} vs {expected}");
        }
    }

    #[test]
    fn non_pow2_output_stays_in_range() {
        for n in [3u64, 5, 7, 11, 1000, u64::MAX] {
            for i in 0..64 {
                match oracle(&digest_of(i), n) {
                    Ok(v) => assert!(v < n),
                    Err(e) => assert_eq!(e, OracleError::Rejected { modulus: n }),
                }
            }
        }
    }

    #[test]
    fn rejection_rate_is_below_eps() {
        for n in [3u64, 11, 1_000_003, u64::MAX] {
            let r = rejection_rate(n);
            assert!(r <= EPS_FAIL, "rate {r} for n={n}");
        }
        assert_eq!(rejection_rate(1024), 0.0);
    }

    #[test]
    fn rejection_width_matches_formula() {
        // log2(11 / 1e-20) ≈ 69.9
        assert_eq!(rejection_bits(11), 70);
        assert_eq!(rejection_bits(3), 69);
    }

    #[test]
    fn accept_is_zero_draw() {
        for i in 0..256 {
            let d = digest_of(i);
            assert_eq!(accept(&d, 11), oracle(&d, 11) == Ok(0));
        }
    }

    proptest! {
        #[test]
        fn pow2_matches_mask_reference(bytes in proptest::array::uniform32(any::<u8>()), k in 0u32..64) {
            let n = 1u64 << k;
            let reference = oracle_pow2_bits(&bytes, k).to_u64().unwrap();
            prop_assert_eq!(oracle(&bytes, n).unwrap(), reference);
            prop_assert!(reference < n);
        }

        #[test]
        fn non_pow2_matches_big_reference(bytes in proptest::array::uniform32(any::<u8>()), n in 3u64..1_000_000) {
            prop_assume!(!is_power_of_two(n));
            let k = rejection_bits(n);
            let i = oracle_pow2_bits(&bytes, k);
            let n_big = BigUint::from(n);
            let bound = ((BigUint::one() << k) / &n_big) * &n_big;
            match oracle(&bytes, n) {
                Ok(v) => prop_assert_eq!(BigUint::from(v), i % n_big),
                Err(_) => prop_assert!(i >= bound),
            }
        }
    }
}
