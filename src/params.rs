//! Security parameters and the derived `(u, d, q)` triple
//!
//! ```text
//! loge = log2(e)
//! u    = ⌈(λ_sec + log2(λ_rel) + 1 + log2(loge)) / log2(n_p / n_f)⌉
//! d    = ⌊2·u·λ_rel / ⌊loge⌋⌋
//! q    = 2·λ_rel / (d·loge)
//! ```
//!
//! The constants are tied to the ALBA security bound; all arithmetic is done
//! in `f64` exactly as written so prover and verifier agree bit-for-bit.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Parameter validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    /// λ_sec is not a finite positive number.
    #[error("lambda_sec must be finite and positive (got {0})")]
    LambdaSec(f64),
    /// λ_rel is not a finite positive number.
    #[error("lambda_rel must be finite and positive (got {0})")]
    LambdaRel(f64),
    /// n_f is zero.
    #[error("n_f must be positive")]
    ZeroForgeryBound,
    /// n_f ≥ n_p.
    #[error("n_f must be strictly below n_p (n_f={n_f}, n_p={n_p})")]
    BoundsOrder {
        /// Honest lower bound.
        n_p: u64,
        /// Forgery threshold.
        n_f: u64,
    },
    /// The formulas produced an unusable value (e.g. `u < 1`).
    #[error("degenerate derived parameter {name} = {value}")]
    Degenerate {
        /// Which derived value.
        name: &'static str,
        /// The raw floating value before rounding.
        value: f64,
    },
}

/// Protocol parameters shared by the prover and the verifier.
///
/// Construct with [`Params::new`]; deserialized values should be passed
/// through [`Params::validate`] before use (the prover and verifier do this
/// themselves).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Security parameter λ_sec (bits); bounds the chance an honest prover fails.
    pub lambda_sec: f64,
    /// Soundness parameter λ_rel (bits); bounds the chance a forgery verifies.
    pub lambda_rel: f64,
    /// Claimed lower bound on the honest set size.
    pub n_p: u64,
    /// Forgery threshold, `n_f < n_p`.
    pub n_f: u64,
}

impl Params {
    /// Build and validate.
    pub fn new(lambda_sec: f64, lambda_rel: f64, n_p: u64, n_f: u64) -> Result<Self, ParamsError> {
        let p = Self { lambda_sec, lambda_rel, n_p, n_f };
        p.validate()?;
        Ok(p)
    }

    /// Check the raw parameter constraints.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(self.lambda_sec.is_finite() && self.lambda_sec > 0.0) {
            return Err(ParamsError::LambdaSec(self.lambda_sec));
        }
        if !(self.lambda_rel.is_finite() && self.lambda_rel > 0.0) {
            return Err(ParamsError::LambdaRel(self.lambda_rel));
        }
        if self.n_f == 0 {
            return Err(ParamsError::ZeroForgeryBound);
        }
        if self.n_f >= self.n_p {
            return Err(ParamsError::BoundsOrder { n_p: self.n_p, n_f: self.n_f });
        }
        Ok(())
    }

    /// Shorthand for [`compute_params`].
    #[inline]
    pub fn derive(&self) -> Result<DerivedParams, ParamsError> {
        compute_params(self)
    }
}

/// `(u, d, q)` as derived from [`Params`]. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedParams {
    /// Proof chain length.
    pub u: usize,
    /// Round-tag space / search width.
    pub d: u64,
    /// Acceptance probability of the final filter.
    pub q: f64,
}

impl DerivedParams {
    /// Modulus of the final filter, `⌈1/q⌉`.
    #[inline]
    pub fn final_modulus(&self) -> u64 {
        (1.0 / self.q).ceil() as u64
    }
}

/// Derive `(u, d, q)` from validated parameters.
pub fn compute_params(params: &Params) -> Result<DerivedParams, ParamsError> {
    params.validate()?;

    let loge = std::f64::consts::E.log2();
    let numer = params.lambda_sec + params.lambda_rel.log2() + 1.0 + loge.log2();
    let denom = (params.n_p as f64 / params.n_f as f64).log2();

    let u = (numer / denom).ceil();
    if !(u.is_finite() && u >= 1.0 && u <= usize::MAX as f64) {
        return Err(ParamsError::Degenerate { name: "u", value: u });
    }

    let d = (2.0 * u * params.lambda_rel / loge.floor()).floor();
    if !(d.is_finite() && d >= 1.0 && d <= u64::MAX as f64) {
        return Err(ParamsError::Degenerate { name: "d", value: d });
    }

    let q = 2.0 * params.lambda_rel / (d * loge);
    if !(q.is_finite() && q > 0.0) {
        return Err(ParamsError::Degenerate { name: "q", value: q });
    }

    Ok(DerivedParams { u: u as usize, d: d as u64, q })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_scenario_values() {
        // numer = 8 + 3 + 1 + log2(1.4427) ≈ 12.53, denom = 2 ⇒ u = 7
        let p = Params::new(8.0, 8.0, 8, 2).unwrap();
        let dp = compute_params(&p).unwrap();
        assert_eq!(dp.u, 7);
        assert_eq!(dp.d, 112);
        // 1/q = 112·log2(e)/16 ≈ 10.1
        assert_eq!(dp.final_modulus(), 11);
    }

    #[test]
    fn derivation_is_deterministic() {
        let p = Params::new(128.0, 128.0, 600, 400).unwrap();
        let a = compute_params(&p).unwrap();
        let b = compute_params(&p).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.q.to_bits(), b.q.to_bits());
    }

    #[test]
    fn tighter_ratio_needs_longer_chain() {
        let wide = compute_params(&Params::new(64.0, 64.0, 1000, 100).unwrap()).unwrap();
        let tight = compute_params(&Params::new(64.0, 64.0, 1000, 800).unwrap()).unwrap();
        assert!(tight.u > wide.u);
        assert!(tight.d > wide.d);
    }

    #[test]
    fn final_modulus_tracks_chain_length() {
        // ⌈1/q⌉ = ⌈d·loge / (2·λ_rel)⌉ = ⌈u·loge⌉
        let p = Params::new(40.0, 40.0, 1000, 500).unwrap();
        let dp = compute_params(&p).unwrap();
        let expected = (dp.u as f64 * std::f64::consts::LOG2_E).ceil() as u64;
        assert!(dp.final_modulus().abs_diff(expected) <= 1);
    }

    #[test]
    fn rejects_bad_params() {
        assert_eq!(
            Params::new(8.0, 8.0, 8, 8),
            Err(ParamsError::BoundsOrder { n_p: 8, n_f: 8 })
        );
        assert_eq!(Params::new(8.0, 8.0, 8, 0), Err(ParamsError::ZeroForgeryBound));
        assert_eq!(Params::new(0.0, 8.0, 8, 2), Err(ParamsError::LambdaSec(0.0)));
        assert!(matches!(Params::new(8.0, f64::NAN, 8, 2), Err(ParamsError::LambdaRel(_))));
        assert!(Params::new(8.0, -1.0, 8, 2).is_err());
    }

    #[test]
    fn compute_validates_deserialized_params() {
        let raw = Params { lambda_sec: 8.0, lambda_rel: 8.0, n_p: 2, n_f: 8 };
        assert!(compute_params(&raw).is_err());
    }

    #[test]
    fn degenerate_chain_length_is_rejected() {
        // λ_rel tiny ⇒ log2(λ_rel) dominates and pushes u below one.
        let p = Params::new(0.5, 1e-6, 8, 2).unwrap();
        assert!(matches!(compute_params(&p), Err(ParamsError::Degenerate { name: "u", .. })));
    }

    #[test]
    fn params_json_roundtrip() {
        let p = Params::new(10.0, 12.0, 100, 60).unwrap();
        let s = serde_json::to_string(&p).unwrap();
        let back: Params = serde_json::from_str(&s).unwrap();
        assert_eq!(p, back);
    }
}
