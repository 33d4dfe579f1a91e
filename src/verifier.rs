//! ALBA verifier
//!
//! The prover grows chains by prepending, so the verifier walks a proof from
//! its **last** element to its first. At step `j` it hashes
//! `(tag, chain[u-1-j..])` and requires a zero oracle draw: modulus `n_p`
//! while the suffix is shorter than `u`, modulus `⌈1/q⌉` for the full chain.
//! This is exactly the sequence of filters the prover applied.
//!
//! [`verify`] is total: every failure (bad parameters, wrong length, tag out
//! of range, rejected step) resolves to `false`. [`Verifier::verify_detailed`]
//! reports which of these happened.

#![forbid(unsafe_code)]

use std::marker::PhantomData;

use tracing::trace;

use crate::{
    hash::{hash_digest_seq, hash_pair_digests, Blake2b256, DigestPrimitive, Hashable},
    oracle,
    params::{compute_params, DerivedParams, Params, ParamsError},
    Digest, Proof,
};

/// Why a proof was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VerifyError {
    /// Parameters did not validate.
    #[error("invalid parameters: {0}")]
    Params(#[from] ParamsError),
    /// Chain length differs from `u`.
    #[error("malformed proof: chain length {got}, expected {expected}")]
    MalformedLength {
        /// `u` derived from the parameters.
        expected: usize,
        /// Length of the submitted chain.
        got: usize,
    },
    /// Tag outside `[1, d]`.
    #[error("malformed proof: tag {tag} outside [1, {d}]")]
    MalformedTag {
        /// Submitted tag.
        tag: u64,
        /// Size of the tag space.
        d: u64,
    },
    /// The oracle check failed (or was rejected) at `step` (0 = last element).
    #[error("oracle check failed at step {step}")]
    Rejected {
        /// Replay step, counted from the end of the chain.
        step: usize,
    },
}

impl VerifyError {
    /// `true` for structural problems with the proof itself.
    pub fn is_malformed(&self) -> bool {
        matches!(self, VerifyError::MalformedLength { .. } | VerifyError::MalformedTag { .. })
    }
}

/// ALBA verifier bound to one parameter set and digest primitive.
#[derive(Clone, Debug)]
pub struct Verifier<D: DigestPrimitive = Blake2b256> {
    params: Params,
    derived: DerivedParams,
    _digest: PhantomData<fn() -> D>,
}

impl Verifier<Blake2b256> {
    /// Verifier using the default digest primitive.
    pub fn new(params: Params) -> Result<Self, VerifyError> {
        Self::with_digest(params)
    }
}

impl<D: DigestPrimitive> Verifier<D> {
    /// Verifier using the digest primitive `D`.
    pub fn with_digest(params: Params) -> Result<Self, VerifyError> {
        let derived = compute_params(&params)?;
        Ok(Self { params, derived, _digest: PhantomData })
    }

    /// The derived `(u, d, q)`.
    pub fn derived(&self) -> &DerivedParams {
        &self.derived
    }

    /// Accept or reject.
    pub fn verify(&self, proof: &Proof) -> bool {
        self.verify_detailed(proof).is_ok()
    }

    /// Replay the acceptance tests, reporting the first failure.
    pub fn verify_detailed(&self, proof: &Proof) -> Result<(), VerifyError> {
        let DerivedParams { u, d, .. } = self.derived;
        if proof.chain.len() != u {
            return Err(VerifyError::MalformedLength { expected: u, got: proof.chain.len() });
        }
        if proof.tag == 0 || proof.tag > d {
            return Err(VerifyError::MalformedTag { tag: proof.tag, d });
        }

        let final_modulus = self.derived.final_modulus();
        let tag = proof.tag.hash_with::<D>();
        let leaves: Vec<Digest> = proof.chain.iter().map(|e| e.hash_with::<D>()).collect();

        // Suffixes chain[start..], shortest first.
        for (step, start) in (0..u).rev().enumerate() {
            let suffix = &leaves[start..];
            let modulus = if suffix.len() < u { self.params.n_p } else { final_modulus };
            let digest = hash_pair_digests::<D>(&tag, &hash_digest_seq::<D>(suffix));
            match oracle::oracle(&digest, modulus) {
                Ok(0) => {}
                Ok(v) => {
                    trace!(step, modulus, draw = v, "verifier step failed");
                    return Err(VerifyError::Rejected { step });
                }
                Err(e) => {
                    trace!(step, modulus, error = %e, "verifier step rejected by oracle");
                    return Err(VerifyError::Rejected { step });
                }
            }
        }
        Ok(())
    }
}

/// One-shot verification with the default digest primitive.
///
/// Invalid parameters and malformed proofs both yield `false`.
pub fn verify(params: &Params, proof: &Proof) -> bool {
    Verifier::new(*params).map(|v| v.verify(proof)).unwrap_or(false)
}
