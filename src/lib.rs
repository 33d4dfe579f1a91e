//! Crate root: public surface, core types, and protocol-wide invariants
//!
//! `alba` implements an **Approximate Lower Bound Argument**: a prover holding
//! a set `S_p` of (believed) at least `n_p` elements produces a short proof
//! that convinces any verifier that `|S_p| ≥ n_f`, for some `n_f < n_p`. The
//! argument is non-interactive and purely hash-based.
//!
//! ## Invariants
//!
//! - **Derived parameters are a pure function of [`Params`].** Prover and
//!   verifier both call [`compute_params`]; nothing derived is ever persisted.
//!
//! - **Fixed hash composition.** Integers, byte buffers, sequences and pairs
//!   hash through the rules in [`hash`] on top of a single injected 256-bit
//!   primitive (BLAKE2b-256 by default).
//!
//! - **Proof shape.** A [`Proof`] is a round tag plus an ordered chain of
//!   exactly `u` elements. The chain is grown by *prepending*, so the
//!   verifier replays the acceptance tests from the last element backwards.
//!
//! - **Total verification.** [`verify`] never panics and never errors: every
//!   malformed or adversarial input resolves to `false`.
//!
//! ```
//! use alba::{prove, verify, Element, Params};
//!
//! let params = Params::new(8.0, 8.0, 8, 2)?;
//! let set: Vec<Element> = (0u8..10).map(|i| Element::from(vec![i; 32])).collect();
//!
//! let proof = prove(&params, &set)?;
//! assert!(verify(&params, &proof));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Hash composition and the injected digest primitive.
pub mod hash;
/// Hash-derived uniform sampling over `[0, n)`.
pub mod oracle;
/// Security parameters and the derived `(u, d, q)` triple.
pub mod params;
/// Round-based chain search producing a [`Proof`].
pub mod prover;
/// Replay of the chain acceptance tests.
pub mod verifier;
/// Convenience surface: tuning knobs, one-shot helpers, proof file I/O.
pub mod api;

/// A 256-bit digest.
pub type Digest = [u8; 32];

pub use crate::hash::{Blake2b256, Blake3Digest, DigestPrimitive, Hashable};
pub use crate::oracle::OracleError;
pub use crate::params::{compute_params, DerivedParams, Params, ParamsError};
pub use crate::prover::{prove, ProveError, ProveStats, Prover};
pub use crate::verifier::{verify, VerifyError, Verifier};

// ============================================================================
// Elements and proofs
// ============================================================================

/// An opaque member of the prover's set.
///
/// The protocol never looks inside an element; it only hashes it. JSON
/// encodings carry the bytes as a lowercase hex string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, CanonicalSerialize, CanonicalDeserialize)]
pub struct Element(pub Vec<u8>);

impl Element {
    /// Borrow the raw bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes in the element.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` for the zero-length element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Element {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Element {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Element {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s.trim()).map(Element).map_err(serde::de::Error::custom)
    }
}

/// The ALBA proof object.
///
/// Order of `chain` is significant: the hash chain is order-sensitive, so any
/// storage or wire encoding must keep both the tag and the element order.
#[derive(
    Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct Proof {
    /// Round tag `t ∈ [1, d]` selecting the search lane the chain came from.
    pub tag: u64,
    /// Exactly `u` elements, most recently prepended first.
    pub chain: Vec<Element>,
}

impl Proof {
    /// Length of the element chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// `true` if the chain is empty (never the case for a produced proof).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}
