//! Hash composition over elements, integers, sequences and pairs
//!
//! The protocol only ever needs one primitive: a 256-bit digest over a byte
//! string. Everything else is built on top of it with fixed, Merkle-style
//! rules so the prover and verifier hash **exactly** the same bytes:
//!
//! - byte buffer `b`        → `D(b)`
//! - integer `x`            → `D(u64_be(x))`
//! - sequence `[x_0..x_k]`  → `D(H(x_0) || … || H(x_k))`
//! - pair `(a, b)`          → `D(H(a) || H(b))`
//!
//! The primitive `D` is injected through [`DigestPrimitive`]. BLAKE2b with a
//! 32-byte output is the default (`Blake2b256`); BLAKE3 is available for
//! callers that want it. Dispatch is static at every call site.
//!
//! ```
//! use alba::hash::{Hashable, Blake2b256, Blake3Digest};
//!
//! let a = (7u64, vec![1u64, 2, 3]).hash();
//! let b = (7u64, vec![1u64, 2, 3]).hash_with::<Blake2b256>();
//! assert_eq!(a, b);
//!
//! // A different primitive gives a different (but equally deterministic) digest.
//! assert_ne!(a, (7u64, vec![1u64, 2, 3]).hash_with::<Blake3Digest>());
//! ```

#![forbid(unsafe_code)]

use blake2::digest::consts::U32;
use blake2::Digest as _;

use crate::{Digest, Element};

type Blake2bHasher = blake2::Blake2b<U32>;

/// A stateless 256-bit collision-resistant digest over arbitrary bytes.
///
/// Implementors must be deterministic; the prover and verifier only agree if
/// they use the same primitive.
pub trait DigestPrimitive: Send + Sync {
    /// Human-readable name (logged by the CLIs).
    const NAME: &'static str;

    /// Digest `bytes` into 32 bytes.
    fn digest(bytes: &[u8]) -> Digest;
}

/// BLAKE2b with a 256-bit output (the default primitive).
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake2b256;

impl DigestPrimitive for Blake2b256 {
    const NAME: &'static str = "blake2b-256";

    #[inline]
    fn digest(bytes: &[u8]) -> Digest {
        Blake2bHasher::digest(bytes).into()
    }
}

/// BLAKE3 (default 32-byte output).
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Digest;

impl DigestPrimitive for Blake3Digest {
    const NAME: &'static str = "blake3";

    #[inline]
    fn digest(bytes: &[u8]) -> Digest {
        *blake3::hash(bytes).as_bytes()
    }
}

/// Values that can be lifted through the composition rules above.
pub trait Hashable {
    /// Digest `self` with the primitive `D`.
    fn hash_with<D: DigestPrimitive>(&self) -> Digest;

    /// Digest `self` with the default primitive ([`Blake2b256`]).
    #[inline]
    fn hash(&self) -> Digest {
        self.hash_with::<Blake2b256>()
    }
}

impl Hashable for Element {
    #[inline]
    fn hash_with<D: DigestPrimitive>(&self) -> Digest {
        D::digest(self.as_bytes())
    }
}

impl<const N: usize> Hashable for [u8; N] {
    #[inline]
    fn hash_with<D: DigestPrimitive>(&self) -> Digest {
        D::digest(self)
    }
}

impl Hashable for str {
    #[inline]
    fn hash_with<D: DigestPrimitive>(&self) -> Digest {
        D::digest(self.as_bytes())
    }
}

macro_rules! impl_hashable_uint {
    ($($t:ty),*) => {$(
        impl Hashable for $t {
            #[inline]
            fn hash_with<D: DigestPrimitive>(&self) -> Digest {
                D::digest(&(*self as u64).to_be_bytes())
            }
        }
    )*};
}

impl_hashable_uint!(u16, u32, u64, usize);

impl<T: Hashable> Hashable for [T] {
    fn hash_with<D: DigestPrimitive>(&self) -> Digest {
        let leaves: Vec<Digest> = self.iter().map(|x| x.hash_with::<D>()).collect();
        hash_digest_seq::<D>(&leaves)
    }
}

impl<T: Hashable> Hashable for Vec<T> {
    #[inline]
    fn hash_with<D: DigestPrimitive>(&self) -> Digest {
        self.as_slice().hash_with::<D>()
    }
}

impl<A: Hashable, B: Hashable> Hashable for (A, B) {
    #[inline]
    fn hash_with<D: DigestPrimitive>(&self) -> Digest {
        hash_pair_digests::<D>(&self.0.hash_with::<D>(), &self.1.hash_with::<D>())
    }
}

impl<T: Hashable + ?Sized> Hashable for &T {
    #[inline]
    fn hash_with<D: DigestPrimitive>(&self) -> Digest {
        (**self).hash_with::<D>()
    }
}

/// Digest a sequence whose items were already digested: `D(d_0 || … || d_k)`.
pub fn hash_digest_seq<D: DigestPrimitive>(leaves: &[Digest]) -> Digest {
    hash_digest_iter::<D>(leaves.iter())
}

/// Iterator form of [`hash_digest_seq`]; lets callers feed leaves in any order
/// without materializing a reordered copy.
pub fn hash_digest_iter<'a, D: DigestPrimitive>(
    leaves: impl ExactSizeIterator<Item = &'a Digest>,
) -> Digest {
    let mut buf = Vec::with_capacity(leaves.len() * 32);
    for leaf in leaves {
        buf.extend_from_slice(leaf);
    }
    D::digest(&buf)
}

/// Digest a pair whose halves were already digested: `D(a || b)`.
#[inline]
pub fn hash_pair_digests<D: DigestPrimitive>(a: &Digest, b: &Digest) -> Digest {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(a);
    buf[32..].copy_from_slice(b);
    D::digest(&buf)
}
