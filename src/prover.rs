//! Round-based chain search (the ALBA prover)
//!
//! ## Overview
//! The search keeps one generation of candidates `(tag, chain)` at a time:
//!
//! 1. **Seed.** For every tag `t ∈ [1, d]` and element `s`, a length-1
//!    candidate `(t, [s])`.
//! 2. **Growth rounds** (`u − 1` of them). Keep a candidate only if
//!    `oracle(H(tag, chain), n_p) == 0`, then prepend every element of the set
//!    to every survivor. Population shrinks by ~`n_p` and grows by `|S|`, so
//!    it stays roughly flat for honest sets.
//! 3. **Final filter.** Among the length-`u` candidates, return the first one
//!    with `oracle(H(tag, chain), ⌈1/q⌉) == 0`.
//!
//! ## Representation
//! Candidates store element *indices* in growth order (seed first), and all
//! element digests are computed once up front. The candidate digest is then
//! `D(H(tag) || D(leaf[chain[0]] || … ))` with the leaves fed back-to-front,
//! which is bit-identical to `(tag, chain).hash()` on the prepended chain.
//!
//! ## Parallelism
//! With the `parallel` feature (default) each round's filter-and-extend is a
//! rayon fan-out over the current generation; collection preserves order, so
//! parallel and sequential runs return the same proof. Cancellation and the
//! population cap are checked at round boundaries.

#![forbid(unsafe_code)]

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    api::Tuning,
    hash::{hash_digest_iter, hash_pair_digests, Blake2b256, DigestPrimitive, Hashable},
    oracle,
    params::{compute_params, DerivedParams, Params, ParamsError},
    Digest, Element, Proof,
};

/// Failures of the chain search.
#[derive(Debug, thiserror::Error)]
pub enum ProveError {
    /// Parameters did not validate.
    #[error("invalid parameters: {0}")]
    Params(#[from] ParamsError),
    /// No final-round survivor.
    #[error("no proof found ({candidates} final-round candidates, none accepted)")]
    ProofNotFound {
        /// Size of the last generation that was filtered.
        candidates: usize,
    },
    /// A generation exceeded [`Tuning::max_population`].
    #[error("population of {size} candidates at chain length {chain_len} exceeds limit {limit}")]
    PopulationLimit {
        /// Chain length of the oversized generation.
        chain_len: usize,
        /// Generation size (saturated on overflow).
        size: usize,
        /// Configured cap.
        limit: usize,
    },
    /// The cancel flag was raised.
    #[error("search cancelled at chain length {chain_len}")]
    Cancelled {
        /// Chain length of the generation that was about to be filtered.
        chain_len: usize,
    },
}

/// Per-generation sizes observed during one search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProveStats {
    /// Seed generation size (`d·|S|`).
    pub seed: usize,
    /// One entry per growth round, in order.
    pub rounds: Vec<RoundStats>,
    /// Size of the final (length-`u`) generation.
    pub final_candidates: usize,
}

/// Sizes for one growth round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoundStats {
    /// Chain length of the filtered generation.
    pub chain_len: usize,
    /// Candidates that passed the `n_p` filter.
    pub survivors: usize,
    /// Size of the next generation after prepending.
    pub next: usize,
}

/// ALBA prover bound to one parameter set and digest primitive.
#[derive(Clone, Debug)]
pub struct Prover<D: DigestPrimitive = Blake2b256> {
    params: Params,
    derived: DerivedParams,
    tuning: Tuning,
    cancel: Option<Arc<AtomicBool>>,
    _digest: PhantomData<fn() -> D>,
}

impl Prover<Blake2b256> {
    /// Prover using the default digest primitive.
    pub fn new(params: Params) -> Result<Self, ProveError> {
        Self::with_digest(params)
    }
}

impl<D: DigestPrimitive> Prover<D> {
    /// Prover using the digest primitive `D`.
    pub fn with_digest(params: Params) -> Result<Self, ProveError> {
        let derived = compute_params(&params)?;
        Ok(Self { params, derived, tuning: Tuning::default(), cancel: None, _digest: PhantomData })
    }

    /// Override the non-protocol knobs.
    pub fn tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Abandon the search at the next round boundary once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Parameters the prover was built with.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The derived `(u, d, q)`.
    pub fn derived(&self) -> &DerivedParams {
        &self.derived
    }

    /// Search for a proof over `set`.
    pub fn prove(&self, set: &[Element]) -> Result<Proof, ProveError> {
        self.prove_with_stats(set).map(|(proof, _)| proof)
    }

    /// Search for a proof and report the generation sizes.
    pub fn prove_with_stats(&self, set: &[Element]) -> Result<(Proof, ProveStats), ProveError> {
        let DerivedParams { u, d, .. } = self.derived;
        let n_p = self.params.n_p;
        let final_modulus = self.derived.final_modulus();

        let leaves: Vec<Digest> = set.iter().map(|e| e.hash_with::<D>()).collect();
        let mut stats = ProveStats::default();
        let seed_size = (d as usize).checked_mul(set.len()).unwrap_or(usize::MAX);
        self.check_population(1, seed_size)?;

        let tags: Vec<Digest> = (1..=d).map(|t| t.hash_with::<D>()).collect();
        let search = Search::<D> { leaves: &leaves, tags: &tags, _digest: PhantomData };

        let mut population: Vec<Candidate> = (1..=d)
            .flat_map(|tag| (0..set.len()).map(move |i| Candidate { tag, rev: vec![i] }))
            .collect();
        stats.seed = population.len();
        debug!(u, d, set = set.len(), seed = population.len(), "seeded candidate population");

        for chain_len in 1..u {
            self.check_cancel(chain_len)?;
            if population.is_empty() {
                break;
            }

            let survivors = search.filter(&population, n_p, self.tuning.parallel);
            let next_size = survivors.len().checked_mul(set.len()).unwrap_or(usize::MAX);
            self.check_population(chain_len + 1, next_size)?;

            let next = search.extend(&survivors, set.len(), self.tuning.parallel);
            debug!(
                chain_len,
                before = population.len(),
                survivors = survivors.len(),
                next = next.len(),
                "growth round"
            );
            stats.rounds.push(RoundStats {
                chain_len,
                survivors: survivors.len(),
                next: next.len(),
            });
            population = next;
        }

        self.check_cancel(u)?;
        stats.final_candidates = population.len();

        let winner = search.find_first(&population, final_modulus, self.tuning.parallel);
        match winner {
            Some(c) => {
                let chain: Vec<Element> = c.rev.iter().rev().map(|&i| set[i].clone()).collect();
                info!(tag = c.tag, len = chain.len(), candidates = population.len(), "proof found");
                Ok((Proof { tag: c.tag, chain }, stats))
            }
            None => {
                info!(candidates = population.len(), "no proof found");
                Err(ProveError::ProofNotFound { candidates: population.len() })
            }
        }
    }

    fn check_cancel(&self, chain_len: usize) -> Result<(), ProveError> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(ProveError::Cancelled { chain_len }),
            _ => Ok(()),
        }
    }

    fn check_population(&self, chain_len: usize, size: usize) -> Result<(), ProveError> {
        match self.tuning.max_population {
            Some(limit) if size > limit => {
                Err(ProveError::PopulationLimit { chain_len, size, limit })
            }
            _ => Ok(()),
        }
    }
}

/// One-shot proof search with the default digest primitive.
pub fn prove(params: &Params, set: &[Element]) -> Result<Proof, ProveError> {
    Prover::new(*params)?.prove(set)
}

// ------------------------ Internals ------------------------

/// A candidate chain; `rev[0]` is the seed, `rev.last()` the latest prepend.
#[derive(Clone, Debug)]
struct Candidate {
    tag: u64,
    rev: Vec<usize>,
}

impl Candidate {
    fn prepend_all(&self, set_len: usize) -> impl Iterator<Item = Candidate> + '_ {
        (0..set_len).map(move |i| {
            let mut rev = Vec::with_capacity(self.rev.len() + 1);
            rev.extend_from_slice(&self.rev);
            rev.push(i);
            Candidate { tag: self.tag, rev }
        })
    }
}

struct Search<'a, D> {
    leaves: &'a [Digest],
    tags: &'a [Digest],
    _digest: PhantomData<fn() -> D>,
}

impl<D: DigestPrimitive> Search<'_, D> {
    fn digest(&self, c: &Candidate) -> Digest {
        // Tags start at 1.
        let tag = &self.tags[(c.tag - 1) as usize];
        let chain = hash_digest_iter::<D>(c.rev.iter().rev().map(|&i| &self.leaves[i]));
        hash_pair_digests::<D>(tag, &chain)
    }

    #[inline]
    fn accepts(&self, c: &Candidate, modulus: u64) -> bool {
        oracle::accept(&self.digest(c), modulus)
    }

    fn filter<'p>(&self, population: &'p [Candidate], modulus: u64, parallel: bool) -> Vec<&'p Candidate> {
        #[cfg(feature = "parallel")]
        let kept: Vec<&Candidate> = if parallel {
            use rayon::prelude::*;
            population.par_iter().filter(|c| self.accepts(c, modulus)).collect()
        } else {
            population.iter().filter(|c| self.accepts(c, modulus)).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let kept: Vec<&Candidate> = {
            let _ = parallel;
            population.iter().filter(|c| self.accepts(c, modulus)).collect()
        };
        kept
    }

    fn extend(&self, survivors: &[&Candidate], set_len: usize, parallel: bool) -> Vec<Candidate> {
        #[cfg(feature = "parallel")]
        let next: Vec<Candidate> = if parallel {
            use rayon::prelude::*;
            survivors.par_iter().flat_map_iter(|c| c.prepend_all(set_len)).collect()
        } else {
            survivors.iter().flat_map(|c| c.prepend_all(set_len)).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let next: Vec<Candidate> = {
            let _ = parallel;
            survivors.iter().flat_map(|c| c.prepend_all(set_len)).collect()
        };
        next
    }

    fn find_first<'p>(&self, population: &'p [Candidate], modulus: u64, parallel: bool) -> Option<&'p Candidate> {
        #[cfg(feature = "parallel")]
        let found = if parallel {
            use rayon::prelude::*;
            population.par_iter().find_first(|c| self.accepts(c, modulus))
        } else {
            population.iter().find(|c| self.accepts(c, modulus))
        };
        #[cfg(not(feature = "parallel"))]
        let found = {
            let _ = parallel;
            population.iter().find(|c| self.accepts(c, modulus))
        };
        found
    }
}
