// src/api.rs
//! “Happy-path” crate API
//!
//! This module wraps the protocol core with a small, ergonomic surface:
//! - `Tuning`: non-protocol knobs (parallel fan-out, population cap)
//! - one-shot `prove_bytes` / `verify_proof` with `anyhow` context
//! - `estimate_population` for callers budgeting memory before a search
//! - proof I/O helpers: `io::write_proof` / `io::read_proof`
//!
//! Everything delegates to `prover::Prover` and `verifier::Verifier`. No
//! protocol changes.

#![forbid(unsafe_code)]

use crate::{
    params::{compute_params, Params},
    prover::Prover,
    verifier::Verifier,
    Element, Proof,
};

// ===============================================================================================
// Tuning
// ===============================================================================================

/// Non-binding knobs; they never change which proof is found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tuning {
    /// Fan each round out over rayon (ignored without the `parallel` feature).
    pub parallel: bool,
    /// Fail with `PopulationLimit` instead of growing a generation past this size.
    pub max_population: Option<usize>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self { parallel: cfg!(feature = "parallel"), max_population: None }
    }
}

// ===============================================================================================
/* One-shot helpers */
// ===============================================================================================

/// Prove from raw byte buffers.
pub fn prove_bytes(params: &Params, elements: &[Vec<u8>], tuning: Tuning) -> anyhow::Result<Proof> {
    let set: Vec<Element> = elements.iter().map(|b| Element::from(b.as_slice())).collect();
    let prover = Prover::new(*params).map_err(|e| anyhow::anyhow!("prover setup failed: {e}"))?;
    prover.tuning(tuning).prove(&set).map_err(|e| anyhow::anyhow!("prover failed: {e}"))
}

/// Verify, turning a rejection into an error that says why.
pub fn verify_proof(params: &Params, proof: &Proof) -> anyhow::Result<()> {
    let verifier =
        Verifier::new(*params).map_err(|e| anyhow::anyhow!("verifier setup failed: {e}"))?;
    verifier.verify_detailed(proof).map_err(|e| anyhow::anyhow!("verification failed: {e}"))
}

// ===============================================================================================
/* Population estimate */
// ===============================================================================================

/// Expected generation sizes for a set of `set_size` elements.
#[derive(Clone, Debug, PartialEq)]
pub struct PopulationEstimate {
    /// Expected size of the generation with chain length `i + 1`.
    pub per_length: Vec<f64>,
    /// Expected number of final-round survivors.
    pub final_survivors: f64,
}

impl PopulationEstimate {
    /// Largest expected generation.
    pub fn peak(&self) -> f64 {
        self.per_length.iter().copied().fold(0.0, f64::max)
    }
}

/// `d·|S|·(|S|/n_p)^r` for `r = 0..u-1`, and the expected survivors of the
/// final `⌈1/q⌉` filter.
pub fn estimate_population(params: &Params, set_size: usize) -> anyhow::Result<PopulationEstimate> {
    let dp = compute_params(params).map_err(|e| anyhow::anyhow!("invalid parameters: {e}"))?;
    let growth = set_size as f64 / params.n_p as f64;
    let mut per_length = Vec::with_capacity(dp.u);
    let mut gen = dp.d as f64 * set_size as f64;
    for _ in 0..dp.u {
        per_length.push(gen);
        gen *= growth;
    }
    let final_survivors = per_length.last().copied().unwrap_or(0.0) / dp.final_modulus() as f64;
    Ok(PopulationEstimate { per_length, final_survivors })
}

// ===============================================================================================
/* Proof I/O (magic + version + ark-compressed) */
// ===============================================================================================

pub mod io {
    //! Proof files: `magic (8) || u16 version (BE) || canonical compressed Proof`.

    use std::{fs, io::Read, io::Write, path::Path};

    use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

    use crate::Proof;

    /// 8-byte magic used by the `prover`/`verifier` CLIs.
    pub const FILE_MAGIC: &[u8; 8] = b"ALBAv1\0\0";
    /// Current file version.
    pub const FILE_VERSION: u16 = 1;

    /// Proof file failures.
    #[derive(Debug, thiserror::Error)]
    pub enum ProofIoError {
        /// Filesystem error.
        #[error("io error on {path}: {source}")]
        Io {
            /// Offending path.
            path: String,
            /// Underlying error.
            source: std::io::Error,
        },
        /// Not a proof file.
        #[error("bad proof file magic")]
        BadMagic,
        /// Written by a newer/older format.
        #[error("unsupported proof version: {0}")]
        UnsupportedVersion(u16),
        /// Payload failed to encode or decode.
        #[error("proof codec: {0}")]
        Codec(String),
    }

    /// Encode a proof into the file format (in memory).
    pub fn encode_proof(proof: &Proof) -> Result<Vec<u8>, ProofIoError> {
        let mut out = Vec::with_capacity(10 + proof.compressed_size());
        out.extend_from_slice(FILE_MAGIC);
        out.extend_from_slice(&FILE_VERSION.to_be_bytes());
        proof
            .serialize_compressed(&mut out)
            .map_err(|e| ProofIoError::Codec(format!("serialize proof: {e}")))?;
        Ok(out)
    }

    /// Decode the file format (in memory).
    pub fn decode_proof(bytes: &[u8]) -> Result<Proof, ProofIoError> {
        if bytes.len() < 10 || &bytes[..8] != FILE_MAGIC {
            return Err(ProofIoError::BadMagic);
        }
        let ver = u16::from_be_bytes([bytes[8], bytes[9]]);
        if ver != FILE_VERSION {
            return Err(ProofIoError::UnsupportedVersion(ver));
        }
        let mut slice = &bytes[10..];
        Proof::deserialize_compressed(&mut slice)
            .map_err(|e| ProofIoError::Codec(format!("deserialize proof: {e}")))
    }

    /// Write a proof file at `path`.
    pub fn write_proof(path: &Path, proof: &Proof) -> Result<(), ProofIoError> {
        let io_err = |source| ProofIoError::Io { path: path.display().to_string(), source };
        let bytes = encode_proof(proof)?;
        let mut f = fs::File::create(path).map_err(io_err)?;
        f.write_all(&bytes).map_err(io_err)?;
        f.flush().map_err(io_err)?;
        Ok(())
    }

    /// Read a proof file from `path`.
    pub fn read_proof(path: &Path) -> Result<Proof, ProofIoError> {
        let io_err = |source| ProofIoError::Io { path: path.display().to_string(), source };
        let mut f = fs::File::open(path).map_err(io_err)?;
        let mut bytes = Vec::new();
        f.read_to_end(&mut bytes).map_err(io_err)?;
        decode_proof(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::io::*;
    use super::*;

    fn sample_proof() -> Proof {
        Proof {
            tag: 42,
            chain: vec![
                Element::from(vec![3u8; 5]),
                Element::from(Vec::<u8>::new()),
                Element::from(vec![1u8, 2]),
            ],
        }
    }

    #[test]
    fn proof_file_preserves_tag_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proof.bin");
        let proof = sample_proof();
        write_proof(&path, &proof).unwrap();
        assert_eq!(read_proof(&path).unwrap(), proof);
    }

    #[test]
    fn bad_magic_and_version_are_reported() {
        let mut bytes = encode_proof(&sample_proof()).unwrap();
        bytes[9] = 7;
        assert!(matches!(decode_proof(&bytes), Err(ProofIoError::UnsupportedVersion(7))));
        bytes[0] = b'X';
        assert!(matches!(decode_proof(&bytes), Err(ProofIoError::BadMagic)));
        assert!(matches!(decode_proof(b"ALBA"), Err(ProofIoError::BadMagic)));
    }

    #[test]
    fn truncated_payload_fails_to_decode() {
        let bytes = encode_proof(&sample_proof()).unwrap();
        match decode_proof(&bytes[..bytes.len() - 1]) {
            Err(ProofIoError::Codec(msg)) => assert!(msg.starts_with("deserialize proof:"), "{msg}"),
            other => panic!("expected codec error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_proof(&dir.path().join("nope.bin")).unwrap_err();
        assert!(matches!(err, ProofIoError::Io { .. }));
    }

    #[test]
    fn json_encodes_elements_as_hex() {
        let json = serde_json::to_string(&sample_proof()).unwrap();
        assert_eq!(json, r#"{"tag":42,"chain":["0303030303","","0102"]}"#);
        let back: Proof = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample_proof());
    }

    #[test]
    fn estimate_matches_seed_and_growth() {
        let params = Params::new(8.0, 8.0, 8, 2).unwrap();
        let est = estimate_population(&params, 16).unwrap();
        assert_eq!(est.per_length.len(), 7);
        assert_eq!(est.per_length[0], 112.0 * 16.0);
        assert_eq!(est.per_length[1], 112.0 * 16.0 * 2.0);
        assert!(est.final_survivors > 1.0);
        assert_eq!(est.peak(), est.per_length[6]);
    }

    #[test]
    fn one_shot_helpers_roundtrip() {
        let params = Params::new(8.0, 8.0, 8, 2).unwrap();
        let elements: Vec<Vec<u8>> = (0u8..10).map(|i| vec![i, 0x5A, i.wrapping_mul(3)]).collect();
        let proof = prove_bytes(&params, &elements, Tuning::default()).unwrap();
        verify_proof(&params, &proof).unwrap();

        let mut forged = proof.clone();
        forged.chain.truncate(3);
        assert!(verify_proof(&params, &forged).is_err());
    }
}
