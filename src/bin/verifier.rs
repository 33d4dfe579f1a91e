//! Minimal CLI verifier
//!
//! Reads a proof file written by `prover`:
//!   magic: b"ALBAv1\0\0" (8 bytes) + u16 version (=1) + ark-compressed `Proof`
//!
//! Parameters are never taken from the proof: pass the same `--params` file or
//! `--lambda-sec/--lambda-rel/--n-p/--n-f` flags the prover used, and the same
//! `--digest`. Exits non-zero on rejection.

#![forbid(unsafe_code)]

use std::{env, fs, path::Path};

use alba::{
    api::io,
    hash::{Blake2b256, Blake3Digest, DigestPrimitive},
    Params, Proof, Verifier,
};
use tracing::info;

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

fn parse_num<T: std::str::FromStr>(args: &[String], key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match parse_flag(args, key) {
        Some(s) => s.parse::<T>().map_err(|e| anyhow::anyhow!("{key} `{s}`: {e}")),
        None => Ok(default),
    }
}

fn load_params(args: &[String]) -> anyhow::Result<Params> {
    if let Some(p) = parse_flag(args, "--params") {
        let text = fs::read_to_string(&p).map_err(|e| anyhow::anyhow!("read params {p}: {e}"))?;
        let params: Params =
            serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("parse params {p}: {e}"))?;
        params.validate().map_err(|e| anyhow::anyhow!("params {p}: {e}"))?;
        return Ok(params);
    }
    let params = Params::new(
        parse_num(args, "--lambda-sec", 8.0)?,
        parse_num(args, "--lambda-rel", 8.0)?,
        parse_num(args, "--n-p", 8)?,
        parse_num(args, "--n-f", 2)?,
    )?;
    Ok(params)
}

fn run<D: DigestPrimitive>(params: Params, proof: &Proof) -> anyhow::Result<()> {
    let verifier = Verifier::<D>::with_digest(params)?;
    let dp = verifier.derived();
    info!(u = dp.u, d = dp.d, tag = proof.tag, len = proof.len(), digest = D::NAME, "verifying");
    verifier
        .verify_detailed(proof)
        .map_err(|e| anyhow::anyhow!("verification failed: {e}"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "alba=info,verifier=info".into()))
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = env::args().collect();
    let params = load_params(&args)?;

    let path = parse_flag(&args, "--proof").unwrap_or_else(|| "proof.bin".to_string());
    let proof = io::read_proof(Path::new(&path))?;

    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(&proof)?);
    }

    match parse_flag(&args, "--digest").as_deref().unwrap_or("blake2b") {
        "blake2b" | "blake2b-256" => run::<Blake2b256>(params, &proof)?,
        "blake3" => run::<Blake3Digest>(params, &proof)?,
        other => {
            return Err(anyhow::anyhow!("unknown --digest `{other}` (expected blake2b or blake3)"))
        }
    }
    println!("✔ proof verified ({path})");
    Ok(())
}
