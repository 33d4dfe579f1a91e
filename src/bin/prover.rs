//! Minimal CLI prover
//!
//! Builds an ALBA proof over a set of elements and writes it as a proof file:
//!   magic: b"ALBAv1\0\0" (8 bytes) + u16 version (=1) + ark-compressed `Proof`
//!
//! Elements come either from a file (`--elements path`, one hex element per
//! line, `#` starts a comment) or are generated (`--random N`, reproducible
//! with `--seed`).
//!
//! Parameters come from `--params file.json` or the individual flags
//! `--lambda-sec`, `--lambda-rel`, `--n-p`, `--n-f`.
//!
//! Other flags:
//! - `--out path` (default `proof.bin`)
//! - `--digest blake2b|blake3` (default `blake2b`; verifier must match)
//! - `--max-population N`, `--no-parallel`
//! - `--json` also prints the proof as JSON on stdout

#![forbid(unsafe_code)]

use std::{env, fs, path::Path};

use alba::{
    api::{estimate_population, io, Tuning},
    hash::{Blake2b256, Blake3Digest, DigestPrimitive},
    Element, Params, Prover,
};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use tracing::{info, warn};

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
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

fn parse_opt<T: std::str::FromStr>(args: &[String], key: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    parse_flag(args, key)
        .map(|s| s.parse::<T>().map_err(|e| anyhow::anyhow!("{key} `{s}`: {e}")))
        .transpose()
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

fn load_elements_hex(path: &Path) -> anyhow::Result<Vec<Element>> {
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read elements file {}: {e}", path.display()))?;
    let mut out = Vec::new();
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let bytes = hex::decode(line).map_err(|e| {
            anyhow::anyhow!("elements parse error at line {}: `{}` ({})", lineno + 1, line, e)
        })?;
        out.push(Element::from(bytes));
    }
    Ok(out)
}

fn random_elements(count: usize, len: usize, seed: u64) -> Vec<Element> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let mut b = vec![0u8; len];
            rng.fill_bytes(&mut b);
            Element::from(b)
        })
        .collect()
}

fn run<D: DigestPrimitive>(args: &[String], params: Params, set: &[Element]) -> anyhow::Result<()> {
    let tuning = Tuning {
        parallel: !has_flag(args, "--no-parallel") && Tuning::default().parallel,
        max_population: parse_opt(args, "--max-population")?,
    };
    let prover = Prover::<D>::with_digest(params)?.tuning(tuning);
    let dp = *prover.derived();
    info!(u = dp.u, d = dp.d, q = dp.q, digest = D::NAME, "derived parameters");

    let (proof, stats) = prover
        .prove_with_stats(set)
        .map_err(|e| anyhow::anyhow!("prover failed: {e}"))?;
    info!(tag = proof.tag, len = proof.len(), rounds = stats.rounds.len(), "proof built");

    let out = parse_flag(args, "--out").unwrap_or_else(|| "proof.bin".to_string());
    io::write_proof(Path::new(&out), &proof)?;
    println!("✔ wrote {} (tag={}, u={}, digest={})", out, proof.tag, proof.len(), D::NAME);

    if has_flag(args, "--json") {
        println!("{}", serde_json::to_string_pretty(&proof)?);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "alba=info,prover=info".into()))
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = env::args().collect();
    let params = load_params(&args)?;

    let set = if let Some(p) = parse_flag(&args, "--elements") {
        load_elements_hex(Path::new(&p))?
    } else {
        let count: usize = parse_num(&args, "--random", 10)?;
        let len: usize = parse_num(&args, "--elem-len", 32)?;
        let seed: u64 = parse_num(&args, "--seed", 0)?;
        random_elements(count, len, seed)
    };

    if (set.len() as u64) < params.n_p {
        warn!(set = set.len(), n_p = params.n_p, "set is smaller than n_p; a proof is unlikely");
    }
    let est = estimate_population(&params, set.len())?;
    info!(
        peak = est.peak(),
        final_survivors = est.final_survivors,
        "expected population"
    );

    match parse_flag(&args, "--digest").as_deref().unwrap_or("blake2b") {
        "blake2b" | "blake2b-256" => run::<Blake2b256>(&args, params, &set),
        "blake3" => run::<Blake3Digest>(&args, params, &set),
        other => Err(anyhow::anyhow!("unknown --digest `{other}` (expected blake2b or blake3)")),
    }
}
