use alba::{
    api::{io, Tuning},
    compute_params, prove, verify, Blake3Digest, Element, Params, ProveError, Prover, Verifier,
};
use rand::{rngs::StdRng, RngCore, SeedableRng};

fn random_set(count: usize, seed: u64) -> Vec<Element> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let mut b = [0u8; 32];
            rng.fill_bytes(&mut b);
            Element::from(b)
        })
        .collect()
}

fn small_params() -> Params {
    Params::new(8.0, 8.0, 8, 2).expect("valid params")
}

#[test]
fn concrete_scenario_proves_and_verifies() {
    let params = small_params();
    let u = compute_params(&params).unwrap().u;
    assert_eq!(u, 7);

    let set = random_set(10, 0xA1BA);
    let proof = prove(&params, &set).expect("honest set of 10 must prove");
    assert_eq!(proof.chain.len(), u);
    assert!(proof.chain.iter().all(|e| set.contains(e)));
    assert!(verify(&params, &proof));

    // The seed element is hashed in every check, so flipping it is fatal.
    let mut bad = proof.clone();
    bad.chain[u - 1].0[31] ^= 0xFF;
    assert!(!verify(&params, &bad));
}

#[test]
fn honest_sets_prove_across_trials() {
    let params = small_params();
    for seed in 0..20u64 {
        let set = random_set(16, seed);
        let proof = prove(&params, &set).unwrap_or_else(|e| panic!("seed {seed}: {e}"));
        assert!(verify(&params, &proof), "seed {seed}");
    }
}

#[test]
fn sets_at_exactly_n_p_prove() {
    let params = Params::new(10.0, 10.0, 32, 8).unwrap();
    for seed in 100..105u64 {
        let set = random_set(32, seed);
        let proof = prove(&params, &set).unwrap_or_else(|e| panic!("seed {seed}: {e}"));
        assert!(verify(&params, &proof));
    }
}

#[test]
fn sets_below_forgery_threshold_rarely_prove() {
    // |S| = 1 < n_f: ~112·(1/8)^6/11 expected final survivors per attempt.
    let params = small_params();
    let forged = (0..20u64)
        .filter(|&seed| prove(&params, &random_set(1, 1_000 + seed)).is_ok())
        .count();
    assert!(forged <= 1, "{forged} forgeries out of 20");

    let err = prove(&params, &random_set(1, 7)).err();
    assert!(matches!(err, None | Some(ProveError::ProofNotFound { .. })));
}

#[test]
fn proof_for_one_params_fails_under_another() {
    let params = small_params();
    let proof = prove(&params, &random_set(10, 3)).unwrap();
    // n_f = 4 halves log2(n_p/n_f) and so roughly doubles u.
    let stricter = Params::new(8.0, 8.0, 8, 4).unwrap();
    assert_eq!(compute_params(&stricter).unwrap().u, 13);
    assert!(!verify(&stricter, &proof));
}

#[test]
fn proof_file_roundtrip_still_verifies() {
    let params = small_params();
    let proof = prove(&params, &random_set(12, 9)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alba.proof");
    io::write_proof(&path, &proof).unwrap();
    let loaded = io::read_proof(&path).unwrap();
    assert_eq!(loaded, proof);
    assert!(verify(&params, &loaded));
}

#[test]
fn digest_primitive_must_match() {
    let params = small_params();
    let set = random_set(10, 11);
    let proof = Prover::<Blake3Digest>::with_digest(params).unwrap().prove(&set).unwrap();
    assert!(Verifier::<Blake3Digest>::with_digest(params).unwrap().verify(&proof));
    // Under BLAKE2b every one of the u checks is an independent draw again.
    assert!(!verify(&params, &proof));
}

#[test]
fn tuning_does_not_change_the_proof() {
    let params = Params::new(10.0, 10.0, 32, 8).unwrap();
    let set = random_set(40, 21);
    let a = Prover::new(params)
        .unwrap()
        .tuning(Tuning { parallel: false, max_population: None })
        .prove(&set)
        .unwrap();
    let b = Prover::new(params)
        .unwrap()
        .tuning(Tuning { parallel: true, max_population: Some(1 << 24) })
        .prove(&set)
        .unwrap();
    assert_eq!(a, b);
}
