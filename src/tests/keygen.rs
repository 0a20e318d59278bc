// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

use crate::rsa::{SLOT_MODULUS, SLOT_PRIVATE_EXPONENT, SLOT_PUBLIC_EXPONENT};
use crate::tests::test_engine;

use num_bigint::{BigInt, Sign};
use num_traits::One;
use serial_test::parallel;

#[test]
#[parallel]
fn test_generate_crt_key() {
    let engine = test_engine();
    let key = engine
        .generate_rsa_key(1024, true, true, false)
        .expect("keygen failed");
    assert!(key.is_crt());
    assert_eq!(key.modulus_bits().expect("bad modulus"), 1024);
    assert_eq!(key.slot(SLOT_PUBLIC_EXPONENT), Some(&[1, 0, 1][..]));
    assert!(key.slot(SLOT_PRIVATE_EXPONENT).is_some());
    super::rsa::assert_crt_invariants(&key);

    let msg: Vec<u8> = (0..64u8).collect();
    let sig = engine.sign(&key, &msg).expect("sign failed");
    let public = key.public_key().expect("bad key");
    assert!(engine.verify(&public, &msg, &sig).expect("verify failed"));

    let mut bad_msg = msg.clone();
    bad_msg[17] ^= 0x40;
    assert!(!engine
        .verify(&public, &bad_msg, &sig)
        .expect("verify failed"));
}

#[test]
#[parallel]
fn test_generate_plain_key() {
    let engine = test_engine();
    let key = engine
        .generate_rsa_key(512, false, false, false)
        .expect("keygen failed");
    assert_eq!(key.len(), 3);
    assert_eq!(key.modulus_bits().expect("bad modulus"), 512);
    assert_eq!(key.slot(SLOT_PUBLIC_EXPONENT), Some(&[3][..]));

    let n = BigInt::from_bytes_be(
        Sign::Plus,
        key.slot(SLOT_MODULUS).expect("missing modulus"),
    );
    let e = BigInt::from(3u32);
    let d = BigInt::from_bytes_be(
        Sign::Plus,
        key.slot(SLOT_PRIVATE_EXPONENT).expect("missing exponent"),
    );
    // e*d inverts on a probe value even without the factorization
    let probe = BigInt::from(0x1234567u64);
    assert_eq!(probe.modpow(&e, &n).modpow(&d, &n), probe);
    assert!(!d.is_one());
}

#[test]
#[parallel]
fn test_generate_rejects_bad_sizes() {
    let engine = test_engine();
    assert!(engine.generate_rsa_key(100, true, true, false).is_err());
    assert!(engine.generate_rsa_key(48, true, true, false).is_err());
}

#[test]
#[parallel]
fn test_provider_path_requires_provider() {
    let engine = test_engine();
    let err = engine
        .generate_rsa_key(1024, true, true, true)
        .expect_err("provider path must fail without a provider");
    assert_eq!(err.kind(), crate::error::ErrorKind::Provider);
}

#[test]
#[parallel]
fn test_generated_keys_differ() {
    let engine = test_engine();
    let a = engine
        .generate_rsa_key(512, true, true, false)
        .expect("keygen failed");
    let b = engine
        .generate_rsa_key(512, true, true, false)
        .expect("keygen failed");
    assert_ne!(a.slot(SLOT_MODULUS), b.slot(SLOT_MODULUS));
}
