// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

use crate::rsa::{
    pad_iso9796, raw_op, RsaKeyMaterial, SELFTEST_RSA_KEYS, SLOT_COEFFICIENT,
    SLOT_EXPONENT_P, SLOT_EXPONENT_Q, SLOT_MODULUS, SLOT_PRIME_P,
    SLOT_PRIME_Q, SLOT_PRIVATE_EXPONENT, SLOT_PUBLIC_EXPONENT,
};
use crate::tests::test_engine;

use num_bigint::{BigInt, Sign};
use num_traits::One;
use serial_test::parallel;

fn unsigned(key: &RsaKeyMaterial, slot: usize) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, key.slot(slot).expect("missing slot"))
}

pub fn assert_crt_invariants(key: &RsaKeyMaterial) {
    let n = unsigned(key, SLOT_MODULUS);
    let d = unsigned(key, SLOT_PRIVATE_EXPONENT);
    let e = unsigned(key, SLOT_PUBLIC_EXPONENT);
    let p = unsigned(key, SLOT_PRIME_P);
    let q = unsigned(key, SLOT_PRIME_Q);
    let dp = unsigned(key, SLOT_EXPONENT_P);
    let dq = unsigned(key, SLOT_EXPONENT_Q);
    let qinv = unsigned(key, SLOT_COEFFICIENT);
    let one = BigInt::one();

    assert!(p > q);
    assert_eq!(&p * &q, n);
    let phi = (&p - &one) * (&q - &one);
    assert!((&e * &d % &phi).is_one());
    assert_eq!(&d % (&p - &one), dp);
    assert_eq!(&d % (&q - &one), dq);
    assert!((&q * &qinv % &p).is_one());
}

#[test]
#[parallel]
fn test_selftest_material_is_consistent() {
    assert_eq!(SELFTEST_RSA_KEYS.len(), 2);
    for key in SELFTEST_RSA_KEYS.iter() {
        assert!(key.private.is_crt());
        assert_eq!(key.public.len(), 2);
        assert_crt_invariants(&key.private);
    }
}

#[test]
#[parallel]
fn test_complete_swaps_primes() {
    // feed p and q in the wrong order; completion must restore p > q and
    // rederive the coefficient
    let src = &SELFTEST_RSA_KEYS[0].private;
    let mut slots: Vec<Option<Vec<u8>>> = vec![None; 8];
    slots[SLOT_PUBLIC_EXPONENT] =
        src.slot(SLOT_PUBLIC_EXPONENT).map(|b| b.to_vec());
    slots[SLOT_PRIME_P] = src.slot(SLOT_PRIME_Q).map(|b| b.to_vec());
    slots[SLOT_PRIME_Q] = src.slot(SLOT_PRIME_P).map(|b| b.to_vec());
    let mut key = RsaKeyMaterial::from_slots(slots).expect("bad slots");
    key.complete().expect("completion failed");
    assert_crt_invariants(&key);
    assert_eq!(&key, src);
}

#[test]
#[parallel]
fn test_complete_requires_primes() {
    let mut key = RsaKeyMaterial::from_slots(vec![None; 8])
        .expect("bad slots");
    assert!(key.complete().is_err());
}

#[test]
#[parallel]
fn test_raw_roundtrip() {
    for key in SELFTEST_RSA_KEYS.iter() {
        let l = key.public.modulus_len().expect("bad modulus");
        let data: Vec<u8> = (1..=l).map(|i| (i % 128) as u8).collect();
        let enc = raw_op(true, 0, &key.public, &data).expect("enc failed");
        let dec = raw_op(false, 0, &key.private, &enc).expect("dec failed");
        assert_eq!(dec, data);
        assert_ne!(enc, data);
    }
}

#[test]
#[parallel]
fn test_iso9796_pad_shape() {
    let digest: Vec<u8> = (0..20u8).collect();
    let pad = pad_iso9796(&digest, 1024).expect("pad failed");
    assert_eq!(pad.len(), 128);
    // trailer nibble and border bit; the padded value is one bit shorter
    // than the modulus, so the border bit sits below the top bit
    assert_eq!(pad[127] & 0x0F, 0x06);
    assert_ne!(pad[0] & 0x40, 0);
    assert_eq!(pad[0] & 0x80, 0);
    // over-long input is rejected
    let big = vec![0u8; 65];
    assert!(pad_iso9796(&big, 1024).is_none());
    assert!(pad_iso9796(&[], 1024).is_none());
}

#[test]
#[parallel]
fn test_sign_verify_roundtrip() {
    let engine = test_engine();
    let key = &SELFTEST_RSA_KEYS[1];
    let msg = b"token payload: user=alice realm=testRealm expires=12345678";
    let sig = engine.sign(&key.private, msg).expect("sign failed");
    assert!(engine
        .verify(&key.public, msg, &sig)
        .expect("verify failed"));
}

#[test]
#[parallel]
fn test_verify_rejects_tampering() {
    let engine = test_engine();
    let key = &SELFTEST_RSA_KEYS[1];
    let msg = b"token payload: user=bob realm=testRealm expires=12345678";
    let sig = engine.sign(&key.private, msg).expect("sign failed");

    let mut bad_msg = msg.to_vec();
    bad_msg[10] ^= 0x01;
    assert!(!engine
        .verify(&key.public, &bad_msg, &sig)
        .expect("verify failed"));

    let mut bad_sig = sig.clone();
    bad_sig[3] ^= 0x01;
    assert!(!engine
        .verify(&key.public, msg, &bad_sig)
        .expect("verify failed"));
}
