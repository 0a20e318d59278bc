// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

use crate::keypair::{
    LtpaKeyPair, LtpaPrivateKey, LtpaPublicKey, LEGACY_PRIVATE_KEY_LEN,
    PUBLIC_KEY_LEN,
};
use crate::rsa::SELFTEST_RSA_KEYS;
use crate::tests::test_engine;

use serial_test::parallel;

#[test]
#[parallel]
fn test_public_key_roundtrip() {
    let material = &SELFTEST_RSA_KEYS[0].public;
    let key = LtpaPublicKey::from_material(material).expect("encode failed");
    let wire = key.encode();
    assert_eq!(wire.len(), PUBLIC_KEY_LEN);
    let back = LtpaPublicKey::decode(&wire).expect("decode failed");
    assert_eq!(back, key);
    assert_eq!(
        back.to_material().expect("bad material"),
        material.clone()
    );
}

#[test]
#[parallel]
fn test_public_from_either_form() {
    // the 2-slot public form and the 8-slot private form carry the
    // exponent in different slots; both must encode the same key
    let key = &SELFTEST_RSA_KEYS[0];
    let from_public =
        LtpaPublicKey::from_material(&key.public).expect("encode failed");
    let from_private =
        LtpaPublicKey::from_material(&key.private).expect("encode failed");
    assert_eq!(from_public, from_private);
}

#[test]
#[parallel]
fn test_decoded_modulus_stays_unsigned() {
    // both fixed moduli have the top bit set; the rebuilt material must
    // not read them as negative values
    for key in SELFTEST_RSA_KEYS.iter() {
        let pubk = LtpaPublicKey::from_material(&key.public)
            .expect("encode failed");
        let back = LtpaPublicKey::decode(&pubk.encode())
            .expect("decode failed")
            .to_material()
            .expect("bad material");
        assert_eq!(back, key.public);
        assert_eq!(
            back.modulus_bits().expect("bad modulus"),
            key.public.modulus_bits().expect("bad modulus")
        );
    }
}

#[test]
#[parallel]
fn test_legacy_private_key_roundtrip() {
    let material = &SELFTEST_RSA_KEYS[0].private;
    let key = LtpaPrivateKey::from_material(material, true)
        .expect("encode failed");
    let wire = key.encode();
    assert_eq!(wire.len(), LEGACY_PRIVATE_KEY_LEN);
    let back = LtpaPrivateKey::decode(&wire).expect("decode failed");
    assert_eq!(back, key);
    // the rederived CRT material must match the original exactly
    assert_eq!(&back.to_material().expect("bad material"), material);
}

#[test]
#[parallel]
fn test_prefixed_private_key_roundtrip() {
    let material = &SELFTEST_RSA_KEYS[0].private;
    let key = LtpaPrivateKey::from_material(material, false)
        .expect("encode failed");
    let wire = key.encode();
    assert!(wire.len() > LEGACY_PRIVATE_KEY_LEN + 4);
    let back = LtpaPrivateKey::decode(&wire).expect("decode failed");
    assert_eq!(back, key);
    assert_eq!(&back.to_material().expect("bad material"), material);
}

#[test]
#[parallel]
fn test_decoded_pair_signs() {
    let engine = test_engine();
    let material = &SELFTEST_RSA_KEYS[0].private;
    let pair = LtpaKeyPair::from_material(material, true)
        .expect("encode failed");

    let private = LtpaPrivateKey::decode(&pair.private.encode())
        .expect("decode failed")
        .to_material()
        .expect("bad material");
    let public = LtpaPublicKey::decode(&pair.public.encode())
        .expect("decode failed")
        .to_material()
        .expect("bad material");

    let msg = b"round-tripped key pair";
    let sig = engine.sign(&private, msg).expect("sign failed");
    assert!(engine.verify(&public, msg, &sig).expect("verify failed"));
}

#[test]
#[parallel]
fn test_truncated_keys_rejected() {
    let material = &SELFTEST_RSA_KEYS[0].private;
    let pair = LtpaKeyPair::from_material(material, true)
        .expect("encode failed");

    let public = pair.public.encode();
    assert!(LtpaPublicKey::decode(&public[..100]).is_err());
    assert!(LtpaPublicKey::decode(&[]).is_err());

    let private = pair.private.encode();
    assert!(LtpaPrivateKey::decode(&private[..100]).is_err());
    assert!(LtpaPrivateKey::decode(&[]).is_err());

    // a corrupt length prefix cannot resolve to a valid layout
    let mut prefixed =
        LtpaPrivateKey::from_material(material, false)
            .expect("encode failed")
            .encode();
    prefixed[0] = 0xFF;
    assert!(LtpaPrivateKey::decode(&prefixed).is_err());
}
