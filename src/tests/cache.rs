// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

use crate::engine::SigningEngine;
use crate::rsa::SELFTEST_RSA_KEYS;
use crate::tests::test_config;

use serial_test::parallel;

#[test]
#[parallel]
fn test_repeated_sign_hits_cache() {
    let engine = SigningEngine::new(test_config("cacheRealm"))
        .expect("engine construction failed");
    let key = &SELFTEST_RSA_KEYS[0];
    let msg = b"cached message";

    let sig1 = engine.sign(&key.private, msg).expect("sign failed");
    let sig2 = engine.sign(&key.private, msg).expect("sign failed");
    assert_eq!(sig1, sig2);
    assert_eq!(engine.sign_op_count(), 1);
    assert_eq!(engine.sign_cache_len(), 1);

    assert!(engine
        .verify(&key.public, msg, &sig1)
        .expect("verify failed"));
    assert!(engine
        .verify(&key.public, msg, &sig1)
        .expect("verify failed"));
    assert_eq!(engine.verify_op_count(), 1);
    assert_eq!(engine.verify_cache_len(), 1);
}

#[test]
#[parallel]
fn test_distinct_messages_miss() {
    let engine = SigningEngine::new(test_config("cacheRealm"))
        .expect("engine construction failed");
    let key = &SELFTEST_RSA_KEYS[0];
    for i in 0..5u8 {
        let msg = vec![i; 32];
        engine.sign(&key.private, &msg).expect("sign failed");
    }
    assert_eq!(engine.sign_op_count(), 5);
    assert_eq!(engine.sign_cache_len(), 5);
}

#[test]
#[parallel]
fn test_cache_stays_bounded() {
    let mut conf = test_config("cacheRealm");
    conf.max_cache = 10;
    let engine =
        SigningEngine::new(conf).expect("engine construction failed");
    let key = &SELFTEST_RSA_KEYS[0];

    for i in 0..30u8 {
        let msg = vec![i; 16];
        let sig = engine.sign(&key.private, &msg).expect("sign failed");
        assert!(engine
            .verify(&key.public, &msg, &sig)
            .expect("verify failed"));
    }
    assert!(engine.sign_cache_len() <= 10);
    assert!(engine.verify_cache_len() <= 10);
    assert_eq!(engine.sign_op_count(), 30);

    // at most 10 of the 30 fingerprints can still be cached; the evicted
    // ones must be recomputed on resubmission, and results stay correct
    // either way
    let before = engine.sign_op_count();
    for i in 0..30u8 {
        let msg = vec![i; 16];
        let sig = engine.sign(&key.private, &msg).expect("sign failed");
        assert!(engine
            .verify(&key.public, &msg, &sig)
            .expect("verify failed"));
    }
    assert!(engine.sign_op_count() - before >= 20);
}

#[test]
#[parallel]
fn test_reuse_survives_eviction_pressure() {
    let mut conf = test_config("cacheRealm");
    conf.max_cache = 10;
    let engine =
        SigningEngine::new(conf).expect("engine construction failed");
    let key = &SELFTEST_RSA_KEYS[0];

    // one hot entry, repeatedly reused while cold ones churn past it
    let hot = vec![0xEEu8; 16];
    engine.sign(&key.private, &hot).expect("sign failed");
    for i in 0..40u8 {
        engine.sign(&key.private, &hot).expect("sign failed");
        let msg = vec![i; 24];
        engine.sign(&key.private, &msg).expect("sign failed");
    }
    assert!(engine.sign_cache_len() <= 10);
    // 1 hot computation plus 40 cold ones; the hot entry may be evicted
    // at most a handful of times
    assert!(engine.sign_op_count() <= 46);
}
