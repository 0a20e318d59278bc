// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! The signing engine context

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::cache::{OpCache, SignFingerprint, VerifyFingerprint};
use crate::config::Config;
use crate::dsa::{dsa_sign, dsa_verify, SELFTEST_DSA_KEYS};
use crate::entropy::{new_source, EntropySource};
use crate::error::{Error, Result};
use crate::keyprotect::{FIPS_KEY_LEN, LEGACY_KEY_LEN};
use crate::log::log_init;
use crate::rng::Rng;
use crate::rsa::{self, RsaKeyMaterial, SELFTEST_RSA_KEYS};

use constant_time_eq::constant_time_eq;
use sha1::{Digest, Sha1};

/// An external RSA backend the engine can delegate to
///
/// No provider is installed by default; operations requested with
/// `use_provider` fail with [crate::ErrorKind::Provider] until one is set.
pub trait RsaProvider: std::fmt::Debug + Send + Sync {
    /// Generates CRT key material with an `f4` or 3 public exponent
    fn generate_key(&self, bits: usize, f4: bool)
        -> Result<RsaKeyMaterial>;
    /// Produces an RSA-SHA256 signature over `data`
    fn sign_sha256(
        &self,
        key: &RsaKeyMaterial,
        data: &[u8],
    ) -> Result<Vec<u8>>;
    /// Checks an RSA-SHA256 signature over `data`
    fn verify_sha256(
        &self,
        key: &RsaKeyMaterial,
        data: &[u8],
        sig: &[u8],
    ) -> Result<bool>;
}

/// Key management and signing context
///
/// Construction runs a self test over fixed RSA and DSA key material and
/// fails if either primitive misbehaves. All operations on a shared
/// engine are thread safe; the deterministic byte generator is serialized
/// behind a mutex while the caches take their own finer lock.
pub struct SigningEngine {
    config: Config,
    rng: Mutex<Rng>,
    sign_cache: OpCache<SignFingerprint, Vec<u8>>,
    verify_cache: OpCache<VerifyFingerprint, bool>,
    provider: Option<Box<dyn RsaProvider>>,
    sign_ops: AtomicU64,
    verify_ops: AtomicU64,
}

impl SigningEngine {
    /// Creates an engine with the entropy source named by the
    /// configuration
    pub fn new(config: Config) -> Result<SigningEngine> {
        let entropy = new_source(&config.entropy);
        SigningEngine::with_entropy(config, entropy)
    }

    /// Creates an engine over an explicit entropy source
    pub fn with_entropy(
        config: Config,
        entropy: Box<dyn EntropySource>,
    ) -> Result<SigningEngine> {
        log_init();
        let rng = Rng::new(entropy, config.tr_mix)?;
        let engine = SigningEngine {
            sign_cache: OpCache::new(config.max_cache),
            verify_cache: OpCache::new(config.max_cache),
            config: config,
            rng: Mutex::new(rng),
            provider: None,
            sign_ops: AtomicU64::new(0),
            verify_ops: AtomicU64::new(0),
        };
        engine.self_test()?;
        Ok(engine)
    }

    /// Installs an external RSA backend
    pub fn set_provider(&mut self, provider: Box<dyn RsaProvider>) {
        self.provider = Some(provider);
    }

    /// The engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Round-trips fixed key material through the RSA and DSA primitives
    fn self_test(&self) -> Result<()> {
        if SELFTEST_RSA_KEYS.is_empty() || SELFTEST_DSA_KEYS.is_empty() {
            return Err(Error::consistency(
                "self test key material unavailable",
            ));
        }
        for key in SELFTEST_RSA_KEYS.iter() {
            let l = key.public.modulus_len()?;
            let data: Vec<u8> =
                (1..=l).map(|i| (i % 128) as u8).collect();
            let enc = rsa::raw_op(true, 0, &key.public, &data)?;
            let dec = rsa::raw_op(false, 0, &key.private, &enc)?;
            if dec != data {
                return Err(Error::consistency("rsa self test failed"));
            }
        }
        let digest: Vec<u8> = (1..=20u8).collect();
        for key in SELFTEST_DSA_KEYS.iter() {
            let sig = {
                let mut rng = self.rng.lock().unwrap();
                dsa_sign(&key.private, &digest, &mut rng)?
            };
            if !dsa_verify(&key.public, &digest, &sig)? {
                return Err(Error::consistency("dsa self test failed"));
            }
        }
        log::info!("self test passed");
        Ok(())
    }

    /// Signs `data` with a private key, consulting the signature cache
    ///
    /// The in-crate path signs the SHA-1 digest of `data` under
    /// ISO 9796-1 padding; with a provider installed the request is
    /// delegated as RSA-SHA256 instead.
    pub fn sign(
        &self,
        key: &RsaKeyMaterial,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        let fp = SignFingerprint::new(key, data, self.provider.is_some());
        if let Some(sig) = self.sign_cache.get(&fp) {
            log::debug!("sign cache hit, size {}", self.sign_cache.len());
            return Ok(sig);
        }
        log::debug!("sign cache miss, size {}", self.sign_cache.len());
        self.sign_ops.fetch_add(1, Ordering::Relaxed);
        let sig = match &self.provider {
            Some(p) => p.sign_sha256(key, data)?,
            None => {
                let digest = Sha1::digest(data);
                rsa::raw_op(true, 3, key, digest.as_slice())?
            }
        };
        self.sign_cache.insert(fp, sig.clone());
        Ok(sig)
    }

    /// Verifies a signature over `data`, consulting the verification
    /// cache. A well-formed but non-matching signature returns
    /// `Ok(false)`, not an error.
    pub fn verify(
        &self,
        key: &RsaKeyMaterial,
        data: &[u8],
        sig: &[u8],
    ) -> Result<bool> {
        let fp = VerifyFingerprint::new(
            key,
            data,
            sig,
            self.provider.is_some(),
        );
        if let Some(ok) = self.verify_cache.get(&fp) {
            log::debug!(
                "verify cache hit, size {}",
                self.verify_cache.len()
            );
            return Ok(ok);
        }
        log::debug!("verify cache miss, size {}", self.verify_cache.len());
        self.verify_ops.fetch_add(1, Ordering::Relaxed);
        let ok = match &self.provider {
            Some(p) => p.verify_sha256(key, data, sig)?,
            None => {
                let digest = Sha1::digest(data);
                let mlb = key.modulus_bits()? as usize;
                let recovered = rsa::raw_op(false, 3, key, sig)?;
                match rsa::pad_iso9796(digest.as_slice(), mlb) {
                    Some(expected) => {
                        expected.len() == recovered.len()
                            && constant_time_eq(&expected, &recovered)
                    }
                    None => false,
                }
            }
        };
        self.verify_cache.insert(fp, ok);
        Ok(ok)
    }

    /// Generates RSA key material
    ///
    /// `use_provider` requests the external backend and fails if none is
    /// installed, there is no implicit fallback to the in-crate path.
    pub fn generate_rsa_key(
        &self,
        bits: usize,
        crt: bool,
        f4: bool,
        use_provider: bool,
    ) -> Result<RsaKeyMaterial> {
        if use_provider {
            return match &self.provider {
                Some(p) => p.generate_key(bits, f4),
                None => Err(Error::provider("no rsa provider installed")),
            };
        }
        let mut rng = self.rng.lock().unwrap();
        RsaKeyMaterial::generate(&mut rng, bits, crt, f4)
    }

    /// Draws `n` bytes from the deterministic byte generator
    pub fn random(&self, n: usize) -> Result<Vec<u8>> {
        let mut rng = self.rng.lock().unwrap();
        rng.bytes(n)
    }

    /// Generates a shared secret key sized for the configured primitive
    /// set, 32 bytes approved and 24 bytes legacy
    pub fn generate_shared_key(&self) -> Result<Vec<u8>> {
        let n = if self.config.fips {
            FIPS_KEY_LEN
        } else {
            LEGACY_KEY_LEN
        };
        self.random(n)
    }

    /// Number of signatures computed outside the cache
    pub fn sign_op_count(&self) -> u64 {
        self.sign_ops.load(Ordering::Relaxed)
    }

    /// Number of verifications computed outside the cache
    pub fn verify_op_count(&self) -> u64 {
        self.verify_ops.load(Ordering::Relaxed)
    }

    /// Current signature cache population
    pub fn sign_cache_len(&self) -> usize {
        self.sign_cache.len()
    }

    /// Current verification cache population
    pub fn verify_cache_len(&self) -> usize {
        self.verify_cache.len()
    }
}

impl std::fmt::Debug for SigningEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningEngine")
            .field("config", &self.config)
            .field("provider", &self.provider)
            .finish()
    }
}
