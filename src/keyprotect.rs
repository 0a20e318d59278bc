// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! Password-based protection of exported key material
//!
//! Two primitive sets are supported. The legacy set hashes the password
//! with SHA-1 and pads the digest to a 24-byte 3DES key used in ECB mode
//! with PKCS#5 padding. The standards-approved set hashes with SHA-256
//! and uses the 32-byte digest as an AES-256-GCM key.

use crate::error::{Error, Result};

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Nonce};
use cipher::block_padding::Pkcs7;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Derived key length for the legacy 3DES set
pub const LEGACY_KEY_LEN: usize = 24;
/// Derived key length for the AES-256-GCM set
pub const FIPS_KEY_LEN: usize = 32;

/// GCM nonce length in bytes
const NONCE_LEN: usize = 12;

type TdesEcbEnc = ecb::Encryptor<des::TdesEde3>;
type TdesEcbDec = ecb::Decryptor<des::TdesEde3>;

/// Derives the protection key from a password
///
/// The legacy form is the 20-byte SHA-1 digest zero-padded to 24 bytes,
/// the approved form the full 32-byte SHA-256 digest.
pub fn derive_key(password: &[u8], fips: bool) -> Vec<u8> {
    if fips {
        Sha256::digest(password).to_vec()
    } else {
        let mut key = vec![0u8; LEGACY_KEY_LEN];
        let digest = Sha1::digest(password);
        key[..digest.len()].copy_from_slice(&digest);
        key
    }
}

/// The GCM nonce is derived from the key; a given key yields a stable
/// ciphertext like the legacy ECB mode does. Requires that each exported
/// key is encrypted exactly once under its password.
fn gcm_nonce(key: &[u8]) -> [u8; NONCE_LEN] {
    let digest = Sha256::digest(key);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&digest[..NONCE_LEN]);
    nonce
}

/// Encrypts `data` under a derived key
pub fn encrypt(data: &[u8], key: &[u8], fips: bool) -> Result<Vec<u8>> {
    if fips {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| Error::provider("invalid aes-256 key length"))?;
        let nonce = gcm_nonce(key);
        cipher
            .encrypt(Nonce::from_slice(&nonce), data)
            .map_err(|_| Error::provider("aes-gcm encryption failed"))
    } else {
        let enc = TdesEcbEnc::new_from_slice(key)
            .map_err(|_| Error::provider("invalid 3des key length"))?;
        Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(data))
    }
}

/// Decrypts `data` under a derived key
///
/// A wrong key fails outright on the approved path (the GCM tag will not
/// verify), while the legacy path can only detect it through padding
/// corruption and may return garbage instead of an error.
pub fn decrypt(data: &[u8], key: &[u8], fips: bool) -> Result<Vec<u8>> {
    if fips {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| Error::provider("invalid aes-256 key length"))?;
        let nonce = gcm_nonce(key);
        cipher
            .decrypt(Nonce::from_slice(&nonce), data)
            .map_err(|_| Error::provider("aes-gcm decryption failed"))
    } else {
        let dec = TdesEcbDec::new_from_slice(key)
            .map_err(|_| Error::provider("invalid 3des key length"))?;
        dec.decrypt_padded_vec_mut::<Pkcs7>(data)
            .map_err(|_| Error::provider("invalid 3des padding"))
    }
}
