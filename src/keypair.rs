// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! Fixed-layout encoding of exported key pairs
//!
//! The public key is a 132-byte concatenation of a 129-byte modulus and a
//! 3-byte exponent, both unsigned big-endian and zero padded on the left.
//! The private key exists in two layouts: the legacy 133-byte form
//! `e(3) || p(65) || q(65)` and a longer form that prefixes it with a
//! 4-byte big-endian length and the private exponent,
//! `len(4) || d || e(3) || p(65) || q(65)`.

use crate::error::{Error, Result};
use crate::rsa::{
    RsaKeyMaterial, SLOT_MODULUS, SLOT_PRIME_P, SLOT_PRIME_Q,
    SLOT_PRIVATE_EXPONENT, SLOT_PUBLIC_EXPONENT,
};

/// Encoded modulus field length
pub const MODULUS_LEN: usize = 129;
/// Encoded public exponent field length
pub const EXPONENT_LEN: usize = 3;
/// Encoded prime field length
pub const PRIME_LEN: usize = 65;
/// Total encoded public key length
pub const PUBLIC_KEY_LEN: usize = MODULUS_LEN + EXPONENT_LEN;
/// Total encoded legacy private key length
pub const LEGACY_PRIVATE_KEY_LEN: usize = EXPONENT_LEN + 2 * PRIME_LEN;

/// Fits an unsigned big-endian value into a fixed-width field, stripping
/// leading zeros or padding on the left as needed
fn fixed_field(value: &[u8], len: usize) -> Result<Vec<u8>> {
    let stripped = match value.iter().position(|b| *b != 0) {
        Some(i) => &value[i..],
        None => &value[value.len()..],
    };
    if stripped.len() > len {
        return Err(Error::malformed("value too large for field"));
    }
    let mut out = vec![0u8; len];
    out[len - stripped.len()..].copy_from_slice(stripped);
    Ok(out)
}

/// Minimal signed encoding of an unsigned value; a zero byte is kept in
/// front when the top bit is set so the value never reads as negative
fn trimmed(value: &[u8]) -> Vec<u8> {
    let stripped = match value.iter().position(|b| *b != 0) {
        Some(i) => &value[i..],
        None => return vec![0],
    };
    let mut out = Vec::with_capacity(stripped.len() + 1);
    if stripped[0] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(stripped);
    out
}

fn required(material: &RsaKeyMaterial, slot: usize) -> Result<&[u8]> {
    material
        .slot(slot)
        .ok_or_else(|| Error::malformed("missing key slot"))
}

/// An LTPA public key, modulus and exponent
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LtpaPublicKey {
    modulus: Vec<u8>,
    exponent: Vec<u8>,
}

impl LtpaPublicKey {
    /// Builds the fixed-width fields from key material
    ///
    /// Accepts any of the slot forms; the 2-slot `[n, e]` public form
    /// keeps the exponent right after the modulus.
    pub fn from_material(material: &RsaKeyMaterial) -> Result<LtpaPublicKey> {
        let e_slot = if material.len() == 2 {
            1
        } else {
            SLOT_PUBLIC_EXPONENT
        };
        Ok(LtpaPublicKey {
            modulus: fixed_field(
                required(material, SLOT_MODULUS)?,
                MODULUS_LEN,
            )?,
            exponent: fixed_field(
                required(material, e_slot)?,
                EXPONENT_LEN,
            )?,
        })
    }

    /// Serializes to the 132-byte wire form
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PUBLIC_KEY_LEN);
        out.extend_from_slice(&self.modulus);
        out.extend_from_slice(&self.exponent);
        out
    }

    /// Parses the 132-byte wire form
    pub fn decode(bytes: &[u8]) -> Result<LtpaPublicKey> {
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(Error::malformed("bad public key length"));
        }
        Ok(LtpaPublicKey {
            modulus: bytes[..MODULUS_LEN].to_vec(),
            exponent: bytes[MODULUS_LEN..].to_vec(),
        })
    }

    /// Converts to `[n, e]` key material
    pub fn to_material(&self) -> Result<RsaKeyMaterial> {
        RsaKeyMaterial::from_slots(vec![
            Some(trimmed(&self.modulus)),
            Some(trimmed(&self.exponent)),
        ])
    }
}

/// An LTPA private key
///
/// Carries the public exponent and both primes; the private exponent is
/// present only in the longer layout and is otherwise rederived on use.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LtpaPrivateKey {
    private_exponent: Option<Vec<u8>>,
    exponent: Vec<u8>,
    prime_p: Vec<u8>,
    prime_q: Vec<u8>,
}

impl LtpaPrivateKey {
    /// Builds the fixed-width fields from CRT key material
    ///
    /// `legacy` drops the private exponent so that `encode` emits the
    /// 133-byte layout.
    pub fn from_material(
        material: &RsaKeyMaterial,
        legacy: bool,
    ) -> Result<LtpaPrivateKey> {
        let private_exponent = if legacy {
            None
        } else {
            Some(trimmed(required(material, SLOT_PRIVATE_EXPONENT)?))
        };
        Ok(LtpaPrivateKey {
            private_exponent,
            exponent: fixed_field(
                required(material, SLOT_PUBLIC_EXPONENT)?,
                EXPONENT_LEN,
            )?,
            prime_p: fixed_field(
                required(material, SLOT_PRIME_P)?,
                PRIME_LEN,
            )?,
            prime_q: fixed_field(
                required(material, SLOT_PRIME_Q)?,
                PRIME_LEN,
            )?,
        })
    }

    /// Serializes to the layout matching the stored fields
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if let Some(ref d) = self.private_exponent {
            out.extend_from_slice(&(d.len() as u32).to_be_bytes());
            out.extend_from_slice(d);
        }
        out.extend_from_slice(&self.exponent);
        out.extend_from_slice(&self.prime_p);
        out.extend_from_slice(&self.prime_q);
        out
    }

    /// Parses either private key layout, selected by total length
    ///
    /// A length-prefixed key whose total length happens to be 133 bytes
    /// is indistinguishable from the legacy layout and is parsed as
    /// legacy; such keys do not occur with the field widths in use.
    pub fn decode(bytes: &[u8]) -> Result<LtpaPrivateKey> {
        if bytes.len() == LEGACY_PRIVATE_KEY_LEN {
            return Ok(LtpaPrivateKey {
                private_exponent: None,
                exponent: bytes[..EXPONENT_LEN].to_vec(),
                prime_p: bytes[EXPONENT_LEN..EXPONENT_LEN + PRIME_LEN]
                    .to_vec(),
                prime_q: bytes[EXPONENT_LEN + PRIME_LEN..].to_vec(),
            });
        }
        if bytes.len() < 4 + LEGACY_PRIVATE_KEY_LEN {
            return Err(Error::malformed("bad private key length"));
        }
        let mut dl = [0u8; 4];
        dl.copy_from_slice(&bytes[..4]);
        let dl = u32::from_be_bytes(dl) as usize;
        if bytes.len() != 4 + dl + LEGACY_PRIVATE_KEY_LEN {
            return Err(Error::malformed("bad private key length"));
        }
        let rest = &bytes[4 + dl..];
        Ok(LtpaPrivateKey {
            private_exponent: Some(bytes[4..4 + dl].to_vec()),
            exponent: rest[..EXPONENT_LEN].to_vec(),
            prime_p: rest[EXPONENT_LEN..EXPONENT_LEN + PRIME_LEN].to_vec(),
            prime_q: rest[EXPONENT_LEN + PRIME_LEN..].to_vec(),
        })
    }

    /// Converts to completed 8-slot CRT key material
    pub fn to_material(&self) -> Result<RsaKeyMaterial> {
        let mut slots: Vec<Option<Vec<u8>>> = vec![None; 8];
        slots[SLOT_PRIVATE_EXPONENT] =
            self.private_exponent.as_ref().map(|d| trimmed(d));
        slots[SLOT_PUBLIC_EXPONENT] = Some(trimmed(&self.exponent));
        slots[SLOT_PRIME_P] = Some(trimmed(&self.prime_p));
        slots[SLOT_PRIME_Q] = Some(trimmed(&self.prime_q));
        let mut material = RsaKeyMaterial::from_slots(slots)?;
        material.complete()?;
        Ok(material)
    }
}

/// A matched public/private key pair in exported form
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LtpaKeyPair {
    /// The public half
    pub public: LtpaPublicKey,
    /// The private half
    pub private: LtpaPrivateKey,
}

impl LtpaKeyPair {
    /// Splits CRT key material into its exported halves
    pub fn from_material(
        material: &RsaKeyMaterial,
        legacy: bool,
    ) -> Result<LtpaKeyPair> {
        Ok(LtpaKeyPair {
            public: LtpaPublicKey::from_material(material)?,
            private: LtpaPrivateKey::from_material(material, legacy)?,
        })
    }
}
