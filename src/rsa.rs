// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! Slot-based RSA key material, manual key generation and the raw
//! public/private operation with ISO 9796-1 padding

use crate::error::{Error, Result};
use crate::prime::{is_probable_prime, mod_inverse};
use crate::rng::Rng;

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::One;
use once_cell::sync::Lazy;

/// Modulus slot
pub const SLOT_MODULUS: usize = 0;
/// Private exponent slot
pub const SLOT_PRIVATE_EXPONENT: usize = 1;
/// Public exponent slot
pub const SLOT_PUBLIC_EXPONENT: usize = 2;
/// Larger prime factor slot
pub const SLOT_PRIME_P: usize = 3;
/// Smaller prime factor slot
pub const SLOT_PRIME_Q: usize = 4;
/// d mod (p-1) slot
pub const SLOT_EXPONENT_P: usize = 5;
/// d mod (q-1) slot
pub const SLOT_EXPONENT_Q: usize = 6;
/// q^-1 mod p slot
pub const SLOT_COEFFICIENT: usize = 7;

/// Miller-Rabin rounds used during key generation
const PRIME_ROUNDS: u32 = 32;

/// RSA key material as an array of big-endian two's complement integers
///
/// Three forms exist: a 2-slot public key `[n, e]`, a 3-slot private key
/// `[n, d, e]` and an 8-slot CRT private key that adds `p`, `q`,
/// `d mod (p-1)`, `d mod (q-1)` and `q^-1 mod p`, with `p > q`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RsaKeyMaterial {
    slots: Vec<Option<Vec<u8>>>,
}

fn parse_signed(slot: &Option<Vec<u8>>) -> Result<BigInt> {
    match slot {
        Some(b) => Ok(BigInt::from_signed_bytes_be(b)),
        None => Err(Error::malformed("missing key slot")),
    }
}

fn parse_unsigned(slot: &Option<Vec<u8>>) -> Option<BigInt> {
    slot.as_ref()
        .map(|b| BigInt::from_bytes_be(Sign::Plus, b))
}

impl RsaKeyMaterial {
    /// Wraps raw slots; only the 2, 3 and 8 slot forms are accepted
    pub fn from_slots(slots: Vec<Option<Vec<u8>>>) -> Result<RsaKeyMaterial> {
        match slots.len() {
            2 | 3 | 8 => Ok(RsaKeyMaterial { slots: slots }),
            _ => Err(Error::malformed("unsupported key slot count")),
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True for the 8-slot CRT form
    pub fn is_crt(&self) -> bool {
        self.slots.len() == 8
    }

    /// Returns a slot's encoded bytes
    pub fn slot(&self, i: usize) -> Option<&[u8]> {
        match self.slots.get(i) {
            Some(Some(b)) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub(crate) fn raw_slots(&self) -> &[Option<Vec<u8>>] {
        &self.slots
    }

    /// Extracts the `[n, e]` public key
    pub fn public_key(&self) -> Result<RsaKeyMaterial> {
        let n = self
            .slot(SLOT_MODULUS)
            .ok_or_else(|| Error::malformed("missing modulus"))?;
        let e = self
            .slot(SLOT_PUBLIC_EXPONENT)
            .ok_or_else(|| Error::malformed("missing public exponent"))?;
        RsaKeyMaterial::from_slots(vec![Some(n.to_vec()), Some(e.to_vec())])
    }

    /// Modulus size in bytes, ignoring a leading sign byte
    pub fn modulus_len(&self) -> Result<usize> {
        let n = self
            .slot(SLOT_MODULUS)
            .ok_or_else(|| Error::malformed("missing modulus"))?;
        if n.first() == Some(&0) && n.len() > 1 {
            Ok(n.len() - 1)
        } else {
            Ok(n.len())
        }
    }

    /// Modulus size in bits
    pub fn modulus_bits(&self) -> Result<u64> {
        let n = self
            .slot(SLOT_MODULUS)
            .ok_or_else(|| Error::malformed("missing modulus"))?;
        Ok(BigInt::from_signed_bytes_be(n).bits())
    }

    /// Fills in the derivable slots of an 8-slot key
    ///
    /// Requires at least `p`, `q` and one of `d` or `e`. Slots are parsed
    /// as unsigned values; the primes are swapped if needed so that
    /// `p > q`, which invalidates and recomputes the CRT coefficient.
    /// All eight slots are rewritten in canonical signed encoding.
    pub fn complete(&mut self) -> Result<()> {
        if self.slots.len() != 8 {
            return Err(Error::malformed("not an 8-slot key"));
        }
        let mut k: Vec<Option<BigInt>> =
            self.slots.iter().map(parse_unsigned).collect();

        let mut p = match k[SLOT_PRIME_P].take() {
            Some(p) => p,
            None => return Err(Error::malformed("missing prime p")),
        };
        let mut q = match k[SLOT_PRIME_Q].take() {
            Some(q) => q,
            None => return Err(Error::malformed("missing prime q")),
        };
        if p < q {
            std::mem::swap(&mut p, &mut q);
            k.swap(SLOT_EXPONENT_P, SLOT_EXPONENT_Q);
            k[SLOT_COEFFICIENT] = None;
        }
        let one = BigInt::one();
        if k[SLOT_COEFFICIENT].is_none() {
            k[SLOT_COEFFICIENT] = Some(
                mod_inverse(&q, &p)
                    .ok_or_else(|| Error::consistency("primes not coprime"))?,
            );
        }
        if k[SLOT_MODULUS].is_none() {
            k[SLOT_MODULUS] = Some(&p * &q);
        }
        if k[SLOT_PRIVATE_EXPONENT].is_none() {
            let e = match &k[SLOT_PUBLIC_EXPONENT] {
                Some(e) => e,
                None => {
                    return Err(Error::malformed("missing public exponent"))
                }
            };
            let phi = (&p - &one) * (&q - &one);
            k[SLOT_PRIVATE_EXPONENT] = Some(
                mod_inverse(e, &phi).ok_or_else(|| {
                    Error::consistency("public exponent not invertible")
                })?,
            );
        }
        let d = match &k[SLOT_PRIVATE_EXPONENT] {
            Some(d) => d.clone(),
            None => return Err(Error::malformed("missing private exponent")),
        };
        if k[SLOT_EXPONENT_P].is_none() {
            k[SLOT_EXPONENT_P] = Some(&d % (&p - &one));
        }
        if k[SLOT_EXPONENT_Q].is_none() {
            k[SLOT_EXPONENT_Q] = Some(&d % (&q - &one));
        }
        k[SLOT_PRIME_P] = Some(p);
        k[SLOT_PRIME_Q] = Some(q);

        for (slot, v) in self.slots.iter_mut().zip(k.iter()) {
            match v {
                Some(v) => *slot = Some(v.to_signed_bytes_be()),
                None => {
                    return Err(Error::consistency("slot left undetermined"))
                }
            }
        }
        Ok(())
    }

    /// Generates a fresh key pair of `bits` modulus bits
    ///
    /// Primes are sampled from `rng` with the top two bits and the low bit
    /// forced, then advanced in steps of two until probably prime with
    /// `gcd(e, q-1) == 1`. A candidate pair is accepted only when the
    /// modulus has exactly `bits` bits and a probe value survives the
    /// encrypt/decrypt round trip; otherwise both primes are resampled.
    /// `f4` selects e = 0x10001 over e = 3; `crt` selects the 8-slot form.
    pub fn generate(
        rng: &mut Rng,
        bits: usize,
        crt: bool,
        f4: bool,
    ) -> Result<RsaKeyMaterial> {
        if bits < 64 || bits % 16 != 0 {
            return Err(Error::malformed("unsupported modulus size"));
        }
        let half = bits / 16;
        let e = BigInt::from(if f4 { 0x10001u32 } else { 3u32 });
        let one = BigInt::one();
        let mut b = vec![0u8; half + 1];

        let mut p: Option<BigInt> = None;
        let (p, q, n, d) = loop {
            let mut cand: Option<BigInt> = None;
            let q = loop {
                let c = match cand.take() {
                    None => {
                        rng.fill(&mut b[1..=half])?;
                        b[1] |= 0xC0;
                        b[half] |= 1;
                        BigInt::from_signed_bytes_be(&b)
                    }
                    Some(prev) => {
                        let next = prev + 2u32;
                        if next.bits() > (half * 8) as u64 {
                            continue;
                        }
                        next
                    }
                };
                if is_probable_prime(&c, PRIME_ROUNDS, rng)?
                    && e.gcd(&(&c - &one)).is_one()
                {
                    break c;
                }
                cand = Some(c);
            };
            match p.take() {
                None => p = Some(q),
                Some(pp) => {
                    let n = &pp * &q;
                    if n.bits() == bits as u64 {
                        let phi = (&pp - &one) * (&q - &one);
                        if let Some(d) = mod_inverse(&e, &phi) {
                            if pp.modpow(&e, &n).modpow(&d, &n) == pp {
                                break (pp, q, n, d);
                            }
                        }
                    }
                }
            }
        };

        let mut slots: Vec<Option<Vec<u8>>> =
            vec![None; if crt { 8 } else { 3 }];
        slots[SLOT_MODULUS] = Some(n.to_signed_bytes_be());
        slots[SLOT_PRIVATE_EXPONENT] = Some(d.to_signed_bytes_be());
        slots[SLOT_PUBLIC_EXPONENT] = Some(e.to_signed_bytes_be());
        if crt {
            let (p, q) = if p < q { (q, p) } else { (p, q) };
            let qinv = mod_inverse(&q, &p)
                .ok_or_else(|| Error::consistency("primes not coprime"))?;
            slots[SLOT_PRIME_P] = Some(p.to_signed_bytes_be());
            slots[SLOT_PRIME_Q] = Some(q.to_signed_bytes_be());
            slots[SLOT_EXPONENT_P] =
                Some((&d % (&p - &one)).to_signed_bytes_be());
            slots[SLOT_EXPONENT_Q] =
                Some((&d % (&q - &one)).to_signed_bytes_be());
            slots[SLOT_COEFFICIENT] = Some(qinv.to_signed_bytes_be());
        }
        RsaKeyMaterial::from_slots(slots)
    }
}

/// ISO 9796-1 signature padding
///
/// Interleaves the message bytes from the tail with permuted shadow bytes,
/// sets the delimiter and border bits and appends the 0x6 trailer nibble.
/// Returns None when the message does not fit the signature size.
pub(crate) fn pad_iso9796(data: &[u8], sigbits: usize) -> Option<Vec<u8>> {
    if data.is_empty() || sigbits < 2 {
        return None;
    }
    let sigbits = sigbits - 1;
    let len = data.len();
    if len * 16 > sigbits + 3 {
        return None;
    }
    let mut pad = vec![0u8; (sigbits + 7) / 8];
    let pl = pad.len();
    for i in 0..pl / 2 {
        pad[pl - 1 - 2 * i] = data[len - 1 - i % len];
    }
    if pl & 1 != 0 {
        pad[0] = data[len - 1 - (pl / 2) % len];
    }
    const PERM: u64 = 0x1CA76BD0F249853E;
    for i in 0..pl / 2 {
        let j = pl - 1 - 2 * i;
        let v = u64::from(pad[j]);
        pad[j - 1] = ((((PERM >> ((v >> 2) & 0x3C)) & 0xF) << 4)
            | ((PERM >> ((v & 0xF) << 2)) & 0xF)) as u8;
    }
    pad[pl - 2 * len] ^= 1;
    let n = sigbits % 8;
    pad[0] &= ((1u16 << n) - 1) as u8;
    pad[0] |= 1 << ((n + 7) % 8);
    pad[pl - 1] = (pad[pl - 1] << 4) | 0x06;
    Some(pad)
}

/// Raw modular exponentiation with padding control
///
/// `pad_data == true` runs the private (or encrypting) direction, `false`
/// the public one. `pad_type` 3 selects ISO 9796-1 signature padding, 0
/// passes the value through unpadded. An 8-slot key is exercised through
/// the CRT recombination, any other form through a plain modpow. The
/// output is fitted to the modulus length for padded results, while type 0
/// strips a single leading zero byte.
pub(crate) fn raw_op(
    pad_data: bool,
    pad_type: u8,
    key: &RsaKeyMaterial,
    data: &[u8],
) -> Result<Vec<u8>> {
    if pad_type != 0 && pad_type != 3 {
        return Err(Error::malformed("unsupported padding type"));
    }
    let kl = key.len();
    let (k0, k1, p, q, dp, dq, qinv, mlb) = if kl == 8 {
        let p = parse_signed(&key.slots[SLOT_PRIME_P])?;
        let q = parse_signed(&key.slots[SLOT_PRIME_Q])?;
        let dp = parse_signed(&key.slots[SLOT_EXPONENT_P])?;
        let dq = parse_signed(&key.slots[SLOT_EXPONENT_Q])?;
        let qinv = parse_signed(&key.slots[SLOT_COEFFICIENT])?;
        let k0 = if pad_type == 3 {
            Some(parse_signed(&key.slots[SLOT_MODULUS])?)
        } else {
            None
        };
        let mlb = p.bits() + q.bits();
        (k0, None, Some(p), Some(q), Some(dp), Some(dq), Some(qinv), mlb)
    } else {
        let k0 = parse_signed(&key.slots[0])?;
        let k1 = parse_signed(&key.slots[1])?;
        let mlb = k0.bits();
        (Some(k0), Some(k1), None, None, None, None, None, mlb)
    };
    let ml = ((mlb + 7) / 8) as usize;

    let mut b = if pad_data && pad_type == 3 {
        let buf = pad_iso9796(data, mlb as usize)
            .ok_or_else(|| Error::malformed("data too long for modulus"))?;
        BigInt::from_bytes_be(Sign::Plus, &buf)
    } else {
        if data.len() > ml + 1 {
            return Err(Error::malformed("data too long for modulus"));
        }
        let mut buf = vec![0u8; ml + 1];
        buf[ml + 1 - data.len()..].copy_from_slice(data);
        BigInt::from_signed_bytes_be(&buf)
    };

    b = match (&p, &q, &dp, &dq, &qinv) {
        (Some(p), Some(q), Some(dp), Some(dq), Some(qinv)) => {
            let m1 = (&b % p).modpow(dp, p);
            let m2 = (&b % q).modpow(dq, q);
            ((((m1 + p - &m2) * qinv) % p) * q) + m2
        }
        _ => {
            let n = k0.as_ref()
                .ok_or_else(|| Error::malformed("missing modulus"))?;
            let e = k1.as_ref()
                .ok_or_else(|| Error::malformed("missing exponent"))?;
            b.modpow(e, n)
        }
    };

    if pad_type == 3 {
        let n = match (&k0, &p, &q) {
            (Some(n), _, _) => n.clone(),
            (None, Some(p), Some(q)) => p * q,
            _ => return Err(Error::malformed("missing modulus")),
        };
        let low = &b % 16u32;
        if (!pad_data && low != BigInt::from(6u32))
            || (pad_data && &b * 2u32 > n)
        {
            b = n - b;
        }
    }

    let buf = b.to_signed_bytes_be();
    if pad_data || pad_type == 3 {
        if buf.len() == ml {
            return Ok(buf);
        }
        let mut ret = vec![0u8; ml];
        if buf.len() > ml {
            ret.copy_from_slice(&buf[buf.len() - ml..]);
        } else {
            ret[ml - buf.len()..].copy_from_slice(&buf);
        }
        Ok(ret)
    } else {
        let skip = if buf.first() == Some(&0) && buf.len() > 1 { 1 } else { 0 };
        Ok(buf[skip..].to_vec())
    }
}

const SELFTEST_RSA_MATERIAL: [[&str; 3]; 2] = [
    [
        "4svq2jqtxo3zn2njenso9vwyg2bynvo08ekktj4d7sqwk9s3oz",
        "4se994le3trmoep5f74ytxfupr2o0oi9dem4nzailb4k4g5e7j",
        "1ekh",
    ],
    [
        "uk5febz1u9c5x7knn185refnb02syox36xqwae0lm30z9j9p03\
         hyu175dyxbiczds3k1n6jiwqdeyetwgsy1qrvje8a7o40cmb5",
        "ujsuw3e4k53dtzgbsm3tjpytf5h25i71r8cs8ijbigo607ceo5\
         zy5toem0kp4oeb77tt86h7gkix5fjdq13sa7puya61b2ep82n",
        "3",
    ],
];

/// A fixed key pair used by the construction-time self test
pub(crate) struct SelfTestRsaKey {
    /// 8-slot CRT private key
    pub private: RsaKeyMaterial,
    /// Matching `[n, e]` public key
    pub public: RsaKeyMaterial,
}

fn parse_selftest_keys() -> Result<Vec<SelfTestRsaKey>> {
    let mut keys = Vec::with_capacity(SELFTEST_RSA_MATERIAL.len());
    for [p, q, e] in SELFTEST_RSA_MATERIAL {
        let mut slots: Vec<Option<Vec<u8>>> = vec![None; 8];
        for (i, s) in [
            (SLOT_PUBLIC_EXPONENT, e),
            (SLOT_PRIME_P, p),
            (SLOT_PRIME_Q, q),
        ] {
            let v = BigInt::parse_bytes(s.as_bytes(), 36)
                .ok_or_else(|| Error::malformed("bad key material"))?;
            slots[i] = Some(v.to_signed_bytes_be());
        }
        let mut private = RsaKeyMaterial::from_slots(slots)?;
        private.complete()?;
        let public = private.public_key()?;
        keys.push(SelfTestRsaKey { private, public });
    }
    Ok(keys)
}

/// Fixed RSA key pairs for the self test, empty if the embedded material
/// fails to parse
pub(crate) static SELFTEST_RSA_KEYS: Lazy<Vec<SelfTestRsaKey>> =
    Lazy::new(|| parse_selftest_keys().unwrap_or_default());
