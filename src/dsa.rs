// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! Minimal DSA over fixed parameters, used by the construction-time
//! self test

use crate::error::{Error, Result};
use crate::prime::mod_inverse;
use crate::rng::Rng;

use num_bigint::BigInt;
use once_cell::sync::Lazy;

/// A DSA key as `[p, q, g, x]` (private) or `[p, q, g, y]` (public),
/// big-endian two's complement encoded
pub(crate) type DsaKey = [Vec<u8>; 4];

fn parse_key(key: &DsaKey) -> Result<[BigInt; 4]> {
    let k: Vec<BigInt> = key
        .iter()
        .map(|b| BigInt::from_signed_bytes_be(b))
        .collect();
    let k: [BigInt; 4] = match k.try_into() {
        Ok(k) => k,
        Err(_) => return Err(Error::malformed("bad dsa key")),
    };
    if k[1].bits() != 160 {
        return Err(Error::malformed("dsa subgroup order must be 160 bits"));
    }
    Ok(k)
}

fn parse_digest(digest: &[u8]) -> Result<BigInt> {
    if digest.len() != 20 {
        return Err(Error::malformed("dsa digest must be 20 bytes"));
    }
    let mut b = [0u8; 21];
    b[1..].copy_from_slice(digest);
    Ok(BigInt::from_signed_bytes_be(&b))
}

/// Signs a 20-byte digest, returning the signature as two 20-byte halves
pub(crate) fn dsa_sign(
    key: &DsaKey,
    digest: &[u8],
    rng: &mut Rng,
) -> Result<[u8; 40]> {
    let [p, q, g, x] = parse_key(key)?;
    let hash = parse_digest(digest)?;

    let mut b = [0u8; 20];
    rng.fill(&mut b)?;
    b[0] &= 0x7F;
    let k = BigInt::from_signed_bytes_be(&b);

    let r = g.modpow(&k, &p) % &q;
    let kinv = mod_inverse(&k, &q)
        .ok_or_else(|| Error::consistency("nonce not invertible"))?;
    let s = (kinv * (&x * &r + hash)) % &q;

    let mut sig = [0u8; 40];
    for (i, v) in [r, s].iter().enumerate() {
        let b = v.to_signed_bytes_be();
        let skip = if b.len() > 20 { 1 } else { 0 };
        let l = b.len() - skip;
        sig[20 * i + (20 - l)..20 * (i + 1)].copy_from_slice(&b[skip..]);
    }
    Ok(sig)
}

/// Verifies a 40-byte signature over a 20-byte digest
pub(crate) fn dsa_verify(
    key: &DsaKey,
    digest: &[u8],
    sig: &[u8],
) -> Result<bool> {
    let [p, q, g, y] = parse_key(key)?;
    let hash = parse_digest(digest)?;
    if sig.len() != 40 {
        return Err(Error::malformed("dsa signature must be 40 bytes"));
    }
    let mut b = [0u8; 21];
    b[1..].copy_from_slice(&sig[..20]);
    let r = BigInt::from_signed_bytes_be(&b);
    b[1..].copy_from_slice(&sig[20..]);
    let s = BigInt::from_signed_bytes_be(&b);

    let w = match mod_inverse(&s, &q) {
        Some(w) => w,
        None => return Ok(false),
    };
    let u1 = (&hash * &w) % &q;
    let u2 = (&r * &w) % &q;
    let v = ((g.modpow(&u1, &p) * y.modpow(&u2, &p)) % &p) % &q;
    Ok(v == r)
}

const SELFTEST_DSA_MATERIAL: [[&str; 5]; 2] = [
    [
        "otj4bi3e6pxy54h5tkjwpuzycvm3ta6jg9f6lj52mvygb9l72y1tkrs0ppuldns6\
         kem6vzw3fbwhinhdhpqjvn284fc0dsaz39h",
        "jpdh5mk2p667os7al4gmvbdfmar3bsv",
        "cdybrmm4x665tomdaiedafq3d2wiajhlkbeql7iui72eeayleaa3ppn7lhfdbrh5\
         08kum7havwgb7otsnme3pc8r7kipf55hvio",
        "lpb2xrb2yivmklm6i6pyzvagsu9qhdz",
        "6d3ng23juhszoxet3kkzw2ei7y3hxo67c9oqvuf5d1dpev7qzwhzy11tcaikknfx\
         tr62zyk96d9vvhli6zw2b2sxbrnlc3xkuzy",
    ],
    [
        "10uj5jh4khn7t93eh41c1d7sfptfuqiycpiimudbj62leu8fwnnt3k5cdkzynrvb\
         hlflm3qe6sfwsjs3bbvjm8j8ctzaljlothjtbujclhafng31uzf4zmj11qjni0z9\
         ou77rap19wl7ps7v52fbuoycrgu6xohwoobiwfanlkh4t18wtw3kf1nsdxz7mwpu\
         9ddu4cz",
        "s6zmy3zi8dumvm43ofheresn52f9trj",
        "z4asx4yhsha3vd0d0uhhnahzmtj1qg572k3frvtq46x9lrawlm4x70oc99d4qspl\
         ci9e8qjtaqt3sqf719tfojrwjnonkqbxm9op3ck61fcxx2q6l4vg1rizk9kn74pi\
         9859nqqctvn9174smwqzosvdrnd89eykgocc09ph343gpen9lgo0h6dk32a35gut\
         5wb6w1",
        "f8xedoxwqju60mngerxyt5jv7rl8wbg",
        "egc8c7ptmx0hr5i4x2bzgeumx8kcmc9jokca88r8e4k1ih802bnz9flr08topo1v\
         7kodqg9yab3xpf2j0lv9zmg8jhh38okgjfeou1fb7xn6blo4t1m8fb64p849eaqa\
         66f1c0ar7m1uwdwc9k57vr58frxezjd1w4sc4zp8s6wn89lmbzem0brt6phtukhg\
         2qfgrn",
    ],
];

/// A fixed DSA key pair used by the construction-time self test
pub(crate) struct SelfTestDsaKey {
    /// `[p, q, g, x]`
    pub private: DsaKey,
    /// `[p, q, g, y]`
    pub public: DsaKey,
}

fn parse_selftest_keys() -> Option<Vec<SelfTestDsaKey>> {
    let mut keys = Vec::with_capacity(SELFTEST_DSA_MATERIAL.len());
    for m in SELFTEST_DSA_MATERIAL {
        let mut v = Vec::with_capacity(5);
        for s in m {
            v.push(
                BigInt::parse_bytes(s.as_bytes(), 36)?.to_signed_bytes_be(),
            );
        }
        let [p, q, g, x, y]: [Vec<u8>; 5] = match v.try_into() {
            Ok(v) => v,
            Err(_) => return None,
        };
        keys.push(SelfTestDsaKey {
            private: [p.clone(), q.clone(), g.clone(), x],
            public: [p, q, g, y],
        });
    }
    Some(keys)
}

/// Fixed DSA key pairs for the self test, empty if the embedded material
/// fails to parse
pub(crate) static SELFTEST_DSA_KEYS: Lazy<Vec<SelfTestDsaKey>> =
    Lazy::new(|| parse_selftest_keys().unwrap_or_default());
