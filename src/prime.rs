// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! Probabilistic primality testing and modular inverses

use crate::error::Result;
use crate::rng::Rng;

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

const SMALL_PRIMES: [u32; 54] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67,
    71, 73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131, 137, 139,
    149, 151, 157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223,
    227, 229, 233, 239, 241, 251,
];

/// Multiplicative inverse of `a` modulo `m`, if one exists
pub(crate) fn mod_inverse(a: &BigInt, m: &BigInt) -> Option<BigInt> {
    let e = a.extended_gcd(m);
    if e.gcd.is_one() {
        Some(e.x.mod_floor(m))
    } else {
        None
    }
}

/// Miller-Rabin witness round for an odd `n > 3` with `n - 1 = d * 2^s`
fn witness(n: &BigInt, d: &BigInt, s: u64, a: &BigInt) -> bool {
    let n_m1 = n - 1u32;
    let mut x = a.modpow(d, n);
    if x.is_one() || x == n_m1 {
        return true;
    }
    for _ in 1..s {
        x = x.modpow(&BigInt::from(2u32), n);
        if x == n_m1 {
            return true;
        }
    }
    false
}

/// Probabilistic primality test with random witnesses
///
/// Runs trial division against a small prime table, then `rounds`
/// Miller-Rabin rounds with witnesses drawn from `rng`.
pub(crate) fn is_probable_prime(
    n: &BigInt,
    rounds: u32,
    rng: &mut Rng,
) -> Result<bool> {
    if n.is_negative() || n < &BigInt::from(2u32) {
        return Ok(false);
    }
    for p in SMALL_PRIMES {
        let bp = BigInt::from(p);
        if n == &bp {
            return Ok(true);
        }
        if (n % &bp).is_zero() {
            return Ok(false);
        }
    }
    let n_m1 = n - 1u32;
    let s = match n_m1.trailing_zeros() {
        Some(s) => s,
        None => return Ok(false),
    };
    let d = &n_m1 >> s;
    let span = n - 3u32;
    let nbytes = (n.bits() as usize + 7) / 8 + 8;
    for _ in 0..rounds {
        let raw = rng.bytes(nbytes)?;
        let a = BigInt::from_bytes_be(Sign::Plus, &raw).mod_floor(&span)
            + 2u32;
        if !witness(n, &d, s, &a) {
            return Ok(false);
        }
    }
    Ok(true)
}
