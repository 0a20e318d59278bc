// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! Bounded adaptive caches for the sign and verify operations
//!
//! Fingerprints pair a cheap additive hash with a full structural
//! comparison, so lookups reject non-matches early without ever trusting
//! the hash alone. Eviction is frequency based: entries are ranked by
//! (reused, successful uses) and a fifth of the cache is dropped from the
//! cold end, while four evenly spaced survivors are aged by one use so
//! long-lived entries cannot pin themselves forever.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use crate::rsa::RsaKeyMaterial;

type Slots = Vec<Option<Vec<u8>>>;

fn key_seed(key: &Slots) -> i32 {
    match key.first() {
        Some(Some(k0)) if !k0.is_empty() => k0[0] as i8 as i32,
        _ => 0,
    }
}

/// Cache key for a signing request
#[derive(Clone, Debug)]
pub(crate) struct SignFingerprint {
    hash: i32,
    key: Slots,
    data: Vec<u8>,
    off: i32,
    len: i32,
    provider: bool,
}

impl SignFingerprint {
    pub fn new(
        key: &RsaKeyMaterial,
        data: &[u8],
        provider: bool,
    ) -> SignFingerprint {
        let key = key.raw_slots().to_vec();
        let off = 0i32;
        let len = data.len() as i32;
        let mut hash = key_seed(&key);
        for b in data {
            hash = hash.wrapping_add(*b as i8 as i32);
        }
        hash = hash.wrapping_add(off).wrapping_add(len);
        if off != 0 {
            hash = hash.wrapping_mul(off);
        }
        if provider {
            hash = hash.wrapping_mul(2);
        }
        SignFingerprint {
            hash,
            key,
            data: data.to_vec(),
            off,
            len,
            provider,
        }
    }
}

impl PartialEq for SignFingerprint {
    fn eq(&self, other: &SignFingerprint) -> bool {
        self.hash == other.hash
            && self.len == other.len
            && self.key == other.key
            && self.data == other.data
            && self.off == other.off
            && self.provider == other.provider
    }
}

impl Eq for SignFingerprint {}

impl Hash for SignFingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash);
    }
}

/// Cache key for a verification request
///
/// Unlike the signing fingerprint the hash samples only the head and tail
/// of the message, since verification inputs are typically large.
#[derive(Clone, Debug)]
pub(crate) struct VerifyFingerprint {
    hash: i32,
    key: Slots,
    data: Vec<u8>,
    sig: Vec<u8>,
    off: i32,
    len: i32,
    provider: bool,
}

impl VerifyFingerprint {
    pub fn new(
        key: &RsaKeyMaterial,
        data: &[u8],
        sig: &[u8],
        provider: bool,
    ) -> VerifyFingerprint {
        let key = key.raw_slots().to_vec();
        let off = 0i32;
        let len = data.len() as i32;
        let mut hash = key_seed(&key);
        let dl = data.len();
        for b in data.iter().take(10) {
            hash = hash.wrapping_add(*b as i8 as i32);
        }
        let mut i = dl as i64 - 1;
        while i >= 0 && i > dl as i64 - 10 {
            hash = hash.wrapping_add(data[i as usize] as i8 as i32);
            i -= 1;
        }
        hash = hash.wrapping_add(off);
        if off != 0 {
            hash = hash.wrapping_mul(off);
        }
        if provider {
            hash = hash.wrapping_mul(2);
        }
        VerifyFingerprint {
            hash,
            key,
            data: data.to_vec(),
            sig: sig.to_vec(),
            off,
            len,
            provider,
        }
    }
}

impl PartialEq for VerifyFingerprint {
    fn eq(&self, other: &VerifyFingerprint) -> bool {
        self.hash == other.hash
            && self.len == other.len
            && self.key == other.key
            && self.data == other.data
            && self.sig == other.sig
            && self.off == other.off
            && self.provider == other.provider
    }
}

impl Eq for VerifyFingerprint {}

impl Hash for VerifyFingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash);
    }
}

struct Entry<V> {
    value: V,
    uses: i64,
    reused: bool,
}

/// A bounded operation cache with frequency-based eviction
pub(crate) struct OpCache<K, V> {
    map: Mutex<HashMap<K, Entry<V>>>,
    max: usize,
}

impl<K, V> OpCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(max: usize) -> OpCache<K, V> {
        OpCache {
            map: Mutex::new(HashMap::new()),
            max: std::cmp::max(max, 1),
        }
    }

    /// Looks up a cached result, marking a hit as reused
    pub fn get(&self, k: &K) -> Option<V> {
        let mut map = self.map.lock().unwrap();
        match map.get_mut(k) {
            Some(e) => {
                e.uses += 1;
                e.reused = true;
                Some(e.value.clone())
            }
            None => None,
        }
    }

    /// Stores a fresh result, evicting first if the cache is full
    pub fn insert(&self, k: K, v: V) {
        let mut map = self.map.lock().unwrap();
        if map.len() >= self.max {
            Self::evict(&mut map, self.max);
        }
        map.insert(
            k,
            Entry {
                value: v,
                uses: 0,
                reused: false,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.map.lock().unwrap().len()
    }

    /// Drops a fifth of the entries from the cold end of the
    /// (reused, uses) ranking and ages four evenly spaced survivors per
    /// removal. Decrement targets that fall outside the snapshot or were
    /// themselves removed are skipped.
    fn evict(map: &mut HashMap<K, Entry<V>>, max: usize) {
        let mut keys: Vec<(K, bool, i64)> = map
            .iter()
            .map(|(k, e)| (k.clone(), e.reused, e.uses))
            .collect();
        if keys.len() < 2 {
            map.clear();
            return;
        }
        keys.sort_by(|a, b| (a.1, a.2).cmp(&(b.1, b.2)));
        let fifth = std::cmp::max(max / 5, 1);
        let count = std::cmp::min(fifth, keys.len());
        let cold_first =
            (keys[0].1, keys[0].2) < (keys[keys.len() - 1].1, keys[keys.len() - 1].2);
        for i in 0..count {
            let idx = if cold_first { i } else { keys.len() - 1 - i };
            map.remove(&keys[idx].0);
            for j in 1..5 {
                let t = if cold_first {
                    match idx.checked_add(j * fifth) {
                        Some(t) => t,
                        None => continue,
                    }
                } else {
                    match idx.checked_sub(j * fifth) {
                        Some(t) => t,
                        None => continue,
                    }
                };
                if let Some((k, _, _)) = keys.get(t) {
                    if let Some(e) = map.get_mut(k) {
                        e.uses -= 1;
                    }
                }
            }
        }
    }
}
