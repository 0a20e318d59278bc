// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! Deterministic byte generator seeded from an entropy source

use crate::entropy::EntropySource;
use crate::error::Result;
use crate::md5;

/// Deterministic byte generator over a 32-byte seed
///
/// The seed is compressed with MD5 every eight draws (the digest overwrites
/// the first half of the seed) and the stream is remixed with one fresh
/// entropy byte every `tr_mix` draws. With a fixed entropy source the output
/// stream is fully reproducible.
pub struct Rng {
    seed: [u8; 32],
    ri: u64,
    tr_mix: u64,
    entropy: Box<dyn EntropySource>,
}

impl Rng {
    /// Seeds a generator from `entropy`, drawing 32 bytes and compressing
    /// them once before first use
    pub fn new(entropy: Box<dyn EntropySource>, tr_mix: u32) -> Result<Rng> {
        let mut rng = Rng {
            seed: [0u8; 32],
            ri: 0,
            tr_mix: u64::from(tr_mix.max(1)),
            entropy,
        };
        rng.entropy.fill(&mut rng.seed)?;
        rng.compress_seed();
        Ok(rng)
    }

    fn compress_seed(&mut self) {
        let digest = md5::digest(&self.seed);
        self.seed[..16].copy_from_slice(&digest);
    }

    /// Fills `buf` with the next bytes of the stream
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        for out in buf.iter_mut() {
            self.ri += 1;
            let ri8 = (self.ri % 8) as usize;
            if self.ri % self.tr_mix == 0 {
                let mut fresh = [0u8; 1];
                self.entropy.fill(&mut fresh)?;
                self.seed[ri8] ^= fresh[0];
            }
            if ri8 == 0 {
                self.compress_seed();
            }
            *out = self.seed[ri8];
        }
        Ok(())
    }

    /// Returns the next `n` bytes of the stream
    pub fn bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.fill(&mut buf)?;
        Ok(buf)
    }
}
