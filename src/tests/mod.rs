// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

use crate::config::Config;
use crate::engine::SigningEngine;
use crate::entropy::EntropySource;
use crate::error::Result;

mod cache;
mod keygen;
mod keypair;
mod md5;
mod rsa;

/// All tests seed from the OS CSPRNG; the timing collector is exercised
/// separately because it is slow.
fn test_config(realm: &str) -> Config {
    let mut conf = Config::new(realm);
    conf.entropy = "os".to_string();
    conf
}

fn test_engine() -> SigningEngine {
    SigningEngine::new(test_config("testRealm"))
        .expect("engine construction failed")
}

/// Deterministic entropy for reproducible generator streams
struct CountingEntropy {
    next: u8,
}

impl CountingEntropy {
    fn new(start: u8) -> CountingEntropy {
        CountingEntropy { next: start }
    }
}

impl EntropySource for CountingEntropy {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        for b in buf.iter_mut() {
            *b = self.next;
            self.next = self.next.wrapping_add(1);
        }
        Ok(())
    }
}
