// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! Entropy sources that seed the deterministic byte generator

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

use once_cell::sync::Lazy;

/// A source of seed material for [crate::rng::Rng]
pub trait EntropySource: Send {
    /// Fills `buf` with fresh entropy
    fn fill(&mut self, buf: &mut [u8]) -> Result<()>;
}

/// Returns the entropy source selected by a configuration string,
/// `"os"` for [OsEntropy], anything else for [TimingEntropy]
pub fn new_source(name: &str) -> Box<dyn EntropySource> {
    match name {
        "os" => Box::new(OsEntropy),
        _ => Box::new(TimingEntropy::new()),
    }
}

/// Entropy from the operating system CSPRNG
#[derive(Debug)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        getrandom::getrandom(buf)
            .map_err(|e| Error::provider(&e.to_string()))
    }
}

const CHANNELS: usize = 16;
const SAMPLES: usize = 56;

/// Per-channel bias thresholds controlling how many samples a channel must
/// accumulate before its next bit is trusted. Index 0 holds the tightest
/// threshold; later entries relax geometrically.
static ETB: Lazy<[f64; CHANNELS]> = Lazy::new(|| {
    let mut etb = [0.0f64; CHANNELS];
    etb[0] = 0.001;
    let log2d = (2.0 * etb[0]).ln();
    for i in 1..CHANNELS {
        etb[i] = (log2d / ((i + 1) as f64)).exp() / 2.0;
    }
    etb
});

fn now_millis() -> u128 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis(),
        Err(_) => 0,
    }
}

/// True random bit collector based on scheduler timing jitter
///
/// Each output bit is distilled from counts of busy-wait iterations between
/// clock ticks. The counter delta feeds sixteen 1-bit channels; a channel
/// contributes a bit only after a bias check over a 56-sample window clears
/// one of the [ETB] thresholds, and persistently biased channels are parked.
/// Slow, and only meant to produce small seeds.
pub struct TimingEntropy {
    slot: usize,
    channels: u32,
    samples: [u32; SAMPLES],
    ones: [i32; CHANNELS],
    block: [i32; CHANNELS],
}

impl TimingEntropy {
    /// A collector with an empty sample window
    pub fn new() -> TimingEntropy {
        TimingEntropy {
            slot: 0,
            channels: 0,
            samples: [0; SAMPLES],
            ones: [0; CHANNELS],
            block: [0; CHANNELS],
        }
    }

    /// Busy-waits over at least one clock tick and returns the iteration
    /// count, retrying until it is nonzero
    fn sample(&self) -> u32 {
        let mut s: u32 = 0;
        while s == 0 {
            let t = now_millis();
            while now_millis() == t {
                s = s.wrapping_add(1);
            }
        }
        s
    }
}

impl EntropySource for TimingEntropy {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut accu: u64 = 0;
        let mut bits = 0u32;
        for out in buf.iter_mut() {
            while bits < 8 {
                let s = self.sample();
                let xor = self.samples[self.slot] ^ s;
                self.samples[self.slot] = s;

                for i in 0..CHANNELS {
                    let m = 1u32 << i;
                    if xor & m != 0 {
                        self.ones[i] += if s & m != 0 { 1 } else { -1 };
                        self.channels ^= m;
                    }
                    self.block[i] -= 1;
                    if self.block[i] == 0 {
                        accu = (accu << 1)
                            | if self.channels & m != 0 { 1 } else { 0 };
                        bits += 1;
                    }
                    if self.block[i] <= 0 {
                        let bias = (0.5
                            - f64::from(self.ones[i]) / (SAMPLES as f64))
                            .abs();
                        let mut j = CHANNELS;
                        for (k, etb) in ETB.iter().enumerate() {
                            if bias <= *etb {
                                j = k;
                                break;
                            }
                        }
                        self.block[i] =
                            if j == CHANNELS { -1 } else { j as i32 + 1 };
                    }
                }
                self.slot = (self.slot + 1) % SAMPLES;
            }
            bits -= 8;
            *out = (accu >> bits) as u8;
        }
        Ok(())
    }
}
