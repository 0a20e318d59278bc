// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! LTPA key management and signing engine
//!
//! Generates, protects and exports the RSA key pairs and shared secret
//! keys used by LTPA deployments, and signs and verifies data with
//! bounded adaptive result caches. The legacy primitive set (SHA-1,
//! 3DES) and a standards-approved set (SHA-256, AES-256-GCM) are both
//! supported and selected through [Config].

#![warn(missing_docs)]

mod cache;
pub mod config;
mod dsa;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod keyfile;
pub mod keypair;
pub mod keyprotect;
mod log;
mod md5;
mod prime;
pub mod rng;
pub mod rsa;

pub use config::Config;
pub use engine::{RsaProvider, SigningEngine};
pub use error::{Error, ErrorKind, Result};

#[cfg(test)]
mod tests;
