// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! Export of generated keys as a flat properties document

use std::env;

use crate::engine::SigningEngine;
use crate::error::{Error, Result};
use crate::keypair::LtpaKeyPair;
use crate::keyprotect::{derive_key, encrypt};
use crate::rsa::RsaKeyMaterial;

use chrono::Utc;
use data_encoding::BASE64;

/// Property holding the password-encrypted shared secret key
pub const PROP_SHARED_KEY: &str = "com.ibm.websphere.ltpa.3DESKey";
/// Property holding the password-encrypted private key
pub const PROP_PRIVATE_KEY: &str = "com.ibm.websphere.ltpa.PrivateKey";
/// Property holding the public key
pub const PROP_PUBLIC_KEY: &str = "com.ibm.websphere.ltpa.PublicKey";
/// Property holding the realm name
pub const PROP_REALM: &str = "com.ibm.websphere.ltpa.Realm";
/// Property holding the creation timestamp
pub const PROP_CREATION_DATE: &str = "com.ibm.websphere.CreationDate";
/// Property holding the creating host name
pub const PROP_CREATION_HOST: &str = "com.ibm.websphere.CreationHost";
/// Property holding the key file format version
pub const PROP_VERSION: &str = "com.ibm.websphere.ltpa.version";

/// Modulus size of exported signing keys
pub const EXPORT_KEY_BITS: usize = 1024;

/// An ordered set of exported key properties
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExportPayload {
    properties: Vec<(String, String)>,
}

impl ExportPayload {
    /// Looks up a property by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The properties in document order
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// Renders the flat `name=value` document
    pub fn to_properties_string(&self) -> String {
        let mut out = String::new();
        for (k, v) in &self.properties {
            out.push_str(k);
            out.push('=');
            out.push_str(v);
            out.push('\n');
        }
        out
    }

    /// Parses a flat `name=value` document, ignoring blank lines and
    /// `#` comments
    pub fn from_properties_string(s: &str) -> Result<ExportPayload> {
        let mut properties = Vec::new();
        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (k, v) = line
                .split_once('=')
                .ok_or_else(|| Error::malformed("bad property line"))?;
            properties.push((k.to_string(), v.to_string()));
        }
        Ok(ExportPayload {
            properties: properties,
        })
    }
}

/// Generates the 1024-bit CRT signing key pair used for export
pub fn generate_key_pair(engine: &SigningEngine) -> Result<RsaKeyMaterial> {
    engine.generate_rsa_key(EXPORT_KEY_BITS, true, true, false)
}

fn creation_host(engine: &SigningEngine) -> String {
    match &engine.config().host {
        Some(h) => h.clone(),
        None => match env::var("HOSTNAME") {
            Ok(h) if !h.is_empty() => h,
            _ => "localhost".to_string(),
        },
    }
}

/// Generates a fresh key set and wraps it as an export payload
///
/// The private key and the shared secret key are encrypted under the key
/// derived from `password`; the public key is carried in the clear. All
/// binary values are Base64 encoded. The private key uses the legacy
/// 133-byte layout under the legacy primitive set and the
/// length-prefixed layout under the approved one.
pub fn build_export_payload(
    engine: &SigningEngine,
    password: &[u8],
) -> Result<ExportPayload> {
    let config = engine.config();
    let material = generate_key_pair(engine)?;
    let pair = LtpaKeyPair::from_material(&material, !config.fips)?;
    let shared = engine.generate_shared_key()?;

    let key = derive_key(password, config.fips);
    let enc_private = encrypt(&pair.private.encode(), &key, config.fips)?;
    let enc_shared = encrypt(&shared, &key, config.fips)?;

    let properties = vec![
        (PROP_SHARED_KEY.to_string(), BASE64.encode(&enc_shared)),
        (
            PROP_CREATION_DATE.to_string(),
            Utc::now().to_rfc2822(),
        ),
        (PROP_CREATION_HOST.to_string(), creation_host(engine)),
        (PROP_PRIVATE_KEY.to_string(), BASE64.encode(&enc_private)),
        (
            PROP_PUBLIC_KEY.to_string(),
            BASE64.encode(&pair.public.encode()),
        ),
        (PROP_REALM.to_string(), config.realm.clone()),
        (PROP_VERSION.to_string(), config.version.clone()),
    ];
    log::info!("exported key set for realm {}", config.realm);
    Ok(ExportPayload {
        properties: properties,
    })
}
