// Copyright 2026 The ltpakeys developers
// See LICENSE.txt file for terms

//! Engine configuration, loaded from a TOML file or built in code

use std::env;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use toml;

const DEFAULT_CONF_DIR: &str = "/usr/local/etc";

/// Default configuration file name
pub const DEFAULT_CONF_NAME: &str = "ltpakeys.conf";

/// Default maximum number of entries kept in each operation cache
pub const DEFAULT_MAX_CACHE: usize = 500;

/// Default number of PRNG draws between entropy remixes
pub const DEFAULT_TR_MIX: u32 = 128;

fn default_version() -> String {
    "1.0".to_string()
}

fn default_max_cache() -> usize {
    DEFAULT_MAX_CACHE
}

fn default_tr_mix() -> u32 {
    DEFAULT_TR_MIX
}

fn default_entropy() -> String {
    "timing".to_string()
}

/// Engine configuration
///
/// `fips` selects the standards-approved primitive set (SHA-256, AES-GCM)
/// over the legacy one (SHA-1, 3DES). `entropy` selects the seed source for
/// the deterministic byte generator: `"timing"` for the legacy jitter
/// collector, `"os"` for the platform CSPRNG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Use FIPS-approved primitives instead of the legacy set
    #[serde(default)]
    pub fips: bool,
    /// Realm name recorded in exported key files
    pub realm: String,
    /// Host name recorded in exported key files, defaults to $HOSTNAME
    #[serde(default)]
    pub host: Option<String>,
    /// Key file format version
    #[serde(default = "default_version")]
    pub version: String,
    /// Maximum number of entries in each of the sign/verify caches
    #[serde(default = "default_max_cache")]
    pub max_cache: usize,
    /// PRNG draws between remixes with fresh entropy
    #[serde(default = "default_tr_mix")]
    pub tr_mix: u32,
    /// Entropy source selector, `"timing"` or `"os"`
    #[serde(default = "default_entropy")]
    pub entropy: String,
}

impl Config {
    /// A configuration with all defaults and the given realm
    pub fn new(realm: &str) -> Config {
        Config {
            fips: false,
            realm: realm.to_string(),
            host: None,
            version: default_version(),
            max_cache: default_max_cache(),
            tr_mix: default_tr_mix(),
            entropy: default_entropy(),
        }
    }

    /// Locates the configuration file
    ///
    /// The `LTPAKEYS_CONF` environment variable has the highest precedence,
    /// then the freedesktop config dir, then `$HOME/.config`, then the
    /// system directory.
    pub fn find_conf() -> Result<String> {
        match env::var("LTPAKEYS_CONF") {
            Ok(var) => return Ok(var),
            Err(_) => (),
        }
        let conffile = match env::var("XDG_CONFIG_HOME") {
            Ok(xdg) => format!("{}/ltpakeys/{}", xdg, DEFAULT_CONF_NAME),
            Err(_) => match env::var("HOME") {
                Ok(home) => {
                    format!("{}/.config/ltpakeys/{}", home, DEFAULT_CONF_NAME)
                }
                Err(_) => format!(
                    "{}/ltpakeys/{}",
                    DEFAULT_CONF_DIR, DEFAULT_CONF_NAME
                ),
            },
        };
        if Path::new(&conffile).is_file() {
            Ok(conffile)
        } else {
            Err(Error::malformed("no configuration file found"))
        }
    }

    /// Parses a configuration from a TOML file
    pub fn from_file(filename: &str) -> Result<Config> {
        let config_str = fs::read_to_string(filename)?;
        let conf: Config =
            toml::from_str(&config_str).map_err(Error::other_error)?;
        Ok(conf)
    }
}
