//! Layered configuration for the object store.
//!
//! Supports defaults → TOML file → environment variable overrides, in the
//! same shape as the teacher's configuration layer:
//!
//! # Environment Variables
//!
//! Variables are prefixed with `SFS_` and use double underscores to
//! separate nested levels:
//! - `SFS_INDEXING__BITMAP_TOKEN_LIMIT=5000`
//! - `SFS_METADATA__BCRYPT_COST=12`
//! - `SFS_LOGGING__DEFAULT=debug`

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level store configuration, matching the `open(config)` contract of
/// spec §6 plus the ambient knobs every subsystem needs.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Root directory the rooted FS handle is bound to. Required.
    pub path: PathBuf,

    /// Whether the in-memory cache (§4.8) is active.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Whether the bitmap index (§4.6) is consulted before falling back
    /// to a directory walk.
    #[serde(default = "default_true")]
    pub use_index: bool,

    /// Bitmap index tuning.
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Actor metadata tuning (§4.10).
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Logging configuration, independent of the other subsystems.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Maximum distinct tokens retained per attribute bucket before a
    /// probe on that attribute is reported as index-insufficient. A
    /// safety valve against unbounded token-index growth on pathological
    /// `content`/`summary` text.
    #[serde(default = "default_bitmap_token_limit")]
    pub bitmap_token_limit: usize,

    /// Default page size used by `first = {iri}?maxItems=N` when a
    /// caller does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetadataConfig {
    /// bcrypt cost factor for `password_set`/`password_check`.
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// RSA modulus size (bits) used by `gen_key`.
    #[serde(default = "default_rsa_bits")]
    pub rsa_key_bits: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// Default level, e.g. "warn".
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `{"store": "debug"}`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}
fn default_bitmap_token_limit() -> usize {
    50_000
}
fn default_page_size() -> usize {
    50
}
fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}
fn default_rsa_bits() -> usize {
    2048
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            bitmap_token_limit: default_bitmap_token_limit(),
            default_page_size: default_page_size(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
            rsa_key_bits: default_rsa_bits(),
        }
    }
}

impl Config {
    /// Construct the minimal config pointing at a given root, everything
    /// else defaulted. Used by tests and simple embedders.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache_enabled: default_true(),
            use_index: default_true(),
            indexing: IndexingConfig::default(),
            metadata: MetadataConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration layered from a TOML file plus `SFS_`-prefixed
    /// environment overrides. `path` is always required and must be
    /// supplied by the caller since there is no sane repository-wide
    /// default (unlike the teacher's code-intelligence workspace root).
    pub fn load_from(path: impl AsRef<std::path::Path>, store_path: PathBuf) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Config::for_path(store_path)))
            .merge(Toml::file(path))
            .merge(
                Env::prefixed("SFS_").map(|key| {
                    key.as_str().to_lowercase().replace("__", ".").into()
                }),
            )
            .extract()
    }

    /// The OAuth substore's own subroot (§4.9): `{path}/oauth`.
    pub fn oauth_root(&self) -> PathBuf {
        self.path.join("oauth")
    }
}
