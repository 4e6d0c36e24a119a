//! CLI surface for `storage-fs` (§6, §1 "operability"). Trimmed to the
//! subset the `Store` contract actually exposes: lifecycle commands
//! plus a pair of smoke commands for `load`/`save`, grounded on the
//! teacher's `clap`-derive `Cli`/`Commands` shape.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "storage-fs", version, about = "Filesystem-backed ActivityPub object store")]
pub struct Cli {
    /// Store root directory.
    #[arg(long, global = true, env = "SFS_PATH")]
    pub path: PathBuf,

    /// Optional TOML config file layered under `path`'s defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the store root directory.
    Bootstrap,
    /// Remove the store root directory entirely.
    Clean,
    /// Drop the in-memory cache and bitmap index.
    Reset,
    /// Rebuild the bitmap index from on-disk truth.
    Reindex,
    /// Load an object or collection by IRI and print it as JSON.
    Load {
        iri: String,
    },
    /// Save a JSON object read from a file (or stdin with `-`) at its `id` IRI.
    Save {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}
