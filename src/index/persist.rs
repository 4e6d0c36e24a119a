//! Persistence for the store-wide [`IndexSet`] (§4.6, §6 layout table:
//! `.index/.{attribute}.gob` per attribute plus `.index/.ref.gob`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use roaring::RoaringTreemap;

use crate::codec::BinCodec;
use crate::error::IndexResult;
use crate::fs::RootedFs;
use crate::index::{Attribute, IndexSet};

fn attribute_path(attribute: Attribute) -> PathBuf {
    Path::new(".index").join(format!(".{}.gob", attribute.file_stem()))
}

fn refs_path() -> PathBuf {
    Path::new(".index").join(".ref.gob")
}

/// Load the full index set from disk. Any attribute (or the ref map)
/// whose file is absent loads as empty, matching the spec's "load with
/// no index files present works as if indexes were empty" failure
/// semantics.
pub fn load_index_set(fs: &RootedFs) -> IndexResult<IndexSet> {
    let mut index = IndexSet::new();

    for attribute in Attribute::ALL {
        let path = attribute_path(attribute);
        if !fs.exists(&path)? {
            continue;
        }
        let bytes = fs.read(&path)?;
        let snapshot: HashMap<String, RoaringTreemap> = BinCodec::decode(&bytes)?;
        index.set_attribute_snapshot(attribute, snapshot);
    }

    let refs_path = refs_path();
    if fs.exists(&refs_path)? {
        let bytes = fs.read(&refs_path)?;
        let refs: HashMap<u64, PathBuf> = BinCodec::decode(&bytes)?;
        index.set_refs_snapshot(refs);
    }

    Ok(index)
}

/// Persist the full index set, one file per attribute plus the ref map.
/// Each file is written atomically; a crash between files leaves the
/// remaining attributes at their previous on-disk state, which a
/// subsequent reindex repairs (§4.6 "Failure semantics").
pub fn persist_index_set(fs: &RootedFs, index: &IndexSet) -> IndexResult<()> {
    for attribute in Attribute::ALL {
        let snapshot = index.attribute_snapshot(attribute);
        let bytes = BinCodec::encode(&snapshot)?;
        fs.write_atomic(&attribute_path(attribute), &bytes)?;
    }

    let refs = index.refs_snapshot();
    let bytes = BinCodec::encode(&refs)?;
    fs.write_atomic(&refs_path(), &bytes)?;

    Ok(())
}
