//! Per-collection membership bitmap (§4.6 "collection index"). Each
//! collection directory carries its own `.index/.members.gob`, distinct
//! from the store-wide attribute index, so that `total_items` and
//! pagination never require a directory walk.
//!
//! Like the attribute index, membership is a `RoaringTreemap` keyed
//! directly by the 64-bit `ObjectRef` — iterating it yields real refs
//! resolvable straight through the store-wide `ref` map.

use std::path::Path;

use roaring::RoaringTreemap;

use crate::codec::BinCodec;
use crate::error::IndexResult;
use crate::fs::RootedFs;
use crate::refs::ObjectRef;

const MEMBERS_FILE: &str = ".index/.members.gob";

#[derive(Debug, Default, Clone)]
pub struct CollectionIndex {
    members: RoaringTreemap,
}

impl CollectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object_ref: ObjectRef) -> bool {
        self.members.insert(object_ref.as_u64())
    }

    pub fn remove(&mut self, object_ref: ObjectRef) -> bool {
        self.members.remove(object_ref.as_u64())
    }

    pub fn contains(&self, object_ref: ObjectRef) -> bool {
        self.members.contains(object_ref.as_u64())
    }

    pub fn total_items(&self) -> u64 {
        self.members.len()
    }

    /// Member `ObjectRef`s, in ascending hash order (the read pipeline
    /// re-sorts by `published`/IRI before paginating — see `§4.7`).
    pub fn iter(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        self.members.iter().map(ObjectRef)
    }

    /// Load a collection's membership bitmap rooted at `collection_rel`
    /// (the collection's own directory inside the store). A missing
    /// index file is treated as an empty collection (§4.6 "Failure
    /// semantics").
    pub fn load(fs: &RootedFs, collection_rel: &Path) -> IndexResult<Self> {
        let path = collection_rel.join(MEMBERS_FILE);
        if !fs.exists(&path)? {
            return Ok(Self::new());
        }
        let bytes = fs.read(&path)?;
        let members: RoaringTreemap = BinCodec::decode(&bytes)?;
        Ok(Self { members })
    }

    pub fn persist(&self, fs: &RootedFs, collection_rel: &Path) -> IndexResult<()> {
        let path = collection_rel.join(MEMBERS_FILE);
        let bytes = BinCodec::encode(&self.members)?;
        fs.write_atomic(&path, &bytes)?;
        Ok(())
    }
}
