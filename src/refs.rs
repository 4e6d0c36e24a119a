//! `ObjectRef`: a stable 64-bit hash of an IRI used as a bitmap element
//! (§3). Standardized on 64-bit per the Open Question resolution in §9 —
//! no 32-bit variant is exposed.

use crate::iri::Iri;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ObjectRef(pub u64);

impl ObjectRef {
    /// Deterministic across runs and processes: a pure function of the
    /// canonical IRI bytes.
    pub fn of(iri: &Iri) -> Self {
        ObjectRef(xxh3_64(iri.as_str().as_bytes()))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<&Iri> for ObjectRef {
    fn from(iri: &Iri) -> Self {
        ObjectRef::of(iri)
    }
}
