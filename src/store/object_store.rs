//! Per-IRI object CRUD: create/read/update/delete with index and cache
//! write-through (§4.4).

use crate::iri::{iri_to_path, RAW_FILE};
use crate::object::Item;
use crate::codec::JsonCodec;
use crate::error::{StoreError, StoreResult};
use crate::store::Inner;

/// Store `item`, replacing any previous `__raw` at its path
/// atomically. Last-writer-wins: no lock is taken across the
/// encode/write/index/cache sequence (§4.4 "Ordering/tie-breaks").
pub fn put(inner: &Inner, item: Item) -> StoreResult<Item> {
    let path = iri_to_path(&item.iri);
    let raw_path = path.join(RAW_FILE);

    let bytes = JsonCodec::encode(&item.raw)?;
    inner.fs.write_atomic(&raw_path, &bytes)?;

    {
        let mut index = inner.index.write();
        index.add(&item, &path, inner.config.indexing.bitmap_token_limit);
    }
    inner.persist_index_best_effort();

    inner.cache.delete(&item.iri);
    inner.cache.store(item.clone());

    Ok(item)
}

/// Read the raw object at `iri`. Does not apply filters or property
/// dereference — that is the read pipeline's job (§4.7).
///
/// A missing `__raw` whose containing directory is a symlink is
/// treated as a reference to a remote host: the bare IRI is returned
/// as a minimal stub item (§8 scenario 4, §4.4 "get").
pub fn get(inner: &Inner, iri: &crate::iri::Iri) -> StoreResult<Item> {
    if let Some(cached) = inner.cache.load(iri) {
        return Ok(cached);
    }

    let path = iri_to_path(iri);
    let raw_path = path.join(RAW_FILE);

    if inner.fs.exists(&raw_path)? {
        let bytes = inner.fs.read(&raw_path)?;
        let raw: serde_json::Value = JsonCodec::decode(&bytes)?;
        let item = Item::new(iri.clone(), raw);
        inner.cache.store(item.clone());
        return Ok(item);
    }

    if inner.fs.is_symlink(&path)? {
        let target = inner.fs.readlink(&path)?;
        let resolved = crate::iri::path_to_iri(&target).unwrap_or_else(|| iri.clone());
        return Ok(Item::new(iri.clone(), serde_json::json!({ "id": resolved.as_str() })));
    }

    Err(StoreError::not_found(iri))
}

/// Recursively remove the object directory. Deleting a collection
/// removes its membership symlinks but not the referenced objects
/// (§4.4 "delete"). Idempotent.
pub fn delete(inner: &Inner, iri: &crate::iri::Iri) -> StoreResult<()> {
    let path = iri_to_path(iri);

    inner.fs.remove_all(&path)?;

    {
        let mut index = inner.index.write();
        index.remove(crate::refs::ObjectRef::of(iri));
    }
    inner.persist_index_best_effort();

    inner.cache.delete(iri);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::Inner;
    use serde_json::json;
    use tempfile::TempDir;

    fn inner() -> (TempDir, Inner) {
        let dir = TempDir::new().unwrap();
        let config = Config::for_path(dir.path().join("root"));
        let inner = Inner::open(config).unwrap();
        (dir, inner)
    }

    #[test]
    fn put_then_get_round_trips() {
        let (_dir, inner) = inner();
        let iri = crate::iri::Iri::parse("https://example.com/notes/1").unwrap();
        let item = Item::new(iri.clone(), json!({ "type": "Note", "content": "hi" }));
        put(&inner, item.clone()).unwrap();

        let loaded = get(&inner, &iri).unwrap();
        assert_eq!(loaded.raw, item.raw);
    }

    #[test]
    fn get_missing_is_not_found() {
        let (_dir, inner) = inner();
        let iri = crate::iri::Iri::parse("https://example.com/notes/missing").unwrap();
        assert!(matches!(get(&inner, &iri), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let (_dir, inner) = inner();
        let iri = crate::iri::Iri::parse("https://example.com/notes/1").unwrap();
        let item = Item::new(iri.clone(), json!({ "type": "Note" }));
        put(&inner, item).unwrap();
        delete(&inner, &iri).unwrap();
        assert!(matches!(get(&inner, &iri), Err(StoreError::NotFound(_))));
    }
}
