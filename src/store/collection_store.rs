//! Collection membership: object + directory of symlinks to member
//! directories, `totalItems` kept in sync (§4.5).

use std::path::{Path, PathBuf};

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::error::{FsError, StoreError, StoreResult};
use crate::index::CollectionIndex;
use crate::iri::{iri_to_path, Iri, HIDDEN_COLLECTIONS, RAW_FILE};
use crate::object::{AsCollection, Item, ObjectKind};
use crate::refs::ObjectRef;
use crate::store::{object_store, Inner};

/// Default `cc` addressing for newly created collections (§4.5
/// "create": "sets `cc` to the public namespace by default").
const PUBLIC_NAMESPACE: &str = "https://www.w3.org/ns/activitystreams#Public";

/// Equivalent to `put` on a collection object: zeroes `totalItems`,
/// defaults `cc` to the public namespace, stamps `published` (§4.5
/// "create").
pub fn create(inner: &Inner, mut collection: Item) -> StoreResult<Item> {
    if !matches!(collection.kind(), ObjectKind::Collection) {
        return Err(StoreError::InvalidInput(format!(
            "create requires a collection-typed item, got {:?}",
            collection.kind()
        )));
    }

    if collection.raw.get("cc").is_none() {
        collection.raw["cc"] = serde_json::json!(PUBLIC_NAMESPACE);
    }
    collection.set_published_now(chrono::Utc::now());
    if let Some(mut view) = collection.as_collection_mut() {
        view.set_total_items(0);
        view.clear_inline_items();
    }

    object_store::put(inner, collection)
}

/// `true` if `iri`'s terminal collection segment is one of the "hidden"
/// reserved names that may be created implicitly on first `add_to`
/// (§4.5 step 1, GLOSSARY "Hidden collection").
fn is_hidden(iri: &Iri) -> bool {
    HIDDEN_COLLECTIONS.contains(&iri.terminal_component())
}

fn create_implicit_hidden(inner: &Inner, col_iri: &Iri) -> StoreResult<Item> {
    let owner = col_iri.owner_of_collection().ok_or_else(|| {
        StoreError::InvalidInput(format!("{col_iri} is not a recognizable hidden-collection IRI"))
    })?;
    let raw = serde_json::json!({
        "id": col_iri.as_str(),
        "type": "OrderedCollection",
        "attributedTo": owner.as_str(),
    });
    create(inner, Item::new(col_iri.clone(), raw))
}

/// Percent-encode a member's relative path (with `/` separators
/// retained as a single encoded segment) for use as a symlink filename
/// inside the collection directory (§4.5, §6 layout table).
fn encode_member_name(member_path: &Path) -> String {
    let joined = member_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    utf8_percent_encode(&joined, NON_ALPHANUMERIC).to_string()
}

/// A relative symlink target from the collection directory to the
/// member directory, computed lexically so it never needs to resolve
/// through the filesystem (§3 invariant 4: "relative, ... never cross
/// the repository root").
fn relative_target(col_path: &Path, member_path: &Path) -> PathBuf {
    let ups = col_path.components().count();
    let mut out = PathBuf::new();
    for _ in 0..ups {
        out.push("..");
    }
    out.push(member_path);
    out
}

/// Add `members` to the collection at `col_iri`. A missing collection
/// is created implicitly only if it is in the hidden set; otherwise the
/// caller must `create` it first (§4.5 step 1, §8 scenario d).
pub fn add_to(inner: &Inner, col_iri: &Iri, members: &[Iri]) -> StoreResult<()> {
    let col_path = iri_to_path(col_iri);
    let col_raw_path = col_path.join(RAW_FILE);

    let mut collection = if inner.fs.exists(&col_raw_path)? {
        object_store::get(inner, col_iri)?
    } else if is_hidden(col_iri) {
        create_implicit_hidden(inner, col_iri)?
    } else {
        return Err(StoreError::Fs(FsError::NotFound(col_raw_path)));
    };

    let mut col_index = CollectionIndex::load(&inner.fs, &col_path)?;

    for member_iri in members {
        // Resolve the bare IRI first (§4.5 step 2); a missing referent
        // fails the whole call rather than silently indexing a ref to
        // nothing.
        object_store::get(inner, member_iri)?;

        if !member_iri.is_contained_in(col_iri) {
            let member_path = iri_to_path(member_iri);
            let symlink_path = col_path.join(encode_member_name(&member_path));
            if inner.fs.is_symlink(&symlink_path)? {
                // Conflict is not an error on the item: idempotent add (§4.5, §8 round-trip).
                continue;
            }
            let target = relative_target(&col_path, &member_path);
            inner.fs.symlink(&symlink_path, &target)?;
        }

        col_index.add(ObjectRef::of(member_iri));
    }

    // `totalItems` derives from bitmap cardinality rather than a
    // running counter, making re-adding an existing member a no-op on
    // the count (§9 Open Question: idempotent on duplicate add).
    if let Some(mut view) = collection.as_collection_mut() {
        view.set_total_items(col_index.total_items());
        view.clear_inline_items();
    }
    object_store::put(inner, collection)?;
    col_index.persist(&inner.fs, &col_path)?;

    Ok(())
}

/// Remove `members` from the collection at `col_iri`. Silent no-op for
/// members that are not present (§4.5 "remove_from").
pub fn remove_from(inner: &Inner, col_iri: &Iri, members: &[Iri]) -> StoreResult<()> {
    let col_path = iri_to_path(col_iri);
    if !inner.fs.exists(&col_path.join(RAW_FILE))? {
        return Err(StoreError::not_found(col_iri));
    }

    let mut collection = object_store::get(inner, col_iri)?;
    let mut col_index = CollectionIndex::load(&inner.fs, &col_path)?;

    for member_iri in members {
        if !member_iri.is_contained_in(col_iri) {
            let member_path = iri_to_path(member_iri);
            let symlink_path = col_path.join(encode_member_name(&member_path));
            inner.fs.remove(&symlink_path)?; // idempotent
        }
        col_index.remove(ObjectRef::of(member_iri));
    }

    if let Some(mut view) = collection.as_collection_mut() {
        view.set_total_items(col_index.total_items());
    }
    object_store::put(inner, collection)?;
    col_index.persist(&inner.fs, &col_path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;
    use tempfile::TempDir;

    fn inner() -> (TempDir, Inner) {
        let dir = TempDir::new().unwrap();
        let config = Config::for_path(dir.path().join("root"));
        let inner = Inner::open(config).unwrap();
        (dir, inner)
    }

    fn note(inner: &Inner, path: &str) -> Iri {
        let iri = Iri::parse(path).unwrap();
        object_store::put(inner, Item::new(iri.clone(), json!({ "type": "Note" }))).unwrap();
        iri
    }

    #[test]
    fn create_zeroes_total_items_and_defaults_cc() {
        let (_dir, inner) = inner();
        let iri = Iri::parse("https://example.com/jdoe/outbox").unwrap();
        let col = Item::new(iri, json!({ "type": "OrderedCollection" }));
        let created = create(&inner, col).unwrap();
        assert_eq!(created.as_collection().unwrap().total_items(), 0);
        assert_eq!(created.raw["cc"], PUBLIC_NAMESPACE);
        assert!(created.raw.get("published").is_some());
    }

    #[test]
    fn add_to_missing_collection_fails_unless_hidden() {
        let (_dir, inner) = inner();
        let col = Iri::parse("https://example.com/jdoe/outbox").unwrap();
        let item = note(&inner, "https://example.com/notes/1");
        assert!(matches!(add_to(&inner, &col, &[item]), Err(StoreError::Fs(FsError::NotFound(_)))));
    }

    #[test]
    fn add_to_hidden_collection_creates_it_implicitly() {
        let (_dir, inner) = inner();
        let col = Iri::parse("https://example.com/jdoe/blocked").unwrap();
        let item = note(&inner, "https://example.com/troll");
        add_to(&inner, &col, &[item]).unwrap();
        let loaded = object_store::get(&inner, &col).unwrap();
        assert_eq!(loaded.raw["attributedTo"], "https://example.com/jdoe");
        assert_eq!(loaded.as_collection().unwrap().total_items(), 1);
    }

    #[test]
    fn add_then_remove_round_trips_total_items() {
        let (_dir, inner) = inner();
        let col_iri = Iri::parse("https://example.com/jdoe/followers").unwrap();
        create(&inner, Item::new(col_iri.clone(), json!({ "type": "OrderedCollection" }))).unwrap();
        let member = note(&inner, "https://remote.example/alice");

        add_to(&inner, &col_iri, &[member.clone()]).unwrap();
        let loaded = object_store::get(&inner, &col_iri).unwrap();
        assert_eq!(loaded.as_collection().unwrap().total_items(), 1);

        remove_from(&inner, &col_iri, &[member]).unwrap();
        let loaded = object_store::get(&inner, &col_iri).unwrap();
        assert_eq!(loaded.as_collection().unwrap().total_items(), 0);
    }

    #[test]
    fn re_adding_existing_member_is_idempotent_on_count() {
        let (_dir, inner) = inner();
        let col_iri = Iri::parse("https://example.com/jdoe/followers").unwrap();
        create(&inner, Item::new(col_iri.clone(), json!({ "type": "OrderedCollection" }))).unwrap();
        let member = note(&inner, "https://remote.example/alice");

        add_to(&inner, &col_iri, &[member.clone()]).unwrap();
        add_to(&inner, &col_iri, &[member]).unwrap();

        let loaded = object_store::get(&inner, &col_iri).unwrap();
        assert_eq!(loaded.as_collection().unwrap().total_items(), 1);
    }

    #[test]
    fn remove_from_absent_member_is_silent_no_op() {
        let (_dir, inner) = inner();
        let col_iri = Iri::parse("https://example.com/jdoe/followers").unwrap();
        create(&inner, Item::new(col_iri.clone(), json!({ "type": "OrderedCollection" }))).unwrap();
        let never_added = Iri::parse("https://remote.example/ghost").unwrap();
        remove_from(&inner, &col_iri, &[never_added]).unwrap();
    }
}
