//! The read pipeline (§4.7): canonicalize → collection-vs-item dispatch
//! → cache → index-probe-or-walk → property dereference → filter →
//! pagination.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::codec::JsonCodec;
use crate::error::{StoreError, StoreResult};
use crate::filter::{matches_all, Check};
use crate::index::{Attribute, CollectionIndex, ProbeOutcome};
use crate::iri::{is_reserved_name, iri_to_path, path_to_iri, Iri, RAW_FILE, RESERVED_COLLECTIONS};
use crate::object::{classify, AsCollection, Item, ObjectKind};
use crate::refs::ObjectRef;
use crate::store::{object_store, Inner};

/// Recursion guard for property dereference: items reference one
/// another by IRI rather than owning pointers, so a malformed
/// self-referencing chain cannot loop forever (§9 "cyclic and shared
/// references").
const MAX_DEREF_DEPTH: u8 = 4;

/// Entry point: dispatches to item or collection loading based on
/// whether `iri` names a reserved collection segment or the stored
/// object itself classifies as a collection (§4.7 "canonicalize").
pub fn load(inner: &Inner, iri: &Iri, checks: &[&dyn Check]) -> StoreResult<Item> {
    let path = iri_to_path(iri);
    let raw_path = path.join(RAW_FILE);

    let is_collection = RESERVED_COLLECTIONS.contains(&iri.terminal_component())
        || (inner.fs.exists(&raw_path)? && peek_kind(inner, &raw_path)? == ObjectKind::Collection);

    if is_collection {
        load_collection(inner, iri, checks)
    } else {
        load_item(inner, iri, checks)
    }
}

fn peek_kind(inner: &Inner, raw_path: &Path) -> StoreResult<ObjectKind> {
    let bytes = inner.fs.read(raw_path)?;
    let value: Value = JsonCodec::decode(&bytes)?;
    let type_tag = value.get("type").and_then(Value::as_str).unwrap_or("");
    Ok(classify(type_tag))
}

fn load_item(inner: &Inner, iri: &Iri, checks: &[&dyn Check]) -> StoreResult<Item> {
    let item = object_store::get(inner, iri)?;
    let item = dereference(inner, item, 0);
    if !matches_all(checks, &item) {
        return Err(StoreError::not_found(iri));
    }
    Ok(item)
}

fn load_collection(inner: &Inner, iri: &Iri, checks: &[&dyn Check]) -> StoreResult<Item> {
    let col_path = iri_to_path(iri);
    if !inner.fs.exists(&col_path.join(RAW_FILE))? {
        return Err(StoreError::not_found(iri));
    }

    // `checks` are item-level content filters (type, name, ...) applied
    // to each member below; the collection wrapper itself carries none
    // of those fields, so it is only loaded here to seed the assembled
    // page, not re-filtered (§4.7 step 4, §8 scenario c).
    let collection = object_store::get(inner, iri)?;

    let mut constraints = Vec::new();
    let mut insufficient = false;
    for check in checks {
        match check.index_hint() {
            Some(hint) => constraints.push(hint),
            None => insufficient = true,
        }
    }

    let col_index = CollectionIndex::load(&inner.fs, &col_path)?;

    let candidates: Vec<(ObjectRef, PathBuf)> = if inner.config.use_index && !insufficient {
        let probe = {
            let index = inner.index.read();
            index.probe(&constraints)
        };
        match probe {
            ProbeOutcome::Matches(matched) => {
                let index = inner.index.read();
                col_index
                    .iter()
                    .filter(|r| matched.contains(r.as_u64()))
                    .filter_map(|r| index.ref_path(r).cloned().map(|p| (r, p)))
                    .collect()
            }
            ProbeOutcome::Insufficient => walk_collection(inner, &col_path)?,
        }
    } else {
        walk_collection(inner, &col_path)?
    };

    let mut items = Vec::new();
    for (_object_ref, rel_path) in candidates {
        let raw_path = rel_path.join(RAW_FILE);
        if !inner.fs.exists(&raw_path)? {
            continue;
        }
        let bytes = inner.fs.read(&raw_path)?;
        let raw: Value = JsonCodec::decode(&bytes)?;
        let Some(member_iri) = path_to_iri(&rel_path) else { continue };
        let item = Item::new(member_iri, raw);
        // Re-verified exactly regardless of index-or-walk provenance, so
        // bitmap collisions or a stale walk never leak a false positive
        // (§4.6 "probe"/§9 "index insufficiency").
        if matches_all(checks, &item) {
            items.push(item);
        }
    }

    // Ordering (§4.7): descending `published`, ties broken lexicographically by IRI.
    items.sort_by(|a, b| b.published().cmp(&a.published()).then_with(|| a.iri.as_str().cmp(b.iri.as_str())));

    let total_items = items.len() as u64;
    let page_size = inner.config.indexing.default_page_size;
    let page: Vec<Item> = items.into_iter().take(page_size).map(|item| dereference(inner, item, 0)).collect();

    Ok(assemble_page(iri, &collection, page, total_items, page_size))
}

/// Enumerate a collection directory's immediate children by reading the
/// filesystem directly, bypassing the global index entirely — the path
/// taken when a probe reports index-insufficiency (§4.7, §9).
pub(crate) fn walk_collection(inner: &Inner, col_path: &Path) -> StoreResult<Vec<(ObjectRef, PathBuf)>> {
    let mut out = Vec::new();
    for entry in inner.fs.read_dir(col_path)? {
        let Some(name) = entry.file_name().and_then(|n| n.to_str()) else { continue };
        if is_reserved_name(name) {
            continue;
        }

        if inner.fs.is_symlink(&entry)? {
            let target = inner.fs.readlink(&entry)?;
            let parent = entry.parent().unwrap_or(Path::new(""));
            let member_rel = normalize_path(&parent.join(&target));
            if let Some(member_iri) = path_to_iri(&member_rel) {
                out.push((ObjectRef::of(&member_iri), member_rel));
            }
        } else if inner.fs.exists(&entry.join(RAW_FILE))? {
            if let Some(member_iri) = path_to_iri(&entry) {
                out.push((ObjectRef::of(&member_iri), entry));
            }
        }
    }
    Ok(out)
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut stack: Vec<std::path::Component> = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                stack.pop();
            }
            std::path::Component::CurDir => {}
            other => stack.push(other),
        }
    }
    stack.into_iter().collect()
}

fn assemble_page(iri: &Iri, collection: &Item, page_items: Vec<Item>, total_items: u64, page_size: usize) -> Item {
    let mut raw = collection.raw.clone();
    raw["type"] = Value::String("OrderedCollectionPage".to_string());
    raw["totalItems"] = Value::Number(total_items.into());
    raw["first"] = Value::String(format!("{iri}?maxItems={page_size}"));
    raw["orderedItems"] = Value::Array(page_items.into_iter().map(|item| item.raw).collect());
    Item::new(iri.clone(), raw)
}

/// Resolve IRI-valued properties into the referenced object's payload
/// (§4.7 step 3): activities dereference `object`, intransitive
/// activities dereference `target`, actors dereference `tag` entries,
/// plain objects dereference `DEREFERENCEABLE_OBJECT_FIELDS`. Failures
/// to resolve a reference are silent — the field is left as a bare IRI
/// string rather than failing the whole load.
fn dereference(inner: &Inner, mut item: Item, depth: u8) -> Item {
    if depth >= MAX_DEREF_DEPTH {
        return item;
    }

    match item.kind() {
        ObjectKind::Activity => {
            if let Some(obj_iri) = item.field_str("object").map(str::to_string) {
                if let Some(resolved) = try_dereference(inner, &obj_iri, depth) {
                    item.raw["object"] = resolved;
                }
            }
        }
        ObjectKind::IntransitiveActivity => {
            if let Some(target_iri) = item.field_str("target").map(str::to_string) {
                if let Some(resolved) = try_dereference(inner, &target_iri, depth) {
                    item.raw["target"] = resolved;
                }
            }
        }
        ObjectKind::Actor => dereference_tags(inner, &mut item, depth),
        ObjectKind::Object | ObjectKind::Tombstone => {
            for field in Item::DEREFERENCEABLE_OBJECT_FIELDS {
                if let Some(val) = item.field_str(field).map(str::to_string) {
                    if let Some(resolved) = try_dereference(inner, &val, depth) {
                        item.raw[*field] = resolved;
                    }
                }
            }
        }
        _ => {}
    }

    item
}

fn try_dereference(inner: &Inner, iri_str: &str, depth: u8) -> Option<Value> {
    let iri = Iri::parse(iri_str).ok()?;
    let loaded = object_store::get(inner, &iri).ok()?;
    Some(dereference(inner, loaded, depth + 1).raw)
}

fn dereference_tags(inner: &Inner, item: &mut Item, depth: u8) {
    let Some(Value::Array(tags)) = item.raw.get("tag").cloned() else { return };
    let mut out = Vec::with_capacity(tags.len());
    for tag in tags {
        if let Value::String(s) = &tag {
            if let Some(resolved) = try_dereference(inner, s, depth + 1) {
                out.push(resolved);
                continue;
            }
        }
        out.push(tag);
    }
    item.raw["tag"] = Value::Array(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::filter::{PropertyEquals, TypeIs};
    use crate::store::collection_store;
    use serde_json::json;
    use tempfile::TempDir;

    fn inner() -> (TempDir, Inner) {
        let dir = TempDir::new().unwrap();
        let config = Config::for_path(dir.path().join("root"));
        let inner = Inner::open(config).unwrap();
        (dir, inner)
    }

    #[test]
    fn load_item_applies_checks() {
        let (_dir, inner) = inner();
        let iri = Iri::parse("https://example.com/notes/1").unwrap();
        object_store::put(&inner, Item::new(iri.clone(), json!({ "type": "Note", "name": "hi" }))).unwrap();

        let ok = TypeIs("Note".to_string());
        assert!(load(&inner, &iri, &[&ok]).is_ok());

        let bad = TypeIs("Article".to_string());
        assert!(matches!(load(&inner, &iri, &[&bad]), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn load_activity_dereferences_object() {
        let (_dir, inner) = inner();
        let note_iri = Iri::parse("https://example.com/notes/1").unwrap();
        object_store::put(&inner, Item::new(note_iri.clone(), json!({ "type": "Note", "content": "hi" }))).unwrap();

        let create_iri = Iri::parse("https://example.com/activities/1").unwrap();
        object_store::put(
            &inner,
            Item::new(
                create_iri.clone(),
                json!({ "type": "Create", "actor": "https://example.com/jdoe", "object": note_iri.as_str() }),
            ),
        )
        .unwrap();

        let loaded = load(&inner, &create_iri, &[]).unwrap();
        assert_eq!(loaded.raw["object"]["content"], "hi");
    }

    #[test]
    fn load_collection_orders_by_published_desc_and_sets_total_items() {
        let (_dir, inner) = inner();
        let inbox = Iri::parse("https://example.com/jdoe/inbox").unwrap();
        collection_store::create(&inner, Item::new(inbox.clone(), json!({ "type": "OrderedCollection" }))).unwrap();

        for (n, published) in [(1, "2026-01-01T00:00:00Z"), (2, "2026-03-01T00:00:00Z"), (3, "2026-02-01T00:00:00Z")] {
            let iri = Iri::parse(&format!("https://remote.example/notes/{n}")).unwrap();
            object_store::put(
                &inner,
                Item::new(iri.clone(), json!({ "type": "Note", "published": published })),
            )
            .unwrap();
            collection_store::add_to(&inner, &inbox, &[iri]).unwrap();
        }

        let loaded = load(&inner, &inbox, &[]).unwrap();
        assert_eq!(loaded.raw["totalItems"], 3);
        let items = loaded.raw["orderedItems"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["published"], "2026-03-01T00:00:00+00:00");
        assert_eq!(items[1]["published"], "2026-02-01T00:00:00+00:00");
        assert_eq!(items[2]["published"], "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn load_collection_falls_back_to_walk_for_unhinted_checks() {
        let (_dir, inner) = inner();
        let outbox = Iri::parse("https://example.com/jdoe/outbox").unwrap();
        collection_store::create(&inner, Item::new(outbox.clone(), json!({ "type": "OrderedCollection" }))).unwrap();

        let iri = Iri::parse("https://example.com/jdoe/outbox/1").unwrap();
        object_store::put(&inner, Item::new(iri.clone(), json!({ "type": "Note", "name": "Hank" }))).unwrap();
        collection_store::add_to(&inner, &outbox, &[iri]).unwrap();

        let check = PropertyEquals { field: "name".to_string(), value: "Hank".to_string() };
        let loaded = load(&inner, &outbox, &[&check]).unwrap();
        assert_eq!(loaded.raw["totalItems"], 1);
    }
}
