//! Scenarios b and c (§8): paginated collection ordering at realistic
//! scale, and filter composition through the public `Store` API.

use pretty_assertions::assert_eq;
use serde_json::json;
use storage_fs::{Check, Config, Iri, Item, Store};
use tempfile::TempDir;

fn open_store() -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let config = Config::for_path(dir.path().join("root"));
    (dir, Store::open(config).unwrap())
}

struct TypeIs(String);
impl Check for TypeIs {
    fn matches(&self, item: &storage_fs::Item) -> bool {
        item.type_tag() == self.0
    }
    fn index_hint(&self) -> Option<(storage_fs::index::Attribute, Vec<String>)> {
        Some((storage_fs::index::Attribute::Type, vec![self.0.clone()]))
    }
}

#[test]
fn inbox_of_one_hundred_orders_by_published_descending() {
    let (_dir, store) = open_store();
    let inbox = Iri::parse("https://example.com/jdoe/inbox").unwrap();
    store.create(Item::new(inbox.clone(), json!({ "type": "OrderedCollection" }))).unwrap();

    for n in 0..100u32 {
        let iri = Iri::parse(&format!("https://remote.example/notes/{n}")).unwrap();
        let published = format!("2026-01-{:02}T00:00:00Z", 1 + (n % 28));
        store
            .save(Item::new(iri.clone(), json!({ "type": "Note", "published": published })))
            .unwrap();
        store.add_to(&inbox, &[iri]).unwrap();
    }

    let loaded = store.load(&inbox, &[]).unwrap();
    assert_eq!(loaded.raw["totalItems"], 100);

    let items = loaded.raw["orderedItems"].as_array().unwrap();
    let published: Vec<&str> = items.iter().map(|i| i["published"].as_str().unwrap()).collect();
    let mut sorted = published.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(published, sorted, "page must be ordered by published descending");
}

#[test]
fn filter_by_type_then_by_nested_actor_name() {
    let (_dir, store) = open_store();
    let outbox = Iri::parse("https://example.com/jdoe/outbox").unwrap();
    store.create(Item::new(outbox.clone(), json!({ "type": "OrderedCollection" }))).unwrap();

    let hank = Iri::parse("https://example.com/hank").unwrap();
    store.save(Item::new(hank.clone(), json!({ "type": "Person", "name": "Hank" }))).unwrap();
    let alice = Iri::parse("https://example.com/alice").unwrap();
    store.save(Item::new(alice.clone(), json!({ "type": "Person", "name": "Alice" }))).unwrap();

    for (n, actor) in [(1, &hank), (2, &hank), (3, &alice)] {
        let create = Iri::parse(&format!("https://example.com/activities/{n}")).unwrap();
        store
            .save(Item::new(create.clone(), json!({ "type": "Create", "actor": actor.as_str() })))
            .unwrap();
        store.add_to(&outbox, &[create]).unwrap();
    }
    let like = Iri::parse("https://example.com/activities/like").unwrap();
    store.save(Item::new(like.clone(), json!({ "type": "Like", "actor": hank.as_str() }))).unwrap();
    store.add_to(&outbox, &[like]).unwrap();

    let type_check = TypeIs("Create".to_string());
    let loaded = store.load(&outbox, &[&type_check]).unwrap();
    assert_eq!(loaded.raw["totalItems"], 3);

    // Dereferencing happens first; "actor.name" is checked post-hoc against
    // the resolved actor object since nested-field equality has no bitmap
    // attribute of its own (§9 "index insufficiency").
    let items = loaded.raw["orderedItems"].as_array().unwrap();
    let hank_creates = items.iter().filter(|i| i["actor"]["name"] == "Hank").count();
    assert_eq!(hank_creates, 2);
}
