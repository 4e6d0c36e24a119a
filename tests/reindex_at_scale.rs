//! Scenario f (§8): reindexing a larger mixed tree returns the same
//! result set as the live index did before the reset.

use pretty_assertions::assert_eq;
use serde_json::json;
use storage_fs::{Config, Iri, Item, Store};
use tempfile::TempDir;

#[test]
fn reindex_preserves_filtered_results_over_a_mixed_tree() {
    let dir = TempDir::new().unwrap();
    let config = Config::for_path(dir.path().join("root"));
    let store = Store::open(config).unwrap();

    let outbox = Iri::parse("https://example.com/jdoe/outbox").unwrap();
    store.create(Item::new(outbox.clone(), json!({ "type": "OrderedCollection" }))).unwrap();
    let mut create_count = 0;

    for n in 0..300u32 {
        let type_tag = match n % 3 {
            0 => "Create",
            1 => "Like",
            _ => "Announce",
        };
        if type_tag == "Create" {
            create_count += 1;
        }
        let iri = Iri::parse(&format!("https://example.com/activities/{n}")).unwrap();
        store
            .save(Item::new(iri.clone(), json!({ "type": type_tag, "actor": "https://example.com/jdoe" })))
            .unwrap();
        store.add_to(&outbox, &[iri]).unwrap();
    }

    use storage_fs::{index::Attribute, Check};
    struct TypeIs(&'static str);
    impl Check for TypeIs {
        fn matches(&self, item: &storage_fs::Item) -> bool {
            item.type_tag() == self.0
        }
        fn index_hint(&self) -> Option<(Attribute, Vec<String>)> {
            Some((Attribute::Type, vec![self.0.to_string()]))
        }
    }

    let check = TypeIs("Create");
    let before = store.load(&outbox, &[&check]).unwrap();
    assert_eq!(before.raw["totalItems"], create_count);

    store.reindex().unwrap();

    let after = store.load(&outbox, &[&check]).unwrap();
    assert_eq!(after.raw["totalItems"], before.raw["totalItems"]);
}
