//! Scenario a (§8): actor password set/check/mismatch end to end
//! through the public `Store` API.

use pretty_assertions::assert_eq;
use serde_json::json;
use storage_fs::{Config, Iri, Item, Store, StoreError};
use tempfile::TempDir;

fn open_store() -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let config = Config::for_path(dir.path().join("root"));
    (dir, Store::open(config).unwrap())
}

#[test]
fn password_set_check_and_mismatch() {
    let (_dir, store) = open_store();
    let actor = Item::new(
        Iri::parse("https://example.com/~jdoe").unwrap(),
        json!({ "type": "Person", "preferredUsername": "jdoe" }),
    );
    store.save(actor.clone()).unwrap();

    store.password_set(&actor, "correct horse battery staple").unwrap();
    store.password_check(&actor, "correct horse battery staple").unwrap();

    let err = store.password_check(&actor, "wrong").unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)));
}

#[test]
fn password_check_before_set_is_not_found() {
    let (_dir, store) = open_store();
    let actor = Item::new(Iri::parse("https://example.com/~new").unwrap(), json!({ "type": "Person" }));
    store.save(actor.clone()).unwrap();
    assert!(matches!(store.password_check(&actor, "x"), Err(StoreError::NotFound(_))));
}

#[test]
fn gen_key_then_load_key_round_trips() {
    let (_dir, store) = open_store();
    let actor = Item::new(Iri::parse("https://example.com/~jdoe").unwrap(), json!({ "type": "Person" }));
    store.save(actor.clone()).unwrap();

    let public = store.gen_key(&actor).unwrap();
    assert_eq!(public.id, "https://example.com/~jdoe#main");

    let private_pem = store.load_key(&actor).unwrap();
    assert!(private_pem.contains("PRIVATE KEY"));
}
