//! The in-memory IRI→item cache (§4.8). `DashMap`-backed, grounded on
//! the teacher's concurrent in-process state structures; a disabled
//! cache behaves as the identity rather than special-cased at every
//! call site.

use dashmap::DashMap;

use crate::iri::Iri;
use crate::object::Item;

pub trait Cache: Send + Sync {
    fn load(&self, iri: &Iri) -> Option<Item>;
    fn store(&self, item: Item);
    fn delete(&self, iri: &Iri);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoCache {
    entries: DashMap<Iri, Item>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoCache {
    fn load(&self, iri: &Iri) -> Option<Item> {
        self.entries.get(iri).map(|entry| entry.value().clone())
    }

    fn store(&self, item: Item) {
        self.entries.insert(item.iri.clone(), item);
    }

    fn delete(&self, iri: &Iri) {
        self.entries.remove(iri);
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

/// Selected when `Config::cache_enabled` is false (§4.8 "MUST then
/// behave as the identity").
#[derive(Debug, Default)]
pub struct NullCache;

impl Cache for NullCache {
    fn load(&self, _iri: &Iri) -> Option<Item> {
        None
    }

    fn store(&self, _item: Item) {}

    fn delete(&self, _iri: &Iri) {}

    fn clear(&self) {}
}

pub fn new_cache(enabled: bool) -> Box<dyn Cache> {
    if enabled {
        Box::new(MemoCache::new())
    } else {
        Box::new(NullCache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(iri: &str) -> Item {
        Item::new(Iri::parse(iri).unwrap(), json!({ "type": "Note" }))
    }

    #[test]
    fn memo_cache_round_trips() {
        let cache = MemoCache::new();
        let it = item("https://example.com/a");
        cache.store(it.clone());
        assert_eq!(cache.load(&it.iri), Some(it.clone()));
        cache.delete(&it.iri);
        assert_eq!(cache.load(&it.iri), None);
    }

    #[test]
    fn null_cache_never_retains() {
        let cache = NullCache;
        let it = item("https://example.com/a");
        cache.store(it.clone());
        assert_eq!(cache.load(&it.iri), None);
    }

    #[test]
    fn memo_cache_clear_empties_all_entries() {
        let cache = MemoCache::new();
        cache.store(item("https://example.com/a"));
        cache.store(item("https://example.com/b"));
        cache.clear();
        assert_eq!(cache.load(&Iri::parse("https://example.com/a").unwrap()), None);
        assert_eq!(cache.load(&Iri::parse("https://example.com/b").unwrap()), None);
    }
}
