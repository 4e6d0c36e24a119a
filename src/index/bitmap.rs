//! Per-attribute token→bitmap maps plus the `ObjectRef → path` map
//! (§4.6). Plain data; callers are expected to guard it with a single
//! `parking_lot::RwLock` so that an item's presence in every applicable
//! bitmap is atomic with respect to readers (§3 invariant 7).
//!
//! Bitmaps are `RoaringTreemap`s keyed directly by the 64-bit
//! `ObjectRef` — no folding down to `u32` — so a probe match resolves
//! straight back to `refs[ObjectRef]` without a separate reverse index.

use std::collections::HashMap;
use std::path::PathBuf;

use roaring::RoaringTreemap;

use crate::index::Attribute;
use crate::object::{AsActivity, AsIntransitiveActivity, AsObject, Item, ObjectKind};
use crate::refs::ObjectRef;

/// Result of probing the index with a set of checks: either the matching
/// set of `ObjectRef`s, or a signal that the probe cannot evaluate one of
/// the checks and the caller must fall back to a directory walk (§4.6
/// "probe", §9 "index insufficiency").
pub enum ProbeOutcome {
    Matches(RoaringTreemap),
    Insufficient,
}

#[derive(Debug, Default, Clone)]
pub struct IndexSet {
    attribute_indexes: HashMap<Attribute, HashMap<String, RoaringTreemap>>,
    refs: HashMap<u64, PathBuf>,
}

impl IndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ref_path(&self, object_ref: ObjectRef) -> Option<&PathBuf> {
        self.refs.get(&object_ref.as_u64())
    }

    pub fn set_ref_path(&mut self, object_ref: ObjectRef, path: PathBuf) {
        self.refs.insert(object_ref.as_u64(), path);
    }

    /// Add `item` (stored at `path`) to every attribute bitmap it
    /// qualifies for (§4.6 "add").
    pub fn add(&mut self, item: &Item, path: &std::path::Path, token_limit: usize) {
        let object_ref = ObjectRef::of(&item.iri);
        self.refs.insert(object_ref.as_u64(), path.to_path_buf());

        self.insert_token(Attribute::Id, item.iri.as_str().to_string(), object_ref, token_limit);
        self.insert_token(Attribute::Type, item.type_tag().to_string(), object_ref, token_limit);

        if let Some(name) = item.field_str("name") {
            for token in tokenize(name) {
                self.insert_token(Attribute::Name, token, object_ref, token_limit);
            }
        }

        match item.kind() {
            ObjectKind::Actor => {
                if let Some(username) = item.field_str("preferredUsername") {
                    self.insert_token(
                        Attribute::PreferredUsername,
                        username.to_lowercase(),
                        object_ref,
                        token_limit,
                    );
                }
            }
            ObjectKind::Activity => {
                if let Some(view) = item.as_activity() {
                    if let Some(actor) = view.actor() {
                        self.insert_token(Attribute::Actor, actor.to_string(), object_ref, token_limit);
                    }
                    if let Some(object) = view.object() {
                        self.insert_token(Attribute::Object, object.to_string(), object_ref, token_limit);
                    }
                }
            }
            ObjectKind::IntransitiveActivity => {
                if let Some(view) = item.as_intransitive_activity() {
                    if let Some(actor) = view.actor() {
                        self.insert_token(Attribute::Actor, actor.to_string(), object_ref, token_limit);
                    }
                }
            }
            _ => {}
        }

        if let Some(view) = item.as_object() {
            if let Some(summary) = view.summary() {
                for token in tokenize(summary) {
                    self.insert_token(Attribute::Summary, token, object_ref, token_limit);
                }
            }
            if let Some(content) = view.content() {
                for token in tokenize(content) {
                    self.insert_token(Attribute::Content, token, object_ref, token_limit);
                }
            }
            if let Some(attributed_to) = view.attributed_to() {
                self.insert_token(
                    Attribute::AttributedTo,
                    attributed_to.to_string(),
                    object_ref,
                    token_limit,
                );
            }
            for recipient in view.recipients() {
                self.insert_token(Attribute::Recipients, recipient, object_ref, token_limit);
            }
        }
    }

    fn insert_token(&mut self, attribute: Attribute, token: String, object_ref: ObjectRef, token_limit: usize) {
        let bucket = self.attribute_indexes.entry(attribute).or_default();
        if !bucket.contains_key(&token) && bucket.len() >= token_limit {
            tracing::warn!(
                attribute = attribute.file_stem(),
                limit = token_limit,
                "bitmap token limit reached, dropping new token"
            );
            return;
        }
        bucket.entry(token).or_default().insert(object_ref.as_u64());
    }

    /// Best-effort removal from every attribute bitmap that supports
    /// removal; never fails the overall operation (§4.6 "remove", §7
    /// propagation policy).
    pub fn remove(&mut self, object_ref: ObjectRef) {
        self.refs.remove(&object_ref.as_u64());
        for bucket in self.attribute_indexes.values_mut() {
            for bitmap in bucket.values_mut() {
                bitmap.remove(object_ref.as_u64());
            }
        }
    }

    fn lookup(&self, attribute: Attribute, token: &str) -> RoaringTreemap {
        self.attribute_indexes
            .get(&attribute)
            .and_then(|bucket| bucket.get(token))
            .cloned()
            .unwrap_or_default()
    }

    /// AND across `constraints`, OR within each constraint's token list.
    /// An empty `constraints` slice matches everything currently indexed
    /// under `Attribute::Id` (i.e. every known object).
    pub fn probe(&self, constraints: &[(Attribute, Vec<String>)]) -> ProbeOutcome {
        if constraints.is_empty() {
            let mut all = RoaringTreemap::new();
            if let Some(bucket) = self.attribute_indexes.get(&Attribute::Id) {
                for bitmap in bucket.values() {
                    all |= bitmap;
                }
            }
            return ProbeOutcome::Matches(all);
        }

        let mut result: Option<RoaringTreemap> = None;
        for (attribute, tokens) in constraints {
            let mut union = RoaringTreemap::new();
            for token in tokens {
                union |= self.lookup(*attribute, token);
            }
            result = Some(match result {
                Some(acc) => acc & union,
                None => union,
            });
        }
        ProbeOutcome::Matches(result.unwrap_or_default())
    }

    pub fn attribute_snapshot(&self, attribute: Attribute) -> HashMap<String, RoaringTreemap> {
        self.attribute_indexes.get(&attribute).cloned().unwrap_or_default()
    }

    pub fn set_attribute_snapshot(&mut self, attribute: Attribute, snapshot: HashMap<String, RoaringTreemap>) {
        self.attribute_indexes.insert(attribute, snapshot);
    }

    pub fn refs_snapshot(&self) -> HashMap<u64, PathBuf> {
        self.refs.clone()
    }

    pub fn set_refs_snapshot(&mut self, refs: HashMap<u64, PathBuf>) {
        self.refs = refs;
    }

    pub fn clear(&mut self) {
        self.attribute_indexes.clear();
        self.refs.clear();
    }
}

/// UTF-8-folded, lowercased, whitespace/punctuation-split tokenization
/// used for free-text attributes (`name`, `summary`, `content`).
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}
