//! The polymorphic graph object model (§3) and its capability traits
//! (§9 Design Notes: dynamic type dispatch as a tagged variant plus a
//! small set of capability traits, each with a read-through and a
//! mutating visitor, rather than a class hierarchy).

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::iri::Iri;

/// Vocabulary families the store dispatches on structurally. The payload
/// itself stays an opaque JSON document beyond these handful of
/// structural fields (§3 "Object").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Actor,
    Activity,
    IntransitiveActivity,
    Object,
    Collection,
    Tombstone,
    Unknown,
}

pub mod vocabulary {
    pub const ACTOR_TYPES: &[&str] = &["Person", "Group", "Organization", "Application", "Service"];
    pub const ACTIVITY_TYPES: &[&str] = &[
        "Create", "Update", "Delete", "Follow", "Accept", "Reject", "TentativeAccept",
        "TentativeReject", "Add", "Remove", "Like", "Announce", "Undo", "Block", "Flag",
        "Dislike", "Join", "Leave", "Invite", "Offer", "Ignore", "Listen", "Move", "Read", "View",
    ];
    pub const INTRANSITIVE_ACTIVITY_TYPES: &[&str] = &["Arrive", "Travel", "Question"];
    pub const OBJECT_TYPES: &[&str] = &[
        "Note", "Article", "Image", "Video", "Audio", "Document", "Page", "Event", "Place",
        "Profile", "Relationship",
    ];
    pub const COLLECTION_TYPES: &[&str] =
        &["Collection", "OrderedCollection", "CollectionPage", "OrderedCollectionPage"];
    pub const ORDERED_COLLECTION_TYPES: &[&str] = &["OrderedCollection", "OrderedCollectionPage"];
}

/// Classify a raw `type` tag into its vocabulary family.
pub fn classify(type_tag: &str) -> ObjectKind {
    use vocabulary::*;
    if ACTOR_TYPES.contains(&type_tag) {
        ObjectKind::Actor
    } else if ACTIVITY_TYPES.contains(&type_tag) {
        ObjectKind::Activity
    } else if INTRANSITIVE_ACTIVITY_TYPES.contains(&type_tag) {
        ObjectKind::IntransitiveActivity
    } else if COLLECTION_TYPES.contains(&type_tag) {
        ObjectKind::Collection
    } else if type_tag == "Tombstone" {
        ObjectKind::Tombstone
    } else if OBJECT_TYPES.contains(&type_tag) {
        ObjectKind::Object
    } else {
        ObjectKind::Unknown
    }
}

/// A decoded graph item: IRI plus its opaque JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub iri: Iri,
    pub raw: Value,
}

impl Item {
    pub fn new(iri: Iri, raw: Value) -> Self {
        Self { iri, raw }
    }

    pub fn type_tag(&self) -> &str {
        self.raw.get("type").and_then(Value::as_str).unwrap_or("")
    }

    pub fn kind(&self) -> ObjectKind {
        classify(self.type_tag())
    }

    /// Structural string field, if present.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(Value::as_str)
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.field_str("published")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_published_now(&mut self, now: DateTime<Utc>) {
        self.raw["published"] = Value::String(now.to_rfc3339());
    }

    /// IRI-valued tags the read pipeline dereferences by replacing them
    /// with the loaded object (§4.7 load-item, step 3). Activities
    /// dereference `object`, intransitive activities dereference
    /// `target`, plain objects dereference any other IRI-valued field
    /// named here.
    pub const DEREFERENCEABLE_OBJECT_FIELDS: &'static [&'static str] =
        &["attributedTo", "inReplyTo", "tag", "context"];
}

/// Read-through/mutating view over an actor-like item.
pub trait AsActor {
    fn as_actor(&self) -> Option<ActorView<'_>>;
}

pub struct ActorView<'a>(&'a Item);

impl<'a> ActorView<'a> {
    pub fn preferred_username(&self) -> Option<&str> {
        self.0.field_str("preferredUsername")
    }
    pub fn name(&self) -> Option<&str> {
        self.0.field_str("name")
    }
    pub fn inbox(&self) -> Option<&str> {
        self.0.field_str("inbox")
    }
    pub fn outbox(&self) -> Option<&str> {
        self.0.field_str("outbox")
    }
}

impl AsActor for Item {
    fn as_actor(&self) -> Option<ActorView<'_>> {
        matches!(self.kind(), ObjectKind::Actor).then(|| ActorView(self))
    }
}

/// Read-through/mutating view over a (transitive) activity.
pub trait AsActivity {
    fn as_activity(&self) -> Option<ActivityView<'_>>;
}

pub struct ActivityView<'a>(&'a Item);

impl<'a> ActivityView<'a> {
    pub fn actor(&self) -> Option<&str> {
        self.0.field_str("actor")
    }
    pub fn object(&self) -> Option<&str> {
        self.0.field_str("object")
    }
}

impl AsActivity for Item {
    fn as_activity(&self) -> Option<ActivityView<'_>> {
        matches!(self.kind(), ObjectKind::Activity).then(|| ActivityView(self))
    }
}

/// Read-through/mutating view over an intransitive activity.
pub trait AsIntransitiveActivity {
    fn as_intransitive_activity(&self) -> Option<IntransitiveActivityView<'_>>;
}

pub struct IntransitiveActivityView<'a>(&'a Item);

impl<'a> IntransitiveActivityView<'a> {
    pub fn actor(&self) -> Option<&str> {
        self.0.field_str("actor")
    }
    pub fn target(&self) -> Option<&str> {
        self.0.field_str("target")
    }
}

impl AsIntransitiveActivity for Item {
    fn as_intransitive_activity(&self) -> Option<IntransitiveActivityView<'_>> {
        matches!(self.kind(), ObjectKind::IntransitiveActivity).then(|| IntransitiveActivityView(self))
    }
}

/// Read-through/mutating view over a plain object.
pub trait AsObject {
    fn as_object(&self) -> Option<ObjectView<'_>>;
}

pub struct ObjectView<'a>(&'a Item);

impl<'a> ObjectView<'a> {
    pub fn attributed_to(&self) -> Option<&str> {
        self.0.field_str("attributedTo")
    }
    pub fn content(&self) -> Option<&str> {
        self.0.field_str("content")
    }
    pub fn summary(&self) -> Option<&str> {
        self.0.field_str("summary")
    }
    pub fn recipients(&self) -> Vec<String> {
        let mut out = Vec::new();
        for field in ["to", "cc", "bto", "bcc", "audience"] {
            match self.0.raw.get(field) {
                Some(Value::String(s)) => out.push(s.clone()),
                Some(Value::Array(items)) => {
                    for v in items {
                        if let Value::String(s) = v {
                            out.push(s.clone());
                        }
                    }
                }
                _ => {}
            }
        }
        out
    }
}

impl AsObject for Item {
    fn as_object(&self) -> Option<ObjectView<'_>> {
        matches!(self.kind(), ObjectKind::Object | ObjectKind::Tombstone).then(|| ObjectView(self))
    }
}

/// Read-through/mutating view over a collection object (§3 "Collection").
pub trait AsCollection {
    fn as_collection(&self) -> Option<CollectionView<'_>>;
    fn as_collection_mut(&mut self) -> Option<CollectionViewMut<'_>>;
}

pub struct CollectionView<'a>(&'a Item);

impl<'a> CollectionView<'a> {
    pub fn total_items(&self) -> u64 {
        self.0.raw.get("totalItems").and_then(Value::as_u64).unwrap_or(0)
    }
    pub fn is_ordered(&self) -> bool {
        vocabulary::ORDERED_COLLECTION_TYPES.contains(&self.0.type_tag())
    }
}

pub struct CollectionViewMut<'a>(&'a mut Item);

impl<'a> CollectionViewMut<'a> {
    pub fn set_total_items(&mut self, n: u64) {
        self.0.raw["totalItems"] = Value::Number(n.into());
    }

    /// Collections are always paged by the read pipeline; any inline
    /// `items`/`orderedItems` is cleared on create/mutate (§4.5 step 3).
    pub fn clear_inline_items(&mut self) {
        if let Some(obj) = self.0.raw.as_object_mut() {
            obj.remove("items");
            obj.remove("orderedItems");
        }
    }
}

impl AsCollection for Item {
    fn as_collection(&self) -> Option<CollectionView<'_>> {
        matches!(self.kind(), ObjectKind::Collection).then(|| CollectionView(self))
    }
    fn as_collection_mut(&mut self) -> Option<CollectionViewMut<'_>> {
        if matches!(self.kind(), ObjectKind::Collection) {
            Some(CollectionViewMut(self))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(type_tag: &str, extra: Value) -> Item {
        let iri = Iri::parse("https://example.com/x").unwrap();
        let mut raw = json!({ "type": type_tag });
        if let (Some(obj), Some(extra_obj)) = (raw.as_object_mut(), extra.as_object()) {
            for (k, v) in extra_obj {
                obj.insert(k.clone(), v.clone());
            }
        }
        Item::new(iri, raw)
    }

    #[test]
    fn classifies_vocabulary() {
        assert_eq!(classify("Person"), ObjectKind::Actor);
        assert_eq!(classify("Create"), ObjectKind::Activity);
        assert_eq!(classify("Arrive"), ObjectKind::IntransitiveActivity);
        assert_eq!(classify("Note"), ObjectKind::Object);
        assert_eq!(classify("OrderedCollection"), ObjectKind::Collection);
        assert_eq!(classify("Tombstone"), ObjectKind::Tombstone);
        assert_eq!(classify("Nonsense"), ObjectKind::Unknown);
    }

    #[test]
    fn actor_view_reads_fields() {
        let it = item("Person", json!({ "preferredUsername": "jdoe" }));
        assert_eq!(it.as_actor().unwrap().preferred_username(), Some("jdoe"));
        assert!(it.as_activity().is_none());
    }

    #[test]
    fn collection_mut_sets_total_items_and_clears_inline() {
        let mut it = item("OrderedCollection", json!({ "items": [1, 2, 3] }));
        {
            let mut view = it.as_collection_mut().unwrap();
            view.set_total_items(3);
            view.clear_inline_items();
        }
        assert_eq!(it.as_collection().unwrap().total_items(), 3);
        assert!(it.raw.get("items").is_none());
    }

    #[test]
    fn recipients_collects_all_addressing_fields() {
        let it = item(
            "Note",
            json!({ "to": "https://example.com/a", "cc": ["https://example.com/b", "https://example.com/c"] }),
        );
        let recipients = it.as_object().unwrap().recipients();
        assert_eq!(recipients.len(), 3);
    }
}
