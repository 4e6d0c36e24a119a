//! The opaque filter-check interface consumed by the read pipeline
//! (§4.7, §9 "the store consumes an opaque check predicate interface").
//! The filter DSL compiler itself is out of scope; this module defines
//! the trait boundary plus a handful of concrete checks used by the
//! test suite and the CLI's smoke commands.

use crate::index::Attribute;
use crate::object::{AsActivity, AsIntransitiveActivity, AsObject, Item};

/// A single predicate evaluated against a decoded [`Item`].
///
/// A check optionally advertises an index hint: an attribute plus the
/// set of tokens that would satisfy it, allowing the bitmap index to
/// short-circuit a directory walk (§4.6 "probe"). A check with no hint
/// forces the read pipeline to treat the whole probe as index-
/// insufficient for that query.
pub trait Check: Send + Sync {
    fn matches(&self, item: &Item) -> bool;

    fn index_hint(&self) -> Option<(Attribute, Vec<String>)> {
        None
    }
}

/// `type = T`.
pub struct TypeIs(pub String);

impl Check for TypeIs {
    fn matches(&self, item: &Item) -> bool {
        item.type_tag() == self.0
    }

    fn index_hint(&self) -> Option<(Attribute, Vec<String>)> {
        Some((Attribute::Type, vec![self.0.clone()]))
    }
}

/// `attributedTo = iri`.
pub struct AttributedToIs(pub String);

impl Check for AttributedToIs {
    fn matches(&self, item: &Item) -> bool {
        item.as_object()
            .and_then(|v| v.attributed_to().map(str::to_string))
            .is_some_and(|a| a == self.0)
    }

    fn index_hint(&self) -> Option<(Attribute, Vec<String>)> {
        Some((Attribute::AttributedTo, vec![self.0.clone()]))
    }
}

/// `actor = iri` (activities and intransitive activities).
pub struct ActorIs(pub String);

impl Check for ActorIs {
    fn matches(&self, item: &Item) -> bool {
        item.as_activity().and_then(|v| v.actor().map(str::to_string)).is_some_and(|a| a == self.0)
            || item
                .as_intransitive_activity()
                .and_then(|v| v.actor().map(str::to_string))
                .is_some_and(|a| a == self.0)
    }

    fn index_hint(&self) -> Option<(Attribute, Vec<String>)> {
        Some((Attribute::Actor, vec![self.0.clone()]))
    }
}

/// Equality on an arbitrary structural string field, e.g. `actor.name`
/// when composed against a dereferenced item. No index hint: arbitrary
/// nested property equality is not covered by the enumerated attribute
/// set, so a probe carrying this check always walks (§9 "index
/// insufficiency").
pub struct PropertyEquals {
    pub field: String,
    pub value: String,
}

impl Check for PropertyEquals {
    fn matches(&self, item: &Item) -> bool {
        item.field_str(&self.field).is_some_and(|v| v == self.value)
    }
}

/// Any of `to`/`cc`/`bto`/`bcc`/`audience` contains `recipient`.
pub struct RecipientIncludes(pub String);

impl Check for RecipientIncludes {
    fn matches(&self, item: &Item) -> bool {
        item.as_object().is_some_and(|v| v.recipients().iter().any(|r| r == &self.0))
    }

    fn index_hint(&self) -> Option<(Attribute, Vec<String>)> {
        Some((Attribute::Recipients, vec![self.0.clone()]))
    }
}

/// Evaluate every check against `item`; all must match.
pub fn matches_all(checks: &[&dyn Check], item: &Item) -> bool {
    checks.iter().all(|c| c.matches(item))
}
