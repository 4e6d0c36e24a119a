//! IRI canonicalization and the IRI↔path bijection (§4.3).

use std::path::{Path, PathBuf};

/// Reserved filenames inside any object directory (§4.3). These MUST NOT
/// be used as collection segment names when authoring IRIs.
pub const RAW_FILE: &str = "__raw";
pub const META_FILE: &str = "__meta_data";
pub const INDEX_DIR: &str = ".index";

/// Well-known collection path components that may be implied (and, for
/// the "hidden" subset, auto-created) members.
pub const RESERVED_COLLECTIONS: &[&str] = &[
    "inbox", "outbox", "followers", "following", "liked", "likes", "shares",
    "replies", "blocked", "ignored", "actors", "activities", "objects",
];

/// Collections that may be created implicitly on first `add_to` (§4.5).
pub const HIDDEN_COLLECTIONS: &[&str] = &["blocked", "ignored"];

pub fn is_reserved_name(name: &str) -> bool {
    name == RAW_FILE
        || name == META_FILE
        || name == INDEX_DIR
        || RESERVED_COLLECTIONS.contains(&name)
}

/// A canonicalized absolute IRI: the store's primary key.
///
/// Canonicalization lower-cases scheme and host, strips the query
/// component, and retains path and fragment (§3 "IRI").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Iri(String);

impl Iri {
    /// Parse and canonicalize a raw IRI string.
    pub fn parse(raw: &str) -> Result<Self, IriError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IriError::Empty);
        }

        let (scheme, rest) = raw.split_once("://").ok_or(IriError::NotAbsolute)?;
        if scheme.is_empty() {
            return Err(IriError::NotAbsolute);
        }

        // Split off fragment first, then query, then host/path.
        let (rest, fragment) = match rest.split_once('#') {
            Some((r, f)) => (r, Some(f)),
            None => (rest, None),
        };
        let rest = match rest.split_once('?') {
            Some((r, _query)) => r,
            None => rest,
        };

        let (host, path) = match rest.split_once('/') {
            Some((h, p)) => (h, format!("/{p}")),
            None => (rest, String::new()),
        };

        let mut canonical = format!("{}://{}{}", scheme.to_lowercase(), host.to_lowercase(), path);
        if let Some(frag) = fragment {
            canonical.push('#');
            canonical.push_str(frag);
        }

        Ok(Iri(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `self` is lexically contained in `other` (i.e.
    /// `other` is a strict prefix of `self` at a `/` boundary) — used by
    /// the collection store to decide nested-directory vs. symlink
    /// membership (§4.5).
    pub fn is_contained_in(&self, other: &Iri) -> bool {
        let parent = other.as_str();
        let child = self.as_str();
        child.len() > parent.len()
            && child.starts_with(parent)
            && (parent.ends_with('/') || child.as_bytes()[parent.len()] == b'/')
    }

    /// Strip a trailing reserved-collection path segment, returning the
    /// owner IRI (the prefix before the collection suffix), per §4.5's
    /// "attributed to the owner" rule.
    pub fn owner_of_collection(&self) -> Option<Iri> {
        let s = self.as_str();
        let last_segment = s.rsplit('/').next()?;
        if RESERVED_COLLECTIONS.contains(&last_segment) {
            let owner = s.strip_suffix(&format!("/{last_segment}"))?;
            Iri::parse(owner).ok()
        } else {
            None
        }
    }

    /// Terminal path/fragment component, used to detect reserved
    /// collection names for the read-pipeline dispatch (§4.7).
    pub fn terminal_component(&self) -> &str {
        let s = self.as_str();
        let after_frag = s.rsplit('#').next().unwrap_or(s);
        after_frag.rsplit('/').next().unwrap_or(after_frag)
    }
}

impl std::fmt::Display for Iri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IriError {
    #[error("empty IRI")]
    Empty,
    #[error("IRI is not absolute (missing scheme://)")]
    NotAbsolute,
}

/// `iri_to_path(iri)`: `{host}/{path components}[/{fragment}]` (§4.3).
///
/// Empty host yields an empty path; a single-slash path yields only the
/// host component.
pub fn iri_to_path(iri: &Iri) -> PathBuf {
    let s = iri.as_str();
    let after_scheme = s.split_once("://").map(|(_, r)| r).unwrap_or(s);

    let (rest, fragment) = match after_scheme.split_once('#') {
        Some((r, f)) => (r, Some(f)),
        None => (after_scheme, None),
    };

    let (host, path) = match rest.split_once('/') {
        Some((h, p)) => (h, p),
        None => (rest, ""),
    };

    let mut buf = PathBuf::new();
    if host.is_empty() {
        return buf;
    }
    buf.push(host);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        buf.push(segment);
    }
    if let Some(frag) = fragment {
        let frag = frag.trim_start_matches('#');
        if !frag.is_empty() {
            buf.push(frag);
        }
    }
    buf
}

/// `path_to_iri(rel)`: reconstructs `https://{first}/{rest}`, used to heal
/// stored symlinks that point outside the tree (§4.3).
pub fn path_to_iri(rel: &Path) -> Option<Iri> {
    let mut components = rel.components();
    let host = components.next()?.as_os_str().to_str()?;
    let rest: Vec<&str> = components
        .map(|c| c.as_os_str().to_str().unwrap_or(""))
        .collect();

    let raw = if rest.is_empty() {
        format!("https://{host}")
    } else {
        format!("https://{host}/{}", rest.join("/"))
    };
    Iri::parse(&raw).ok()
}
