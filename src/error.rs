//! Error types for the object store.
//!
//! Structured, subsystem-scoped errors using `thiserror`, unified at the
//! `Store` boundary into [`StoreError`] so callers match on one enum while
//! each subsystem keeps its own narrow error type internally.

use std::path::PathBuf;
use thiserror::Error;

use crate::iri::Iri;

/// Errors from the rooted filesystem handle (§4.1).
#[derive(Error, Debug)]
pub enum FsError {
    #[error("filesystem handle used before open()")]
    NotOpen,

    #[error("path '{0}' escapes the store root")]
    PathEscape(PathBuf),

    #[error("path '{0}' not found")]
    NotFound(PathBuf),

    #[error("path '{0}' already exists")]
    Exists(PathBuf),

    #[error("permission denied for '{0}'")]
    PermissionDenied(PathBuf),

    #[error("io error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the codec layer (§4.2).
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to encode: {0}")]
    Encode(String),

    #[error("failed to decode: {0}")]
    Decode(String),
}

/// Errors from the bitmap index (§4.6).
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("index probe cannot evaluate this filter")]
    Insufficient,

    #[error("index persistence error: {0}")]
    Persist(#[from] CodecError),

    #[error("index io error: {0}")]
    Fs(#[from] FsError),
}

/// Errors from the OAuth substore (§4.9).
#[derive(Error, Debug)]
pub enum OAuthError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("record expired: {0}")]
    Expired(String),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// The unified error surface of the `Store` contract (§7).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store not open")]
    NotOpen,

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(iri: &Iri) -> Self {
        StoreError::NotFound(iri.as_str().to_string())
    }
}

/// Expired OAuth records surface as `NotFound` rather than a distinct
/// variant, preserving a uniform read surface across the `Store`
/// boundary (§4.9, §7 "Expired tokens are surfaced as NotFound").
impl From<OAuthError> for StoreError {
    fn from(err: OAuthError) -> Self {
        match err {
            OAuthError::NotFound(id) | OAuthError::Expired(id) => StoreError::NotFound(id),
            OAuthError::Fs(e) => StoreError::Fs(e),
            OAuthError::Codec(e) => StoreError::Codec(e),
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;
pub type CodecResult<T> = Result<T, CodecError>;
pub type IndexResult<T> = Result<T, IndexError>;
pub type OAuthResult<T> = Result<T, OAuthError>;
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience trait for attaching a path to an I/O error as it crosses
/// into [`FsError`].
pub trait WithPath<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> FsResult<T>;
}

impl<T> WithPath<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> FsResult<T> {
        self.map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path.into()),
            std::io::ErrorKind::AlreadyExists => FsError::Exists(path.into()),
            std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied(path.into()),
            _ => FsError::Io {
                path: path.into(),
                source,
            },
        })
    }
}
