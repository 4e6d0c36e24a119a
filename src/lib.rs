//! `storage-fs`: a filesystem-backed object/collection store for a
//! federated ActivityPub service. See `README.md` for the on-disk
//! layout and `Store` for the public contract.

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod fs;
pub mod index;
pub mod iri;
pub mod logging;
pub mod metadata;
pub mod object;
pub mod oauth;
pub mod refs;
pub mod store;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use filter::Check;
pub use iri::Iri;
pub use object::{Item, ObjectKind};
pub use refs::ObjectRef;
pub use store::Store;
