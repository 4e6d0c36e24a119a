//! The `Store` façade (§6): a cheap-to-clone, `Send + Sync` handle
//! wrapping the rooted filesystem, bitmap index, cache, and OAuth
//! substore behind `Arc`. No async runtime — all calls are synchronous
//! and blocking (§5).

pub mod collection_store;
pub mod object_store;
pub mod read;

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use walkdir::WalkDir;

use crate::cache::{new_cache, Cache};
use crate::codec::JsonCodec;
use crate::config::Config;
use crate::error::{FsError, StoreError, StoreResult};
use crate::filter::Check;
use crate::fs::RootedFs;
use crate::index::{load_index_set, persist_index_set, CollectionIndex, IndexSet};
use crate::iri::{path_to_iri, Iri, RAW_FILE};
use crate::metadata::{self, MetadataRecord, PublicKey};
use crate::object::{AsActor, Item, ObjectKind};
use crate::oauth::{AccessRecord, AuthorizationRecord, ClientRecord, OAuthStore, RefreshRecord};

/// Shared state behind `Store`'s `Arc`.
pub(crate) struct Inner {
    fs: RootedFs,
    config: Config,
    index: RwLock<IndexSet>,
    cache: Box<dyn Cache>,
    oauth: OAuthStore,
}

impl Inner {
    fn open(config: Config) -> StoreResult<Self> {
        let fs = RootedFs::bind(&config.path)?;
        let index = if config.use_index { load_index_set(&fs)? } else { IndexSet::new() };
        let cache = new_cache(config.cache_enabled);
        let oauth = OAuthStore::open(config.oauth_root())?;

        Ok(Self { fs, config, index: RwLock::new(index), cache, oauth })
    }

    /// Persist the index set, logging (not propagating) a failure — the
    /// index is a derived structure `reindex` can always rebuild, so an
    /// I/O hiccup here must not fail the object mutation it followed
    /// (§4.6 "Failure semantics").
    fn persist_index_best_effort(&self) {
        if !self.config.use_index {
            return;
        }
        let index = self.index.read();
        if let Err(err) = persist_index_set(&self.fs, &index) {
            tracing::warn!(%err, "failed to persist bitmap index");
        }
    }
}

/// The public store handle. Clones are aliases of the same underlying
/// store (§6 "clone").
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    /// Open (or create) a store rooted at `config.path` (§6 "open").
    pub fn open(config: Config) -> StoreResult<Self> {
        crate::logging::init_with_config(&config.logging);
        Ok(Self { inner: Arc::new(Inner::open(config)?) })
    }

    /// Release the handle. The next `open` is a full reinitialization;
    /// any other `Store` clones sharing this `Arc` keep working until
    /// their own last reference drops (§6 "close").
    pub fn close(self) -> StoreResult<()> {
        self.inner.persist_index_best_effort();
        Ok(())
    }

    /// Create the store root directory without opening a handle (§6
    /// "bootstrap") — usable before any `Config` is fully wired up.
    pub fn bootstrap(config: &Config) -> StoreResult<()> {
        RootedFs::bind(&config.path)?;
        Ok(())
    }

    /// Remove the store root directory entirely (§6 "clean").
    pub fn clean(config: &Config) -> StoreResult<()> {
        match std::fs::remove_dir_all(&config.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::from(FsError::Io { path: config.path.clone(), source: e })),
        }
    }

    /// Load an object or collection, applying `checks` (§6 "load", §4.7).
    pub fn load(&self, iri: &Iri, checks: &[&dyn Check]) -> StoreResult<Item> {
        read::load(&self.inner, iri, checks)
    }

    /// Persist `item` (§6 "save", §4.4 "put").
    pub fn save(&self, item: Item) -> StoreResult<Item> {
        object_store::put(&self.inner, item)
    }

    /// Remove an object's directory entirely (§6 "delete", §4.4).
    pub fn delete(&self, item: &Item) -> StoreResult<()> {
        object_store::delete(&self.inner, &item.iri)
    }

    /// Create a new, empty collection (§6 "create", §4.5).
    pub fn create(&self, collection: Item) -> StoreResult<Item> {
        collection_store::create(&self.inner, collection)
    }

    /// Add members to a collection, creating it first if it is a hidden
    /// reserved collection (§6 "add_to", §4.5).
    pub fn add_to(&self, collection: &Iri, members: &[Iri]) -> StoreResult<()> {
        collection_store::add_to(&self.inner, collection, members)
    }

    /// Remove members from a collection (§6 "remove_from", §4.5).
    pub fn remove_from(&self, collection: &Iri, members: &[Iri]) -> StoreResult<()> {
        collection_store::remove_from(&self.inner, collection, members)
    }

    /// Drop every cached item and rebuild an empty index, forcing the
    /// next reads to go through the filesystem until `reindex` or
    /// organic `put` traffic repopulates it (§6 "reset").
    pub fn reset(&self) -> StoreResult<()> {
        self.inner.cache.clear();
        {
            let mut index = self.inner.index.write();
            index.clear();
        }
        self.inner.persist_index_best_effort();
        Ok(())
    }

    /// Rebuild the bitmap index (and every collection's membership
    /// bitmap) from on-disk truth by walking the tree, skipping the
    /// OAuth substore and `.index/` directories (§6 "reindex", §4.6).
    pub fn reindex(&self) -> StoreResult<()> {
        let root = self.inner.fs.root()?.to_path_buf();
        let mut new_index = IndexSet::new();
        let mut collection_dirs: Vec<PathBuf> = Vec::new();

        for entry in WalkDir::new(&root).into_iter().filter_map(Result::ok) {
            if entry.file_name() != RAW_FILE {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&root) else { continue };
            if rel.starts_with("oauth") {
                continue;
            }
            let Some(obj_rel) = rel.parent().map(std::path::Path::to_path_buf) else { continue };
            let Ok(bytes) = std::fs::read(entry.path()) else { continue };
            let Ok(raw) = JsonCodec::decode::<serde_json::Value>(&bytes) else { continue };
            let Some(iri) = path_to_iri(&obj_rel) else { continue };

            let item = Item::new(iri, raw);
            new_index.add(&item, &obj_rel, self.inner.config.indexing.bitmap_token_limit);
            if item.kind() == ObjectKind::Collection {
                collection_dirs.push(obj_rel);
            }
        }

        for col_rel in &collection_dirs {
            let mut members = CollectionIndex::new();
            for (object_ref, _path) in read::walk_collection(&self.inner, col_rel)? {
                members.add(object_ref);
            }
            members.persist(&self.inner.fs, col_rel)?;
        }

        persist_index_set(&self.inner.fs, &new_index)?;
        *self.inner.index.write() = new_index;

        Ok(())
    }

    /// Set an actor's password (restricted to actor-typed items, §4.10).
    pub fn password_set(&self, item: &Item, password: &str) -> StoreResult<()> {
        self.require_actor(item)?;
        metadata::password_set(&self.inner.fs, &item.iri, password, self.inner.config.metadata.bcrypt_cost)
    }

    /// Verify an actor's password (§4.10).
    pub fn password_check(&self, item: &Item, password: &str) -> StoreResult<()> {
        self.require_actor(item)?;
        metadata::password_check(&self.inner.fs, &item.iri, password)
    }

    /// Load an actor's metadata record (§4.10).
    pub fn load_metadata(&self, item: &Item) -> StoreResult<MetadataRecord> {
        self.require_actor(item)?;
        metadata::load_metadata(&self.inner.fs, &item.iri)
    }

    /// Overwrite an actor's metadata record wholesale (§4.10).
    pub fn save_metadata(&self, item: &Item, record: &MetadataRecord) -> StoreResult<()> {
        self.require_actor(item)?;
        metadata::save_metadata(&self.inner.fs, &item.iri, record)
    }

    /// Generate and store a fresh RSA keypair, returning the derived
    /// public key (§4.10).
    pub fn gen_key(&self, item: &Item) -> StoreResult<PublicKey> {
        self.require_actor(item)?;
        metadata::gen_key(&self.inner.fs, &item.iri, self.inner.config.metadata.rsa_key_bits)
    }

    /// Store a PEM-encoded private key directly (§4.10).
    pub fn save_key(&self, item: &Item, private_key_pem: &str) -> StoreResult<()> {
        self.require_actor(item)?;
        metadata::save_key(&self.inner.fs, &item.iri, private_key_pem)
    }

    /// Load the stored PEM-encoded private key (§4.10).
    pub fn load_key(&self, item: &Item) -> StoreResult<String> {
        self.require_actor(item)?;
        metadata::load_key(&self.inner.fs, &item.iri)
    }

    fn require_actor(&self, item: &Item) -> StoreResult<()> {
        if item.as_actor().is_none() {
            return Err(StoreError::InvalidInput(format!(
                "key/password operations require an actor-typed item, got {:?}",
                item.kind()
            )));
        }
        Ok(())
    }

    // OAuth passthrough (§4.9, §6).

    pub fn put_client(&self, record: &ClientRecord) -> StoreResult<()> {
        Ok(self.inner.oauth.put_client(record)?)
    }
    pub fn get_client(&self, client_id: &str) -> StoreResult<ClientRecord> {
        Ok(self.inner.oauth.get_client(client_id)?)
    }
    pub fn remove_client(&self, client_id: &str) -> StoreResult<()> {
        Ok(self.inner.oauth.remove_client(client_id)?)
    }
    pub fn list_clients(&self) -> StoreResult<Vec<String>> {
        Ok(self.inner.oauth.list_clients()?)
    }

    pub fn put_authorization(&self, record: &AuthorizationRecord) -> StoreResult<()> {
        Ok(self.inner.oauth.put_authorization(record)?)
    }
    pub fn get_authorization(&self, code: &str) -> StoreResult<AuthorizationRecord> {
        Ok(self.inner.oauth.get_authorization(code)?)
    }
    pub fn remove_authorization(&self, code: &str) -> StoreResult<()> {
        Ok(self.inner.oauth.remove_authorization(code)?)
    }

    pub fn put_access(&self, record: &AccessRecord) -> StoreResult<()> {
        Ok(self.inner.oauth.put_access(record)?)
    }
    pub fn get_access(&self, token: &str) -> StoreResult<AccessRecord> {
        Ok(self.inner.oauth.get_access(token)?)
    }
    pub fn remove_access(&self, token: &str) -> StoreResult<()> {
        Ok(self.inner.oauth.remove_access(token)?)
    }

    pub fn put_refresh(&self, record: &RefreshRecord) -> StoreResult<()> {
        Ok(self.inner.oauth.put_refresh(record)?)
    }
    pub fn remove_refresh(&self, token: &str) -> StoreResult<()> {
        Ok(self.inner.oauth.remove_refresh(token)?)
    }
    pub fn get_access_via_refresh(&self, refresh_token: &str) -> StoreResult<AccessRecord> {
        Ok(self.inner.oauth.get_access_via_refresh(refresh_token)?)
    }
}
