//! OAuth2 storage substore (§4.9). A second rooted handle under
//! `oauth/` with four buckets (`clients`, `authorize`, `access`,
//! `refresh`), each record binary-codec-encoded at
//! `{bucket}/{id}/__raw`. The RFC 6749 protocol flow itself is out of
//! scope — only persistence of the records it produces.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::BinCodec;
use crate::error::{OAuthError, OAuthResult};
use crate::fs::RootedFs;
use crate::iri::RAW_FILE;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientRecord {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizationRecord {
    pub code: String,
    pub client_id: String,
    pub user_iri: String,
    #[serde(default)]
    pub scope: String,
    pub created_at: DateTime<Utc>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessRecord {
    pub token: String,
    pub client_id: String,
    pub user_iri: String,
    #[serde(default)]
    pub scope: String,
    pub created_at: DateTime<Utc>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshRecord {
    pub token: String,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_in: i64,
}

trait Expiring {
    fn created_at(&self) -> DateTime<Utc>;
    fn expires_in(&self) -> i64;

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.created_at() + chrono::Duration::seconds(self.expires_in()) < now
    }
}

impl Expiring for AuthorizationRecord {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn expires_in(&self) -> i64 {
        self.expires_in
    }
}

impl Expiring for AccessRecord {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn expires_in(&self) -> i64 {
        self.expires_in
    }
}

#[derive(Debug, Clone, Copy)]
enum Bucket {
    Clients,
    Authorize,
    Access,
    Refresh,
}

impl Bucket {
    fn dir(self) -> &'static str {
        match self {
            Bucket::Clients => "clients",
            Bucket::Authorize => "authorize",
            Bucket::Access => "access",
            Bucket::Refresh => "refresh",
        }
    }
}

/// The OAuth substore: a `RootedFs` bound to `{store-root}/oauth`.
pub struct OAuthStore {
    fs: RootedFs,
}

impl OAuthStore {
    pub fn open(oauth_root: PathBuf) -> OAuthResult<Self> {
        Ok(Self { fs: RootedFs::bind(oauth_root)? })
    }

    fn record_path(bucket: Bucket, id: &str) -> PathBuf {
        Path::new(bucket.dir()).join(id).join(RAW_FILE)
    }

    fn put<T: Serialize>(&self, bucket: Bucket, id: &str, record: &T) -> OAuthResult<()> {
        let bytes = BinCodec::encode(record)?;
        self.fs.write_atomic(&Self::record_path(bucket, id), &bytes)?;
        Ok(())
    }

    fn get<T: for<'de> Deserialize<'de>>(&self, bucket: Bucket, id: &str) -> OAuthResult<T> {
        let path = Self::record_path(bucket, id);
        if !self.fs.exists(&path)? {
            return Err(OAuthError::NotFound(id.to_string()));
        }
        let bytes = self.fs.read(&path)?;
        Ok(BinCodec::decode(&bytes)?)
    }

    fn remove(&self, bucket: Bucket, id: &str) -> OAuthResult<()> {
        self.fs.remove_all(Path::new(bucket.dir()).join(id).as_path())?;
        Ok(())
    }

    fn list(&self, bucket: Bucket) -> OAuthResult<Vec<String>> {
        let entries = self.fs.read_dir(Path::new(bucket.dir()))?;
        Ok(entries
            .into_iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect())
    }

    pub fn put_client(&self, record: &ClientRecord) -> OAuthResult<()> {
        self.put(Bucket::Clients, &record.client_id, record)
    }
    pub fn get_client(&self, client_id: &str) -> OAuthResult<ClientRecord> {
        self.get(Bucket::Clients, client_id)
    }
    pub fn remove_client(&self, client_id: &str) -> OAuthResult<()> {
        self.remove(Bucket::Clients, client_id)
    }
    pub fn list_clients(&self) -> OAuthResult<Vec<String>> {
        self.list(Bucket::Clients)
    }

    pub fn put_authorization(&self, record: &AuthorizationRecord) -> OAuthResult<()> {
        self.put(Bucket::Authorize, &record.code, record)
    }
    pub fn get_authorization(&self, code: &str) -> OAuthResult<AuthorizationRecord> {
        self.get_unexpired(Bucket::Authorize, code)
    }
    pub fn remove_authorization(&self, code: &str) -> OAuthResult<()> {
        self.remove(Bucket::Authorize, code)
    }

    pub fn put_access(&self, record: &AccessRecord) -> OAuthResult<()> {
        self.put(Bucket::Access, &record.token, record)
    }
    pub fn get_access(&self, token: &str) -> OAuthResult<AccessRecord> {
        self.get_unexpired(Bucket::Access, token)
    }
    pub fn remove_access(&self, token: &str) -> OAuthResult<()> {
        self.remove(Bucket::Access, token)
    }

    pub fn put_refresh(&self, record: &RefreshRecord) -> OAuthResult<()> {
        self.put(Bucket::Refresh, &record.token, record)
    }
    pub fn remove_refresh(&self, token: &str) -> OAuthResult<()> {
        self.remove(Bucket::Refresh, token)
    }

    /// Following a refresh entails loading its access record
    /// transitively (§4.9).
    pub fn get_access_via_refresh(&self, refresh_token: &str) -> OAuthResult<AccessRecord> {
        let refresh: RefreshRecord = self.get(Bucket::Refresh, refresh_token)?;
        self.get_access(&refresh.access_token)
    }

    fn get_unexpired<T>(&self, bucket: Bucket, id: &str) -> OAuthResult<T>
    where
        T: for<'de> Deserialize<'de> + Expiring,
    {
        let record: T = self.get(bucket, id)?;
        if record.is_expired(Utc::now()) {
            return Err(OAuthError::Expired(id.to_string()));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, OAuthStore) {
        let dir = TempDir::new().unwrap();
        let store = OAuthStore::open(dir.path().join("oauth")).unwrap();
        (dir, store)
    }

    #[test]
    fn client_roundtrip() {
        let (_dir, store) = store();
        let client = ClientRecord {
            client_id: "abc".to_string(),
            client_secret: "shh".to_string(),
            redirect_uris: vec!["https://example.com/cb".to_string()],
        };
        store.put_client(&client).unwrap();
        assert_eq!(store.get_client("abc").unwrap(), client);
        assert_eq!(store.list_clients().unwrap(), vec!["abc".to_string()]);
        store.remove_client("abc").unwrap();
        assert!(matches!(store.get_client("abc"), Err(OAuthError::NotFound(_))));
    }

    #[test]
    fn expired_access_is_not_found() {
        let (_dir, store) = store();
        let access = AccessRecord {
            token: "tok".to_string(),
            client_id: "abc".to_string(),
            user_iri: "https://example.com/~jdoe".to_string(),
            scope: "read".to_string(),
            created_at: Utc::now() - chrono::Duration::seconds(120),
            expires_in: 60,
        };
        store.put_access(&access).unwrap();
        assert!(matches!(store.get_access("tok"), Err(OAuthError::Expired(_))));
    }

    #[test]
    fn refresh_loads_access_transitively() {
        let (_dir, store) = store();
        let access = AccessRecord {
            token: "tok".to_string(),
            client_id: "abc".to_string(),
            user_iri: "https://example.com/~jdoe".to_string(),
            scope: "read".to_string(),
            created_at: Utc::now(),
            expires_in: 3600,
        };
        store.put_access(&access).unwrap();
        let refresh = RefreshRecord {
            token: "ref".to_string(),
            access_token: "tok".to_string(),
            created_at: Utc::now(),
            expires_in: 3600,
        };
        store.put_refresh(&refresh).unwrap();

        assert_eq!(store.get_access_via_refresh("ref").unwrap(), access);
    }
}
