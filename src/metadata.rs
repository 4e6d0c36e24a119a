//! Actor metadata: password hash and PKCS#8 PEM private key, stored as
//! JSON at `{iri-path}/__meta_data` (§4.10). The actor-typed restriction
//! on key operations is enforced by `Store`; this module is agnostic of
//! vocabulary classification.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::codec::JsonCodec;
use crate::error::{StoreError, StoreResult};
use crate::fs::RootedFs;
use crate::iri::{iri_to_path, Iri, META_FILE};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataRecord {
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub private_key_pem: Option<String>,
}

/// A derived public key, identified per §4.10 as `{iri}#main`.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicKey {
    pub id: String,
    pub pem: String,
}

fn metadata_path(iri: &Iri) -> std::path::PathBuf {
    iri_to_path(iri).join(META_FILE)
}

pub fn load_metadata(fs: &RootedFs, iri: &Iri) -> StoreResult<MetadataRecord> {
    let path = metadata_path(iri);
    if !fs.exists(&path)? {
        return Err(StoreError::not_found(iri));
    }
    let bytes = fs.read(&path)?;
    Ok(JsonCodec::decode(&bytes)?)
}

fn load_metadata_or_default(fs: &RootedFs, iri: &Iri) -> StoreResult<MetadataRecord> {
    let path = metadata_path(iri);
    if !fs.exists(&path)? {
        return Ok(MetadataRecord::default());
    }
    let bytes = fs.read(&path)?;
    Ok(JsonCodec::decode(&bytes)?)
}

pub fn save_metadata(fs: &RootedFs, iri: &Iri, record: &MetadataRecord) -> StoreResult<()> {
    let bytes = JsonCodec::encode(record)?;
    fs.write_atomic(&metadata_path(iri), &bytes)?;
    Ok(())
}

pub fn password_set(fs: &RootedFs, iri: &Iri, password: &str, cost: u32) -> StoreResult<()> {
    if password.is_empty() {
        return Err(StoreError::InvalidInput("password must not be empty".to_string()));
    }
    let mut record = load_metadata_or_default(fs, iri)?;
    let hash = bcrypt::hash(password, cost)
        .map_err(|e| StoreError::Internal(format!("bcrypt hash failed: {e}")))?;
    record.password_hash = Some(hash);
    save_metadata(fs, iri, &record)
}

pub fn password_check(fs: &RootedFs, iri: &Iri, password: &str) -> StoreResult<()> {
    let record = load_metadata(fs, iri)?;
    let hash = record
        .password_hash
        .ok_or_else(|| StoreError::NotFound(format!("no password set for {iri}")))?;
    let ok = bcrypt::verify(password, &hash).map_err(|e| StoreError::Internal(format!("bcrypt verify failed: {e}")))?;
    if ok {
        Ok(())
    } else {
        Err(StoreError::Forbidden(format!("password mismatch for {iri}")))
    }
}

/// Generate a new RSA keypair for `iri` using a cryptographically
/// strong RNG (`rand::rngs::OsRng`) — never a fixed seed, per the
/// resolved Open Question. Stores the PKCS#8 PEM private key in the
/// actor's metadata and returns the derived public key.
pub fn gen_key(fs: &RootedFs, iri: &Iri, rsa_bits: usize) -> StoreResult<PublicKey> {
    let private_key = RsaPrivateKey::new(&mut OsRng, rsa_bits)
        .map_err(|e| StoreError::Internal(format!("RSA key generation failed: {e}")))?;
    let pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| StoreError::Internal(format!("PKCS#8 encoding failed: {e}")))?
        .to_string();
    save_key(fs, iri, &pem)?;
    public_key_of(iri, &pem)
}

pub fn save_key(fs: &RootedFs, iri: &Iri, private_key_pem: &str) -> StoreResult<()> {
    let mut record = load_metadata_or_default(fs, iri)?;
    record.private_key_pem = Some(private_key_pem.to_string());
    save_metadata(fs, iri, &record)
}

pub fn load_key(fs: &RootedFs, iri: &Iri) -> StoreResult<String> {
    let record = load_metadata(fs, iri)?;
    record
        .private_key_pem
        .ok_or_else(|| StoreError::NotFound(format!("no private key stored for {iri}")))
}

fn public_key_of(iri: &Iri, private_key_pem: &str) -> StoreResult<PublicKey> {
    let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
        .map_err(|e| StoreError::Internal(format!("PKCS#8 decoding failed: {e}")))?;
    let public_key = RsaPublicKey::from(&private_key);
    let pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| StoreError::Internal(format!("SPKI encoding failed: {e}")))?;
    Ok(PublicKey { id: format!("{iri}#main"), pem })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fs() -> (TempDir, RootedFs) {
        let dir = TempDir::new().unwrap();
        let fs = RootedFs::bind(dir.path()).unwrap();
        (dir, fs)
    }

    #[test]
    fn password_set_check_and_mismatch() {
        let (_dir, fs) = fs();
        let iri = Iri::parse("https://example.com/~jdoe").unwrap();

        assert!(matches!(load_metadata(&fs, &iri), Err(StoreError::NotFound(_))));

        password_set(&fs, &iri, "dsa", 4).unwrap();
        password_check(&fs, &iri, "dsa").unwrap();
        assert!(matches!(password_check(&fs, &iri, "asd"), Err(StoreError::Forbidden(_))));
    }

    #[test]
    fn empty_password_is_invalid_input() {
        let (_dir, fs) = fs();
        let iri = Iri::parse("https://example.com/~jdoe").unwrap();
        assert!(matches!(password_set(&fs, &iri, "", 4), Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn gen_key_roundtrips_through_metadata() {
        let (_dir, fs) = fs();
        let iri = Iri::parse("https://example.com/~jdoe").unwrap();
        let public = gen_key(&fs, &iri, 1024).unwrap();
        assert_eq!(public.id, "https://example.com/~jdoe#main");
        assert!(public.pem.contains("PUBLIC KEY"));

        let private_pem = load_key(&fs, &iri).unwrap();
        assert!(private_pem.contains("PRIVATE KEY"));
    }
}
