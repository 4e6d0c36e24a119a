//! A filesystem handle whose every operation is scoped below a fixed
//! directory (§4.1). Any input path is resolved lexically; a component
//! that would ascend above the root is rejected before any syscall runs.
//! All later store components consume the filesystem exclusively through
//! this handle — never through ad-hoc string-concatenated paths.

use std::path::{Component, Path, PathBuf};

use crate::error::{FsError, FsResult, WithPath};

/// A directory-scoped filesystem handle.
#[derive(Debug, Clone)]
pub struct RootedFs {
    root: Option<PathBuf>,
}

impl RootedFs {
    /// An unbound handle. Every method fails with [`FsError::NotOpen`]
    /// until [`RootedFs::bind`] succeeds.
    pub fn unbound() -> Self {
        Self { root: None }
    }

    /// Bind to `root`, creating it (and any parents) if absent.
    pub fn bind(root: impl Into<PathBuf>) -> FsResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).with_path(root.clone())?;
        Ok(Self { root: Some(root) })
    }

    pub fn root(&self) -> FsResult<&Path> {
        self.root.as_deref().ok_or(FsError::NotOpen)
    }

    /// Lexically resolve `rel` against the root, rejecting any path that
    /// would escape it. Does not touch the filesystem.
    fn resolve(&self, rel: &Path) -> FsResult<PathBuf> {
        let root = self.root()?;

        if rel.is_absolute() {
            return Err(FsError::PathEscape(rel.to_path_buf()));
        }

        let mut resolved = PathBuf::new();
        let mut depth: i64 = 0;
        for component in rel.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(FsError::PathEscape(rel.to_path_buf()));
                    }
                    resolved.pop();
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(FsError::PathEscape(rel.to_path_buf()));
                }
            }
        }

        Ok(root.join(resolved))
    }

    /// Resolve a path and verify a symlink found along the way, if any,
    /// does not point outside the root (§4.1: "targets leaving the root
    /// cause a not-in-root failure surfaced as not-found").
    pub fn resolve_checked(&self, rel: &Path) -> FsResult<PathBuf> {
        let absolute = self.resolve(rel)?;
        if let Ok(target) = std::fs::read_link(&absolute) {
            let joined = if target.is_absolute() {
                target
            } else {
                absolute.parent().unwrap_or(Path::new("")).join(&target)
            };
            if let Ok(canonical) = joined.canonicalize() {
                let root = self.root()?.canonicalize().unwrap_or_else(|_| self.root().unwrap().to_path_buf());
                if !canonical.starts_with(&root) {
                    return Err(FsError::NotFound(rel.to_path_buf()));
                }
            }
        }
        Ok(absolute)
    }

    pub fn exists(&self, rel: &Path) -> FsResult<bool> {
        let abs = self.resolve(rel)?;
        Ok(abs.exists())
    }

    pub fn mkdir_all(&self, rel: &Path) -> FsResult<()> {
        let abs = self.resolve(rel)?;
        std::fs::create_dir_all(&abs).with_path(abs)
    }

    pub fn read(&self, rel: &Path) -> FsResult<Vec<u8>> {
        let abs = self.resolve_checked(rel)?;
        std::fs::read(&abs).with_path(abs)
    }

    /// Atomically replace the content at `rel`: write to a sibling `.tmp`
    /// file then rename over the destination, so readers never observe a
    /// partially written `__raw` (grounded on the teacher's
    /// `IndexPersistence::save`).
    pub fn write_atomic(&self, rel: &Path, data: &[u8]) -> FsResult<()> {
        let abs = self.resolve(rel)?;
        if let Some(parent) = abs.parent() {
            std::fs::create_dir_all(parent).with_path(parent.to_path_buf())?;
        }
        let tmp = abs.with_extension("tmp");
        std::fs::write(&tmp, data).with_path(tmp.clone())?;
        std::fs::rename(&tmp, &abs).with_path(abs)
    }

    pub fn remove(&self, rel: &Path) -> FsResult<()> {
        let abs = self.resolve(rel)?;
        match std::fs::remove_file(&abs) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_path(abs),
        }
    }

    pub fn remove_all(&self, rel: &Path) -> FsResult<()> {
        let abs = self.resolve(rel)?;
        match std::fs::remove_dir_all(&abs) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_path(abs),
        }
    }

    pub fn readlink(&self, rel: &Path) -> FsResult<PathBuf> {
        let abs = self.resolve(rel)?;
        std::fs::read_link(&abs).with_path(abs)
    }

    /// Create a relative symlink at `rel` pointing to `target` (itself
    /// relative to `rel`'s parent directory, never crossing the root —
    /// §3 invariant 4).
    pub fn symlink(&self, rel: &Path, target: &Path) -> FsResult<()> {
        let abs = self.resolve(rel)?;
        if let Some(parent) = abs.parent() {
            std::fs::create_dir_all(parent).with_path(parent.to_path_buf())?;
        }
        #[cfg(unix)]
        std::os::unix::fs::symlink(target, &abs).with_path(abs)?;
        #[cfg(not(unix))]
        std::os::windows::fs::symlink_file(target, &abs).with_path(abs)?;
        Ok(())
    }

    pub fn is_symlink(&self, rel: &Path) -> FsResult<bool> {
        let abs = self.resolve(rel)?;
        Ok(abs.symlink_metadata().map(|m| m.file_type().is_symlink()).unwrap_or(false))
    }

    /// Non-recursive listing of `rel`'s immediate children, relative
    /// names only.
    pub fn read_dir(&self, rel: &Path) -> FsResult<Vec<PathBuf>> {
        let abs = self.resolve(rel)?;
        let entries = match std::fs::read_dir(&abs) {
            Ok(it) => it,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_path(abs),
        };
        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.with_path(rel.to_path_buf())?;
            out.push(rel.join(entry.file_name()));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn rejects_parent_escape() {
        let dir = TempDir::new().unwrap();
        let fs = RootedFs::bind(dir.path()).unwrap();
        let err = fs.read(Path::new("../../etc/passwd")).unwrap_err();
        assert!(matches!(err, FsError::PathEscape(_)));
    }

    #[test]
    fn rejects_absolute_path() {
        let dir = TempDir::new().unwrap();
        let fs = RootedFs::bind(dir.path()).unwrap();
        let err = fs.read(Path::new("/etc/passwd")).unwrap_err();
        assert!(matches!(err, FsError::PathEscape(_)));
    }

    #[test]
    fn unbound_fails() {
        let fs = RootedFs::unbound();
        assert!(matches!(fs.root(), Err(FsError::NotOpen)));
    }

    #[test]
    fn write_then_read_atomic() {
        let dir = TempDir::new().unwrap();
        let fs = RootedFs::bind(dir.path()).unwrap();
        fs.write_atomic(Path::new("a/b/__raw"), b"hello").unwrap();
        assert_eq!(fs.read(Path::new("a/b/__raw")).unwrap(), b"hello");
    }

    #[test]
    fn symlink_escaping_root_is_not_found() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let fs = RootedFs::bind(dir.path()).unwrap();
        fs.mkdir_all(Path::new("col")).unwrap();
        fs.symlink(Path::new("col/evil"), outside.path()).unwrap();
        let err = fs.resolve_checked(Path::new("col/evil")).unwrap_err();
        assert!(matches!(err, FsError::NotFound(_)));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let fs = RootedFs::bind(dir.path()).unwrap();
        fs.remove(Path::new("nope")).unwrap();
        fs.remove_all(Path::new("nope-dir")).unwrap();
    }
}
