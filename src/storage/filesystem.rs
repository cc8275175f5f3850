//! Filesystem object store
//!
//! Each key maps to a file at `root/key`. The content type is not kept;
//! every object this crate writes is JSON.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{validate_key, ObjectStore};
use crate::error::{Error, Result};

/// Directory-backed object store
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (and create if needed) a store rooted at `root`
    pub async fn new(root: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            Error::StoreUnavailable(format!("create store root {}: {}", root.display(), e))
        })?;
        Ok(FsObjectStore { root })
    }

    /// Store root
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    /// Key for a file below the root, always with '/' separators
    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn id(&self) -> &str {
        "filesystem"
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::StoreUnavailable(format!("create dir for {}: {}", key, e)))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .map_err(|e| Error::StoreUnavailable(format!("write {}: {}", key, e)))?;

        debug!(key, content_type, bytes = body.len(), "Stored object");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        // Start the walk from the deepest directory named by the prefix.
        let dir_part = match prefix.rfind('/') {
            Some(idx) => &prefix[..idx],
            None => "",
        };
        let start = if dir_part.is_empty() {
            self.root.clone()
        } else {
            self.path_for(dir_part)?
        };

        let mut out = Vec::new();
        if tokio::fs::metadata(&start).await.is_err() {
            return Ok(out);
        }

        let mut stack = vec![start];
        while let Some(dir) = stack.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| Error::StoreUnavailable(format!("read {}: {}", dir.display(), e)))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| Error::StoreUnavailable(format!("read {}: {}", dir.display(), e)))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
                let path = entry.path();
                if file_type.is_dir() {
                    stack.push(path);
                } else if let Some(key) = self.key_for(&path) {
                    if key.starts_with(prefix) {
                        out.push(key);
                    }
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_writes_file_under_root() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().to_path_buf()).await.unwrap();

        store
            .put("reports/alice/report_1.json", b"{}".to_vec(), "application/json")
            .await
            .unwrap();

        let on_disk = std::fs::read(dir.path().join("reports/alice/report_1.json")).unwrap();
        assert_eq!(on_disk, b"{}");
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().to_path_buf()).await.unwrap();

        for key in [
            "reports/alice/report_1.json",
            "reports/alice/report_2.json",
            "reports/alicia/report_3.json",
            "reports/bob/report_4.json",
        ] {
            store.put(key, b"{}".to_vec(), "application/json").await.unwrap();
        }

        let mut keys = store.list("reports/alice/").await.unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "reports/alice/report_1.json".to_string(),
                "reports/alice/report_2.json".to_string(),
            ]
        );

        assert_eq!(store.list("reports/").await.unwrap().len(), 4);
        assert!(store.list("reports/nobody/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().to_path_buf()).await.unwrap();

        let err = store
            .put("../outside.json", b"{}".to_vec(), "application/json")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
