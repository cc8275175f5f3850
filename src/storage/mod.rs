//! Object storage - durable blob store for completion reports
//!
//! The lab only needs two calls from a blob store: write one object with a
//! content type, and list keys under a prefix. Backends:
//! - `FsObjectStore`: one file per key under a root directory
//! - `MemoryObjectStore`: process-local, for tests and throwaway setups

mod filesystem;
mod memory;

pub use filesystem::FsObjectStore;
pub use memory::{MemoryObjectStore, StoredObject};

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{StorageBackendType, StorageConfig};
use crate::error::{Error, Result};

/// Abstract interface for a key/value blob store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend ID for logs
    fn id(&self) -> &str;

    /// Write `body` at `key`, replacing any existing object
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// All keys starting with `prefix`, in no particular order
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Create an object store based on the configuration
pub async fn create_object_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    match config.backend {
        StorageBackendType::Filesystem => {
            let store = FsObjectStore::new(config.root.clone()).await?;
            Ok(Arc::new(store))
        }
        StorageBackendType::Memory => Ok(Arc::new(MemoryObjectStore::new())),
    }
}

/// Reject keys that could escape a prefix or a root directory
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::InvalidInput("object key is empty".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(Error::InvalidInput(format!("object key must be relative: {}", key)));
    }
    if key.split('/').any(|segment| segment == "..") {
        return Err(Error::InvalidInput(format!("object key must not contain '..': {}", key)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("reports/alice/report_1.json").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("reports/../secrets").is_err());
        assert!(validate_key("reports\\alice").is_err());
    }

    #[tokio::test]
    async fn test_create_memory_store() {
        let config = StorageConfig {
            backend: StorageBackendType::Memory,
            ..StorageConfig::default()
        };
        let store = create_object_store(&config).await.unwrap();
        assert_eq!(store.id(), "memory");
    }
}
