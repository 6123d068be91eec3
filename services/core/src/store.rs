//! The object-store seam shared by both pipelines.
//!
//! A store handle is bound to a single bucket when it is built; every key
//! passed to it is relative to that bucket. Handles are injected into the
//! pipeline components so they can run against S3 in production and against
//! [`InMemoryObjectStore`](crate::InMemoryObjectStore) in tests.

use crate::error::StoreError;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use tracing::debug;

/// Minimal object-store surface: list, get, put, head.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every key under `prefix`, in the order the backend returns them.
    ///
    /// Backends must follow pagination to the end; callers assume the
    /// returned listing is complete.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Fetch the full body of an object.
    async fn get_object(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Write an in-memory body to `key`, replacing any existing object.
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str)
        -> Result<(), StoreError>;

    /// Stream a local file to `key`.
    async fn put_file(&self, key: &str, path: &Path, content_type: &str)
        -> Result<(), StoreError>;

    /// Probe for an object. Returns `StoreError::NotFound` when it is absent.
    async fn head_object(&self, key: &str) -> Result<(), StoreError>;

    /// Bucket name, for log context.
    fn bucket(&self) -> &str;
}

/// Check whether `key` exists.
///
/// Only a not-found response maps to `false`; any other failure is returned
/// to the caller unchanged.
pub async fn object_exists(store: &dyn ObjectStore, key: &str) -> Result<bool, StoreError> {
    match store.head_object(key).await {
        Ok(()) => Ok(true),
        Err(StoreError::NotFound { .. }) => {
            debug!(key = %key, "Object not found");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_object_exists_when_head_succeeds() {
        let mut store = MockObjectStore::new();
        store.expect_head_object().times(1).returning(|_| Ok(()));

        assert!(object_exists(&store, "videos/a.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_object_missing_on_not_found() {
        let mut store = MockObjectStore::new();
        store.expect_head_object().times(1).returning(|key| {
            Err(StoreError::NotFound {
                key: key.to_string(),
            })
        });

        assert!(!object_exists(&store, "videos/a.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let mut store = MockObjectStore::new();
        store
            .expect_head_object()
            .times(1)
            .returning(|key| Err(StoreError::request("head_object", key, "403 Forbidden")));

        let err = object_exists(&store, "videos/a.mp4").await.unwrap_err();
        assert!(matches!(err, StoreError::Request { .. }));
    }
}
