use bytes::Bytes;
use tracing::{info, instrument};
use vidmeta_core::{object_exists, ObjectStore, StoreError};

/// Outcome of [`ensure_prefix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixState {
    Existing,
    Created,
}

/// Make sure a placeholder object exists at `prefix`.
///
/// The placeholder is an empty object whose key is the prefix itself.
/// Calling this again once it exists writes nothing. An empty prefix means
/// the bucket root and needs no marker.
#[instrument(skip(store), fields(bucket = %store.bucket()))]
pub async fn ensure_prefix(store: &dyn ObjectStore, prefix: &str) -> Result<PrefixState, StoreError> {
    if prefix.is_empty() || object_exists(store, prefix).await? {
        info!(prefix = %prefix, "Prefix already exists");
        return Ok(PrefixState::Existing);
    }

    store
        .put_object(prefix, Bytes::new(), "application/x-directory")
        .await?;
    info!(prefix = %prefix, "Prefix created");

    Ok(PrefixState::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidmeta_core::InMemoryObjectStore;

    #[tokio::test]
    async fn test_creates_marker_once() {
        let store = InMemoryObjectStore::new("test-bucket");

        assert_eq!(
            ensure_prefix(&store, "folder/prefix/").await.unwrap(),
            PrefixState::Created
        );
        assert_eq!(
            ensure_prefix(&store, "folder/prefix/").await.unwrap(),
            PrefixState::Existing
        );

        assert_eq!(store.written_keys().await, vec!["folder/prefix/".to_string()]);
        assert_eq!(store.object("folder/prefix/").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_empty_prefix_is_noop() {
        let store = InMemoryObjectStore::new("test-bucket");

        assert_eq!(ensure_prefix(&store, "").await.unwrap(), PrefixState::Existing);
        assert!(store.written_keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_probe_failure_propagates() {
        let store = InMemoryObjectStore::new("test-bucket");
        store.fail_on("folder/prefix/", "403 Forbidden").await;

        let err = ensure_prefix(&store, "folder/prefix/").await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(store.written_keys().await.is_empty());
    }
}
