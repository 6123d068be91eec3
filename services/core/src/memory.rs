use crate::error::StoreError;
use crate::store::ObjectStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::RwLock;

/// In-memory object store for tests and dry runs.
///
/// Keys are kept in a `BTreeMap`, so listings come back in lexicographic
/// order the way S3 returns them. Every successful write is appended to a
/// log that tests can inspect. A key can be primed to fail with a
/// non-not-found error on any operation that touches it.
pub struct InMemoryObjectStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    writes: RwLock<Vec<String>>,
    failures: RwLock<HashMap<String, String>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

impl InMemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: RwLock::new(BTreeMap::new()),
            writes: RwLock::new(Vec::new()),
            failures: RwLock::new(HashMap::new()),
        }
    }

    /// Seed an object without recording it as a write.
    pub async fn insert(&self, key: &str, data: impl Into<Bytes>) {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data: data.into(),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    /// Make every operation on `key` fail with a request error.
    pub async fn fail_on(&self, key: &str, message: &str) {
        self.failures
            .write()
            .await
            .insert(key.to_string(), message.to_string());
    }

    /// Body of a stored object, if present.
    pub async fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.read().await.get(key).map(|o| o.data.clone())
    }

    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.content_type.clone())
    }

    /// Keys written through the store, in write order.
    pub async fn written_keys(&self) -> Vec<String> {
        self.writes.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    async fn check_failure(&self, operation: &'static str, key: &str) -> Result<(), StoreError> {
        match self.failures.read().await.get(key) {
            Some(message) => Err(StoreError::request(operation, key, message.clone())),
            None => Ok(()),
        }
    }

    async fn store(&self, key: &str, data: Bytes, content_type: &str) {
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        self.writes.write().await.push(key.to_string());
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.check_failure("list_objects_v2", prefix).await?;

        let objects = self.objects.read().await;
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, StoreError> {
        self.check_failure("get_object", key).await?;

        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.check_failure("put_object", key).await?;
        self.store(key, body, content_type).await;
        Ok(())
    }

    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.check_failure("put_object", key).await?;

        let data = tokio::fs::read(path).await.map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.store(key, Bytes::from(data), content_type).await;
        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<(), StoreError> {
        self.check_failure("head_object", key).await?;

        if self.objects.read().await.contains_key(key) {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                key: key.to_string(),
            })
        }
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
