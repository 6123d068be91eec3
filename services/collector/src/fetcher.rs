use crate::keys::extract_name;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use vidmeta_core::{ObjectStore, StoreError};

/// Errors raised while turning a metadata object into JSON.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Object {key} is not valid UTF-8")]
    Utf8 { key: String },

    #[error("Object {key} is not valid JSON: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// What to do when one metadata object cannot be fetched or parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the whole collection at the first bad object.
    #[default]
    Abort,
    /// Record the bad object and keep going.
    Skip,
}

/// Parsed metadata keyed by logical name, in first-insertion order.
///
/// Inserting a name that is already present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedMetadata {
    entries: Vec<(String, Value)>,
}

impl AggregatedMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the previous value for `name`, if any.
    pub fn insert(&mut self, name: String, value: Value) -> Option<Value> {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of one collection run.
#[derive(Debug, Default)]
pub struct FetchResult {
    pub metadata: AggregatedMetadata,
    /// `(key, error)` for objects dropped under [`FailurePolicy::Skip`]
    pub skipped: Vec<(String, String)>,
}

/// Fetch every key, parse it as JSON and aggregate under its logical name.
///
/// Keys are processed in the order given.
#[instrument(skip(store, keys), fields(bucket = %store.bucket(), key_count = keys.len()))]
pub async fn fetch_metadata(
    store: &dyn ObjectStore,
    keys: &[String],
    delimiter: &str,
    policy: FailurePolicy,
) -> Result<FetchResult, CollectError> {
    let mut result = FetchResult::default();

    for key in keys {
        let value = match fetch_json(store, key).await {
            Ok(value) => value,
            Err(e) if policy == FailurePolicy::Skip => {
                warn!(key = %key, error = %e, "Skipping unreadable metadata object");
                result.skipped.push((key.clone(), e.to_string()));
                continue;
            }
            Err(e) => return Err(e),
        };

        let name = extract_name(key, delimiter).to_string();
        if result.metadata.insert(name.clone(), value).is_some() {
            warn!(key = %key, name = %name, "Duplicate logical name, keeping the later object");
        }
    }

    info!(
        collected = result.metadata.len(),
        skipped = result.skipped.len(),
        "Metadata collection finished"
    );

    Ok(result)
}

async fn fetch_json(store: &dyn ObjectStore, key: &str) -> Result<Value, CollectError> {
    let body = store.get_object(key).await?;
    debug!(key = %key, size_bytes = body.len(), "Fetched metadata object");

    let text = std::str::from_utf8(&body).map_err(|_| CollectError::Utf8 {
        key: key.to_string(),
    })?;

    serde_json::from_str(text).map_err(|source| CollectError::Json {
        key: key.to_string(),
        source,
    })
}
