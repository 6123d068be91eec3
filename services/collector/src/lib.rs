//! Vidmeta Collector
//!
//! Reads the JSON metadata objects stored under an S3 prefix and aggregates
//! them into a report keyed by logical name.
//!
//! ```text
//! list_keys_with_suffix ──▶ fetch_metadata ──▶ write_report
//!        (prefix, ".json")     (name = key up to ".")
//! ```

pub mod config;
pub mod fetcher;
pub mod keys;
pub mod report;

pub use self::config::{CollectSettings, CollectorConfig};
pub use fetcher::{fetch_metadata, AggregatedMetadata, CollectError, FailurePolicy, FetchResult};
pub use keys::{extract_name, list_keys_with_suffix};
pub use report::write_report;

use vidmeta_core::ObjectStore;

/// Run one collection: list matching keys, then fetch and aggregate them.
pub async fn collect(
    store: &dyn ObjectStore,
    settings: &CollectSettings,
) -> Result<FetchResult, CollectError> {
    let keys = list_keys_with_suffix(store, &settings.prefix, &settings.suffix).await?;
    fetch_metadata(store, &keys, &settings.delimiter, settings.on_error).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vidmeta_core::InMemoryObjectStore;

    fn settings(on_error: FailurePolicy) -> CollectSettings {
        CollectSettings {
            prefix: "m/".to_string(),
            suffix: ".json".to_string(),
            delimiter: ".".to_string(),
            on_error,
        }
    }

    #[tokio::test]
    async fn test_collect_two_sidecars() {
        let store = InMemoryObjectStore::new("bucket-name");
        store.insert("m/", "").await;
        store.insert("m/x.json", r#"{"ObjectKey": "m/x"}"#).await;
        store.insert("m/y.json", r#"{"ObjectKey": "m/y"}"#).await;
        store.insert("m/y.mp4", "video").await;

        let result = collect(&store, &settings(FailurePolicy::Abort)).await.unwrap();

        assert_eq!(result.metadata.len(), 2);
        assert_eq!(result.metadata.get("m/x"), Some(&json!({"ObjectKey": "m/x"})));
        assert_eq!(result.metadata.get("m/y"), Some(&json!({"ObjectKey": "m/y"})));
    }

    #[tokio::test]
    async fn test_collect_empty_prefix() {
        let store = InMemoryObjectStore::new("bucket-name");

        let result = collect(&store, &settings(FailurePolicy::Abort)).await.unwrap();

        assert!(result.metadata.is_empty());
    }
}
