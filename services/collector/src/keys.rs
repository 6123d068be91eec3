//! Key selection: which objects under a prefix are metadata objects, and
//! what logical name each one reports under.

use tracing::{debug, instrument};
use vidmeta_core::{ObjectStore, StoreError};

/// List the keys under `prefix` whose name ends with `suffix`.
///
/// Plain suffix match, no wildcards. Store errors are returned unchanged.
#[instrument(skip(store), fields(bucket = %store.bucket()))]
pub async fn list_keys_with_suffix(
    store: &dyn ObjectStore,
    prefix: &str,
    suffix: &str,
) -> Result<Vec<String>, StoreError> {
    let keys: Vec<String> = store
        .list_keys(prefix)
        .await?
        .into_iter()
        .filter(|key| key.ends_with(suffix))
        .collect();

    debug!(matched = keys.len(), "Selected metadata keys");

    Ok(keys)
}

/// The part of `key` before the first `delimiter`, or the whole key when the
/// delimiter does not occur. An empty delimiter never splits.
pub fn extract_name<'a>(key: &'a str, delimiter: &str) -> &'a str {
    if delimiter.is_empty() {
        return key;
    }

    match key.find(delimiter) {
        Some(idx) => &key[..idx],
        None => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidmeta_core::InMemoryObjectStore;

    #[tokio::test]
    async fn test_only_suffix_matches_are_listed() {
        let store = InMemoryObjectStore::new("test-bucket");
        store.insert("m/", "").await;
        store.insert("m/x.json", "{}").await;
        store.insert("m/clip.mp4", "").await;
        store.insert("m/clip.mp4.metadata.json", "{}").await;
        store.insert("m/notes.json.bak", "").await;
        store.insert("n/z.json", "{}").await;

        let keys = list_keys_with_suffix(&store, "m/", ".json").await.unwrap();

        assert_eq!(keys, vec!["m/clip.mp4.metadata.json", "m/x.json"]);
        assert!(keys.iter().all(|k| k.ends_with(".json")));
    }

    #[tokio::test]
    async fn test_listing_error_propagates() {
        let store = InMemoryObjectStore::new("test-bucket");
        store.fail_on("m/", "AccessDenied").await;

        let err = list_keys_with_suffix(&store, "m/", ".json").await.unwrap_err();
        assert!(matches!(err, StoreError::Request { .. }));
    }

    #[test]
    fn test_extract_name_splits_on_first_delimiter() {
        assert_eq!(extract_name("m/x.json", "."), "m/x");
        assert_eq!(extract_name("m/clip.mp4.metadata.json", "."), "m/clip");
        assert_eq!(extract_name("m/clip.mp4.metadata.json", ".metadata"), "m/clip.mp4");
    }

    #[test]
    fn test_extract_name_without_delimiter() {
        assert_eq!(extract_name("m/readme", "."), "m/readme");
        assert_eq!(extract_name("m/x.json", ""), "m/x.json");
    }

    #[test]
    fn test_extract_name_is_idempotent() {
        for key in ["m/x.json", "a/b/c.d.e", "plain", ".hidden"] {
            let once = extract_name(key, ".");
            assert_eq!(extract_name(once, "."), once);
        }
    }
}
