use crate::config::S3Config;
use crate::error::StoreError;
use crate::store::ObjectStore;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use std::path::Path;
use tracing::{debug, info, instrument};

/// S3-backed object store bound to one bucket
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
    max_keys: i32,
}

impl S3ObjectStore {
    /// Create a new S3 store from configuration
    pub async fn new(config: &S3Config) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        // Configure custom endpoint for MinIO/LocalStack
        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        // Force path-style access for MinIO compatibility
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = S3Client::from_conf(s3_config_builder.build());

        info!(
            bucket = %config.bucket,
            region = %config.region,
            "S3 object store initialized"
        );

        Self::from_client(client, &config.bucket, config.max_keys)
    }

    /// Wrap an already configured client
    pub fn from_client(client: S3Client, bucket: &str, max_keys: i32) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            max_keys,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(self.max_keys)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        let mut page_count = 0usize;

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                StoreError::request("list_objects_v2", prefix, DisplayErrorContext(e).to_string())
            })?;
            page_count += 1;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(String::from)),
            );
        }

        debug!(
            prefix = %prefix,
            pages = page_count,
            key_count = keys.len(),
            "Listed objects"
        );

        Ok(keys)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get_object(&self, key: &str) -> Result<Bytes, StoreError> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                if e.as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false)
                {
                    return Err(StoreError::NotFound {
                        key: key.to_string(),
                    });
                }
                return Err(StoreError::request(
                    "get_object",
                    key,
                    DisplayErrorContext(e).to_string(),
                ));
            }
        };

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Body {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(body.into_bytes())
    }

    #[instrument(skip(self, body), fields(bucket = %self.bucket, size_bytes = body.len()))]
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::request("put_object", key, DisplayErrorContext(e).to_string()))?;

        debug!(key = %key, "Object written");
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StoreError::Body {
                key: key.to_string(),
                message: format!("{}: {}", path.display(), e),
            })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::request("put_object", key, DisplayErrorContext(e).to_string()))?;

        debug!(key = %key, path = %path.display(), "File uploaded");
        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<(), StoreError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false)
                {
                    Err(StoreError::NotFound {
                        key: key.to_string(),
                    })
                } else {
                    Err(StoreError::request(
                        "head_object",
                        key,
                        DisplayErrorContext(e).to_string(),
                    ))
                }
            }
        }
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::get_object::{GetObjectError, GetObjectOutput};
    use aws_sdk_s3::operation::head_object::{HeadObjectError, HeadObjectOutput};
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
    use aws_sdk_s3::types::error::{NoSuchKey, NotFound};
    use aws_sdk_s3::types::Object;
    use aws_smithy_mocks::{mock, mock_client, RuleMode};

    fn object(key: &str) -> Object {
        Object::builder().key(key).build()
    }

    #[tokio::test]
    async fn test_list_keys_follows_continuation_token() {
        let first_page = mock!(S3Client::list_objects_v2)
            .match_requests(|req| {
                req.bucket() == Some("test-bucket") && req.continuation_token().is_none()
            })
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(object("m/a.json"))
                    .contents(object("m/b.json"))
                    .is_truncated(true)
                    .next_continuation_token("page-2")
                    .build()
            });
        let second_page = mock!(S3Client::list_objects_v2)
            .match_requests(|req| req.continuation_token() == Some("page-2"))
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(object("m/c.json"))
                    .is_truncated(false)
                    .build()
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&first_page, &second_page]);
        let store = S3ObjectStore::from_client(client, "test-bucket", 2);

        let keys = store.list_keys("m/").await.unwrap();

        assert_eq!(keys, vec!["m/a.json", "m/b.json", "m/c.json"]);
        assert_eq!(first_page.num_calls(), 1);
        assert_eq!(second_page.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_head_object_found() {
        let head = mock!(S3Client::head_object)
            .match_requests(|req| req.key() == Some("videos/a.mp4"))
            .then_output(|| HeadObjectOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, [&head]);
        let store = S3ObjectStore::from_client(client, "test-bucket", 1000);

        assert!(store.head_object("videos/a.mp4").await.is_ok());
    }

    #[tokio::test]
    async fn test_head_object_404_is_not_found() {
        let head = mock!(S3Client::head_object)
            .then_error(|| HeadObjectError::NotFound(NotFound::builder().build()));
        let client = mock_client!(aws_sdk_s3, [&head]);
        let store = S3ObjectStore::from_client(client, "test-bucket", 1000);

        let err = store.head_object("videos/a.mp4").await.unwrap_err();

        assert!(matches!(err, StoreError::NotFound { ref key } if key == "videos/a.mp4"));
    }

    #[tokio::test]
    async fn test_head_object_403_is_a_request_error() {
        let head = mock!(S3Client::head_object).then_error(|| {
            HeadObjectError::generic(
                ErrorMetadata::builder()
                    .code("AccessDenied")
                    .message("Access Denied")
                    .build(),
            )
        });
        let client = mock_client!(aws_sdk_s3, [&head]);
        let store = S3ObjectStore::from_client(client, "test-bucket", 1000);

        let err = store.head_object("videos/a.mp4").await.unwrap_err();

        assert!(!err.is_not_found());
        assert!(matches!(
            err,
            StoreError::Request {
                operation: "head_object",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_get_object_no_such_key_is_not_found() {
        let get = mock!(S3Client::get_object)
            .then_error(|| GetObjectError::NoSuchKey(NoSuchKey::builder().build()));
        let client = mock_client!(aws_sdk_s3, [&get]);
        let store = S3ObjectStore::from_client(client, "test-bucket", 1000);

        let err = store.get_object("m/gone.json").await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_object_returns_body() {
        let get = mock!(S3Client::get_object)
            .match_requests(|req| req.key() == Some("m/x.json"))
            .then_output(|| {
                GetObjectOutput::builder()
                    .body(ByteStream::from_static(br#"{"a":1}"#))
                    .build()
            });
        let client = mock_client!(aws_sdk_s3, [&get]);
        let store = S3ObjectStore::from_client(client, "test-bucket", 1000);

        let body = store.get_object("m/x.json").await.unwrap();

        assert_eq!(&body[..], br#"{"a":1}"#);
    }
}
