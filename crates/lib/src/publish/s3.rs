//! Amazon S3 object store.

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use tracing::debug;

use super::{AccessControl, ObjectStore, PublishError};

const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Uploads through the AWS SDK.
///
/// Region and credentials come from the standard provider chain
/// (`AWS_*` environment variables, shared profiles, instance metadata).
#[derive(Debug, Clone)]
pub struct S3Store {
  client: Client,
}

impl S3Store {
  pub fn new(client: Client) -> Self {
    Self { client }
  }

  /// Build a client from the ambient AWS configuration.
  pub async fn from_env() -> Self {
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    Self::new(Client::new(&config))
  }
}

impl ObjectStore for S3Store {
  async fn put_object(&self, bucket: &str, key: &str, body: &[u8], acl: AccessControl) -> Result<(), PublishError> {
    let output = self
      .client
      .put_object()
      .bucket(bucket)
      .key(key)
      .acl(ObjectCannedAcl::from(acl.as_str()))
      .content_type(ZIP_CONTENT_TYPE)
      .body(ByteStream::from(body.to_vec()))
      .send()
      .await
      .map_err(|e| PublishError::Remote {
        bucket: bucket.to_string(),
        key: key.to_string(),
        message: DisplayErrorContext(&e).to_string(),
      })?;

    debug!(bucket = %bucket, key = %key, etag = ?output.e_tag(), "object stored");
    Ok(())
  }
}
