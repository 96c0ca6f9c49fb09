//! Publishing the bundle to an object store.
//!
//! Each run uploads the same bytes twice: first under `v<version>/`, then
//! under `latest/`. The second upload only starts once the first has been
//! acknowledged. There is no rollback, so a failure in between leaves the
//! versioned object in place while `latest` still points at the previous
//! release.

mod memory;
mod s3;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::project::{Project, ProjectError, keys};
use crate::util::hash::hash_bytes;

pub use memory::{MemoryStore, StoredObject};
pub use s3::S3Store;

/// Errors that can occur while publishing.
#[derive(Debug, Error)]
pub enum PublishError {
  #[error("failed to read archive {}: {source}", path.display())]
  ReadArchive { path: PathBuf, source: io::Error },

  /// The store rejected the request or could not be reached.
  #[error("upload to s3://{bucket}/{key} failed: {message}")]
  Remote {
    bucket: String,
    key: String,
    message: String,
  },
}

/// Canned ACL attached to every uploaded object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessControl {
  Private,
  PublicRead,
  PublicReadWrite,
  AuthenticatedRead,
  AwsExecRead,
  BucketOwnerRead,
  #[default]
  BucketOwnerFullControl,
}

impl AccessControl {
  pub const ALL: [AccessControl; 7] = [
    AccessControl::Private,
    AccessControl::PublicRead,
    AccessControl::PublicReadWrite,
    AccessControl::AuthenticatedRead,
    AccessControl::AwsExecRead,
    AccessControl::BucketOwnerRead,
    AccessControl::BucketOwnerFullControl,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      AccessControl::Private => "private",
      AccessControl::PublicRead => "public-read",
      AccessControl::PublicReadWrite => "public-read-write",
      AccessControl::AuthenticatedRead => "authenticated-read",
      AccessControl::AwsExecRead => "aws-exec-read",
      AccessControl::BucketOwnerRead => "bucket-owner-read",
      AccessControl::BucketOwnerFullControl => "bucket-owner-full-control",
    }
  }
}

impl fmt::Display for AccessControl {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AccessControl {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    AccessControl::ALL
      .into_iter()
      .find(|acl| acl.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| {
        let valid: Vec<_> = AccessControl::ALL.iter().map(|a| a.as_str()).collect();
        format!("expected one of {}", valid.join(", "))
      })
  }
}

/// The two keys a bundle is published under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectKeys {
  /// `<prefix>v<version>/<name>.zip`
  pub versioned: String,
  /// `<prefix>latest/<name>.zip`
  pub latest: String,
}

impl ObjectKeys {
  /// Derive both keys. The prefix is used verbatim; include a trailing `/`
  /// to get a folder.
  pub fn new(prefix: &str, version: &str, archive_name: &str) -> Self {
    Self {
      versioned: format!("{prefix}v{version}/{archive_name}"),
      latest: format!("{prefix}latest/{archive_name}"),
    }
  }
}

/// Resolved upload settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
  pub bucket: String,
  pub keys: ObjectKeys,
  pub acl: AccessControl,
}

impl PublishConfig {
  /// Read `bucket_name`, `bucket_prefix` and `lambda_file_access_control`.
  ///
  /// Fails when `bucket_name` is missing or the ACL is not a known canned ACL.
  pub fn from_project(project: &Project) -> Result<Self, ProjectError> {
    let bucket = project.properties.mandatory(keys::BUCKET_NAME)?.to_string();
    let prefix = project.properties.get_or(keys::BUCKET_PREFIX, "");

    let acl = match project.properties.get(keys::ACCESS_CONTROL) {
      Some(raw) => raw.parse().map_err(|reason| ProjectError::InvalidProperty {
        key: keys::ACCESS_CONTROL.to_string(),
        value: raw.to_string(),
        reason,
      })?,
      None => AccessControl::default(),
    };

    Ok(Self {
      bucket,
      keys: ObjectKeys::new(prefix, &project.version, &project.archive_name()),
      acl,
    })
  }
}

/// Destination for uploaded bundles.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
  /// Create or overwrite `key` in `bucket` with `body`.
  async fn put_object(&self, bucket: &str, key: &str, body: &[u8], acl: AccessControl) -> Result<(), PublishError>;
}

/// Outcome of a publish run.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
  pub bucket: String,
  pub keys: ObjectKeys,
  pub acl: AccessControl,
  pub size: u64,
  pub sha256: String,
}

/// Read the finished archive into memory.
pub fn read_archive(path: &Path) -> Result<Vec<u8>, PublishError> {
  fs::read(path).map_err(|e| PublishError::ReadArchive {
    path: path.to_path_buf(),
    source: e,
  })
}

/// Upload `data` under the versioned key, then under the latest key.
pub async fn publish(
  store: &impl ObjectStore,
  config: &PublishConfig,
  data: &[u8],
) -> Result<PublishReport, PublishError> {
  let keys = &config.keys;

  for key in [&keys.versioned, &keys.latest] {
    info!(bucket = %config.bucket, key = %key, acl = %config.acl, size = data.len(), "uploading archive");

    if let Err(e) = store.put_object(&config.bucket, key, data, config.acl).await {
      if key == &keys.latest {
        warn!(versioned = %keys.versioned, latest = %keys.latest, "versioned object published but latest was not updated");
      }
      return Err(e);
    }
  }

  Ok(PublishReport {
    bucket: config.bucket.clone(),
    keys: keys.clone(),
    acl: config.acl,
    size: data.len() as u64,
    sha256: hash_bytes(data),
  })
}
