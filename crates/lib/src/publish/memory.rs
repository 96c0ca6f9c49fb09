//! In-process object store.
//!
//! Backs dry runs and tests: puts are recorded instead of sent anywhere.

use std::collections::HashSet;
use std::sync::Mutex;

use tracing::debug;

use super::{AccessControl, ObjectStore, PublishError};

/// An object recorded by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
  pub bucket: String,
  pub key: String,
  pub body: Vec<u8>,
  pub acl: AccessControl,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  objects: Mutex<Vec<StoredObject>>,
  failing_keys: HashSet<String>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// A store that rejects puts to `key`.
  pub fn failing_on(key: impl Into<String>) -> Self {
    Self {
      objects: Mutex::new(Vec::new()),
      failing_keys: HashSet::from([key.into()]),
    }
  }

  /// Objects in the order they were put.
  pub fn objects(&self) -> Vec<StoredObject> {
    self.objects.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }
}

impl ObjectStore for MemoryStore {
  async fn put_object(&self, bucket: &str, key: &str, body: &[u8], acl: AccessControl) -> Result<(), PublishError> {
    if self.failing_keys.contains(key) {
      return Err(PublishError::Remote {
        bucket: bucket.to_string(),
        key: key.to_string(),
        message: "access denied".to_string(),
      });
    }

    debug!(bucket = %bucket, key = %key, size = body.len(), "recording object");

    let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
    objects.retain(|o| !(o.bucket == bucket && o.key == key));
    objects.push(StoredObject {
      bucket: bucket.to_string(),
      key: key.to_string(),
      body: body.to_vec(),
      acl,
    });
    Ok(())
  }
}
