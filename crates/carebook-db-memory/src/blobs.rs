use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use carebook_storage::{BlobStore, StorageError};
use papaya::HashMap as PapayaHashMap;

use crate::faults::{FailPoint, Faults};

/// An object held by [`InMemoryBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub content: Vec<u8>,
    pub content_type: String,
}

/// In-memory object storage keyed by `"bucket/key"`.
///
/// Signed URLs use the `memory://` scheme and never expire; they exist so
/// callers can round-trip a URL without a network.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: Arc<PapayaHashMap<String, StoredBlob>>,
    faults: Faults,
}

fn object_key(bucket: &str, key: &str) -> String {
    format!("{bucket}/{key}")
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, point: FailPoint) {
        self.faults.arm(point);
    }

    pub fn clear_fault(&self, point: &FailPoint) {
        self.faults.disarm(point);
    }

    pub fn clear_faults(&self) {
        self.faults.clear();
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects.pin().contains_key(&object_key(bucket, key))
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredBlob> {
        self.objects.pin().get(&object_key(bucket, key)).cloned()
    }

    /// Keys stored in `bucket`, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let prefix = format!("{bucket}/");
        let guard = self.objects.pin();
        let mut keys: Vec<String> = guard
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.faults.check(FailPoint::upload(bucket))?;

        let blob = StoredBlob {
            content,
            content_type: content_type.to_string(),
        };
        let guard = self.objects.pin();
        if guard.try_insert(object_key(bucket, key), blob).is_err() {
            return Err(StorageError::already_exists(
                bucket,
                format!("object {key} already exists"),
            ));
        }
        tracing::debug!(bucket, key, "in-memory upload");
        Ok(())
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<Vec<String>, StorageError> {
        self.faults.check(FailPoint::remove(bucket))?;

        let guard = self.objects.pin();
        Ok(keys
            .iter()
            .filter(|key| guard.remove(&object_key(bucket, key)).is_some())
            .cloned()
            .collect())
    }

    async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        self.faults.check(FailPoint::signed_url(bucket))?;

        if !self.contains(bucket, key) {
            return Err(StorageError::not_found(bucket, key));
        }
        Ok(format!(
            "memory://{bucket}/{key}?expires_in={}",
            expires_in.as_secs()
        ))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
