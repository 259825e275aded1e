//! In-process storage gateway.
//!
//! Backs the development mode and the test suites. Objects live in a map for the lifetime of
//! the value; signed URLs use a `memory://` scheme and are not actually fetchable.

use crate::{FilesError, FilesResult, MediaPath, StorageGateway, UploadReceipt};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

#[derive(Debug)]
pub struct MemoryStorage {
    bucket: String,
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// Content stored at `path`, if any.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().get(path).map(|o| o.bytes.clone())
    }

    pub fn content_type(&self, path: &str) -> Option<String> {
        self.lock().get(path).map(|o| o.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredObject>> {
        // A poisoned map is still a valid map.
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl StorageGateway for MemoryStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(
        &self,
        path: &MediaPath,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> FilesResult<UploadReceipt> {
        let mut objects = self.lock();
        if objects.contains_key(path.as_str()) {
            return Err(FilesError::AlreadyExists(path.to_string()));
        }
        let receipt = UploadReceipt::for_upload(path, &bytes, content_type);
        objects.insert(
            path.as_str().to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(receipt)
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> FilesResult<String> {
        if !self.lock().contains_key(path) {
            return Err(FilesError::NotFound(path.to_string()));
        }
        Ok(format!(
            "memory://{}/{}?expires_in={}",
            self.bucket,
            path,
            ttl.as_secs()
        ))
    }
}
