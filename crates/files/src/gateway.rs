//! The storage gateway seam.

use crate::{FilesResult, MediaPath, UploadReceipt};
use async_trait::async_trait;
use std::time::Duration;

/// Object storage used for recipe attachments.
///
/// Implementations make a single attempt per call: no retries, no caching.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Name of the bucket objects are stored in.
    fn bucket(&self) -> &str;

    /// Stores `bytes` at `path`. Fails if an object already exists there.
    async fn upload(
        &self,
        path: &MediaPath,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> FilesResult<UploadReceipt>;

    /// Mints a URL granting read access to `path` for `ttl`.
    async fn signed_url(&self, path: &str, ttl: Duration) -> FilesResult<String>;
}
