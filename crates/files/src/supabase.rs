//! Supabase Storage implementation of [`StorageGateway`].
//!
//! Talks to the `storage/v1` REST interface with the service role key. Uploads are plain
//! `POST`s of the raw bytes with `x-upsert: false`; signed URLs come from the `object/sign`
//! endpoint, which answers with a path relative to `storage/v1`.

use crate::{FilesError, FilesResult, MediaPath, StorageGateway, UploadReceipt};
use async_trait::async_trait;
use repas_types::BackendCredentials;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: Client,
    credentials: BackendCredentials,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(client: Client, credentials: BackendCredentials, bucket: impl Into<String>) -> Self {
        Self {
            client,
            credentials,
            bucket: bucket.into(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.credentials.base_url(),
            self.bucket,
            path.trim_start_matches('/')
        )
    }

    fn sign_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.credentials.base_url(),
            self.bucket,
            path.trim_start_matches('/')
        )
    }

    fn authorised(&self, builder: RequestBuilder) -> RequestBuilder {
        self.credentials
            .auth_headers()
            .into_iter()
            .fold(builder, |b, (name, value)| b.header(name, value))
    }

    /// Turns the `signedURL` field of a sign response into an absolute URL.
    fn resolve_signed_url(&self, body: &Value) -> FilesResult<String> {
        let signed = body
            .get("signedURL")
            .or_else(|| body.get("signedUrl"))
            .and_then(Value::as_str)
            .ok_or_else(|| FilesError::UnexpectedResponse(body.to_string()))?;

        if signed.starts_with("http://") || signed.starts_with("https://") {
            return Ok(signed.to_string());
        }
        Ok(format!(
            "{}/storage/v1/{}",
            self.credentials.base_url(),
            signed.trim_start_matches('/')
        ))
    }
}

/// Maps a non-success response to [`FilesError::Backend`], preferring the JSON `message`.
/// `fallback` is used when the backend sends no body at all.
async fn check_status(response: Response, fallback: &str) -> FilesResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FilesError::Backend {
        status: status.as_u16(),
        message: backend_message(&body, fallback),
    })
}

fn backend_message(body: &str, fallback: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => json
            .get("message")
            .or_else(|| json.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Err(_) if body.trim().is_empty() => fallback.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl StorageGateway for SupabaseStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(
        &self,
        path: &MediaPath,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> FilesResult<UploadReceipt> {
        let receipt = UploadReceipt::for_upload(path, &bytes, content_type);
        let request = self
            .authorised(self.client.post(self.object_url(path.as_str())))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes);

        check_status(request.send().await?, "upload error").await?;
        tracing::debug!(
            "uploaded {} ({} bytes) to bucket {}",
            path,
            receipt.size_bytes,
            self.bucket
        );
        Ok(receipt)
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> FilesResult<String> {
        let request = self
            .authorised(self.client.post(self.sign_url(path)))
            .json(&serde_json::json!({ "expiresIn": ttl.as_secs() }));

        let response = check_status(request.send().await?, "upload error").await?;
        let body: Value = response.json().await?;
        self.resolve_signed_url(&body)
    }
}
