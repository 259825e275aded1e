//! Media paths, kinds and upload receipts.
//!
//! A recipe attachment is either an image or a PDF. Which one is decided purely from the file
//! extension supplied by the user, lower-cased, so `cake.PDF` and `cake.pdf` land in the same
//! place. The byte content is only sniffed to pick a `Content-Type` for the upload.

use crate::constants::{ACCEPTED_EXTENSIONS, MEDIA_FILE_STEM, MEDIA_ROOT_DIR};
use crate::{FilesError, FilesResult};
use chrono::{DateTime, Utc};
use repas_uuid::RecipeId;
use sha2::{Digest, Sha256};
use std::fmt;

/// What kind of attachment a file is, which decides the record column it is saved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Saved in `recipes.image_path` and shown inline.
    Image,
    /// Saved in `recipes.pdf_path` and offered as a download link.
    Pdf,
}

impl MediaKind {
    /// Classifies a lower-case extension.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::UnsupportedExtension`] for anything outside
    /// [`ACCEPTED_EXTENSIONS`].
    pub fn from_extension(ext: &str) -> FilesResult<Self> {
        if !ACCEPTED_EXTENSIONS.contains(&ext) {
            return Err(FilesError::UnsupportedExtension(ext.to_string()));
        }
        if ext == "pdf" {
            Ok(MediaKind::Pdf)
        } else {
            Ok(MediaKind::Image)
        }
    }
}

/// Destination of a recipe attachment inside the bucket: `recipes/{id}/media.{ext}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPath {
    path: String,
    extension: String,
    kind: MediaKind,
}

impl MediaPath {
    /// Builds the storage path for `recipe_id` from the user's original filename.
    ///
    /// The extension is the suffix after the last `.`, lower-cased. A name without any `.` is
    /// treated as being all extension, which is then rejected unless it happens to be accepted.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::UnsupportedExtension`] if the extension is not accepted.
    pub fn new(recipe_id: &RecipeId, original_filename: &str) -> FilesResult<Self> {
        let extension = extension_of(original_filename);
        let kind = MediaKind::from_extension(&extension)?;
        let path = format!(
            "{}/{}/{}.{}",
            MEDIA_ROOT_DIR, recipe_id, MEDIA_FILE_STEM, extension
        );
        Ok(Self {
            path,
            extension,
            kind,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}

impl fmt::Display for MediaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

fn extension_of(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or(filename)
        .trim()
        .to_lowercase()
}

/// Best-effort `Content-Type` for an upload.
///
/// Sniffs the bytes first and falls back to the extension when the content is not recognised.
pub fn detect_content_type(bytes: &[u8], extension: &str) -> &'static str {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type();
    }
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Record of a successful upload, kept for logging and audit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UploadReceipt {
    /// Path of the object inside the bucket
    pub path: String,

    /// Size of the uploaded content in bytes
    pub size_bytes: u64,

    /// `Content-Type` sent with the upload
    pub content_type: String,

    /// Hexadecimal SHA-256 digest of the content
    pub sha256: String,

    /// UTC timestamp of the upload
    pub stored_at: DateTime<Utc>,
}

impl UploadReceipt {
    pub fn for_upload(path: &MediaPath, bytes: &[u8], content_type: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self {
            path: path.as_str().to_string(),
            size_bytes: bytes.len() as u64,
            content_type: content_type.to_string(),
            sha256: hex::encode(hasher.finalize()),
            stored_at: Utc::now(),
        }
    }
}
