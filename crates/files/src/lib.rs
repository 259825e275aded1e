//! Repas media storage
//!
//! This crate is the storage gateway for recipe attachments. It knows how to put bytes into
//! the hosted object store and how to mint time-limited signed URLs for them. Nothing else:
//! deciding *whether* to upload, and what to do with a failure, belongs to `repas-core`.
//!
//! ## Storage layout
//!
//! Every recipe owns at most one media object, stored under a path derived from its id and the
//! extension of the uploaded file:
//!
//! ```text
//! <bucket>/
//! └── recipes/
//!     └── <recipe_id>/
//!         └── media.<ext>     # png | jpg | jpeg | pdf
//! ```
//!
//! Signed URLs are never persisted; they are minted on demand for each render.
//!
//! ## Example Usage
//!
//! ```no_run
//! use repas_files::{MediaPath, MemoryStorage, StorageGateway};
//! use repas_uuid::RecipeId;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), repas_files::FilesError> {
//! let storage = MemoryStorage::new("media");
//! let path = MediaPath::new(&RecipeId::new(), "cake.PDF")?;
//!
//! storage.upload(&path, b"%PDF-1.4".to_vec(), "application/pdf").await?;
//! let url = storage.signed_url(path.as_str(), Duration::from_secs(3600)).await?;
//! # Ok(())
//! # }
//! ```

mod constants;
mod gateway;
mod media;
mod memory;
mod supabase;

pub use constants::{
    ACCEPTED_EXTENSIONS, DEFAULT_BUCKET, DEFAULT_SIGNED_URL_TTL_SECS, MEDIA_FILE_STEM,
    MEDIA_ROOT_DIR,
};
pub use gateway::StorageGateway;
pub use media::{detect_content_type, MediaKind, MediaPath, UploadReceipt};
pub use memory::MemoryStorage;
pub use supabase::SupabaseStorage;

/// Errors that can occur during storage operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// The file extension is not one of [`ACCEPTED_EXTENSIONS`]
    #[error("Unsupported file extension: '{0}' (accepted: png, jpg, jpeg, pdf)")]
    UnsupportedExtension(String),

    /// An object already exists at the destination path
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    /// No object exists at the requested path
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The backend answered with a non-success status
    #[error("Storage backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// The backend answered with a body we do not understand
    #[error("Unexpected storage response: {0}")]
    UnexpectedResponse(String),

    /// Transport-level failure talking to the backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for storage operations.
pub type FilesResult<T> = Result<T, FilesError>;
