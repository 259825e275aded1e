//! Storage layout constants.

/// Top-level folder for recipe media inside the bucket.
pub const MEDIA_ROOT_DIR: &str = "recipes";

/// File stem of every stored media object (`media.<ext>`).
pub const MEDIA_FILE_STEM: &str = "media";

/// Bucket used when none is configured.
pub const DEFAULT_BUCKET: &str = "media";

/// Validity window of signed URLs when none is configured.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

/// Extensions accepted for recipe attachments (lower case).
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "pdf"];
