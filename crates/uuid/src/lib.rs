//! Recipe identifiers.
//!
//! Recipes are identified by a UUID generated on the client at creation time, before anything
//! is uploaded, so the identifier can be embedded in the media storage path.
//!
//! ## Canonical form
//! Repas stores identifiers in the standard **hyphenated lowercase** representation:
//!
//! - Length: 36
//! - Example: `550e8400-e29b-41d4-a716-446655440000`
//!
//! This is what `Uuid::new_v4().to_string()` produces and what ends up in the `recipes.id`
//! column and in paths such as `recipes/550e8400-e29b-41d4-a716-446655440000/media.pdf`.
//!
//! Identifiers read back from the store are parsed leniently (any form `uuid` accepts) and
//! normalised to the canonical form.

mod service;

pub use service::{RecipeId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
