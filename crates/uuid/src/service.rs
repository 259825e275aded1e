//! [`RecipeId`] implementation.

use crate::{UuidError, UuidResult};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Identifier of a recipe, always displayed in canonical hyphenated form.
///
/// # Construction
/// - [`RecipeId::new`] generates a fresh random identifier (v4).
/// - [`RecipeId::parse`] validates an identifier coming back from the store or a form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecipeId(Uuid);

impl Default for RecipeId {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeId {
    /// Generates a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier in any form the `uuid` crate understands.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not a UUID.
    pub fn parse(input: &str) -> UuidResult<Self> {
        Uuid::parse_str(input.trim())
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("not a recipe id: '{}' ({})", input, e)))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is already in canonical hyphenated lowercase form.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 36
            && Uuid::parse_str(input)
                .map(|u| u.hyphenated().to_string() == input)
                .unwrap_or(false)
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RecipeId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecipeId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecipeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecipeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecipeId::parse(&s).map_err(serde::de::Error::custom)
    }
}
