//! Validated value types shared across the Repas crates.
//!
//! Anything that crosses a crate boundary and carries an invariant lives here:
//! non-empty text, the fixed set of planning slots and the backend credentials.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input is not one of the known planning slots
    #[error("Unknown day slot: {0}")]
    UnknownSlot(String),

    /// The backend URL is not an http(s) URL
    #[error("Backend URL must start with http:// or https://, got: '{0}'")]
    InvalidUrl(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// One fixed day/meal-period cell of the weekly planning grid.
///
/// The order of [`DaySlot::ALL`] is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DaySlot {
    LundiMidi,
    LundiSoir,
    MardiMidi,
    MardiSoir,
    MercrediMidi,
    MercrediSoir,
}

impl DaySlot {
    pub const ALL: [DaySlot; 6] = [
        DaySlot::LundiMidi,
        DaySlot::LundiSoir,
        DaySlot::MardiMidi,
        DaySlot::MardiSoir,
        DaySlot::MercrediMidi,
        DaySlot::MercrediSoir,
    ];

    /// Wire label stored in the `planning.day_slot` column.
    pub fn as_str(self) -> &'static str {
        match self {
            DaySlot::LundiMidi => "lundi_midi",
            DaySlot::LundiSoir => "lundi_soir",
            DaySlot::MardiMidi => "mardi_midi",
            DaySlot::MardiSoir => "mardi_soir",
            DaySlot::MercrediMidi => "mercredi_midi",
            DaySlot::MercrediSoir => "mercredi_soir",
        }
    }

    /// Position of the slot in [`DaySlot::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DaySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DaySlot {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DaySlot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| TextError::UnknownSlot(s.to_string()))
    }
}

impl serde::Serialize for DaySlot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for DaySlot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Endpoint and privileged key for the hosted backend.
///
/// The key never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendCredentials {
    url: NonEmptyText,
    service_key: NonEmptyText,
}

impl BackendCredentials {
    /// Validates the endpoint and key.
    ///
    /// A trailing `/` on the URL is dropped so paths can be appended with `format!`.
    pub fn new(url: impl AsRef<str>, service_key: impl AsRef<str>) -> Result<Self, TextError> {
        let url = NonEmptyText::new(url.as_ref().trim().trim_end_matches('/'))?;
        if !(url.as_str().starts_with("http://") || url.as_str().starts_with("https://")) {
            return Err(TextError::InvalidUrl(url.into_string()));
        }
        let service_key = NonEmptyText::new(service_key)?;
        Ok(Self { url, service_key })
    }

    pub fn base_url(&self) -> &str {
        self.url.as_str()
    }

    pub fn service_key(&self) -> &str {
        self.service_key.as_str()
    }

    /// Headers every backend call carries.
    pub fn auth_headers(&self) -> [(&'static str, String); 2] {
        [
            ("apikey", self.service_key.as_str().to_string()),
            (
                "Authorization",
                format!("Bearer {}", self.service_key.as_str()),
            ),
        ]
    }
}

impl fmt::Debug for BackendCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendCredentials")
            .field("url", &self.url.as_str())
            .field("service_key", &"<redacted>")
            .finish()
    }
}
