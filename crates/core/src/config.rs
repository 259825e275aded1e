//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Nothing
//! in this crate reads process-wide environment variables during request handling; the helpers
//! below take the raw values the binary looked up and turn them into validated settings.

use crate::constants::{DEFAULT_WEEK_LABEL, SUPABASE_KEY_KEY, SUPABASE_URL_KEY};
use crate::{RepasError, RepasResult};
use repas_files::{DEFAULT_BUCKET, DEFAULT_SIGNED_URL_TTL_SECS};
use repas_types::{BackendCredentials, NonEmptyText};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Which backend the process talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BackendMode {
    /// The hosted backend. Falls back to unconfigured when credentials are missing.
    #[default]
    Supabase,
    /// Process-local tables and bucket, lost on restart.
    Memory,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Supabase => f.write_str("supabase"),
            BackendMode::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for BackendMode {
    type Err = RepasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(BackendMode::Supabase),
            "memory" => Ok(BackendMode::Memory),
            other => Err(RepasError::InvalidConfig(format!(
                "unknown backend '{}' (expected supabase or memory)",
                other
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    backend_mode: BackendMode,
    credentials: Option<BackendCredentials>,
    media_bucket: NonEmptyText,
    signed_url_ttl: Duration,
    week_label: NonEmptyText,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        backend_mode: BackendMode,
        credentials: Option<BackendCredentials>,
        media_bucket: NonEmptyText,
        signed_url_ttl: Duration,
        week_label: NonEmptyText,
    ) -> RepasResult<Self> {
        if signed_url_ttl.is_zero() {
            return Err(RepasError::InvalidConfig(
                "signed URL TTL must be greater than zero".into(),
            ));
        }

        Ok(Self {
            backend_mode,
            credentials,
            media_bucket,
            signed_url_ttl,
            week_label,
        })
    }

    /// Configuration with every optional setting at its default.
    pub fn with_defaults(backend_mode: BackendMode, credentials: Option<BackendCredentials>) -> Self {
        Self {
            backend_mode,
            credentials,
            media_bucket: default_text(DEFAULT_BUCKET),
            signed_url_ttl: Duration::from_secs(DEFAULT_SIGNED_URL_TTL_SECS),
            week_label: default_text(DEFAULT_WEEK_LABEL),
        }
    }

    pub fn backend_mode(&self) -> BackendMode {
        self.backend_mode
    }

    pub fn credentials(&self) -> Option<&BackendCredentials> {
        self.credentials.as_ref()
    }

    pub fn media_bucket(&self) -> &str {
        self.media_bucket.as_str()
    }

    pub fn signed_url_ttl(&self) -> Duration {
        self.signed_url_ttl
    }

    pub fn week_label(&self) -> &str {
        self.week_label.as_str()
    }
}

fn default_text(value: &'static str) -> NonEmptyText {
    NonEmptyText::new(value).expect("default constants are non-empty")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the backend mode; unset or blank means [`BackendMode::Supabase`].
pub fn backend_mode_from_env_value(value: Option<String>) -> RepasResult<BackendMode> {
    non_blank(value)
        .map(|v| v.parse::<BackendMode>())
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Parse the signed URL validity window in seconds; unset or blank means one hour.
pub fn signed_url_ttl_from_env_value(value: Option<String>) -> RepasResult<Duration> {
    let Some(value) = non_blank(value) else {
        return Ok(Duration::from_secs(DEFAULT_SIGNED_URL_TTL_SECS));
    };
    let secs: u64 = value.parse().map_err(|_| {
        RepasError::InvalidConfig(format!("signed URL TTL is not a number of seconds: '{}'", value))
    })?;
    if secs == 0 {
        return Err(RepasError::InvalidConfig(
            "signed URL TTL must be greater than zero".into(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Use `value` unless it is unset or blank.
pub fn text_from_env_value(value: Option<String>, default: &'static str) -> NonEmptyText {
    non_blank(value)
        .and_then(|v| NonEmptyText::new(v).ok())
        .unwrap_or_else(|| default_text(default))
}

/// Read `name` from the secrets directory. A missing file is `Ok(None)`.
fn read_secret(secrets_dir: &Path, name: &str) -> RepasResult<Option<String>> {
    match std::fs::read_to_string(secrets_dir.join(name)) {
        Ok(contents) => Ok(non_blank(Some(contents))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RepasError::SecretRead {
            name: name.to_string(),
            source,
        }),
    }
}

/// Resolve the backend credentials from environment values, falling back to secret files.
///
/// Returns `Ok(None)` when either value is missing: the application then runs unconfigured and
/// simulates writes. Values that are present but malformed are a configuration error.
pub fn resolve_credentials(
    url: Option<String>,
    service_key: Option<String>,
    secrets_dir: &Path,
) -> RepasResult<Option<BackendCredentials>> {
    let url = match non_blank(url) {
        Some(url) => Some(url),
        None => read_secret(secrets_dir, SUPABASE_URL_KEY)?,
    };
    let service_key = match non_blank(service_key) {
        Some(key) => Some(key),
        None => read_secret(secrets_dir, SUPABASE_KEY_KEY)?,
    };

    match (url, service_key) {
        (Some(url), Some(key)) => BackendCredentials::new(url, key)
            .map(Some)
            .map_err(|e| RepasError::InvalidConfig(e.to_string())),
        _ => {
            tracing::warn!(
                "Supabase keys manquantes. Configure {} et {} dans les secrets ou variables d'environnement.",
                SUPABASE_URL_KEY,
                SUPABASE_KEY_KEY
            );
            Ok(None)
        }
    }
}
