//! Constants used throughout the Repas core crate.

/// Table holding recipes.
pub const RECIPES_TABLE: &str = "recipes";

/// Table holding planning assignments.
pub const PLANNING_TABLE: &str = "planning";

/// Week label written on planning rows when none is configured.
pub const DEFAULT_WEEK_LABEL: &str = "default";

/// Directory searched for secret files when a variable is not in the environment.
pub const DEFAULT_SECRETS_DIR: &str = "/run/secrets";

/// Name of the backend endpoint setting.
pub const SUPABASE_URL_KEY: &str = "SUPABASE_URL";

/// Name of the privileged backend key setting.
pub const SUPABASE_KEY_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

pub use repas_files::{DEFAULT_BUCKET, DEFAULT_SIGNED_URL_TTL_SECS};
