use crate::repositories::StoreError;
use repas_files::FilesError;

#[derive(Debug, thiserror::Error)]
pub enum RepasError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read secret {name}: {source}")]
    SecretRead {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("backend not configured")]
    ConfigurationMissing,
    #[error("Supabase non configuré")]
    StorageUnavailable,
    #[error("unsupported file type: .{0} (accepted: png, jpg, jpeg, pdf)")]
    UnsupportedExtension(String),
    #[error("{0}")]
    Upload(#[source] FilesError),

    #[error("failed to insert into {table}: {source}")]
    Insert {
        table: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to query {table}: {source}")]
    Query {
        table: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
}

pub type RepasResult<T> = std::result::Result<T, RepasError>;
