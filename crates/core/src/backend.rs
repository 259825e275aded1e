//! The hosted backend as seen by the workflows.
//!
//! [`Backend`] bundles the table store and the media storage gateway, or records that neither
//! is available. Unconfigured reads come back empty and unconfigured writes fail with a typed
//! error the workflows turn into a "simulated" notice, so nothing here is ever fatal.

use crate::config::{BackendMode, CoreConfig};
use crate::repositories::{MemoryStore, Query, RestStore, RowStore};
use crate::{RepasError, RepasResult};
use repas_files::{MediaPath, MemoryStorage, StorageGateway, SupabaseStorage, UploadReceipt};
use repas_types::BackendCredentials;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub enum Backend {
    /// No credentials: writes are skipped, reads are empty.
    Unconfigured,
    Connected {
        store: Arc<dyn RowStore>,
        storage: Arc<dyn StorageGateway>,
    },
}

impl Backend {
    pub fn connected(store: Arc<dyn RowStore>, storage: Arc<dyn StorageGateway>) -> Self {
        Backend::Connected { store, storage }
    }

    /// Supabase tables and storage sharing one HTTP client.
    pub fn supabase(credentials: BackendCredentials, bucket: &str) -> Self {
        let client = reqwest::Client::new();
        Backend::connected(
            Arc::new(RestStore::new(client.clone(), credentials.clone())),
            Arc::new(SupabaseStorage::new(client, credentials, bucket)),
        )
    }

    pub fn in_memory(bucket: &str) -> Self {
        Backend::connected(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStorage::new(bucket)),
        )
    }

    /// Picks the backend described by `cfg`.
    pub fn from_config(cfg: &CoreConfig) -> Self {
        match (cfg.backend_mode(), cfg.credentials()) {
            (BackendMode::Memory, _) => {
                tracing::info!("using in-memory backend, data is lost on restart");
                Backend::in_memory(cfg.media_bucket())
            }
            (BackendMode::Supabase, Some(credentials)) => {
                tracing::info!("using Supabase backend at {}", credentials.base_url());
                Backend::supabase(credentials.clone(), cfg.media_bucket())
            }
            (BackendMode::Supabase, None) => {
                tracing::warn!("backend not configured, writes will be simulated");
                Backend::Unconfigured
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Backend::Connected { .. })
    }

    pub fn mode_label(&self) -> &'static str {
        match self {
            Backend::Unconfigured => "unconfigured",
            Backend::Connected { .. } => "connected",
        }
    }

    pub async fn insert(&self, table: &str, record: Value) -> RepasResult<()> {
        let Backend::Connected { store, .. } = self else {
            return Err(RepasError::ConfigurationMissing);
        };
        store
            .insert(table, record)
            .await
            .map_err(|source| RepasError::Insert {
                table: table.to_string(),
                source,
            })
    }

    /// Rows matching `query`; always empty when unconfigured.
    pub async fn query(&self, query: &Query) -> RepasResult<Vec<Value>> {
        let Backend::Connected { store, .. } = self else {
            return Ok(Vec::new());
        };
        store
            .query(query)
            .await
            .map_err(|source| RepasError::Query {
                table: query.table_name().to_string(),
                source,
            })
    }

    pub async fn upload(
        &self,
        path: &MediaPath,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> RepasResult<UploadReceipt> {
        let Backend::Connected { storage, .. } = self else {
            return Err(RepasError::StorageUnavailable);
        };
        storage
            .upload(path, bytes, content_type)
            .await
            .map_err(RepasError::Upload)
    }

    /// A signed URL for `path`, or `None` if one cannot be minted right now.
    pub async fn signed_url(&self, path: &str, ttl: Duration) -> Option<String> {
        let Backend::Connected { storage, .. } = self else {
            return None;
        };
        match storage.signed_url(path, ttl).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("could not sign {}: {}", path, e);
                None
            }
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Unconfigured => f.write_str("Backend::Unconfigured"),
            Backend::Connected { storage, .. } => f
                .debug_struct("Backend::Connected")
                .field("bucket", &storage.bucket())
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RECIPES_TABLE;
    use repas_uuid::RecipeId;
    use serde_json::json;

    #[tokio::test]
    async fn test_unconfigured_reads_are_empty_and_writes_fail() {
        let backend = Backend::Unconfigured;
        assert!(!backend.is_configured());

        let rows = backend.query(&Query::table(RECIPES_TABLE)).await.unwrap();
        assert!(rows.is_empty());

        let insert = backend.insert(RECIPES_TABLE, json!({"name": "x"})).await;
        assert!(matches!(insert, Err(RepasError::ConfigurationMissing)));

        let path = MediaPath::new(&RecipeId::new(), "a.png").unwrap();
        let upload = backend.upload(&path, vec![1], "image/png").await;
        assert!(matches!(upload, Err(RepasError::StorageUnavailable)));

        assert!(backend
            .signed_url(path.as_str(), Duration::from_secs(1))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_signed_url_failure_is_none() {
        let backend = Backend::in_memory("media");
        let url = backend
            .signed_url("recipes/missing/media.png", Duration::from_secs(60))
            .await;
        assert!(url.is_none());
    }

    #[test]
    fn test_from_config() {
        let memory = CoreConfig::with_defaults(BackendMode::Memory, None);
        assert!(Backend::from_config(&memory).is_configured());

        let missing = CoreConfig::with_defaults(BackendMode::Supabase, None);
        assert_eq!(Backend::from_config(&missing).mode_label(), "unconfigured");

        let creds = BackendCredentials::new("https://abc.supabase.co", "key").unwrap();
        let supabase = CoreConfig::with_defaults(BackendMode::Supabase, Some(creds));
        let backend = Backend::from_config(&supabase);
        assert!(backend.is_configured());
        assert!(format!("{:?}", backend).contains("media"));
    }
}
