//! Recipe creation and listing.
//!
//! Creating a recipe is a two-step publish: the optional attachment is uploaded to
//! `recipes/{id}/media.{ext}` first, then the record is inserted with the path of whatever was
//! uploaded. The two steps are not atomic. When the upload fails the record is still inserted,
//! without a media path, and the upload error is reported alongside the created recipe.
//!
//! Listing re-queries the store on every call and mints fresh signed URLs for each attachment.
//! A URL that cannot be minted is simply left out of the view.

use crate::backend::Backend;
use crate::config::CoreConfig;
use crate::constants::RECIPES_TABLE;
use crate::repositories::{Direction, Query};
use crate::session::Notice;
use crate::{RepasError, RepasResult};
use repas_files::{detect_content_type, FilesError, MediaKind, MediaPath, UploadReceipt};
use repas_types::NonEmptyText;
use repas_uuid::RecipeId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A row of the `recipes` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<String>,
    /// Set by the store; never sent on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Recipe {
    fn new(id: RecipeId, name: NonEmptyText) -> Self {
        Self {
            id,
            name,
            image_path: None,
            pdf_path: None,
            created_at: None,
        }
    }
}

/// A file attached to the creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// What the creation form submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRecipe {
    pub name: String,
    pub file: Option<UploadedFile>,
}

#[derive(Debug, Clone)]
pub enum CreateOutcome {
    /// The record was inserted.
    Created {
        recipe: Recipe,
        receipt: Option<UploadReceipt>,
        upload_error: Option<String>,
    },
    /// No backend is configured; nothing was stored.
    Simulated {
        recipe: Recipe,
        upload_error: Option<String>,
    },
}

impl CreateOutcome {
    pub fn recipe(&self) -> &Recipe {
        match self {
            CreateOutcome::Created { recipe, .. } | CreateOutcome::Simulated { recipe, .. } => {
                recipe
            }
        }
    }

    pub fn upload_error(&self) -> Option<&str> {
        match self {
            CreateOutcome::Created { upload_error, .. }
            | CreateOutcome::Simulated { upload_error, .. } => upload_error.as_deref(),
        }
    }

    /// Messages to show the user, upload problems first.
    pub fn notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if let Some(err) = self.upload_error() {
            notices.push(Notice::error(format!("Erreur upload: {}", err)));
        }
        match self {
            CreateOutcome::Created { .. } => notices.push(Notice::success("Recette créée")),
            CreateOutcome::Simulated { .. } => {
                notices.push(Notice::info("Recette simulée (Supabase non configuré)."))
            }
        }
        notices
    }
}

/// A `recipes` row as read back from the store.
///
/// Reads are lenient: rows written by other clients may carry any id and any name, and every
/// row is still listed.
#[derive(Debug, Clone, Deserialize)]
struct StoredRecipe {
    #[serde(deserialize_with = "scalar_text")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    image_path: Option<String>,
    #[serde(default)]
    pdf_path: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

/// Accepts a string or a number, as stores may type the id column either way.
fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {}",
            other
        ))),
    }
}

/// A recipe ready for display, with freshly signed links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeView {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub pdf_url: Option<String>,
    pub created_at: Option<String>,
}

/// `(id, name)` pair offered by the planning picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeChoice {
    #[serde(deserialize_with = "scalar_text")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct RecipeService {
    cfg: Arc<CoreConfig>,
    backend: Backend,
}

impl RecipeService {
    pub fn new(cfg: Arc<CoreConfig>, backend: Backend) -> Self {
        Self { cfg, backend }
    }

    /// Creates a recipe, uploading its attachment first when there is one.
    ///
    /// # Errors
    ///
    /// - [`RepasError::InvalidInput`] if the name is blank; nothing is uploaded or inserted.
    /// - [`RepasError::UnsupportedExtension`] if the attachment is not png/jpg/jpeg/pdf.
    /// - [`RepasError::Insert`] if the store rejects the record. The attachment, if any, stays
    ///   uploaded.
    ///
    /// Upload failures are not errors: they are reported in the outcome.
    pub async fn create(&self, form: NewRecipe) -> RepasResult<CreateOutcome> {
        let name = NonEmptyText::new(&form.name)
            .map_err(|_| RepasError::InvalidInput("recipe name cannot be empty".into()))?;
        let id = RecipeId::new();
        let mut recipe = Recipe::new(id, name);
        let mut receipt = None;
        let mut upload_error = None;

        if let Some(file) = form.file.filter(|f| !f.filename.trim().is_empty()) {
            let path = MediaPath::new(&id, &file.filename).map_err(|e| match e {
                FilesError::UnsupportedExtension(ext) => RepasError::UnsupportedExtension(ext),
                other => RepasError::Upload(other),
            })?;
            let content_type = detect_content_type(&file.bytes, path.extension());

            match self.backend.upload(&path, file.bytes, content_type).await {
                Ok(r) => {
                    tracing::info!(
                        "stored {} ({} bytes, sha256 {})",
                        r.path,
                        r.size_bytes,
                        r.sha256
                    );
                    match path.kind() {
                        MediaKind::Pdf => recipe.pdf_path = Some(path.as_str().to_string()),
                        MediaKind::Image => recipe.image_path = Some(path.as_str().to_string()),
                    }
                    receipt = Some(r);
                }
                Err(e) => {
                    tracing::warn!("upload of {} failed, creating recipe without it: {}", path, e);
                    upload_error = Some(e.to_string());
                }
            }
        }

        if !self.backend.is_configured() {
            tracing::info!("simulated creation of recipe {}", recipe.id);
            return Ok(CreateOutcome::Simulated {
                recipe,
                upload_error,
            });
        }

        let record = serde_json::to_value(&recipe).map_err(RepasError::Serialization)?;
        self.backend.insert(RECIPES_TABLE, record).await?;
        tracing::info!("created recipe {} ({})", recipe.id, recipe.name);

        Ok(CreateOutcome::Created {
            recipe,
            receipt,
            upload_error,
        })
    }

    /// Every recipe, newest first, with signed links for their attachments.
    pub async fn list(&self) -> RepasResult<Vec<RecipeView>> {
        let query = Query::table(RECIPES_TABLE).order_by("created_at", Direction::Descending);
        let rows = self.backend.query(&query).await?;
        let ttl = self.cfg.signed_url_ttl();

        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            let recipe = match serde_json::from_value::<StoredRecipe>(row) {
                Ok(recipe) => recipe,
                Err(e) => {
                    tracing::warn!("skipping unreadable recipe row: {}", e);
                    continue;
                }
            };

            let image_url = match &recipe.image_path {
                Some(path) => self.backend.signed_url(path, ttl).await,
                None => None,
            };
            let pdf_url = match &recipe.pdf_path {
                Some(path) => self.backend.signed_url(path, ttl).await,
                None => None,
            };

            views.push(RecipeView {
                id: recipe.id,
                name: recipe.name,
                image_url,
                pdf_url,
                created_at: recipe.created_at,
            });
        }
        Ok(views)
    }

    /// `(id, name)` of every recipe, for the planning picker.
    pub async fn choices(&self) -> RepasResult<Vec<RecipeChoice>> {
        let query = Query::table(RECIPES_TABLE).select(&["id", "name"]);
        let rows = self.backend.query(&query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<RecipeChoice>(row) {
                Ok(choice) => Some(choice),
                Err(e) => {
                    tracing::warn!("skipping unreadable recipe choice: {}", e);
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendMode;
    use crate::repositories::{MemoryStore, RowStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use repas_files::{FilesResult, MemoryStorage, StorageGateway};
    use serde_json::Value;
    use std::time::Duration;

    struct Fixture {
        service: RecipeService,
        store: Arc<MemoryStore>,
        storage: Arc<MemoryStorage>,
    }

    fn cfg() -> Arc<CoreConfig> {
        Arc::new(CoreConfig::with_defaults(BackendMode::Memory, None))
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(MemoryStorage::new("media"));
        let backend = Backend::connected(store.clone(), storage.clone());
        Fixture {
            service: RecipeService::new(cfg(), backend),
            store,
            storage,
        }
    }

    fn form(name: &str, file: Option<(&str, &[u8])>) -> NewRecipe {
        NewRecipe {
            name: name.to_string(),
            file: file.map(|(filename, bytes)| UploadedFile {
                filename: filename.to_string(),
                bytes: bytes.to_vec(),
            }),
        }
    }

    /// Storage that refuses every upload.
    struct BrokenStorage;

    #[async_trait]
    impl StorageGateway for BrokenStorage {
        fn bucket(&self) -> &str {
            "media"
        }

        async fn upload(
            &self,
            _path: &MediaPath,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> FilesResult<UploadReceipt> {
            Err(FilesError::Backend {
                status: 413,
                message: "Payload too large".into(),
            })
        }

        async fn signed_url(&self, _path: &str, _ttl: Duration) -> FilesResult<String> {
            Err(FilesError::UnexpectedResponse("{}".into()))
        }
    }

    /// Store that refuses every insert and answers queries with fixed rows.
    struct ReadOnlyStore(Vec<Value>);

    #[async_trait]
    impl RowStore for ReadOnlyStore {
        async fn insert(&self, _table: &str, _record: Value) -> StoreResult<()> {
            Err(StoreError::Backend {
                status: 401,
                message: "Invalid API key".into(),
            })
        }

        async fn query(&self, _query: &Query) -> StoreResult<Vec<Value>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_create_without_file() {
        let f = fixture();
        let outcome = f.service.create(form("Soup", None)).await.unwrap();

        let recipe = outcome.recipe();
        assert_eq!(recipe.name.as_str(), "Soup");
        assert!(recipe.image_path.is_none());
        assert!(recipe.pdf_path.is_none());
        assert!(matches!(outcome, CreateOutcome::Created { .. }));

        let rows = f.store.rows(RECIPES_TABLE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], recipe.id.to_string());
        assert!(rows[0].get("image_path").is_none());
        assert!(rows[0].get("pdf_path").is_none());
        assert!(f.storage.is_empty());
    }

    #[tokio::test]
    async fn test_each_creation_gets_a_fresh_id() {
        let f = fixture();
        let a = f.service.create(form("A", None)).await.unwrap();
        let b = f.service.create(form("A", None)).await.unwrap();
        assert_ne!(a.recipe().id, b.recipe().id);
        assert_eq!(f.store.row_count(RECIPES_TABLE), 2);
    }

    #[tokio::test]
    async fn test_blank_name_inserts_nothing() {
        let f = fixture();
        for name in ["", "   "] {
            let result = f.service.create(form(name, Some(("a.png", b"x")))).await;
            assert!(matches!(result, Err(RepasError::InvalidInput(_))));
        }
        assert_eq!(f.store.row_count(RECIPES_TABLE), 0);
        assert!(f.storage.is_empty());
    }

    #[tokio::test]
    async fn test_uppercase_pdf_sets_pdf_path() {
        let f = fixture();
        let outcome = f
            .service
            .create(form("Cake", Some(("cake.PDF", b"%PDF-1.4 cake"))))
            .await
            .unwrap();

        let recipe = outcome.recipe();
        let expected = format!("recipes/{}/media.pdf", recipe.id);
        assert_eq!(recipe.pdf_path.as_deref(), Some(expected.as_str()));
        assert!(recipe.image_path.is_none());
        assert_eq!(f.storage.get(&expected), Some(b"%PDF-1.4 cake".to_vec()));
        assert_eq!(
            f.storage.content_type(&expected).as_deref(),
            Some("application/pdf")
        );

        let rows = f.store.rows(RECIPES_TABLE);
        assert_eq!(rows[0]["pdf_path"], expected);
    }

    #[tokio::test]
    async fn test_image_extensions_set_image_path() {
        let f = fixture();
        for filename in ["a.png", "b.jpg", "c.JPEG"] {
            let outcome = f
                .service
                .create(form("Photo", Some((filename, b"img"))))
                .await
                .unwrap();
            let recipe = outcome.recipe();
            assert!(recipe.image_path.is_some(), "{} should be an image", filename);
            assert!(recipe.pdf_path.is_none());
        }
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_rejected_before_upload() {
        let f = fixture();
        let result = f
            .service
            .create(form("Notes", Some(("notes.txt", b"hello"))))
            .await;
        assert!(matches!(result, Err(RepasError::UnsupportedExtension(ext)) if ext == "txt"));
        assert_eq!(f.store.row_count(RECIPES_TABLE), 0);
        assert!(f.storage.is_empty());
    }

    #[tokio::test]
    async fn test_empty_filename_means_no_file() {
        let f = fixture();
        let outcome = f
            .service
            .create(form("Soup", Some(("", b""))))
            .await
            .unwrap();
        assert!(outcome.recipe().image_path.is_none());
        assert!(outcome.upload_error().is_none());
    }

    #[tokio::test]
    async fn test_upload_failure_still_inserts_record() {
        let store = Arc::new(MemoryStore::new());
        let backend = Backend::connected(store.clone(), Arc::new(BrokenStorage));
        let service = RecipeService::new(cfg(), backend);

        let outcome = service
            .create(form("Tarte", Some(("tarte.jpg", b"img"))))
            .await
            .unwrap();

        assert!(matches!(outcome, CreateOutcome::Created { .. }));
        assert!(outcome.upload_error().unwrap().contains("Payload too large"));
        assert!(outcome.recipe().image_path.is_none());
        assert_eq!(store.row_count(RECIPES_TABLE), 1);

        let notices = outcome.notices();
        assert_eq!(notices.len(), 2);
        assert!(notices[0].message.starts_with("Erreur upload:"));
        assert_eq!(notices[1], Notice::success("Recette créée"));
    }

    #[tokio::test]
    async fn test_insert_failure_is_surfaced() {
        let backend = Backend::connected(
            Arc::new(ReadOnlyStore(vec![])),
            Arc::new(MemoryStorage::new("media")),
        );
        let service = RecipeService::new(cfg(), backend);

        let result = service.create(form("Soup", None)).await;
        match result {
            Err(RepasError::Insert { table, .. }) => assert_eq!(table, RECIPES_TABLE),
            other => panic!("expected insert error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_creation_is_simulated() {
        let service = RecipeService::new(cfg(), Backend::Unconfigured);

        let outcome = service.create(form("Pasta", None)).await.unwrap();
        assert!(matches!(outcome, CreateOutcome::Simulated { .. }));
        assert_eq!(
            outcome.notices(),
            vec![Notice::info("Recette simulée (Supabase non configuré).")]
        );
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_creation_with_file_reports_upload_error() {
        let service = RecipeService::new(cfg(), Backend::Unconfigured);
        let outcome = service
            .create(form("Pasta", Some(("pasta.png", b"img"))))
            .await
            .unwrap();
        assert_eq!(outcome.upload_error(), Some("Supabase non configuré"));
        assert_eq!(outcome.notices().len(), 2);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_signed_links() {
        let f = fixture();
        f.service.create(form("Soup", None)).await.unwrap();
        f.service
            .create(form("Cake", Some(("cake.pdf", b"%PDF"))))
            .await
            .unwrap();
        f.service
            .create(form("Salad", Some(("salad.png", b"img"))))
            .await
            .unwrap();

        let views = f.service.list().await.unwrap();
        let names: Vec<&str> = views.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Salad", "Cake", "Soup"]);

        assert!(views[0].image_url.as_deref().unwrap().starts_with("memory://media/recipes/"));
        assert!(views[0].pdf_url.is_none());
        assert!(views[1].pdf_url.as_deref().unwrap().ends_with("?expires_in=3600"));
        assert!(views[1].image_url.is_none());
        assert!(views[2].image_url.is_none() && views[2].pdf_url.is_none());
    }

    #[tokio::test]
    async fn test_list_is_stable_without_writes() {
        let f = fixture();
        for name in ["A", "B", "C"] {
            f.service.create(form(name, None)).await.unwrap();
        }
        let first = f.service.list().await.unwrap();
        let second = f.service.list().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_list_omits_links_that_cannot_be_signed() {
        let rows = vec![serde_json::json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "name": "Cake",
            "pdf_path": "recipes/550e8400-e29b-41d4-a716-446655440000/media.pdf",
            "created_at": "2025-01-01T00:00:00Z"
        })];
        let backend = Backend::connected(Arc::new(ReadOnlyStore(rows)), Arc::new(BrokenStorage));
        let service = RecipeService::new(cfg(), backend);

        let views = service.list().await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "Cake");
        assert!(views[0].pdf_url.is_none());
    }

    #[tokio::test]
    async fn test_list_shows_rows_written_by_other_clients() {
        let store = Arc::new(MemoryStore::new());
        let rows = [
            serde_json::json!({ "id": "42", "name": "Gratin" }),
            serde_json::json!({ "id": "550e8400-e29b-41d4-a716-446655440000", "name": "  " }),
            serde_json::json!({ "id": 7, "name": "Quiche" }),
        ];
        for row in rows {
            store.insert(RECIPES_TABLE, row).await.unwrap();
        }
        let backend = Backend::connected(store.clone(), Arc::new(MemoryStorage::new("media")));
        let service = RecipeService::new(cfg(), backend);
        service.create(form("Soup", None)).await.unwrap();

        let views = service.list().await.unwrap();
        let choices = service.choices().await.unwrap();
        assert_eq!(views.len(), store.row_count(RECIPES_TABLE));
        assert_eq!(views.len(), choices.len());

        let ids: Vec<&str> = views.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids[1..], ["7", "550e8400-e29b-41d4-a716-446655440000", "42"]);
        assert_eq!(views[0].name, "Soup");
        assert_eq!(views[2].name, "  ");
    }

    #[tokio::test]
    async fn test_list_skips_rows_without_an_id() {
        let rows = vec![
            serde_json::json!({ "name": "No id" }),
            serde_json::json!({ "id": null, "name": "Null id" }),
            serde_json::json!({ "id": "r1", "name": "Ok" }),
        ];
        let backend = Backend::connected(
            Arc::new(ReadOnlyStore(rows)),
            Arc::new(MemoryStorage::new("media")),
        );
        let service = RecipeService::new(cfg(), backend);

        let views = service.list().await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "Ok");
    }

    #[tokio::test]
    async fn test_choices_project_id_and_name() {
        let f = fixture();
        let created = f.service.create(form("Soup", None)).await.unwrap();

        let choices = f.service.choices().await.unwrap();
        assert_eq!(
            choices,
            vec![RecipeChoice {
                id: created.recipe().id.to_string(),
                name: "Soup".into(),
            }]
        );
    }
}
