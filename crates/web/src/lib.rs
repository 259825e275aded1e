//! # Repas Web
//!
//! HTTP surface for Repas.
//!
//! Handles:
//! - Server-rendered pages and the form posts that drive them
//! - Per-browser sessions keyed by the `repas_session` cookie
//! - A small JSON API with OpenAPI/Swagger documentation
//!
//! Business rules live in `repas-core`; this crate only translates between HTTP and the
//! workflows.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod pages;
pub mod routes;
pub mod sessions;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use repas_core::{
    config::{
        backend_mode_from_env_value, resolve_credentials, signed_url_ttl_from_env_value,
        text_from_env_value,
    },
    constants::{
        DEFAULT_BUCKET, DEFAULT_SECRETS_DIR, DEFAULT_WEEK_LABEL, SUPABASE_KEY_KEY, SUPABASE_URL_KEY,
    },
    Backend, BackendMode, CoreConfig, PlanningService, RecipeService,
};
use sessions::SessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::WebError;

/// Listen address when `REPAS_ADDR` is unset.
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Request body limit when `REPAS_MAX_UPLOAD_BYTES` is unset (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Everything the server needs, resolved once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    pub addr: String,
    pub max_upload_bytes: usize,
    pub core: CoreConfig,
}

impl Settings {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but malformed. Missing backend credentials are not
    /// an error: the server then runs unconfigured.
    pub fn from_env() -> anyhow::Result<Self> {
        let backend_mode = backend_mode_from_env_value(std::env::var("REPAS_BACKEND").ok())?;

        let credentials = match backend_mode {
            BackendMode::Supabase => {
                let secrets_dir = std::env::var("REPAS_SECRETS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_SECRETS_DIR));
                resolve_credentials(
                    std::env::var(SUPABASE_URL_KEY).ok(),
                    std::env::var(SUPABASE_KEY_KEY).ok(),
                    &secrets_dir,
                )?
            }
            BackendMode::Memory => None,
        };

        let core = CoreConfig::new(
            backend_mode,
            credentials,
            text_from_env_value(std::env::var("REPAS_MEDIA_BUCKET").ok(), DEFAULT_BUCKET),
            signed_url_ttl_from_env_value(std::env::var("REPAS_SIGNED_URL_TTL").ok())?,
            text_from_env_value(std::env::var("REPAS_WEEK_LABEL").ok(), DEFAULT_WEEK_LABEL),
        )?;

        let max_upload_bytes = match std::env::var("REPAS_MAX_UPLOAD_BYTES") {
            Ok(value) => value.trim().parse().map_err(|_| {
                anyhow::anyhow!("REPAS_MAX_UPLOAD_BYTES is not a byte count: '{}'", value)
            })?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            addr: std::env::var("REPAS_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.into()),
            max_upload_bytes,
            core,
        })
    }
}

/// Application state shared across request handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    backend: Backend,
    recipes: RecipeService,
    planning: PlanningService,
    sessions: SessionStore,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, backend: Backend) -> Self {
        Self {
            recipes: RecipeService::new(cfg.clone(), backend.clone()),
            planning: PlanningService::new(cfg, backend.clone()),
            backend,
            sessions: SessionStore::new(),
        }
    }

    pub fn from_config(cfg: CoreConfig) -> Self {
        let backend = Backend::from_config(&cfg);
        Self::new(Arc::new(cfg), backend)
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn recipes(&self) -> &RecipeService {
        &self.recipes
    }

    pub fn planning(&self) -> &PlanningService {
        &self.planning
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(routes::health, routes::list_recipes, routes::list_planning),
    components(schemas(routes::HealthRes, routes::RecipeRes, routes::PlanningRes))
)]
pub struct ApiDoc;

/// Builds the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/navigate", post(routes::navigate))
        .route("/recipes", post(routes::create_recipe))
        .route("/planning/:slot/assign", post(routes::begin_assign))
        .route("/planning/:slot/confirm", post(routes::confirm_assign))
        .route("/health", get(routes::health))
        .route("/api/recipes", get(routes::list_recipes))
        .route("/api/planning", get(routes::list_planning))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `settings.addr` and serves until the process stops.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let state = AppState::from_config(settings.core);
    let app = router(state, settings.max_upload_bytes);

    tracing::info!("-- Starting Repas on {}", settings.addr);
    let listener = tokio::net::TcpListener::bind(&settings.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
