use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Repas application
///
/// Loads `.env`, resolves configuration from the environment and serves the web application
/// (pages, JSON API and Swagger UI) on one address.
///
/// # Environment Variables
/// - `REPAS_ADDR`: listen address (default: "0.0.0.0:3000")
/// - `REPAS_BACKEND`: `supabase` (default) or `memory`
/// - `SUPABASE_URL`, `SUPABASE_SERVICE_ROLE_KEY`: backend credentials, also read from
///   `REPAS_SECRETS_DIR` (default: "/run/secrets")
/// - `REPAS_MEDIA_BUCKET`, `REPAS_SIGNED_URL_TTL`, `REPAS_WEEK_LABEL`, `REPAS_MAX_UPLOAD_BYTES`
///
/// Missing credentials are not fatal: the application starts and simulates writes.
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a configuration value is present but malformed,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("repas=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = repas_web::Settings::from_env()?;
    tracing::info!(
        "backend mode {}, bucket {}, week {}",
        settings.core.backend_mode(),
        settings.core.media_bucket(),
        settings.core.week_label()
    );

    repas_web::serve(settings).await
}
