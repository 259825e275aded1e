//! Standalone web server binary.
//!
//! ## Purpose
//! Runs the Repas web application on its own, without the workspace's `repas-run` wrapper.
//!
//! ## Intended use
//! Development and debugging of the HTTP layer, typically with `REPAS_BACKEND=memory`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("repas_web=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = repas_web::Settings::from_env()?;
    repas_web::serve(settings).await
}
