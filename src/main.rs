//! Main server binary for the triage backend.
//!
//! Resolves configuration from the environment, fails fast on anything
//! missing, and serves the REST API built in `api-rest`.

use api_rest::{load_config_from_env, router, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triage_core::CoreConfig;

/// Main entry point for the triage application
///
/// Starts the REST server on the configured address (default 0.0.0.0:3000)
/// with OpenAPI/Swagger documentation mounted at `/swagger-ui`.
///
/// # Environment Variables
/// - `TRIAGE_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `TRIAGE_DATA_DIR`: Storage root for user and diagnosis records
/// - `TRIAGE_JWT_SECRET`: Token signing secret (required, no default)
/// - `TRIAGE_TOKEN_TTL_SECS`: Token lifetime in seconds (default: 3600)
/// - `TRIAGE_PREDICT_BIN`: Prediction engine executable
/// - `TRIAGE_PREDICT_ARGS`: Optional leading engine arguments
/// - `TRIAGE_PREDICT_TIMEOUT_SECS`: Engine timeout in seconds (default: 8)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("triage_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("triage_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("TRIAGE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg: Arc<CoreConfig> = Arc::new(load_config_from_env()?);
    tracing::info!(
        "-- Starting triage server on {} (data dir {})",
        addr,
        cfg.data_dir().display()
    );

    let app = router(AppState { cfg });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
