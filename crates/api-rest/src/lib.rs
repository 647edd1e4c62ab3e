//! # API REST
//!
//! REST API implementation for the triage backend.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, error-to-status
//!   mapping)
//!
//! Domain behaviour lives in `triage-core`; this crate is the HTTP skin.

#![warn(rust_2018_idioms)]

pub mod auth;
pub mod error;
pub mod handlers;

use axum::routing::{delete, get, post, put};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use triage_core::config::{
    predict_args_from_env_value, predict_timeout_from_env_value, signing_secret_from_env_value,
    token_ttl_from_env_value,
};
use triage_core::CoreConfig;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::signup,
        handlers::login,
        handlers::patient_dashboard,
        handlers::doctor_dashboard,
        handlers::admin_dashboard,
        handlers::list_symptoms,
        handlers::diagnose,
        handlers::list_diagnoses,
        handlers::list_patients,
        handlers::comment_diagnosis,
        handlers::list_users,
        handlers::update_user,
        handlers::delete_user,
    ),
    components(schemas(
        handlers::HealthRes,
        handlers::SignupReq,
        handlers::LoginReq,
        handlers::AuthRes,
        handlers::UserView,
        handlers::DashboardRes,
        handlers::SymptomsRes,
        handlers::DiagnoseReq,
        handlers::DiagnoseRes,
        handlers::DiagnosisView,
        handlers::DiagnosesRes,
        handlers::PatientsRes,
        handlers::CommentReq,
        handlers::UsersRes,
        handlers::UpdateUserReq,
        handlers::AckRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router: all API routes, the Swagger UI, and
/// a permissive CORS layer.
///
/// `/auth` is an alias for `/login` kept for older clients.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/auth", post(handlers::login))
        .route("/patient/index.html", get(handlers::patient_dashboard))
        .route("/doctor/index.html", get(handlers::doctor_dashboard))
        .route("/admin/index.html", get(handlers::admin_dashboard))
        .route("/api/symptoms", get(handlers::list_symptoms))
        .route("/diagnose", post(handlers::diagnose))
        .route("/doctor/diagnoses", get(handlers::list_diagnoses))
        .route("/doctor/patients", get(handlers::list_patients))
        .route("/doctor/comment", post(handlers::comment_diagnosis))
        .route("/admin/users", get(handlers::list_users))
        .route("/admin/users/:id", put(handlers::update_user))
        .route("/admin/users/:id", delete(handlers::delete_user))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolves the core configuration from the process environment.
///
/// Read once at startup; request handlers never touch the environment.
///
/// # Environment Variables
/// - `TRIAGE_DATA_DIR`: storage root, must already exist
/// - `TRIAGE_JWT_SECRET`: token signing secret, required and non-blank
/// - `TRIAGE_TOKEN_TTL_SECS`: token lifetime, default 3600
/// - `TRIAGE_PREDICT_BIN`: prediction engine executable, required
/// - `TRIAGE_PREDICT_ARGS`: optional leading engine arguments
/// - `TRIAGE_PREDICT_TIMEOUT_SECS`: engine timeout, default 8
///
/// # Errors
/// Fails fast on a missing data directory, a missing or blank signing
/// secret, a missing engine path, or unparseable numeric values.
pub fn load_config_from_env() -> anyhow::Result<CoreConfig> {
    let data_dir = std::env::var("TRIAGE_DATA_DIR")
        .map_err(|_| anyhow::anyhow!("TRIAGE_DATA_DIR is not set"))?;
    let data_path = PathBuf::from(&data_dir);
    if !data_path.is_dir() {
        anyhow::bail!("Data directory does not exist: {}", data_path.display());
    }

    let signing_secret = signing_secret_from_env_value(std::env::var("TRIAGE_JWT_SECRET").ok())?;
    let token_ttl_secs = token_ttl_from_env_value(std::env::var("TRIAGE_TOKEN_TTL_SECS").ok())?;

    let predict_bin = std::env::var("TRIAGE_PREDICT_BIN")
        .map_err(|_| anyhow::anyhow!("TRIAGE_PREDICT_BIN is not set"))?;
    let predict_args = predict_args_from_env_value(std::env::var("TRIAGE_PREDICT_ARGS").ok());
    let predict_timeout =
        predict_timeout_from_env_value(std::env::var("TRIAGE_PREDICT_TIMEOUT_SECS").ok())?;

    Ok(CoreConfig::new(
        data_path,
        signing_secret,
        token_ttl_secs,
        PathBuf::from(predict_bin),
        predict_args,
        predict_timeout,
    )?)
}
