//! Request/response types and axum handlers for the triage REST API.
//!
//! Request bodies follow the camelCase convention of the JSON clients, so
//! every DTO carries `#[serde(rename_all = "camelCase")]`. Role values cross
//! the wire as plain lowercase strings and are parsed at the boundary.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path as AxumPath, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use triage_core::constants::SYMPTOM_VOCABULARY;
use triage_core::{
    password, Diagnosis, DiagnosisService, EmailAddress, Identity, NonEmptyText,
    PredictionInvoker, Role, TokenService, UserService,
};
use utoipa::ToSchema;
use uuid::Uuid;

/// Health check response.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupReq {
    pub username: String,
    pub email: String,
    pub password: String,
    /// One of `patient`, `doctor`, `admin`.
    pub role: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

/// Public view of an identity. Never carries the password hash.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for UserView {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username.as_str().to_string(),
            email: identity.email.as_str().to_string(),
            role: identity.role.as_str().to_string(),
            created_at: identity.created_at,
        }
    }
}

/// Issued on both signup and login.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthRes {
    pub token: String,
    pub role: String,
    /// Where the client should navigate next, e.g. `/patient/index.html`.
    pub redirect_to: String,
    pub user: UserView,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRes {
    pub role: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SymptomsRes {
    pub symptoms: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseReq {
    pub symptoms: Vec<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseRes {
    pub diagnosis: String,
    pub diagnosis_id: Uuid,
}

/// A diagnosis joined with a public view of its owner.
///
/// `patient` is absent when the owning identity has been deleted; the
/// record itself is kept.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisView {
    pub id: Uuid,
    pub patient: Option<UserView>,
    pub symptoms: Vec<String>,
    pub disease: String,
    pub doctor_comments: String,
    pub created_at: DateTime<Utc>,
}

impl DiagnosisView {
    fn join(diagnosis: Diagnosis, users: &UserService) -> Self {
        let patient = users.find_by_id(diagnosis.user_id).ok().map(UserView::from);
        Self {
            id: diagnosis.id,
            patient,
            symptoms: diagnosis.symptoms,
            disease: diagnosis.disease,
            doctor_comments: diagnosis.doctor_comments,
            created_at: diagnosis.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosesRes {
    pub diagnoses: Vec<DiagnosisView>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientsRes {
    pub patients: Vec<UserView>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentReq {
    pub diagnosis_id: Uuid,
    pub comment: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsersRes {
    pub users: Vec<UserView>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserReq {
    pub username: Option<String>,
    pub role: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AckRes {
    pub ok: bool,
    pub message: String,
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    Role::from_str(raw).map_err(ApiError::from)
}

fn redirect_for(role: Role) -> String {
    format!("/{role}/index.html")
}

/// Builds the shared signup/login response: a fresh token plus navigation
/// hint for the identity's current role.
fn auth_response(state: &AppState, identity: Identity) -> Result<AuthRes, ApiError> {
    let token = TokenService::new(state.cfg.clone()).issue(identity.id, identity.role)?;
    Ok(AuthRes {
        token,
        role: identity.role.as_str().to_string(),
        redirect_to: redirect_for(identity.role),
        user: UserView::from(identity),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Triage REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupReq,
    responses(
        (status = 201, description = "Account created", body = AuthRes),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Register a new account and issue a token for it
///
/// All fields are required, the role must be one of the known roles, and
/// the email must not already be registered.
///
/// # Returns
/// * `(StatusCode::CREATED, Json<AuthRes>)` - Token, role and redirect hint
/// * `Err(ApiError)` - Validation failure or storage error
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the username, email, password or role fails validation, or
/// - the email is already registered.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupReq>,
) -> Result<(StatusCode, Json<AuthRes>), ApiError> {
    let username = NonEmptyText::new(&req.username)?;
    let email = EmailAddress::parse(&req.email)?;
    let role = parse_role(&req.role)?;

    let identity = UserService::new(state.cfg.clone()).create(
        username,
        email,
        &req.password,
        role,
    )?;
    tracing::info!(user_id = %identity.id, role = %identity.role, "new account registered");

    Ok((StatusCode::CREATED, Json(auth_response(&state, identity)?)))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Authenticated", body = AuthRes),
        (status = 400, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
/// Authenticate with email and password
///
/// Unknown email and wrong password produce the same response, so the
/// endpoint leaks nothing about which accounts exist.
///
/// # Returns
/// * `Json<AuthRes>` - Token, role and redirect hint
///
/// # Errors
/// Returns `400 Bad Request` on any credential mismatch.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<AuthRes>, ApiError> {
    let email = EmailAddress::parse(&req.email)
        .map_err(|_| ApiError::from(triage_core::CoreError::InvalidCredentials))?;

    let identity = UserService::new(state.cfg.clone())
        .find_by_email(&email)?
        .ok_or_else(|| ApiError::from(triage_core::CoreError::InvalidCredentials))?;

    if !password::verify_password(&req.password, &identity.password_hash)? {
        return Err(ApiError::from(triage_core::CoreError::InvalidCredentials));
    }

    Ok(Json(auth_response(&state, identity)?))
}

#[utoipa::path(
    get,
    path = "/patient/index.html",
    responses(
        (status = 200, description = "Patient dashboard", body = DashboardRes),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Wrong role")
    )
)]
/// Patient dashboard, admitted only for patient-role identities
#[axum::debug_handler]
pub async fn patient_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardRes>, ApiError> {
    state.authorize(&headers, &[Role::Patient])?;
    Ok(Json(DashboardRes {
        role: Role::Patient.as_str().to_string(),
        message: "patient dashboard".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/doctor/index.html",
    responses(
        (status = 200, description = "Doctor dashboard", body = DashboardRes),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Wrong role")
    )
)]
/// Doctor dashboard, admitted only for doctor-role identities
#[axum::debug_handler]
pub async fn doctor_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardRes>, ApiError> {
    state.authorize(&headers, &[Role::Doctor])?;
    Ok(Json(DashboardRes {
        role: Role::Doctor.as_str().to_string(),
        message: "doctor dashboard".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/admin/index.html",
    responses(
        (status = 200, description = "Admin dashboard", body = DashboardRes),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Wrong role")
    )
)]
/// Admin dashboard, admitted only for admin-role identities
#[axum::debug_handler]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardRes>, ApiError> {
    state.authorize(&headers, &[Role::Admin])?;
    Ok(Json(DashboardRes {
        role: Role::Admin.as_str().to_string(),
        message: "admin dashboard".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/symptoms",
    responses(
        (status = 200, description = "Known symptom vocabulary", body = SymptomsRes)
    )
)]
/// List the known symptom vocabulary
///
/// Unauthenticated: clients use this to build the symptom picker before
/// login completes.
#[axum::debug_handler]
pub async fn list_symptoms(State(_state): State<AppState>) -> Json<SymptomsRes> {
    Json(SymptomsRes {
        symptoms: SYMPTOM_VOCABULARY.iter().map(|s| s.to_string()).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/diagnose",
    request_body = DiagnoseReq,
    responses(
        (status = 200, description = "Prediction stored", body = DiagnoseRes),
        (status = 400, description = "Empty symptom set"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Wrong role"),
        (status = 500, description = "Prediction engine failure")
    )
)]
/// Run a prediction for the authenticated patient
///
/// Invokes the external prediction engine with the submitted symptoms and
/// persists the resulting diagnosis under the caller's identity.
///
/// # Returns
/// * `Json<DiagnoseRes>` - The predicted disease label and the stored
///   record's id
///
/// # Errors
/// Returns `400` for an empty symptom set, `401`/`403` from the gate, and
/// `500` when the engine fails, times out, or produces invalid output.
#[axum::debug_handler]
pub async fn diagnose(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DiagnoseReq>,
) -> Result<Json<DiagnoseRes>, ApiError> {
    let ctx = state.authorize(&headers, &[Role::Patient])?;

    let diagnosis = PredictionInvoker::new(state.cfg.clone())
        .predict(&ctx, &req.symptoms)
        .await?;

    Ok(Json(DiagnoseRes {
        diagnosis: diagnosis.disease,
        diagnosis_id: diagnosis.id,
    }))
}

#[utoipa::path(
    get,
    path = "/doctor/diagnoses",
    responses(
        (status = 200, description = "All diagnoses with owner views", body = DiagnosesRes),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Wrong role")
    )
)]
/// List every stored diagnosis, joined with a public view of its owner
#[axum::debug_handler]
pub async fn list_diagnoses(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DiagnosesRes>, ApiError> {
    state.authorize(&headers, &[Role::Doctor])?;

    let users = UserService::new(state.cfg.clone());
    let diagnoses = DiagnosisService::new(state.cfg.clone())
        .list()
        .into_iter()
        .map(|d| DiagnosisView::join(d, &users))
        .collect();

    Ok(Json(DiagnosesRes { diagnoses }))
}

#[utoipa::path(
    get,
    path = "/doctor/patients",
    responses(
        (status = 200, description = "All patient-role users", body = PatientsRes),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Wrong role")
    )
)]
/// List all patient-role users
#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PatientsRes>, ApiError> {
    state.authorize(&headers, &[Role::Doctor])?;

    let patients = UserService::new(state.cfg.clone())
        .list()
        .into_iter()
        .filter(|identity| identity.role == Role::Patient)
        .map(UserView::from)
        .collect();

    Ok(Json(PatientsRes { patients }))
}

#[utoipa::path(
    post,
    path = "/doctor/comment",
    request_body = CommentReq,
    responses(
        (status = 200, description = "Comment stored", body = AckRes),
        (status = 400, description = "Empty comment"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Wrong role"),
        (status = 404, description = "Unknown diagnosis")
    )
)]
/// Attach a doctor comment to an existing diagnosis
///
/// # Errors
/// Returns `404 Not Found` when the diagnosis does not exist and
/// `400 Bad Request` for a blank comment.
#[axum::debug_handler]
pub async fn comment_diagnosis(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CommentReq>,
) -> Result<Json<AckRes>, ApiError> {
    let ctx = state.authorize(&headers, &[Role::Doctor])?;

    let comment = NonEmptyText::new(&req.comment)?;
    let diagnosis =
        DiagnosisService::new(state.cfg.clone()).set_comment(req.diagnosis_id, comment)?;
    tracing::info!(
        diagnosis_id = %diagnosis.id,
        doctor_id = %ctx.subject_id,
        "doctor comment stored"
    );

    Ok(Json(AckRes {
        ok: true,
        message: "comment stored".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All registered users", body = UsersRes),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Wrong role")
    )
)]
/// List every registered user as a public view
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UsersRes>, ApiError> {
    state.authorize(&headers, &[Role::Admin])?;

    let users = UserService::new(state.cfg.clone())
        .list()
        .into_iter()
        .map(UserView::from)
        .collect();

    Ok(Json(UsersRes { users }))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    request_body = UpdateUserReq,
    responses(
        (status = 200, description = "User updated", body = UserView),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Wrong role"),
        (status = 404, description = "Unknown user")
    )
)]
/// Update a user's username and/or role
///
/// The updated role takes effect on the target's next request: previously
/// issued tokens stay signature-valid but the gate re-resolves the role.
///
/// # Errors
/// Returns `404 Not Found` for an unknown user, `400 Bad Request` for an
/// invalid username or role value.
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<Uuid>,
    Json(req): Json<UpdateUserReq>,
) -> Result<Json<UserView>, ApiError> {
    state.authorize(&headers, &[Role::Admin])?;

    let username = req.username.map(NonEmptyText::new).transpose()?;
    let role = req.role.as_deref().map(parse_role).transpose()?;

    let identity = UserService::new(state.cfg.clone()).update(id, username, role)?;
    Ok(Json(UserView::from(identity)))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    responses(
        (status = 200, description = "User deleted", body = AckRes),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Wrong role"),
        (status = 404, description = "Unknown user")
    )
)]
/// Delete a user
///
/// The user's diagnoses are kept; doctor views render their owner as
/// absent from then on.
///
/// # Errors
/// Returns `404 Not Found` for an unknown user.
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<Uuid>,
) -> Result<Json<AckRes>, ApiError> {
    state.authorize(&headers, &[Role::Admin])?;

    UserService::new(state.cfg.clone()).delete(id)?;
    tracing::info!(user_id = %id, "user deleted");

    Ok(Json(AckRes {
        ok: true,
        message: "user deleted".into(),
    }))
}
