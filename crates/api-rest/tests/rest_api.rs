//! End-to-end tests for the REST API, driving the full router in-process.

use api_rest::{router, AppState};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use triage_core::{CoreConfig, SigningSecret};

fn write_engine(dir: &Path, body: &str) -> PathBuf {
    let script = dir.join("predict.sh");
    fs::write(&script, format!("#!/bin/sh\n{body}\n")).expect("should write script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
            .expect("should chmod script");
    }
    script
}

/// Builds a router over a fresh store with an engine that answers `flu`.
fn test_app(temp_dir: &TempDir) -> Router {
    let engine = write_engine(temp_dir.path(), "echo flu");
    let cfg = Arc::new(
        CoreConfig::new(
            temp_dir.path().to_path_buf(),
            SigningSecret::new("rest-api-test-secret").unwrap(),
            3_600,
            engine,
            vec![],
            Duration::from_secs(5),
        )
        .expect("CoreConfig::new should succeed"),
    );
    router(AppState { cfg })
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Registers an account through the API and returns its token and id.
async fn signup(app: &Router, username: &str, email: &str, role: &str) -> (String, String) {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/signup",
            None,
            Some(json!({
                "username": username,
                "email": email,
                "password": "hunter2!",
                "role": role,
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_health_is_open() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir);

    let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn test_signup_issues_token_and_redirect() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/signup",
            None,
            Some(json!({
                "username": "ada",
                "email": "Ada@Example.com",
                "password": "hunter2!",
                "role": "patient",
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["role"], json!("patient"));
    assert_eq!(body["redirectTo"], json!("/patient/index.html"));
    // Email is normalised and the hash never leaves the server.
    assert_eq!(body["user"]["email"], json!("ada@example.com"));
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_signup_rejects_duplicates_and_bad_roles() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir);

    signup(&app, "ada", "ada@example.com", "patient").await;

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/signup",
            None,
            Some(json!({
                "username": "ada2",
                "email": "ADA@example.com",
                "password": "hunter2!",
                "role": "doctor",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/signup",
            None,
            Some(json!({
                "username": "bob",
                "email": "bob@example.com",
                "password": "hunter2!",
                "role": "superuser",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_and_auth_alias() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir);

    signup(&app, "ada", "ada@example.com", "patient").await;

    for path in ["/login", "/auth"] {
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                path,
                None,
                Some(json!({ "email": "ada@example.com", "password": "hunter2!" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{path} should authenticate");
        assert_eq!(body["redirectTo"], json!("/patient/index.html"));
    }

    // Wrong password and unknown email produce the same response shape.
    for (email, password) in [
        ("ada@example.com", "wrong"),
        ("nobody@example.com", "hunter2!"),
    ] {
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/login",
                None,
                Some(json!({ "email": email, "password": password })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("invalid credentials"));
    }
}

#[tokio::test]
async fn test_symptom_vocabulary_is_public() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir);

    let (status, body) = send(&app, request(Method::GET, "/api/symptoms", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let symptoms = body["symptoms"].as_array().unwrap();
    assert!(symptoms.contains(&json!("fever")));
    assert!(symptoms.contains(&json!("cough")));
}

#[tokio::test]
async fn test_dashboards_are_role_gated() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir);

    let (patient_token, _) = signup(&app, "ada", "ada@example.com", "patient").await;

    let (status, _) = send(
        &app,
        request(Method::GET, "/patient/index.html", Some(&patient_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request(Method::GET, "/doctor/index.html", Some(&patient_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, request(Method::GET, "/patient/index.html", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        request(Method::GET, "/patient/index.html", Some("garbage"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_diagnose_requires_patient_role() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir);

    let (doctor_token, _) = signup(&app, "greg", "greg@example.com", "doctor").await;

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/diagnose",
            Some(&doctor_token),
            Some(json!({ "symptoms": ["fever"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/diagnose",
            None,
            Some(json!({ "symptoms": ["fever"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_diagnose_and_doctor_review_flow() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir);

    let (patient_token, _) = signup(&app, "ada", "ada@example.com", "patient").await;
    let (doctor_token, _) = signup(&app, "greg", "greg@example.com", "doctor").await;

    // Empty symptom set is rejected before the engine runs.
    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/diagnose",
            Some(&patient_token),
            Some(json!({ "symptoms": ["  ", ""] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/diagnose",
            Some(&patient_token),
            Some(json!({ "symptoms": ["fever", "cough"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["diagnosis"], json!("flu"));
    let diagnosis_id = body["diagnosisId"].as_str().unwrap().to_string();

    // The doctor sees the record joined with the owner's public view.
    let (status, body) = send(
        &app,
        request(Method::GET, "/doctor/diagnoses", Some(&doctor_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let diagnoses = body["diagnoses"].as_array().unwrap();
    assert_eq!(diagnoses.len(), 1);
    assert_eq!(diagnoses[0]["disease"], json!("flu"));
    assert_eq!(diagnoses[0]["patient"]["username"], json!("ada"));

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/doctor/comment",
            Some(&doctor_token),
            Some(json!({ "diagnosisId": diagnosis_id, "comment": "rest and fluids" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        request(Method::GET, "/doctor/diagnoses", Some(&doctor_token), None),
    )
    .await;
    assert_eq!(
        body["diagnoses"][0]["doctorComments"],
        json!("rest and fluids")
    );

    // Unknown diagnosis id is a 404, not a silent ack.
    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/doctor/comment",
            Some(&doctor_token),
            Some(json!({
                "diagnosisId": "00000000-0000-0000-0000-000000000000",
                "comment": "lost"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Patients cannot reach the doctor views.
    let (status, _) = send(
        &app,
        request(Method::GET, "/doctor/diagnoses", Some(&patient_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_doctor_patient_listing() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir);

    signup(&app, "ada", "ada@example.com", "patient").await;
    let (doctor_token, _) = signup(&app, "greg", "greg@example.com", "doctor").await;

    let (status, body) = send(
        &app,
        request(Method::GET, "/doctor/patients", Some(&doctor_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let patients = body["patients"].as_array().unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0]["username"], json!("ada"));
}

#[tokio::test]
async fn test_admin_user_management() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir);

    let (patient_token, patient_id) = signup(&app, "ada", "ada@example.com", "patient").await;
    let (admin_token, _) = signup(&app, "root", "root@example.com", "admin").await;

    let (status, body) = send(
        &app,
        request(Method::GET, "/admin/users", Some(&admin_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);

    // Promote the patient. Their old token now opens doctor routes and no
    // longer opens patient routes: the gate trusts the store, not the token.
    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            &format!("/admin/users/{patient_id}"),
            Some(&admin_token),
            Some(json!({ "role": "doctor" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], json!("doctor"));

    let (status, _) = send(
        &app,
        request(Method::GET, "/doctor/index.html", Some(&patient_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request(Method::GET, "/patient/index.html", Some(&patient_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Deleting the account invalidates its still-signed token on the next
    // request.
    let (status, _) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/admin/users/{patient_id}"),
            Some(&admin_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request(Method::GET, "/doctor/index.html", Some(&patient_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/admin/users/{patient_id}"),
            Some(&admin_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Non-admins never reach the management surface.
    let (doctor_token, _) = signup(&app, "greg", "greg@example.com", "doctor").await;
    let (status, _) = send(
        &app,
        request(Method::GET, "/admin/users", Some(&doctor_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deleted_owner_renders_absent_in_doctor_view() {
    let temp_dir = TempDir::new().unwrap();
    let app = test_app(&temp_dir);

    let (patient_token, patient_id) = signup(&app, "ada", "ada@example.com", "patient").await;
    let (doctor_token, _) = signup(&app, "greg", "greg@example.com", "doctor").await;
    let (admin_token, _) = signup(&app, "root", "root@example.com", "admin").await;

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/diagnose",
            Some(&patient_token),
            Some(json!({ "symptoms": ["fever"] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/admin/users/{patient_id}"),
            Some(&admin_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The diagnosis survives its owner; the join renders no patient.
    let (status, body) = send(
        &app,
        request(Method::GET, "/doctor/diagnoses", Some(&doctor_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let diagnoses = body["diagnoses"].as_array().unwrap();
    assert_eq!(diagnoses.len(), 1);
    assert!(diagnoses[0]["patient"].is_null());
}
