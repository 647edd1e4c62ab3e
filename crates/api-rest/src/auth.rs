//! Request-side glue for the authorization gate.
//!
//! Handlers hand the raw `Authorization` header to the core gate and get
//! back an [`AuthContext`] or an [`ApiError`] already mapped to the right
//! status code.

use crate::error::ApiError;
use crate::AppState;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use triage_core::{AuthContext, AuthGate, Role};

/// Returns the raw `Authorization` header value, if one is present and
/// valid UTF-8.
pub fn bearer_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

impl AppState {
    /// Runs the full authorization gate for a request.
    ///
    /// # Errors
    ///
    /// Maps gate failures to 401 (missing/malformed credentials, bad
    /// token), 403 (role not allowed), or 404 (subject deleted since the
    /// token was issued).
    pub fn authorize(
        &self,
        headers: &HeaderMap,
        allowed: &[Role],
    ) -> Result<AuthContext, ApiError> {
        AuthGate::new(self.cfg.clone())
            .authorize(bearer_header(headers), allowed)
            .map_err(ApiError::from)
    }
}
