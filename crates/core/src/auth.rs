//! The authorization gate.
//!
//! Every protected request passes through [`AuthGate::authorize`] before its
//! handler runs. The gate performs a two-source check: the token proves the
//! credential was issued by this process, and a fresh credential-store lookup
//! supplies the role actually used for admission. A role change or account
//! deletion therefore takes effect on the *next* request, even while the old
//! token remains cryptographically valid until expiry.

use crate::config::CoreConfig;
use crate::repositories::users::UserService;
use crate::role::Role;
use crate::token::TokenService;
use crate::{CoreError, CoreResult};
use std::sync::Arc;
use uuid::Uuid;

/// The resolved, request-scoped identity used to authorize one request.
///
/// Ephemeral: built per request from a verified token plus a fresh identity
/// lookup, never persisted. `role` is the identity's current role, not the
/// role embedded in the token.
#[derive(Clone, Copy, Debug)]
pub struct AuthContext {
    pub subject_id: Uuid,
    pub role: Role,
}

/// Middleware-equivalent admission check for inbound requests.
#[derive(Clone, Debug)]
pub struct AuthGate {
    cfg: Arc<CoreConfig>,
}

impl AuthGate {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Admits or rejects a request given its raw `Authorization` header
    /// value.
    ///
    /// An empty `allowed` slice admits any authenticated identity.
    ///
    /// # Errors
    ///
    /// - `CoreError::AccessDenied` — header missing, not `Bearer <token>`,
    ///   or the token part is empty
    /// - `CoreError::InvalidToken` — bad signature, malformed, or expired
    /// - `CoreError::UserNotFound` — token subject no longer exists
    /// - `CoreError::Forbidden` — identity's current role is not allowed
    pub fn authorize(
        &self,
        header_value: Option<&str>,
        allowed: &[Role],
    ) -> CoreResult<AuthContext> {
        let raw_token = bearer_token(header_value)?;

        let claims = TokenService::new(self.cfg.clone()).verify(raw_token)?;

        // Re-resolve the identity rather than trusting the role claim: roles
        // can change after issuance.
        let identity = UserService::new(self.cfg.clone()).find_by_id(claims.sub)?;

        if !allowed.is_empty() && !allowed.contains(&identity.role) {
            return Err(CoreError::Forbidden);
        }

        Ok(AuthContext {
            subject_id: identity.id,
            role: identity.role,
        })
    }
}

/// Extracts the token from a `Bearer <token>` header value.
fn bearer_token(header_value: Option<&str>) -> CoreResult<&str> {
    let header = header_value.ok_or(CoreError::AccessDenied)?;
    let token = header.strip_prefix("Bearer ").ok_or(CoreError::AccessDenied)?;
    let token = token.trim();
    if token.is_empty() {
        return Err(CoreError::AccessDenied);
    }
    Ok(token)
}
