//! Signed, time-limited identity tokens.
//!
//! Tokens are compact HS256 JWTs (`header.claims.signature`, base64url
//! without padding) signed with the process-wide [`SigningSecret`]. The
//! service is stateless: issuing is pure computation and verification needs
//! only the secret and a clock.
//!
//! Verification deliberately does **not** handle "no token provided" — the
//! authorization gate checks the transport header before calling in here.

use crate::config::CoreConfig;
use crate::role::Role;
use crate::{CoreError, CoreResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_ALG: &str = "HS256";

/// The claims carried inside a token.
///
/// The embedded `role` records what the subject's role was at issuance. It is
/// informational only: the authorization gate re-resolves the identity on
/// every request and never trusts this field for admission decisions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identity id.
    pub sub: Uuid,
    /// Role at issuance.
    pub role: Role,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch. Strictly after `iat`.
    pub exp: i64,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Issues and verifies signed identity tokens.
#[derive(Clone, Debug)]
pub struct TokenService {
    cfg: Arc<CoreConfig>,
}

impl TokenService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Issues a token for `subject_id` with the configured validity window.
    pub fn issue(&self, subject_id: Uuid, role: Role) -> CoreResult<String> {
        self.issue_at(subject_id, role, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(&self, subject_id: Uuid, role: Role, now: DateTime<Utc>) -> CoreResult<String> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: subject_id,
            role,
            iat,
            exp: iat + self.cfg.token_ttl_secs(),
        };

        let header = Header {
            alg: TOKEN_ALG.to_string(),
            typ: "JWT".to_string(),
        };
        let header_json = serde_json::to_vec(&header).map_err(CoreError::Serialization)?;
        let claims_json = serde_json::to_vec(&claims).map_err(CoreError::Serialization)?;

        let message = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = self.sign(message.as_bytes())?;

        Ok(format!("{}.{}", message, URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Verifies a raw token against the signing secret and the current time.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidToken` when the token is malformed, the
    /// signature does not match, the algorithm is unexpected, or the token
    /// has expired. An expired token is never accepted regardless of
    /// signature validity.
    pub fn verify(&self, raw: &str) -> CoreResult<Claims> {
        self.verify_at(raw, Utc::now())
    }

    /// Verifies a raw token as if the current time were `now`.
    pub fn verify_at(&self, raw: &str, now: DateTime<Utc>) -> CoreResult<Claims> {
        let mut parts = raw.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(CoreError::InvalidToken("malformed token".into())),
            };

        // Signature first: nothing inside the token is trusted until the MAC
        // checks out. verify_slice is constant-time.
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| CoreError::InvalidToken("invalid signature encoding".into()))?;
        let message = format!("{header_b64}.{claims_b64}");
        let mut mac = self.mac()?;
        mac.update(message.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CoreError::InvalidToken("signature mismatch".into()))?;

        let header_json = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| CoreError::InvalidToken("invalid header encoding".into()))?;
        let header: Header = serde_json::from_slice(&header_json)
            .map_err(|_| CoreError::InvalidToken("invalid header".into()))?;
        if header.alg != TOKEN_ALG {
            return Err(CoreError::InvalidToken(format!(
                "unsupported algorithm: {}",
                header.alg
            )));
        }

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| CoreError::InvalidToken("invalid claims encoding".into()))?;
        let claims: Claims = serde_json::from_slice(&claims_json)
            .map_err(|_| CoreError::InvalidToken("invalid claims".into()))?;

        if now.timestamp() >= claims.exp {
            return Err(CoreError::InvalidToken("token expired".into()));
        }

        Ok(claims)
    }

    fn sign(&self, message: &[u8]) -> CoreResult<Vec<u8>> {
        let mut mac = self.mac()?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn mac(&self) -> CoreResult<HmacSha256> {
        HmacSha256::new_from_slice(self.cfg.signing_secret().as_bytes())
            .map_err(|e| CoreError::TokenSigning(e.to_string()))
    }
}
