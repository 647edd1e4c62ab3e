//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core
//! services as `Arc<CoreConfig>`. Request handling never reads process-wide
//! environment variables, which keeps behaviour consistent across
//! multi-threaded runtimes and test harnesses.
//!
//! The `..._from_env_value` helpers take the raw `Option<String>` a binary
//! read from the environment, so parsing and fail-fast rules are testable
//! without mutating the process environment. Note the deliberate asymmetry:
//! TTL and timeout fall back to defaults when unset, but the signing secret
//! does **not** — a missing or blank secret refuses to start the process.

use crate::constants::{DEFAULT_PREDICT_TIMEOUT_SECS, DEFAULT_TOKEN_TTL_SECS};
use crate::{CoreError, CoreResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The process-wide symmetric secret used to sign and verify tokens.
///
/// Read-only after startup. `Debug` is redacted so the secret cannot leak
/// through logs or error chains.
#[derive(Clone)]
pub struct SigningSecret(String);

impl SigningSecret {
    /// Creates a signing secret, rejecting blank input.
    pub fn new(input: impl Into<String>) -> CoreResult<Self> {
        let secret = input.into();
        if secret.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "signing secret cannot be empty".into(),
            ));
        }
        Ok(Self(secret))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    signing_secret: SigningSecret,
    token_ttl_secs: i64,
    predict_bin: PathBuf,
    predict_args: Vec<String>,
    predict_timeout: Duration,
}

impl CoreConfig {
    /// Creates a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the token TTL is not positive,
    /// the prediction timeout is zero, or the prediction engine path is empty.
    pub fn new(
        data_dir: PathBuf,
        signing_secret: SigningSecret,
        token_ttl_secs: i64,
        predict_bin: PathBuf,
        predict_args: Vec<String>,
        predict_timeout: Duration,
    ) -> CoreResult<Self> {
        if token_ttl_secs <= 0 {
            return Err(CoreError::InvalidInput(
                "token TTL must be a positive number of seconds".into(),
            ));
        }
        if predict_timeout.is_zero() {
            return Err(CoreError::InvalidInput(
                "prediction timeout must be non-zero".into(),
            ));
        }
        if predict_bin.as_os_str().is_empty() {
            return Err(CoreError::InvalidInput(
                "prediction engine path cannot be empty".into(),
            ));
        }

        Ok(Self {
            data_dir,
            signing_secret,
            token_ttl_secs,
            predict_bin,
            predict_args,
            predict_timeout,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn signing_secret(&self) -> &SigningSecret {
        &self.signing_secret
    }

    pub fn token_ttl_secs(&self) -> i64 {
        self.token_ttl_secs
    }

    pub fn predict_bin(&self) -> &Path {
        &self.predict_bin
    }

    pub fn predict_args(&self) -> &[String] {
        &self.predict_args
    }

    pub fn predict_timeout(&self) -> Duration {
        self.predict_timeout
    }
}

/// Parse the signing secret from an optional environment value.
///
/// Absence is fatal by design: running with a well-known default secret would
/// make every issued token forgeable, so the process must refuse to start
/// instead.
pub fn signing_secret_from_env_value(value: Option<String>) -> CoreResult<SigningSecret> {
    match value {
        Some(raw) => SigningSecret::new(raw),
        None => Err(CoreError::InvalidInput(
            "signing secret is not set; refusing to start without one".into(),
        )),
    }
}

/// Parse the token TTL (seconds) from an optional environment value.
///
/// `None` or blank yields the default TTL.
pub fn token_ttl_from_env_value(value: Option<String>) -> CoreResult<i64> {
    let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    match value {
        None => Ok(DEFAULT_TOKEN_TTL_SECS),
        Some(raw) => {
            let secs: i64 = raw
                .parse()
                .map_err(|_| CoreError::InvalidInput(format!("invalid token TTL: '{raw}'")))?;
            if secs <= 0 {
                return Err(CoreError::InvalidInput(
                    "token TTL must be a positive number of seconds".into(),
                ));
            }
            Ok(secs)
        }
    }
}

/// Parse the prediction timeout from an optional environment value.
///
/// `None` or blank yields the default timeout.
pub fn predict_timeout_from_env_value(value: Option<String>) -> CoreResult<Duration> {
    let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    match value {
        None => Ok(Duration::from_secs(DEFAULT_PREDICT_TIMEOUT_SECS)),
        Some(raw) => {
            let secs: u64 = raw.parse().map_err(|_| {
                CoreError::InvalidInput(format!("invalid prediction timeout: '{raw}'"))
            })?;
            if secs == 0 {
                return Err(CoreError::InvalidInput(
                    "prediction timeout must be non-zero".into(),
                ));
            }
            Ok(Duration::from_secs(secs))
        }
    }
}

/// Parse the extra leading engine arguments from an optional environment
/// value (whitespace-separated, e.g. a script path when the engine binary is
/// an interpreter).
pub fn predict_args_from_env_value(value: Option<String>) -> Vec<String> {
    value
        .map(|raw| raw.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}
