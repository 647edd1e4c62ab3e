//! The prediction invoker.
//!
//! Runs the external prediction engine as an isolated subprocess, bounded by
//! a configurable timeout, and persists a [`Diagnosis`] only after the
//! engine's output has been validated. The engine is treated as an opaque,
//! potentially slow and fallible collaborator: its failures never leave a
//! partially written record behind.
//!
//! The symptom set is passed to the engine as one discrete argv element.
//! There is no shell anywhere in this path, so symptom names cannot be
//! interpreted as command syntax.

use crate::auth::AuthContext;
use crate::config::CoreConfig;
use crate::constants::{MAX_DISEASE_LEN, SYMPTOM_VOCABULARY};
use crate::repositories::diagnoses::{Diagnosis, DiagnosisService};
use crate::role::Role;
use crate::{CoreError, CoreResult};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

/// Invokes the external prediction engine and persists the result.
#[derive(Clone, Debug)]
pub struct PredictionInvoker {
    cfg: Arc<CoreConfig>,
}

impl PredictionInvoker {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Runs a prediction for an authenticated patient and stores the result.
    ///
    /// Preconditions are checked before any subprocess or store I/O: the
    /// context must carry the patient role and the symptom set must be
    /// non-empty after normalisation.
    ///
    /// # Errors
    ///
    /// - `CoreError::Forbidden` — context is not patient-role
    /// - `CoreError::InvalidInput` — symptom set empty after normalisation
    /// - `CoreError::PredictionFailure` — spawn error, non-zero exit, or
    ///   timeout; nothing persisted
    /// - `CoreError::PredictionFormatError` — empty or oversized engine
    ///   output; nothing persisted
    /// - `CoreError::Persistence` — the store write failed after the engine
    ///   already succeeded
    pub async fn predict(
        &self,
        ctx: &AuthContext,
        symptoms: &[String],
    ) -> CoreResult<Diagnosis> {
        if ctx.role != Role::Patient {
            return Err(CoreError::Forbidden);
        }
        let symptoms = normalise_symptoms(symptoms)?;

        let disease = self.invoke_engine(&symptoms).await?;

        let diagnosis = Diagnosis::new(ctx.subject_id, symptoms, disease);
        DiagnosisService::new(self.cfg.clone())
            .insert(&diagnosis)
            .map_err(|e| CoreError::Persistence(Box::new(e)))?;

        tracing::info!(
            diagnosis_id = %diagnosis.id,
            user_id = %diagnosis.user_id,
            "stored new diagnosis"
        );
        Ok(diagnosis)
    }

    /// Spawns the engine with the symptom set and returns its validated
    /// disease label.
    async fn invoke_engine(&self, symptoms: &[String]) -> CoreResult<String> {
        let mut cmd = Command::new(self.cfg.predict_bin());
        cmd.args(self.cfg.predict_args())
            // One discrete argument, never interpolated into a shell string.
            .arg(symptoms.join(","))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the child (timeout path below, or process teardown)
            // kills the engine rather than leaking it.
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            CoreError::PredictionFailure(format!(
                "failed to spawn prediction engine {}: {e}",
                self.cfg.predict_bin().display()
            ))
        })?;

        let timeout = self.cfg.predict_timeout();
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CoreError::PredictionFailure(format!(
                    "failed waiting for prediction engine: {e}"
                )))
            }
            Err(_) => {
                // The dropped future drops the child, and kill_on_drop
                // terminates the engine process.
                return Err(CoreError::PredictionFailure(format!(
                    "prediction engine timed out after {}s",
                    timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, %stderr, "prediction engine failed");
            return Err(CoreError::PredictionFailure(format!(
                "prediction engine exited with status {}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let disease = stdout.trim();
        if disease.is_empty() {
            return Err(CoreError::PredictionFormatError(
                "engine produced no output".into(),
            ));
        }
        if disease.len() > MAX_DISEASE_LEN {
            return Err(CoreError::PredictionFormatError(format!(
                "engine output exceeds {MAX_DISEASE_LEN} bytes"
            )));
        }

        Ok(disease.to_string())
    }
}

/// Trims symptom names, drops blank entries, and rejects an empty result.
///
/// Unknown symptoms are tolerated: the engine is the source of truth on what
/// it can interpret, so out-of-vocabulary names are only logged.
fn normalise_symptoms(symptoms: &[String]) -> CoreResult<Vec<String>> {
    let cleaned: Vec<String> = symptoms
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if cleaned.is_empty() {
        return Err(CoreError::InvalidInput(
            "symptom set cannot be empty".into(),
        ));
    }

    for symptom in &cleaned {
        if !SYMPTOM_VOCABULARY.contains(&symptom.as_str()) {
            tracing::debug!(%symptom, "symptom outside known vocabulary");
        }
    }

    Ok(cleaned)
}
