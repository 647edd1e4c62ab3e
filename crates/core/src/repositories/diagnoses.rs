//! The diagnosis store.
//!
//! Diagnosis records are created exclusively by the prediction invoker after
//! a successful, validated engine run. They reference their owning identity
//! weakly by id: deleting a user leaves its diagnoses in place and readers
//! render the owner as absent. This core never deletes a diagnosis.

use crate::config::CoreConfig;
use crate::constants::{DIAGNOSES_DIR_NAME, DIAGNOSIS_FILE_NAME};
use crate::repositories::{read_record, record_dir, scan_records, write_record};
use crate::types::NonEmptyText;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// A stored diagnosis record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: Uuid,
    /// Weak reference to the owning identity.
    pub user_id: Uuid,
    /// Snapshot of the submitted symptom set.
    pub symptoms: Vec<String>,
    /// Validated disease label from the prediction engine.
    pub disease: String,
    #[serde(default)]
    pub doctor_comments: String,
    pub created_at: DateTime<Utc>,
}

impl Diagnosis {
    /// Builds a new record with a fresh id and empty comments.
    pub fn new(user_id: Uuid, symptoms: Vec<String>, disease: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            symptoms,
            disease,
            doctor_comments: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// Service for diagnosis-store operations.
#[derive(Clone, Debug)]
pub struct DiagnosisService {
    cfg: Arc<CoreConfig>,
}

impl DiagnosisService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    fn diagnoses_dir(&self) -> PathBuf {
        self.cfg.data_dir().join(DIAGNOSES_DIR_NAME)
    }

    fn record_path(&self, id: Uuid) -> PathBuf {
        record_dir(&self.diagnoses_dir(), id).join(DIAGNOSIS_FILE_NAME)
    }

    /// Persists a new diagnosis record. Independent per record; no
    /// upsert-by-symptom dedup.
    pub fn insert(&self, diagnosis: &Diagnosis) -> CoreResult<()> {
        write_record(&self.record_path(diagnosis.id), diagnosis)
    }

    /// Looks up a diagnosis by id.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DiagnosisNotFound` when no record exists.
    pub fn find_by_id(&self, id: Uuid) -> CoreResult<Diagnosis> {
        let path = self.record_path(id);
        if !path.is_file() {
            return Err(CoreError::DiagnosisNotFound);
        }
        read_record(&path)
    }

    /// Lists all diagnoses. Unreadable records are warned and skipped.
    pub fn list(&self) -> Vec<Diagnosis> {
        scan_records(&self.diagnoses_dir(), DIAGNOSIS_FILE_NAME)
    }

    /// Replaces the doctor comments on an existing diagnosis.
    ///
    /// Callers must have established a doctor-role context before reaching
    /// this method.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DiagnosisNotFound` when no record exists.
    pub fn set_comment(&self, id: Uuid, comment: NonEmptyText) -> CoreResult<Diagnosis> {
        let mut diagnosis = self.find_by_id(id)?;
        diagnosis.doctor_comments = comment.as_str().to_string();
        write_record(&self.record_path(id), &diagnosis)?;
        Ok(diagnosis)
    }
}
