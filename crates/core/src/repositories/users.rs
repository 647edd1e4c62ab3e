//! The credential store: user identities with hashed passwords and roles.
//!
//! Identities are created at signup and mutated only through admin-privileged
//! update/delete. Email uniqueness is enforced on the normalised address.
//! The password hash never leaves this crate in an API-facing shape; the REST
//! layer builds its own public view.

use crate::config::CoreConfig;
use crate::constants::{USERS_DIR_NAME, USER_FILE_NAME};
use crate::password;
use crate::repositories::{read_record, record_dir, scan_records, write_record};
use crate::role::Role;
use crate::types::{EmailAddress, NonEmptyText};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// A stored user identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: NonEmptyText,
    pub email: EmailAddress,
    /// Argon2id hash in PHC string format. Never the raw password.
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Service for credential-store operations.
#[derive(Clone, Debug)]
pub struct UserService {
    cfg: Arc<CoreConfig>,
}

impl UserService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    fn users_dir(&self) -> PathBuf {
        self.cfg.data_dir().join(USERS_DIR_NAME)
    }

    fn record_path(&self, id: Uuid) -> PathBuf {
        record_dir(&self.users_dir(), id).join(USER_FILE_NAME)
    }

    /// Creates a new identity with a freshly hashed password.
    ///
    /// The role is fixed here: there is no self-service path to change it
    /// later, only the admin-privileged [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` for an empty password,
    /// `CoreError::DuplicateUser` when the email is already registered, and
    /// storage errors when the record cannot be written.
    pub fn create(
        &self,
        username: NonEmptyText,
        email: EmailAddress,
        raw_password: &str,
        role: Role,
    ) -> CoreResult<Identity> {
        if raw_password.trim().is_empty() {
            return Err(CoreError::InvalidInput("password cannot be empty".into()));
        }
        if self.find_by_email(&email)?.is_some() {
            return Err(CoreError::DuplicateUser);
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash: password::hash_password(raw_password)?,
            role,
            created_at: Utc::now(),
        };

        write_record(&self.record_path(identity.id), &identity)?;
        Ok(identity)
    }

    /// Looks up an identity by id.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UserNotFound` when no record exists.
    pub fn find_by_id(&self, id: Uuid) -> CoreResult<Identity> {
        let path = self.record_path(id);
        if !path.is_file() {
            return Err(CoreError::UserNotFound);
        }
        read_record(&path)
    }

    /// Looks up an identity by normalised email, scanning the sharded store.
    pub fn find_by_email(&self, email: &EmailAddress) -> CoreResult<Option<Identity>> {
        Ok(self.list().into_iter().find(|user| &user.email == email))
    }

    /// Lists all identities. Unreadable records are warned and skipped.
    pub fn list(&self) -> Vec<Identity> {
        scan_records(&self.users_dir(), USER_FILE_NAME)
    }

    /// Applies an admin-privileged update to username and/or role.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UserNotFound` when no record exists.
    pub fn update(
        &self,
        id: Uuid,
        username: Option<NonEmptyText>,
        role: Option<Role>,
    ) -> CoreResult<Identity> {
        let mut identity = self.find_by_id(id)?;

        if let Some(username) = username {
            identity.username = username;
        }
        if let Some(role) = role {
            identity.role = role;
        }

        write_record(&self.record_path(id), &identity)?;
        Ok(identity)
    }

    /// Deletes an identity.
    ///
    /// Diagnosis records referencing the deleted user are left in place with
    /// a dangling `user_id`; readers treat the owner as absent.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UserNotFound` when no record exists.
    pub fn delete(&self, id: Uuid) -> CoreResult<()> {
        let dir = record_dir(&self.users_dir(), id);
        if !dir.join(USER_FILE_NAME).is_file() {
            return Err(CoreError::UserNotFound);
        }
        fs::remove_dir_all(&dir).map_err(CoreError::FileDelete)
    }
}
