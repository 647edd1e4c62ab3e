//! # Triage Core
//!
//! Core business logic for the triage symptom-to-diagnosis backend.
//!
//! This crate contains the security- and state-bearing parts of the system:
//! - Role model and validated identity types
//! - Password hashing and signed bearer tokens
//! - The authorization gate (token decode + fresh role resolution)
//! - The prediction invoker (out-of-process engine with a bounded timeout)
//! - File-backed user and diagnosis stores with sharded JSON storage
//!
//! **No API concerns**: HTTP routing, DTOs, and status-code mapping belong in
//! `api-rest`.

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod password;
pub mod predict;
pub mod repositories;
pub mod role;
pub mod token;
pub mod types;

pub use auth::{AuthContext, AuthGate};
pub use config::{CoreConfig, SigningSecret};
pub use error::{CoreError, CoreResult};
pub use predict::PredictionInvoker;
pub use repositories::diagnoses::{Diagnosis, DiagnosisService};
pub use repositories::users::{Identity, UserService};
pub use role::Role;
pub use token::{Claims, TokenService};
pub use types::{EmailAddress, NonEmptyText};
