//! File-backed record stores.
//!
//! Records are stored as JSON files in a sharded directory structure:
//!
//! ```text
//! <data_dir>/<kind>/<s1>/<s2>/<uuid>/<record>.json
//! ```
//!
//! where `s1`/`s2` are the first four hex characters of the record UUID in
//! simple form (32 lowercase hex characters, no hyphens). Sharding keeps
//! per-directory fan-out bounded as record counts grow.
//!
//! Each record is one file, written whole; the stores rely on the filesystem
//! for per-record atomicity and hold no in-process shared mutable state.

pub mod diagnoses;
pub mod users;

use crate::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Returns `parent/<s1>/<s2>/<uuid>/` for the given record id.
pub(crate) fn record_dir(parent: &Path, id: Uuid) -> PathBuf {
    let simple = id.simple().to_string();
    parent.join(&simple[0..2]).join(&simple[2..4]).join(&simple)
}

/// Reads and deserializes one record file.
pub(crate) fn read_record<T: DeserializeOwned>(path: &Path) -> CoreResult<T> {
    let contents = fs::read_to_string(path).map_err(CoreError::FileRead)?;
    serde_json::from_str(&contents).map_err(CoreError::Deserialization)
}

/// Serializes and writes one record file, creating parent directories.
pub(crate) fn write_record<T: serde::Serialize>(path: &Path, record: &T) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(CoreError::StorageDirCreation)?;
    }
    let json = serde_json::to_string_pretty(record).map_err(CoreError::Serialization)?;
    fs::write(path, json).map_err(CoreError::FileWrite)
}

/// Walks the sharded structure under `parent` and deserializes every
/// `file_name` found.
///
/// Records that cannot be read or parsed are logged as warnings and skipped,
/// so one corrupt file does not take down a listing. A missing `parent`
/// yields an empty result.
pub(crate) fn scan_records<T: DeserializeOwned>(parent: &Path, file_name: &str) -> Vec<T> {
    let mut records = Vec::new();

    let s1_iter = match fs::read_dir(parent) {
        Ok(it) => it,
        Err(_) => return records,
    };
    for s1 in s1_iter.flatten() {
        if !s1.path().is_dir() {
            continue;
        }
        let s2_iter = match fs::read_dir(s1.path()) {
            Ok(it) => it,
            Err(_) => continue,
        };
        for s2 in s2_iter.flatten() {
            if !s2.path().is_dir() {
                continue;
            }
            let id_iter = match fs::read_dir(s2.path()) {
                Ok(it) => it,
                Err(_) => continue,
            };
            for id_ent in id_iter.flatten() {
                let record_path = id_ent.path().join(file_name);
                if !record_path.is_file() {
                    continue;
                }
                match read_record(&record_path) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::warn!(
                            "skipping unreadable record {}: {}",
                            record_path.display(),
                            e
                        );
                    }
                }
            }
        }
    }

    records
}
