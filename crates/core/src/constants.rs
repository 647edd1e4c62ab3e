//! Process-wide constants shared across core services.

/// Subdirectory of the data directory holding user records.
pub const USERS_DIR_NAME: &str = "users";

/// Subdirectory of the data directory holding diagnosis records.
pub const DIAGNOSES_DIR_NAME: &str = "diagnoses";

/// File name of a stored user record inside its sharded directory.
pub const USER_FILE_NAME: &str = "user.json";

/// File name of a stored diagnosis record inside its sharded directory.
pub const DIAGNOSIS_FILE_NAME: &str = "diagnosis.json";

/// Default validity window for issued bearer tokens, in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3_600;

/// Default wall-clock bound on a single prediction-engine invocation.
pub const DEFAULT_PREDICT_TIMEOUT_SECS: u64 = 8;

/// Upper bound on the engine's disease label. Output longer than this is
/// treated as malformed rather than truncated.
pub const MAX_DISEASE_LEN: usize = 100;

/// Symptom names the frontend offers for selection.
///
/// This list is advisory: submissions outside it are tolerated, since the
/// prediction engine is the source of truth on what it can interpret.
pub const SYMPTOM_VOCABULARY: &[&str] = &[
    "abdominal_pain",
    "back_pain",
    "chest_pain",
    "chills",
    "cough",
    "diarrhoea",
    "dizziness",
    "fatigue",
    "fever",
    "headache",
    "joint_pain",
    "loss_of_appetite",
    "muscle_pain",
    "nausea",
    "rash",
    "runny_nose",
    "shortness_of_breath",
    "sore_throat",
    "sweating",
    "vomiting",
];
