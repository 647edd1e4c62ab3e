#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown role: {0}")]
    InvalidRole(String),

    #[error("access denied: no bearer credential provided")]
    AccessDenied,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("failed to sign token: {0}")]
    TokenSigning(String),
    #[error("forbidden: role not allowed")]
    Forbidden,
    #[error("user not found")]
    UserNotFound,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("a user with this email already exists")]
    DuplicateUser,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("diagnosis not found")]
    DiagnosisNotFound,
    #[error("prediction engine failed: {0}")]
    PredictionFailure(String),
    #[error("prediction engine produced unusable output: {0}")]
    PredictionFormatError(String),
    #[error("failed to persist diagnosis after successful prediction: {0}")]
    Persistence(#[source] Box<CoreError>),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete record: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
