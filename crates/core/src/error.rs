//! Error types, one enum per collaborator boundary.
//!
//! Screens decide per call site whether a failure is surfaced or tolerated; these types only
//! say what went wrong.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to create data directory: {0}")]
    DataDirCreation(std::io::Error),
    #[error("file storage error: {0}")]
    Files(#[from] bewell_files::FilesError),
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong email or password. The only failure users see distinctly.
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("session token is not recognised")]
    InvalidToken,
    #[error("email is already registered")]
    AlreadyRegistered,
    #[error("failed to read credentials: {0}")]
    CredentialsRead(std::io::Error),
    #[error("failed to write credentials: {0}")]
    CredentialsWrite(std::io::Error),
    #[error("failed to parse credentials: {0}")]
    CredentialsFormat(serde_yaml::Error),
    #[error("auth state lock poisoned")]
    LockPoisoned,
    #[error("auth service unavailable: {0}")]
    Unavailable(String),
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read record: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write record: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_yaml::Error),
    #[error("failed to deserialize record {}: {source}", .path.display())]
    Deserialization {
        path: std::path::PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid record id: {0}")]
    InvalidId(String),
    #[error("referenced record does not exist: {0}")]
    MissingReference(String),
    #[error("record store lock poisoned")]
    LockPoisoned,
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error(transparent)]
    Files(#[from] bewell_files::FilesError),
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

pub type BlobResult<T> = std::result::Result<T, BlobError>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown session")]
    UnknownSession,
    #[error("session lock poisoned")]
    LockPoisoned,
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
