//! Be Well file storage
//!
//! Stores uploaded photos on the local filesystem and hands back public URLs for them.
//!
//! ## Storage model
//!
//! - Callers choose the relative path (for symptom photos: `<user>/<date>_<filename>`)
//! - Stored files are immutable; uploading to an existing path is an error
//! - Every relative path is validated before it touches the filesystem
//! - The public URL is the configured base URL joined with the relative path
//!
//! ```text
//! <data_dir>/blobs/
//! └── 4f1c…e2/
//!     └── 2024-01-05_rash.jpg
//! ```

mod constants;
mod files;

pub use constants::{BLOBS_DIR_NAME, PUBLIC_PHOTOS_PREFIX};
pub use files::{FileMetadata, FilesService, StoredFile};

/// Errors that can occur during file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory does not exist or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Path validation failed (potential directory traversal or unsafe path)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Something is already stored under this path
    #[error("File already exists at {0}")]
    FileAlreadyExists(String),

    /// Nothing is stored under this path
    #[error("File not found: {0}")]
    NotFound(String),

    /// Upload had no content
    #[error("Refusing to store an empty file")]
    EmptyFile,

    /// Declared content type does not match the sniffed bytes
    #[error("Declared content type {declared} does not match detected {detected}")]
    ContentTypeMismatch { declared: String, detected: String },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
