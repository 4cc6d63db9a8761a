//! Filesystem blob storage service
//!
//! [`FilesService`] owns one storage root. Callers address blobs by a relative, slash-separated
//! path; the service validates that path, writes the bytes once and derives a public URL.
//!
//! # Path rules
//!
//! A relative path is accepted only if:
//! - it is non-empty and not absolute
//! - no segment is empty, `.` or `..`
//! - every character is ASCII alphanumeric or one of `-`, `_`, `.`
//!
//! These rules keep every write inside the storage root without needing to canonicalise
//! paths that do not exist yet.
//!
//! # Content checks
//!
//! Media type is sniffed from the bytes with `infer`. When both a declared and a detected
//! type exist and disagree, the upload is refused.

use crate::FilesError;
use bewell_types::NonEmptyText;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

const MAX_PATH_LEN: usize = 512;

/// Metadata for a stored file
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    /// Path relative to the storage root
    pub relative_path: NonEmptyText,

    /// Hex SHA-256 of the content
    pub sha256: String,

    /// Size of the file in bytes
    pub size_bytes: u64,

    /// Content type supplied by the uploader
    pub declared_content_type: NonEmptyText,

    /// Detected media type, if the bytes were recognised
    pub media_type: Option<NonEmptyText>,

    /// UTC timestamp when the file was stored
    pub stored_at: DateTime<Utc>,
}

/// A blob read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub bytes: Vec<u8>,
    /// Detected media type, falling back to `application/octet-stream`.
    pub media_type: String,
}

/// Service for storing and serving uploaded files
#[derive(Debug, Clone)]
pub struct FilesService {
    /// Canonicalised storage root
    root_directory: PathBuf,

    /// Base URL (no trailing slash) that public URLs are built from
    public_base_url: String,
}

impl FilesService {
    /// Creates a new `FilesService` rooted at `root_directory`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if the directory does not exist, is not a
    /// directory, or cannot be canonicalised.
    pub fn new(
        root_directory: &Path,
        public_base_url: impl Into<String>,
    ) -> Result<Self, FilesError> {
        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Not a directory: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            root_directory,
            public_base_url,
        })
    }

    /// Stores `bytes` under `relative_path`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the path fails validation
    /// - the content is empty or the declared content type is blank
    /// - the detected media type contradicts the declared one
    /// - something is already stored at that path
    /// - directory creation or the write fails
    pub fn upload(
        &self,
        relative_path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<FileMetadata, FilesError> {
        validate_relative_path(relative_path)?;

        if bytes.is_empty() {
            return Err(FilesError::EmptyFile);
        }

        let declared_content_type = NonEmptyText::new(content_type)
            .map_err(|_| FilesError::InvalidPath("content type is blank".into()))?;

        let media_type = infer::get(bytes).and_then(|kind| NonEmptyText::new(kind.mime_type()).ok());
        if let Some(detected) = &media_type {
            if !detected
                .as_str()
                .eq_ignore_ascii_case(declared_content_type.as_str())
            {
                return Err(FilesError::ContentTypeMismatch {
                    declared: declared_content_type.to_string(),
                    detected: detected.to_string(),
                });
            }
        }

        let storage_path = self.storage_path(relative_path);
        if storage_path.exists() {
            return Err(FilesError::FileAlreadyExists(relative_path.to_string()));
        }

        if let Some(parent) = storage_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create storage directory {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        fs::write(&storage_path, bytes).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write file to {}: {}", storage_path.display(), e),
            ))
        })?;

        let sha256 = hex::encode(Sha256::digest(bytes));

        Ok(FileMetadata {
            relative_path: NonEmptyText::new(relative_path)
                .map_err(|_| FilesError::InvalidPath(relative_path.to_string()))?,
            sha256,
            size_bytes: bytes.len() as u64,
            declared_content_type,
            media_type,
            stored_at: Utc::now(),
        })
    }

    /// Reads a stored file back.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidPath` for a bad path, `FilesError::NotFound` when nothing
    /// is stored there, or `FilesError::Io` if the read fails.
    pub fn read(&self, relative_path: &str) -> Result<StoredFile, FilesError> {
        validate_relative_path(relative_path)?;

        let storage_path = self.storage_path(relative_path);
        if !storage_path.is_file() {
            return Err(FilesError::NotFound(relative_path.to_string()));
        }

        let bytes = fs::read(&storage_path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read file from {}: {}", storage_path.display(), e),
            ))
        })?;
        let media_type = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Ok(StoredFile { bytes, media_type })
    }

    /// Public URL for a stored path. Does not check that the file exists.
    pub fn public_url(&self, relative_path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url,
            crate::PUBLIC_PHOTOS_PREFIX,
            relative_path
        )
    }

    fn storage_path(&self, relative_path: &str) -> PathBuf {
        relative_path
            .split('/')
            .fold(self.root_directory.clone(), |acc, segment| acc.join(segment))
    }
}

/// Checks that `relative_path` stays inside the storage root.
pub(crate) fn validate_relative_path(relative_path: &str) -> Result<(), FilesError> {
    if relative_path.is_empty() || relative_path.len() > MAX_PATH_LEN {
        return Err(FilesError::InvalidPath(format!(
            "path length must be 1..={MAX_PATH_LEN}"
        )));
    }

    if relative_path.starts_with('/') {
        return Err(FilesError::InvalidPath(format!(
            "absolute paths are not allowed: {relative_path}"
        )));
    }

    for segment in relative_path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(FilesError::InvalidPath(format!(
                "invalid path segment in {relative_path}"
            )));
        }

        let ok = segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
        if !ok {
            return Err(FilesError::InvalidPath(format!(
                "unsupported characters in {relative_path}"
            )));
        }
    }

    Ok(())
}
