//! Input validation utilities.
//!
//! Everything here runs before any collaborator call. Errors carry a message suitable for
//! showing to the user as-is.

use crate::constants::{ACCEPTED_PHOTO_CONTENT_TYPES, ACCEPTED_PHOTO_EXTENSIONS, MAX_PHOTO_BYTES};
use crate::{CoreError, CoreResult};
use api_shared::PhotoUpload;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;

/// A photo that passed validation and is ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPhoto {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Reduces an uploaded filename to a single safe path segment.
///
/// Directory components are dropped, characters outside `[A-Za-z0-9._-]` become `_`, leading
/// dots are removed and the result is bounded to 100 characters. An unusable name becomes
/// `photo`.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX_FILENAME_LEN: usize = 100;

    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    let cleaned: String = cleaned.chars().take(MAX_FILENAME_LEN).collect();

    if cleaned.chars().all(|c| c == '_' || c == '.') {
        "photo".to_string()
    } else {
        cleaned
    }
}

/// Checks the declared type, the filename extension and the base64 payload of a photo.
///
/// # Errors
///
/// Returns `CoreError::InvalidInput` if the photo is not PNG/JPEG, is not valid base64, is
/// empty, or is larger than the upload limit.
pub fn validate_photo(photo: &PhotoUpload) -> CoreResult<ValidatedPhoto> {
    let content_type = photo.content_type.trim().to_ascii_lowercase();
    if !ACCEPTED_PHOTO_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(CoreError::InvalidInput(
            "Photos must be PNG or JPEG images.".into(),
        ));
    }

    let filename = sanitize_filename(&photo.filename);
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ACCEPTED_PHOTO_EXTENSIONS.contains(&extension.as_str()) {
        return Err(CoreError::InvalidInput(
            "Photos must have a .png, .jpg or .jpeg file name.".into(),
        ));
    }

    let bytes = STANDARD
        .decode(photo.data_base64.trim())
        .map_err(|_| CoreError::InvalidInput("The photo could not be read.".into()))?;

    if bytes.is_empty() {
        return Err(CoreError::InvalidInput("The photo is empty.".into()));
    }

    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(CoreError::InvalidInput(format!(
            "Photos must be smaller than {} MB.",
            MAX_PHOTO_BYTES / (1024 * 1024)
        )));
    }

    Ok(ValidatedPhoto {
        filename,
        content_type,
        bytes,
    })
}

/// Parses a `YYYY-MM-DD` symptom date. Absent or blank input yields `today`.
///
/// # Errors
///
/// Returns `CoreError::InvalidInput` if the value is not a calendar date.
pub fn parse_symptom_date(input: Option<&str>, today: NaiveDate) -> CoreResult<NaiveDate> {
    match input.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(today),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            CoreError::InvalidInput("Please enter the symptom date as YYYY-MM-DD.".into())
        }),
    }
}

/// The user-facing message of a validation error.
pub fn user_message(err: &CoreError) -> String {
    match err {
        CoreError::InvalidInput(message) => message.clone(),
        other => other.to_string(),
    }
}
