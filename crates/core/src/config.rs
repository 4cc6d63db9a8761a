//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Request
//! handling never reads environment variables; the `*_from_env_value` helpers take the raw
//! `Option<String>` so they can be exercised without touching the process environment.

use crate::constants::{
    AUTH_DIR_NAME, CASES_DIR_NAME, CHILDREN_DIR_NAME, CREDENTIALS_FILENAME,
    DEFAULT_RECENT_CASES_LIMIT, MAX_RECENT_CASES_LIMIT, USERS_DIR_NAME,
};
use crate::{CoreError, CoreResult};
use bewell_files::BLOBS_DIR_NAME;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    public_base_url: String,
    recent_cases_limit: usize,
    allow_unscoped_children: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the public base URL is not an `http(s)` URL or the
    /// recent-cases limit is outside `1..=MAX_RECENT_CASES_LIMIT`.
    pub fn new(
        data_dir: PathBuf,
        public_base_url: String,
        recent_cases_limit: usize,
        allow_unscoped_children: bool,
    ) -> CoreResult<Self> {
        let public_base_url = public_base_url.trim().trim_end_matches('/').to_string();
        if !(public_base_url.starts_with("http://") || public_base_url.starts_with("https://")) {
            return Err(CoreError::InvalidInput(
                "public base URL must start with http:// or https://".into(),
            ));
        }

        if !(1..=MAX_RECENT_CASES_LIMIT).contains(&recent_cases_limit) {
            return Err(CoreError::InvalidInput(format!(
                "recent cases limit must be between 1 and {MAX_RECENT_CASES_LIMIT}"
            )));
        }

        Ok(Self {
            data_dir,
            public_base_url,
            recent_cases_limit,
            allow_unscoped_children,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn users_dir(&self) -> PathBuf {
        self.data_dir.join(USERS_DIR_NAME)
    }

    pub fn children_dir(&self) -> PathBuf {
        self.data_dir.join(CHILDREN_DIR_NAME)
    }

    pub fn cases_dir(&self) -> PathBuf {
        self.data_dir.join(CASES_DIR_NAME)
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join(BLOBS_DIR_NAME)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join(AUTH_DIR_NAME).join(CREDENTIALS_FILENAME)
    }

    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    pub fn recent_cases_limit(&self) -> usize {
        self.recent_cases_limit
    }

    /// Whether symptom entry may fall back to listing every child.
    pub fn allow_unscoped_children(&self) -> bool {
        self.allow_unscoped_children
    }
}

/// Parse the recent-cases limit from an optional string value.
///
/// `None` or blank yields the default of 20.
pub fn recent_cases_limit_from_env_value(value: Option<String>) -> CoreResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_RECENT_CASES_LIMIT),
        Some(v) => v.parse::<usize>().map_err(|_| {
            CoreError::InvalidInput(format!("recent cases limit is not a number: '{v}'"))
        }),
    }
}

/// Parse a boolean flag from an optional string value.
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off` in any case. `None` or blank yields
/// `default`.
pub fn flag_from_env_value(value: Option<String>, default: bool) -> CoreResult<bool> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(other) => Err(CoreError::InvalidInput(format!(
            "expected a boolean flag, got '{other}'"
        ))),
    }
}
