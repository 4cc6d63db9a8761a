//! Record identifiers and sharded-path utilities.
//!
//! Every record reference is an opaque string wrapped in its own newtype so a `ChildId` can
//! never be passed where a `CaseId` is expected. Identifiers this service allocates are
//! *canonical*: 32 lowercase hex characters, the `simple` form of a v4 UUID.
//!
//! ## Sharded directory layout
//! For a canonical id `u`, the local record store writes to:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>.yaml`
//!
//! Example:
//! `bewell_data/cases/55/0e/550e8400e29b41d4a716446655440000.yaml`

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Allocates a fresh canonical identifier.
            pub fn generate() -> Self {
                Self(generate_canonical())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

record_id!(
    /// Authenticated identity; the same value keys the user's profile.
    UserId
);
record_id!(
    /// Child profile reference.
    ChildId
);
record_id!(
    /// Case report reference.
    CaseId
);
record_id!(
    /// Daycare centre (organisation) reference.
    CentreId
);

/// Generates a canonical 32-character lowercase hex identifier.
pub fn generate_canonical() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Returns true if `input` is exactly 32 lowercase hex characters.
pub fn is_canonical(input: &str) -> bool {
    input.len() == 32 && input.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Path of the record file for `id` under `parent_dir`.
///
/// # Errors
///
/// Returns `StoreError::InvalidId` if `id` is not canonical.
pub fn sharded_file(parent_dir: &Path, id: &str, extension: &str) -> StoreResult<PathBuf> {
    if !is_canonical(id) {
        return Err(StoreError::InvalidId(id.to_string()));
    }

    Ok(parent_dir
        .join(&id[0..2])
        .join(&id[2..4])
        .join(format!("{id}.{extension}")))
}
