//! Constants used throughout the Be Well core crate.

/// Default directory for all local data when `BEWELL_DATA_DIR` is not set.
pub const DEFAULT_DATA_DIR: &str = "bewell_data";

/// Default base URL used to build public photo URLs.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";

/// Number of cases shown on the home screen.
pub const DEFAULT_RECENT_CASES_LIMIT: usize = 20;

/// Upper bound accepted for `BEWELL_RECENT_CASES_LIMIT`.
pub const MAX_RECENT_CASES_LIMIT: usize = 200;

/// Directory name for user profile records.
pub const USERS_DIR_NAME: &str = "users";

/// Directory name for child profile records.
pub const CHILDREN_DIR_NAME: &str = "children";

/// Directory name for case report records.
pub const CASES_DIR_NAME: &str = "cases";

/// Directory holding the local credentials file.
pub const AUTH_DIR_NAME: &str = "auth";

/// Filename for local login credentials.
pub const CREDENTIALS_FILENAME: &str = "credentials.yaml";

/// Extension for stored record documents.
pub const RECORD_EXTENSION: &str = "yaml";

/// Photo content types accepted on symptom entry.
pub const ACCEPTED_PHOTO_CONTENT_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

/// Photo file extensions accepted on symptom entry.
pub const ACCEPTED_PHOTO_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Largest photo accepted, after base64 decoding.
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Symptom text shown on the home list is cut to this many characters.
pub const SYMPTOM_EXCERPT_CHARS: usize = 80;

/// Shown wherever externally produced guidance has not arrived yet.
pub const NOT_AVAILABLE_YET: &str = "Not available yet";

/// Label used when a case refers to a child that cannot be resolved.
pub const UNKNOWN_CHILD: &str = "Unknown child";

/// Live sessions kept before the least recently used one is dropped.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// A session unused for this long is dropped.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
