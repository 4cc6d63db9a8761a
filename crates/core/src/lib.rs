//! # Be Well Core
//!
//! Screen logic for the Be Well daycare symptom-report service.
//!
//! Carers log symptom reports for children, parents read the guidance attached to those reports
//! and acknowledge it. This crate holds everything between an incoming user action and the
//! screen it produces:
//! - per-session state and the screen state machine
//! - the five render routines (login, home, symptom entry, case details, acknowledge)
//! - the collaborator traits (auth, records, blobs) and local file-backed implementations
//!
//! **No API concerns**: HTTP serving and session-id transport belong in `api-rest`; wire types
//! live in `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod gateway;
pub mod ids;
pub mod records;
pub mod repositories;
pub mod router;
mod screens;
pub mod session;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use config::CoreConfig;
pub use error::{
    AuthError, AuthResult, BlobError, BlobResult, CoreError, CoreResult, SessionError,
    SessionResult, StoreError, StoreResult,
};
pub use gateway::{AuthGateway, BlobStore, RecordStore};
pub use repositories::{FileRecordStore, LocalAuthGateway, LocalBackend};
pub use router::{Router, Screen, Services};
pub use session::{Session, SessionId, SessionStore};
