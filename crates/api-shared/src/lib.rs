//! # API Shared
//!
//! Wire-level definitions for the Be Well API.
//!
//! Contains:
//! - Request/response DTOs (`dto` module): actions, screen views, notices
//! - Shared services like `HealthService`
//! - Session header parsing (`auth` module)
//!
//! Used by `bewell-core` (screens render into these views) and `api-rest`.

pub mod auth;
pub mod dto;
pub mod health;

pub use health::HealthService;
pub use dto::*;
