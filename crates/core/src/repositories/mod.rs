//! Local collaborator implementations.
//!
//! These back the gateway traits with plain files under the data directory so the service runs
//! without any hosted backend:
//!
//! - [`FileRecordStore`]: YAML records in sharded directories
//! - [`LocalAuthGateway`]: salted password hashes plus in-memory tokens
//! - [`bewell_files::FilesService`]: photos under `blobs/`

mod blobs;
mod credentials;
mod helpers;
mod records;

pub use credentials::LocalAuthGateway;
pub use records::FileRecordStore;

use crate::error::{CoreError, CoreResult};
use crate::router::Services;
use crate::CoreConfig;
use bewell_files::FilesService;
use std::sync::Arc;

/// The three local collaborators opened against one data directory.
#[derive(Clone)]
pub struct LocalBackend {
    pub cfg: Arc<CoreConfig>,
    pub auth: Arc<LocalAuthGateway>,
    pub records: Arc<FileRecordStore>,
    pub files: Arc<FilesService>,
}

impl LocalBackend {
    /// Creates the data directory layout if needed and opens every collaborator.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if a directory cannot be created or the blob root is unusable.
    pub fn open(cfg: CoreConfig) -> CoreResult<Self> {
        let blobs_dir = cfg.blobs_dir();
        std::fs::create_dir_all(&blobs_dir).map_err(CoreError::DataDirCreation)?;

        let records = FileRecordStore::open(&cfg)?;
        let auth = LocalAuthGateway::open(&cfg.credentials_path());
        let files = FilesService::new(&blobs_dir, cfg.public_base_url())?;

        Ok(Self {
            cfg: Arc::new(cfg),
            auth: Arc::new(auth),
            records: Arc::new(records),
            files: Arc::new(files),
        })
    }

    pub fn services(&self) -> Services {
        Services {
            auth: self.auth.clone(),
            records: self.records.clone(),
            blobs: self.files.clone(),
            cfg: self.cfg.clone(),
        }
    }
}
