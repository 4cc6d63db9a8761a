//! File-backed record store.
//!
//! Users, children and cases each live in their own sharded tree of YAML documents:
//!
//! ```text
//! <data_dir>/
//! ├── users/<s1>/<s2>/<user_id>.yaml
//! ├── children/<s1>/<s2>/<child_id>.yaml
//! └── cases/<s1>/<s2>/<case_id>.yaml
//! ```
//!
//! Writes are serialised through a single mutex so the guarded acknowledge update cannot race
//! with another writer in the same process.

use super::helpers::{read_all_records, read_record, write_record};
use crate::constants::RECORD_EXTENSION;
use crate::error::{StoreError, StoreResult};
use crate::gateway::{AcknowledgeOutcome, CaseQuery, ChildFilter, RecordStore};
use crate::ids::{is_canonical, sharded_file, CaseId, ChildId, UserId};
use crate::records::{
    CaseReport, CaseStatus, ChildProfile, GuidanceUpdate, NewCaseReport, UserProfile,
};
use crate::CoreConfig;
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug)]
pub struct FileRecordStore {
    users_dir: PathBuf,
    children_dir: PathBuf,
    cases_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileRecordStore {
    /// Opens the store, creating its directories if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::StorageDirCreation` if any directory cannot be created.
    pub fn open(cfg: &CoreConfig) -> StoreResult<Self> {
        let store = Self {
            users_dir: cfg.users_dir(),
            children_dir: cfg.children_dir(),
            cases_dir: cfg.cases_dir(),
            write_lock: Mutex::new(()),
        };

        for dir in [&store.users_dir, &store.children_dir, &store.cases_dir] {
            fs::create_dir_all(dir).map_err(StoreError::StorageDirCreation)?;
        }

        Ok(store)
    }

    /// Writes a user profile, replacing any existing one.
    pub fn put_user(&self, profile: &UserProfile) -> StoreResult<()> {
        let path = sharded_file(&self.users_dir, profile.id.as_str(), RECORD_EXTENSION)?;
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        write_record(&path, profile)
    }

    /// Writes a child profile, replacing any existing one.
    pub fn put_child(&self, child: &ChildProfile) -> StoreResult<()> {
        let path = sharded_file(&self.children_dir, child.id.as_str(), RECORD_EXTENSION)?;
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        write_record(&path, child)
    }

    /// Every readable case, newest first.
    pub fn all_cases(&self) -> Vec<CaseReport> {
        let mut cases: Vec<CaseReport> = read_all_records(&self.cases_dir, RECORD_EXTENSION);
        crate::gateway::sort_newest_first(&mut cases);
        cases
    }

    /// Attaches externally produced guidance to a case. Fields left `None` are kept as they are.
    pub fn attach_guidance(
        &self,
        id: &CaseId,
        update: GuidanceUpdate,
    ) -> StoreResult<Option<CaseReport>> {
        let Some(path) = lookup_path(&self.cases_dir, id.as_str())? else {
            return Ok(None);
        };

        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let Some(mut case) = read_optional::<CaseReport>(&path)? else {
            return Ok(None);
        };

        if update.recommendation.is_some() {
            case.ai_recommendation = update.recommendation;
        }
        if update.category.is_some() {
            case.ai_category = update.category;
        }
        if update.guidance.is_some() {
            case.ai_guidance = update.guidance;
        }
        if !update.red_flags.is_empty() {
            case.red_flags = update.red_flags;
        }

        write_record(&path, &case)?;
        Ok(Some(case))
    }

    fn child(&self, id: &ChildId) -> StoreResult<Option<ChildProfile>> {
        match lookup_path(&self.children_dir, id.as_str())? {
            Some(path) => read_optional(&path),
            None => Ok(None),
        }
    }
}

/// Path for a lookup id. Ids this store could never have written resolve to `None`.
fn lookup_path(base_dir: &Path, id: &str) -> StoreResult<Option<PathBuf>> {
    if !is_canonical(id) {
        return Ok(None);
    }
    sharded_file(base_dir, id, RECORD_EXTENSION).map(Some)
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }
    read_record(path).map(Some)
}

impl RecordStore for FileRecordStore {
    fn user_profile(&self, id: &UserId) -> StoreResult<Option<UserProfile>> {
        match lookup_path(&self.users_dir, id.as_str())? {
            Some(path) => read_optional(&path),
            None => Ok(None),
        }
    }

    fn user_profiles(&self, ids: &[UserId]) -> StoreResult<Vec<UserProfile>> {
        let mut profiles = Vec::new();
        for id in ids {
            if let Some(profile) = self.user_profile(id)? {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }

    fn children(&self, filter: &ChildFilter) -> StoreResult<Vec<ChildProfile>> {
        let children: Vec<ChildProfile> = read_all_records(&self.children_dir, RECORD_EXTENSION);
        let mut matched: Vec<ChildProfile> =
            children.into_iter().filter(|c| filter.matches(c)).collect();
        matched.sort_by(|a, b| {
            a.first_name
                .cmp(&b.first_name)
                .then_with(|| a.last_name.cmp(&b.last_name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(matched)
    }

    fn cases(&self, query: &CaseQuery) -> StoreResult<Vec<CaseReport>> {
        let cases: Vec<CaseReport> = read_all_records(&self.cases_dir, RECORD_EXTENSION);
        Ok(query.apply(cases))
    }

    fn case(&self, id: &CaseId) -> StoreResult<Option<CaseReport>> {
        match lookup_path(&self.cases_dir, id.as_str())? {
            Some(path) => read_optional(&path),
            None => Ok(None),
        }
    }

    fn insert_case(&self, new_case: NewCaseReport) -> StoreResult<CaseReport> {
        if self.child(&new_case.child_id)?.is_none() {
            return Err(StoreError::MissingReference(format!(
                "child {}",
                new_case.child_id
            )));
        }

        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;

        // A collision is astronomically unlikely, but never overwrite an existing case.
        for _attempt in 0..5 {
            let id = CaseId::generate();
            let path = sharded_file(&self.cases_dir, id.as_str(), RECORD_EXTENSION)?;
            if path.exists() {
                continue;
            }

            let report = new_case.into_report(id, Utc::now());
            write_record(&path, &report)?;
            tracing::info!("case {} recorded for child {}", report.id, report.child_id);
            return Ok(report);
        }

        Err(StoreError::FileWrite(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "failed to allocate a unique case id after 5 attempts",
        )))
    }

    fn acknowledge_case(&self, id: &CaseId) -> StoreResult<AcknowledgeOutcome> {
        let Some(path) = lookup_path(&self.cases_dir, id.as_str())? else {
            return Ok(AcknowledgeOutcome::NotFound);
        };

        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let Some(mut case) = read_optional::<CaseReport>(&path)? else {
            return Ok(AcknowledgeOutcome::NotFound);
        };

        if case.status != CaseStatus::Pending {
            return Ok(AcknowledgeOutcome::AlreadyAcknowledged);
        }

        case.status = CaseStatus::Acknowledged;
        case.acknowledged_by_parent = true;
        write_record(&path, &case)?;
        tracing::info!("case {} acknowledged", case.id);
        Ok(AcknowledgeOutcome::Acknowledged(case))
    }
}
