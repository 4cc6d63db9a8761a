//! Filesystem helpers shared by the local repositories.

use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Collects every record file in a `<s1>/<s2>/<id>.<ext>` sharded tree.
///
/// A missing base directory yields an empty list. Unreadable shard directories are skipped.
pub(crate) fn sharded_record_files(base_dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let s1_iter = match fs::read_dir(base_dir) {
        Ok(it) => it,
        Err(_) => return files,
    };
    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }

        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };

        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }

            let id_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for id_ent in id_iter.flatten() {
                let path = id_ent.path();
                if path.is_file() && path.extension().is_some_and(|e| e == extension) {
                    files.push(path);
                }
            }
        }
    }

    files
}

/// Reads and parses one YAML record.
pub(crate) fn read_record<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let contents = fs::read_to_string(path).map_err(StoreError::FileRead)?;
    serde_yaml::from_str(&contents).map_err(|source| StoreError::Deserialization {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads every record in a sharded tree, skipping (and logging) files that fail to parse.
pub(crate) fn read_all_records<T: DeserializeOwned>(base_dir: &Path, extension: &str) -> Vec<T> {
    let mut records = Vec::new();
    for path in sharded_record_files(base_dir, extension) {
        match read_record(&path) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("skipping unreadable record {}: {}", path.display(), e);
            }
        }
    }
    records
}

/// Serialises `record` and writes it to `path` through a temporary sibling so readers never
/// observe a half-written file.
pub(crate) fn write_record<T: Serialize>(path: &Path, record: &T) -> StoreResult<()> {
    let yaml = serde_yaml::to_string(record).map_err(StoreError::Serialization)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(StoreError::StorageDirCreation)?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, yaml).map_err(StoreError::FileWrite)?;
    fs::rename(&tmp, path).map_err(StoreError::FileWrite)?;
    Ok(())
}
