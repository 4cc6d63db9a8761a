//! Records held by the record store.
//!
//! User and child profiles are created out-of-band and only read here. Case reports are the
//! one entity this service creates and mutates: it inserts them and performs the single
//! `pending -> acknowledged` transition. The AI fields on a case are written by an external
//! process and only ever read.

use crate::ids::{CaseId, CentreId, ChildId, UserId};
use bewell_types::NonEmptyText;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Carer,
    Parent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Carer => "carer",
            Role::Parent => "parent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "carer" => Ok(Role::Carer),
            "parent" => Ok(Role::Parent),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Roles the service does not know about are treated as unset rather than failing the read.
fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|r| r.parse().ok()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<Role>,
    #[serde(default)]
    pub centre_ids: Vec<CentreId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildProfile {
    pub id: ChildId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub centre_id: Option<CentreId>,
    #[serde(default)]
    pub carer_ids: Vec<UserId>,
    #[serde(default)]
    pub parent_ids: Vec<UserId>,
}

impl ChildProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    #[serde(alias = "open")]
    Pending,
    Acknowledged,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::Acknowledged => "acknowledged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseReport {
    pub id: CaseId,
    pub child_id: ChildId,
    #[serde(default)]
    pub centre_id: Option<CentreId>,
    pub reported_by: UserId,
    pub symptom_date: NaiveDate,
    pub symptom_description: NonEmptyText,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub status: CaseStatus,
    #[serde(default)]
    pub ai_recommendation: Option<String>,
    #[serde(default)]
    pub ai_category: Option<String>,
    #[serde(default)]
    pub ai_guidance: Option<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub acknowledged_by_parent: bool,
    pub created_at: DateTime<Utc>,
}

impl CaseReport {
    pub fn is_acknowledged(&self) -> bool {
        self.status == CaseStatus::Acknowledged
    }
}

/// Fields supplied by the reporter; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCaseReport {
    pub child_id: ChildId,
    pub centre_id: Option<CentreId>,
    pub reported_by: UserId,
    pub symptom_date: NaiveDate,
    pub symptom_description: NonEmptyText,
    pub photo_url: Option<String>,
    pub status: CaseStatus,
}

impl NewCaseReport {
    pub fn into_report(self, id: CaseId, created_at: DateTime<Utc>) -> CaseReport {
        CaseReport {
            id,
            child_id: self.child_id,
            centre_id: self.centre_id,
            reported_by: self.reported_by,
            symptom_date: self.symptom_date,
            symptom_description: self.symptom_description,
            photo_url: self.photo_url,
            status: self.status,
            ai_recommendation: None,
            ai_category: None,
            ai_guidance: None,
            red_flags: Vec::new(),
            acknowledged_by_parent: false,
            created_at,
        }
    }
}

/// Guidance produced outside this service and attached to a case by the admin tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuidanceUpdate {
    pub recommendation: Option<String>,
    pub category: Option<String>,
    pub guidance: Option<String>,
    pub red_flags: Vec<String>,
}
