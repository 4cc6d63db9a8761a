//! Collaborator boundaries.
//!
//! The screens talk to three external services through these traits: an auth gateway, a
//! record store and a blob store. Every call returns an explicit result; each call site decides
//! whether a failure is surfaced to the user or tolerated.
//!
//! Local implementations live in [`crate::repositories`]. A hosted backend plugs in by
//! implementing the same traits.

use crate::error::{AuthResult, BlobResult, StoreResult};
use crate::ids::{CaseId, CentreId, ChildId, UserId};
use crate::records::{CaseReport, ChildProfile, NewCaseReport, UserProfile};
use bewell_types::EmailAddress;
use std::cmp::Reverse;

/// Opaque token pair issued at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub identity: UserId,
    pub tokens: AuthTokens,
}

pub trait AuthGateway: Send + Sync {
    /// Checks credentials and issues tokens.
    fn sign_in(&self, email: &EmailAddress, password: &str) -> AuthResult<SignedIn>;

    /// Revokes the identity's tokens. Callers treat failure as ignorable.
    fn sign_out(&self, identity: &UserId) -> AuthResult<()>;

    /// Re-establishes the authenticated connection from stored tokens. Callers treat failure
    /// as ignorable.
    fn restore_session(&self, tokens: &AuthTokens) -> AuthResult<()>;
}

/// Child selection, covering the equality, membership and array-contains primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildFilter {
    /// `id IN (...)`
    Ids(Vec<ChildId>),
    /// `parent_ids CONTAINS identity`
    ParentOf(UserId),
    /// `carer_ids CONTAINS identity OR parent_ids CONTAINS identity`
    LinkedTo(UserId),
    /// `centre_id IN (...)`
    CentreIn(Vec<CentreId>),
    All,
}

impl ChildFilter {
    pub fn matches(&self, child: &ChildProfile) -> bool {
        match self {
            ChildFilter::Ids(ids) => ids.contains(&child.id),
            ChildFilter::ParentOf(user) => child.parent_ids.contains(user),
            ChildFilter::LinkedTo(user) => {
                child.carer_ids.contains(user) || child.parent_ids.contains(user)
            }
            ChildFilter::CentreIn(centres) => child
                .centre_id
                .as_ref()
                .is_some_and(|centre| centres.contains(centre)),
            ChildFilter::All => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseFilter {
    /// `reported_by = identity`
    ReportedBy(UserId),
    /// `child_id IN (...)`
    ChildIn(Vec<ChildId>),
}

impl CaseFilter {
    pub fn matches(&self, case: &CaseReport) -> bool {
        match self {
            CaseFilter::ReportedBy(user) => &case.reported_by == user,
            CaseFilter::ChildIn(children) => children.contains(&case.child_id),
        }
    }
}

/// Cases matching `filter`, newest `created_at` first, at most `limit` of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseQuery {
    pub filter: CaseFilter,
    pub limit: usize,
}

impl CaseQuery {
    /// Applies the query to an unordered set of cases.
    pub fn apply(&self, cases: impl IntoIterator<Item = CaseReport>) -> Vec<CaseReport> {
        let mut matched: Vec<CaseReport> = cases
            .into_iter()
            .filter(|case| self.filter.matches(case))
            .collect();
        sort_newest_first(&mut matched);
        matched.truncate(self.limit);
        matched
    }
}

/// Descending by creation time; ties broken by id so the order is stable.
pub fn sort_newest_first(cases: &mut [CaseReport]) {
    cases.sort_by(|a, b| {
        Reverse(a.created_at)
            .cmp(&Reverse(b.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Result of the guarded acknowledge update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcknowledgeOutcome {
    Acknowledged(CaseReport),
    /// The case was already acknowledged; nothing was written.
    AlreadyAcknowledged,
    NotFound,
}

pub trait RecordStore: Send + Sync {
    fn user_profile(&self, id: &UserId) -> StoreResult<Option<UserProfile>>;

    fn user_profiles(&self, ids: &[UserId]) -> StoreResult<Vec<UserProfile>>;

    fn children(&self, filter: &ChildFilter) -> StoreResult<Vec<ChildProfile>>;

    fn cases(&self, query: &CaseQuery) -> StoreResult<Vec<CaseReport>>;

    fn case(&self, id: &CaseId) -> StoreResult<Option<CaseReport>>;

    /// Inserts a case. The store assigns `id` and `created_at` and rejects a `child_id` that
    /// does not reference an existing child.
    fn insert_case(&self, new_case: NewCaseReport) -> StoreResult<CaseReport>;

    /// Sets `status = acknowledged` and `acknowledged_by_parent = true`, but only if the case
    /// is still pending.
    fn acknowledge_case(&self, id: &CaseId) -> StoreResult<AcknowledgeOutcome>;
}

pub trait BlobStore: Send + Sync {
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> BlobResult<()>;

    fn public_url(&self, path: &str) -> String;
}
