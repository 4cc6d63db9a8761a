//! In-memory collaborators for screen and router tests.
//!
//! Each fake counts its calls and can be told to fail, so tests can assert both what the
//! screens showed and which external calls they made.

use crate::error::{AuthError, AuthResult, BlobError, BlobResult, StoreError, StoreResult};
use crate::gateway::{
    AcknowledgeOutcome, AuthGateway, AuthTokens, BlobStore, CaseQuery, ChildFilter, RecordStore,
    SignedIn,
};
use crate::ids::{CaseId, CentreId, ChildId, UserId};
use crate::records::{CaseReport, CaseStatus, ChildProfile, NewCaseReport, Role, UserProfile};
use crate::router::{Router, Services};
use crate::CoreConfig;
use bewell_types::{EmailAddress, NonEmptyText};
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const CARER: &str = "carer-1";
pub const OTHER_CARER: &str = "carer-2";
pub const PARENT: &str = "parent-1";
pub const FLOATER: &str = "floater-1";
pub const PASSWORD: &str = "secret";

#[derive(Default)]
pub struct FakeAuth {
    accounts: HashMap<String, UserId>,
    issued: Mutex<Vec<AuthTokens>>,
    fail: AtomicBool,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    restore_calls: AtomicUsize,
}

impl FakeAuth {
    fn with_accounts(accounts: &[(&str, &str)]) -> Self {
        Self {
            accounts: accounts
                .iter()
                .map(|(email, id)| (email.to_string(), UserId::new(*id)))
                .collect(),
            ..Self::default()
        }
    }

    pub fn fail_sign_in(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    pub fn restore_calls(&self) -> usize {
        self.restore_calls.load(Ordering::SeqCst)
    }
}

impl AuthGateway for FakeAuth {
    fn sign_in(&self, email: &EmailAddress, password: &str) -> AuthResult<SignedIn> {
        let n = self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable("auth offline".into()));
        }

        let identity = self
            .accounts
            .get(email.as_str())
            .filter(|_| password == PASSWORD)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        let tokens = AuthTokens {
            access_token: format!("access-{n}"),
            refresh_token: format!("refresh-{n}"),
        };
        self.issued
            .lock()
            .map_err(|_| AuthError::LockPoisoned)?
            .push(tokens.clone());
        Ok(SignedIn { identity, tokens })
    }

    fn sign_out(&self, _identity: &UserId) -> AuthResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn restore_session(&self, tokens: &AuthTokens) -> AuthResult<()> {
        self.restore_calls.fetch_add(1, Ordering::SeqCst);
        let issued = self.issued.lock().map_err(|_| AuthError::LockPoisoned)?;
        if issued.contains(tokens) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

#[derive(Default)]
struct MemoryState {
    users: Vec<UserProfile>,
    children: Vec<ChildProfile>,
    cases: Vec<CaseReport>,
    next_case: usize,
    case_queries: Vec<CaseQuery>,
}

#[derive(Default)]
pub struct MemoryRecordStore {
    state: Mutex<MemoryState>,
    calls: AtomicUsize,
    insert_calls: AtomicUsize,
    acknowledge_calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_inserts: AtomicBool,
    fail_acknowledge: AtomicBool,
}

impl MemoryRecordStore {
    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store lock")
    }

    fn read(&self) -> StoreResult<std::sync::MutexGuard<'_, MemoryState>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }
        Ok(self.state())
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    pub fn fail_acknowledge(&self) {
        self.fail_acknowledge.store(true, Ordering::SeqCst);
    }

    /// Every call made through the `RecordStore` trait.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn acknowledge_calls(&self) -> usize {
        self.acknowledge_calls.load(Ordering::SeqCst)
    }

    pub fn case_queries(&self) -> Vec<CaseQuery> {
        self.state().case_queries.clone()
    }

    pub fn all_cases(&self) -> Vec<CaseReport> {
        self.state().cases.clone()
    }

    pub fn case_by_id(&self, id: &CaseId) -> Option<CaseReport> {
        self.state().cases.iter().find(|c| &c.id == id).cloned()
    }

    pub fn set_guidance(&self, id: &CaseId, guidance: &str, red_flags: Vec<&str>) {
        let mut state = self.state();
        if let Some(case) = state.cases.iter_mut().find(|c| &c.id == id) {
            case.ai_guidance = Some(guidance.to_string());
            case.red_flags = red_flags.into_iter().map(String::from).collect();
        }
    }

    /// Acknowledges behind the screens' back, as another session would.
    pub fn force_acknowledge(&self, id: &CaseId) -> AcknowledgeOutcome {
        acknowledge_in(&mut self.state(), id)
    }
}

fn acknowledge_in(state: &mut MemoryState, id: &CaseId) -> AcknowledgeOutcome {
    match state.cases.iter_mut().find(|c| &c.id == id) {
        None => AcknowledgeOutcome::NotFound,
        Some(case) if case.status != CaseStatus::Pending => AcknowledgeOutcome::AlreadyAcknowledged,
        Some(case) => {
            case.status = CaseStatus::Acknowledged;
            case.acknowledged_by_parent = true;
            AcknowledgeOutcome::Acknowledged(case.clone())
        }
    }
}

impl RecordStore for MemoryRecordStore {
    fn user_profile(&self, id: &UserId) -> StoreResult<Option<UserProfile>> {
        Ok(self.read()?.users.iter().find(|u| &u.id == id).cloned())
    }

    fn user_profiles(&self, ids: &[UserId]) -> StoreResult<Vec<UserProfile>> {
        Ok(self
            .read()?
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    fn children(&self, filter: &ChildFilter) -> StoreResult<Vec<ChildProfile>> {
        Ok(self
            .read()?
            .children
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    fn cases(&self, query: &CaseQuery) -> StoreResult<Vec<CaseReport>> {
        let mut state = self.read()?;
        state.case_queries.push(query.clone());
        Ok(query.apply(state.cases.clone()))
    }

    fn case(&self, id: &CaseId) -> StoreResult<Option<CaseReport>> {
        Ok(self.read()?.cases.iter().find(|c| &c.id == id).cloned())
    }

    fn insert_case(&self, new_case: NewCaseReport) -> StoreResult<CaseReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("inserts disabled".into()));
        }

        let mut state = self.state();
        if !state.children.iter().any(|c| c.id == new_case.child_id) {
            return Err(StoreError::MissingReference(new_case.child_id.to_string()));
        }

        state.next_case += 1;
        let id = CaseId::new(format!("case-{}", state.next_case));
        let report = new_case.into_report(id, Utc::now());
        state.cases.push(report.clone());
        Ok(report)
    }

    fn acknowledge_case(&self, id: &CaseId) -> StoreResult<AcknowledgeOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.acknowledge_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_acknowledge.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("updates disabled".into()));
        }
        Ok(acknowledge_in(&mut self.state(), id))
    }
}

#[derive(Default)]
pub struct FakeBlobs {
    uploaded: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl FakeBlobs {
    pub fn fail_uploads(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploaded.lock().expect("blob lock").clone()
    }
}

impl BlobStore for FakeBlobs {
    fn upload(&self, path: &str, _bytes: &[u8], _content_type: &str) -> BlobResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BlobError::Unavailable("uploads disabled".into()));
        }
        self.uploaded
            .lock()
            .map_err(|_| BlobError::Unavailable("lock poisoned".into()))?
            .push(path.to_string());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://blobs.test/{path}")
    }
}

/// Two children, one carer team and one parent.
///
/// - Lucy Adam (centre-a): carers `carer-1` and `carer-2`, parent `parent-1` ("Mary Adam")
/// - Max Bell (centre-b): nobody assigned
/// - `floater-1` is a carer scoped to centre-b with no assignments
/// - `newbie@centre.org` can sign in but has no profile
pub struct Fixture {
    pub auth: Arc<FakeAuth>,
    pub records: Arc<MemoryRecordStore>,
    pub blobs: Arc<FakeBlobs>,
    pub cfg: Arc<CoreConfig>,
    pub child_id: ChildId,
    pub other_child_id: ChildId,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_unscoped_children(true)
    }

    pub fn with_unscoped_children(allow: bool) -> Self {
        let auth = FakeAuth::with_accounts(&[
            ("carer@centre.org", CARER),
            ("other@centre.org", OTHER_CARER),
            ("parent@home.org", PARENT),
            ("floater@centre.org", FLOATER),
            ("newbie@centre.org", "newbie-1"),
        ]);

        let child_id = ChildId::new("child-lucy");
        let other_child_id = ChildId::new("child-max");

        let records = MemoryRecordStore::default();
        {
            let mut state = records.state();
            state.users = vec![
                profile(CARER, "Jane Smith", Role::Carer, &["centre-a"]),
                profile(OTHER_CARER, "Tom Other", Role::Carer, &["centre-a"]),
                profile(PARENT, "Mary Adam", Role::Parent, &[]),
                profile(FLOATER, "Flo", Role::Carer, &["centre-b"]),
            ];
            state.children = vec![
                ChildProfile {
                    id: child_id.clone(),
                    first_name: "Lucy".into(),
                    last_name: "Adam".into(),
                    centre_id: Some(CentreId::new("centre-a")),
                    carer_ids: vec![UserId::new(CARER), UserId::new(OTHER_CARER)],
                    parent_ids: vec![UserId::new(PARENT)],
                },
                ChildProfile {
                    id: other_child_id.clone(),
                    first_name: "Max".into(),
                    last_name: "Bell".into(),
                    centre_id: Some(CentreId::new("centre-b")),
                    carer_ids: vec![],
                    parent_ids: vec![],
                },
            ];
        }

        let cfg = CoreConfig::new(
            "unused".into(),
            "http://localhost:3000".into(),
            20,
            allow,
        )
        .expect("test config should be valid");

        Self {
            auth: Arc::new(auth),
            records: Arc::new(records),
            blobs: Arc::new(FakeBlobs::default()),
            cfg: Arc::new(cfg),
            child_id,
            other_child_id,
        }
    }

    pub fn services(&self) -> Services {
        Services {
            auth: self.auth.clone(),
            records: self.records.clone(),
            blobs: self.blobs.clone(),
            cfg: self.cfg.clone(),
        }
    }

    pub fn router(&self) -> Router {
        Router::new(self.services())
    }

    /// Seeds a pending case for Lucy created at 09:`minute` on 5 Jan 2024.
    pub fn seed_case(&self, reporter: &str, symptoms: &str, minute: u32) -> CaseId {
        self.seed_case_for(reporter, &self.child_id.clone(), symptoms, minute)
    }

    pub fn seed_case_for(
        &self,
        reporter: &str,
        child_id: &ChildId,
        symptoms: &str,
        minute: u32,
    ) -> CaseId {
        let mut state = self.records.state();
        state.next_case += 1;
        let id = CaseId::new(format!("seed-{}", state.next_case));
        state.cases.push(CaseReport {
            id: id.clone(),
            child_id: child_id.clone(),
            centre_id: None,
            reported_by: UserId::new(reporter),
            symptom_date: NaiveDate::from_ymd_opt(2024, 1, 5).expect("valid date"),
            symptom_description: NonEmptyText::new(symptoms).expect("non-empty symptoms"),
            photo_url: None,
            status: CaseStatus::Pending,
            ai_recommendation: None,
            ai_category: None,
            ai_guidance: None,
            red_flags: vec![],
            acknowledged_by_parent: false,
            created_at: Utc
                .with_ymd_and_hms(2024, 1, 5, 9, minute, 0)
                .single()
                .expect("valid timestamp"),
        });
        id
    }
}

fn profile(id: &str, name: &str, role: Role, centres: &[&str]) -> UserProfile {
    UserProfile {
        id: UserId::new(id),
        display_name: Some(name.into()),
        role: Some(role),
        centre_ids: centres.iter().map(|c| CentreId::new(*c)).collect(),
    }
}
