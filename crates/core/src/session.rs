//! Per-session interaction state.
//!
//! A [`Session`] is the explicit context handed to every render routine. The [`SessionStore`]
//! owns all live sessions; each one sits behind its own mutex so requests for the same session
//! run one at a time while different sessions never contend.

use crate::constants::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_SECS};
use crate::error::{SessionError, SessionResult};
use crate::gateway::AuthTokens;
use crate::ids::{generate_canonical, is_canonical, CaseId, CentreId, UserId};
use crate::records::Role;
use crate::router::Screen;
use api_shared::ChildOption;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub screen: Screen,
    /// Present if and only if the session is authenticated.
    pub identity: Option<UserId>,
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub organization_scopes: Vec<CentreId>,
    pub auth_tokens: Option<AuthTokens>,
    pub selected_case_ref: Option<CaseId>,
    pub acknowledge_checked: bool,
    /// Child choices last offered on symptom entry, reused when a submit fails a field check.
    pub entry_children: Vec<ChildOption>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_parent(&self) -> bool {
        self.role == Some(Role::Parent)
    }

    pub fn avatar_initial(&self) -> Option<String> {
        self.display_name
            .as_deref()
            .and_then(crate::format::avatar_initial)
    }

    /// Resets every field to its default, returning the identity that was signed in.
    pub fn clear(&mut self) -> Option<UserId> {
        std::mem::take(self).identity
    }
}

/// Opaque key for a live session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    fn generate() -> Self {
        Self(generate_canonical())
    }

    /// Accepts only ids this store could have issued.
    pub fn parse(input: &str) -> SessionResult<Self> {
        if is_canonical(input) {
            Ok(Self(input.to_string()))
        } else {
            Err(SessionError::UnknownSession)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

struct Entry {
    session: SharedSession,
    last_seen: Instant,
    /// Store-wide use counter; the smallest value is the least recently used entry.
    used: u64,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<SessionId, Entry>,
    counter: u64,
}

impl Sessions {
    fn next_use(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    fn drop_idle(&mut self, idle_timeout: Duration) {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.last_seen.elapsed() < idle_timeout);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            tracing::debug!("dropped {} idle sessions", dropped);
        }
    }

    fn drop_least_recent(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.used)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            self.entries.remove(&id);
            tracing::warn!("session limit reached; dropped session {}", id);
        }
    }
}

/// All live sessions, bounded by a count cap and an idle timeout.
pub struct SessionStore {
    sessions: RwLock<Sessions>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(
            DEFAULT_MAX_SESSIONS,
            Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        )
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("len", &self.len())
            .field("max_sessions", &self.max_sessions)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding at most `max_sessions` (at least one), each dropped after
    /// `idle_timeout` without a request.
    pub fn with_limits(max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(Sessions::default()),
            max_sessions: max_sessions.max(1),
            idle_timeout,
        }
    }

    /// Starts a default-initialised session on the Login screen.
    ///
    /// Idle sessions are dropped first; if the store is still full the least recently used
    /// session makes room.
    pub fn create(&self) -> SessionResult<SessionId> {
        let id = SessionId::generate();
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;

        sessions.drop_idle(self.idle_timeout);
        while sessions.entries.len() >= self.max_sessions {
            sessions.drop_least_recent();
        }

        let used = sessions.next_use();
        sessions.entries.insert(
            id.clone(),
            Entry {
                session: Arc::new(Mutex::new(Session::default())),
                last_seen: Instant::now(),
                used,
            },
        );
        tracing::debug!("session {} started", id);
        Ok(id)
    }

    /// Returns the session and marks it as just used. An idle session is dropped and reported
    /// as unknown.
    pub fn get(&self, id: &SessionId) -> SessionResult<SharedSession> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;

        let expired = match sessions.entries.get(id) {
            None => return Err(SessionError::UnknownSession),
            Some(entry) => entry.last_seen.elapsed() >= self.idle_timeout,
        };
        if expired {
            sessions.entries.remove(id);
            tracing::info!("session {} expired", id);
            return Err(SessionError::UnknownSession);
        }

        let used = sessions.next_use();
        let entry = sessions
            .entries
            .get_mut(id)
            .ok_or(SessionError::UnknownSession)?;
        entry.last_seen = Instant::now();
        entry.used = used;
        Ok(entry.session.clone())
    }

    /// Drops the session and returns it so the caller can sign its identity out.
    pub fn remove(&self, id: &SessionId) -> SessionResult<SharedSession> {
        self.sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned)?
            .entries
            .remove(id)
            .map(|entry| entry.session)
            .ok_or(SessionError::UnknownSession)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
