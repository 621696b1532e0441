use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use super::domain::{CompanyId, RecipientKind, StudentId};
use super::state::OfferDetailState;

/// Identifier handed to clients when a session is opened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

/// Signed-in party for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SessionUser {
    Student(StudentId),
    Company(CompanyId),
}

impl SessionUser {
    pub fn recipient(self) -> RecipientKind {
        match self {
            SessionUser::Student(_) => RecipientKind::Student,
            SessionUser::Company(_) => RecipientKind::Company,
        }
    }

    pub fn raw_id(self) -> u64 {
        match self {
            SessionUser::Student(id) => id.0,
            SessionUser::Company(id) => id.0,
        }
    }

    pub fn student(self) -> Option<StudentId> {
        match self {
            SessionUser::Student(id) => Some(id),
            SessionUser::Company(_) => None,
        }
    }
}

/// Context passed into each workflow invocation for one user session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub id: SessionId,
    pub user: SessionUser,
    pub offer_detail: OfferDetailState,
}

impl SessionContext {
    pub fn new(id: SessionId, user: SessionUser) -> Self {
        Self {
            id,
            user,
            offer_detail: OfferDetailState::new(),
        }
    }
}

pub type SharedSession = Arc<AsyncMutex<SessionContext>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(String),
    #[error("session limit of {0} reached")]
    LimitReached(usize),
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("sess-{id:06}"))
}

struct SessionEntry {
    context: SharedSession,
    last_used: Instant,
}

/// Registry bounding the lifetime of session contexts.
///
/// A context exists from `open` until `close`, or until it sits idle longer than the
/// configured TTL. Idle entries are evicted on `open` and `get`. Workflows on one session
/// are serialized by its async mutex while different sessions proceed independently.
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(max_sessions: usize, idle_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_sessions,
            idle_ttl,
        }
    }

    pub fn open(&self, user: SessionUser) -> Result<SessionId, SessionError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        let now = Instant::now();
        self.evict_idle(&mut guard, now);
        if guard.len() >= self.max_sessions {
            return Err(SessionError::LimitReached(self.max_sessions));
        }
        let id = next_session_id();
        let context = SessionContext::new(id.clone(), user);
        guard.insert(
            id.clone(),
            SessionEntry {
                context: Arc::new(AsyncMutex::new(context)),
                last_used: now,
            },
        );
        info!(session = %id.0, ?user, "session opened");
        Ok(id)
    }

    /// Look up a live session and mark it used.
    pub fn get(&self, id: &SessionId) -> Result<SharedSession, SessionError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        let now = Instant::now();
        self.evict_idle(&mut guard, now);
        let entry = guard
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.0.clone()))?;
        entry.last_used = now;
        Ok(Arc::clone(&entry.context))
    }

    /// Drop the context. Workflows still holding it finish against the detached copy.
    pub fn close(&self, id: &SessionId) -> Result<(), SessionError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        match guard.remove(id) {
            Some(_) => {
                debug!(session = %id.0, "session closed");
                Ok(())
            }
            None => Err(SessionError::NotFound(id.0.clone())),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_idle(&self, sessions: &mut HashMap<SessionId, SessionEntry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_used) < self.idle_ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "idle sessions evicted");
        }
    }
}
