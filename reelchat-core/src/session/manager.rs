//! In-memory history store shared by all requests

use super::store::{Role, Session, Turn};
use crate::config::schema::SessionConfig;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::ops::Deref;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

struct SessionSlot {
    session: Arc<AsyncMutex<Session>>,
    last_access: Instant,
}

impl SessionSlot {
    /// Only the map refers to this session
    fn is_idle(&self) -> bool {
        Arc::strong_count(&self.session) == 1
    }
}

type SessionMap = Arc<Mutex<LruCache<String, SessionSlot>>>;

/// Process-wide mapping from session id to its ordered turns.
///
/// The map is bounded: when `max_sessions` is reached the least recently
/// used idle session is dropped, and sessions idle for longer than the TTL
/// are dropped on access or by [`HistoryStore::evict_expired`]. A session
/// held by a request is never evicted; if every session is held the map
/// grows past its bound until one is released. Each session has its own
/// async lock so requests for one session run one at a time while different
/// sessions proceed in parallel.
pub struct HistoryStore {
    sessions: SessionMap,
    max_sessions: NonZeroUsize,
    ttl: Option<Duration>,
}

impl HistoryStore {
    /// Create a store from session configuration
    pub fn new(config: &SessionConfig) -> Self {
        let ttl = (config.session_ttl_secs > 0)
            .then(|| Duration::from_secs(config.session_ttl_secs));
        Self::with_limits(config.max_sessions, ttl)
    }

    /// Create a store with explicit limits. A zero capacity is treated as one.
    pub fn with_limits(max_sessions: usize, ttl: Option<Duration>) -> Self {
        let max_sessions = NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Arc::new(Mutex::new(LruCache::new(max_sessions))),
            max_sessions,
            ttl,
        }
    }

    /// Ordered turns of a session; empty if the session is unknown
    pub async fn get(&self, session_id: &str) -> Vec<Turn> {
        match self.lookup(session_id) {
            Some(session) => session.lock().await.turns.clone(),
            None => Vec::new(),
        }
    }

    /// Append one turn, creating the session if absent
    pub async fn append(&self, session_id: &str, role: Role, content: impl Into<String>) {
        let mut guard = self.lock_session(session_id).await;
        guard.guard.add_turn(role, content);
    }

    /// Append a user turn and its assistant reply as one step
    pub async fn append_exchange(
        &self,
        session_id: &str,
        user: impl Into<String>,
        assistant: impl Into<String>,
    ) {
        let mut guard = self.lock_session(session_id).await;
        guard.append_exchange(user, assistant);
    }

    /// Lock a session for the duration of a request, creating it if absent.
    ///
    /// Dropping the guard unlocks the session. A session that never received
    /// a turn and has no other request waiting is removed at that point, so
    /// abandoned requests leave nothing behind.
    pub async fn lock_session(&self, session_id: &str) -> SessionGuard {
        let session = self.get_or_create(session_id);
        SessionGuard {
            guard: session.clone().lock_owned().await,
            session,
            sessions: self.sessions.clone(),
        }
    }

    /// Drop every session idle for longer than the TTL. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, slot)| self.is_expired(slot, now))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            sessions.pop(id.as_str());
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "Evicted expired sessions");
        }
        expired.len()
    }

    /// Whether a live session exists for `session_id`
    pub fn contains(&self, session_id: &str) -> bool {
        let sessions = self.sessions.lock();
        sessions
            .peek(session_id)
            .is_some_and(|slot| !self.is_expired(slot, Instant::now()))
    }

    /// Number of sessions currently held
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, session_id: &str) -> Option<Arc<AsyncMutex<Session>>> {
        let mut sessions = self.sessions.lock();
        self.touch_live(&mut sessions, session_id)
    }

    fn get_or_create(&self, session_id: &str) -> Arc<AsyncMutex<Session>> {
        let mut sessions = self.sessions.lock();
        if let Some(session) = self.touch_live(&mut sessions, session_id) {
            return session;
        }

        self.make_room(&mut sessions);
        let session = Arc::new(AsyncMutex::new(Session::new(session_id)));
        let slot = SessionSlot {
            session: session.clone(),
            last_access: Instant::now(),
        };
        sessions.put(session_id.to_string(), slot);
        session
    }

    /// Free one slot for a new session, evicting idle sessions from the
    /// least recently used end. Grows the map when every session is held.
    fn make_room(&self, sessions: &mut LruCache<String, SessionSlot>) {
        while sessions.len() >= self.max_sessions.get() {
            let victim = sessions
                .iter()
                .rev()
                .find(|(_, slot)| slot.is_idle())
                .map(|(id, _)| id.clone());
            let Some(victim) = victim else {
                break;
            };
            sessions.pop(victim.as_str());
            debug!(session_id = %victim, "Evicted least recently used session");
        }

        let needed = (sessions.len() + 1).max(self.max_sessions.get());
        if let Some(cap) = NonZeroUsize::new(needed) {
            if cap != sessions.cap() {
                sessions.resize(cap);
            }
        }
    }

    /// Promote and return a live session, dropping it first if it has expired
    fn touch_live(
        &self,
        sessions: &mut LruCache<String, SessionSlot>,
        session_id: &str,
    ) -> Option<Arc<AsyncMutex<Session>>> {
        let now = Instant::now();
        let expired = sessions
            .peek(session_id)
            .is_some_and(|slot| self.is_expired(slot, now));
        if expired {
            sessions.pop(session_id);
            debug!(session_id, "Session expired");
            return None;
        }

        sessions.get_mut(session_id).map(|slot| {
            slot.last_access = now;
            slot.session.clone()
        })
    }

    /// Idle past the TTL and not held by any request
    fn is_expired(&self, slot: &SessionSlot, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => slot.is_idle() && now.saturating_duration_since(slot.last_access) > ttl,
            None => false,
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

/// Exclusive access to one session, released on drop
pub struct SessionGuard {
    guard: OwnedMutexGuard<Session>,
    session: Arc<AsyncMutex<Session>>,
    sessions: SessionMap,
}

impl SessionGuard {
    /// Append a user turn followed by the assistant reply
    pub fn append_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.guard.add_turn(Role::User, user);
        self.guard.add_turn(Role::Assistant, assistant);
    }
}

impl Deref for SessionGuard {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.guard
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut sessions = self.sessions.lock();
        let Some(slot) = sessions.peek_mut(self.guard.id.as_str()) else {
            return;
        };
        if !Arc::ptr_eq(&slot.session, &self.session) {
            // Replaced while we held the old one.
            return;
        }

        // The map, this handle and the lock itself: nobody is waiting.
        if self.guard.is_empty() && Arc::strong_count(&slot.session) == 3 {
            sessions.pop(self.guard.id.as_str());
            debug!(session_id = %self.guard.id, "Dropped session without turns");
        } else {
            slot.last_access = Instant::now();
        }
    }
}
