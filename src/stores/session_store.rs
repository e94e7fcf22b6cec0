use crate::models::session::{Flash, Session};
use dashmap::DashMap;

/// Server-side session table keyed by the opaque id carried in the session cookie
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl_seconds: i64,
    remember_seconds: i64,
}

impl SessionStore {
    pub fn new(ttl_seconds: i64, remember_seconds: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_seconds,
            remember_seconds,
        }
    }

    /// Start an anonymous session and return its id
    pub fn create(&self, current_time: i64) -> String {
        let id = generate_session_id();
        self.sessions
            .insert(id.clone(), Session::anonymous(current_time.saturating_add(self.ttl_seconds)));
        id
    }

    /// Returns a copy of the session if it exists and has not expired.
    /// Expired sessions are dropped on sight.
    pub fn get(&self, id: &str, current_time: i64) -> Option<Session> {
        let session = self.sessions.get(id).map(|entry| entry.value().clone())?;

        if session.is_expired(current_time) {
            self.sessions.remove(id);
            return None;
        }

        Some(session)
    }

    /// Bind a user to a fresh session id, discarding the previous one.
    /// Pending flashes follow the visitor to the new session.
    pub fn login(&self, previous: Option<&str>, user_id: i64, remember: bool, current_time: i64) -> String {
        let flashes = previous
            .and_then(|id| self.sessions.remove(id))
            .filter(|(_, session)| !session.is_expired(current_time))
            .map(|(_, session)| session.flashes)
            .unwrap_or_default();

        let lifetime = if remember {
            self.remember_seconds
        } else {
            self.ttl_seconds
        };

        let id = generate_session_id();
        self.sessions.insert(
            id.clone(),
            Session {
                user_id: Some(user_id),
                remember,
                flashes,
                expires_at: current_time.saturating_add(lifetime),
            },
        );
        id
    }

    pub fn destroy(&self, id: &str) -> Option<Session> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    /// Queue a flash on a live session. Returns false when the session is gone.
    pub fn push_flash(&self, id: &str, flash: Flash, current_time: i64) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut entry) if !entry.is_expired(current_time) => {
                entry.flashes.push(flash);
                true
            }
            _ => false,
        }
    }

    /// Drain the pending flashes; each one is shown once
    pub fn take_flashes(&self, id: &str, current_time: i64) -> Vec<Flash> {
        match self.sessions.get_mut(id) {
            Some(mut entry) if !entry.is_expired(current_time) => std::mem::take(&mut entry.flashes),
            _ => Vec::new(),
        }
    }

    /// Remove every expired session, returning how many were dropped
    pub fn cleanup_expired(&self, current_time: i64) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(current_time));
        before.saturating_sub(self.sessions.len())
    }

    pub fn remember_seconds(&self) -> i64 {
        self.remember_seconds
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// 256 random bits, hex encoded
fn generate_session_id() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}
