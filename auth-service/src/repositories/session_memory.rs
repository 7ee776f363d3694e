//! In-memory session store for tests.
//!
//! Mirrors the semantics of the Postgres store closely enough that the
//! service and handler tests exercise the same code paths they would in
//! production, without a database.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Session, SessionStatus};
use crate::repositories::SessionStore;
use crate::types::UserId;

#[derive(Default)]
pub struct MemorySessionStore {
    rows: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows held, any status. Test helper.
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of a row for assertions. Test helper.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.rows
            .read()
            .ok()
            .and_then(|rows| rows.get(session_id).cloned())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: &Session) -> anyhow::Result<Session> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        if rows.contains_key(&session.session_id) {
            anyhow::bail!("duplicate session id: {}", session.session_id);
        }
        rows.insert(session.session_id.clone(), session.clone());
        Ok(session.clone())
    }

    async fn find_by_id(&self, session_id: &str) -> anyhow::Result<Option<Session>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        Ok(rows.get(session_id).cloned())
    }

    async fn active_sessions_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Session>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        let mut sessions: Vec<Session> = rows
            .values()
            .filter(|s| {
                s.user_id == user_id
                    && matches!(s.status, SessionStatus::Active)
                    && s.expires_at > now
            })
            .cloned()
            .collect();
        // created_at ascending; ids break ties so iteration order never leaks.
        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions)
    }

    async fn touch_last_accessed(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        match rows.get_mut(session_id) {
            Some(session) => {
                session.last_accessed_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_logged_out(&self, session_id: &str) -> anyhow::Result<bool> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        match rows.get_mut(session_id) {
            Some(session) => {
                session.status = SessionStatus::LoggedOut;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn logout_user_sessions(&self, user_id: UserId) -> anyhow::Result<Vec<String>> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        let mut ids = Vec::new();
        for session in rows.values_mut() {
            if session.user_id == user_id && matches!(session.status, SessionStatus::Active) {
                session.status = SessionStatus::LoggedOut;
                ids.push(session.session_id.clone());
            }
        }
        Ok(ids)
    }

    async fn set_expiry(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Session>> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        match rows.get_mut(session_id) {
            Some(session) => {
                session.expires_at = expires_at;
                Ok(Some(session.clone()))
            }
            None => Ok(None),
        }
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        let mut flipped = 0u64;
        for session in rows.values_mut() {
            if matches!(session.status, SessionStatus::Active) && session.expires_at < now {
                session.status = SessionStatus::Expired;
                flipped += 1;
            }
        }
        Ok(flipped)
    }
}
