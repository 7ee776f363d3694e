//! Session lifecycle: issuance, validation, logout, refresh, sweeping.
//!
//! The database row is the source of truth. The cache only ever holds
//! snapshots of rows, and every cache failure downgrades to a database
//! read, so losing Redis degrades latency but never correctness.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::models::{ClientInfo, Session, SessionStatus};
use crate::repositories::SessionStore;
use crate::services::SessionCache;
use crate::types::UserId;
use crate::utils::generate_session_id;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The caller presented no session identifier at all.
    #[error("no session identifier provided")]
    NoSession,

    /// No row exists for the identifier.
    #[error("session not found")]
    NotFound,

    /// The row exists but is logged out, expired, or past its expiry.
    #[error("session is expired or logged out")]
    ExpiredOrLoggedOut,

    /// The backing store failed. Deliberately not `#[from]` so cache
    /// errors cannot drift into this variant through a stray `?`.
    #[error("session store failure")]
    Store(#[source] anyhow::Error),
}

pub struct SessionService {
    store: Arc<dyn SessionStore>,
    cache: Option<Arc<dyn SessionCache>>,
    session_timeout: Duration,
    max_sessions_per_user: usize,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        cache: Option<Arc<dyn SessionCache>>,
        session_timeout: Duration,
        max_sessions_per_user: usize,
    ) -> Self {
        Self {
            store,
            cache,
            session_timeout,
            max_sessions_per_user,
        }
    }

    /// Issues a new session for the user.
    ///
    /// When the user is at their session quota, the oldest active session
    /// is logged out to make room. Creation itself is never refused for
    /// quota reasons. Two creations racing past the quota check can leave
    /// the user briefly over the cap; the next creation evicts again, so
    /// the count converges without cross-request locking.
    pub async fn create(
        &self,
        user_id: UserId,
        client: ClientInfo,
    ) -> Result<Session, SessionError> {
        let now = Utc::now();

        let active = self
            .store
            .active_sessions_for_user(user_id, now)
            .await
            .map_err(SessionError::Store)?;
        if active.len() >= self.max_sessions_per_user {
            if let Some(oldest) = active.first() {
                tracing::info!(
                    user_id = %user_id,
                    evicted_session_id = %oldest.session_id,
                    "session quota reached, evicting oldest session"
                );
                self.invalidate(&oldest.session_id).await?;
            }
        }

        let session = Session {
            session_id: generate_session_id(),
            user_id,
            status: SessionStatus::Active,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
            created_at: now,
            expires_at: now + self.session_timeout,
            last_accessed_at: Some(now),
        };
        let stored = self
            .store
            .insert(&session)
            .await
            .map_err(SessionError::Store)?;

        self.cache_put(&stored, now).await;
        tracing::debug!(user_id = %user_id, session_id = %stored.session_id, "session created");
        Ok(stored)
    }

    /// Authorizes a request by session id.
    ///
    /// An active snapshot from the cache is trusted as-is; logout keeps
    /// that sound by deleting cache entries. Anything else, including a
    /// cache failure or a cached snapshot that no longer passes the
    /// active check, falls through to the database row.
    pub async fn validate(&self, session_id: &str) -> Result<Session, SessionError> {
        if session_id.is_empty() {
            return Err(SessionError::NoSession);
        }
        let now = Utc::now();

        if let Some(cache) = &self.cache {
            match cache.get(session_id).await {
                Ok(Some(cached)) if cached.is_active_at(now) => {
                    self.touch(session_id, now).await;
                    return Ok(cached);
                }
                Ok(Some(_)) => {
                    // Stale snapshot; the row decides.
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        session_id,
                        error = %err,
                        "session cache read failed, falling back to store"
                    );
                }
            }
        }

        let session = self
            .store
            .find_by_id(session_id)
            .await
            .map_err(SessionError::Store)?
            .ok_or(SessionError::NotFound)?;

        if !session.is_active_at(now) {
            return Err(SessionError::ExpiredOrLoggedOut);
        }

        self.cache_put(&session, now).await;
        self.touch(session_id, now).await;
        Ok(session)
    }

    /// Logs out a single session.
    ///
    /// The cached snapshot is deleted even when the row is missing or the
    /// store update fails, so the cache can never outlive a logout
    /// attempt. Logging out an unknown or already-dead session is a
    /// no-op, not an error.
    pub async fn invalidate(&self, session_id: &str) -> Result<(), SessionError> {
        let updated = self.store.mark_logged_out(session_id).await;

        if let Some(cache) = &self.cache {
            if let Err(err) = cache.delete(session_id).await {
                tracing::warn!(session_id, error = %err, "failed to delete cached session");
            }
        }

        match updated {
            Ok(found) => {
                if !found {
                    tracing::debug!(session_id, "logout for unknown session id");
                }
                Ok(())
            }
            Err(err) => Err(SessionError::Store(err)),
        }
    }

    /// Logs out every active session of the user. Returns how many were
    /// logged out. The store transition happens in one statement; the ids
    /// it reports are the pre-transition active set, which is exactly the
    /// set of cache keys that may need deleting.
    pub async fn invalidate_all(&self, user_id: UserId) -> Result<u64, SessionError> {
        let ids = self
            .store
            .logout_user_sessions(user_id)
            .await
            .map_err(SessionError::Store)?;

        if let Some(cache) = &self.cache {
            for id in &ids {
                if let Err(err) = cache.delete(id).await {
                    tracing::warn!(session_id = %id, error = %err, "failed to delete cached session");
                }
            }
        }

        let count = ids.len() as u64;
        if count > 0 {
            tracing::info!(user_id = %user_id, count, "logged out all sessions for user");
        }
        Ok(count)
    }

    /// Extends the session to a full timeout window from now and rewrites
    /// the cached snapshot. Refreshing an unknown session returns `None`
    /// without error. The status is left untouched; a refreshed row that
    /// is not active still fails the validation predicate.
    pub async fn refresh(&self, session_id: &str) -> Result<Option<Session>, SessionError> {
        let now = Utc::now();
        let expires_at = now + self.session_timeout;

        let updated = self
            .store
            .set_expiry(session_id, expires_at)
            .await
            .map_err(SessionError::Store)?;

        if let Some(session) = &updated {
            self.cache_put(session, now).await;
            tracing::debug!(session_id, "session refreshed");
        }
        Ok(updated)
    }

    /// Flips rows whose expiry has passed from active to expired so that
    /// listings and storage reflect reality. Validation never depends on
    /// this; the active check catches overdue rows on its own. The cache
    /// is left alone, since snapshots expire by TTL no later than the row.
    pub async fn sweep_expired(&self) -> Result<u64, SessionError> {
        let now = Utc::now();
        let expired = self
            .store
            .expire_overdue(now)
            .await
            .map_err(SessionError::Store)?;
        if expired > 0 {
            tracing::info!(count = expired, "marked overdue sessions expired");
        }
        Ok(expired)
    }

    /// The user's active sessions, oldest first.
    pub async fn list_active(&self, user_id: UserId) -> Result<Vec<Session>, SessionError> {
        self.store
            .active_sessions_for_user(user_id, Utc::now())
            .await
            .map_err(SessionError::Store)
    }

    /// Fetches a session row regardless of status.
    pub async fn get(&self, session_id: &str) -> Result<Option<Session>, SessionError> {
        self.store
            .find_by_id(session_id)
            .await
            .map_err(SessionError::Store)
    }

    /// Caches a snapshot with a TTL capped at the session's remaining
    /// lifetime, so a cached entry can never outlive its row's expiry.
    async fn cache_put(&self, session: &Session, now: DateTime<Utc>) {
        let Some(cache) = &self.cache else {
            return;
        };
        let remaining = session.expires_at.signed_duration_since(now);
        let Ok(ttl) = remaining.to_std() else {
            return;
        };
        if let Err(err) = cache.put(session, ttl).await {
            tracing::warn!(
                session_id = %session.session_id,
                error = %err,
                "failed to cache session"
            );
        }
    }

    /// Best-effort last-access bookkeeping. Failures are logged and
    /// swallowed; access times are diagnostics, not authorization state.
    async fn touch(&self, session_id: &str, now: DateTime<Utc>) {
        if let Err(err) = self.store.touch_last_accessed(session_id, now).await {
            tracing::warn!(session_id, error = %err, "failed to record session access time");
        }
    }
}
