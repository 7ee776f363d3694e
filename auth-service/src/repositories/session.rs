//! Session store trait and its Postgres implementation.
//!
//! The trait is designed to be mockable using mockall for testing.
//! Use `MockSessionStore` in tests to mock the behavior.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{Session, SessionStatus};
use crate::types::UserId;

const SESSION_COLUMNS: &str =
    "session_id, user_id, status, ip_address, user_agent, created_at, expires_at, last_accessed_at";

/// Persistence operations for auth sessions.
///
/// All writes are single-statement updates; callers rely on the database
/// for atomicity and apply last-writer-wins semantics on top.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a new session row and returns it as stored.
    async fn insert(&self, session: &Session) -> anyhow::Result<Session>;

    /// Looks up a session by its identifier, regardless of status.
    async fn find_by_id(&self, session_id: &str) -> anyhow::Result<Option<Session>>;

    /// Returns the user's sessions that are active and unexpired as of
    /// `now`, oldest first. The ordering is what quota eviction keys on.
    async fn active_sessions_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Session>>;

    /// Records a validation hit. Returns false when the row is gone.
    async fn touch_last_accessed(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;

    /// Marks a single session logged out. Returns false when the row is gone.
    async fn mark_logged_out(&self, session_id: &str) -> anyhow::Result<bool>;

    /// Marks every active session of the user logged out in one statement
    /// and returns the ids that were active before the transition.
    async fn logout_user_sessions(&self, user_id: UserId) -> anyhow::Result<Vec<String>>;

    /// Moves the expiry forward (or backward) and returns the updated row.
    async fn set_expiry(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Session>>;

    /// Flips every active session whose expiry is strictly in the past to
    /// expired. Returns the number of rows changed.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> anyhow::Result<u64>;
}

/// Postgres-backed session store.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, session: &Session) -> anyhow::Result<Session> {
        let query = format!(
            "INSERT INTO auth_sessions \
             (session_id, user_id, status, ip_address, user_agent, created_at, expires_at, last_accessed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {}",
            SESSION_COLUMNS
        );
        let row = sqlx::query_as::<_, Session>(&query)
            .bind(&session.session_id)
            .bind(session.user_id)
            .bind(session.status.as_str())
            .bind(&session.ip_address)
            .bind(&session.user_agent)
            .bind(session.created_at)
            .bind(session.expires_at)
            .bind(session.last_accessed_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_id(&self, session_id: &str) -> anyhow::Result<Option<Session>> {
        let query = format!(
            "SELECT {} FROM auth_sessions WHERE session_id = $1",
            SESSION_COLUMNS
        );
        let row = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn active_sessions_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Session>> {
        let query = format!(
            "SELECT {} FROM auth_sessions \
             WHERE user_id = $1 AND status = $2 AND expires_at > $3 \
             ORDER BY created_at ASC",
            SESSION_COLUMNS
        );
        let rows = sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .bind(SessionStatus::Active.as_str())
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn touch_last_accessed(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE auth_sessions SET last_accessed_at = $2 WHERE session_id = $1")
            .bind(session_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_logged_out(&self, session_id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE auth_sessions SET status = $2 WHERE session_id = $1")
            .bind(session_id)
            .bind(SessionStatus::LoggedOut.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn logout_user_sessions(&self, user_id: UserId) -> anyhow::Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "UPDATE auth_sessions SET status = $2 \
             WHERE user_id = $1 AND status = $3 \
             RETURNING session_id",
        )
        .bind(user_id)
        .bind(SessionStatus::LoggedOut.as_str())
        .bind(SessionStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn set_expiry(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Session>> {
        let query = format!(
            "UPDATE auth_sessions SET expires_at = $2 WHERE session_id = $1 RETURNING {}",
            SESSION_COLUMNS
        );
        let row = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(expires_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "UPDATE auth_sessions SET status = $1 WHERE status = $2 AND expires_at < $3",
        )
        .bind(SessionStatus::Expired.as_str())
        .bind(SessionStatus::Active.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
