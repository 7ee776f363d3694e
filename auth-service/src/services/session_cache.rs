//! Read-through cache for session snapshots.
//!
//! The cache is an optimization layer only. Every implementation error
//! is reported to the caller, and the session service treats any cache
//! failure as a miss so the database remains the source of truth.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;

use crate::db::redis::RedisPool;
use crate::models::Session;

/// Cache keys are the session id under this prefix.
pub const SESSION_KEY_PREFIX: &str = "session:";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Stores a session snapshot under its id for at most `ttl`.
    /// A zero `ttl` is a no-op.
    async fn put(&self, session: &Session, ttl: Duration) -> anyhow::Result<()>;

    /// Fetches a cached snapshot. `None` means a miss, not a failure.
    async fn get(&self, session_id: &str) -> anyhow::Result<Option<Session>>;

    /// Drops a cached snapshot. Deleting an absent key is not an error.
    async fn delete(&self, session_id: &str) -> anyhow::Result<()>;
}

fn session_key(session_id: &str) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, session_id)
}

/// Redis-backed cache used in production.
pub struct RedisSessionCache {
    pool: RedisPool,
}

impl RedisSessionCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn put(&self, session: &Session, ttl: Duration) -> anyhow::Result<()> {
        let span = tracing::debug_span!("redis_cache_session", session_id = %session.session_id);
        let _enter = span.enter();

        let ttl_seconds = ttl.as_secs();
        if ttl_seconds == 0 {
            return Ok(());
        }

        let mut conn = self.pool.get().await?;
        let key = session_key(&session.session_id);
        let payload = serde_json::to_string(session)?;
        conn.set_ex::<_, _, ()>(&key, payload, ttl_seconds).await?;
        Ok(())
    }

    async fn get(&self, session_id: &str) -> anyhow::Result<Option<Session>> {
        let span = tracing::debug_span!("redis_get_session", session_id);
        let _enter = span.enter();

        let mut conn = self.pool.get().await?;
        let key = session_key(session_id);
        let payload: Option<String> = conn.get(&key).await?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &str) -> anyhow::Result<()> {
        let span = tracing::debug_span!("redis_delete_session", session_id);
        let _enter = span.enter();

        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(session_key(session_id)).await?;
        Ok(())
    }
}

struct CacheEntry {
    session: Session,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }
}

/// Process-local cache with per-entry TTLs.
///
/// Used by tests and by deployments that run without Redis. Expired
/// entries are dropped lazily on read.
#[derive(Default)]
pub struct MemorySessionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a fresh snapshot exists for the id. Test helper.
    pub fn contains(&self, session_id: &str) -> bool {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .get(&session_key(session_id))
                    .map(CacheEntry::is_fresh)
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn put(&self, session: &Session, ttl: Duration) -> anyhow::Result<()> {
        if ttl.is_zero() {
            return Ok(());
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("session cache lock poisoned"))?;
        entries.insert(
            session_key(&session.session_id),
            CacheEntry {
                session: session.clone(),
                inserted_at: Instant::now(),
                ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, session_id: &str) -> anyhow::Result<Option<Session>> {
        let key = session_key(session_id);
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("session cache lock poisoned"))?;
        match entries.get(&key) {
            Some(entry) if entry.is_fresh() => Ok(Some(entry.session.clone())),
            Some(_) => {
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &str) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("session cache lock poisoned"))?;
        entries.remove(&session_key(session_id));
        Ok(())
    }
}
