//! Models for server-side auth sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::UserId;

/// Database representation of a server-side session. The row outlives the
/// session itself: invalidated and expired sessions keep their terminal
/// status for audit instead of being deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Session {
    /// Opaque identifier handed to the client; primary key.
    pub session_id: String,
    /// User the session belongs to.
    #[schema(value_type = String)]
    pub user_id: UserId,
    /// Lifecycle status; transitions only away from `Active`.
    pub status: SessionStatus,
    /// Client IP captured at creation, immutable afterwards.
    pub ip_address: Option<String>,
    /// Client user agent captured at creation, immutable afterwards.
    pub user_agent: Option<String>,
    /// Timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// Absolute expiry; moved forward only by an explicit refresh.
    pub expires_at: DateTime<Utc>,
    /// Timestamp of the last successful validation. Advisory only.
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// The authorization predicate: `Active` status and strictly before
    /// expiry. Status alone is not trusted because the expiry sweep may
    /// lag behind wall-clock expiry.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, SessionStatus::Active) && now < self.expires_at
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }
}

/// Session lifecycle states stored in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[schema(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Live session; still subject to the expiry check.
    #[default]
    Active,
    /// Ended by an explicit logout or quota eviction.
    LoggedOut,
    /// Marked by the periodic sweep after the expiry passed.
    Expired,
}

impl SessionStatus {
    /// Returns the canonical snake_case representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::LoggedOut => "logged_out",
            SessionStatus::Expired => "expired",
        }
    }
}

impl Serialize for SessionStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SessionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            // primary canonical values (snake_case)
            "active" => Ok(SessionStatus::Active),
            "logged_out" => Ok(SessionStatus::LoggedOut),
            "expired" => Ok(SessionStatus::Expired),
            // tolerate common legacy casings
            "ACTIVE" => Ok(SessionStatus::Active),
            "LOGGED_OUT" => Ok(SessionStatus::LoggedOut),
            "EXPIRED" => Ok(SessionStatus::Expired),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["active", "logged_out", "expired"],
            )),
        }
    }
}

/// Client context captured when a session is created.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
