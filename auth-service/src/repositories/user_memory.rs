//! In-memory user store for tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::models::User;
use crate::repositories::UserStore;
use crate::types::UserId;

#[derive(Default)]
pub struct MemoryUserStore {
    rows: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &User) -> anyhow::Result<User> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        if rows.values().any(|u| u.email == user.email) {
            anyhow::bail!("duplicate email: {}", user.email);
        }
        rows.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        Ok(rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> anyhow::Result<Option<User>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        Ok(rows.get(&id).cloned())
    }

    async fn email_exists(&self, email: &str) -> anyhow::Result<bool> {
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))?;
        Ok(rows.values().any(|u| u.email == email))
    }
}
