use std::sync::Arc;

use crate::config::Config;
use crate::repositories::UserStore;
use crate::services::{AuthService, SessionService};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: Arc<AuthService>,
    pub sessions: Arc<SessionService>,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        auth: Arc<AuthService>,
        sessions: Arc<SessionService>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            config,
            auth,
            sessions,
            users,
        }
    }
}
