//! Business logic for authentication and session lifecycle.

pub mod auth;
pub mod session;
pub mod session_cache;
pub mod sweeper;

pub use auth::*;
pub use session::*;
pub use session_cache::*;
pub use sweeper::*;
