//! Data models shared across database access and API handlers.

pub mod session;
pub mod user;

pub use session::*;
pub use user::*;
