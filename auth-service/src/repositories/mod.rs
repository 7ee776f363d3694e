//! Data access for users and auth sessions.
//!
//! Each store is a trait so services can run against Postgres in
//! production and the in-memory implementations in tests.

pub mod session;
pub mod session_memory;
pub mod user;
pub mod user_memory;

pub use session::*;
pub use session_memory::*;
pub use user::*;
pub use user_memory::*;
