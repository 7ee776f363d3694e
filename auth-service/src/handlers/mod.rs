pub mod auth;
pub mod sessions;

pub use auth::*;
pub use sessions::*;
