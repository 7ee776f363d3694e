pub mod cookies;
pub mod password;
pub mod session_id;

pub use cookies::*;
pub use password::*;
pub use session_id::*;
