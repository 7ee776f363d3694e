use rand::{rngs::OsRng, RngCore};

/// Random bytes per session identifier; hex-encoding doubles the length.
const SESSION_ID_BYTES: usize = 32;

/// Generates an opaque session identifier from 256 bits of OS randomness.
/// The result is 64 hex characters, well within the 128-character column.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
