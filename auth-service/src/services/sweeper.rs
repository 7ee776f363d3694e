//! Background task that periodically expires overdue sessions.

use std::sync::Arc;
use std::time::Duration;

use crate::services::SessionService;

/// Runs the expiry sweep forever at a fixed cadence.
///
/// The first pass fires immediately, which also catches rows that went
/// overdue while the service was down. A failed pass is logged and
/// retried on the next tick.
pub async fn run_sweeper(sessions: Arc<SessionService>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        if let Err(err) = sessions.sweep_expired().await {
            tracing::error!(error = %err, "session sweep failed");
        }
    }
}
