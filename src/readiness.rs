//! Bounded polling until a group of roles is observed live.

use crate::launcher::LaunchHandle;
use crate::registry::PidRegistry;
use crate::role::Role;
use std::time::Duration;
use tokio::time::Instant;

/// Interval between liveness probes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Blocks until every role in `roles` is observed live, or `timeout` elapses.
///
/// Roles do not have to come up at the same tick; success only requires the
/// whole set to be live by the time it is fully satisfied. Exited children in
/// `handles` are reaped before each probe so the process-table check cannot
/// report a zombie as running. On timeout the unready roles are returned and
/// no cleanup is performed; rollback is the caller's responsibility.
pub async fn await_ready(
    registry: &PidRegistry,
    roles: &[Role],
    timeout: Duration,
    handles: &mut [LaunchHandle],
) -> std::result::Result<(), Vec<Role>> {
    let deadline = Instant::now() + timeout;
    loop {
        for handle in handles.iter_mut() {
            handle.reap();
        }
        let pending: Vec<Role> = roles
            .iter()
            .copied()
            .filter(|&role| !registry.is_live(role))
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            tracing::warn!(
                "readiness window elapsed with {} role(s) not live: {}",
                pending.len(),
                pending
                    .iter()
                    .map(|r| r.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return Err(pending);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
