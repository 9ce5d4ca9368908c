use crate::output::UserOutput;
use atlasctl::supervisor::all_stopped;
use atlasctl::{Controller, Role, StopOutcome};

pub async fn run_stop(
    controller: &mut Controller,
    roles: &[Role],
    force: bool,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let mut outcomes = Vec::with_capacity(roles.len());
    for &role in roles {
        out.progress(&format!("  Stopping {}...", role));
        let outcome = controller.stop_role(role, force).await;
        match outcome {
            StopOutcome::AlreadyStopped => out.finish_progress(" already stopped"),
            StopOutcome::Stopped => out.finish_progress(" done"),
            StopOutcome::TimedOut(pid) => {
                out.finish_progress(" still running");
                if force {
                    out.warning(&format!("Warning: {} (pid {}) did not exit", role, pid));
                } else {
                    out.warning(&format!(
                        "Warning: {} (pid {}) did not exit after SIGTERM; retry with --force",
                        role, pid
                    ));
                }
            }
        }
        outcomes.push((role, outcome));
    }
    if all_stopped(&outcomes) {
        out.status("Services stopped");
    } else {
        out.warning("Some services did not stop");
    }
    Ok(())
}

/// Prints per-role stop outcomes; returns true when every role confirmed
/// stopped.
pub(crate) fn report_outcomes(outcomes: &[(Role, StopOutcome)], out: &dyn UserOutput) -> bool {
    let mut clean = true;
    for (role, outcome) in outcomes {
        match outcome {
            StopOutcome::AlreadyStopped | StopOutcome::Stopped => {
                out.status(&format!("{} is stopped", role));
            }
            StopOutcome::TimedOut(pid) => {
                out.warning(&format!("{} is still running: {}", role, pid));
                clean = false;
            }
        }
    }
    clean
}
