//! Foreground shutdown: owns the controlling process's lifetime after a
//! successful attached `start`.
//!
//! Modeled as an explicit state machine rather than ad hoc interrupt
//! handling: `Attached -> AwaitingSignal -> Terminating -> Stopped`. The
//! signal wait is the only intentionally unbounded suspension point in the
//! system; it is an event wait, not a spin loop, and is always resolved by
//! an operator signal (SIGTERM or Ctrl-C).

use crate::controller::{Controller, StopOutcome};
use crate::error::Result;
use crate::role::Role;
use tokio::signal::unix::{signal, SignalKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Attached,
    AwaitingSignal,
    Terminating,
    Stopped,
}

pub struct ShutdownSupervisor {
    roles: Vec<Role>,
    state: State,
}

impl ShutdownSupervisor {
    pub fn new(roles: Vec<Role>) -> Self {
        ShutdownSupervisor {
            roles,
            state: State::Attached,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Blocks until a termination request arrives, then drives an orderly
    /// stop of everything the controller launched. Returns the per-role stop
    /// outcomes so the caller can derive the exit status.
    pub async fn run(mut self, controller: &mut Controller) -> Result<Vec<(Role, StopOutcome)>> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        self.state = State::AwaitingSignal;
        tracing::info!("attached; waiting for SIGTERM or Ctrl-C");

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            _ = sigint.recv() => tracing::info!("interrupted"),
        }

        Ok(self.terminate(controller).await)
    }

    /// The `Terminating` transition: graceful termination of this
    /// invocation's own children first (via their launch handles, so a
    /// concurrent external stop cannot race us into signalling a reused
    /// pid), then a registry-level stop of the whole role set to reconcile
    /// records and catch stragglers.
    pub async fn terminate(&mut self, controller: &mut Controller) -> Vec<(Role, StopOutcome)> {
        self.state = State::Terminating;
        tracing::info!("stopping services");

        controller.terminate_launched().await;
        let outcomes = controller.stop(&self.roles, false).await;

        self.state = State::Stopped;
        outcomes
    }
}

/// True when every outcome confirms the role is down.
pub fn all_stopped(outcomes: &[(Role, StopOutcome)]) -> bool {
    outcomes
        .iter()
        .all(|(_, outcome)| !matches!(outcome, StopOutcome::TimedOut(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_attached() {
        let supervisor = ShutdownSupervisor::new(vec![Role::App]);
        assert_eq!(supervisor.state(), State::Attached);
    }

    #[test]
    fn all_stopped_rejects_timeouts() {
        assert!(all_stopped(&[
            (Role::App, StopOutcome::Stopped),
            (Role::Worker, StopOutcome::AlreadyStopped),
        ]));
        assert!(!all_stopped(&[
            (Role::App, StopOutcome::Stopped),
            (Role::Worker, StopOutcome::TimedOut(42)),
        ]));
    }
}
