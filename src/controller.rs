//! Lifecycle orchestration over a resolved group of roles.
//!
//! Every operation is idempotent per role and computes observed state on
//! demand from the registry plus the OS process table; nothing is cached
//! across invocations. A `start` that times out always resolves to an
//! explicit rollback of the whole attempted group, never to a half-running
//! stack.

use crate::config::Settings;
use crate::error::{validate_pid, Error, Result};
use crate::launcher::{Descriptor, LaunchHandle, Launcher};
use crate::readiness;
use crate::registry::PidRegistry;
use crate::role::Role;
use nix::sys::signal::{self, Signal};
use std::time::Duration;

/// How long a stopped role gets to exit after SIGTERM before we give up
/// (bounded retry; `stop` does not escalate on its own).
const STOP_GRACE: Duration = Duration::from_secs(5);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Pause between `stop` and `start` during a restart.
pub const RESTART_GRACE: Duration = Duration::from_secs(5);

/// What the registry plus the process table say about a role right now.
/// Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedState {
    Running(u32),
    Stopped,
}

/// Per-role result of a stop attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The role was not running; nothing was signalled.
    AlreadyStopped,
    /// The process exited and its record was cleared.
    Stopped,
    /// The process ignored the termination request within the bounded wait;
    /// its record is left in place.
    TimedOut(u32),
}

pub struct Controller {
    settings: Settings,
    registry: PidRegistry,
    descriptors: Vec<Descriptor>,
    /// Processes spawned by this invocation's `start`, kept so foreground
    /// shutdown and rollback can signal and reap children directly instead
    /// of racing a registry re-read.
    launched: Vec<LaunchHandle>,
}

impl Controller {
    /// Controller over the production descriptors for all four roles.
    pub fn new(settings: Settings) -> Self {
        let descriptors = Role::ALL
            .iter()
            .map(|&role| Descriptor::build(role, &settings))
            .collect();
        Controller::with_descriptors(settings, descriptors)
    }

    /// Controller over explicit descriptors. This is the seam integration
    /// tests use to supervise stand-in commands instead of the real stack.
    pub fn with_descriptors(settings: Settings, descriptors: Vec<Descriptor>) -> Self {
        let registry = PidRegistry::new(settings.pid_dir.clone());
        Controller {
            settings,
            registry,
            descriptors,
            launched: Vec::new(),
        }
    }

    pub fn registry(&self) -> &PidRegistry {
        &self.registry
    }

    /// Switches subsequent launches to detached mode (restart always
    /// re-launches detached).
    pub fn set_daemon(&mut self, daemon: bool) {
        self.settings.daemon = daemon;
    }

    fn descriptor(&self, role: Role) -> Result<&Descriptor> {
        self.descriptors
            .iter()
            .find(|d| d.role == role)
            .ok_or_else(|| Error::UnknownTarget(role.name().to_string()))
    }

    /// Starts every role in the group that is not already live, then waits
    /// for the whole group to become ready.
    ///
    /// Already-live roles are skipped with their pid untouched. Spawn
    /// failures are collected per role; any failure aborts the attempt and
    /// rolls the group back, as does a readiness timeout, so the group is
    /// left fully stopped on error. On success, returns the observed state
    /// of every role in the group.
    pub async fn start(&mut self, roles: &[Role]) -> Result<Vec<(Role, ObservedState)>> {
        let mut spawn_errors: Vec<Error> = Vec::new();

        for &role in roles {
            if let Some(pid) = self.registry.live_pid(role) {
                tracing::info!("{} already running (pid {}), skipping spawn", role, pid);
                continue;
            }
            let descriptor = match self.descriptor(role) {
                Ok(d) => d.clone(),
                Err(e) => {
                    spawn_errors.push(e);
                    continue;
                }
            };
            let result = {
                let launcher = Launcher::new(&self.settings, &self.registry);
                launcher.launch(&descriptor).await
            };
            match result {
                Ok(handle) => self.launched.push(handle),
                Err(e) => {
                    tracing::error!("{}", e);
                    spawn_errors.push(e);
                }
            }
        }

        if !spawn_errors.is_empty() {
            self.rollback(roles).await;
            return Err(match spawn_errors.len() {
                1 => spawn_errors.swap_remove(0),
                _ => Error::Multiple(spawn_errors),
            });
        }

        let wait = readiness::await_ready(
            &self.registry,
            roles,
            self.settings.start_timeout(),
            &mut self.launched,
        )
        .await;

        match wait {
            Ok(()) => Ok(self.status(roles)),
            Err(unready) => {
                self.rollback(roles).await;
                Err(Error::StartTimeout {
                    roles: unready.iter().map(|r| r.name().to_string()).collect(),
                })
            }
        }
    }

    /// Stops one role: no-op when not live, otherwise a termination request
    /// followed by a bounded wait for exit, clearing the record once the
    /// process is confirmed gone. `force` sends SIGKILL instead of SIGTERM.
    /// A process that ignores the request is reported as timed out with its
    /// record left in place; escalation is the operator's call, never ours.
    pub async fn stop_role(&mut self, role: Role, force: bool) -> StopOutcome {
        // Children of this invocation are signalled and reaped through their
        // handles; a process-table poll would see our own zombie as alive.
        if let Some(idx) = self.launched.iter().position(|h| h.role == role) {
            let mut handle = self.launched.swap_remove(idx);
            if force {
                handle.kill_now();
            } else {
                handle.terminate();
            }
            if handle.wait_exit(STOP_GRACE).await {
                self.registry.clear(role);
                return StopOutcome::Stopped;
            }
            let pid = handle.pid;
            tracing::warn!(
                "{} (pid {}) did not exit within the stop grace period",
                role,
                pid
            );
            // Keep the handle so a later forced stop reaps the child through
            // the same path.
            self.launched.push(handle);
            return StopOutcome::TimedOut(pid);
        }

        let Some(pid) = self.registry.live_pid(role) else {
            return StopOutcome::AlreadyStopped;
        };
        let nix_pid = match validate_pid(pid, role.name()) {
            Ok(p) => p,
            Err(e) => {
                // A pid we refuse to signal (e.g. init) cannot be ours;
                // drop the record rather than act on it.
                tracing::warn!("{}", e);
                self.registry.clear(role);
                return StopOutcome::AlreadyStopped;
            }
        };

        let sig = if force {
            Signal::SIGKILL
        } else {
            Signal::SIGTERM
        };
        tracing::info!("stopping {} (pid {}) with {}", role, pid, sig);
        if signal::kill(nix_pid, sig).is_err() {
            // Gone between the probe and the signal.
            self.registry.clear(role);
            return StopOutcome::Stopped;
        }

        let polls = (STOP_GRACE.as_millis() / STOP_POLL_INTERVAL.as_millis()).max(1);
        for _ in 0..polls {
            tokio::time::sleep(STOP_POLL_INTERVAL).await;
            if signal::kill(nix_pid, None).is_err() {
                self.registry.clear(role);
                return StopOutcome::Stopped;
            }
        }
        StopOutcome::TimedOut(pid)
    }

    /// Stops every role in the group, collecting per-role outcomes. A role
    /// that will not exit is reported, not retried indefinitely.
    pub async fn stop(&mut self, roles: &[Role], force: bool) -> Vec<(Role, StopOutcome)> {
        let mut outcomes = Vec::with_capacity(roles.len());
        for &role in roles {
            outcomes.push((role, self.stop_role(role, force).await));
        }
        outcomes
    }

    /// Observed state of each role, read-only apart from the stale-record
    /// reaping inherent in the liveness probe.
    pub fn status(&self, roles: &[Role]) -> Vec<(Role, ObservedState)> {
        roles
            .iter()
            .map(|&role| {
                let state = match self.registry.live_pid(role) {
                    Some(pid) => ObservedState::Running(pid),
                    None => ObservedState::Stopped,
                };
                (role, state)
            })
            .collect()
    }

    /// Sends SIGTERM directly to every process this invocation launched and
    /// reaps them. Used by the foreground shutdown path before the registry
    /// reconciliation stop.
    pub async fn terminate_launched(&mut self) {
        let handles = std::mem::take(&mut self.launched);
        for handle in &handles {
            handle.terminate();
        }
        for mut handle in handles {
            if handle.wait_exit(STOP_GRACE).await {
                self.registry.clear(handle.role);
            } else {
                tracing::warn!(
                    "{} (pid {}) still running after SIGTERM, leaving for reconcile",
                    handle.role,
                    handle.pid
                );
            }
        }
    }

    /// Force-stops every role in the group after a failed start, leaving it
    /// fully stopped so a retry sees a clean slate.
    async fn rollback(&mut self, roles: &[Role]) {
        tracing::warn!("start failed, force-stopping the whole group");
        let (group, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut self.launched)
            .into_iter()
            .partition(|h| roles.contains(&h.role));
        self.launched = keep;
        for mut handle in group {
            handle.kill_now();
            let _ = handle.wait_exit(Duration::from_secs(5)).await;
            self.registry.clear(handle.role);
        }
        // Roles that were live before this invocation are part of the group
        // too; the rollback contract covers them as well.
        for &role in roles {
            if self.registry.is_live(role) {
                let _ = self.stop_role(role, true).await;
            }
        }
    }
}
