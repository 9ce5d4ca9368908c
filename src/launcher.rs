//! Spawns one service's process and records its identity.
//!
//! The launcher starts a role's process, writes its pid to the registry
//! immediately, and hands back an in-memory [`LaunchHandle`]. It never waits
//! for the process to become ready; readiness is the poller's concern.

use crate::config::Settings;
use crate::error::{validate_pid, Error, Result};
use crate::registry::PidRegistry;
use crate::role::Role;
use nix::sys::signal::{self, Signal};
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

/// Fully resolved command line for one role.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        LaunchSpec {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: Vec::new(),
        }
    }

    fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.env.push((key.to_string(), value.into()));
        self
    }
}

/// Static description of one supervised role: its identity, where its output
/// goes in detached mode, and how to launch it.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub role: Role,
    pub log_file: PathBuf,
    pub spec: LaunchSpec,
}

impl Descriptor {
    /// The production descriptor for a role, with the launch command built
    /// from the current settings.
    pub fn build(role: Role, settings: &Settings) -> Self {
        Descriptor {
            role,
            log_file: settings.log_file(role),
            spec: launch_spec(role, settings),
        }
    }
}

/// Builds the concrete command line for each role.
///
/// The worker count applies to the roles that support it (application server
/// and task worker); the scheduler and gateway ignore it.
fn launch_spec(role: Role, settings: &Settings) -> LaunchSpec {
    match role {
        Role::App => {
            let bind = format!("{}:{}", settings.http_host, settings.http_port);
            LaunchSpec::new(
                "gunicorn",
                &[
                    "atlas.wsgi",
                    "-b",
                    &bind,
                    "-k",
                    "gthread",
                    "--threads",
                    "10",
                    "-w",
                    &settings.workers.to_string(),
                    "--max-requests",
                    "4096",
                    "--access-logfile",
                    "-",
                ],
            )
        }
        Role::Worker => LaunchSpec::new(
            "celery",
            &[
                "worker",
                "-A",
                "atlas_tasks",
                "-l",
                &settings.log_level,
                "-c",
                &settings.workers.to_string(),
            ],
        )
        .optimized(),
        Role::Scheduler => LaunchSpec::new(
            "celery",
            &[
                "beat",
                "-A",
                "atlas_tasks",
                "-l",
                &settings.log_level,
                "--scheduler",
                "atlas_tasks.schedulers:DatabaseScheduler",
                "--max-interval",
                "60",
            ],
        )
        .optimized(),
        Role::Gateway => LaunchSpec::new(
            "daphne",
            &[
                "atlas.asgi:application",
                "-b",
                &settings.http_host,
                "-p",
                &settings.gateway_port().to_string(),
            ],
        ),
    }
}

impl LaunchSpec {
    /// Environment the task-queue roles need: bytecode optimization on, and
    /// permission to run under root when the supervisor does.
    fn optimized(self) -> Self {
        let spec = self.env("PYTHONOPTIMIZE", "1");
        if nix::unistd::getuid().is_root() {
            spec.env("C_FORCE_ROOT", "1")
        } else {
            spec
        }
    }
}

/// In-memory association between a role and the process this invocation
/// spawned for it. Held only by the invocation that performed the start;
/// used to signal and reap children directly instead of going back through
/// the registry.
pub struct LaunchHandle {
    pub role: Role,
    pub pid: u32,
    child: Child,
}

impl LaunchHandle {
    /// Sends a graceful termination request to the child.
    pub fn terminate(&self) {
        self.signal(Signal::SIGTERM);
    }

    /// Sends an immediate kill to the child.
    pub fn kill_now(&self) {
        self.signal(Signal::SIGKILL);
    }

    fn signal(&self, sig: Signal) {
        match validate_pid(self.pid, self.role.name()) {
            Ok(pid) => {
                if let Err(e) = signal::kill(pid, sig) {
                    tracing::debug!("{}: {} not delivered to pid {}: {}", self.role, sig, self.pid, e);
                }
            }
            Err(e) => tracing::warn!("{}: {}", self.role, e),
        }
    }

    /// Reaps the child if it has already exited, so the process-table probe
    /// does not mistake a zombie for a live service.
    pub fn reap(&mut self) {
        let _ = self.child.try_wait();
    }

    /// Waits up to `timeout` for the child to exit, reaping it. Returns true
    /// if the child exited within the window.
    pub async fn wait_exit(&mut self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.child.wait())
            .await
            .is_ok()
    }
}

/// Starts role processes and records their pids.
pub struct Launcher<'a> {
    settings: &'a Settings,
    registry: &'a PidRegistry,
}

impl<'a> Launcher<'a> {
    pub fn new(settings: &'a Settings, registry: &'a PidRegistry) -> Self {
        Launcher { settings, registry }
    }

    /// Spawns the descriptor's process and persists its pid.
    ///
    /// Output goes to the supervisor's own streams in foreground mode and is
    /// appended to the role's log file in detached mode. A spawn failure
    /// (missing executable, permissions) writes no record and is a hard
    /// failure for this role only.
    pub async fn launch(&self, descriptor: &Descriptor) -> Result<LaunchHandle> {
        let role = descriptor.role;
        let mut cmd = Command::new(&descriptor.spec.program);
        cmd.args(&descriptor.spec.args)
            .current_dir(&self.settings.base_dir)
            .envs(self.settings.process_env())
            .envs(descriptor.spec.env.iter().cloned())
            .kill_on_drop(false);

        if self.settings.daemon {
            let log = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&descriptor.log_file)
                .map_err(|source| Error::SpawnFailure {
                    role: role.name(),
                    source,
                })?;
            let log_err = log.try_clone().map_err(|source| Error::SpawnFailure {
                role: role.name(),
                source,
            })?;
            cmd.stdout(Stdio::from(log))
                .stderr(Stdio::from(log_err))
                .stdin(Stdio::null());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        tracing::debug!(
            "spawning {}: {} {}",
            role,
            descriptor.spec.program,
            descriptor.spec.args.join(" ")
        );

        let child = cmd.spawn().map_err(|source| Error::SpawnFailure {
            role: role.name(),
            source,
        })?;

        let pid = child.id().ok_or_else(|| Error::SpawnFailure {
            role: role.name(),
            source: io::Error::new(io::ErrorKind::Other, "process exited before pid capture"),
        })?;

        self.registry.write(role, pid)?;
        tracing::info!("started {} (pid {})", role, pid);

        Ok(LaunchHandle { role, pid, child })
    }
}
