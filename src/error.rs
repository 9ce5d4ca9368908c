use miette::Diagnostic;
use std::io;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Failed to spawn {role}: {source}")]
    #[diagnostic(
        code(atlasctl::service::spawn_failed),
        help("Check that the command exists on PATH and is executable")
    )]
    SpawnFailure {
        role: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Timed out waiting for {} to become ready", .roles.join(", "))]
    #[diagnostic(
        code(atlasctl::service::start_timeout),
        help("Check the role's log file under the log directory, then retry `atlasctl start`")
    )]
    StartTimeout { roles: Vec<String> },

    #[error("Unknown service target: {0}")]
    #[diagnostic(
        code(atlasctl::target::unknown),
        help("Valid targets: all, web, task, app, worker, scheduler, gateway")
    )]
    UnknownTarget(String),

    #[error("{role} (pid {pid}) did not exit after SIGTERM")]
    #[diagnostic(
        code(atlasctl::service::stop_timeout),
        help("Retry with `atlasctl stop --force` to send SIGKILL")
    )]
    StopTimeout { role: &'static str, pid: u32 },

    #[error("Database connection failed")]
    #[diagnostic(
        code(atlasctl::prepare::database_unreachable),
        help("Verify the database is reachable and the credentials in your config are correct")
    )]
    DatabaseUnreachable,

    #[error("Invalid PID {pid}: {reason}")]
    InvalidPid { pid: u32, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Multiple errors occurred:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Multiple(Vec<Error>),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Exit code the binary should terminate with for this error.
    ///
    /// Database unreachability gets a distinct code (10) so init scripts can
    /// tell "retry later" from a genuine startup failure; an unknown target
    /// is a usage error (2); everything else is a plain failure (1).
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DatabaseUnreachable => 10,
            Error::UnknownTarget(_) => 2,
            _ => 1,
        }
    }

    /// Returns a helpful suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::UnknownTarget(_) => Some(
                "Valid targets: all, web, task, or a single role name (app, worker, scheduler, gateway)"
                    .to_string(),
            ),
            Error::StartTimeout { roles } => Some(format!(
                "Check the log file(s) for: {}. All attempted roles were stopped again, so a retry starts from a clean slate.",
                roles.join(", ")
            )),
            Error::SpawnFailure { role, .. } => Some(format!(
                "Verify the executable for '{}' is installed and on PATH (or set VENV to your virtualenv root)",
                role
            )),
            Error::StopTimeout { role, .. } => {
                Some(format!("Force-kill with: atlasctl stop {} --force", role))
            }
            Error::DatabaseUnreachable => Some(
                "Start the database, or check the connection settings, then run `atlasctl start` again"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

/// Validates and converts a u32 PID to nix::unistd::Pid for signal operations.
/// Returns Err for PID 0 (process group), PID 1 (init), or values > i32::MAX.
pub fn validate_pid(pid: u32, role: &'static str) -> Result<nix::unistd::Pid> {
    if pid == 0 {
        return Err(Error::InvalidPid {
            pid,
            reason: format!(
                "PID 0 is invalid for role '{}' (refers to a process group, not a process)",
                role
            ),
        });
    }
    if pid == 1 {
        return Err(Error::InvalidPid {
            pid,
            reason: format!("refusing to operate on PID 1 (init) for role '{}'", role),
        });
    }
    if pid > i32::MAX as u32 {
        return Err(Error::InvalidPid {
            pid,
            reason: format!("PID {} exceeds i32::MAX for role '{}'", pid, role),
        });
    }
    Ok(nix::unistd::Pid::from_raw(pid as i32))
}

/// Same as [`validate_pid`] but for read-only existence checks, where PID 1
/// is fine to probe. Returns None for values that cannot be probed safely.
pub fn validate_pid_for_check(pid: u32) -> Option<nix::unistd::Pid> {
    if pid == 0 || pid > i32::MAX as u32 {
        return None;
    }
    Some(nix::unistd::Pid::from_raw(pid as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_zero_rejected_for_signals() {
        assert!(validate_pid(0, "app").is_err());
    }

    #[test]
    fn pid_one_rejected_for_signals_but_allowed_for_checks() {
        assert!(validate_pid(1, "app").is_err());
        assert!(validate_pid_for_check(1).is_some());
    }

    #[test]
    fn pid_overflow_rejected_everywhere() {
        let overflow = i32::MAX as u32 + 1;
        assert!(validate_pid(overflow, "app").is_err());
        assert!(validate_pid_for_check(overflow).is_none());
        assert!(validate_pid_for_check(u32::MAX).is_none());
    }

    #[test]
    fn boundary_pids_accepted() {
        assert!(validate_pid(2, "app").is_ok());
        assert!(validate_pid(i32::MAX as u32, "app").is_ok());
        assert!(validate_pid_for_check(i32::MAX as u32).is_some());
    }

    #[test]
    fn exit_codes() {
        assert_eq!(Error::DatabaseUnreachable.exit_code(), 10);
        assert_eq!(Error::UnknownTarget("x".into()).exit_code(), 2);
        assert_eq!(
            Error::StartTimeout {
                roles: vec!["app".into()]
            }
            .exit_code(),
            1
        );
    }
}
