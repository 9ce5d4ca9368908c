//! File-backed PID registry: one `<role>.pid` file per role.
//!
//! The registry is the only state shared across invocations of the control
//! program. A record is a hint, not a lock: every reader re-validates it with
//! a signal-zero liveness probe before trusting it, and a stale record (file
//! present, process gone) is reaped on detection. Two concurrent invocations
//! touching the same role can race to spawn duplicates; that window is a
//! documented limitation of the file-based design, not something the
//! registry guards against.

use crate::error::{validate_pid_for_check, Result};
use crate::role::Role;
use nix::sys::signal;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct PidRegistry {
    dir: PathBuf,
}

impl PidRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        PidRegistry { dir: dir.into() }
    }

    /// Path of the record file for a role.
    pub fn path(&self, role: Role) -> PathBuf {
        self.dir.join(format!("{}.pid", role.name()))
    }

    /// Persists `pid` for `role`, overwriting any prior record. Durable:
    /// visible to later reads from this or any other invocation.
    pub fn write(&self, role: Role, pid: u32) -> Result<()> {
        if let Some(parent) = self.path(role).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(self.path(role), pid.to_string())?;
        Ok(())
    }

    /// Last written pid, or None when no record exists or the file does not
    /// parse as a pid. An unparsable record reads as absent, not as an error.
    pub fn read(&self, role: Role) -> Option<u32> {
        let raw = fs::read_to_string(self.path(role)).ok()?;
        raw.trim().parse().ok()
    }

    /// Removes the record. Idempotent: clearing an absent record is a no-op.
    pub fn clear(&self, role: Role) {
        match fs::remove_file(self.path(role)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("could not remove {} pid file: {}", role, e),
        }
    }

    /// The recorded pid, if the record exists and the process is alive.
    ///
    /// The probe consults the OS process table without touching the target
    /// (signal zero). A record whose process is gone, or whose pid cannot be
    /// probed safely, is cleared as a side effect, so a `read` after this
    /// returns None is not stable.
    pub fn live_pid(&self, role: Role) -> Option<u32> {
        let pid = self.read(role)?;
        let nix_pid = match validate_pid_for_check(pid) {
            Some(p) => p,
            None => {
                tracing::warn!("{} pid file holds unusable pid {}, clearing", role, pid);
                self.clear(role);
                return None;
            }
        };
        if signal::kill(nix_pid, None).is_ok() {
            Some(pid)
        } else {
            tracing::debug!("reaping stale {} pid file (pid {} is gone)", role, pid);
            self.clear(role);
            None
        }
    }

    /// True iff a record exists and its process is alive. See [`live_pid`]
    /// for the stale-record side effect.
    ///
    /// [`live_pid`]: PidRegistry::live_pid
    pub fn is_live(&self, role: Role) -> bool {
        self.live_pid(role).is_some()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
