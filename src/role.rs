//! The fixed set of supervised service roles and target-name resolution.
//!
//! Resolution is pure: expanding a target string touches no process state, so
//! an unknown target is rejected before anything is spawned or signalled.

use crate::error::{Error, Result};
use std::fmt;

/// One of the four supervised service kinds making up the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// HTTP application server.
    App,
    /// Distributed task-queue worker.
    Worker,
    /// Periodic task scheduler.
    Scheduler,
    /// Realtime websocket gateway.
    Gateway,
}

impl Role {
    /// Every role, in launch order. None of the four depend on another's
    /// readiness, so the order only fixes reporting and spawn sequence.
    pub const ALL: [Role; 4] = [Role::App, Role::Worker, Role::Scheduler, Role::Gateway];

    pub fn name(self) -> &'static str {
        match self {
            Role::App => "app",
            Role::Worker => "worker",
            Role::Scheduler => "scheduler",
            Role::Gateway => "gateway",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expands a target string into the ordered list of roles it names.
///
/// `all` covers every role; `web` is the HTTP-facing pair; `task` is the
/// task-queue pair; a bare role name resolves to itself. Anything else is a
/// usage error surfaced before any process is touched.
pub fn resolve(target: &str) -> Result<Vec<Role>> {
    match target {
        "all" => Ok(Role::ALL.to_vec()),
        "web" => Ok(vec![Role::App, Role::Gateway]),
        "task" => Ok(vec![Role::Worker, Role::Scheduler]),
        other => Role::ALL
            .iter()
            .copied()
            .find(|r| r.name() == other)
            .map(|r| vec![r])
            .ok_or_else(|| Error::UnknownTarget(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn single_role_resolves_to_itself() {
        assert_eq!(resolve("app").unwrap(), vec![Role::App]);
        assert_eq!(resolve("scheduler").unwrap(), vec![Role::Scheduler]);
    }

    #[test]
    fn web_and_task_partition_all() {
        let web: HashSet<_> = resolve("web").unwrap().into_iter().collect();
        let task: HashSet<_> = resolve("task").unwrap().into_iter().collect();
        let all: HashSet<_> = resolve("all").unwrap().into_iter().collect();

        assert!(web.is_disjoint(&task), "web and task must not overlap");
        let union: HashSet<_> = web.union(&task).copied().collect();
        assert_eq!(union, all, "web + task must cover exactly all");
    }

    #[test]
    fn unknown_target_is_an_error() {
        let err = resolve("database").unwrap_err();
        assert!(matches!(err, Error::UnknownTarget(name) if name == "database"));
    }

    #[test]
    fn aliases_do_not_shadow_role_names() {
        for role in Role::ALL {
            assert_eq!(resolve(role.name()).unwrap(), vec![role]);
        }
    }
}
