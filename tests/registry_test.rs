//! PID registry behavior across independent invocations: durability,
//! unparsable records, and lazy stale-record reaping.

use atlasctl::{PidRegistry, Role};
use tempfile::TempDir;

/// A pid that belonged to a process which has already exited.
fn dead_pid() -> u32 {
    let mut child = std::process::Command::new("true")
        .spawn()
        .expect("spawn true");
    let pid = child.id();
    child.wait().expect("wait");
    pid
}

#[test]
fn record_survives_registry_reconstruction() {
    let dir = TempDir::new().unwrap();
    {
        let registry = PidRegistry::new(dir.path());
        registry.write(Role::App, 4242).unwrap();
    }
    // A fresh instance models a later, independent invocation.
    let registry = PidRegistry::new(dir.path());
    assert_eq!(registry.read(Role::App), Some(4242));
}

#[test]
fn write_overwrites_prior_record() {
    let dir = TempDir::new().unwrap();
    let registry = PidRegistry::new(dir.path());
    registry.write(Role::Worker, 100).unwrap();
    registry.write(Role::Worker, 200).unwrap();
    assert_eq!(registry.read(Role::Worker), Some(200));
}

#[test]
fn unparsable_record_reads_as_absent() {
    let dir = TempDir::new().unwrap();
    let registry = PidRegistry::new(dir.path());
    std::fs::write(registry.path(Role::Gateway), "not-a-pid\n").unwrap();
    assert_eq!(registry.read(Role::Gateway), None);
}

#[test]
fn clear_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let registry = PidRegistry::new(dir.path());
    // Clearing an absent record is a no-op.
    registry.clear(Role::Scheduler);
    registry.write(Role::Scheduler, 7).unwrap();
    registry.clear(Role::Scheduler);
    registry.clear(Role::Scheduler);
    assert_eq!(registry.read(Role::Scheduler), None);
}

#[test]
fn live_pid_accepts_a_running_process() {
    let dir = TempDir::new().unwrap();
    let registry = PidRegistry::new(dir.path());
    // Our own pid is certainly alive.
    registry.write(Role::App, std::process::id()).unwrap();
    assert_eq!(registry.live_pid(Role::App), Some(std::process::id()));
    assert!(registry.is_live(Role::App));
    // A successful probe must not disturb the record.
    assert_eq!(registry.read(Role::App), Some(std::process::id()));
}

#[test]
fn stale_record_is_reaped_on_probe() {
    let dir = TempDir::new().unwrap();
    let registry = PidRegistry::new(dir.path());
    registry.write(Role::Worker, dead_pid()).unwrap();

    assert!(!registry.is_live(Role::Worker));
    // The probe removed the file: a subsequent read returns absent.
    assert_eq!(registry.read(Role::Worker), None);
    assert!(!registry.path(Role::Worker).exists());
}

#[test]
fn unusable_pid_record_is_cleared() {
    let dir = TempDir::new().unwrap();
    let registry = PidRegistry::new(dir.path());

    registry.write(Role::Gateway, 0).unwrap();
    assert!(!registry.is_live(Role::Gateway));
    assert_eq!(registry.read(Role::Gateway), None);

    registry.write(Role::Gateway, u32::MAX).unwrap();
    assert!(!registry.is_live(Role::Gateway));
    assert_eq!(registry.read(Role::Gateway), None);
}

#[test]
fn records_are_per_role() {
    let dir = TempDir::new().unwrap();
    let registry = PidRegistry::new(dir.path());
    registry.write(Role::App, 11).unwrap();
    registry.write(Role::Gateway, 22).unwrap();
    registry.clear(Role::App);
    assert_eq!(registry.read(Role::App), None);
    assert_eq!(registry.read(Role::Gateway), Some(22));
}
