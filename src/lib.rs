//! # atlasctl
//!
//! Control program for the Atlas application stack: starts, monitors, and
//! tears down the four cooperating long-running services (HTTP application
//! server, task-queue worker, periodic scheduler, realtime gateway) that
//! form one deployment on a single host.
//!
//! The supervisor itself keeps no resident process: "is X running" is
//! durable in one PID file per role, re-validated against the OS process
//! table on every read. Repeated, independent invocations (`start`, later
//! `stop`, later `status`) therefore compose correctly, and a start that
//! cannot bring the whole group up rolls back to a fully stopped group.
//!
//! ## Quick start
//!
//! ```no_run
//! use atlasctl::{resolve, Controller, Settings};
//!
//! # async fn example() -> Result<(), atlasctl::Error> {
//! let settings = Settings::load("/srv/atlas")?;
//! let roles = resolve("all")?;
//! let mut controller = Controller::new(settings);
//! controller.start(&roles).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency model
//!
//! The supervisor is single-threaded cooperative control logic; the
//! supervised roles are independent OS processes. The only blocking points
//! are the readiness poller's interval sleep, the bounded wait-for-exit in
//! `stop`, and the foreground signal wait, which is unbounded by design but
//! always cancellable by the termination signal.

pub mod config;
pub mod controller;
pub mod error;
pub mod launcher;
pub mod prepare;
pub mod readiness;
pub mod registry;
pub mod role;
pub mod supervisor;

pub use config::Settings;
pub use controller::{Controller, ObservedState, StopOutcome};
pub use error::{Error, Result};
pub use launcher::{Descriptor, LaunchHandle, LaunchSpec, Launcher};
pub use registry::PidRegistry;
pub use role::{resolve, Role};
pub use supervisor::ShutdownSupervisor;
