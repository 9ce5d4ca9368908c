//! One-shot preparation steps run before an attached or detached `start`
//! that brings up the application server: database connectivity check,
//! schema migrations, and static-asset collection.
//!
//! These are external collaborators, not supervised services; each is a thin
//! wrapper around the platform's management command using the configured
//! interpreter.

use crate::config::Settings;
use crate::error::{Error, Result};
use std::time::Duration;
use tokio::process::Command;

/// Attempts per second while waiting for the database.
const DB_RETRIES: u32 = 60;

/// Runs all preparation steps in order. Database unreachability is fatal
/// (distinct exit code); migration and static-collection failures are logged
/// and tolerated, matching their best-effort contract.
pub async fn run(settings: &Settings) -> Result<()> {
    check_database(settings).await?;
    migrate(settings).await;
    collect_static(settings).await;
    Ok(())
}

async fn manage(settings: &Settings, args: &[&str]) -> std::io::Result<bool> {
    let status = Command::new(settings.python())
        .arg("manage.py")
        .args(args)
        .current_dir(&settings.base_dir)
        .envs(settings.process_env())
        .status()
        .await?;
    Ok(status.success())
}

/// Probes the database once per second with a cheap migration-status query
/// until it answers or the retries are exhausted.
pub async fn check_database(settings: &Settings) -> Result<()> {
    for attempt in 1..=DB_RETRIES {
        tracing::info!("checking database connection (attempt {})", attempt);
        match manage(settings, &["showmigrations", "auth"]).await {
            Ok(true) => {
                tracing::info!("database connection ok");
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => tracing::debug!("database probe failed to run: {}", e),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    Err(Error::DatabaseUnreachable)
}

/// Applies pending schema changes. Best effort: a failed migration is
/// surfaced in the logs but does not block startup.
pub async fn migrate(settings: &Settings) {
    tracing::info!("checking for database structure changes");
    for args in [&["makemigrations"][..], &["migrate"][..]] {
        match manage(settings, args).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("manage.py {} exited non-zero", args.join(" ")),
            Err(e) => tracing::warn!("could not run manage.py {}: {}", args.join(" "), e),
        }
    }
}

/// Collects static assets into the shared static directory. Best effort.
pub async fn collect_static(settings: &Settings) {
    tracing::info!("collecting static files");
    match manage(settings, &["collectstatic", "--no-input"]).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!("collectstatic exited non-zero"),
        Err(e) => tracing::warn!("could not run collectstatic: {}", e),
    }
}
