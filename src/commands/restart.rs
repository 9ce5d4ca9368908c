use crate::commands::{run_start, run_stop};
use crate::output::UserOutput;
use atlasctl::controller::RESTART_GRACE;
use atlasctl::{Controller, Role, Settings};

/// Stop, a short grace delay, then start. The subsequent start always runs
/// detached regardless of how restart itself was invoked, so a restart from
/// a script never blocks in the foreground.
pub async fn run_restart(
    controller: &mut Controller,
    settings: &Settings,
    roles: &[Role],
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    run_stop(controller, roles, false, out).await?;

    tokio::time::sleep(RESTART_GRACE).await;

    let mut detached = settings.clone();
    detached.daemon = true;
    controller.set_daemon(true);
    run_start(controller, &detached, roles, out).await
}
