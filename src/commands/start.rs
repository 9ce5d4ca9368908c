use crate::commands::stop::report_outcomes;
use crate::output::UserOutput;
use atlasctl::supervisor::ShutdownSupervisor;
use atlasctl::{prepare, Controller, ObservedState, Role, Settings};

pub async fn run_start(
    controller: &mut Controller,
    settings: &Settings,
    roles: &[Role],
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    // Preparation runs only when this invocation will actually bring the
    // application server up, not when it is already live.
    if roles.contains(&Role::App) && !controller.registry().is_live(Role::App) {
        out.status("Preparing application (database, migrations, static assets)...");
        prepare::run(settings).await?;
    }

    let states = controller.start(roles).await?;
    out.blank();
    for (role, state) in &states {
        match state {
            ObservedState::Running(pid) => out.status(&format!("{} is running: {}", role, pid)),
            ObservedState::Stopped => out.status(&format!("{} is stopped", role)),
        }
    }

    if settings.daemon {
        out.success("Services started");
        return Ok(());
    }

    out.status("Attached; press Ctrl-C or send SIGTERM to stop");
    let supervisor = ShutdownSupervisor::new(roles.to_vec());
    let outcomes = supervisor.run(controller).await?;

    out.blank();
    let clean = report_outcomes(&outcomes, out);
    if !clean {
        anyhow::bail!("one or more services did not confirm stopped");
    }
    out.success("Services stopped");
    Ok(())
}
