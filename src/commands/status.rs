use crate::output::UserOutput;
use atlasctl::{Controller, ObservedState, Role};

pub fn run_status(
    controller: &Controller,
    roles: &[Role],
    json: bool,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let states = controller.status(roles);

    if json {
        use serde_json::json;
        let status_obj = states
            .into_iter()
            .map(|(role, state)| {
                let value = match state {
                    ObservedState::Running(pid) => json!({ "status": "running", "pid": pid }),
                    ObservedState::Stopped => json!({ "status": "stopped" }),
                };
                (role.name().to_string(), value)
            })
            .collect::<serde_json::Map<_, _>>();
        out.status(&serde_json::to_string_pretty(&status_obj)?);
        return Ok(());
    }

    for (role, state) in states {
        match state {
            ObservedState::Running(pid) => out.status(&format!("{} is running: {}", role, pid)),
            ObservedState::Stopped => out.status(&format!("{} is stopped", role)),
        }
    }
    Ok(())
}
