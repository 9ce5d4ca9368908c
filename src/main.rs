mod cli;
mod commands;
mod output;

use atlasctl::{resolve, Controller, Error, Settings};
use clap::Parser;
use cli::{Action, Cli};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(err) = e.downcast_ref::<Error>() {
            eprintln!("Error: {}", err);
            if let Some(suggestion) = err.suggestion() {
                eprintln!("\nHint: {}", suggestion);
            }
            std::process::exit(err.exit_code());
        }
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let mut settings = Settings::load(base_dir)?;
    if cli.daemon {
        settings.daemon = true;
    }
    if let Some(workers) = cli.worker {
        settings.workers = workers;
    }

    // Target resolution is pure; an unknown name fails here, before any
    // directory or process is touched.
    let roles = resolve(&cli.target)?;

    settings.ensure_dirs();
    let mut controller = Controller::new(settings.clone());

    match cli.action {
        Action::Start => {
            commands::run_start(&mut controller, &settings, &roles, &output::CliOutput).await?;
        }
        Action::Stop => {
            commands::run_stop(&mut controller, &roles, cli.force, &output::CliOutput).await?;
        }
        Action::Restart => {
            commands::run_restart(&mut controller, &settings, &roles, &output::CliOutput).await?;
        }
        Action::Status => {
            commands::run_status(&controller, &roles, cli.json, &output::CliOutput)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
