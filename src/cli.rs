use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "atlasctl")]
#[command(about = "Control the Atlas application stack services")]
#[command(after_help = "Example:\n  atlasctl start all -d")]
pub struct Cli {
    /// Action to run
    #[arg(value_enum)]
    pub action: Action,

    /// Target: all, web, task, or a single role name
    #[arg(default_value = "all")]
    pub target: String,

    /// Run detached: redirect output to log files and exit after start
    #[arg(short, long)]
    pub daemon: bool,

    /// Worker count for roles that support it (app server, task worker)
    #[arg(short = 'w', long = "worker", value_name = "N")]
    pub worker: Option<usize>,

    /// Send SIGKILL instead of SIGTERM (stop only)
    #[arg(short, long)]
    pub force: bool,

    /// Output status as JSON (status only)
    #[arg(long)]
    pub json: bool,

    /// Base directory of the application checkout (defaults to cwd)
    #[arg(short = 'C', long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    Start,
    Stop,
    Restart,
    Status,
}
