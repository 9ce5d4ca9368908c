mod restart;
mod start;
mod status;
mod stop;

pub use restart::run_restart;
pub use start::run_start;
pub use status::run_status;
pub use stop::run_stop;
