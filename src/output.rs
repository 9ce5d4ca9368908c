//! User-facing output sinks for the command layer.
//!
//! Commands report through [`UserOutput`] instead of printing directly, so
//! tests can capture what an invocation said without scraping stdout.

use std::io::Write;

pub trait UserOutput: Send + Sync {
    /// A plain status line.
    fn status(&self, message: &str);

    /// Final confirmation that the requested action completed.
    fn success(&self, message: &str);

    /// A warning the operator should see even with stdout redirected.
    fn warning(&self, message: &str);

    /// Opens an inline progress line; pair with [`finish_progress`].
    ///
    /// [`finish_progress`]: UserOutput::finish_progress
    fn progress(&self, message: &str);

    /// Completes the pending progress line with its result.
    fn finish_progress(&self, result: &str);

    /// Visual separator between sections.
    fn blank(&self);
}

/// Terminal sink: status lines to stdout, warnings to stderr.
pub struct CliOutput;

impl UserOutput for CliOutput {
    fn status(&self, message: &str) {
        println!("{}", message);
    }

    fn success(&self, message: &str) {
        println!("{}", message);
    }

    fn warning(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn progress(&self, message: &str) {
        print!("{}", message);
        std::io::stdout().flush().ok();
    }

    fn finish_progress(&self, result: &str) {
        println!("{}", result);
    }

    fn blank(&self) {
        println!();
    }
}
