//! CLI command implementations

pub mod configure;
pub mod notify;
pub mod show_config;

use crate::config::Config;
use crate::OutputFormat;

/// Context passed to all commands
pub struct CommandContext {
    pub config: Config,
    pub profile: Option<String>,
    pub output_format: OutputFormat,
    pub quiet: bool,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    /// Print info message if not quiet
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }
}
