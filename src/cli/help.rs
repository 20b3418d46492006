//! CLI command-name contract for logging.

use crate::cli::parse::Commands;

/// Command name string recorded in log events (e.g. "decode", "visit").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Decode { .. } => "decode",
        Commands::Visit { .. } => "visit",
        Commands::Config => "config",
    }
}
