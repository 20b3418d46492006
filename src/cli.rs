//! CLI domain: parse, route, help, output, and presentation only.
//! No navigation logic here; a single route table dispatches to the library.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{format_decoded, format_visit, VisitReport};
pub use route::RunContext;
