//! CLI domain: parse, route, output, and presentation only.
//! No domain logic; a single route table dispatches to the engine.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{error_kind, map_error};
pub use parse::{Cli, Commands};
pub use presentation::{
    format_commits_json, format_commits_text, format_list_json, format_list_text,
    format_record_line, format_tree, format_verify_result,
};
pub use route::{command_name, load_config, CommandOutput, RunContext};
