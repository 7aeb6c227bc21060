//! CLI route: single route table and run context. Dispatches to the engine
//! and presentation.

use crate::cli::parse::{Cli, Commands};
use crate::cli::presentation;
use crate::config::{ConfigLoader, VersoConfig};
use crate::diff::{self, DiffTool};
use crate::engine::{tracked_path, Engine};
use crate::error::ApiError;
use crate::logging::resolve_log_file_path;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// What a command produced: bytes for stdout and the process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Text output; a trailing newline is added unless the text is empty.
    pub fn text(s: String) -> Self {
        let mut stdout = s.into_bytes();
        if !stdout.is_empty() {
            stdout.push(b'\n');
        }
        Self {
            stdout,
            exit_code: 0,
        }
    }

    /// Raw bytes, written unchanged.
    pub fn bytes(stdout: Vec<u8>) -> Self {
        Self {
            stdout,
            exit_code: 0,
        }
    }

    fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }
}

/// Command name for logging (e.g. "add", "commits").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Add { .. } => "add",
        Commands::Commits { .. } => "commits",
        Commands::Tree { .. } => "tree",
        Commands::Cat { .. } => "cat",
        Commands::Diff { .. } => "diff",
        Commands::List { .. } => "list",
        Commands::Verify { .. } => "verify",
        Commands::Config => "config",
    }
}

/// Load configuration and apply CLI overrides.
///
/// Precedence: CLI flags, then environment, then config file, then defaults.
pub fn load_config(cli: &Cli) -> Result<VersoConfig, ApiError> {
    let mut config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    if let Some(ref dir) = cli.data_dir {
        config.storage.data_dir = Some(dir.clone());
    }

    let logging = &mut config.logging;
    if cli.quiet {
        logging.enabled = false;
    }
    if cli.verbose {
        logging.level = "debug".to_string();
        if logging.output == "file" {
            logging.output = "file+stderr".to_string();
        }
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        logging.output = output.clone();
    }
    if logging.output.starts_with("file") {
        let data_dir = config.storage.resolve_data_dir()?;
        let file = resolve_log_file_path(cli.log_file.clone(), logging.file.clone(), &data_dir);
        logging.file = Some(file);
    } else if let Some(ref file) = cli.log_file {
        logging.file = Some(file.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Runtime context for CLI execution: loaded engine, configuration and the
/// diff collaborator.
pub struct RunContext {
    engine: Engine,
    config: VersoConfig,
    diff_tool: Box<dyn DiffTool>,
}

impl RunContext {
    /// Open the engine for the configured data directory. A malformed log
    /// fails here.
    pub fn new(config: VersoConfig) -> Result<Self, ApiError> {
        let engine = Engine::from_config(&config.storage)?;
        let diff_tool = diff::from_config(&config.diff);
        Ok(Self {
            engine,
            config,
            diff_tool,
        })
    }

    /// Replace the diff collaborator.
    pub fn with_diff_tool(mut self, diff_tool: Box<dyn DiffTool>) -> Self {
        self.diff_tool = diff_tool;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Execute a command and return its output.
    pub fn execute(&mut self, command: &Commands) -> Result<CommandOutput, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        debug!(command = name, "Executing command");

        let output = self.dispatch(command)?;

        info!(
            command = name,
            exit_code = output.exit_code,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        Ok(output)
    }

    fn dispatch(&mut self, command: &Commands) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::Add {
                file,
                message,
                base,
            } => {
                let key = existing_file(file)?;
                let record = self.engine.commit(Path::new(&key), *base, message)?;
                debug!(version = record.version, "Commit recorded");
                Ok(CommandOutput::text(String::new()))
            }
            Commands::Commits { file, format } => {
                let key = optional_file(file.as_deref())?;
                let records = self.engine.commits(key.as_deref());
                let out = match format.as_str() {
                    "json" => presentation::format_commits_json(&records)?,
                    _ => presentation::format_commits_text(&records),
                };
                Ok(CommandOutput::text(out))
            }
            Commands::Tree { file } => {
                let key = optional_file(file.as_deref())?;
                let forest = self.engine.tree(key.as_deref())?;
                Ok(CommandOutput::text(presentation::format_tree(&forest)))
            }
            Commands::Cat { file, version } => {
                let key = tracked_path(file)?;
                let data = self.engine.extract(&key, *version)?;
                Ok(CommandOutput::bytes(data))
            }
            Commands::Diff { file, from, to } => {
                let key = tracked_path(file)?;
                let out = self
                    .engine
                    .diff(&key, *from, *to, self.diff_tool.as_ref())?;
                Ok(CommandOutput::bytes(out))
            }
            Commands::List { format } => {
                let files = self.engine.list();
                let out = match format.as_str() {
                    "json" => presentation::format_list_json(&files)?,
                    _ => presentation::format_list_text(&files),
                };
                Ok(CommandOutput::text(out))
            }
            Commands::Verify { file } => {
                let key = optional_file(file.as_deref())?;
                let entries = self.engine.verify(key.as_deref())?;
                let (out, intact) = presentation::format_verify_result(&entries);
                let code = if intact { 0 } else { 1 };
                Ok(CommandOutput::text(out).with_exit_code(code))
            }
            Commands::Config => Ok(CommandOutput::text(self.config.to_toml()?)),
        }
    }
}

/// Resolve a file that must exist on disk (commit reads it).
fn existing_file(file: &Path) -> Result<String, ApiError> {
    let key = tracked_path(file)?;
    std::fs::metadata(&key).map_err(|source| ApiError::WorkingFile {
        path: key.clone(),
        source,
    })?;
    Ok(key)
}

fn optional_file(file: Option<&Path>) -> Result<Option<String>, ApiError> {
    file.map(tracked_path).transpose()
}
