//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `sync`: Reconcile extracted references against the locale stores
//! - `keys`: Print the extracted reference index
//! - `lint`: Report suspicious keys in the source-language store
//! - `init`: Initialize a keysync configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Sync(cmd)) => cmd.common.verbose,
            Some(Command::Keys(cmd)) => cmd.common.verbose,
            Some(Command::Lint(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Workspace root to scan (overrides the current directory)
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Locales directory path (overrides config file)
    #[arg(long)]
    pub locales_dir: Option<PathBuf>,

    /// Source language (overrides config file)
    #[arg(long)]
    pub source_language: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Actually write additions to the locale stores (default is dry-run)
    #[arg(long)]
    pub write: bool,

    /// Also delete unused keys; only meaningful with --write
    #[arg(long)]
    pub prune: bool,

    /// Delete the persisted extraction cache before scanning
    #[arg(long)]
    pub invalidate_cache: bool,

    /// Seed target locales with the source value instead of an empty string
    #[arg(long)]
    pub seed_target_locales: bool,

    /// Treat KEY as referenced without a call site
    /// Can be specified multiple times: --assume a.key --assume b.key
    #[arg(long = "assume", value_name = "KEY")]
    pub assume: Vec<String>,

    /// Restrict the write pass to KEY
    /// Can be specified multiple times: --only a.key --only b.key
    #[arg(long = "only", value_name = "KEY")]
    pub only: Vec<String>,

    /// Explicit files to extract from, relative to the workspace root
    /// (bypasses discovery)
    pub targets: Vec<String>,
}

#[derive(Debug, Args)]
pub struct KeysCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Delete the persisted extraction cache before scanning
    #[arg(long)]
    pub invalidate_cache: bool,

    /// Explicit files to extract from, relative to the workspace root
    pub targets: Vec<String>,
}

#[derive(Debug, Args)]
pub struct LintCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile translation-key references against the locale stores
    Sync(SyncCommand),
    /// Print every extracted reference and dynamic-key warning
    Keys(KeysCommand),
    /// Report suspicious keys in the source-language store, with fixes
    Lint(LintCommand),
    /// Initialize a new .keysyncrc.json configuration file
    Init,
}
