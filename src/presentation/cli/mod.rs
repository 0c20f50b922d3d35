pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process::exit;
use std::sync::Arc;

use crate::application::use_cases::promote_change::PromoteChangeConfig;
use crate::common::error::ScmError;
use crate::common::logging::init_logging;
use crate::domain::entities::repository::RepositoryHandle;
use crate::domain::value_objects::file_status::FileState;
use crate::domain::value_objects::scm_type::ScmType;
use crate::infrastructure::scm::scm_factory::ScmFactory;
use crate::infrastructure::scm::scm_interface::{LogOptions, ScmOperations};

use crate::presentation::cli::commands::log::LogCommand;
use crate::presentation::cli::commands::promote::PromoteCommand;
use crate::presentation::cli::commands::status::StatusCommand;

/// Output format options for query commands
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    Text,
    /// JSON output
    Json,
}

/// scmpromote - atomic change promotion across git and mercurial repositories
#[derive(Parser)]
#[command(name = "scmpromote")]
#[command(about = "Promote file changes onto SCM branches with atomic multi-branch pushes")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Local repository path (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<String>,

    /// Remote repository URL (auto-discovered from the working copy when omitted)
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// SCM type override (git, hg, dummy); auto-detected when omitted
    #[arg(long, global = true)]
    pub scm: Option<String>,

    /// Username for remote authentication and commit attribution
    #[arg(long, global = true, env = "SCMPROMOTE_USERNAME")]
    pub username: Option<String>,

    /// Password for remote authentication
    #[arg(long, global = true, env = "SCMPROMOTE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Promote a file change onto a branch, retrying lost push races
    Promote {
        /// Branch to promote the change onto
        target_branch: String,

        /// Commit message for the promoted change
        #[arg(short, long)]
        message: String,

        /// Shell command that performs the file modifications, run in the
        /// repository directory once per attempt
        #[arg(long)]
        run: String,

        /// Also fast-forward this ancestor branch, atomically with the target
        #[arg(long)]
        ff_ancestor: Option<String>,

        /// Prefix for the throwaway per-attempt work branches
        #[arg(long, default_value = "tmp")]
        tmp_prefix: String,

        /// Maximum number of promotion attempts
        #[arg(long, default_value = "3")]
        retries: u32,

        /// Uninstall LFS hooks before promoting
        #[arg(long)]
        disable_lfs: bool,
    },

    /// Show working copy file status
    Status {
        /// Only show files in this state (modified, added, removed, unknown, ignored, clean)
        #[arg(short, long)]
        kind: Option<String>,

        /// Only include paths matching these patterns
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude paths matching these patterns
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show commit log
    Log {
        /// Show only this revision
        #[arg(short, long)]
        revision: Option<String>,

        /// Maximum number of commits to show
        #[arg(short = 'n', long)]
        max_count: Option<usize>,

        /// Only commits touching this file
        #[arg(short, long)]
        file: Option<String>,

        /// Only commits after this date
        #[arg(long)]
        since: Option<String>,

        /// Only commits before this date
        #[arg(long)]
        until: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    pub fn run(self) -> Result<()> {
        init_logging(self.cli.verbose);

        if self.cli.no_color {
            colored::control::set_override(false);
        }

        match self.handle_command() {
            Ok(_) => Ok(()),
            // Anticipated SCM failures get one descriptive line and exit 1;
            // anything else propagates with full diagnostics.
            Err(e) if e.downcast_ref::<ScmError>().is_some() => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                exit(1);
            }
            Err(e) => Err(e),
        }
    }

    fn handle_command(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Promote {
                target_branch,
                message,
                run,
                ff_ancestor,
                tmp_prefix,
                retries,
                disable_lfs,
            } => self.handle_promote_command(
                target_branch,
                message,
                run,
                ff_ancestor.as_deref(),
                tmp_prefix,
                *retries,
                *disable_lfs,
            ),
            Commands::Status {
                kind,
                include,
                exclude,
                output,
            } => self.handle_status_command(kind.as_deref(), include, exclude, output.clone()),
            Commands::Log {
                revision,
                max_count,
                file,
                since,
                until,
                output,
            } => self.handle_log_command(
                revision.as_deref(),
                *max_count,
                file.as_deref(),
                since.as_deref(),
                until.as_deref(),
                output.clone(),
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_promote_command(
        &self,
        target_branch: &str,
        message: &str,
        run: &str,
        ff_ancestor: Option<&str>,
        tmp_prefix: &str,
        retries: u32,
        disable_lfs: bool,
    ) -> Result<()> {
        let scm = self.open_repository()?;

        let mut config = PromoteChangeConfig::new(target_branch, message)
            .with_tmp_branch_prefix(tmp_prefix)
            .with_retry_count(retries)
            .with_disable_lfs(disable_lfs);
        if let Some(ancestor) = ff_ancestor {
            config = config.with_ff_ancestor_branch(ancestor);
        }

        PromoteCommand::new(scm, config, run.to_string()).execute()
    }

    fn handle_status_command(
        &self,
        kind: Option<&str>,
        include: &[String],
        exclude: &[String],
        output: OutputFormat,
    ) -> Result<()> {
        let scm = self.open_repository()?;

        let kind = kind
            .map(|k| k.parse::<FileState>())
            .transpose()
            .map_err(|e| anyhow::Error::new(ScmError::config_error(e)))?;

        StatusCommand::new(scm, kind, include.to_vec(), exclude.to_vec(), output).execute()
    }

    fn handle_log_command(
        &self,
        revision: Option<&str>,
        max_count: Option<usize>,
        file: Option<&str>,
        since: Option<&str>,
        until: Option<&str>,
        output: OutputFormat,
    ) -> Result<()> {
        let scm = self.open_repository()?;

        let mut options = LogOptions::new();
        options.revision = revision.map(str::to_string);
        options.limit = max_count;
        options.file = file.map(str::to_string);
        options.start_date = since.map(str::to_string);
        options.end_date = until.map(str::to_string);

        LogCommand::new(scm, options, output).execute()
    }

    /// Build the repository handle from the global options and attach the
    /// right backend to it, detecting the SCM type unless overridden.
    fn open_repository(&self) -> Result<Arc<dyn ScmOperations>> {
        let local_path = self.cli.directory.clone().unwrap_or_else(|| ".".to_string());

        let mut handle = RepositoryHandle::new(&local_path);
        if let Some(remote) = &self.cli.remote {
            handle = handle.with_remote_url(remote);
        }
        if let (Some(user), Some(pw)) = (&self.cli.username, &self.cli.password) {
            handle = handle.with_credentials(user, pw);
        }

        if let Some(scm) = &self.cli.scm {
            let scm_type: ScmType = scm
                .parse()
                .map_err(|e: String| anyhow::Error::new(ScmError::config_error(e)))?;
            return Ok(ScmFactory::create(scm_type, handle)?);
        }

        ScmFactory::detect(&handle)?.ok_or_else(|| {
            anyhow::Error::new(ScmError::config_error(format!(
                "No SCM repository found at '{}'. Use --scm or --remote to select one.",
                local_path
            )))
        })
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}
