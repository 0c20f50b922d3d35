use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use crate::application::use_cases::promote_change::{PromoteChangeConfig, PromoteChangeUseCase};
use crate::common::error::ScmError;
use crate::common::result::ScmResult;
use crate::infrastructure::scm::scm_interface::ScmOperations;

/// Promote command: runs a user-supplied shell command as the change handler
/// and drives the promotion workflow with it.
pub struct PromoteCommand {
    scm: Arc<dyn ScmOperations>,
    config: PromoteChangeConfig,
    run_command: String,
}

impl PromoteCommand {
    pub fn new(
        scm: Arc<dyn ScmOperations>,
        config: PromoteChangeConfig,
        run_command: String,
    ) -> Self {
        Self {
            scm,
            config,
            run_command,
        }
    }

    pub fn execute(self) -> Result<()> {
        let target_branch = self.config.target_branch.clone();
        let run_command = self.run_command;

        println!(
            "{} Promoting change onto {}...",
            "::".blue().bold(),
            target_branch.bold()
        );

        let use_case = PromoteChangeUseCase::new(self.scm, self.config);
        match use_case.execute(|repo_path| run_shell_handler(&run_command, repo_path)) {
            Ok(commit_hash) => {
                println!(
                    "{} Change promoted onto {} as commit {}",
                    "✓".green().bold(),
                    target_branch.bold(),
                    commit_hash.bold()
                );
                Ok(())
            }
            // Keep the ScmError in the chain so the runner can tell
            // anticipated failures from unexpected ones.
            Err(e @ ScmError::NoChanges) => Err(anyhow::Error::new(e).context(format!(
                "Handler command '{}' did not modify any files",
                run_command
            ))),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to promote change")),
        }
    }
}

/// Run the handler command through the platform shell in the repository
/// directory. Inherits stdio so the handler's own output stays visible.
fn run_shell_handler(command: &str, repo_path: &Path) -> ScmResult<()> {
    let (shell, flag) = if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };

    let status = Command::new(shell)
        .arg(flag)
        .arg(command)
        .current_dir(repo_path)
        .status()
        .map_err(|e| {
            ScmError::io_error(format!("failed to run handler command '{}'", command), e)
        })?;

    if !status.success() {
        return Err(ScmError::command_failed(
            "handler command exited with a failure status",
            command,
            status.code().unwrap_or(-1),
        ));
    }
    Ok(())
}
