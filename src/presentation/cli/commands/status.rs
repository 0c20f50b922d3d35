use anyhow::Result;
use colored::{ColoredString, Colorize};
use std::sync::Arc;

use crate::domain::value_objects::file_status::{FileState, FileStatusEntry};
use crate::infrastructure::scm::scm_interface::ScmOperations;
use crate::presentation::cli::OutputFormat;

/// Status command: prints the working copy file states.
pub struct StatusCommand {
    scm: Arc<dyn ScmOperations>,
    kind: Option<FileState>,
    include: Vec<String>,
    exclude: Vec<String>,
    output: OutputFormat,
}

impl StatusCommand {
    pub fn new(
        scm: Arc<dyn ScmOperations>,
        kind: Option<FileState>,
        include: Vec<String>,
        exclude: Vec<String>,
        output: OutputFormat,
    ) -> Self {
        Self {
            scm,
            kind,
            include,
            exclude,
            output,
        }
    }

    pub fn execute(self) -> Result<()> {
        let entries = self
            .scm
            .status(self.kind, &self.include, &self.exclude)
            .map_err(|e| anyhow::Error::new(e).context("Failed to check status"))?;

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
            OutputFormat::Text => {
                for entry in &entries {
                    println!("{} {}", colorize_state(entry), entry.path);
                }
            }
        }
        Ok(())
    }
}

fn colorize_state(entry: &FileStatusEntry) -> ColoredString {
    let code = entry.state.code();
    match entry.state {
        FileState::Modified => code.yellow(),
        FileState::Added => code.green(),
        FileState::Deleted => code.red(),
        FileState::Unknown => code.magenta(),
        FileState::Ignored => code.dimmed(),
        FileState::Clean => code.normal(),
    }
}
