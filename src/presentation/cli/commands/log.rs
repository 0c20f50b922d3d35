use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;

use crate::infrastructure::scm::scm_interface::{LogOptions, ScmOperations};
use crate::presentation::cli::OutputFormat;

/// Log command: prints commit history, newest first.
pub struct LogCommand {
    scm: Arc<dyn ScmOperations>,
    options: LogOptions,
    output: OutputFormat,
}

impl LogCommand {
    pub fn new(scm: Arc<dyn ScmOperations>, options: LogOptions, output: OutputFormat) -> Self {
        Self {
            scm,
            options,
            output,
        }
    }

    pub fn execute(self) -> Result<()> {
        let changesets = self
            .scm
            .log(&self.options)
            .map_err(|e| anyhow::Error::new(e).context("Failed to read log"))?;

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&changesets)?);
            }
            OutputFormat::Text => {
                for changeset in &changesets {
                    println!("{} {}", "commit".yellow(), changeset.hash.yellow());
                    if let Some(branch) = &changeset.branch {
                        println!("Branch: {}", branch);
                    }
                    println!("Author: {}", changeset.author);
                    if let Some(timestamp) = &changeset.timestamp {
                        println!("Date:   {}", timestamp);
                    }
                    println!();
                    println!("    {}", changeset.message);
                    println!();
                }
            }
        }
        Ok(())
    }
}
