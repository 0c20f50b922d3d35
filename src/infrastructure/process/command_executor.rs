use crate::common::error::ScmError;
use crate::common::result::ScmResult;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Blocking executor for one resolved SCM tool binary.
///
/// Every invocation spawns the tool as an external process, waits for it to
/// exit and returns the decoded standard output. Output is decoded with
/// lossy UTF-8 replacement so a single malformed line never aborts retrieval
/// of otherwise valid output.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    tool_path: PathBuf,
}

impl CommandExecutor {
    pub fn new(tool_path: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.into(),
        }
    }

    /// Resolve a tool executable by scanning the process search path.
    ///
    /// `exe_name` is the bare tool name ("git", "hg"); the platform suffix
    /// is appended on Windows. Returns the full path when found.
    pub fn find_tool_path(exe_name: &str) -> Option<PathBuf> {
        let file_name = if cfg!(windows) {
            format!("{}.exe", exe_name)
        } else {
            exe_name.to_string()
        };

        let path_var = std::env::var_os("PATH")?;
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(&file_name);
            if candidate.exists() {
                return Some(candidate);
            }
        }
        None
    }

    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }

    /// Run the tool with the given argument vector in `cwd`, blocking until
    /// it exits.
    ///
    /// On a non-zero exit status the error carries the decoded stderr, the
    /// full command line, and the exit code. When `outfile` is set the
    /// decoded stdout is additionally written there verbatim.
    pub fn run(&self, args: &[String], cwd: &Path, outfile: Option<&Path>) -> ScmResult<String> {
        let command_line = format!(
            "{} {}",
            self.tool_path.display(),
            args.join(" ")
        );
        debug!("running command {}", command_line);

        let output = Command::new(&self.tool_path)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                ScmError::io_error(format!("failed to spawn '{}'", command_line), e)
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(ScmError::command_failed(
                stderr,
                command_line,
                output.status.code().unwrap_or(-1),
            ));
        }

        if let Some(path) = outfile {
            std::fs::write(path, &stdout).map_err(|e| {
                ScmError::io_error(format!("failed to write output to {}", path.display()), e)
            })?;
        }

        Ok(stdout)
    }
}
