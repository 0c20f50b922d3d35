use crate::common::error::ScmError;
use crate::common::result::ScmResult;
use crate::domain::entities::changeset::{parse_tool_date, Changeset};
use crate::domain::entities::repository::RepositoryHandle;
use crate::domain::value_objects::file_status::{FileState, FileStatusEntry};
use crate::domain::value_objects::scm_type::ScmType;
use crate::infrastructure::process::CommandExecutor;
use crate::infrastructure::scm::scm_interface::{
    LogOptions, PatchOptions, ScmConfig, ScmOperations,
};
use regex::Regex;
use std::path::Path;

/// Git implementation of the SCM operation set, driving the `git` binary.
pub struct GitScm {
    handle: RepositoryHandle,
    remote_url: Option<String>,
    executor: CommandExecutor,
}

impl GitScm {
    /// Attach to the repository described by `handle`.
    ///
    /// When the handle carries no remote URL, one is auto-discovered from
    /// `.git/config`. A configured credential pair is spliced into the
    /// remote URL. Fails when no `git` executable is on the search path.
    pub fn new(handle: RepositoryHandle) -> ScmResult<Self> {
        let mut remote_url = handle.remote_url().map(str::to_string);

        let config_path = handle.local_path().join(".git").join("config");
        if remote_url.is_none() && config_path.exists() {
            // Best effort; plenty of operations work without a remote.
            if let Ok(contents) = std::fs::read_to_string(&config_path) {
                remote_url = discover_remote_url(&contents);
            }
        }

        let remote_url = remote_url.map(|url| handle.authenticated_remote(&url));

        let tool_path = CommandExecutor::find_tool_path("git").ok_or_else(|| {
            ScmError::config_error(
                "Cannot find git executable. Must have git available in your PATH to use commands",
            )
        })?;

        Ok(Self {
            handle,
            remote_url,
            executor: CommandExecutor::new(tool_path),
        })
    }

    fn run(&self, args: Vec<String>) -> ScmResult<String> {
        self.executor.run(&args, self.handle.local_path(), None)
    }

    fn require_remote(&self) -> ScmResult<&str> {
        self.remote_url
            .as_deref()
            .ok_or_else(|| ScmError::config_error("No remote SCM path specified."))
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Pathspec arguments for include/exclude filters, using `:(top)` magic so
/// patterns are rooted at the repository top level.
fn pathspec_args(include: &[String], exclude: &[String]) -> Vec<String> {
    let mut args = Vec::new();
    if !include.is_empty() || !exclude.is_empty() {
        args.push("--".to_string());
    }
    for pattern in include {
        args.push(format!(":(top){}", pattern));
    }
    for pattern in exclude {
        args.push(format!(":(top,exclude){}", pattern));
    }
    args
}

/// Pull the first `url = ...` line out of a `.git/config` file.
fn discover_remote_url(contents: &str) -> Option<String> {
    let rex = Regex::new(r"(?m)^\s*url\s*=\s*(.*)$").ok()?;
    rex.captures(contents)
        .map(|caps| caps[1].trim().to_string())
}

/// Single-pass scanner over `git log --parents --format=medium` output.
///
/// A `commit ` line opens a new record; author/date lines fold into it and
/// any other non-empty line is taken as the message. Lines that fit no
/// pattern are ignored rather than rejected.
fn parse_changesets(output: &str) -> Vec<Changeset> {
    let mut changesets: Vec<Changeset> = Vec::new();
    for raw_line in output.lines() {
        let line = raw_line.trim_end();
        if let Some(rest) = line.strip_prefix("commit ") {
            let mut ids = rest.split_whitespace();
            let hash = match ids.next() {
                Some(h) => h.to_string(),
                None => continue,
            };
            let mut changeset = Changeset::new(&hash);
            changeset.parents = ids
                .filter(|p| *p != hash)
                .map(|p| p.to_string())
                .collect();
            changesets.push(changeset);
        } else if let Some(current) = changesets.last_mut() {
            if let Some(rest) = line.strip_prefix("Author: ") {
                // Author: Last, First <id@domain>
                current.author = rest.split('<').next().unwrap_or("").trim().to_string();
            } else if let Some(rest) = line.strip_prefix("Date: ") {
                if let Some(timestamp) = parse_tool_date(rest) {
                    current.set_timestamp(timestamp);
                }
            } else {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    current.message = trimmed.to_string();
                }
            }
        }
    }
    changesets
}

/// Map one `git status -s` code token into the shared vocabulary.
fn map_status_code(code: &str) -> FileState {
    match code {
        "M" => FileState::Modified,
        "A" => FileState::Added,
        "D" => FileState::Deleted,
        _ => FileState::Unknown,
    }
}

fn parse_status(output: &str, kind: Option<FileState>) -> ScmResult<Vec<FileStatusEntry>> {
    let wanted_code = match kind {
        None => None,
        Some(FileState::Modified) => Some("M"),
        Some(FileState::Added) => Some("A"),
        Some(FileState::Deleted) => Some("D"),
        Some(other) => {
            return Err(ScmError::scm_error(format!(
                "Unknown file type to search for: {}",
                other
            )))
        }
    };

    let mut results = Vec::new();
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (code, path) = match (parts.next(), parts.next()) {
            (Some(code), Some(path)) => (code, path),
            _ => continue,
        };
        if let Some(wanted) = wanted_code {
            if code != wanted {
                continue;
            }
        }
        results.push(FileStatusEntry::new(map_status_code(code), path));
    }
    Ok(results)
}

/// Extract sub-repository mount paths from `.gitmodules` contents.
fn parse_gitmodules(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("path ="))
        .filter_map(|line| line.split('=').nth(1))
        .map(|path| path.trim().to_string())
        .collect()
}

/// Parse `git version X.Y.Z...` into at most three numeric components.
fn parse_version(output: &str) -> Vec<u32> {
    output
        .split_whitespace()
        .nth(2)
        .map(|version| {
            version
                .split('.')
                .take(3)
                .filter_map(|part| part.parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

impl ScmOperations for GitScm {
    fn scm_type(&self) -> ScmType {
        ScmType::Git
    }

    fn main_branch_name(&self) -> &str {
        "master"
    }

    fn local_path(&self) -> &Path {
        self.handle.local_path()
    }

    fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    fn initialize(&self) -> ScmResult<()> {
        self.run(argv(&["init"]))?;
        Ok(())
    }

    fn clone_repository(&self) -> ScmResult<()> {
        let remote = self.require_remote()?.to_string();
        let local = self.handle.local_path().display().to_string();
        // Clone runs from the process cwd: the local path does not exist yet.
        self.executor.run(
            &vec![
                "clone".to_string(),
                "--recurse".to_string(),
                remote,
                local,
            ],
            Path::new("."),
            None,
        )?;
        Ok(())
    }

    fn add_files(&self, files: &[String]) -> ScmResult<()> {
        let mut args = argv(&["add"]);
        if files.is_empty() {
            args.push(".".to_string());
        } else {
            args.extend(files.iter().cloned());
        }
        self.run(args)?;
        Ok(())
    }

    fn commit(&self, message: &str) -> ScmResult<()> {
        let mut args = Vec::new();
        if let Some(user) = self.handle.username() {
            args.push("-c".to_string());
            args.push(format!("user.name={}", user));
        }
        args.extend(argv(&["commit", "-m"]));
        args.push(message.to_string());
        self.run(args)?;
        Ok(())
    }

    fn push(&self) -> ScmResult<()> {
        let remote = self.require_remote()?.to_string();
        self.run(vec!["push".to_string(), remote.clone()])?;
        self.run(vec!["push".to_string(), "--tags".to_string(), remote])?;
        Ok(())
    }

    fn push_refs_atomic(&self, branches: &[String]) -> ScmResult<()> {
        self.require_remote()?;
        let mut args = argv(&["push", "--atomic", "origin"]);
        args.extend(branches.iter().cloned());
        self.run(args)?;
        Ok(())
    }

    fn status(
        &self,
        kind: Option<FileState>,
        include: &[String],
        exclude: &[String],
    ) -> ScmResult<Vec<FileStatusEntry>> {
        let mut args = argv(&["status", "-s"]);
        args.extend(pathspec_args(include, exclude));
        let output = self.run(args)?;
        parse_status(&output, kind)
    }

    fn goto_revision(&self, revision: Option<&str>) -> ScmResult<()> {
        let revision = revision.unwrap_or(self.main_branch_name());
        self.run(vec!["checkout".to_string(), revision.to_string()])?;
        // Submodules do not follow a checkout on their own.
        if !self.subrepos()?.is_empty() {
            self.run(argv(&["submodule", "update"]))?;
        }
        Ok(())
    }

    fn current_revision(
        &self,
        show_modified: bool,
        truncate_len: Option<usize>,
    ) -> ScmResult<String> {
        let output = self.run(argv(&["rev-parse", "HEAD"]))?;
        let mut rev = output
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        if rev.is_empty() {
            return Err(ScmError::scm_error("Current revision not found"));
        }
        if let Some(length) = truncate_len {
            rev = rev.chars().take(length).collect();
        }
        if show_modified {
            // Mirror the trailing "+" mercurial appends for local changes.
            let describe = self.run(argv(&["describe", "--always", "--dirty"]))?;
            if describe.contains("-dirty") {
                rev.push('+');
            }
        }
        Ok(rev)
    }

    fn goto_branch(&self, branch: &str) -> ScmResult<()> {
        self.goto_revision(Some(branch))
    }

    fn current_branch(&self) -> ScmResult<String> {
        let output = self.run(argv(&["rev-parse", "--abbrev-ref", "HEAD"]))?;
        let name = output.lines().next().unwrap_or("").trim().to_string();
        if name.is_empty() {
            return Err(ScmError::scm_error("Current branch name not found"));
        }
        Ok(name)
    }

    fn branches(&self) -> ScmResult<Vec<Changeset>> {
        let output = self.run(argv(&["show-ref", "--heads"]))?;
        let refs: Vec<String> = output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| line.split_whitespace().nth(1))
            .map(|r| r.to_string())
            .collect();

        let mut branches = Vec::new();
        for full_ref in refs {
            let log_output = self.run(vec![
                "log".to_string(),
                "-n".to_string(),
                "1".to_string(),
                "--parents".to_string(),
                "--format=medium".to_string(),
                full_ref.clone(),
            ])?;
            let mut changesets = parse_changesets(&log_output);
            for changeset in &mut changesets {
                changeset.branch = Some(
                    full_ref
                        .strip_prefix("refs/heads/")
                        .unwrap_or(&full_ref)
                        .to_string(),
                );
            }
            branches.extend(changesets);
        }
        Ok(branches)
    }

    fn create_branch(&self, name: &str) -> ScmResult<()> {
        self.run(vec!["branch".to_string(), name.to_string()])?;
        Ok(())
    }

    fn update_and_merge(&self) -> ScmResult<()> {
        self.require_remote()?;
        self.run(argv(&["pull"]))?;
        Ok(())
    }

    fn update(&self) -> ScmResult<()> {
        self.require_remote()?;
        self.run(argv(&["fetch"]))?;
        Ok(())
    }

    fn merge(&self, revision: &str) -> ScmResult<()> {
        self.run(vec!["merge".to_string(), revision.to_string()])?;
        Ok(())
    }

    fn discard_last_commit(&self) -> ScmResult<()> {
        self.run(argv(&["reset", "--hard", "HEAD~1"]))?;
        Ok(())
    }

    fn patch(&self, options: &PatchOptions) -> ScmResult<String> {
        let mut args = argv(&["diff"]);
        if options.include_subrepos {
            args.push("--submodule=diff".to_string());
        }
        if options.stat_only {
            // Width 1000 to prevent path truncation.
            args.push("--stat=1000".to_string());
        } else {
            args.push(format!("-U{}", options.context));
        }

        match (&options.rev1, &options.rev2) {
            (Some(rev1), None) => args.push(format!("{}^!", rev1)),
            (Some(rev1), Some(rev2)) => args.push(format!("{}..{}", rev1, rev2)),
            _ => {} // no revision: all uncommitted changes
        }

        args.extend(pathspec_args(&options.include, &options.exclude));

        self.executor.run(
            &args,
            self.handle.local_path(),
            options.outfile.as_deref(),
        )
    }

    fn log(&self, options: &LogOptions) -> ScmResult<Vec<Changeset>> {
        let mut args = argv(&["log", "--parents", "--format=medium"]);
        let mut limit = options.limit;
        if let Some(revision) = &options.revision {
            limit = Some(1);
            args.push(revision.clone());
        }
        if let Some(limit) = limit {
            args.push("-n".to_string());
            args.push(limit.to_string());
        }
        if let Some(start) = &options.start_date {
            args.push("--after".to_string());
            args.push(start.clone());
        }
        if let Some(end) = &options.end_date {
            args.push("--before".to_string());
            args.push(end.clone());
        }
        if let Some(file) = &options.file {
            args.push(file.clone());
        }
        let output = self.run(args)?;
        Ok(parse_changesets(&output))
    }

    fn ancestors(
        &self,
        revision: Option<&str>,
        limit: Option<usize>,
    ) -> ScmResult<Vec<Changeset>> {
        let mut args = argv(&["rev-list", "--parents", "--first-parent", "--format=medium"]);
        if let Some(limit) = limit {
            args.push("-n".to_string());
            args.push(limit.to_string());
        }
        args.push(revision.unwrap_or("HEAD").to_string());
        let output = self.run(args)?;
        Ok(parse_changesets(&output))
    }

    fn tags(&self, filter: Option<&str>) -> ScmResult<Vec<String>> {
        // Sort newest to oldest to match mercurial ordering.
        let mut args = argv(&["tag", "-l", "--sort=-taggerdate"]);
        if let Some(filter) = filter {
            args.push(filter.to_string());
        }
        let output = self.run(args)?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.to_string())
            .collect())
    }

    fn create_tag(&self, name: &str, message: &str) -> ScmResult<()> {
        self.run(vec![
            "tag".to_string(),
            name.to_string(),
            "-f".to_string(),
            "-m".to_string(),
            message.to_string(),
        ])?;
        Ok(())
    }

    fn latest_tag(&self) -> ScmResult<String> {
        let output = self.run(argv(&["describe", "--tags"]))?;
        Ok(output.trim().to_string())
    }

    fn tracked_files(&self) -> ScmResult<Vec<String>> {
        let output = self.run(argv(&["ls-tree", "-r", "--name-only", "--full-tree", "HEAD"]))?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.to_string())
            .collect())
    }

    fn revert_file(&self, file: Option<&str>) -> ScmResult<()> {
        let args = match file {
            Some(file) => vec!["checkout".to_string(), "--".to_string(), file.to_string()],
            None => argv(&["reset", "--hard", "HEAD"]),
        };
        self.run(args)?;
        Ok(())
    }

    fn subrepos(&self) -> ScmResult<Vec<String>> {
        let manifest = self.handle.local_path().join(".gitmodules");
        if !manifest.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&manifest)?;
        Ok(parse_gitmodules(&contents))
    }

    fn detected_remote(&self) -> ScmResult<String> {
        let output = self.run(argv(&["remote", "-v"]))?;
        // Only considers origin; fetch/push split remotes are not modeled.
        let mut remote = "";
        for line in output.lines() {
            if let Some(rest) = line.strip_prefix("origin") {
                if let Some(url) = rest.split_whitespace().next() {
                    remote = url;
                }
            }
        }
        Ok(remote.trim().to_string())
    }

    fn detected_local(&self) -> ScmResult<String> {
        let output = self.run(argv(&["rev-parse", "--show-toplevel"]))?;
        // cygwin hack
        Ok(output.replace("/cygdrive/c", "C:").trim().to_string())
    }

    fn config(&self) -> ScmResult<ScmConfig> {
        let output = self.run(argv(&["config", "--get", "user.name"]))?;
        Ok(ScmConfig {
            username: Some(output.trim().to_string()),
        })
    }

    fn tool_version(&self) -> ScmResult<Vec<u32>> {
        let output = self.run(argv(&["--version"]))?;
        Ok(parse_version(&output))
    }

    fn raw_command(
        &self,
        args: &[String],
        cwd: Option<&Path>,
        outfile: Option<&Path>,
    ) -> ScmResult<String> {
        self.executor
            .run(args, cwd.unwrap_or(self.handle.local_path()), outfile)
    }
}
