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

/// Log template producing the same line vocabulary the parser consumes for
/// git, plus the mercurial-only local id and explicit parent list. Dates are
/// normalized to UTC so the week bucketing is stable across machines.
const HG_TEMPLATE: &str = "changeset: {rev}:{node}\nbranch: {branch}\nuser: {author}\ndate: {localdate(date, 'UTC')|date}\nparents: {parents}\nsummary: {splitlines(desc) % '{line} '}\n\n";

/// Mercurial implementation of the SCM operation set, driving the `hg`
/// binary.
///
/// `discard_last_commit` relies on the bundled strip extension being
/// enabled.
pub struct HgScm {
    handle: RepositoryHandle,
    remote_url: Option<String>,
    executor: CommandExecutor,
}

impl HgScm {
    /// Attach to the repository described by `handle`.
    ///
    /// When the handle carries no remote URL, the `default` path is
    /// auto-discovered from `.hg/hgrc`. A configured credential pair is
    /// spliced into the remote URL. Fails when no `hg` executable is on the
    /// search path.
    pub fn new(handle: RepositoryHandle) -> ScmResult<Self> {
        let mut remote_url = handle.remote_url().map(str::to_string);

        let hgrc_path = handle.local_path().join(".hg").join("hgrc");
        if remote_url.is_none() && hgrc_path.exists() {
            if let Ok(contents) = std::fs::read_to_string(&hgrc_path) {
                remote_url = discover_remote_url(&contents);
            }
        }

        let remote_url = remote_url.map(|url| handle.authenticated_remote(&url));

        let tool_path = CommandExecutor::find_tool_path("hg").ok_or_else(|| {
            ScmError::config_error(
                "Cannot find hg executable. Must have hg available in your PATH to use commands",
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

/// Case-insensitive regex pattern arguments for include/exclude filters.
fn pattern_args(include: &[String], exclude: &[String]) -> Vec<String> {
    let mut args = Vec::new();
    for pattern in include {
        args.push("-I".to_string());
        args.push(format!("re:(?i){}", pattern));
    }
    for pattern in exclude {
        args.push("-X".to_string());
        args.push(format!("re:(?i){}", pattern));
    }
    args
}

/// Pull the `default` path out of `.hg/hgrc` contents.
fn discover_remote_url(contents: &str) -> Option<String> {
    let rex = Regex::new(r"(?m)^\s*default\s*=\s*(.*)$").ok()?;
    rex.captures(contents)
        .map(|caps| caps[1].trim().to_string())
}

/// Single-pass scanner over output produced with [`HG_TEMPLATE`].
///
/// A `changeset: ` line opens a new record; the remaining labeled lines fold
/// into it. Null parents (local id `-1`) are dropped so root commits report
/// an empty parent list, matching the git side.
fn parse_changesets(output: &str) -> Vec<Changeset> {
    let mut changesets: Vec<Changeset> = Vec::new();
    for raw_line in output.lines() {
        let line = raw_line.trim_end();
        if let Some(rest) = line.strip_prefix("changeset: ") {
            let mut ids = rest.trim().splitn(2, ':');
            let local_id = ids.next().unwrap_or("").to_string();
            let hash = match ids.next() {
                Some(h) => h.to_string(),
                None => continue,
            };
            let mut changeset = Changeset::new(&hash);
            changeset.local_id = Some(local_id);
            changesets.push(changeset);
        } else if let Some(current) = changesets.last_mut() {
            if let Some(rest) = line.strip_prefix("branch: ") {
                let branch = rest.trim();
                if !branch.is_empty() {
                    current.branch = Some(branch.to_string());
                }
            } else if let Some(rest) = line.strip_prefix("user: ") {
                current.author = rest.split('<').next().unwrap_or("").trim().to_string();
            } else if let Some(rest) = line.strip_prefix("date: ") {
                if let Some(timestamp) = parse_tool_date(rest) {
                    current.set_timestamp(timestamp);
                }
            } else if let Some(rest) = line.strip_prefix("parents: ") {
                for parent in rest.split_whitespace() {
                    let mut ids = parent.splitn(2, ':');
                    let rev = ids.next().unwrap_or("");
                    if rev == "-1" {
                        continue;
                    }
                    if let Some(hash) = ids.next() {
                        current.parents.push(hash.to_string());
                    }
                }
            } else if let Some(rest) = line.strip_prefix("summary: ") {
                current.message = rest.trim().to_string();
            }
        }
    }
    changesets
}

/// Map one `hg status` code letter into the shared vocabulary.
/// `R` (removed) and `!` (missing) both normalize to deleted.
fn map_status_code(code: &str) -> FileState {
    match code {
        "M" => FileState::Modified,
        "A" => FileState::Added,
        "R" | "!" => FileState::Deleted,
        "I" => FileState::Ignored,
        "C" => FileState::Clean,
        _ => FileState::Unknown,
    }
}

/// Status flag selecting exactly one state kind.
fn status_flag(kind: FileState) -> &'static str {
    match kind {
        FileState::Modified => "-m",
        FileState::Added => "-a",
        FileState::Deleted => "-r",
        FileState::Unknown => "-u",
        FileState::Ignored => "-i",
        FileState::Clean => "-c",
    }
}

fn parse_status(output: &str) -> Vec<FileStatusEntry> {
    let mut results = Vec::new();
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        if let (Some(code), Some(path)) = (parts.next(), parts.next()) {
            results.push(FileStatusEntry::new(map_status_code(code), path));
        }
    }
    results
}

/// Parse `hg tags` output lines of the form `name    rev:hash`.
fn parse_tags(output: &str, filter: Option<&str>) -> Vec<String> {
    let rex = match Regex::new(r"^(.*?)\s+[0-9]+:[0-9a-f]+$") {
        Ok(rex) => rex,
        Err(_) => return Vec::new(),
    };
    output
        .lines()
        .filter_map(|line| rex.captures(line.trim_end()))
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| filter.map_or(true, |f| name.contains(f)))
        .collect()
}

/// Parse `hg version` banner into at most three numeric components.
fn parse_version(output: &str) -> Vec<u32> {
    let rex = match Regex::new(r"version (\d+)\.(\d+)\.*(\d*)") {
        Ok(rex) => rex,
        Err(_) => return Vec::new(),
    };
    rex.captures(output)
        .map(|caps| {
            (1..=3)
                .filter_map(|i| caps.get(i))
                .filter_map(|m| m.as_str().parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Pull `ui.username` out of `hg config` output.
fn parse_username(output: &str) -> Option<String> {
    let rex = Regex::new(r"(?mi)^ui\.username\s*=\s*(.*)$").ok()?;
    rex.captures(output)
        .map(|caps| caps[1].trim().to_string())
}

impl ScmOperations for HgScm {
    fn scm_type(&self) -> ScmType {
        ScmType::Hg
    }

    fn main_branch_name(&self) -> &str {
        "default"
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
            &vec!["clone".to_string(), remote, local],
            Path::new("."),
            None,
        )?;
        Ok(())
    }

    fn add_files(&self, files: &[String]) -> ScmResult<()> {
        let mut args = argv(&["add"]);
        args.extend(files.iter().cloned());
        self.run(args)?;
        Ok(())
    }

    fn commit(&self, message: &str) -> ScmResult<()> {
        let mut args = argv(&["commit"]);
        if let Some(user) = self.handle.username() {
            args.push("-u".to_string());
            args.push(user.to_string());
        }
        args.push("-m".to_string());
        args.push(message.to_string());
        self.run(args)?;
        Ok(())
    }

    fn push(&self) -> ScmResult<()> {
        let remote = self.require_remote()?.to_string();
        self.run(vec!["push".to_string(), remote])?;
        Ok(())
    }

    fn push_refs_atomic(&self, branches: &[String]) -> ScmResult<()> {
        let remote = self.require_remote()?.to_string();
        // One push transaction covering every named branch head.
        let mut args = argv(&["push"]);
        for branch in branches {
            args.push("-b".to_string());
            args.push(branch.clone());
        }
        args.push(remote);
        self.run(args)?;
        Ok(())
    }

    fn status(
        &self,
        kind: Option<FileState>,
        include: &[String],
        exclude: &[String],
    ) -> ScmResult<Vec<FileStatusEntry>> {
        let mut args = argv(&["status"]);
        if let Some(kind) = kind {
            args.push(status_flag(kind).to_string());
        }
        args.extend(pattern_args(include, exclude));
        let output = self.run(args)?;
        Ok(parse_status(&output))
    }

    fn goto_revision(&self, revision: Option<&str>) -> ScmResult<()> {
        let revision = revision.unwrap_or(self.main_branch_name());
        // Nested subrepos follow the update on their own.
        self.run(vec![
            "update".to_string(),
            "-r".to_string(),
            revision.to_string(),
        ])?;
        Ok(())
    }

    fn current_revision(
        &self,
        show_modified: bool,
        truncate_len: Option<usize>,
    ) -> ScmResult<String> {
        let output = self.run(argv(&["identify", "-i"]))?;
        let raw = output.trim();
        if raw.is_empty() {
            return Err(ScmError::scm_error("Current revision not found"));
        }
        let modified = raw.ends_with('+');
        let mut rev = raw.trim_end_matches('+').to_string();
        if let Some(length) = truncate_len {
            rev = rev.chars().take(length).collect();
        }
        if show_modified && modified {
            rev.push('+');
        }
        Ok(rev)
    }

    fn goto_branch(&self, branch: &str) -> ScmResult<()> {
        self.goto_revision(Some(branch))
    }

    fn current_branch(&self) -> ScmResult<String> {
        let output = self.run(argv(&["identify", "-b"]))?;
        let name = output.trim().to_string();
        if name.is_empty() {
            return Err(ScmError::scm_error("Current branch name not found"));
        }
        Ok(name)
    }

    fn branches(&self) -> ScmResult<Vec<Changeset>> {
        let output = self.run(vec![
            "heads".to_string(),
            "--template".to_string(),
            HG_TEMPLATE.to_string(),
        ])?;
        Ok(parse_changesets(&output))
    }

    fn create_branch(&self, name: &str) -> ScmResult<()> {
        self.run(vec!["branch".to_string(), name.to_string()])?;
        Ok(())
    }

    fn update_and_merge(&self) -> ScmResult<()> {
        self.require_remote()?;
        self.run(argv(&["pull", "-u"]))?;
        Ok(())
    }

    fn update(&self) -> ScmResult<()> {
        self.require_remote()?;
        self.run(argv(&["pull"]))?;
        Ok(())
    }

    fn merge(&self, revision: &str) -> ScmResult<()> {
        self.run(vec![
            "merge".to_string(),
            "-r".to_string(),
            revision.to_string(),
        ])?;
        Ok(())
    }

    fn discard_last_commit(&self) -> ScmResult<()> {
        self.run(argv(&["strip", "--rev", "."]))?;
        Ok(())
    }

    fn patch(&self, options: &PatchOptions) -> ScmResult<String> {
        let mut args = argv(&["diff"]);
        if options.include_subrepos {
            args.push("-S".to_string());
        }
        if options.stat_only {
            args.push("--stat".to_string());
        } else {
            args.push("-U".to_string());
            args.push(options.context.to_string());
        }

        match (&options.rev1, &options.rev2) {
            (Some(rev1), None) => {
                args.push("-c".to_string());
                args.push(rev1.clone());
            }
            (Some(rev1), Some(rev2)) => {
                args.push("-r".to_string());
                args.push(rev1.clone());
                args.push("-r".to_string());
                args.push(rev2.clone());
            }
            _ => {} // no revision: all uncommitted changes
        }

        args.extend(pattern_args(&options.include, &options.exclude));

        self.executor.run(
            &args,
            self.handle.local_path(),
            options.outfile.as_deref(),
        )
    }

    fn log(&self, options: &LogOptions) -> ScmResult<Vec<Changeset>> {
        let mut args = vec![
            "log".to_string(),
            "--template".to_string(),
            HG_TEMPLATE.to_string(),
        ];
        if let Some(revision) = &options.revision {
            args.push("-r".to_string());
            args.push(revision.clone());
        }
        if let Some(limit) = options.limit {
            args.push("-l".to_string());
            args.push(limit.to_string());
        }
        match (&options.start_date, &options.end_date) {
            (Some(start), Some(end)) => {
                args.push("--date".to_string());
                args.push(format!("{} to {}", start, end));
            }
            (Some(start), None) => {
                args.push("--date".to_string());
                args.push(format!(">{}", start));
            }
            (None, Some(end)) => {
                args.push("--date".to_string());
                args.push(format!("<{}", end));
            }
            (None, None) => {}
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
        let mut args = vec![
            "log".to_string(),
            "--template".to_string(),
            HG_TEMPLATE.to_string(),
            "-r".to_string(),
            format!("_firstancestors({})", revision.unwrap_or(".")),
        ];
        if let Some(limit) = limit {
            args.push("-l".to_string());
            args.push(limit.to_string());
        }
        let output = self.run(args)?;
        Ok(parse_changesets(&output))
    }

    fn tags(&self, filter: Option<&str>) -> ScmResult<Vec<String>> {
        let output = self.run(argv(&["tags"]))?;
        Ok(parse_tags(&output, filter))
    }

    fn create_tag(&self, name: &str, message: &str) -> ScmResult<()> {
        let mut args = vec![
            "tag".to_string(),
            name.to_string(),
            "-f".to_string(),
            "-m".to_string(),
            message.to_string(),
        ];
        if let Some(user) = self.handle.username() {
            args.push("-u".to_string());
            args.push(user.to_string());
        }
        self.run(args)?;
        Ok(())
    }

    fn latest_tag(&self) -> ScmResult<String> {
        let output = self.run(vec![
            "log".to_string(),
            "-r".to_string(),
            ".".to_string(),
            "--template".to_string(),
            "{latesttag}".to_string(),
        ])?;
        Ok(output.trim().to_string())
    }

    fn tracked_files(&self) -> ScmResult<Vec<String>> {
        let output = self.run(argv(&["manifest"]))?;
        // Some tool versions prefix entries with a permission mode.
        let rex = Regex::new(r"^\d{1,3}\s+").map_err(|e| ScmError::scm_error(e.to_string()))?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| rex.replace(line, "").into_owned())
            .collect())
    }

    fn revert_file(&self, file: Option<&str>) -> ScmResult<()> {
        let args = match file {
            Some(file) => vec!["revert".to_string(), file.to_string()],
            None => argv(&["revert", "-a"]),
        };
        self.run(args)?;
        Ok(())
    }

    fn subrepos(&self) -> ScmResult<Vec<String>> {
        let manifest = self.handle.local_path().join(".hgsub");
        if !manifest.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&manifest)?;
        Ok(parse_hgsub(&contents))
    }

    fn detected_remote(&self) -> ScmResult<String> {
        let output = self.run(argv(&["paths"]))?;
        let mut remote = "";
        for line in output.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("default ") || trimmed.starts_with("default=") {
                if let Some(url) = trimmed.splitn(2, '=').nth(1) {
                    remote = url.trim();
                }
            }
        }
        Ok(remote.to_string())
    }

    fn detected_local(&self) -> ScmResult<String> {
        let output = self.run(argv(&["root"]))?;
        // cygwin hack
        Ok(output.replace("/cygdrive/c", "C:").trim().to_string())
    }

    fn config(&self) -> ScmResult<ScmConfig> {
        let output = self.run(argv(&["config"]))?;
        Ok(ScmConfig {
            username: parse_username(&output),
        })
    }

    fn tool_version(&self) -> ScmResult<Vec<u32>> {
        let output = self.run(argv(&["version"]))?;
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

/// Extract sub-repository mount paths from `.hgsub` contents.
fn parse_hgsub(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split('=').next())
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty())
        .collect()
}
