use crate::common::result::ScmResult;
use crate::domain::entities::changeset::Changeset;
use crate::domain::value_objects::file_status::{FileState, FileStatusEntry};
use crate::domain::value_objects::scm_type::ScmType;
use std::path::Path;

/// Common interface for all SCM operations.
///
/// Every backend variant (git, mercurial, the dummy test double) implements
/// the same operation set with identical semantics, so callers — in
/// particular the promotion orchestrator — never branch on backend type.
/// Status codes and log records are normalized into the shared
/// [`FileState`]/[`Changeset`] vocabulary.
pub trait ScmOperations: Send + Sync {
    /// Get the SCM type this implementation handles
    fn scm_type(&self) -> ScmType;

    /// Name of the main branch ("master", "default", ...)
    fn main_branch_name(&self) -> &str;

    /// Local working copy path this backend is attached to
    fn local_path(&self) -> &Path;

    /// Configured or auto-discovered remote URL, if any
    fn remote_url(&self) -> Option<&str>;

    /// Initialize a repository from scratch in the local path
    fn initialize(&self) -> ScmResult<()>;

    /// Clone the remote repository into the local path.
    /// Fails with a configuration error when no remote path is set.
    fn clone_repository(&self) -> ScmResult<()>;

    /// Track/stage files for commit. An empty slice stages everything.
    fn add_files(&self, files: &[String]) -> ScmResult<()>;

    /// Commit staged changes with the given message
    fn commit(&self, message: &str) -> ScmResult<()>;

    /// Push committed changes (and tags, where the tool separates them) to
    /// the remote repository. Requires a remote path.
    fn push(&self) -> ScmResult<()>;

    /// Publish the given branch heads in one atomic multi-ref push: the
    /// remote either accepts all of them or rejects all of them.
    fn push_refs_atomic(&self, branches: &[String]) -> ScmResult<()>;

    /// Current state of files in the working copy, optionally filtered to a
    /// single normalized state and/or include/exclude path patterns.
    fn status(
        &self,
        kind: Option<FileState>,
        include: &[String],
        exclude: &[String],
    ) -> ScmResult<Vec<FileStatusEntry>>;

    /// Move the working copy to the given revision (main branch when absent).
    /// Also updates nested sub-repositories when present.
    fn goto_revision(&self, revision: Option<&str>) -> ScmResult<()>;

    /// Revision id of the current working copy position.
    ///
    /// With `show_modified` the id carries a trailing `+` when the working
    /// copy has uncommitted changes. `truncate_len` limits the id to its
    /// first N characters.
    fn current_revision(
        &self,
        show_modified: bool,
        truncate_len: Option<usize>,
    ) -> ScmResult<String>;

    /// Switch the working copy to the named branch
    fn goto_branch(&self, branch: &str) -> ScmResult<()>;

    /// Name of the branch the working copy is currently on
    fn current_branch(&self) -> ScmResult<String>;

    /// One changeset per local branch head
    fn branches(&self) -> ScmResult<Vec<Changeset>>;

    /// Create a branch at the current revision without switching to it
    fn create_branch(&self, name: &str) -> ScmResult<()>;

    /// Fetch remote changes and merge them into the working copy
    /// (`git pull` / `hg pull -u`). Requires a remote path.
    fn update_and_merge(&self) -> ScmResult<()>;

    /// Fetch remote changes without touching the working copy
    /// (`git fetch` / `hg pull`). Requires a remote path.
    fn update(&self) -> ScmResult<()>;

    /// Merge the given revision into the current working copy position
    fn merge(&self, revision: &str) -> ScmResult<()>;

    /// Hard-reset the current branch one commit back, discarding the tip.
    /// Compensating action used by the promotion rollback.
    fn discard_last_commit(&self) -> ScmResult<()>;

    /// Patch (diff) text for the requested revision range
    fn patch(&self, options: &PatchOptions) -> ScmResult<String>;

    /// Log entries, newest first
    fn log(&self, options: &LogOptions) -> ScmResult<Vec<Changeset>>;

    /// First-parent-only ancestor chain of a revision, newest first
    fn ancestors(&self, revision: Option<&str>, limit: Option<usize>)
        -> ScmResult<Vec<Changeset>>;

    /// Tag names, newest to oldest
    fn tags(&self, filter: Option<&str>) -> ScmResult<Vec<String>>;

    /// Tag the current revision
    fn create_tag(&self, name: &str, message: &str) -> ScmResult<()>;

    /// Most recent tag reachable from the current revision
    fn latest_tag(&self) -> ScmResult<String>;

    /// All tracked file paths
    fn tracked_files(&self) -> ScmResult<Vec<String>>;

    /// Revert local changes to one file, or to all files when absent
    fn revert_file(&self, file: Option<&str>) -> ScmResult<()>;

    /// Mount paths of nested sub-repositories, empty when there are none
    fn subrepos(&self) -> ScmResult<Vec<String>>;

    /// Remote URL as reported by the tool itself (may differ from the
    /// configured one)
    fn detected_remote(&self) -> ScmResult<String>;

    /// Local repository root as reported by the tool itself
    fn detected_local(&self) -> ScmResult<String>;

    /// Repository configuration as reported by the tool
    fn config(&self) -> ScmResult<ScmConfig>;

    /// Numeric components of the tool version
    fn tool_version(&self) -> ScmResult<Vec<u32>>;

    /// Escape hatch: run the underlying tool with a raw argument vector.
    /// `cwd` defaults to the local repository path.
    fn raw_command(
        &self,
        args: &[String],
        cwd: Option<&Path>,
        outfile: Option<&Path>,
    ) -> ScmResult<String>;
}

/// Repository configuration values reported by the tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScmConfig {
    /// Configured committer user name, when set
    pub username: Option<String>,
}

/// Options for log queries
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Restrict to a single revision (implies a limit of one entry)
    pub revision: Option<String>,
    /// Return at most this many entries
    pub limit: Option<usize>,
    /// Restrict to changes touching this file
    pub file: Option<String>,
    /// Only changes after this date (tool-native date string)
    pub start_date: Option<String>,
    /// Only changes before this date (tool-native date string)
    pub end_date: Option<String>,
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_date_range(
        mut self,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        self.start_date = Some(start_date.into());
        self.end_date = Some(end_date.into());
        self
    }
}

/// Options for patch/diff queries
#[derive(Debug, Clone)]
pub struct PatchOptions {
    /// First revision; absent means all uncommitted changes
    pub rev1: Option<String>,
    /// Second revision; with `rev1` selects the range `rev1..rev2`
    pub rev2: Option<String>,
    /// Also write the patch text to this file
    pub outfile: Option<std::path::PathBuf>,
    /// Context lines around each hunk
    pub context: u32,
    /// Emit only the diffstat summary instead of the full diff
    pub stat_only: bool,
    /// Include path patterns
    pub include: Vec<String>,
    /// Exclude path patterns
    pub exclude: Vec<String>,
    /// Include nested sub-repositories in the diff
    pub include_subrepos: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            rev1: None,
            rev2: None,
            outfile: None,
            context: 5,
            stat_only: false,
            include: Vec::new(),
            exclude: Vec::new(),
            include_subrepos: true,
        }
    }
}

impl PatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_revision(mut self, rev1: impl Into<String>) -> Self {
        self.rev1 = Some(rev1.into());
        self
    }

    pub fn with_range(mut self, rev1: impl Into<String>, rev2: impl Into<String>) -> Self {
        self.rev1 = Some(rev1.into());
        self.rev2 = Some(rev2.into());
        self
    }

    pub fn with_outfile(mut self, outfile: impl Into<std::path::PathBuf>) -> Self {
        self.outfile = Some(outfile.into());
        self
    }

    pub fn with_context(mut self, context: u32) -> Self {
        self.context = context;
        self
    }

    pub fn with_stat_only(mut self, stat_only: bool) -> Self {
        self.stat_only = stat_only;
        self
    }

    pub fn with_subrepos(mut self, include_subrepos: bool) -> Self {
        self.include_subrepos = include_subrepos;
        self
    }
}
