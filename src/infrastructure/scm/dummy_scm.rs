use crate::common::error::ScmError;
use crate::common::result::ScmResult;
use crate::domain::entities::changeset::Changeset;
use crate::domain::entities::repository::RepositoryHandle;
use crate::domain::value_objects::file_status::{FileState, FileStatusEntry};
use crate::domain::value_objects::scm_type::ScmType;
use crate::infrastructure::scm::scm_interface::{
    LogOptions, PatchOptions, ScmConfig, ScmOperations,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory no-op backend used to exercise orchestration logic without a
/// real tool installed.
///
/// Every operation records its name (and salient arguments) into an ordered
/// call trace that tests assert against. Status output and push failures are
/// scriptable; each commit bumps a counter so successive revisions report
/// distinct hashes (`dummy1`, `dummy2`, ...).
pub struct DummyScm {
    handle: RepositoryHandle,
    calls: Mutex<Vec<String>>,
    status_entries: Vec<FileStatusEntry>,
    push_failures: AtomicUsize,
    commit_count: AtomicUsize,
}

impl DummyScm {
    pub fn new(handle: RepositoryHandle) -> Self {
        Self {
            handle,
            calls: Mutex::new(Vec::new()),
            status_entries: vec![FileStatusEntry::new(FileState::Modified, "dummy.txt")],
            push_failures: AtomicUsize::new(0),
            commit_count: AtomicUsize::new(0),
        }
    }

    /// Script the entries every status query returns.
    pub fn with_status_entries(mut self, entries: Vec<FileStatusEntry>) -> Self {
        self.status_entries = entries;
        self
    }

    /// Make the first `count` atomic pushes fail with a command error.
    pub fn with_push_failures(mut self, count: usize) -> Self {
        self.push_failures = AtomicUsize::new(count);
        self
    }

    /// Ordered trace of every operation invoked so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl ScmOperations for DummyScm {
    fn scm_type(&self) -> ScmType {
        ScmType::Dummy
    }

    fn main_branch_name(&self) -> &str {
        "dummy"
    }

    fn local_path(&self) -> &Path {
        self.handle.local_path()
    }

    fn remote_url(&self) -> Option<&str> {
        self.handle.remote_url()
    }

    fn initialize(&self) -> ScmResult<()> {
        self.record("initialize");
        Ok(())
    }

    fn clone_repository(&self) -> ScmResult<()> {
        self.record("clone_repository");
        Ok(())
    }

    fn add_files(&self, files: &[String]) -> ScmResult<()> {
        self.record(format!("add_files {:?}", files));
        Ok(())
    }

    fn commit(&self, message: &str) -> ScmResult<()> {
        self.commit_count.fetch_add(1, Ordering::SeqCst);
        self.record(format!("commit {}", message));
        Ok(())
    }

    fn push(&self) -> ScmResult<()> {
        self.record("push");
        Ok(())
    }

    fn push_refs_atomic(&self, branches: &[String]) -> ScmResult<()> {
        self.record(format!("push_refs_atomic {:?}", branches));
        let remaining = self.push_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.push_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ScmError::command_failed(
                "remote ref moved",
                "dummy push",
                1,
            ));
        }
        Ok(())
    }

    fn status(
        &self,
        kind: Option<FileState>,
        _include: &[String],
        _exclude: &[String],
    ) -> ScmResult<Vec<FileStatusEntry>> {
        self.record("status");
        Ok(self
            .status_entries
            .iter()
            .filter(|entry| kind.map_or(true, |k| entry.state == k))
            .cloned()
            .collect())
    }

    fn goto_revision(&self, revision: Option<&str>) -> ScmResult<()> {
        self.record(format!(
            "goto_revision {}",
            revision.unwrap_or(self.main_branch_name())
        ));
        Ok(())
    }

    fn current_revision(
        &self,
        _show_modified: bool,
        _truncate_len: Option<usize>,
    ) -> ScmResult<String> {
        self.record("current_revision");
        Ok(format!("dummy{}", self.commit_count.load(Ordering::SeqCst)))
    }

    fn goto_branch(&self, branch: &str) -> ScmResult<()> {
        self.record(format!("goto_branch {}", branch));
        Ok(())
    }

    fn current_branch(&self) -> ScmResult<String> {
        self.record("current_branch");
        Ok(self.main_branch_name().to_string())
    }

    fn branches(&self) -> ScmResult<Vec<Changeset>> {
        self.record("branches");
        Ok(Vec::new())
    }

    fn create_branch(&self, name: &str) -> ScmResult<()> {
        self.record(format!("create_branch {}", name));
        Ok(())
    }

    fn update_and_merge(&self) -> ScmResult<()> {
        self.record("update_and_merge");
        Ok(())
    }

    fn update(&self) -> ScmResult<()> {
        self.record("update");
        Ok(())
    }

    fn merge(&self, revision: &str) -> ScmResult<()> {
        self.record(format!("merge {}", revision));
        Ok(())
    }

    fn discard_last_commit(&self) -> ScmResult<()> {
        self.record("discard_last_commit");
        Ok(())
    }

    fn patch(&self, _options: &PatchOptions) -> ScmResult<String> {
        self.record("patch");
        Ok(String::new())
    }

    fn log(&self, _options: &LogOptions) -> ScmResult<Vec<Changeset>> {
        self.record("log");
        Ok(Vec::new())
    }

    fn ancestors(
        &self,
        _revision: Option<&str>,
        _limit: Option<usize>,
    ) -> ScmResult<Vec<Changeset>> {
        self.record("ancestors");
        Ok(Vec::new())
    }

    fn tags(&self, _filter: Option<&str>) -> ScmResult<Vec<String>> {
        self.record("tags");
        Ok(Vec::new())
    }

    fn create_tag(&self, name: &str, _message: &str) -> ScmResult<()> {
        self.record(format!("create_tag {}", name));
        Ok(())
    }

    fn latest_tag(&self) -> ScmResult<String> {
        self.record("latest_tag");
        Ok(String::new())
    }

    fn tracked_files(&self) -> ScmResult<Vec<String>> {
        self.record("tracked_files");
        Ok(Vec::new())
    }

    fn revert_file(&self, file: Option<&str>) -> ScmResult<()> {
        self.record(format!("revert_file {}", file.unwrap_or("*")));
        Ok(())
    }

    fn subrepos(&self) -> ScmResult<Vec<String>> {
        self.record("subrepos");
        Ok(Vec::new())
    }

    fn detected_remote(&self) -> ScmResult<String> {
        self.record("detected_remote");
        Ok(String::new())
    }

    fn detected_local(&self) -> ScmResult<String> {
        self.record("detected_local");
        Ok(self.handle.local_path().display().to_string())
    }

    fn config(&self) -> ScmResult<ScmConfig> {
        self.record("config");
        Ok(ScmConfig::default())
    }

    fn tool_version(&self) -> ScmResult<Vec<u32>> {
        self.record("tool_version");
        Ok(vec![0, 0, 0])
    }

    fn raw_command(
        &self,
        args: &[String],
        _cwd: Option<&Path>,
        _outfile: Option<&Path>,
    ) -> ScmResult<String> {
        self.record(format!("raw_command {:?}", args));
        Ok(String::new())
    }
}
