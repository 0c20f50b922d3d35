use crate::common::error::ScmError;
use crate::common::result::ScmResult;
use crate::domain::value_objects::file_status::FileState;
use crate::infrastructure::scm::scm_interface::ScmOperations;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Settings for one promotion run.
#[derive(Debug, Clone)]
pub struct PromoteChangeConfig {
    /// Branch the change is promoted onto
    pub target_branch: String,
    /// Commit message for the promoted change
    pub commit_message: String,
    /// Optional ancestor branch that fast-forwards from the target; when
    /// set, the change lands on both branches or on neither
    pub ff_ancestor_branch: Option<String>,
    /// Prefix for the throwaway per-attempt work branches
    pub tmp_branch_prefix: String,
    /// Maximum number of promotion attempts
    pub retry_count: u32,
    /// Uninstall LFS hooks before the first attempt (needed for
    /// passwordless pushes over SSH)
    pub disable_lfs: bool,
}

impl PromoteChangeConfig {
    pub fn new(target_branch: impl Into<String>, commit_message: impl Into<String>) -> Self {
        Self {
            target_branch: target_branch.into(),
            commit_message: commit_message.into(),
            ff_ancestor_branch: None,
            tmp_branch_prefix: "tmp".to_string(),
            retry_count: 3,
            disable_lfs: false,
        }
    }

    pub fn with_ff_ancestor_branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        if !branch.trim().is_empty() {
            self.ff_ancestor_branch = Some(branch);
        }
        self
    }

    pub fn with_tmp_branch_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tmp_branch_prefix = prefix.into();
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_disable_lfs(mut self, disable_lfs: bool) -> Self {
        self.disable_lfs = disable_lfs;
        self
    }
}

/// Promotes a set of file modifications onto a target branch, with the
/// option of additionally fast-forwarding an ancestor branch.
///
/// Each attempt runs the change handler on a fresh throwaway branch, commits
/// the result, merges it into the target (and the ancestor, when set) and
/// publishes every moved branch head in one atomic push. When the push loses
/// the race against a concurrent writer, the merged branches are rolled back
/// one commit and the whole attempt is redone on the freshly pulled state,
/// up to the configured retry count.
pub struct PromoteChangeUseCase {
    scm: Arc<dyn ScmOperations>,
    config: PromoteChangeConfig,
}

/// Bookkeeping for one attempt, so a failed attempt can undo exactly the
/// merges it already made.
struct PromotionAttempt {
    number: u32,
    tmp_branch: String,
    target_merged: bool,
    ancestor_merged: bool,
}

impl PromoteChangeUseCase {
    pub fn new(scm: Arc<dyn ScmOperations>, config: PromoteChangeConfig) -> Self {
        Self { scm, config }
    }

    /// Run the promotion. `handler` is invoked once per attempt with the
    /// local repository path and performs the actual file modifications.
    ///
    /// Returns the hash of the promoted commit. Fails without retrying when
    /// the handler produces no file modifications, and with
    /// [`ScmError::RetriesExhausted`] when every attempt lost the push race.
    pub fn execute<F>(&self, mut handler: F) -> ScmResult<String>
    where
        F: FnMut(&Path) -> ScmResult<()>,
    {
        if self.config.retry_count == 0 {
            return Err(ScmError::config_error(
                "Promotion retry count must be at least 1",
            ));
        }

        if self.config.disable_lfs {
            info!("Disabling LFS hooks...");
            self.scm
                .raw_command(&["lfs".to_string(), "uninstall".to_string()], None, None)?;
        }

        let mut last_error = None;
        for number in 1..=self.config.retry_count {
            info!(
                "Updating repository files attempt {}/{}",
                number, self.config.retry_count
            );

            let mut attempt = PromotionAttempt {
                number,
                tmp_branch: format!("{}_{}", self.config.tmp_branch_prefix, number),
                target_merged: false,
                ancestor_merged: false,
            };

            match self.run_attempt(&mut attempt, &mut handler) {
                Ok(commit_hash) => return Ok(commit_hash),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("SCM error caught: {}", e);
                    // Reset the integration branches back to their original
                    // state. Both are updated together or not at all.
                    self.rollback(&attempt)?;
                    last_error = Some(e);
                }
            }
        }

        let last_error = last_error.unwrap_or_else(|| {
            ScmError::scm_error("Promotion failed without a recorded cause")
        });
        Err(ScmError::retries_exhausted(
            self.config.retry_count,
            last_error,
        ))
    }

    fn run_attempt<F>(&self, attempt: &mut PromotionAttempt, handler: &mut F) -> ScmResult<String>
    where
        F: FnMut(&Path) -> ScmResult<()>,
    {
        let target = &self.config.target_branch;

        // Branch off the latest target state for the file modifications.
        self.scm.goto_branch(target)?;
        self.scm.create_branch(&attempt.tmp_branch)?;
        self.scm.goto_branch(&attempt.tmp_branch)?;

        handler(self.scm.local_path())?;

        let changed = self
            .scm
            .status(None, &[], &[])?
            .into_iter()
            .filter(|entry| {
                entry.state != FileState::Clean && entry.state != FileState::Ignored
            })
            .count();
        if changed == 0 {
            error!(
                "The file changes completed by the handler did not result in any \
                 file modifications. This may be expected behavior."
            );
            return Err(ScmError::NoChanges);
        }

        self.scm.add_files(&[])?;
        info!("Committing local revision update.");
        self.scm.commit(&self.config.commit_message)?;
        info!("Local revision update committed.");

        let commit_hash = self.scm.current_revision(false, None)?;

        // Merge back to the target branch, pulling first so the merge sees
        // anything a concurrent writer already published.
        self.scm.goto_branch(target)?;
        self.scm.update_and_merge()?;
        self.scm.merge(&attempt.tmp_branch)?;
        attempt.target_merged = true;

        let mut refs = vec![target.clone()];
        if let Some(ancestor) = &self.config.ff_ancestor_branch {
            self.scm.goto_branch(ancestor)?;
            self.scm.update_and_merge()?;
            self.scm.merge(&attempt.tmp_branch)?;
            attempt.ancestor_merged = true;
            refs.push(ancestor.clone());
        }

        info!(
            "Pushing to remote origin attempt {}/{}...",
            attempt.number, self.config.retry_count
        );
        self.scm.push_refs_atomic(&refs)?;

        info!("Change promoted onto {} as {}", target, commit_hash);
        Ok(commit_hash)
    }

    /// Undo the merges a failed attempt already made, newest first.
    fn rollback(&self, attempt: &PromotionAttempt) -> ScmResult<()> {
        if attempt.ancestor_merged {
            if let Some(ancestor) = &self.config.ff_ancestor_branch {
                self.scm.goto_branch(ancestor)?;
                self.scm.discard_last_commit()?;
            }
        }
        if attempt.target_merged {
            self.scm.goto_branch(&self.config.target_branch)?;
            self.scm.discard_last_commit()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::repository::RepositoryHandle;
    use crate::domain::value_objects::file_status::{FileState, FileStatusEntry};
    use crate::infrastructure::scm::dummy_scm::DummyScm;
    use pretty_assertions::assert_eq;

    fn dummy() -> DummyScm {
        DummyScm::new(RepositoryHandle::new("dummy"))
    }

    fn config() -> PromoteChangeConfig {
        PromoteChangeConfig::new("integration", "promote model updates")
    }

    #[test]
    fn test_successful_first_attempt() {
        let scm = Arc::new(dummy());
        let use_case = PromoteChangeUseCase::new(scm.clone(), config());

        let mut handler_runs = 0;
        let hash = use_case
            .execute(|_path| {
                handler_runs += 1;
                Ok(())
            })
            .unwrap();

        assert_eq!(hash, "dummy1");
        assert_eq!(handler_runs, 1);
        assert_eq!(
            scm.calls(),
            vec![
                "goto_branch integration",
                "create_branch tmp_1",
                "goto_branch tmp_1",
                "status",
                "add_files []",
                "commit promote model updates",
                "current_revision",
                "goto_branch integration",
                "update_and_merge",
                "merge tmp_1",
                "push_refs_atomic [\"integration\"]",
            ]
        );
    }

    #[test]
    fn test_no_changes_is_fatal_and_not_retried() {
        let scm = Arc::new(dummy().with_status_entries(vec![FileStatusEntry::new(
            FileState::Clean,
            "untouched.txt",
        )]));
        let use_case = PromoteChangeUseCase::new(scm.clone(), config());

        let err = use_case.execute(|_path| Ok(())).unwrap_err();
        assert!(matches!(err, ScmError::NoChanges));
        // One attempt, no commit, no push.
        let calls = scm.calls();
        assert!(!calls.iter().any(|c| c.starts_with("commit")));
        assert!(!calls.iter().any(|c| c.starts_with("push_refs_atomic")));
        assert_eq!(calls.iter().filter(|c| *c == "status").count(), 1);
    }

    #[test]
    fn test_push_race_is_retried_on_a_fresh_branch() {
        let scm = Arc::new(dummy().with_push_failures(2));
        let use_case = PromoteChangeUseCase::new(scm.clone(), config());

        let hash = use_case.execute(|_path| Ok(())).unwrap();

        // Third attempt commits the third revision.
        assert_eq!(hash, "dummy3");
        let calls = scm.calls();
        assert_eq!(
            calls
                .iter()
                .filter(|c| c.starts_with("push_refs_atomic"))
                .count(),
            3
        );
        assert!(calls.iter().any(|c| c == "create_branch tmp_1"));
        assert!(calls.iter().any(|c| c == "create_branch tmp_2"));
        assert!(calls.iter().any(|c| c == "create_branch tmp_3"));
        // Each failed attempt rolled the target back one commit.
        assert_eq!(
            calls.iter().filter(|c| *c == "discard_last_commit").count(),
            2
        );
    }

    #[test]
    fn test_retries_exhausted_after_configured_attempts() {
        let scm = Arc::new(dummy().with_push_failures(3));
        let use_case = PromoteChangeUseCase::new(scm.clone(), config());

        let err = use_case.execute(|_path| Ok(())).unwrap_err();
        match err {
            ScmError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected retries exhausted, got {:?}", other),
        }
        let calls = scm.calls();
        assert_eq!(
            calls
                .iter()
                .filter(|c| c.starts_with("push_refs_atomic"))
                .count(),
            3
        );
        assert_eq!(
            calls.iter().filter(|c| *c == "discard_last_commit").count(),
            3
        );
    }

    #[test]
    fn test_dual_branch_push_and_reverse_rollback_order() {
        let scm = Arc::new(dummy().with_push_failures(1));
        let config = config().with_ff_ancestor_branch("release").with_retry_count(2);
        let use_case = PromoteChangeUseCase::new(scm.clone(), config);

        let hash = use_case.execute(|_path| Ok(())).unwrap();
        assert_eq!(hash, "dummy2");

        let calls = scm.calls();
        assert!(calls
            .iter()
            .any(|c| c == "push_refs_atomic [\"integration\", \"release\"]"));

        // After the failed push: ancestor is rolled back before the target.
        let failed_push = calls
            .iter()
            .position(|c| c.starts_with("push_refs_atomic"))
            .unwrap();
        let rollback: Vec<&str> = calls[failed_push + 1..]
            .iter()
            .take(4)
            .map(|c| c.as_str())
            .collect();
        assert_eq!(
            rollback,
            vec![
                "goto_branch release",
                "discard_last_commit",
                "goto_branch integration",
                "discard_last_commit",
            ]
        );
    }

    #[test]
    fn test_blank_ancestor_branch_is_ignored() {
        let config = config().with_ff_ancestor_branch("   ");
        assert!(config.ff_ancestor_branch.is_none());
    }

    #[test]
    fn test_zero_retry_count_is_rejected() {
        let scm = Arc::new(dummy());
        let use_case =
            PromoteChangeUseCase::new(scm.clone(), config().with_retry_count(0));
        let err = use_case.execute(|_path| Ok(())).unwrap_err();
        assert!(matches!(err, ScmError::Config { .. }));
        assert!(scm.calls().is_empty());
    }

    #[test]
    fn test_disable_lfs_runs_before_first_attempt() {
        let scm = Arc::new(dummy());
        let use_case =
            PromoteChangeUseCase::new(scm.clone(), config().with_disable_lfs(true));
        use_case.execute(|_path| Ok(())).unwrap();
        assert_eq!(scm.calls()[0], "raw_command [\"lfs\", \"uninstall\"]");
    }

    #[test]
    fn test_handler_error_propagates() {
        let scm = Arc::new(dummy());
        let use_case = PromoteChangeUseCase::new(scm.clone(), config());
        let err = use_case
            .execute(|_path| Err(ScmError::config_error("handler cannot run")))
            .unwrap_err();
        assert!(matches!(err, ScmError::Config { .. }));
    }
}
