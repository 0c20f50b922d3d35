use crate::common::error::ScmError;
use crate::common::result::ScmResult;
use crate::domain::entities::repository::RepositoryHandle;
use crate::domain::value_objects::scm_type::ScmType;
use crate::infrastructure::scm::dummy_scm::DummyScm;
use crate::infrastructure::scm::git_scm::GitScm;
use crate::infrastructure::scm::hg_scm::HgScm;
use crate::infrastructure::scm::scm_interface::ScmOperations;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Remote URLs that can only be served by a git hosting service.
const GIT_REMOTE_PATTERN: &str = r"(bitbucket|\.git$)";

/// Factory for creating SCM backends, with tool auto-detection.
pub struct ScmFactory;

impl ScmFactory {
    /// Create a backend for an explicitly chosen SCM type.
    pub fn create(
        scm_type: ScmType,
        handle: RepositoryHandle,
    ) -> ScmResult<Arc<dyn ScmOperations>> {
        Ok(match scm_type {
            ScmType::Git => Arc::new(GitScm::new(handle)?),
            ScmType::Hg => Arc::new(HgScm::new(handle)?),
            ScmType::Dummy => Arc::new(DummyScm::new(handle)),
        })
    }

    /// Detect which SCM manages the handle and create the matching backend.
    /// Returns `Ok(None)` when nothing identifies the repository.
    pub fn detect(handle: &RepositoryHandle) -> ScmResult<Option<Arc<dyn ScmOperations>>> {
        match Self::detect_type(handle)? {
            Some(scm_type) => {
                debug!("detected {} repository at {}", scm_type, handle.local_path().display());
                Ok(Some(Self::create(scm_type, handle.clone())?))
            }
            None => Ok(None),
        }
    }

    /// Detection decision table, cheapest evidence first: the literal dummy
    /// path, then working copy metadata directories, then the remote URL
    /// shape. A working copy claimed by both git and mercurial is ambiguous
    /// and rejected outright.
    pub fn detect_type(handle: &RepositoryHandle) -> ScmResult<Option<ScmType>> {
        let local = handle.local_path();
        if local == Path::new("dummy") {
            return Ok(Some(ScmType::Dummy));
        }

        let has_git = local.join(ScmType::Git.metadata_dir()).is_dir();
        let has_hg = local.join(ScmType::Hg.metadata_dir()).is_dir();
        if has_git && has_hg {
            return Err(ScmError::config_error(format!(
                "Found both .git and .hg in {}; cannot determine which SCM to use",
                local.display()
            )));
        }
        if has_git {
            return Ok(Some(ScmType::Git));
        }
        if has_hg {
            return Ok(Some(ScmType::Hg));
        }

        let git_remote =
            Regex::new(GIT_REMOTE_PATTERN).map_err(|e| ScmError::scm_error(e.to_string()))?;
        match handle.remote_url() {
            Some(remote) if git_remote.is_match(remote) => Ok(Some(ScmType::Git)),
            // Any other remote is assumed to be mercurial.
            Some(_) => Ok(Some(ScmType::Hg)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_detects_git_from_metadata_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        let handle = RepositoryHandle::new(temp.path());
        assert_eq!(
            ScmFactory::detect_type(&handle).unwrap(),
            Some(ScmType::Git)
        );
    }

    #[test]
    fn test_detects_hg_from_metadata_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".hg")).unwrap();
        let handle = RepositoryHandle::new(temp.path());
        assert_eq!(ScmFactory::detect_type(&handle).unwrap(), Some(ScmType::Hg));
    }

    #[test]
    fn test_both_metadata_dirs_is_an_error() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        std::fs::create_dir(temp.path().join(".hg")).unwrap();
        let handle = RepositoryHandle::new(temp.path());
        assert!(matches!(
            ScmFactory::detect_type(&handle),
            Err(ScmError::Config { .. })
        ));
    }

    #[test]
    fn test_detects_git_from_remote_shape() {
        let temp = TempDir::new().unwrap();
        let handle = RepositoryHandle::new(temp.path())
            .with_remote_url("https://bitbucket.example.com/scm/proj/repo");
        assert_eq!(
            ScmFactory::detect_type(&handle).unwrap(),
            Some(ScmType::Git)
        );

        let handle =
            RepositoryHandle::new(temp.path()).with_remote_url("https://host/proj/repo.git");
        assert_eq!(
            ScmFactory::detect_type(&handle).unwrap(),
            Some(ScmType::Git)
        );
    }

    #[test]
    fn test_other_remotes_fall_back_to_hg() {
        let temp = TempDir::new().unwrap();
        let handle =
            RepositoryHandle::new(temp.path()).with_remote_url("https://hg.example.com/repo");
        assert_eq!(ScmFactory::detect_type(&handle).unwrap(), Some(ScmType::Hg));
    }

    #[test]
    fn test_dummy_path_selects_test_double() {
        let handle = RepositoryHandle::new("dummy");
        assert_eq!(
            ScmFactory::detect_type(&handle).unwrap(),
            Some(ScmType::Dummy)
        );
        let scm = ScmFactory::detect(&handle).unwrap().unwrap();
        assert_eq!(scm.scm_type(), ScmType::Dummy);
    }

    #[test]
    fn test_nothing_to_detect() {
        let temp = TempDir::new().unwrap();
        let handle = RepositoryHandle::new(temp.path());
        assert_eq!(ScmFactory::detect_type(&handle).unwrap(), None);
    }
}
