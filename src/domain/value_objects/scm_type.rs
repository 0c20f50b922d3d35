use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SCM (Source Control Management) system type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScmType {
    /// Git version control system
    Git,
    /// Mercurial version control system
    Hg,
    /// No-op test double that records calls without touching disk
    Dummy,
}

impl fmt::Display for ScmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScmType::Git => write!(f, "git"),
            ScmType::Hg => write!(f, "hg"),
            ScmType::Dummy => write!(f, "dummy"),
        }
    }
}

impl FromStr for ScmType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "git" => Ok(ScmType::Git),
            "hg" | "mercurial" => Ok(ScmType::Hg),
            "dummy" => Ok(ScmType::Dummy),
            _ => Err(format!(
                "Unsupported SCM type: '{}'. Supported types are: git, hg, dummy",
                s
            )),
        }
    }
}

impl ScmType {
    /// Name of the default/main branch for this SCM.
    pub fn main_branch_name(&self) -> &'static str {
        match self {
            ScmType::Git => "master",
            ScmType::Hg => "default",
            ScmType::Dummy => "dummy",
        }
    }

    /// Get the metadata directory name for this SCM
    pub fn metadata_dir(&self) -> &'static str {
        match self {
            ScmType::Git => ".git",
            ScmType::Hg => ".hg",
            ScmType::Dummy => ".dummy",
        }
    }

    /// Get the standard executable name for this SCM
    pub fn executable_name(&self) -> &'static str {
        match self {
            ScmType::Git => "git",
            ScmType::Hg => "hg",
            ScmType::Dummy => "dummy",
        }
    }

    /// Name of the manifest file listing nested sub-repositories, if the
    /// SCM has one.
    pub fn subrepo_manifest(&self) -> Option<&'static str> {
        match self {
            ScmType::Git => Some(".gitmodules"),
            ScmType::Hg => Some(".hgsub"),
            ScmType::Dummy => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scm_type_from_str() {
        assert_eq!("git".parse::<ScmType>().unwrap(), ScmType::Git);
        assert_eq!("hg".parse::<ScmType>().unwrap(), ScmType::Hg);
        assert_eq!("mercurial".parse::<ScmType>().unwrap(), ScmType::Hg);
        assert_eq!("dummy".parse::<ScmType>().unwrap(), ScmType::Dummy);
        assert!("svn".parse::<ScmType>().is_err());
    }

    #[test]
    fn test_scm_type_display() {
        assert_eq!(ScmType::Git.to_string(), "git");
        assert_eq!(ScmType::Hg.to_string(), "hg");
        assert_eq!(ScmType::Dummy.to_string(), "dummy");
    }

    #[test]
    fn test_main_branch_names() {
        assert_eq!(ScmType::Git.main_branch_name(), "master");
        assert_eq!(ScmType::Hg.main_branch_name(), "default");
    }

    #[test]
    fn test_metadata_dirs() {
        assert_eq!(ScmType::Git.metadata_dir(), ".git");
        assert_eq!(ScmType::Hg.metadata_dir(), ".hg");
    }

    #[test]
    fn test_subrepo_manifests() {
        assert_eq!(ScmType::Git.subrepo_manifest(), Some(".gitmodules"));
        assert_eq!(ScmType::Hg.subrepo_manifest(), Some(".hgsub"));
        assert_eq!(ScmType::Dummy.subrepo_manifest(), None);
    }
}
