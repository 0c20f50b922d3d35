use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalized file state vocabulary shared by every backend.
///
/// Each backend maps its native single-letter status codes into this closed
/// set; codes that have no mapping become [`FileState::Unknown`] rather than
/// an error, so new tool versions cannot break status parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    /// Tracked file with local modifications (`mod`)
    #[serde(rename = "mod")]
    Modified,
    /// File staged for addition (`add`)
    #[serde(rename = "add")]
    Added,
    /// File removed or deleted (`del`)
    #[serde(rename = "del")]
    Deleted,
    /// File not tracked or unmapped status code (`unk`)
    #[serde(rename = "unk")]
    Unknown,
    /// File matched by an ignore rule (`ign`)
    #[serde(rename = "ign")]
    Ignored,
    /// Tracked file without modifications (`cln`)
    #[serde(rename = "cln")]
    Clean,
}

impl FileState {
    /// Short normalized code, the cross-backend wire form.
    pub fn code(&self) -> &'static str {
        match self {
            FileState::Modified => "mod",
            FileState::Added => "add",
            FileState::Deleted => "del",
            FileState::Unknown => "unk",
            FileState::Ignored => "ign",
            FileState::Clean => "cln",
        }
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FileState {
    type Err = String;

    /// Accepts both the normalized codes and the long filter spellings used
    /// by the status query ("modified", "removed", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mod" | "modified" => Ok(FileState::Modified),
            "add" | "added" => Ok(FileState::Added),
            "del" | "removed" | "deleted" => Ok(FileState::Deleted),
            "unk" | "unknown" => Ok(FileState::Unknown),
            "ign" | "ignored" => Ok(FileState::Ignored),
            "cln" | "clean" => Ok(FileState::Clean),
            _ => Err(format!("Unknown file state to search for: {}", s)),
        }
    }
}

/// One entry of a status query: normalized state plus repo-relative path.
///
/// Produced fresh by every status call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatusEntry {
    pub state: FileState,
    pub path: String,
}

impl FileStatusEntry {
    pub fn new(state: FileState, path: impl Into<String>) -> Self {
        Self {
            state,
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(FileState::Modified.code(), "mod");
        assert_eq!(FileState::Added.code(), "add");
        assert_eq!(FileState::Deleted.code(), "del");
        assert_eq!(FileState::Unknown.code(), "unk");
        assert_eq!(FileState::Ignored.code(), "ign");
        assert_eq!(FileState::Clean.code(), "cln");
    }

    #[test]
    fn test_filter_spellings() {
        assert_eq!("modified".parse::<FileState>().unwrap(), FileState::Modified);
        assert_eq!("removed".parse::<FileState>().unwrap(), FileState::Deleted);
        assert_eq!("deleted".parse::<FileState>().unwrap(), FileState::Deleted);
        assert_eq!("clean".parse::<FileState>().unwrap(), FileState::Clean);
        assert!("staged".parse::<FileState>().is_err());
    }

    #[test]
    fn test_serde_uses_codes() {
        let entry = FileStatusEntry::new(FileState::Added, "file.txt");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"state":"add","path":"file.txt"}"#);
    }
}
