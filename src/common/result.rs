use crate::common::error::ScmError;

/// Result type used throughout the crate.
pub type ScmResult<T> = Result<T, ScmError>;
