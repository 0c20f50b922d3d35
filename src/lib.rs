//! scmpromote - atomic change promotion across git and mercurial repositories.
//!
//! The crate wraps the native `git` and `hg` command line tools behind one
//! backend-neutral operation set ([`ScmOperations`]) and builds a retrying
//! promotion workflow on top of it: a change handler runs on a throwaway
//! branch, the result is committed, merged into the target branch (and
//! optionally a fast-forward ancestor branch) and published with an atomic
//! multi-ref push. Lost push races are rolled back and retried on the
//! freshly pulled state.
//!
//! Layering follows clean architecture: `domain` holds the shared vocabulary
//! (changesets, file states, repository handles), `infrastructure` drives
//! the external tools, `application` hosts the promotion use case and
//! `presentation` the CLI.

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::use_cases::promote_change::{PromoteChangeConfig, PromoteChangeUseCase};
pub use common::error::ScmError;
pub use common::result::ScmResult;
pub use domain::entities::changeset::Changeset;
pub use domain::entities::repository::RepositoryHandle;
pub use domain::value_objects::file_status::{FileState, FileStatusEntry};
pub use domain::value_objects::scm_type::ScmType;
pub use infrastructure::scm::{
    DummyScm, GitScm, HgScm, LogOptions, PatchOptions, ScmConfig, ScmFactory, ScmOperations,
};
