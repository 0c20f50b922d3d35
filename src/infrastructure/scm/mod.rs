pub mod dummy_scm;
pub mod git_scm;
pub mod hg_scm;
pub mod scm_factory;
pub mod scm_interface;

pub use dummy_scm::DummyScm;
pub use git_scm::GitScm;
pub use hg_scm::HgScm;
pub use scm_factory::ScmFactory;
pub use scm_interface::{LogOptions, PatchOptions, ScmConfig, ScmOperations};
