pub mod process;
pub mod scm;
