pub mod file_status;
pub mod scm_type;
