pub mod log;
pub mod promote;
pub mod status;
