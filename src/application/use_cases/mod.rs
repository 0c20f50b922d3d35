pub mod promote_change;

pub use promote_change::{PromoteChangeConfig, PromoteChangeUseCase};
