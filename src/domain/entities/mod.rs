pub mod changeset;
pub mod repository;
