pub mod execution;
pub mod group;
pub mod registry;
pub mod repository;
