//! Typed repositories and derived query methods.
mod cosmos_repository;
pub mod query;
mod reactive_repository;
mod repository_factory;
mod simple_cosmos_repository;

pub use cosmos_repository::*;
pub use reactive_repository::*;
pub use repository_factory::*;
pub use simple_cosmos_repository::*;
