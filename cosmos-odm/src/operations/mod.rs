//! Typed container and document operations.
//!
//! [`CosmosTemplate`] implements [`CosmosOperations`] over a document client;
//! [`ReactiveCosmosTemplate`] exposes the same operations as futures and
//! streams.

mod cosmos_operations;
mod cosmos_template;
mod reactive_template;

pub use cosmos_operations::*;
pub use cosmos_template::*;
pub use reactive_template::*;
