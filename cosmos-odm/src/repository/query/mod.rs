//! Repository query methods: metadata, name derivation and execution.
mod cosmos_query;
mod execution;
mod part_tree;
mod part_tree_query;
mod query_method;

pub use cosmos_query::*;
pub use execution::*;
pub use part_tree::*;
pub use part_tree_query::*;
pub use query_method::*;
