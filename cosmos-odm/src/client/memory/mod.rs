//! In-memory document client.

mod in_memory_client;
pub(crate) mod sql;

pub use in_memory_client::*;
