//! Shared types and constants.

mod constants;
mod partition_key;

pub use constants::*;
pub use partition_key::*;
pub use serde_json::Value as JsonValue;

/// A JSON document as stored in a container.
pub type Document = serde_json::Map<String, serde_json::Value>;
