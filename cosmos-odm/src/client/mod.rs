//! The document-database client seam.
//!
//! [`DocumentClient`] is the boundary to the database SDK: everything below
//! it (transport, partition routing, query execution) is the client's job.
//! [`InMemoryDocumentClient`] implements the boundary in process memory and
//! understands the native SQL dialect produced by the query translator.

mod document_client;
mod memory;
mod sql_query_spec;

pub use document_client::*;
pub use memory::InMemoryDocumentClient;
pub use sql_query_spec::*;
