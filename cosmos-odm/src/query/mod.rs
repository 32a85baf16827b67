//! Criteria trees, query descriptions and their translation to native SQL.
//!
//! A [`Criteria`] tree is built with a fluent API, wrapped in a
//! [`DocumentQuery`] together with sorting, limit and paging, and turned into
//! a [`SqlQuerySpec`](crate::client::SqlQuerySpec) by [`generate_query`].
//!
//! ```rust
//! use cosmos_odm::mapping::EntityInformation;
//! use cosmos_odm::query::{generate_query, Criteria, DocumentQuery};
//!
//! let info = EntityInformation::builder("Person")
//!     .property("last_name", "lastName", false)
//!     .build();
//! let query = DocumentQuery::new(Criteria::field("last_name").is("Smith"));
//! let spec = generate_query(&query, &info).unwrap();
//! assert_eq!(spec.query_text, "SELECT * FROM ROOT r WHERE r.lastName = @param0");
//! ```

mod criteria;
mod document_query;
mod page;
mod sort;
mod sql_generator;

pub use criteria::*;
pub use document_query::*;
pub use page::*;
pub use sort::*;
pub use sql_generator::*;
