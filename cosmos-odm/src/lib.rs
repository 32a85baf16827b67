//! # cosmos_odm - Object-Document Mapping for Cosmos DB style databases
//!
//! cosmos_odm maps plain Rust structs onto containers of a partitioned JSON
//! document database and exposes them through typed repositories. Queries
//! are written as [`Criteria`](query::Criteria) trees or derived from method
//! names and translated into the database's native SQL dialect, with every
//! value bound as a parameter.
//!
//! ## Key Features
//!
//! - **Mapping**: `#[derive(CosmosEntity)]` (from `cosmos_odm_derive`) builds the
//!   static mapping table of an entity, on top of `serde`
//! - **Query translation**: criteria trees become parameterized `SELECT` statements
//! - **Derived queries**: `find_by_last_name_and_age_greater_than` style methods
//! - **Execution dispatch**: delete, paged, exists, multi-entity and single-entity
//!   strategies picked from the method's metadata
//! - **Sync and reactive**: the same operations as blocking calls or lazy
//!   futures and streams
//! - **Pluggable client**: any [`DocumentClient`](client::DocumentClient), with an
//!   in-memory client that evaluates the generated SQL
//!
//! ## Quick Start
//!
//! ```rust
//! use cosmos_odm::cosmos_config::CosmosConfig;
//! use cosmos_odm::cosmos_factory::CosmosFactory;
//! use cosmos_odm::mapping::{CosmosEntity, EntityInformation};
//! use cosmos_odm::query::{Criteria, DocumentQuery};
//! use cosmos_odm::operations::CosmosOperations;
//! use cosmos_odm::repository::{CosmosRepository, CosmosRepositoryFactory};
//! use serde::{Deserialize, Serialize};
//! use std::sync::OnceLock;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Person {
//!     id: String,
//!     name: String,
//! }
//!
//! impl CosmosEntity for Person {
//!     fn entity_information() -> &'static EntityInformation {
//!         static INFO: OnceLock<EntityInformation> = OnceLock::new();
//!         INFO.get_or_init(|| {
//!             EntityInformation::builder("Person")
//!                 .container("people")
//!                 .property("id", "id", false)
//!                 .property("name", "name", false)
//!                 .build()
//!         })
//!     }
//! }
//!
//! # fn main() -> cosmos_odm::errors::CosmosResult<()> {
//! let config = CosmosConfig::builder()
//!     .uri("memory://local")
//!     .key("unused")
//!     .database("app")
//!     .build()?;
//! let factory = CosmosFactory::in_memory(config);
//! let repositories = CosmosRepositoryFactory::new(factory.template()?);
//!
//! let people = repositories.repository::<Person>()?;
//! people.save(&Person { id: "1".into(), name: "Ann".into() })?;
//!
//! let query = DocumentQuery::new(Criteria::field("name").is("Ann"));
//! let found: Vec<Person> = people.operations().find(&query, "people")?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - Document client seam and the in-memory client
//! - [`common`] - Constants, partition keys and document aliases
//! - [`cosmos_config`] - Connection configuration
//! - [`cosmos_factory`] - Pairs a configuration with a client
//! - [`errors`] - Error types and result definitions
//! - [`mapping`] - Entity mapping tables and the document converter
//! - [`operations`] - Sync and reactive operations facades
//! - [`query`] - Criteria, sorting, paging and SQL translation
//! - [`repository`] - Typed repositories and derived query methods

pub mod client;
pub mod common;
pub mod cosmos_config;
pub mod cosmos_factory;
pub mod errors;
pub mod mapping;
pub mod operations;
pub mod query;
pub mod repository;
