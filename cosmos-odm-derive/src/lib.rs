#![recursion_limit = "128"]
//! # cosmos_odm Derive Macros
//!
//! This crate provides the `CosmosEntity` derive macro, which builds the
//! static mapping table (`EntityInformation`) of an entity type.
//!
//! ## `CosmosEntity`
//!
//! - **Supported for**: non-generic structs with named fields
//! - **Struct attribute**: `#[entity(container = "...", partition_key = "...", ru = 400, auto_create_container = false)]`
//! - **Field attribute**: `#[entity(id)]` marks the id field; a field named `id` is used otherwise
//!
//! Storage names follow the `serde` attributes of the struct
//! (`rename_all`, `rename`, `skip`), so the type must also derive
//! `Serialize` and `Deserialize`.
//!
//! # Examples
//!
//! ```rust,ignore
//! use cosmos_odm_derive::CosmosEntity;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, CosmosEntity)]
//! #[serde(rename_all = "camelCase")]
//! #[entity(container = "people", partition_key = "last_name")]
//! pub struct Person {
//!     pub id: String,
//!     pub first_name: String,
//!     pub last_name: String,
//!     pub hobbies: Vec<String>,
//! }
//! ```

extern crate proc_macro;
mod cosmos_entity;

use crate::cosmos_entity::generate_entity_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives `cosmos_odm::mapping::CosmosEntity`.
///
/// # Attributes
///
/// - `#[entity(container = "name")]` - container name, defaults to the type name
/// - `#[entity(partition_key = "field")]` - field holding the partition key
/// - `#[entity(ru = 400)]` - throughput used when the container is created
/// - `#[entity(auto_create_container = false)]` - skip container creation
/// - `#[entity(id)]` on a field - the id field
///
/// # Errors
///
/// Returns a compile error if:
/// - Applied to an enum, a union or a generic struct
/// - No id field can be found
/// - The partition key names an unknown or skipped field
#[proc_macro_derive(CosmosEntity, attributes(entity))]
pub fn derive_cosmos_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_entity_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => {
                let error = syn::Error::new(
                    e.span(),
                    format!("Failed to derive CosmosEntity for struct '{}': {}", ast.ident, e),
                );
                error.to_compile_error().into()
            }
        },
        Data::Enum(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive CosmosEntity for enums. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
        Data::Union(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive CosmosEntity for unions. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
    }
}
