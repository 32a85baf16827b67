//! Entity mapping: the static mapping table of a type and the
//! entity/document converter.

mod converter;
mod entity;

pub use converter::*;
pub use entity::*;
