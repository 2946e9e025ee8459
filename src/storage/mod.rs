//! Storage type mappings
//!
//! Decides how a semantic value type is stored and literal-rendered by the
//! target engine: store type name, facets (size, precision/scale, unicode,
//! fixed length) and SQL literal generation.
//!
//! Resolution lives in [TypeMappingSource]; "not found" is an [Option], never
//! an error — callers treat absence as "leave untyped, infer later".

mod mapping;
mod source;

pub use mapping::{Facets, StoreSize, StoreTypeName, TypeMapping};
pub use source::{FacetOverrides, TypeMappingSource};
