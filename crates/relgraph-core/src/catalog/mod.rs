//! Type catalog for relgraph.
//!
//! The catalog holds the declared entity types the resolver reads. It is
//! supplied by an external metadata provider and never mutated here.

mod catalog;
mod entity;
mod field;
mod relation;
mod snapshot;
mod types;

pub use catalog::TypeCatalog;
pub use entity::{Capability, DeclKind, EntityDecl};
pub use field::{FieldDecl, RelationMarkers};
pub use relation::{
    Cardinality, CascadeSet, CascadeType, FieldRef, Multiplicity, Relation, RelationInfo, Side,
};
pub use snapshot::{CatalogDocument, CatalogSnapshot};
pub use types::{CollectionKind, ScalarType, TypeId, ValueType};
