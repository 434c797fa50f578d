//! relgraph Core - Entity relation resolution.
//!
//! This crate reads entity declarations from a [`TypeCatalog`], classifies
//! which fields are relations, pairs both sides of each relation into one
//! canonical [`RelationInfo`] and answers composition queries through
//! [`RelationService`].
//!
//! ```
//! use relgraph_core::{CascadeType, CatalogSnapshot, EntityDecl, FieldDecl, RelationService};
//!
//! let catalog = CatalogSnapshot::new(1)
//!     .with_entity(EntityDecl::new("Order").with_field(
//!         FieldDecl::list_of("items", "OrderItem")
//!             .with_cascade(CascadeType::Remove)
//!             .with_orphan_removal(),
//!     ))
//!     .with_entity(
//!         EntityDecl::new("OrderItem")
//!             .with_field(FieldDecl::reference("order", "Order").mapped_by("items")),
//!     );
//!
//! let service = RelationService::new(catalog);
//! let parent = service.find_composition_parent("OrderItem").unwrap().unwrap();
//! assert_eq!(parent.info.owner.to_string(), "Order.items");
//! ```

pub mod catalog;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod resolve;
pub mod service;

pub use catalog::{
    Capability, Cardinality, CascadeSet, CascadeType, CatalogDocument, CatalogSnapshot,
    CollectionKind, DeclKind, EntityDecl, FieldDecl, FieldRef, Multiplicity, Relation,
    RelationInfo, RelationMarkers, ScalarType, Side, TypeCatalog, TypeId, ValueType,
};
pub use config::ResolverConfig;
pub use diagnostic::{Diagnostic, DiagnosticKind, MirrorFault};
pub use error::Error;
pub use resolve::{Classification, FieldClassifier, FieldRelation, Ownership, RelationResolver, Resolution};
pub use service::{CacheStats, CacheStatsSnapshot, EntityRef, RelationService};
