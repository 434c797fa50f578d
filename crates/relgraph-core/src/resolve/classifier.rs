//! Field relation classifier.
//!
//! Decides whether a single field encodes a relation and, if so, extracts
//! the partial descriptor for its side. Pure over the field and the catalog.

use crate::catalog::{
    Cardinality, CascadeSet, DeclKind, FieldDecl, FieldRef, Multiplicity, Side, TypeCatalog,
    TypeId,
};
use crate::diagnostic::{Diagnostic, MirrorFault};

use super::hierarchy::Hierarchy;

/// Ownership intent of one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Declared with an explicit side marker.
    Declared(Side),
    /// Implied by the mirror marker: a field naming its mirror is inverse.
    Implied(Side),
}

impl Ownership {
    /// The side, regardless of how it was established.
    pub fn side(self) -> Side {
        match self {
            Ownership::Declared(side) | Ownership::Implied(side) => side,
        }
    }
}

/// Partial relation descriptor for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRelation {
    /// The classified field.
    pub field: FieldRef,
    /// Referenced entity.
    pub target: TypeId,
    /// How many targets the field holds.
    pub multiplicity: Multiplicity,
    /// Declared cardinality, if any.
    pub declared: Option<Cardinality>,
    /// Ownership intent.
    pub ownership: Ownership,
    /// Declared mirror field name.
    pub mapped_by: Option<String>,
    /// Declared cascade operations.
    pub cascade: CascadeSet,
    /// Declared orphan removal.
    pub orphan_removal: bool,
}

/// Result of classifying a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Scalar, embeddable, or unmarked reference to a non-entity.
    NotRelation,
    /// A relation field.
    Relation(FieldRelation),
}

/// Classifies fields against a catalog.
pub struct FieldClassifier<'a, C: TypeCatalog + ?Sized> {
    catalog: &'a C,
    hierarchy: Hierarchy<'a, C>,
}

impl<'a, C: TypeCatalog + ?Sized> FieldClassifier<'a, C> {
    /// Create a classifier over a catalog.
    pub fn new(catalog: &'a C, max_supertype_depth: usize) -> Self {
        Self {
            catalog,
            hierarchy: Hierarchy::new(catalog, max_supertype_depth),
        }
    }

    /// Classify `field`, declared on the type named `owner`.
    pub fn classify(&self, owner: &str, field: &FieldDecl) -> Result<Classification, Diagnostic> {
        let Some(target) = field.value_type.referenced_type() else {
            return Ok(Classification::NotRelation);
        };
        let field_ref = FieldRef::new(owner, &field.name);

        let Some(target_decl) = self.catalog.declaration_of(target) else {
            if field.has_relation_markers() {
                return Err(Diagnostic::UnknownType {
                    entity: owner.to_string(),
                    field: Some(field.name.clone()),
                    referenced: target.to_string(),
                });
            }
            return Ok(Classification::NotRelation);
        };

        match target_decl.kind {
            DeclKind::Entity => {}
            DeclKind::Embeddable => return Ok(Classification::NotRelation),
            DeclKind::MappedSuperclass if field.has_relation_markers() => {
                return Err(Diagnostic::NonEntityTarget {
                    field: field_ref,
                    target: target.to_string(),
                    declared_kind: target_decl.kind,
                });
            }
            DeclKind::MappedSuperclass => return Ok(Classification::NotRelation),
        }

        let multiplicity = if field.value_type.is_collection() {
            Multiplicity::Many
        } else {
            Multiplicity::One
        };

        let markers = &field.markers;
        if let Some(declared) = markers.cardinality {
            if declared.field_multiplicity() != multiplicity {
                let shape = match multiplicity {
                    Multiplicity::One => "single-valued",
                    Multiplicity::Many => "collection",
                };
                return Err(Diagnostic::CardinalityMismatch {
                    field: field_ref,
                    mirror: None,
                    detail: format!("declared {declared} on a {shape} field"),
                });
            }
        }

        if let Some(mirror) = &markers.mapped_by {
            if self.hierarchy.find_field(target, mirror).is_none() {
                return Err(Diagnostic::BrokenMirrorReference {
                    field: field_ref,
                    target: target.to_string(),
                    mirror: mirror.clone(),
                    fault: MirrorFault::Missing,
                });
            }
        }

        let ownership = match (markers.side, &markers.mapped_by) {
            (Some(side), _) => Ownership::Declared(side),
            (None, Some(_)) => Ownership::Implied(Side::Inverse),
            (None, None) => Ownership::Implied(Side::Owning),
        };

        Ok(Classification::Relation(FieldRelation {
            field: field_ref,
            target: target.to_string(),
            multiplicity,
            declared: markers.cardinality,
            ownership,
            mapped_by: markers.mapped_by.clone(),
            cascade: markers.cascade.clone(),
            orphan_removal: markers.orphan_removal,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CascadeType, CatalogSnapshot, EntityDecl, ScalarType};
    use crate::diagnostic::DiagnosticKind;

    fn shop_catalog() -> CatalogSnapshot {
        CatalogSnapshot::new(1)
            .with_entity(
                EntityDecl::new("Order")
                    .with_field(FieldDecl::scalar("id", ScalarType::Uuid))
                    .with_field(
                        FieldDecl::list_of("items", "OrderItem")
                            .owning()
                            .mapped_by("order")
                            .with_cascade(CascadeType::Remove)
                            .with_orphan_removal(),
                    )
                    .with_field(FieldDecl::reference("shipping", "Address")),
            )
            .with_entity(
                EntityDecl::new("OrderItem").with_field(FieldDecl::reference("order", "Order")),
            )
            .with_entity(EntityDecl::embeddable("Address"))
            .with_entity(EntityDecl::mapped_superclass("Base"))
    }

    fn classify(catalog: &CatalogSnapshot, owner: &str, field: &FieldDecl) -> Result<Classification, Diagnostic> {
        FieldClassifier::new(catalog, 16).classify(owner, field)
    }

    fn expect_relation(classification: Classification) -> FieldRelation {
        match classification {
            Classification::Relation(relation) => relation,
            Classification::NotRelation => panic!("Expected a relation field"),
        }
    }

    #[test]
    fn test_scalar_is_not_relation() {
        let catalog = shop_catalog();
        let field = FieldDecl::scalar("id", ScalarType::Uuid);
        assert_eq!(classify(&catalog, "Order", &field), Ok(Classification::NotRelation));
    }

    #[test]
    fn test_embeddable_is_not_relation() {
        let catalog = shop_catalog();
        let field = FieldDecl::reference("shipping", "Address");
        assert_eq!(classify(&catalog, "Order", &field), Ok(Classification::NotRelation));
    }

    #[test]
    fn test_collection_defaults_to_many() {
        let catalog = shop_catalog();
        let order = catalog.get_entity("Order").unwrap();
        let items = order.get_field("items").unwrap();

        let relation = expect_relation(classify(&catalog, "Order", items).unwrap());
        assert_eq!(relation.multiplicity, Multiplicity::Many);
        assert_eq!(relation.declared, None);
        assert_eq!(relation.ownership, Ownership::Declared(Side::Owning));
        assert_eq!(relation.mapped_by.as_deref(), Some("order"));
        assert_eq!(relation.field, FieldRef::new("Order", "items"));
        assert_eq!(relation.target, "OrderItem");
        assert!(relation.orphan_removal);
    }

    #[test]
    fn test_implied_ownership() {
        let catalog = shop_catalog();

        let plain = FieldDecl::reference("order", "Order");
        let relation = expect_relation(classify(&catalog, "OrderItem", &plain).unwrap());
        assert_eq!(relation.ownership, Ownership::Implied(Side::Owning));
        assert_eq!(relation.multiplicity, Multiplicity::One);

        let mirrored = FieldDecl::list_of("items", "OrderItem").mapped_by("order");
        let relation = expect_relation(classify(&catalog, "Order", &mirrored).unwrap());
        assert_eq!(relation.ownership, Ownership::Implied(Side::Inverse));
    }

    #[test]
    fn test_missing_mirror_is_broken_reference() {
        let catalog = shop_catalog();
        let field = FieldDecl::reference("order", "Order").mapped_by("missingField");

        let err = classify(&catalog, "OrderItem", &field).unwrap_err();
        assert_eq!(
            err,
            Diagnostic::BrokenMirrorReference {
                field: FieldRef::new("OrderItem", "order"),
                target: "Order".into(),
                mirror: "missingField".into(),
                fault: MirrorFault::Missing,
            }
        );
    }

    #[test]
    fn test_declared_cardinality_must_match_shape() {
        let catalog = shop_catalog();
        let field = FieldDecl::reference("order", "Order").with_cardinality(Cardinality::OneToMany);

        let err = classify(&catalog, "OrderItem", &field).unwrap_err();
        assert_eq!(err.kind(), DiagnosticKind::CardinalityMismatch);
        assert_eq!(
            err.to_string(),
            "OrderItem.order: cardinality mismatch: declared one-to-many on a single-valued field"
        );
    }

    #[test]
    fn test_unknown_target() {
        let catalog = shop_catalog();

        let unmarked = FieldDecl::reference("customer", "Customer");
        assert_eq!(classify(&catalog, "Order", &unmarked), Ok(Classification::NotRelation));

        let marked = FieldDecl::reference("customer", "Customer").with_cardinality(Cardinality::ManyToOne);
        let err = classify(&catalog, "Order", &marked).unwrap_err();
        assert_eq!(err.kind(), DiagnosticKind::UnknownType);
        assert!(err.is_lookup_error());
    }

    #[test]
    fn test_marked_reference_to_mapped_superclass() {
        let catalog = shop_catalog();

        let unmarked = FieldDecl::reference("base", "Base");
        assert_eq!(classify(&catalog, "Order", &unmarked), Ok(Classification::NotRelation));

        let marked = FieldDecl::reference("base", "Base").with_cardinality(Cardinality::ManyToOne);
        let err = classify(&catalog, "Order", &marked).unwrap_err();
        assert_eq!(err.kind(), DiagnosticKind::NonEntityTarget);
    }
}
