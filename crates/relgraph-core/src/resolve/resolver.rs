//! Relation graph resolver.
//!
//! For one entity, enumerates its relation fields in declaration order,
//! pairs each with its mirror on the target type and merges both sides into
//! a canonical [`RelationInfo`].

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::catalog::{
    Cardinality, CascadeType, EntityDecl, FieldDecl, FieldRef, Multiplicity, Relation,
    RelationInfo, Side, TypeCatalog, TypeId,
};
use crate::config::ResolverConfig;
use crate::diagnostic::{Diagnostic, DiagnosticKind, MirrorFault};

use super::classifier::{Classification, FieldClassifier, FieldRelation, Ownership};
use super::hierarchy::Hierarchy;

/// Every relation an entity participates in, plus what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The resolved entity.
    pub entity: TypeId,
    /// Catalog generation the resolution was computed against.
    pub generation: u64,
    /// Resolved relations, in field-declaration order.
    pub relations: Vec<Relation>,
    /// Diagnostics attached to the entity.
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    /// Relations in which the entity is the child part.
    pub fn child_part_relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter().filter(|r| r.is_child_part())
    }

    /// Relations in which the entity is the child part of a composition.
    pub fn composition_parents(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter().filter(|r| r.is_composition_child())
    }

    /// Look up the relation of one of the entity's fields.
    pub fn relation_of(&self, field: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.field.field == field)
    }

    /// Check for a diagnostic of the given kind.
    pub fn has_diagnostic(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind() == kind)
    }

    /// Check if resolution produced no diagnostics.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Resolves the relations of entities against a catalog.
pub struct RelationResolver<'a, C: TypeCatalog + ?Sized> {
    catalog: &'a C,
    config: &'a ResolverConfig,
    classifier: FieldClassifier<'a, C>,
    hierarchy: Hierarchy<'a, C>,
}

impl<'a, C: TypeCatalog + ?Sized> RelationResolver<'a, C> {
    /// Create a resolver over a catalog snapshot.
    pub fn new(catalog: &'a C, config: &'a ResolverConfig) -> Self {
        Self {
            catalog,
            config,
            classifier: FieldClassifier::new(catalog, config.max_supertype_depth),
            hierarchy: Hierarchy::new(catalog, config.max_supertype_depth),
        }
    }

    /// Resolve every relation of `decl`.
    ///
    /// Failures are recorded per field; the remaining fields still resolve.
    #[instrument(skip(self, decl), fields(entity = %decl.name, generation = self.catalog.generation()))]
    pub fn resolve(&self, decl: &EntityDecl) -> Resolution {
        let mut relations = Vec::new();
        let mut diagnostics = Vec::new();

        let fields = if self.config.include_inherited_fields {
            let (fields, diagnostic) = self.hierarchy.lineage_fields(decl);
            diagnostics.extend(diagnostic);
            fields
        } else {
            decl.fields.iter().map(|field| (decl, field)).collect()
        };

        for (owner, field) in fields {
            match self.resolve_field(&owner.name, field) {
                Ok(Some((relation, shape_diagnostics))) => {
                    debug!(
                        field = %relation.field,
                        owner = %relation.info.owner,
                        cardinality = %relation.info.cardinality,
                        composition = relation.info.composition,
                        "resolved relation"
                    );
                    diagnostics.extend(shape_diagnostics);
                    relations.push(relation);
                }
                Ok(None) => {}
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }

        let parents: Vec<FieldRef> = relations
            .iter()
            .filter(|r| r.is_composition_child())
            .map(|r| r.field.clone())
            .collect();
        if parents.len() > 1 {
            diagnostics.push(Diagnostic::MultipleCompositionParents {
                entity: decl.name.clone(),
                relations: parents,
            });
        }

        for diagnostic in &diagnostics {
            warn!(kind = %diagnostic.kind(), "{diagnostic}");
        }

        Resolution {
            entity: decl.name.clone(),
            generation: self.catalog.generation(),
            relations,
            diagnostics,
        }
    }

    /// Resolve one field into a relation.
    ///
    /// Returns the relation together with its non-fatal shape diagnostics,
    /// or the diagnostic that prevented the relation from being built.
    fn resolve_field(
        &self,
        owner: &str,
        field: &FieldDecl,
    ) -> Result<Option<(Relation, Vec<Diagnostic>)>, Diagnostic> {
        let this = match self.classifier.classify(owner, field)? {
            Classification::NotRelation => return Ok(None),
            Classification::Relation(relation) => relation,
        };

        let mirror = self.find_mirror(&this)?;
        let field_ref = this.field.clone();
        let (info, shape) = match mirror {
            Some(mirror) => self.merge(this, mirror)?,
            None => self.unidirectional(this)?,
        };

        Ok(Some((
            Relation {
                field: field_ref,
                info,
            },
            shape,
        )))
    }

    /// Pair a relation field with its mirror on the target type.
    fn find_mirror(&self, this: &FieldRelation) -> Result<Option<FieldRelation>, Diagnostic> {
        match &this.mapped_by {
            Some(name) => self.declared_mirror(this, name).map(Some),
            None => self.claiming_mirror(this),
        }
    }

    /// Follow an explicit mirror marker.
    fn declared_mirror(&self, this: &FieldRelation, name: &str) -> Result<FieldRelation, Diagnostic> {
        let broken = |fault| Diagnostic::BrokenMirrorReference {
            field: this.field.clone(),
            target: this.target.clone(),
            mirror: name.to_string(),
            fault,
        };

        let (mirror_owner, mirror_field) = self
            .hierarchy
            .find_field(&this.target, name)
            .ok_or_else(|| broken(MirrorFault::Missing))?;

        let mirror = match self.classifier.classify(&mirror_owner.name, mirror_field) {
            Ok(Classification::Relation(mirror)) => mirror,
            Ok(Classification::NotRelation) => return Err(broken(MirrorFault::NotARelation)),
            Err(cause) => {
                return Err(broken(MirrorFault::Invalid {
                    cause: Box::new(cause),
                }));
            }
        };

        if !self.hierarchy.is_assignable(&mirror.target, &this.field.entity) {
            return Err(broken(MirrorFault::WrongTarget {
                points_to: mirror.target.clone(),
            }));
        }

        match &mirror.mapped_by {
            Some(back) if back != &this.field.field => {
                Err(broken(MirrorFault::WrongBackReference {
                    names: back.clone(),
                }))
            }
            Some(_) => Ok(mirror),
            None => {
                // The mirror names nobody, so every field claiming it competes.
                let claimants = self.claimants(&mirror.target, name, &mirror.field.entity);
                if claimants.len() > 1 {
                    return Err(Diagnostic::AmbiguousMirror {
                        field: this.field.clone(),
                        candidates: claimants,
                    });
                }
                Ok(mirror)
            }
        }
    }

    /// Search the target type for a field naming `this` as its mirror.
    fn claiming_mirror(&self, this: &FieldRelation) -> Result<Option<FieldRelation>, Diagnostic> {
        let mut claimants = self.claimants(&this.target, &this.field.field, &this.field.entity);

        match claimants.len() {
            0 => Ok(None),
            1 => {
                let claimant = claimants.remove(0);
                debug!(field = %this.field, mirror = %claimant, "paired by mirror marker");
                let (owner, field) = self
                    .hierarchy
                    .find_field(&claimant.entity, &claimant.field)
                    .ok_or_else(|| Diagnostic::BrokenMirrorReference {
                        field: this.field.clone(),
                        target: this.target.clone(),
                        mirror: claimant.field.clone(),
                        fault: MirrorFault::Missing,
                    })?;
                let broken = |fault| Diagnostic::BrokenMirrorReference {
                    field: this.field.clone(),
                    target: this.target.clone(),
                    mirror: claimant.field.clone(),
                    fault,
                };
                match self.classifier.classify(&owner.name, field) {
                    Ok(Classification::Relation(mirror)) => Ok(Some(mirror)),
                    Ok(Classification::NotRelation) => Err(broken(MirrorFault::NotARelation)),
                    Err(cause) => Err(broken(MirrorFault::Invalid {
                        cause: Box::new(cause),
                    })),
                }
            }
            _ => Err(Diagnostic::AmbiguousMirror {
                field: this.field.clone(),
                candidates: claimants,
            }),
        }
    }

    /// Fields visible on `on_type` that name `field_name` as their mirror and
    /// whose target can hold a field declared on `declaring`.
    fn claimants(&self, on_type: &str, field_name: &str, declaring: &str) -> Vec<FieldRef> {
        let mut claimants: Vec<FieldRef> = self
            .hierarchy
            .fields_of(on_type)
            .into_iter()
            .filter(|(_, field)| field.markers.mapped_by.as_deref() == Some(field_name))
            .filter(|(_, field)| {
                field
                    .value_type
                    .referenced_type()
                    .is_some_and(|target| self.hierarchy.is_assignable(target, declaring))
            })
            .map(|(owner, field)| FieldRef::new(&owner.name, &field.name))
            .collect();
        claimants.sort();
        claimants
    }

    /// Build a relation declared on one side only.
    fn unidirectional(
        &self,
        this: FieldRelation,
    ) -> Result<(RelationInfo, Vec<Diagnostic>), Diagnostic> {
        if this.ownership == Ownership::Declared(Side::Inverse) {
            return Err(Diagnostic::OwnershipConflict {
                field: this.field,
                mirror: None,
                detail: "declared inverse but no field mirrors it".to_string(),
            });
        }

        let cardinality = this.declared.unwrap_or(match this.multiplicity {
            Multiplicity::Many => Cardinality::OneToMany,
            Multiplicity::One => Cardinality::ManyToOne,
        });

        Ok(self.build(this, None, cardinality))
    }

    /// Merge both sides of a bidirectional relation.
    fn merge(
        &self,
        this: FieldRelation,
        mirror: FieldRelation,
    ) -> Result<(RelationInfo, Vec<Diagnostic>), Diagnostic> {
        let cardinality = Cardinality::from_multiplicities(this.multiplicity, mirror.multiplicity);
        let mismatch = |detail: String| Diagnostic::CardinalityMismatch {
            field: this.field.clone(),
            mirror: Some(mirror.field.clone()),
            detail,
        };

        if let Some(declared) = this.declared {
            if declared != cardinality {
                return Err(mismatch(format!(
                    "declared {declared} but the pair forms {cardinality}"
                )));
            }
        }
        if let Some(declared) = mirror.declared {
            if declared != cardinality.inverse() {
                return Err(mismatch(format!(
                    "mirror {} declares {declared} but the pair forms {}",
                    mirror.field,
                    cardinality.inverse()
                )));
            }
        }
        if cardinality == Cardinality::ManyToMany
            && this.declared.is_none()
            && mirror.declared.is_none()
        {
            return Err(mismatch(
                "both sides are collections but neither declares many-to-many".to_string(),
            ));
        }

        let this_owns = match (this.ownership, mirror.ownership) {
            (Ownership::Declared(a), Ownership::Declared(b)) if a == b => {
                return Err(Diagnostic::OwnershipConflict {
                    field: this.field.clone(),
                    mirror: Some(mirror.field.clone()),
                    detail: format!("both sides declared {a}"),
                });
            }
            (Ownership::Declared(a), _) => a == Side::Owning,
            (_, Ownership::Declared(b)) => b == Side::Inverse,
            (Ownership::Implied(a), Ownership::Implied(b)) if a == b => {
                return Err(Diagnostic::OwnershipConflict {
                    field: this.field.clone(),
                    mirror: Some(mirror.field.clone()),
                    detail: "both sides name each other as mirror and neither declares a side"
                        .to_string(),
                });
            }
            (Ownership::Implied(a), Ownership::Implied(_)) => a == Side::Owning,
        };

        let (owner, inverse, cardinality) = if this_owns {
            (this, mirror, cardinality)
        } else {
            (mirror, this, cardinality.inverse())
        };

        // Lifecycle markers only count on the owning side.
        let ignored = (inverse.cascade.cascades(CascadeType::Remove) || inverse.orphan_removal)
            .then(|| Diagnostic::InverseSideCascade {
                field: inverse.field.clone(),
                owner: owner.field.clone(),
            });

        let (info, mut diagnostics) = self.build(owner, Some(inverse.field), cardinality);
        diagnostics.extend(ignored);
        Ok((info, diagnostics))
    }

    /// Assemble the canonical record from the owning side and derive the
    /// composition flag from its cascade markers.
    fn build(
        &self,
        owner: FieldRelation,
        mirror: Option<FieldRef>,
        cardinality: Cardinality,
    ) -> (RelationInfo, Vec<Diagnostic>) {
        let removes = owner.cascade.cascades(CascadeType::Remove);
        let all = self.config.cascade_all_is_composition && owner.cascade.is_all();
        let suggests_composition = removes && (owner.orphan_removal || all);
        let shape_allows = matches!(cardinality, Cardinality::OneToOne | Cardinality::OneToMany);

        let mut shape = Vec::new();
        if suggests_composition && !shape_allows {
            shape.push(Diagnostic::InvalidCompositionShape {
                field: owner.field.clone(),
                cardinality,
            });
        }

        let info = RelationInfo {
            owner: owner.field,
            target: owner.target,
            mirror,
            cardinality,
            cascade: owner.cascade,
            orphan_removal: owner.orphan_removal,
            composition: suggests_composition && shape_allows,
        };
        (info, shape)
    }
}
