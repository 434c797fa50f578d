//! Per-entity resolution diagnostics.
//!
//! Diagnostics are attached to the entity being resolved. They never abort
//! resolution of other fields or other entities.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{Cardinality, DeclKind, FieldRef, TypeId};

/// A violated relation invariant, found while resolving one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Error)]
#[serde(tag = "diagnostic", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The declared mirror field cannot be paired with this field.
    #[error("{field}: mirror {target}.{mirror} {fault}")]
    BrokenMirrorReference {
        /// The field declaring or expecting the mirror.
        field: FieldRef,
        /// Type the mirror was looked up on.
        target: TypeId,
        /// Mirror field name.
        mirror: String,
        /// What is wrong with it.
        fault: MirrorFault,
    },

    /// The two sides, or a field and its value shape, disagree on cardinality.
    #[error("{field}: cardinality mismatch: {detail}")]
    CardinalityMismatch {
        /// The offending field.
        field: FieldRef,
        /// The mirror field, if the mismatch is between two sides.
        mirror: Option<FieldRef>,
        /// What disagrees.
        detail: String,
    },

    /// The entity is the child part of more than one composition.
    #[error("{entity} is the child part of more than one composition: {}", join_refs(.relations))]
    MultipleCompositionParents {
        /// The child entity.
        entity: TypeId,
        /// The entity's fields on each composition.
        relations: Vec<FieldRef>,
    },

    /// Cascade markers imply composition on a relation that cannot be one.
    #[error("{field}: remove/orphan-removal cascade on a {cardinality} relation cannot form a composition")]
    InvalidCompositionShape {
        /// The owning field carrying the cascade markers.
        field: FieldRef,
        /// Cardinality seen from the owning field.
        cardinality: Cardinality,
    },

    /// Remove or orphan-removal markers sit on the inverse side, where they
    /// have no effect on the relation.
    #[error("{field}: remove/orphan-removal cascade on the inverse side is ignored, declare it on {owner}")]
    InverseSideCascade {
        /// The inverse field carrying the markers.
        field: FieldRef,
        /// The owning field of the relation.
        owner: FieldRef,
    },

    /// The relation does not have exactly one owning side.
    #[error("{field}: ownership conflict: {detail}")]
    OwnershipConflict {
        /// The offending field.
        field: FieldRef,
        /// The mirror field, if any.
        mirror: Option<FieldRef>,
        /// What conflicts.
        detail: String,
    },

    /// More than one field could be this field's mirror.
    #[error("{field}: ambiguous mirror, candidates: {}", join_refs(.candidates))]
    AmbiguousMirror {
        /// The field being paired.
        field: FieldRef,
        /// Competing fields.
        candidates: Vec<FieldRef>,
    },

    /// A referenced type is absent from the catalog.
    #[error("{entity}: unknown type {referenced}{}", referenced_by(.field))]
    UnknownType {
        /// Entity holding the reference.
        entity: TypeId,
        /// Field holding the reference (`None` for a supertype reference).
        field: Option<String>,
        /// Missing type.
        referenced: TypeId,
    },

    /// A field with relation markers points at a non-entity declaration.
    #[error("{field}: relation target {target} is {declared_kind:?}, not an entity")]
    NonEntityTarget {
        /// The offending field.
        field: FieldRef,
        /// Target type.
        target: TypeId,
        /// Kind of the target declaration.
        declared_kind: DeclKind,
    },

    /// The supertype chain loops or exceeds the configured depth.
    #[error("{entity}: supertype chain does not terminate: {}", join_chain(.chain))]
    SupertypeCycle {
        /// Entity whose chain was walked.
        entity: TypeId,
        /// Types visited, in order.
        chain: Vec<TypeId>,
    },
}

/// Why a mirror reference is broken.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum MirrorFault {
    /// No field with that name exists on the target.
    Missing,
    /// The field exists but is not a relation field.
    NotARelation,
    /// The field is a relation field but fails resolution itself.
    Invalid {
        /// Why the mirror field does not resolve.
        cause: Box<Diagnostic>,
    },
    /// The mirror points at an unrelated type.
    WrongTarget {
        /// Type the mirror actually references.
        points_to: TypeId,
    },
    /// The mirror names a different field as its own mirror.
    WrongBackReference {
        /// Field named by the mirror.
        names: String,
    },
}

/// Discriminant of a [`Diagnostic`], for matching and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// See [`Diagnostic::BrokenMirrorReference`].
    BrokenMirrorReference,
    /// See [`Diagnostic::CardinalityMismatch`].
    CardinalityMismatch,
    /// See [`Diagnostic::MultipleCompositionParents`].
    MultipleCompositionParents,
    /// See [`Diagnostic::InvalidCompositionShape`].
    InvalidCompositionShape,
    /// See [`Diagnostic::InverseSideCascade`].
    InverseSideCascade,
    /// See [`Diagnostic::OwnershipConflict`].
    OwnershipConflict,
    /// See [`Diagnostic::AmbiguousMirror`].
    AmbiguousMirror,
    /// See [`Diagnostic::UnknownType`].
    UnknownType,
    /// See [`Diagnostic::NonEntityTarget`].
    NonEntityTarget,
    /// See [`Diagnostic::SupertypeCycle`].
    SupertypeCycle,
}

impl Diagnostic {
    /// The diagnostic's discriminant.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::BrokenMirrorReference { .. } => DiagnosticKind::BrokenMirrorReference,
            Diagnostic::CardinalityMismatch { .. } => DiagnosticKind::CardinalityMismatch,
            Diagnostic::MultipleCompositionParents { .. } => {
                DiagnosticKind::MultipleCompositionParents
            }
            Diagnostic::InvalidCompositionShape { .. } => DiagnosticKind::InvalidCompositionShape,
            Diagnostic::InverseSideCascade { .. } => DiagnosticKind::InverseSideCascade,
            Diagnostic::OwnershipConflict { .. } => DiagnosticKind::OwnershipConflict,
            Diagnostic::AmbiguousMirror { .. } => DiagnosticKind::AmbiguousMirror,
            Diagnostic::UnknownType { .. } => DiagnosticKind::UnknownType,
            Diagnostic::NonEntityTarget { .. } => DiagnosticKind::NonEntityTarget,
            Diagnostic::SupertypeCycle { .. } => DiagnosticKind::SupertypeCycle,
        }
    }

    /// The offending field, when the diagnostic concerns a single field.
    pub fn field(&self) -> Option<&FieldRef> {
        match self {
            Diagnostic::BrokenMirrorReference { field, .. }
            | Diagnostic::CardinalityMismatch { field, .. }
            | Diagnostic::InvalidCompositionShape { field, .. }
            | Diagnostic::InverseSideCascade { field, .. }
            | Diagnostic::OwnershipConflict { field, .. }
            | Diagnostic::AmbiguousMirror { field, .. }
            | Diagnostic::NonEntityTarget { field, .. } => Some(field),
            Diagnostic::MultipleCompositionParents { .. }
            | Diagnostic::UnknownType { .. }
            | Diagnostic::SupertypeCycle { .. } => None,
        }
    }

    /// The entity the diagnostic names as offending.
    pub fn entity(&self) -> &str {
        match self {
            Diagnostic::MultipleCompositionParents { entity, .. }
            | Diagnostic::UnknownType { entity, .. }
            | Diagnostic::SupertypeCycle { entity, .. } => entity,
            Diagnostic::BrokenMirrorReference { field, .. }
            | Diagnostic::CardinalityMismatch { field, .. }
            | Diagnostic::InvalidCompositionShape { field, .. }
            | Diagnostic::InverseSideCascade { field, .. }
            | Diagnostic::OwnershipConflict { field, .. }
            | Diagnostic::AmbiguousMirror { field, .. }
            | Diagnostic::NonEntityTarget { field, .. } => &field.entity,
        }
    }

    /// Check if this is a lookup error (something absent from the catalog)
    /// rather than a declaration-shape error.
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Diagnostic::UnknownType { .. }
                | Diagnostic::BrokenMirrorReference {
                    fault: MirrorFault::Missing,
                    ..
                }
        )
    }
}

impl fmt::Display for MirrorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorFault::Missing => write!(f, "does not exist"),
            MirrorFault::NotARelation => write!(f, "is not a relation field"),
            MirrorFault::Invalid { cause } => write!(f, "is invalid ({cause})"),
            MirrorFault::WrongTarget { points_to } => write!(f, "references {points_to}"),
            MirrorFault::WrongBackReference { names } => {
                write!(f, "names {names} as its mirror")
            }
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::BrokenMirrorReference => "BrokenMirrorReference",
            DiagnosticKind::CardinalityMismatch => "CardinalityMismatch",
            DiagnosticKind::MultipleCompositionParents => "MultipleCompositionParents",
            DiagnosticKind::InvalidCompositionShape => "InvalidCompositionShape",
            DiagnosticKind::InverseSideCascade => "InverseSideCascade",
            DiagnosticKind::OwnershipConflict => "OwnershipConflict",
            DiagnosticKind::AmbiguousMirror => "AmbiguousMirror",
            DiagnosticKind::UnknownType => "UnknownType",
            DiagnosticKind::NonEntityTarget => "NonEntityTarget",
            DiagnosticKind::SupertypeCycle => "SupertypeCycle",
        };
        f.write_str(name)
    }
}

fn referenced_by(field: &Option<String>) -> String {
    match field {
        Some(name) => format!(" referenced by field {name}"),
        None => String::new(),
    }
}

fn join_chain(chain: &[TypeId]) -> String {
    chain.join(" -> ")
}

fn join_refs(refs: &[FieldRef]) -> String {
    refs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
