//! Field declarations for entities.

use serde::{Deserialize, Serialize};

use super::relation::{Cardinality, CascadeSet, CascadeType, Side};
use super::types::{ScalarType, TypeId, ValueType};

/// A field declared on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Field name.
    pub name: String,
    /// Declared value type.
    pub value_type: ValueType,
    /// Relation markers.
    #[serde(default, skip_serializing_if = "RelationMarkers::is_empty")]
    pub markers: RelationMarkers,
}

/// Structural markers describing a relation field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationMarkers {
    /// Declared cardinality, from this field's side.
    pub cardinality: Option<Cardinality>,
    /// Declared ownership side.
    pub side: Option<Side>,
    /// Name of the mirror field on the target type.
    pub mapped_by: Option<String>,
    /// Cascade operations.
    pub cascade: CascadeSet,
    /// Whether orphaned children are removed.
    pub orphan_removal: bool,
}

impl RelationMarkers {
    /// Check if no marker was declared.
    pub fn is_empty(&self) -> bool {
        self.cardinality.is_none()
            && self.side.is_none()
            && self.mapped_by.is_none()
            && self.cascade.is_empty()
            && !self.orphan_removal
    }
}

impl FieldDecl {
    /// Create a field with no relation markers.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            markers: RelationMarkers::default(),
        }
    }

    /// Create a scalar field.
    pub fn scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, ValueType::scalar(scalar))
    }

    /// Create a single reference field.
    pub fn reference(name: impl Into<String>, target: impl Into<TypeId>) -> Self {
        Self::new(name, ValueType::reference(target))
    }

    /// Create a list field of references.
    pub fn list_of(name: impl Into<String>, element: impl Into<TypeId>) -> Self {
        Self::new(name, ValueType::list_of(element))
    }

    /// Create a set field of references.
    pub fn set_of(name: impl Into<String>, element: impl Into<TypeId>) -> Self {
        Self::new(name, ValueType::set_of(element))
    }

    /// Declare the cardinality.
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.markers.cardinality = Some(cardinality);
        self
    }

    /// Declare the ownership side.
    pub fn with_side(mut self, side: Side) -> Self {
        self.markers.side = Some(side);
        self
    }

    /// Declare this field as the owning side.
    pub fn owning(self) -> Self {
        self.with_side(Side::Owning)
    }

    /// Name the mirror field on the target type.
    pub fn mapped_by(mut self, mirror: impl Into<String>) -> Self {
        self.markers.mapped_by = Some(mirror.into());
        self
    }

    /// Add a cascade operation.
    pub fn with_cascade(mut self, cascade: CascadeType) -> Self {
        self.markers.cascade = self.markers.cascade.with(cascade);
        self
    }

    /// Enable orphan removal.
    pub fn with_orphan_removal(mut self) -> Self {
        self.markers.orphan_removal = true;
        self
    }

    /// Check if any relation marker was declared.
    pub fn has_relation_markers(&self) -> bool {
        !self.markers.is_empty()
    }
}
