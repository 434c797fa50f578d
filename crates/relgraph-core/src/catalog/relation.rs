//! Relation markers and derived relation records.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::TypeId;

/// Cardinality of a relation, read from the perspective of one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// One instance on each side.
    OneToOne,
    /// This side holds many instances of the other.
    OneToMany,
    /// Many instances of this side share one of the other.
    ManyToOne,
    /// Many instances on each side.
    ManyToMany,
}

/// How many target instances a single field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    /// Single-valued.
    One,
    /// Collection-valued.
    Many,
}

/// Which side of a relation a field sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Authoritative side for persistence writes and cascades.
    Owning,
    /// Mirror side.
    Inverse,
}

/// Cascade operations declared on a relation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeType {
    /// Cascade persist.
    Persist,
    /// Cascade merge.
    Merge,
    /// Cascade remove.
    Remove,
    /// Cascade refresh.
    Refresh,
    /// Cascade detach.
    Detach,
    /// Every cascade operation.
    All,
}

/// Ordered set of cascade operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CascadeSet(BTreeSet<CascadeType>);

impl Cardinality {
    /// The same cardinality seen from the other side.
    pub fn inverse(self) -> Self {
        match self {
            Cardinality::OneToOne => Cardinality::OneToOne,
            Cardinality::OneToMany => Cardinality::ManyToOne,
            Cardinality::ManyToOne => Cardinality::OneToMany,
            Cardinality::ManyToMany => Cardinality::ManyToMany,
        }
    }

    /// Multiplicity of the field that declares this cardinality.
    pub fn field_multiplicity(self) -> Multiplicity {
        match self {
            Cardinality::OneToMany | Cardinality::ManyToMany => Multiplicity::Many,
            Cardinality::OneToOne | Cardinality::ManyToOne => Multiplicity::One,
        }
    }

    /// Cardinality implied by the multiplicities of a field and its mirror.
    pub fn from_multiplicities(this: Multiplicity, mirror: Multiplicity) -> Self {
        match (this, mirror) {
            (Multiplicity::One, Multiplicity::One) => Cardinality::OneToOne,
            (Multiplicity::Many, Multiplicity::One) => Cardinality::OneToMany,
            (Multiplicity::One, Multiplicity::Many) => Cardinality::ManyToOne,
            (Multiplicity::Many, Multiplicity::Many) => Cardinality::ManyToMany,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::OneToOne => write!(f, "one-to-one"),
            Cardinality::OneToMany => write!(f, "one-to-many"),
            Cardinality::ManyToOne => write!(f, "many-to-one"),
            Cardinality::ManyToMany => write!(f, "many-to-many"),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Owning => write!(f, "owning"),
            Side::Inverse => write!(f, "inverse"),
        }
    }
}

impl CascadeSet {
    /// Create an empty cascade set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cascade set holding only `All`.
    pub fn all() -> Self {
        [CascadeType::All].into_iter().collect()
    }

    /// Add a cascade operation.
    pub fn with(mut self, cascade: CascadeType) -> Self {
        self.0.insert(cascade);
        self
    }

    /// Check if an operation is cascaded, either explicitly or through `All`.
    pub fn cascades(&self, cascade: CascadeType) -> bool {
        self.0.contains(&cascade) || self.0.contains(&CascadeType::All)
    }

    /// Check if `All` was declared.
    pub fn is_all(&self) -> bool {
        self.0.contains(&CascadeType::All)
    }

    /// Check if no cascade was declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the declared operations in order.
    pub fn iter(&self) -> impl Iterator<Item = CascadeType> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<CascadeType> for CascadeSet {
    fn from_iter<I: IntoIterator<Item = CascadeType>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Reference to a field: the declaring entity and the field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldRef {
    /// Declaring entity.
    pub entity: TypeId,
    /// Field name.
    pub field: String,
}

impl FieldRef {
    /// Create a field reference.
    pub fn new(entity: impl Into<TypeId>, field: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.field)
    }
}

/// A fully resolved relation.
///
/// The record is canonical: it is expressed from the owning side, so the same
/// relation resolved from either of its fields compares equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationInfo {
    /// The owning field.
    pub owner: FieldRef,
    /// Type referenced by the owning field.
    pub target: TypeId,
    /// The mirror field, for bidirectional relations.
    pub mirror: Option<FieldRef>,
    /// Cardinality seen from the owning side.
    pub cardinality: Cardinality,
    /// Cascade operations declared on the owning side.
    pub cascade: CascadeSet,
    /// Orphan removal declared on the owning side.
    pub orphan_removal: bool,
    /// Whether the child's lifecycle is bound to the parent.
    pub composition: bool,
}

impl RelationInfo {
    /// The side holding the child part, if the relation has one.
    ///
    /// Many-to-many relations have no child part.
    pub fn child_side(&self) -> Option<Side> {
        match self.cardinality {
            Cardinality::OneToOne | Cardinality::OneToMany => Some(Side::Inverse),
            Cardinality::ManyToOne => Some(Side::Owning),
            Cardinality::ManyToMany => None,
        }
    }

    /// The field declared on the child part, if there is one.
    pub fn child_field(&self) -> Option<&FieldRef> {
        match self.child_side()? {
            Side::Owning => Some(&self.owner),
            Side::Inverse => self.mirror.as_ref(),
        }
    }

    /// The field declared on the parent part, if there is one.
    pub fn parent_field(&self) -> Option<&FieldRef> {
        match self.child_side()? {
            Side::Owning => self.mirror.as_ref(),
            Side::Inverse => Some(&self.owner),
        }
    }
}

/// A relation as seen from one of the resolved entity's own fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// The resolved entity's field.
    pub field: FieldRef,
    /// The relation it participates in.
    pub info: RelationInfo,
}

impl Relation {
    /// Side of the relation the field sits on.
    pub fn side(&self) -> Side {
        if self.info.owner == self.field {
            Side::Owning
        } else {
            Side::Inverse
        }
    }

    /// Cardinality seen from the field.
    pub fn cardinality(&self) -> Cardinality {
        match self.side() {
            Side::Owning => self.info.cardinality,
            Side::Inverse => self.info.cardinality.inverse(),
        }
    }

    /// Check if the field sits on the child part.
    pub fn is_child_part(&self) -> bool {
        self.info.child_field() == Some(&self.field)
    }

    /// Check if the field is the child part of a composition.
    pub fn is_composition_child(&self) -> bool {
        self.info.composition && self.is_child_part()
    }
}
