//! Value type definitions for declared fields.

use serde::{Deserialize, Serialize};

/// Logical identifier of a declared type (its entity name).
pub type TypeId = String;

/// Scalar data types a field may hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// Fixed-precision decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Number of digits after decimal point.
        scale: u8,
    },
    /// UTF-8 string.
    String,
    /// Binary data.
    Bytes,
    /// Timestamp.
    Timestamp,
    /// UUID (128-bit identifier).
    Uuid,
    /// Named enumeration.
    Enum {
        /// Name of the enum type.
        name: String,
    },
}

/// Collection flavour of a many-valued field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Ordered, duplicates allowed.
    #[default]
    List,
    /// Unordered, unique elements.
    Set,
}

/// Declared value type of a field.
///
/// Only `Reference` and `Collection` can encode a relation; whether they do
/// depends on what the referenced type resolves to in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueType {
    /// A single scalar value.
    Scalar {
        /// The scalar type.
        scalar: ScalarType,
    },
    /// A collection of scalar values.
    ScalarCollection {
        /// The element scalar type.
        scalar: ScalarType,
        /// Collection flavour.
        #[serde(default)]
        collection: CollectionKind,
    },
    /// A single reference to another declared type.
    Reference {
        /// Referenced type.
        target: TypeId,
    },
    /// A collection of references to another declared type.
    Collection {
        /// Element type.
        element: TypeId,
        /// Collection flavour.
        #[serde(default)]
        collection: CollectionKind,
    },
}

impl ValueType {
    /// Create a scalar value type.
    pub fn scalar(scalar: ScalarType) -> Self {
        ValueType::Scalar { scalar }
    }

    /// Create a single reference to another type.
    pub fn reference(target: impl Into<TypeId>) -> Self {
        ValueType::Reference {
            target: target.into(),
        }
    }

    /// Create a list of references to another type.
    pub fn list_of(element: impl Into<TypeId>) -> Self {
        ValueType::Collection {
            element: element.into(),
            collection: CollectionKind::List,
        }
    }

    /// Create a set of references to another type.
    pub fn set_of(element: impl Into<TypeId>) -> Self {
        ValueType::Collection {
            element: element.into(),
            collection: CollectionKind::Set,
        }
    }

    /// The referenced type, for single references and collections of references.
    pub fn referenced_type(&self) -> Option<&str> {
        match self {
            ValueType::Reference { target } => Some(target),
            ValueType::Collection { element, .. } => Some(element),
            ValueType::Scalar { .. } | ValueType::ScalarCollection { .. } => None,
        }
    }

    /// Check if this type is many-valued.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            ValueType::Collection { .. } | ValueType::ScalarCollection { .. }
        )
    }
}
