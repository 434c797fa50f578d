//! Entity declarations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::field::FieldDecl;
use super::types::TypeId;

/// A declared type in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDecl {
    /// Type name (unique within the catalog).
    pub name: TypeId,
    /// Declaration kind, fixed at load time.
    #[serde(default)]
    pub kind: DeclKind,
    /// Declared fields, in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Supertype, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supertype: Option<TypeId>,
    /// Capability markers.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub capabilities: BTreeSet<Capability>,
}

/// Kind of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    /// Persistent entity with its own identity.
    #[default]
    Entity,
    /// Value object stored inside its owner.
    Embeddable,
    /// Non-persistent supertype contributing fields to entities.
    MappedSuperclass,
}

/// Capability markers implemented by a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Has an identifier.
    Identifiable,
    /// Serializable.
    Serializable,
    /// Carries audit fields.
    Auditable,
    /// Cannot be instantiated.
    Abstract,
}

impl EntityDecl {
    /// Create an entity declaration.
    pub fn new(name: impl Into<TypeId>) -> Self {
        Self::with_kind(name, DeclKind::Entity)
    }

    /// Create an embeddable declaration.
    pub fn embeddable(name: impl Into<TypeId>) -> Self {
        Self::with_kind(name, DeclKind::Embeddable)
    }

    /// Create a mapped superclass declaration.
    pub fn mapped_superclass(name: impl Into<TypeId>) -> Self {
        Self::with_kind(name, DeclKind::MappedSuperclass)
    }

    fn with_kind(name: impl Into<TypeId>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
            supertype: None,
            capabilities: BTreeSet::new(),
        }
    }

    /// Add a field.
    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the supertype.
    pub fn extends(mut self, supertype: impl Into<TypeId>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    /// Add a capability marker.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Get a declared field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check if this is a persistent entity.
    pub fn is_entity(&self) -> bool {
        self.kind == DeclKind::Entity
    }

    /// Check for a capability marker.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScalarType;

    #[test]
    fn test_entity_builder() {
        let entity = EntityDecl::new("Order")
            .with_field(FieldDecl::scalar("id", ScalarType::Uuid))
            .with_field(FieldDecl::list_of("items", "OrderItem"))
            .extends("BaseEntity")
            .with_capability(Capability::Identifiable);

        assert_eq!(entity.name, "Order");
        assert_eq!(entity.fields.len(), 2);
        assert_eq!(entity.supertype.as_deref(), Some("BaseEntity"));
        assert!(entity.is_entity());
        assert!(entity.has_capability(Capability::Identifiable));
        assert!(!entity.has_capability(Capability::Abstract));
    }

    #[test]
    fn test_get_field() {
        let entity = EntityDecl::new("Order")
            .with_field(FieldDecl::scalar("id", ScalarType::Uuid))
            .with_field(FieldDecl::reference("customer", "Customer"));

        assert!(entity.get_field("customer").is_some());
        assert!(entity.get_field("nonexistent").is_none());
    }

    #[test]
    fn test_declaration_kinds() {
        assert_eq!(EntityDecl::embeddable("Address").kind, DeclKind::Embeddable);
        assert!(!EntityDecl::mapped_superclass("Base").is_entity());

        let parsed: EntityDecl = serde_json::from_str(r#"{"name": "Tag"}"#).unwrap();
        assert_eq!(parsed.kind, DeclKind::Entity);
        assert!(parsed.fields.is_empty());
    }
}
