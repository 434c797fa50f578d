//! Catalog snapshot - an immutable, versioned set of declarations.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::catalog::TypeCatalog;
use super::entity::EntityDecl;
use super::types::TypeId;
use crate::error::Error;

/// An in-memory catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogSnapshot {
    /// Generation token (changes on every reload).
    pub generation: u64,
    /// Declarations keyed by type name.
    pub declarations: BTreeMap<TypeId, EntityDecl>,
}

/// Serialized form of a catalog, as handed over by the metadata provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Generation token.
    #[serde(default)]
    pub generation: u64,
    /// Declarations, in provider order.
    #[serde(default)]
    pub entities: Vec<EntityDecl>,
}

impl CatalogSnapshot {
    /// Create an empty snapshot.
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            declarations: BTreeMap::new(),
        }
    }

    /// Add a declaration, replacing any previous one with the same name.
    pub fn with_entity(mut self, entity: EntityDecl) -> Self {
        self.declarations.insert(entity.name.clone(), entity);
        self
    }

    /// Get a declaration by name.
    pub fn get_entity(&self, name: &str) -> Option<&EntityDecl> {
        self.declarations.get(name)
    }

    /// Copy of this snapshot under the next generation.
    pub fn next_generation(&self) -> Self {
        Self {
            generation: self.generation + 1,
            declarations: self.declarations.clone(),
        }
    }

    /// Build a snapshot from a document.
    ///
    /// Rejects duplicate type names and duplicate field names within a type.
    pub fn from_document(document: CatalogDocument) -> Result<Self, Error> {
        let mut declarations = BTreeMap::new();

        for entity in document.entities {
            let mut seen = HashSet::new();
            for field in &entity.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(Error::InvalidCatalog(format!(
                        "duplicate field {}.{}",
                        entity.name, field.name
                    )));
                }
            }

            if declarations.contains_key(&entity.name) {
                return Err(Error::InvalidCatalog(format!(
                    "duplicate type {}",
                    entity.name
                )));
            }
            declarations.insert(entity.name.clone(), entity);
        }

        Ok(Self {
            generation: document.generation,
            declarations,
        })
    }

    /// Parse a snapshot from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Convert back into a document.
    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            generation: self.generation,
            entities: self.declarations.values().cloned().collect(),
        }
    }

    /// Serialize to a JSON document.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }
}

impl TypeCatalog for CatalogSnapshot {
    fn declaration_of(&self, id: &str) -> Option<&EntityDecl> {
        self.declarations.get(id)
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn type_ids(&self) -> Vec<TypeId> {
        self.declarations.keys().cloned().collect()
    }
}
