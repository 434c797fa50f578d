//! Composition query service.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{EntityDecl, Relation, TypeCatalog, TypeId};
use crate::config::ResolverConfig;
use crate::diagnostic::Diagnostic;
use crate::error::Error;
use crate::resolve::{RelationResolver, Resolution};

use super::cache::{CacheStats, ResolutionCache};

/// How a query identifies its entity.
///
/// Both forms answer identically. A declaration that differs from the one the
/// catalog holds under its name is resolved as given and never memoized.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    /// Look the entity up by type name.
    Name(&'a str),
    /// Use a declaration the caller already holds.
    Declaration(&'a EntityDecl),
}

impl<'a> EntityRef<'a> {
    /// Type name of the entity.
    pub fn name(&self) -> &'a str {
        match self {
            EntityRef::Name(name) => name,
            EntityRef::Declaration(decl) => &decl.name,
        }
    }
}

impl<'a> From<&'a str> for EntityRef<'a> {
    fn from(name: &'a str) -> Self {
        EntityRef::Name(name)
    }
}

impl<'a> From<&'a String> for EntityRef<'a> {
    fn from(name: &'a String) -> Self {
        EntityRef::Name(name)
    }
}

impl<'a> From<&'a EntityDecl> for EntityRef<'a> {
    fn from(decl: &'a EntityDecl) -> Self {
        EntityRef::Declaration(decl)
    }
}

/// Answers relation and composition queries over a reloadable catalog.
///
/// Shared across threads by reference or `Arc`. Queries run against the
/// snapshot current when they start; [`reload`](Self::reload) swaps the
/// snapshot and invalidates every memoized resolution.
pub struct RelationService<C: TypeCatalog> {
    catalog: RwLock<Arc<C>>,
    config: ResolverConfig,
    cache: ResolutionCache,
}

impl<C: TypeCatalog> RelationService<C> {
    /// Create a service with the default configuration.
    pub fn new(catalog: C) -> Self {
        Self::with_config(catalog, ResolverConfig::default())
    }

    /// Create a service with a custom configuration.
    pub fn with_config(catalog: C, config: ResolverConfig) -> Self {
        let catalog = Arc::new(catalog);
        let cache = ResolutionCache::new(catalog.generation(), config.cache_capacity);
        Self {
            catalog: RwLock::new(catalog),
            config,
            cache,
        }
    }

    /// The single composition relation in which the entity is the child part.
    ///
    /// Returns `Ok(None)` when there is none and
    /// [`Error::MultipleCompositionParents`] when there is more than one.
    pub fn find_composition_parent<'e>(
        &self,
        entity: impl Into<EntityRef<'e>>,
    ) -> Result<Option<Relation>, Error> {
        let resolution = self.resolution(entity.into())?;

        let mut parents = resolution.composition_parents();
        match (parents.next(), parents.next()) {
            (None, _) => Ok(None),
            (Some(parent), None) => Ok(Some(parent.clone())),
            (Some(_), Some(_)) => Err(Error::MultipleCompositionParents {
                entity: resolution.entity.clone(),
                relations: resolution
                    .composition_parents()
                    .map(|r| r.field.clone())
                    .collect(),
            }),
        }
    }

    /// Every relation in which the entity is the child part, composition or
    /// not, in field-declaration order.
    pub fn find_child_part_relations<'e>(
        &self,
        entity: impl Into<EntityRef<'e>>,
    ) -> Result<Vec<Relation>, Error> {
        let resolution = self.resolution(entity.into())?;
        Ok(resolution.child_part_relations().cloned().collect())
    }

    /// The entity's full resolution.
    pub fn relations<'e>(&self, entity: impl Into<EntityRef<'e>>) -> Result<Arc<Resolution>, Error> {
        self.resolution(entity.into())
    }

    /// Diagnostics attached to the entity.
    pub fn diagnostics<'e>(
        &self,
        entity: impl Into<EntityRef<'e>>,
    ) -> Result<Vec<Diagnostic>, Error> {
        Ok(self.resolution(entity.into())?.diagnostics.clone())
    }

    /// Resolve every entity declaration of the current snapshot.
    ///
    /// Declarations that are not entities are skipped.
    pub fn resolve_all(&self) -> Vec<(TypeId, Arc<Resolution>)> {
        let catalog = self.snapshot();
        let mut resolved = Vec::new();

        for id in catalog.type_ids() {
            let Some(decl) = catalog.declaration_of(&id) else {
                continue;
            };
            if !decl.is_entity() {
                continue;
            }
            resolved.push((id, self.resolve_in(&catalog, decl)));
        }

        debug!(entities = resolved.len(), "resolved catalog");
        resolved
    }

    /// Swap in a new catalog snapshot and drop every memoized resolution.
    pub fn reload(&self, catalog: C) {
        let catalog = Arc::new(catalog);
        let generation = catalog.generation();

        let mut current = self.catalog.write();
        let previous = current.generation();
        if generation <= previous {
            warn!(previous, generation, "reloaded catalog does not advance the generation");
        }
        *current = catalog;
        self.cache.invalidate(generation);
        drop(current);

        info!(previous, generation, "catalog reloaded");
    }

    /// Generation of the current snapshot.
    pub fn generation(&self) -> u64 {
        self.catalog.read().generation()
    }

    /// The current snapshot.
    pub fn catalog(&self) -> Arc<C> {
        self.snapshot()
    }

    /// The resolver configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Memoization statistics.
    pub fn cache_stats(&self) -> &CacheStats {
        self.cache.stats()
    }

    /// Number of memoized resolutions.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    fn snapshot(&self) -> Arc<C> {
        self.catalog.read().clone()
    }

    #[instrument(skip_all, fields(entity = entity.name()))]
    fn resolution(&self, entity: EntityRef<'_>) -> Result<Arc<Resolution>, Error> {
        let catalog = self.snapshot();

        let (decl, held) = match entity {
            EntityRef::Name(name) => {
                let decl = catalog
                    .declaration_of(name)
                    .ok_or_else(|| Error::UnknownEntity(name.to_string()))?;
                (decl, true)
            }
            EntityRef::Declaration(decl) => {
                let held = catalog
                    .declaration_of(&decl.name)
                    .is_some_and(|current| std::ptr::eq(current, decl) || current == decl);
                (decl, held)
            }
        };
        if !decl.is_entity() {
            return Err(Error::NotAnEntity {
                name: decl.name.clone(),
                kind: decl.kind,
            });
        }

        if !held {
            debug!("declaration differs from the catalog, resolving uncached");
            return Ok(Arc::new(
                RelationResolver::new(&*catalog, &self.config).resolve(decl),
            ));
        }
        Ok(self.resolve_in(&catalog, decl))
    }

    /// Resolve a declaration held by `catalog`, through the cache when enabled.
    fn resolve_in(&self, catalog: &C, decl: &EntityDecl) -> Arc<Resolution> {
        let generation = catalog.generation();

        if !self.config.cache_enabled {
            return Arc::new(RelationResolver::new(catalog, &self.config).resolve(decl));
        }
        if let Some(cached) = self.cache.get(&decl.name, generation) {
            return cached;
        }

        let resolution = RelationResolver::new(catalog, &self.config).resolve(decl);
        self.cache.insert(resolution)
    }
}
