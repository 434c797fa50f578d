//! The type catalog seam consumed by the resolver.

use std::sync::Arc;

use super::entity::EntityDecl;
use super::types::TypeId;

/// Read-only registry of declared types.
///
/// A catalog is an immutable snapshot. Its generation changes whenever the
/// provider reloads declarations, and cached resolutions are keyed by it.
pub trait TypeCatalog: Send + Sync {
    /// Look up a declaration by type name.
    fn declaration_of(&self, id: &str) -> Option<&EntityDecl>;

    /// Generation token of this snapshot.
    fn generation(&self) -> u64;

    /// Names of every declared type, in a stable order.
    fn type_ids(&self) -> Vec<TypeId>;
}

impl<C: TypeCatalog + ?Sized> TypeCatalog for Arc<C> {
    fn declaration_of(&self, id: &str) -> Option<&EntityDecl> {
        (**self).declaration_of(id)
    }

    fn generation(&self) -> u64 {
        (**self).generation()
    }

    fn type_ids(&self) -> Vec<TypeId> {
        (**self).type_ids()
    }
}
