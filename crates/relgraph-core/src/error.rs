//! Core error types.

use thiserror::Error;

use crate::catalog::{DeclKind, FieldRef, TypeId};

/// Errors returned by catalog loading and relation queries.
///
/// Problems with individual declarations are reported as
/// [`Diagnostic`](crate::Diagnostic)s instead; an `Error` means the query
/// itself could not be answered.
#[derive(Debug, Error)]
pub enum Error {
    /// The queried entity is not in the catalog.
    #[error("unknown entity: {0}")]
    UnknownEntity(TypeId),

    /// The queried declaration is not a persistent entity.
    #[error("{name} is {kind:?}, not an entity")]
    NotAnEntity {
        /// Declaration name.
        name: TypeId,
        /// Its kind.
        kind: DeclKind,
    },

    /// The entity is the child part of more than one composition, so no
    /// single composition parent exists.
    #[error("{entity} is the child part of more than one composition")]
    MultipleCompositionParents {
        /// The child entity.
        entity: TypeId,
        /// The entity's fields on each composition.
        relations: Vec<FieldRef>,
    },

    /// The catalog document is structurally invalid.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// JSON encoding or decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
