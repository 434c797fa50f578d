//! Supertype chain walking.

use std::collections::HashSet;

use crate::catalog::{EntityDecl, FieldDecl, TypeCatalog};
use crate::diagnostic::Diagnostic;

/// Walks supertype chains through the catalog, bounded and cycle-safe.
pub(crate) struct Hierarchy<'a, C: TypeCatalog + ?Sized> {
    catalog: &'a C,
    max_depth: usize,
}

impl<C: TypeCatalog + ?Sized> Clone for Hierarchy<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: TypeCatalog + ?Sized> Copy for Hierarchy<'_, C> {}

impl<'a, C: TypeCatalog + ?Sized> Hierarchy<'a, C> {
    pub(crate) fn new(catalog: &'a C, max_depth: usize) -> Self {
        Self { catalog, max_depth }
    }

    /// Supertypes of `decl`, nearest first.
    ///
    /// Stops at the first missing or repeated type and reports why.
    pub(crate) fn ancestors(&self, decl: &EntityDecl) -> (Vec<&'a EntityDecl>, Option<Diagnostic>) {
        let mut ancestors = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut chain = vec![decl.name.clone()];
        seen.insert(&decl.name);

        let mut holder = decl.name.as_str();
        let mut next = decl.supertype.as_deref();

        while let Some(name) = next {
            chain.push(name.to_string());
            if !seen.insert(name) || ancestors.len() >= self.max_depth {
                return (
                    ancestors,
                    Some(Diagnostic::SupertypeCycle {
                        entity: decl.name.clone(),
                        chain,
                    }),
                );
            }

            let Some(supertype) = self.catalog.declaration_of(name) else {
                return (
                    ancestors,
                    Some(Diagnostic::UnknownType {
                        entity: holder.to_string(),
                        field: None,
                        referenced: name.to_string(),
                    }),
                );
            };

            ancestors.push(supertype);
            holder = &supertype.name;
            next = supertype.supertype.as_deref();
        }

        (ancestors, None)
    }

    /// Every field visible on `decl` with its declaring type, root supertype first.
    pub(crate) fn lineage_fields<'d>(
        &self,
        decl: &'d EntityDecl,
    ) -> (Vec<(&'d EntityDecl, &'d FieldDecl)>, Option<Diagnostic>)
    where
        'a: 'd,
    {
        let (ancestors, diagnostic) = self.ancestors(decl);
        let fields = ancestors
            .into_iter()
            .rev()
            .chain(std::iter::once(decl))
            .flat_map(|owner| owner.fields.iter().map(move |field| (owner, field)))
            .collect();
        (fields, diagnostic)
    }

    /// Every field visible on the named type, root supertype first.
    pub(crate) fn fields_of(&self, type_name: &str) -> Vec<(&'a EntityDecl, &'a FieldDecl)> {
        match self.catalog.declaration_of(type_name) {
            Some(decl) => self.lineage_fields(decl).0,
            None => Vec::new(),
        }
    }

    /// Find a field on the named type or its nearest supertype declaring it.
    pub(crate) fn find_field(
        &self,
        type_name: &str,
        field: &str,
    ) -> Option<(&'a EntityDecl, &'a FieldDecl)> {
        let decl = self.catalog.declaration_of(type_name)?;
        std::iter::once(decl)
            .chain(self.ancestors(decl).0)
            .find_map(|owner| owner.get_field(field).map(|f| (owner, f)))
    }

    /// Check if `sub` is `sup` or one of its subtypes.
    pub(crate) fn is_assignable(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        match self.catalog.declaration_of(sub) {
            Some(decl) => self.ancestors(decl).0.iter().any(|a| a.name == sup),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogSnapshot, FieldDecl, ScalarType};
    use crate::diagnostic::DiagnosticKind;

    fn document_catalog() -> CatalogSnapshot {
        CatalogSnapshot::new(1)
            .with_entity(
                EntityDecl::mapped_superclass("Auditable")
                    .with_field(FieldDecl::scalar("created_at", ScalarType::Timestamp)),
            )
            .with_entity(
                EntityDecl::new("Document")
                    .extends("Auditable")
                    .with_field(FieldDecl::scalar("id", ScalarType::Uuid))
                    .with_field(FieldDecl::reference("owner", "User")),
            )
            .with_entity(
                EntityDecl::new("Invoice")
                    .extends("Document")
                    .with_field(FieldDecl::scalar("total", ScalarType::Int64)),
            )
            .with_entity(EntityDecl::new("User"))
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let catalog = document_catalog();
        let hierarchy = Hierarchy::new(&catalog, 16);
        let invoice = catalog.get_entity("Invoice").unwrap();

        let (ancestors, diagnostic) = hierarchy.ancestors(invoice);
        let names: Vec<_> = ancestors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Document", "Auditable"]);
        assert!(diagnostic.is_none());
    }

    #[test]
    fn test_lineage_fields_root_first() {
        let catalog = document_catalog();
        let hierarchy = Hierarchy::new(&catalog, 16);

        let fields: Vec<_> = hierarchy
            .fields_of("Invoice")
            .into_iter()
            .map(|(owner, field)| format!("{}.{}", owner.name, field.name))
            .collect();
        assert_eq!(
            fields,
            vec![
                "Auditable.created_at",
                "Document.id",
                "Document.owner",
                "Invoice.total"
            ]
        );
    }

    #[test]
    fn test_find_inherited_field() {
        let catalog = document_catalog();
        let hierarchy = Hierarchy::new(&catalog, 16);

        let (owner, field) = hierarchy.find_field("Invoice", "owner").unwrap();
        assert_eq!(owner.name, "Document");
        assert_eq!(field.name, "owner");
        assert!(hierarchy.find_field("Invoice", "missing").is_none());
    }

    #[test]
    fn test_is_assignable() {
        let catalog = document_catalog();
        let hierarchy = Hierarchy::new(&catalog, 16);

        assert!(hierarchy.is_assignable("Invoice", "Document"));
        assert!(hierarchy.is_assignable("Invoice", "Invoice"));
        assert!(!hierarchy.is_assignable("Document", "Invoice"));
        assert!(!hierarchy.is_assignable("User", "Document"));
    }

    #[test]
    fn test_cycle_detected() {
        let catalog = CatalogSnapshot::new(1)
            .with_entity(EntityDecl::new("A").extends("B"))
            .with_entity(EntityDecl::new("B").extends("A"));
        let hierarchy = Hierarchy::new(&catalog, 16);

        let (_, diagnostic) = hierarchy.ancestors(catalog.get_entity("A").unwrap());
        let diagnostic = diagnostic.unwrap();
        assert_eq!(diagnostic.kind(), DiagnosticKind::SupertypeCycle);
        assert_eq!(diagnostic.to_string(), "A: supertype chain does not terminate: A -> B -> A");
    }

    #[test]
    fn test_missing_supertype() {
        let catalog = CatalogSnapshot::new(1)
            .with_entity(EntityDecl::new("Invoice").extends("Document"));
        let hierarchy = Hierarchy::new(&catalog, 16);

        let (ancestors, diagnostic) = hierarchy.ancestors(catalog.get_entity("Invoice").unwrap());
        assert!(ancestors.is_empty());
        assert_eq!(
            diagnostic,
            Some(Diagnostic::UnknownType {
                entity: "Invoice".into(),
                field: None,
                referenced: "Document".into(),
            })
        );
    }

    #[test]
    fn test_depth_bound() {
        let catalog = CatalogSnapshot::new(1)
            .with_entity(EntityDecl::new("C").extends("B"))
            .with_entity(EntityDecl::new("B").extends("A"))
            .with_entity(EntityDecl::new("A"));
        let hierarchy = Hierarchy::new(&catalog, 1);

        let (ancestors, diagnostic) = hierarchy.ancestors(catalog.get_entity("C").unwrap());
        assert_eq!(ancestors.len(), 1);
        assert_eq!(diagnostic.unwrap().kind(), DiagnosticKind::SupertypeCycle);
    }
}
