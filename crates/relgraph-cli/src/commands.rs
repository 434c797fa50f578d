//! Subcommand execution.

use std::path::{Path, PathBuf};

use relgraph_core::{CatalogSnapshot, Diagnostic, RelationService, ResolverConfig};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Args, Command};
use crate::formatter::{create_formatter, FormatResult, Formatter};

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// The catalog file could not be read.
    #[error("cannot read catalog {}: {source}", .path.display())]
    Read {
        /// Catalog path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Output could not be rendered.
    #[error("cannot render output: {0}")]
    Render(#[source] serde_json::Error),

    /// The catalog or a query was rejected.
    #[error(transparent)]
    Core(#[from] relgraph_core::Error),
}

/// Rendered output of a subcommand.
#[derive(Debug)]
pub struct Report {
    /// Text to print.
    pub output: String,
    /// Number of diagnostics found by `check`.
    pub diagnostics: usize,
}

/// Load a catalog document from disk.
pub fn load_catalog(path: &Path) -> Result<CatalogSnapshot, CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = CatalogSnapshot::from_json(&json)?;

    info!(
        path = %path.display(),
        generation = catalog.generation,
        entities = catalog.declarations.len(),
        "loaded catalog"
    );
    Ok(catalog)
}

/// Run the selected subcommand.
pub fn run(args: &Args) -> Result<Report, CliError> {
    let catalog = load_catalog(&args.catalog)?;
    let service = RelationService::with_config(catalog, ResolverConfig::from(args));
    let formatter = create_formatter(args.format);

    execute(&service, &args.command, &*formatter)
}

/// Execute a subcommand against a service.
pub fn execute(
    service: &RelationService<CatalogSnapshot>,
    command: &Command,
    formatter: &dyn Formatter,
) -> Result<Report, CliError> {
    debug!(?command, "executing");

    let report = match command {
        Command::Relations { entity: Some(entity) } => {
            let resolution = service.relations(entity)?;
            Report::plain(formatter.format_relations(&resolution.relations))?
        }
        Command::Relations { entity: None } => {
            let relations: Vec<_> = service
                .resolve_all()
                .into_iter()
                .flat_map(|(_, resolution)| resolution.relations.clone())
                .collect();
            Report::plain(formatter.format_relations(&relations))?
        }
        Command::Composition { entity } => {
            let parent = service.find_composition_parent(entity)?;
            Report::plain(formatter.format_parent(entity, parent.as_ref()))?
        }
        Command::Children { entity } => {
            let children = service.find_child_part_relations(entity)?;
            Report::plain(formatter.format_relations(&children))?
        }
        Command::Check { entity: Some(entity) } => {
            Report::checked(formatter, service.diagnostics(entity)?)?
        }
        Command::Check { entity: None } => {
            let diagnostics: Vec<Diagnostic> = service
                .resolve_all()
                .into_iter()
                .flat_map(|(_, resolution)| resolution.diagnostics.clone())
                .collect();
            Report::checked(formatter, diagnostics)?
        }
    };

    Ok(report)
}

impl Report {
    fn plain(output: FormatResult) -> Result<Self, CliError> {
        Ok(Self {
            output: output.map_err(CliError::Render)?,
            diagnostics: 0,
        })
    }

    fn checked(formatter: &dyn Formatter, diagnostics: Vec<Diagnostic>) -> Result<Self, CliError> {
        Ok(Self {
            output: formatter
                .format_diagnostics(&diagnostics)
                .map_err(CliError::Render)?,
            diagnostics: diagnostics.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::OutputFormat;
    use clap::Parser;
    use std::io::Write;

    const SHOP: &str = r#"{
        "generation": 1,
        "entities": [
            {
                "name": "Order",
                "fields": [
                    { "name": "id", "value_type": { "type": "scalar", "scalar": "uuid" } },
                    {
                        "name": "items",
                        "value_type": { "type": "collection", "element": "OrderItem" },
                        "markers": { "side": "owning", "cascade": ["remove"], "orphan_removal": true }
                    }
                ]
            },
            {
                "name": "OrderItem",
                "fields": [
                    {
                        "name": "order",
                        "value_type": { "type": "reference", "target": "Order" },
                        "markers": { "mapped_by": "items" }
                    }
                ]
            },
            {
                "name": "ChildX",
                "fields": [
                    {
                        "name": "parentRef",
                        "value_type": { "type": "reference", "target": "ParentX" },
                        "markers": { "mapped_by": "missingField" }
                    }
                ]
            },
            { "name": "ParentX" }
        ]
    }"#;

    fn catalog_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    fn run_with(file: &tempfile::NamedTempFile, extra: &[&str]) -> Result<Report, CliError> {
        let path = file.path().to_str().unwrap();
        let mut argv = vec!["relgraph", "--catalog", path];
        argv.extend_from_slice(extra);
        run(&Args::parse_from(argv))
    }

    #[test]
    fn test_composition_command() {
        let file = catalog_file(SHOP);

        let report = run_with(&file, &["composition", "OrderItem"]).unwrap();
        assert!(report.output.contains("Order.items"));
        assert_eq!(report.diagnostics, 0);

        let report = run_with(&file, &["composition", "Order"]).unwrap();
        assert_eq!(report.output, "Order has no composition parent");
    }

    #[test]
    fn test_children_json() {
        let file = catalog_file(SHOP);

        let report = run_with(&file, &["--format", "json", "children", "OrderItem"]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&report.output).unwrap();
        assert_eq!(parsed[0]["field"]["field"], "order");
        assert_eq!(parsed[0]["info"]["composition"], true);

        let report = run_with(&file, &["--format", "json", "children", "Order"]).unwrap();
        assert_eq!(report.output, "[]");
    }

    #[test]
    fn test_check_reports_broken_mirror() {
        let file = catalog_file(SHOP);

        let report = run_with(&file, &["check"]).unwrap();
        assert_eq!(report.diagnostics, 1);
        assert!(report.output.contains("ChildX.parentRef: mirror ParentX.missingField does not exist"));

        let report = run_with(&file, &["check", "Order"]).unwrap();
        assert_eq!(report.diagnostics, 0);
    }

    #[test]
    fn test_relations_for_whole_catalog() {
        let file = catalog_file(SHOP);

        let report = run_with(&file, &["relations"]).unwrap();
        // One bidirectional relation, seen from both of its fields.
        assert!(report.output.ends_with("2 relation(s)"));
    }

    struct FailingFormatter;

    impl Formatter for FailingFormatter {
        fn format_relations(&self, _relations: &[relgraph_core::Relation]) -> FormatResult {
            Err(serde_json::from_str::<serde_json::Value>("[").unwrap_err())
        }

        fn format_parent(
            &self,
            _entity: &str,
            _parent: Option<&relgraph_core::Relation>,
        ) -> FormatResult {
            Ok(String::new())
        }

        fn format_diagnostics(&self, _diagnostics: &[Diagnostic]) -> FormatResult {
            Err(serde_json::from_str::<serde_json::Value>("[").unwrap_err())
        }
    }

    #[test]
    fn test_render_failure_is_reported() {
        let service = RelationService::new(CatalogSnapshot::from_json(SHOP).unwrap());

        let children = Command::Children {
            entity: "OrderItem".to_string(),
        };
        let err = execute(&service, &children, &FailingFormatter).unwrap_err();
        assert!(matches!(err, CliError::Render(_)));
        assert!(err.to_string().starts_with("cannot render output"));

        let check = Command::Check { entity: None };
        let err = execute(&service, &check, &FailingFormatter).unwrap_err();
        assert!(matches!(err, CliError::Render(_)));
    }

    #[test]
    fn test_unknown_entity() {
        let file = catalog_file(SHOP);

        let err = run_with(&file, &["children", "Warehouse"]).unwrap_err();
        assert!(matches!(err, CliError::Core(relgraph_core::Error::UnknownEntity(_))));
        assert_eq!(err.to_string(), "unknown entity: Warehouse");
    }

    #[test]
    fn test_missing_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::parse_from([
            "relgraph",
            "--catalog",
            dir.path().join("missing.json").to_str().unwrap(),
            "check",
        ]);

        let err = run(&args).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
        assert_eq!(args.format, OutputFormat::Table);
    }

    #[test]
    fn test_malformed_catalog() {
        let file = catalog_file(r#"{ "entities": [ { "name": "A" }, { "name": "A" } ] }"#);

        let err = run_with(&file, &["check"]).unwrap_err();
        assert!(err.to_string().contains("duplicate type A"));
    }
}
