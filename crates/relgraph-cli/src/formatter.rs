//! Output formatters for resolution results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use relgraph_core::{CascadeSet, Diagnostic, Relation, Side};

/// Result of rendering output.
pub type FormatResult = Result<String, serde_json::Error>;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format relations, each seen from its `field`.
    fn format_relations(&self, relations: &[Relation]) -> FormatResult;

    /// Format the composition parent of an entity.
    fn format_parent(&self, entity: &str, parent: Option<&Relation>) -> FormatResult;

    /// Format diagnostics.
    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> FormatResult;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_relations(&self, relations: &[Relation]) -> FormatResult {
        if relations.is_empty() {
            return Ok("No relations".to_string());
        }

        let mut table = Table::new();
        table.set_header(vec![
            "Field",
            "Side",
            "Cardinality",
            "Target",
            "Mirror",
            "Cascade",
            "Composition",
            "Child part",
        ]);

        for relation in relations {
            let info = &relation.info;
            let (target, mirror) = match relation.side() {
                Side::Owning => (
                    info.target.clone(),
                    info.mirror.as_ref().map(ToString::to_string),
                ),
                Side::Inverse => (info.owner.entity.clone(), Some(info.owner.to_string())),
            };

            table.add_row(vec![
                Cell::new(&relation.field),
                Cell::new(relation.side()),
                Cell::new(relation.cardinality()),
                Cell::new(target),
                Cell::new(mirror.unwrap_or_else(|| "-".to_string())),
                Cell::new(format_cascade(&info.cascade, info.orphan_removal)),
                Cell::new(yes_no(info.composition)),
                Cell::new(yes_no(relation.is_child_part())),
            ]);
        }

        Ok(format!("{}\n{} relation(s)", table, relations.len()))
    }

    fn format_parent(&self, entity: &str, parent: Option<&Relation>) -> FormatResult {
        match parent {
            Some(parent) => self.format_relations(std::slice::from_ref(parent)),
            None => Ok(format!("{entity} has no composition parent")),
        }
    }

    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> FormatResult {
        if diagnostics.is_empty() {
            return Ok("No diagnostics".to_string());
        }

        let mut table = Table::new();
        table.set_header(vec!["Entity", "Kind", "Message"]);

        for diagnostic in diagnostics {
            table.add_row(vec![
                Cell::new(diagnostic.entity()),
                Cell::new(diagnostic.kind()),
                Cell::new(diagnostic),
            ]);
        }

        Ok(format!("{}\n{} diagnostic(s)", table, diagnostics.len()))
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_relations(&self, relations: &[Relation]) -> FormatResult {
        serde_json::to_string_pretty(relations)
    }

    fn format_parent(&self, _entity: &str, parent: Option<&Relation>) -> FormatResult {
        serde_json::to_string_pretty(&parent)
    }

    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> FormatResult {
        let entries = diagnostics
            .iter()
            .map(|diagnostic| {
                let mut value = serde_json::to_value(diagnostic)?;
                if let serde_json::Value::Object(obj) = &mut value {
                    obj.insert(
                        "message".to_string(),
                        serde_json::Value::String(diagnostic.to_string()),
                    );
                }
                Ok(value)
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        serde_json::to_string_pretty(&entries)
    }
}

/// Format cascade markers, e.g. `remove, orphan-removal`.
fn format_cascade(cascade: &CascadeSet, orphan_removal: bool) -> String {
    let mut parts: Vec<String> = cascade
        .iter()
        .map(|op| format!("{op:?}").to_lowercase())
        .collect();
    if orphan_removal {
        parts.push("orphan-removal".to_string());
    }

    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
