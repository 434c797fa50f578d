//! Command line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relgraph_core::ResolverConfig;

use crate::formatter::OutputFormat;

/// relgraph catalog inspector command line arguments.
#[derive(Debug, Parser)]
#[command(name = "relgraph")]
#[command(version, about = "Inspect entity relations and compositions in a catalog")]
pub struct Args {
    /// Catalog document (JSON).
    #[arg(short, long)]
    pub catalog: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Resolve only the fields an entity declares itself.
    #[arg(long)]
    pub no_inherited: bool,

    /// Require explicit orphan removal for composition; `cascade = all`
    /// alone does not imply it.
    #[arg(long)]
    pub strict_composition: bool,

    /// Longest supertype chain walked before reporting a cycle.
    #[arg(long, default_value_t = relgraph_core::config::DEFAULT_MAX_SUPERTYPE_DEPTH)]
    pub max_supertype_depth: usize,

    #[command(subcommand)]
    pub command: Command,
}

/// What to report.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the relations of an entity, or of every entity.
    Relations {
        /// Entity name.
        entity: Option<String>,
    },
    /// Show the composition relation in which an entity is the child part.
    Composition {
        /// Entity name.
        entity: String,
    },
    /// List every relation in which an entity is the child part.
    Children {
        /// Entity name.
        entity: String,
    },
    /// Report diagnostics for an entity, or for the whole catalog.
    Check {
        /// Entity name.
        entity: Option<String>,
    },
}

impl From<&Args> for ResolverConfig {
    fn from(args: &Args) -> Self {
        ResolverConfig::new()
            .include_inherited_fields(!args.no_inherited)
            .cascade_all_is_composition(!args.strict_composition)
            .max_supertype_depth(args.max_supertype_depth)
    }
}
