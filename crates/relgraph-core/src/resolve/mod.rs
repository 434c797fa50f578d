//! Relation resolution.
//!
//! Classification of single fields, supertype walking, and pairing of both
//! sides of a relation into one canonical record.

mod classifier;
pub(crate) mod hierarchy;
mod resolver;

pub use classifier::{Classification, FieldClassifier, FieldRelation, Ownership};
pub use resolver::{RelationResolver, Resolution};
