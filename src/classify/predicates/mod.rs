//! Built-in predicates.
//!
//! - `InstrumentPredicate`: timsTOF family in the instrument entries
//! - `TopicPredicate`: the two-tier immunopeptidomics keyword policy
//! - `DomainPredicate`: cancer vocabulary in a configurable field scope
//! - `SamplePredicate`: specimen type (cell line, tissue, xenograft)

mod instrument;
mod terms;
mod topic;

pub use instrument::InstrumentPredicate;
pub use terms::{DomainPredicate, SamplePredicate};
pub use topic::{TopicPredicate, TopicTier};
