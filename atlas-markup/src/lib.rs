//! # atlas-markup
//!
//! Parser and document model for the Atlas analysis markup: a line-oriented
//! dialect of headings, lists, tables, blockquotes and named callout regions
//! (`[INSIGHT_NOTE]` ... `[/INSIGHT_NOTE]`) produced by the analysis
//! generator.
//!
//! The crate is deliberately infallible: classification, parsing, field
//! extraction, validation and auditing all return values, never errors.
//! Malformed input degrades to coarser blocks, and text is never dropped;
//! a callout whose close tag is missing is still emitted with everything it
//! collected.
//!
//! Layout:
//! - [`line`] classifies single raw lines, statelessly.
//! - [`parser`] drives the block state machine over classified lines.
//! - [`extract`] pulls labeled sub-fields out of structured callouts.
//! - [`inline`] turns text spans into flat emphasis/code/link runs.
//! - [`validate`] re-scans raw text for unbalanced callout markers.
//! - [`audit`] scores a document against the expected structure.

pub mod ast;
pub mod audit;
pub mod extract;
pub mod inline;
pub mod line;
pub mod parser;
pub mod validate;

pub use ast::{
    Block, Document, InlineRun, SpecialBlock, SpecialKind, StructuredFields, TocEntry,
};
pub use audit::{audit, AuditCheck, AuditLimits, AuditReport};
pub use inline::{parse_inline, safe_link_target};
pub use parser::{parse, parse_with_trace, ParseTrace};
pub use validate::{validate, UnclosedBlock, UnmatchedClose, ValidationReport};
