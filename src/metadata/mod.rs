//! Metadata representation for the write pass.
//!
//! Everything the writer consumes or produces that is not the pass itself: the live object
//! graph of the edited module, the accessor for the input module's rows, the row
//! structures and table store the pass fills, the heaps those rows point into, and the
//! signature encoders that turn graph references into blob bytes.
//!
//! # Key Components
//!
//! - [`model`] - Definitions and references as shared, identity-compared objects
//! - [`source`] - [`source::OriginalModule`] and its in-memory implementation
//! - [`tables`] - [`tables::TableId`], coded indices, raw rows and [`tables::MetadataTables`]
//! - [`streams`] - [`streams::HeapWriter`] and [`streams::HeapBuilder`]
//! - [`signatures`] - ECMA-335 signature blobs
//! - [`diagnostics`] - Collector for recoverable problems
//! - [`token`] - Metadata table row references

/// Collector for recoverable problems found during a pass
pub mod diagnostics;
/// The live object graph of a module under edit
pub mod model;
/// Signature model and blob encoders
pub mod signatures;
/// Access to the rows of the input module
pub mod source;
/// String and blob heaps
pub mod streams;
/// Table identifiers, coded indices, raw rows and the table store
pub mod tables;
/// Metadata tokens
pub mod token;
