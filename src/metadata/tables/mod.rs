//! Metadata table identifiers, row layouts and the row store.
//!
//! This module only models what the writer needs to *produce*: which tables exist, how a
//! row of each looks, and a 1-indexed store that supports appending and overwriting rows.
//! The byte-level layout of the `#~` stream is owned by the surrounding module writer.
//!
//! # Key Components
//!
//! - [`TableId`] - Identifier of every table the writer touches
//! - [`CodedIndex`] / [`CodedIndexType`] - Polymorphic row references
//! - [`MetadataTable`] - Append-only row store with overwrite-by-index
//! - [`MetadataTables`] - One store per written table
//! - `*Raw` structs - Fixed-shape row layouts

mod codedindex;
mod rows;
mod table;
mod tableid;

pub use codedindex::{CodedIndex, CodedIndexType};
pub use rows::*;
pub use table::{MetadataTable, MetadataTables, MAX_ROWS};
pub use tableid::TableId;
