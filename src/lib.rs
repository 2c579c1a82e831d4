// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # dotscope-preserve
//!
//! Token-preserving metadata table writer for .NET modules.
//!
//! Rewriting a .NET module normally renumbers every metadata table from scratch. Anything
//! that addresses entries by raw token, such as a debugger session, a reflection call
//! site or a string decryptor injected by a protector, breaks silently when that happens.
//! `dotscope-preserve` writes the tables of an edited module so that every entry read from
//! the input module keeps its row, and therefore its token, wherever that is possible.
//!
//! ## Features
//!
//! - **Per-table preservation** - Pick which tables keep their rows through [`writer::MetadataFlags`]
//! - **Deleted rows stay occupied** - Dummy types and placeholder members fill the rows of
//!   deleted originals, so no surviving entry moves
//! - **Reordering without renumbering** - `FieldPtr`, `MethodPtr`, `ParamPtr`, `EventPtr`
//!   and `PropertyPtr` carry the logical order when it differs from row order
//! - **Hidden references survive** - Original reference rows nothing points at any more
//!   are written back
//! - **Recoverable problems are collected** - Dangling references, cycles and lost
//!   signature tokens end up in a [`metadata::diagnostics::Diagnostics`] collector
//!   instead of aborting the pass
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dotscope_preserve::prelude::*;
//!
//! # fn write(module: &Module, source: &SourceModule) -> dotscope_preserve::Result<()> {
//! let mut writer = MetadataWriter::new(module, source, HeapBuilder::new(), WriterOptions::preserve_all());
//! writer.run()?;
//! let output = writer.finish()?;
//!
//! if output.diagnostics.has_warnings() {
//!     println!("{}", output.diagnostics.summary());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - Tables, heaps, signatures, tokens and the live object graph
//! - [`writer`] - The write pass
//! - [`utils`] - Encoding helpers

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use dotscope_preserve::prelude::*;
///
/// let options = WriterOptions::new(MetadataFlags::PRESERVE_TYPE_DEF_RIDS | MetadataFlags::PRESERVE_FIELD_RIDS);
/// assert!(options.preserves(TableId::Field));
/// ```
pub mod prelude;

/// Metadata tables, heaps, signatures and the edited object graph
///
/// # Key Components
///
/// - [`metadata::model`] - The live object graph a module is edited as
/// - [`metadata::source`] - Access to the rows of the input module
/// - [`metadata::tables`] - Row structures and the table store the writer fills
/// - [`metadata::streams`] - String and blob heaps
/// - [`metadata::signatures`] - Signature model and blob encoders
/// - [`metadata::diagnostics`] - Collector for recoverable problems
/// - [`metadata::token`] - Metadata tokens
pub mod metadata;

/// The token-preserving write pass
pub mod writer;

/// Encoding helpers
pub mod utils;

/// `dotscope-preserve` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotscope-preserve` Error type
///
/// Only conditions that make the whole pass invalid are errors; everything recoverable is
/// reported through [`metadata::diagnostics::Diagnostics`].
///
/// # Examples
///
/// ```rust,no_run
/// use dotscope_preserve::{prelude::*, Error};
///
/// # fn write(module: &Module, source: &SourceModule) {
/// let mut writer = MetadataWriter::new(module, source, HeapBuilder::new(), WriterOptions::default());
/// match writer.run() {
///     Ok(()) => println!("Written"),
///     Err(Error::TableOverflow { table, rows }) => println!("{table:?} needs {rows} rows"),
///     Err(e) => println!("Error: {e}"),
/// }
/// # }
/// ```
pub use error::Error;
