use thiserror::Error;

use crate::metadata::tables::TableId;

/// Builds an [`Error::Invariant`] that records where the violated invariant was detected.
macro_rules! invariant_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Invariant {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Invariant {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which covers every fatal condition of a write pass.
///
/// A write pass either completes and yields format-valid tables, or aborts with one of
/// these errors. Conditions the pass can recover from (dangling references, resolution
/// cycles, stand-alone signatures whose token cannot be kept) are never reported through
/// this type; they are collected in [`crate::metadata::diagnostics::Diagnostics`] instead.
///
/// # Error Categories
///
/// ## Table Limits
/// - [`Error::TableOverflow`] - A table grew beyond the 24-bit row index space
/// - [`Error::InvalidRid`] - A row that does not exist was addressed
///
/// ## Bookkeeping
/// - [`Error::Invariant`] - An internal invariant of the pass was violated
/// - [`Error::StageOrder`] - Pass entry points were invoked out of order
///
/// ## Encoding
/// - [`Error::SignatureEncoding`] - A value cannot be represented in a signature blob
///
/// # Examples
///
/// ```rust,no_run
/// use dotscope_preserve::{Error, prelude::*};
///
/// # fn run(module: &Module, source: &SourceModule) -> dotscope_preserve::Result<()> {
/// let mut writer = MetadataWriter::new(module, source, HeapBuilder::new(), WriterOptions::preserve_all());
/// match writer.run() {
///     Ok(()) => println!("tables allocated"),
///     Err(Error::TableOverflow { table, rows }) => eprintln!("{table:?} has {rows} rows"),
///     Err(Error::Invariant { message, file, line }) => eprintln!("{message} ({file}:{line})"),
///     Err(e) => eprintln!("write failed: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A table would need more rows than a metadata token can address.
    ///
    /// Row indices are stored in the low 24 bits of a token, so no table may hold more
    /// than `0x00FF_FFFF` rows.
    #[error("Table {table:?} is too big - {rows} rows exceed the 24-bit row index limit")]
    TableOverflow {
        /// The table that overflowed
        table: TableId,
        /// The number of rows the table would have needed
        rows: usize,
    },

    /// A row was addressed that has not been created in the target table.
    #[error("Row {rid} does not exist in table {table:?}")]
    InvalidRid {
        /// The table that was addressed
        table: TableId,
        /// The offending row index
        rid: u32,
    },

    /// An internal bookkeeping invariant of the write pass was violated.
    ///
    /// This indicates either a programming error or an input graph that breaks an
    /// assumption the writer relies on. No output must be produced once this is raised.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the violated invariant
    /// * `file` - Source file where the violation was detected
    /// * `line` - Source line where the violation was detected
    #[error("Invariant violated - {file}:{line}: {message}")]
    Invariant {
        /// The message to be printed for the Invariant error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A pass entry point was called before its predecessor, or twice.
    #[error("Write pass entry point called out of order - expected stage {expected}, found {actual}")]
    StageOrder {
        /// The stage the pass had to be in
        expected: &'static str,
        /// The stage the pass was actually in
        actual: &'static str,
    },

    /// A signature component cannot be encoded.
    ///
    /// Raised when an integer exceeds the range of ECMA-335 compressed integers or a
    /// signature contains more elements than can be counted.
    #[error("{0}")]
    SignatureEncoding(String),
}
