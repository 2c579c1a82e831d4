//! Diagnostics collection for the metadata write pass.
//!
//! The writer distinguishes fatal conditions, which abort the pass through
//! [`crate::Error`], from recoverable ones, which are reported here while the pass keeps
//! going with a degraded but valid result. Typical recoverable conditions are:
//!
//! - a live reference to a definition that was removed from the module (the edge is
//!   written as rid 0),
//! - a cycle in a resolution scope chain or a type specification signature,
//! - a stand-alone signature whose original token cannot be kept because another
//!   resolution already claimed it with different content.
//!
//! # Key Components
//!
//! - [`Diagnostics`] - Append-only container for diagnostic entries
//! - [`Diagnostic`] - Individual diagnostic entry with severity and context
//! - [`DiagnosticSeverity`] - Severity level (Info, Warning, Error)
//! - [`DiagnosticCategory`] - Which kind of metadata the entry is about
//!
//! # Usage Examples
//!
//! ```rust
//! use dotscope_preserve::metadata::diagnostics::{Diagnostics, DiagnosticCategory};
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.error(
//!     DiagnosticCategory::Field,
//!     "Field 'm_count' is not defined in this module",
//! );
//! diagnostics.warning(
//!     DiagnosticCategory::Signature,
//!     "Could not preserve StandAloneSig token 0x11000005",
//! );
//!
//! assert_eq!(diagnostics.error_count(), 1);
//! assert_eq!(diagnostics.warning_count(), 1);
//! ```
//!
//! # Thread Safety
//!
//! The container uses `boxcar::Vec` internally, so entries can be appended through a
//! shared reference. The writer itself is single threaded, but callers may hold on to an
//! `Arc<Diagnostics>` while the pass reports into it.

use std::fmt::{self, Write};

use crate::metadata::token::Token;

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem.
    Info,

    /// The output is valid, but something the caller asked for could not be honoured.
    ///
    /// Example: a stand-alone signature token that had to be moved to a new row.
    Warning,

    /// A reference in the graph could not be resolved and was written as rid 0.
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category indicating which kind of metadata a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Type definitions.
    Type,
    /// Field definitions.
    Field,
    /// Method definitions.
    Method,
    /// Parameter definitions.
    Param,
    /// Event definitions.
    Event,
    /// Property definitions.
    Property,
    /// Type references, member references, type and method specifications.
    Reference,
    /// Signature blobs, including stand-alone signatures.
    Signature,
    /// Table level bookkeeping, such as rows filled with placeholders.
    Table,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Type => write!(f, "Type"),
            DiagnosticCategory::Field => write!(f, "Field"),
            DiagnosticCategory::Method => write!(f, "Method"),
            DiagnosticCategory::Param => write!(f, "Param"),
            DiagnosticCategory::Event => write!(f, "Event"),
            DiagnosticCategory::Property => write!(f, "Property"),
            DiagnosticCategory::Reference => write!(f, "Reference"),
            DiagnosticCategory::Signature => write!(f, "Signature"),
            DiagnosticCategory::Table => write!(f, "Table"),
        }
    }
}

/// A single diagnostic entry with context information.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category indicating the source of this diagnostic.
    pub category: DiagnosticCategory,

    /// Human-readable description of the issue.
    pub message: String,

    /// Optional metadata token related to the issue.
    pub token: Option<Token>,

    /// Optional table and row information (table_id, row_index).
    pub table_row: Option<(u8, u32)>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    ///
    /// # Arguments
    ///
    /// * `severity` - Severity level of the diagnostic
    /// * `category` - Category of the diagnostic source
    /// * `message` - Human-readable description
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            token: None,
            table_row: None,
        }
    }

    /// Adds metadata token information to the diagnostic.
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// Adds table/row information to the diagnostic.
    #[must_use]
    pub fn with_table_row(mut self, table_id: u8, row_index: u32) -> Self {
        self.table_row = Some((table_id, row_index));
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(token) = self.token {
            write!(f, " (token: {})", token)?;
        }

        if let Some((table_id, row)) = self.table_row {
            write!(f, " (table: 0x{:02x}, row: {})", table_id, row)?;
        }

        Ok(())
    }
}

/// Append-only container for collecting diagnostic entries.
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds a warning diagnostic.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    /// Adds an error diagnostic.
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            category,
            message,
        ));
    }

    /// Adds a diagnostic entry directly.
    ///
    /// Use this for diagnostics that need additional context like a token or
    /// table/row information.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns true if any error-level diagnostics have been collected.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns true if any warning-level diagnostics have been collected.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Warning)
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns the number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.count_severity(DiagnosticSeverity::Error)
    }

    /// Returns the number of warning-level diagnostics.
    pub fn warning_count(&self) -> usize {
        self.count_severity(DiagnosticSeverity::Warning)
    }

    /// Returns the number of info-level diagnostics.
    pub fn info_count(&self) -> usize {
        self.count_severity(DiagnosticSeverity::Info)
    }

    fn count_severity(&self, severity: DiagnosticSeverity) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == severity)
            .count()
    }

    /// Returns an iterator over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns all errors as a vector.
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .collect()
    }

    /// Returns all warnings as a vector.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
            .collect()
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.category == category).collect()
    }

    /// Formats a summary of all diagnostics for display.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let error_count = self.error_count();
        let warning_count = self.warning_count();
        let info_count = self.info_count();

        let _ = writeln!(
            output,
            "Diagnostics: {} error(s), {} warning(s), {} info(s)",
            error_count, warning_count, info_count
        );

        if error_count > 0 {
            output.push_str("\nErrors:\n");
            for diag in self.errors() {
                let _ = writeln!(output, "  {diag}");
            }
        }

        if warning_count > 0 {
            output.push_str("\nWarnings:\n");
            for diag in self.warnings() {
                let _ = writeln!(output, "  {diag}");
            }
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_with_context() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Error,
            DiagnosticCategory::Reference,
            "TypeRef has an infinite resolution scope loop",
        )
        .with_token(Token::new(0x0100_0003))
        .with_table_row(0x01, 3);

        assert_eq!(diag.token, Some(Token::new(0x0100_0003)));
        assert_eq!(diag.table_row, Some((0x01, 3)));

        let display = format!("{}", diag);
        assert!(display.contains("ERROR"));
        assert!(display.contains("Reference"));
        assert!(display.contains("0x01000003"));
    }

    #[test]
    fn test_diagnostics_counts() {
        let diagnostics = Diagnostics::new();
        assert!(!diagnostics.has_any());

        diagnostics.push(
            Diagnostic::new(
                DiagnosticSeverity::Info,
                DiagnosticCategory::Table,
                "Field row 2 holds a placeholder",
            )
            .with_table_row(0x04, 2),
        );
        diagnostics.warning(DiagnosticCategory::Signature, "token moved");
        diagnostics.error(DiagnosticCategory::Field, "field removed");
        diagnostics.error(DiagnosticCategory::Method, "method removed");

        assert_eq!(diagnostics.count(), 4);
        assert_eq!(diagnostics.error_count(), 2);
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.info_count(), 1);
        assert!(diagnostics.has_errors());
        assert!(diagnostics.has_warnings());
        assert_eq!(diagnostics.by_category(DiagnosticCategory::Field).len(), 1);
        assert_eq!(
            diagnostics.by_category(DiagnosticCategory::Table)[0].table_row,
            Some((0x04, 2))
        );
    }

    #[test]
    fn test_diagnostics_summary() {
        let diagnostics = Diagnostics::new();
        diagnostics.warning(DiagnosticCategory::Signature, "Could not preserve token");

        let summary = diagnostics.summary();
        assert!(summary.contains("0 error(s), 1 warning(s)"));
        assert!(summary.contains("Could not preserve token"));
    }
}
