//! Token-preserving metadata table writer.
//!
//! [`MetadataWriter`] turns the live object graph of a [`Module`] into metadata table rows
//! while keeping as many of the input module's tokens as the configured
//! [`WriterOptions`] ask for. External code (debuggers, reflection call sites, string
//! decryptors injected by protectors) often addresses entries by raw token, so a rewrite
//! that renumbers rows silently breaks it.
//!
//! # Architecture
//!
//! A pass is a strictly ordered pipeline:
//!
//! 1. [`MetadataWriter::allocate_type_rows`] orders the types (global type first, original
//!    types at their original rows with dummy types filling deleted rows, new types last)
//!    and reserves the rows of preserved reference tables.
//! 2. [`MetadataWriter::allocate_member_rows`] collects every field, method, parameter,
//!    event and property into a [`RidLedger`], fixes physical rows, computes the logical
//!    order, fills the ptr tables where the two disagree, writes the list columns and
//!    fabricates placeholder rows for originals that were deleted.
//! 3. [`MetadataWriter::write_definitions`] fills the definition rows. References met on
//!    the way (base types, signature types, local variable signatures) are resolved on
//!    demand through the `add_*` entry points.
//! 4. [`MetadataWriter::sweep_untouched_references`] re-adds every original reference row
//!    nothing in the graph reached, so hidden rows do not vanish.
//! 5. [`MetadataWriter::finish`] validates the tables and hands out a [`WriteOutput`].
//!
//! Fatal conditions abort the pass with [`crate::Error`]; recoverable ones are collected
//! in the [`Diagnostics`] shared through [`MetadataWriter::diagnostics`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotscope_preserve::prelude::*;
//!
//! # fn write(module: &Module, source: &SourceModule) -> dotscope_preserve::Result<()> {
//! let mut writer = MetadataWriter::new(module, source, HeapBuilder::new(), WriterOptions::preserve_all());
//! writer.run()?;
//! let output = writer.finish()?;
//!
//! println!("{} TypeDef rows", output.tables.type_def.row_count());
//! for diagnostic in output.diagnostics.iter() {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok(())
//! # }
//! ```

mod attributes;
mod collector;
mod definitions;
mod ledger;
mod members;
mod options;
mod output;
mod progress;
mod reconcile;
mod resolver;
mod state;
mod types;

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

pub use attributes::{AttributeSink, NoAttributes, RecordingSink};
pub use ledger::{by_owner, LedgerEntry, RidLedger};
pub use options::{MetadataFlags, WriterOptions};
pub use output::WriteOutput;
pub use progress::{ProgressFn, WritePhase};
pub use state::{Stage, SweptTables};
pub use types::TypeSlot;

use crate::{
    metadata::{
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
        model::{MetadataObject, Module, ObjectKey, Origin},
        source::OriginalModule,
        streams::HeapWriter,
        tables::{MetadataTables, TableId},
        token::Token,
    },
    Result,
};
use collector::MemberLedgers;
use progress::Progress;
use resolver::ReferenceLedgers;
use state::PassState;

/// One token-preserving write pass over a module.
///
/// The writer borrows the module and the accessor of the input module for the whole
/// pass, owns the heaps and tables it produces, and discards all bookkeeping in
/// [`MetadataWriter::finish`].
pub struct MetadataWriter<'a, H: HeapWriter> {
    module: &'a Module,
    source: &'a dyn OriginalModule,
    options: WriterOptions,
    heaps: H,
    tables: MetadataTables,
    diagnostics: Arc<Diagnostics>,
    state: PassState,
    progress: Progress<'a>,
    sink: Option<Box<dyn AttributeSink + 'a>>,
    slots: Vec<TypeSlot>,
    type_rids: HashMap<ObjectKey, u32>,
    members: MemberLedgers,
    refs: ReferenceLedgers,
    standalone_claims: HashMap<u32, Vec<u8>>,
    local_var_sigs: BTreeMap<u32, Token>,
    placeholder_type: Option<u32>,
}

impl<'a, H: HeapWriter> MetadataWriter<'a, H> {
    /// Creates a writer for `module`, which was loaded from `source`.
    ///
    /// ## Arguments
    /// * `module` - The edited module to write
    /// * `source` - Rows of the module the edit session started from
    /// * `heaps`  - String and blob heap the rows point into
    /// * `options` - Which tables keep their original rows
    pub fn new(
        module: &'a Module,
        source: &'a dyn OriginalModule,
        heaps: H,
        options: WriterOptions,
    ) -> Self {
        MetadataWriter {
            module,
            source,
            options,
            heaps,
            tables: MetadataTables::new(),
            diagnostics: Arc::new(Diagnostics::new()),
            state: PassState::new(),
            progress: Progress::default(),
            sink: None,
            slots: Vec::new(),
            type_rids: HashMap::new(),
            members: MemberLedgers::new(&options),
            refs: ReferenceLedgers::new(),
            standalone_claims: HashMap::new(),
            local_var_sigs: BTreeMap::new(),
            placeholder_type: None,
        }
    }

    /// Notify `sink` of every row handed out.
    #[must_use]
    pub fn with_attribute_sink(mut self, sink: impl AttributeSink + 'a) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Report progress to `observer`.
    #[must_use]
    pub fn with_progress(mut self, observer: impl FnMut(WritePhase, f64) + 'a) -> Self {
        self.progress.set(Box::new(observer));
        self
    }

    /// Report recoverable problems into `diagnostics` instead of a private collector.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// The collector recoverable problems are reported to.
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// The options this pass runs with.
    #[must_use]
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// How far the pass has progressed.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    /// The tables produced so far.
    #[must_use]
    pub fn tables(&self) -> &MetadataTables {
        &self.tables
    }

    /// The heaps the rows point into.
    #[must_use]
    pub fn heaps(&self) -> &H {
        &self.heaps
    }

    /// The types in `TypeDef` row order, available once types are allocated.
    #[must_use]
    pub fn type_slots(&self) -> &[TypeSlot] {
        &self.slots
    }

    /// Runs every stage of the pass up to and including the reference sweep.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage hits a fatal condition, or if some stage already ran.
    pub fn run(&mut self) -> Result<()> {
        self.allocate_type_rows()?;
        self.allocate_member_rows()?;
        self.write_definitions()?;
        self.sweep_untouched_references()
    }

    /// The final token of `object`, if it has been assigned a row.
    ///
    /// This is a lookup only; it never allocates a row or reports a diagnostic.
    #[must_use]
    pub fn token(&self, object: &MetadataObject) -> Option<Token> {
        let rid = match object {
            MetadataObject::TypeDef(item) => self.type_rids.get(&ObjectKey::of(item)).copied(),
            MetadataObject::Field(item) => self.members.fields.try_rid(item),
            MetadataObject::MethodDef(item) => self.members.methods.try_rid(item),
            MetadataObject::Param(item) => self.members.params.try_rid(item),
            MetadataObject::Event(item) => self.members.events.try_rid(item),
            MetadataObject::Property(item) => self.members.properties.try_rid(item),
            MetadataObject::TypeRef(item) => self.refs.type_refs.get(item),
            MetadataObject::MemberRef(item) => self.refs.member_refs.get(item),
            MetadataObject::StandAloneSig(item) => self.refs.standalone_sigs.get(item),
            MetadataObject::TypeSpec(item) => self.refs.type_specs.get(item),
            MetadataObject::MethodSpec(item) => self.refs.method_specs.get(item),
            MetadataObject::ModuleRef(item) => self.refs.module_refs.get(item),
            MetadataObject::AssemblyRef(item) => self.refs.assembly_refs.get(item),
        }?;

        (rid != 0).then(|| Token::from_parts(object.table(), rid))
    }

    /// Tells the attribute sink that `object` lives at `rid` of `table`.
    fn notify(&mut self, object: &MetadataObject, table: TableId, rid: u32) {
        if let Some(sink) = self.sink.as_mut() {
            sink.copy_attributes(object, table, rid);
        }
    }

    /// Reports a live reference to a definition that is not part of the module.
    fn report_missing(&self, category: DiagnosticCategory, kind: &str, name: &str, origin: Origin) {
        let message = format!(
            "{kind} '{name}' is not defined in this module. A {} was removed that is still referenced by this module.",
            kind.to_lowercase()
        );
        let mut diagnostic = Diagnostic::new(DiagnosticSeverity::Error, category, message);
        if let Some(table) = table_of(category) {
            if origin.is_loaded() {
                diagnostic = diagnostic.with_token(Token::from_parts(table, origin.original_rid()));
            }
        }
        self.diagnostics.push(diagnostic);
    }
}

fn table_of(category: DiagnosticCategory) -> Option<TableId> {
    match category {
        DiagnosticCategory::Type => Some(TableId::TypeDef),
        DiagnosticCategory::Field => Some(TableId::Field),
        DiagnosticCategory::Method => Some(TableId::MethodDef),
        DiagnosticCategory::Param => Some(TableId::Param),
        DiagnosticCategory::Event => Some(TableId::Event),
        DiagnosticCategory::Property => Some(TableId::Property),
        _ => None,
    }
}
