//! The result of a write pass.

use std::{collections::BTreeMap, sync::Arc};

use strum::IntoEnumIterator;

use crate::{
    metadata::{
        diagnostics::Diagnostics,
        streams::HeapWriter,
        tables::{MetadataTables, TableId, MAX_ROWS},
        token::Token,
    },
    writer::{state::Stage, types::TypeSlot, MetadataWriter},
    Error, Result,
};

/// Pairs of indirection tables and the tables they index.
const PTR_TABLES: [(TableId, TableId); 5] = [
    (TableId::FieldPtr, TableId::Field),
    (TableId::MethodPtr, TableId::MethodDef),
    (TableId::ParamPtr, TableId::Param),
    (TableId::EventPtr, TableId::Event),
    (TableId::PropertyPtr, TableId::Property),
];

/// Tables and heaps produced by a completed write pass.
#[derive(Debug)]
pub struct WriteOutput<H> {
    /// Every table the pass writes.
    pub tables: MetadataTables,
    /// The heaps the rows point into.
    pub heaps: H,
    /// Recoverable problems met during the pass.
    pub diagnostics: Arc<Diagnostics>,
    /// `StandAloneSig` token of the local variables of each `MethodDef` row that has them.
    pub local_var_sigs: BTreeMap<u32, Token>,
    /// Row of the synthetic type owning placeholder members, if one was needed.
    pub placeholder_type: Option<u32>,
}

impl<H: HeapWriter> MetadataWriter<'_, H> {
    /// Ends the pass: sweeps untouched reference rows if that has not happened yet,
    /// validates the tables and hands them out.
    ///
    /// # Errors
    ///
    /// Returns an error if the definitions are not written yet, or if the tables break
    /// an invariant. No output is produced in that case.
    pub fn finish(mut self) -> Result<WriteOutput<H>> {
        self.state.expect(Stage::DefinitionsWritten)?;
        self.sweep_untouched_references()?;
        self.validate()?;
        self.state
            .advance(Stage::DefinitionsWritten, Stage::Finished)?;

        Ok(WriteOutput {
            tables: self.tables,
            heaps: self.heaps,
            diagnostics: self.diagnostics,
            local_var_sigs: self.local_var_sigs,
            placeholder_type: self.placeholder_type,
        })
    }

    fn validate(&self) -> Result<()> {
        // Row 1 goes to the first listed type; it has to be `<Module>`
        let global = self.module.global_type();
        let first = self.slots.first().and_then(TypeSlot::live);
        match (global, first) {
            (Some(global), Some(first)) if Arc::ptr_eq(&global, first) => {}
            (_, first) => {
                return Err(invariant_error!(
                    "The global type of module '{}' is not in TypeDef row 1, found '{}'",
                    self.module.name,
                    first.map_or_else(String::new, |type_def| type_def.fullname())
                ))
            }
        }

        for (ptr, target) in PTR_TABLES {
            let ptr_rows = self.tables.row_count(ptr);
            let target_rows = self.tables.row_count(target);
            if ptr_rows != 0 && ptr_rows != target_rows {
                return Err(invariant_error!(
                    "{:?} has {} rows but {:?} has {}",
                    ptr,
                    ptr_rows,
                    target,
                    target_rows
                ));
            }
        }

        for table in TableId::iter() {
            let rows = self.tables.row_count(table);
            if rows > MAX_ROWS {
                return Err(Error::TableOverflow {
                    table,
                    rows: rows as usize,
                });
            }
        }

        Ok(())
    }
}
