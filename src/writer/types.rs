//! `TypeDef` ordering and row reservation.
//!
//! The type table is ordered before anything else because every member table hangs off
//! it through list columns. The global type always takes row 1. With `TypeDef`
//! preservation on, original types keep their row, and a deleted original leaves a dummy
//! type behind so no surviving type has to move.

use std::collections::HashSet;

use crate::{
    metadata::{
        diagnostics::{DiagnosticCategory, Diagnostics},
        model::{Module, ObjectKey, TypeDefRc},
        streams::HeapWriter,
        tables::{
            MemberRefRaw, MethodSpecRaw, StandAloneSigRaw, TableId, TypeDefRaw, TypeRefRaw,
            TypeSpecRaw, MAX_ROWS,
        },
    },
    writer::{progress::WritePhase, state::Stage, MetadataWriter},
    Error, Result,
};

/// Reference tables whose original rows are reserved up front when preserved.
pub(crate) const PRESERVED_REFERENCE_TABLES: [TableId; 5] = [
    TableId::TypeRef,
    TableId::MemberRef,
    TableId::StandAloneSig,
    TableId::TypeSpec,
    TableId::MethodSpec,
];

/// One row of the `TypeDef` table.
#[derive(Debug, Clone)]
pub enum TypeSlot {
    /// A type of the module.
    Live(TypeDefRc),
    /// An empty type standing in for a deleted original.
    Dummy,
}

impl TypeSlot {
    /// The type in this slot, `None` for dummies.
    #[must_use]
    pub fn live(&self) -> Option<&TypeDefRc> {
        match self {
            TypeSlot::Live(type_def) => Some(type_def),
            TypeSlot::Dummy => None,
        }
    }
}

/// Orders the types of `module` into `TypeDef` rows.
///
/// # Errors
///
/// Returns an error if the module has no global type, or if the ordering needs more rows
/// than a token can address.
pub(crate) fn order_types(
    module: &Module,
    preserve: bool,
    diagnostics: &Diagnostics,
) -> Result<Vec<TypeSlot>> {
    let types = module.types();
    let Some(global) = types.first() else {
        return Err(invariant_error!(
            "Module '{}' has no types, the global type is missing",
            module.name
        ));
    };

    let mut seen = HashSet::new();
    seen.insert(ObjectKey::of(global));

    let mut unique = Vec::with_capacity(types.len());
    for type_def in types.iter().skip(1) {
        if seen.insert(ObjectKey::of(type_def)) {
            unique.push(type_def.clone());
        } else {
            diagnostics.warning(
                DiagnosticCategory::Type,
                format!(
                    "Type '{}' is listed more than once in the module",
                    type_def.fullname()
                ),
            );
        }
    }

    let mut slots = Vec::with_capacity(unique.len() + 1);
    slots.push(TypeSlot::Live(global.clone()));

    if preserve {
        // Row 1 always belongs to the global type
        let mut claimed = HashSet::from([1u32]);
        let mut loaded = Vec::new();
        let mut created = Vec::new();
        for type_def in unique {
            let rid = type_def.origin.original_rid();
            if type_def.origin.is_loaded() && rid <= MAX_ROWS && claimed.insert(rid) {
                loaded.push((rid, type_def));
            } else {
                created.push(type_def);
            }
        }
        loaded.sort_by_key(|(rid, _)| *rid);

        let mut prev = 1u32;
        for (rid, type_def) in loaded {
            for _ in 0..rid.saturating_sub(prev + 1) {
                slots.push(TypeSlot::Dummy);
            }
            slots.push(TypeSlot::Live(type_def));
            prev = rid;
        }
        slots.extend(created.into_iter().map(TypeSlot::Live));
    } else {
        slots.extend(unique.into_iter().map(TypeSlot::Live));
    }

    if slots.len() > MAX_ROWS as usize {
        return Err(Error::TableOverflow {
            table: TableId::TypeDef,
            rows: slots.len(),
        });
    }

    Ok(slots)
}

impl<H: HeapWriter> MetadataWriter<'_, H> {
    /// Orders the types, creates one empty `TypeDef` row per type and reserves the
    /// original rows of every preserved reference table.
    ///
    /// Must be the first entry point called.
    ///
    /// # Errors
    ///
    /// Returns an error if called out of order, if the module has no types, or if a
    /// table would overflow.
    pub fn allocate_type_rows(&mut self) -> Result<()> {
        self.state.expect(Stage::Created)?;
        self.progress.report(WritePhase::AllocateTypes, 0, 1);

        for table in PRESERVED_REFERENCE_TABLES {
            if self.options.preserves(table) {
                let rows = self.source.row_count(table);
                self.reserve_rows(table, rows)?;
            }
        }

        let preserve = self.options.preserves(TableId::TypeDef);
        self.slots = order_types(self.module, preserve, &self.diagnostics)?;

        for (i, slot) in self.slots.iter().enumerate() {
            let expected = i as u32 + 1;
            let rid = self.tables.type_def.create(TypeDefRaw::default())?;
            if rid != expected {
                return Err(invariant_error!(
                    "TypeDef row {} was allocated for slot {}",
                    rid,
                    expected
                ));
            }
            if let TypeSlot::Live(type_def) = slot {
                self.type_rids.insert(ObjectKey::of(type_def), rid);
            }
        }

        self.progress.report(WritePhase::AllocateTypes, 1, 1);
        self.state.advance(Stage::Created, Stage::TypesAllocated)
    }

    /// `TypeDef` row of `type_def`.
    ///
    /// Returns 0 and reports an error diagnostic if the type is not part of the module.
    pub fn type_def_rid(&self, type_def: &TypeDefRc) -> u32 {
        if let Some(rid) = self.type_rids.get(&ObjectKey::of(type_def)) {
            return *rid;
        }

        self.report_missing(
            DiagnosticCategory::Type,
            "Type",
            &type_def.fullname(),
            type_def.origin,
        );
        0
    }

    /// Returns `true` if `type_def` has a `TypeDef` row.
    #[must_use]
    pub fn has_type(&self, type_def: &TypeDefRc) -> bool {
        self.type_rids.contains_key(&ObjectKey::of(type_def))
    }

    fn reserve_rows(&mut self, table: TableId, rows: u32) -> Result<()> {
        for _ in 0..rows {
            match table {
                TableId::TypeRef => self.tables.type_ref.create(TypeRefRaw::default())?,
                TableId::MemberRef => self.tables.member_ref.create(MemberRefRaw::default())?,
                TableId::StandAloneSig => self
                    .tables
                    .standalone_sig
                    .create(StandAloneSigRaw::default())?,
                TableId::TypeSpec => self.tables.type_spec.create(TypeSpecRaw::default())?,
                TableId::MethodSpec => self.tables.method_spec.create(MethodSpecRaw::default())?,
                _ => {
                    return Err(invariant_error!(
                        "Rows of table {:?} cannot be reserved",
                        table
                    ))
                }
            };
        }
        Ok(())
    }
}
