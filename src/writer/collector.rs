//! Member discovery.
//!
//! Walks the ordered types once and registers every field, method, event and property
//! with its owning type row, then every parameter with its owning method row. The walk
//! order is the tie-break for everything the ledgers cannot decide from original rows.

use crate::{
    metadata::{
        diagnostics::{DiagnosticCategory, Diagnostics},
        model::{Event, Field, MethodDef, Param, Property},
        source::OriginalModule,
        tables::TableId,
    },
    writer::{ledger::RidLedger, options::WriterOptions, types::TypeSlot},
    Result,
};

/// The ledgers of all member tables.
#[derive(Debug)]
pub(crate) struct MemberLedgers {
    pub(crate) fields: RidLedger<Field>,
    pub(crate) methods: RidLedger<MethodDef>,
    pub(crate) params: RidLedger<Param>,
    pub(crate) events: RidLedger<Event>,
    pub(crate) properties: RidLedger<Property>,
}

impl MemberLedgers {
    pub(crate) fn new(options: &WriterOptions) -> Self {
        MemberLedgers {
            fields: RidLedger::new(TableId::Field, options.preserves(TableId::Field), false),
            // Param lists are written by walking methods in row order
            methods: RidLedger::new(
                TableId::MethodDef,
                options.preserves(TableId::MethodDef),
                true,
            ),
            params: RidLedger::new(TableId::Param, options.preserves(TableId::Param), false),
            events: RidLedger::new(TableId::Event, options.preserves(TableId::Event), false),
            properties: RidLedger::new(
                TableId::Property,
                options.preserves(TableId::Property),
                false,
            ),
        }
    }

    /// Registers the members of `slots` and fixes the physical rows of every ledger.
    ///
    /// Preserved tables keep at least as many rows as `source` had.
    ///
    /// The owner of a type member is the row of its slot; the owner of a parameter is
    /// the physical row of its method.
    ///
    /// # Errors
    ///
    /// Returns an error if any member table overflows.
    pub(crate) fn collect(
        slots: &[TypeSlot],
        options: &WriterOptions,
        source: &dyn OriginalModule,
        diagnostics: &Diagnostics,
    ) -> Result<Self> {
        let mut ledgers = MemberLedgers::new(options);

        for (i, slot) in slots.iter().enumerate() {
            let TypeSlot::Live(type_def) = slot else {
                continue;
            };
            let owner = i as u32 + 1;

            for (position, field) in type_def.fields().iter().enumerate() {
                if !ledgers.fields.add(field, owner, position as u32) {
                    diagnostics.warning(
                        DiagnosticCategory::Field,
                        format!(
                            "Field '{}' is declared more than once, only its first declaration is written",
                            field.name
                        ),
                    );
                }
            }

            for (position, method) in type_def.methods().iter().enumerate() {
                if !ledgers.methods.add(method, owner, position as u32) {
                    diagnostics.warning(
                        DiagnosticCategory::Method,
                        format!(
                            "Method '{}' is declared more than once, only its first declaration is written",
                            method.name
                        ),
                    );
                }
            }

            // Shared accessors may surface the same event or property twice
            for (position, event) in type_def.events().iter().enumerate() {
                ledgers.events.add(event, owner, position as u32);
            }
            for (position, property) in type_def.properties().iter().enumerate() {
                ledgers.properties.add(property, owner, position as u32);
            }
        }

        ledgers.fields.sort_defs(source.row_count(TableId::Field))?;
        ledgers.methods.sort_defs(source.row_count(TableId::MethodDef))?;
        ledgers.events.sort_defs(source.row_count(TableId::Event))?;
        ledgers.properties.sort_defs(source.row_count(TableId::Property))?;

        let methods: Vec<_> = ledgers
            .methods
            .physical()
            .map(|entry| (entry.item.clone(), entry.rid))
            .collect();
        for (method, rid) in methods {
            for (position, param) in method.params().iter().enumerate() {
                if !ledgers.params.add(param, rid, position as u32) {
                    diagnostics.warning(
                        DiagnosticCategory::Param,
                        format!(
                            "Parameter '{}' of method '{}' is declared more than once, only its first declaration is written",
                            param.name, method.name
                        ),
                    );
                }
            }
        }
        ledgers.params.sort_defs(source.row_count(TableId::Param))?;

        Ok(ledgers)
    }
}
