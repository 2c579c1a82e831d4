//! Member row allocation: empty rows, ptr tables and list columns.

use std::collections::HashMap;

use crate::{
    metadata::{
        diagnostics::DiagnosticCategory,
        model::{EventRc, FieldRc, HasOrigin, MethodDefRc, ParamRc, PropertyRc},
        streams::HeapWriter,
        tables::{
            EventMapRaw, EventPtrRaw, EventRaw, FieldPtrRaw, FieldRaw, MetadataTable,
            MethodDefRaw, MethodPtrRaw, ParamPtrRaw, ParamRaw, PropertyMapRaw, PropertyPtrRaw,
            PropertyRaw,
        },
    },
    writer::{
        collector::MemberLedgers,
        ledger::{by_owner, RidLedger},
        progress::WritePhase,
        state::Stage,
        MetadataWriter,
    },
    Result,
};

const MEMBER_STEPS: u32 = 5;

/// Creates `size` empty rows in `table`, checking each lands where expected.
fn create_rows<R: Default>(table: &mut MetadataTable<R>, size: u32) -> Result<()> {
    for expected in 1..=size {
        let rid = table.create(R::default())?;
        if rid != expected {
            return Err(invariant_error!(
                "{:?} row {} was allocated where row {} was expected",
                table.id(),
                rid,
                expected
            ));
        }
    }
    Ok(())
}

/// Writes the logical order of `ledger` into its ptr table, if it needs one.
fn fill_ptr<T: HasOrigin, R>(
    ledger: &RidLedger<T>,
    ptr: &mut MetadataTable<R>,
    make: impl Fn(u32) -> R,
) -> Result<()> {
    if !ledger.need_ptr() {
        return Ok(());
    }
    for entry in ledger.logical() {
        ptr.create(make(entry.rid))?;
    }
    Ok(())
}

impl<H: HeapWriter> MetadataWriter<'_, H> {
    /// Collects and sorts every member, creates its rows, fills the ptr tables and list
    /// columns, and fabricates placeholder rows for deleted originals.
    ///
    /// Must run once, right after [`MetadataWriter::allocate_type_rows`].
    ///
    /// # Errors
    ///
    /// Returns an error if called out of order, if a table overflows, or if a bookkeeping
    /// invariant breaks while allocating.
    pub fn allocate_member_rows(&mut self) -> Result<()> {
        self.state.expect(Stage::TypesAllocated)?;

        self.members = MemberLedgers::collect(&self.slots, &self.options, self.source, &self.diagnostics)?;
        self.progress
            .report(WritePhase::AllocateMembers, 0, MEMBER_STEPS);

        create_rows::<FieldRaw>(&mut self.tables.field, self.members.fields.table_size())?;
        create_rows::<MethodDefRaw>(
            &mut self.tables.method_def,
            self.members.methods.table_size(),
        )?;
        create_rows::<ParamRaw>(&mut self.tables.param, self.members.params.table_size())?;
        create_rows::<EventRaw>(&mut self.tables.event, self.members.events.table_size())?;
        create_rows::<PropertyRaw>(
            &mut self.tables.property,
            self.members.properties.table_size(),
        )?;

        self.members.fields.sort_by(by_owner);
        self.members.methods.sort_by(by_owner);
        self.members.params.sort_by(by_owner);
        self.members.events.sort_by(by_owner);
        self.members.properties.sort_by(by_owner);
        self.progress
            .report(WritePhase::AllocateMembers, 1, MEMBER_STEPS);

        fill_ptr(&self.members.fields, &mut self.tables.field_ptr, |field| {
            FieldPtrRaw { field }
        })?;
        fill_ptr(&self.members.methods, &mut self.tables.method_ptr, |method| {
            MethodPtrRaw { method }
        })?;
        fill_ptr(&self.members.params, &mut self.tables.param_ptr, |param| {
            ParamPtrRaw { param }
        })?;
        fill_ptr(&self.members.events, &mut self.tables.event_ptr, |event| {
            EventPtrRaw { event }
        })?;
        fill_ptr(
            &self.members.properties,
            &mut self.tables.property_ptr,
            |property| PropertyPtrRaw { property },
        )?;
        self.progress
            .report(WritePhase::AllocateMembers, 2, MEMBER_STEPS);

        self.write_type_lists()?;
        self.write_param_lists()?;
        self.write_event_map()?;
        self.write_property_map()?;
        self.progress
            .report(WritePhase::AllocateMembers, 3, MEMBER_STEPS);

        self.reconcile_fields()?;
        self.reconcile_methods()?;
        self.reconcile_params()?;
        self.progress
            .report(WritePhase::AllocateMembers, 4, MEMBER_STEPS);

        self.reconcile_events()?;
        self.reconcile_properties()?;
        self.progress
            .report(WritePhase::AllocateMembers, 5, MEMBER_STEPS);
        self.state
            .advance(Stage::TypesAllocated, Stage::MembersAllocated)
    }

    /// `field_list` and `method_list` of every type, as running starts in logical order.
    fn write_type_lists(&mut self) -> Result<()> {
        let field_counts = self.members.fields.owner_counts();
        let method_counts = self.members.methods.owner_counts();

        let mut field_list = 1u32;
        let mut method_list = 1u32;
        for rid in 1..=self.tables.type_def.row_count() {
            let row = self.tables.type_def.get_mut(rid)?;
            row.field_list = field_list;
            row.method_list = method_list;
            field_list += field_counts.get(&rid).copied().unwrap_or(0);
            method_list += method_counts.get(&rid).copied().unwrap_or(0);
        }
        Ok(())
    }

    /// `param_list` of every method row, including rows of deleted methods.
    fn write_param_lists(&mut self) -> Result<()> {
        let param_counts = self.members.params.owner_counts();

        let mut param_list = 1u32;
        for rid in 1..=self.members.methods.table_size() {
            let row = self.tables.method_def.get_mut(rid)?;
            row.param_list = param_list;
            // A deleted method owns no parameters
            if self.members.methods.by_rid(rid).is_some() {
                param_list += param_counts.get(&rid).copied().unwrap_or(0);
            }
        }
        Ok(())
    }

    fn write_event_map(&mut self) -> Result<()> {
        if !self.tables.event_map.is_empty() {
            return Err(invariant_error!(
                "EventMap already has {} rows before event lists are written",
                self.tables.event_map.row_count()
            ));
        }

        let mut owner = 0;
        for entry in self.members.events.logical() {
            if entry.owner != owner {
                owner = entry.owner;
                self.tables.event_map.create(EventMapRaw {
                    parent: owner,
                    event_list: entry.logical,
                })?;
            }
        }
        Ok(())
    }

    fn write_property_map(&mut self) -> Result<()> {
        if !self.tables.property_map.is_empty() {
            return Err(invariant_error!(
                "PropertyMap already has {} rows before property lists are written",
                self.tables.property_map.row_count()
            ));
        }

        let mut owner = 0;
        for entry in self.members.properties.logical() {
            if entry.owner != owner {
                owner = entry.owner;
                self.tables.property_map.create(PropertyMapRaw {
                    parent: owner,
                    property_list: entry.logical,
                })?;
            }
        }
        Ok(())
    }

    /// `Field` row of `field`.
    ///
    /// Returns 0 and reports an error diagnostic if the field is not part of the module.
    pub fn field_rid(&self, field: &FieldRc) -> u32 {
        self.members.fields.try_rid(field).unwrap_or_else(|| {
            self.report_missing(DiagnosticCategory::Field, "Field", &field.name, field.origin);
            0
        })
    }

    /// `MethodDef` row of `method`.
    ///
    /// Returns 0 and reports an error diagnostic if the method is not part of the module.
    pub fn method_rid(&self, method: &MethodDefRc) -> u32 {
        self.members.methods.try_rid(method).unwrap_or_else(|| {
            self.report_missing(
                DiagnosticCategory::Method,
                "Method",
                &method.name,
                method.origin,
            );
            0
        })
    }

    /// `Param` row of `param`.
    ///
    /// Returns 0 and reports an error diagnostic if the parameter is not part of the module.
    pub fn param_rid(&self, param: &ParamRc) -> u32 {
        self.members.params.try_rid(param).unwrap_or_else(|| {
            self.report_missing(DiagnosticCategory::Param, "Param", &param.name, param.origin);
            0
        })
    }

    /// `Event` row of `event`.
    ///
    /// Returns 0 and reports an error diagnostic if the event is not part of the module.
    pub fn event_rid(&self, event: &EventRc) -> u32 {
        self.members.events.try_rid(event).unwrap_or_else(|| {
            self.report_missing(DiagnosticCategory::Event, "Event", &event.name, event.origin);
            0
        })
    }

    /// `Property` row of `property`.
    ///
    /// Returns 0 and reports an error diagnostic if the property is not part of the module.
    pub fn property_rid(&self, property: &PropertyRc) -> u32 {
        self.members.properties.try_rid(property).unwrap_or_else(|| {
            self.report_missing(
                DiagnosticCategory::Property,
                "Property",
                &property.name,
                property.origin,
            );
            0
        })
    }

    /// Number of fields and methods each type row owns, for inspection.
    #[must_use]
    pub fn member_counts(&self) -> (HashMap<u32, u32>, HashMap<u32, u32>) {
        (
            self.members.fields.owner_counts(),
            self.members.methods.owner_counts(),
        )
    }
}
