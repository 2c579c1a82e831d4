//! Placeholder rows for deleted originals.
//!
//! With preservation on, a member table keeps as many rows as its highest surviving
//! original row needs. Rows whose original was deleted are owned by nobody, which the
//! format only tolerates if every row is reachable through the ptr table. Each such row
//! is filled with a minimal placeholder and attached to one synthetic type appended at
//! the end of the `TypeDef` table, so no real type's range is disturbed.
//!
//! Parameters have no type to hang off, so each orphan parameter gets a synthetic method
//! of its own. That is why parameters are reconciled strictly after methods.

use sha1::{Digest, Sha1};
use uguid::Guid;

use crate::{
    metadata::{
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity},
        model::HasOrigin,
        signatures::{CALLING_CONVENTION, ELEMENT_TYPE, SIGNATURE_HEADER},
        streams::HeapWriter,
        tables::{
            CodedIndex, EventMapRaw, EventPtrRaw, EventRaw, FieldPtrRaw, FieldRaw, MethodDefRaw,
            MethodPtrRaw, ParamPtrRaw, ParamRaw, PropertyMapRaw, PropertyPtrRaw, PropertyRaw,
            TableId, TypeDefRaw,
        },
    },
    writer::{ledger::RidLedger, MetadataWriter},
    Result,
};

/// `Abstract`
pub(crate) const PLACEHOLDER_TYPE_FLAGS: u32 = 0x0080;
/// `Public | Static`
const PLACEHOLDER_FIELD_FLAGS: u32 = 0x0016;
/// `Public | Virtual | HideBySig | NewSlot | Abstract`
const PLACEHOLDER_METHOD_FLAGS: u32 = 0x05C6;

const FIELD_SIGNATURE: [u8; 2] = [SIGNATURE_HEADER::FIELD, ELEMENT_TYPE::U1];
const METHOD_SIGNATURE: [u8; 3] = [CALLING_CONVENTION::HASTHIS, 0x00, ELEMENT_TYPE::VOID];
const PROPERTY_SIGNATURE: [u8; 3] = [SIGNATURE_HEADER::PROPERTY, 0x00, ELEMENT_TYPE::OBJECT];

/// Name-based GUID for a synthetic type, stable for a given module, purpose and row.
pub(crate) fn placeholder_guid(mvid: &Guid, tag: &str, rid: u32) -> Guid {
    let mut hasher = Sha1::new();
    hasher.update(mvid.to_bytes());
    hasher.update(tag.as_bytes());
    hasher.update(rid.to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    // Version 5, RFC 4122 variant
    bytes[7] = (bytes[7] & 0x0F) | 0x50;
    bytes[8] = (bytes[8] & 0x3F) | 0x80;
    Guid::from_bytes(bytes)
}

/// `{guid}` name of a synthetic type.
pub(crate) fn placeholder_type_name(mvid: &Guid, tag: &str, rid: u32) -> String {
    format!("{{{}}}", placeholder_guid(mvid, tag, rid))
}

/// Rows in `1..=size` no entry of `ledger` occupies.
fn orphan_rows<T: HasOrigin>(ledger: &RidLedger<T>, size: u32) -> Vec<u32> {
    let mut owned = vec![false; size as usize + 1];
    for entry in ledger.physical() {
        if let Some(slot) = owned.get_mut(entry.rid as usize) {
            *slot = true;
        }
    }
    (1..=size).filter(|&rid| !owned[rid as usize]).collect()
}

impl<H: HeapWriter> MetadataWriter<'_, H> {
    /// Row of the synthetic owner type, created on first use.
    fn placeholder_type(&mut self) -> Result<u32> {
        if let Some(rid) = self.placeholder_type {
            return Ok(rid);
        }

        let field_list = if self.members.fields.need_ptr() {
            self.tables.field_ptr.row_count()
        } else {
            self.tables.field.row_count()
        } + 1;
        let method_list = if self.members.methods.need_ptr() {
            self.tables.method_ptr.row_count()
        } else {
            self.tables.method_def.row_count()
        } + 1;

        let object = self.object_type()?;
        let rid = self.tables.type_def.row_count() + 1;
        let type_name = self
            .heaps
            .intern_string(&placeholder_type_name(&self.module.mvid, "dummy_ptr", rid))?;
        let type_namespace = self.heaps.intern_string("dummy_ptr")?;

        let created = self.tables.type_def.create(TypeDefRaw {
            flags: PLACEHOLDER_TYPE_FLAGS,
            type_name,
            type_namespace,
            extends: object,
            field_list,
            method_list,
        })?;
        if created == 1 {
            return Err(invariant_error!(
                "The placeholder type cannot take row 1, which belongs to the global type"
            ));
        }

        self.placeholder_type = Some(created);
        Ok(created)
    }

    /// `TypeDefOrRef` index of the core library's `System.Object`.
    pub(crate) fn object_type(&mut self) -> Result<CodedIndex> {
        let object = self.module.corlib_object.clone();
        let rid = self.add_type_ref(&object)?;
        Ok(CodedIndex::new(TableId::TypeRef, rid))
    }

    fn report_placeholder(&self, table: TableId, rid: u32) {
        self.diagnostics.push(
            Diagnostic::new(
                DiagnosticSeverity::Info,
                DiagnosticCategory::Table,
                format!("{table:?} row {rid} lost its original owner and holds a placeholder"),
            )
            .with_table_row(table as u8, rid),
        );
    }

    fn check_ptr_size(&self, ptr: TableId, target: TableId) -> Result<()> {
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
        Ok(())
    }

    pub(crate) fn reconcile_fields(&mut self) -> Result<()> {
        let size = self.members.fields.table_size();
        if !self.members.fields.need_ptr() || self.tables.field_ptr.row_count() == size {
            return Ok(());
        }

        for rid in orphan_rows(&self.members.fields, size) {
            self.placeholder_type()?;
            let name = self.heaps.intern_string(&format!("f{rid:06X}"))?;
            let signature = self.heaps.intern_blob(&FIELD_SIGNATURE)?;
            self.tables.field.set(
                rid,
                FieldRaw {
                    flags: PLACEHOLDER_FIELD_FLAGS,
                    name,
                    signature,
                },
            )?;
            self.tables.field_ptr.create(FieldPtrRaw { field: rid })?;
            self.report_placeholder(TableId::Field, rid);
        }

        self.check_ptr_size(TableId::FieldPtr, TableId::Field)
    }

    pub(crate) fn reconcile_methods(&mut self) -> Result<()> {
        let size = self.members.methods.table_size();
        if !self.members.methods.need_ptr() || self.tables.method_ptr.row_count() == size {
            return Ok(());
        }

        for rid in orphan_rows(&self.members.methods, size) {
            self.placeholder_type()?;
            let name = self.heaps.intern_string(&format!("m{rid:06X}"))?;
            let signature = self.heaps.intern_blob(&METHOD_SIGNATURE)?;
            // param_list keeps the empty range computed for this row
            let row = self.tables.method_def.get_mut(rid)?;
            row.rva = 0;
            row.impl_flags = 0;
            row.flags = PLACEHOLDER_METHOD_FLAGS;
            row.name = name;
            row.signature = signature;
            self.tables.method_ptr.create(MethodPtrRaw { method: rid })?;
            self.report_placeholder(TableId::MethodDef, rid);
        }

        self.check_ptr_size(TableId::MethodPtr, TableId::MethodDef)
    }

    pub(crate) fn reconcile_params(&mut self) -> Result<()> {
        let size = self.members.params.table_size();
        if !self.members.params.need_ptr() || self.tables.param_ptr.row_count() == size {
            return Ok(());
        }

        for rid in orphan_rows(&self.members.params, size) {
            self.placeholder_type()?;
            let name = self.heaps.intern_string(&format!("p{rid:06X}"))?;
            self.tables.param.set(
                rid,
                ParamRaw {
                    flags: 0,
                    sequence: 0,
                    name,
                },
            )?;
            let param_list = self.tables.param_ptr.create(ParamPtrRaw { param: rid })?;
            self.report_placeholder(TableId::Param, rid);

            let method_name = self.heaps.intern_string(&format!("mp{rid:06X}"))?;
            let signature = self.heaps.intern_blob(&METHOD_SIGNATURE)?;
            let method = self.tables.method_def.create(MethodDefRaw {
                rva: 0,
                impl_flags: 0,
                flags: PLACEHOLDER_METHOD_FLAGS,
                name: method_name,
                signature,
                param_list,
            })?;
            if self.members.methods.need_ptr() {
                self.tables.method_ptr.create(MethodPtrRaw { method })?;
            }
        }

        self.check_ptr_size(TableId::ParamPtr, TableId::Param)?;
        self.check_ptr_size(TableId::MethodPtr, TableId::MethodDef)
    }

    pub(crate) fn reconcile_events(&mut self) -> Result<()> {
        let size = self.members.events.table_size();
        if !self.members.events.need_ptr() || self.tables.event_ptr.row_count() == size {
            return Ok(());
        }

        let mut mapped = false;
        for rid in orphan_rows(&self.members.events, size) {
            if !mapped {
                let parent = self.placeholder_type()?;
                let event_list = self.tables.event_ptr.row_count() + 1;
                self.tables
                    .event_map
                    .create(EventMapRaw { parent, event_list })?;
                mapped = true;
            }

            let event_type = self.object_type()?;
            let name = self.heaps.intern_string(&format!("E{rid:06X}"))?;
            self.tables.event.set(
                rid,
                EventRaw {
                    flags: 0,
                    name,
                    event_type,
                },
            )?;
            self.tables.event_ptr.create(EventPtrRaw { event: rid })?;
            self.report_placeholder(TableId::Event, rid);
        }

        self.check_ptr_size(TableId::EventPtr, TableId::Event)
    }

    pub(crate) fn reconcile_properties(&mut self) -> Result<()> {
        let size = self.members.properties.table_size();
        if !self.members.properties.need_ptr() || self.tables.property_ptr.row_count() == size {
            return Ok(());
        }

        let mut mapped = false;
        for rid in orphan_rows(&self.members.properties, size) {
            if !mapped {
                let parent = self.placeholder_type()?;
                let property_list = self.tables.property_ptr.row_count() + 1;
                self.tables.property_map.create(PropertyMapRaw {
                    parent,
                    property_list,
                })?;
                mapped = true;
            }

            let name = self.heaps.intern_string(&format!("P{rid:06X}"))?;
            let signature = self.heaps.intern_blob(&PROPERTY_SIGNATURE)?;
            self.tables.property.set(
                rid,
                PropertyRaw {
                    flags: 0,
                    name,
                    signature,
                },
            )?;
            self.tables
                .property_ptr
                .create(PropertyPtrRaw { property: rid })?;
            self.report_placeholder(TableId::Property, rid);
        }

        self.check_ptr_size(TableId::PropertyPtr, TableId::Property)
    }
}
