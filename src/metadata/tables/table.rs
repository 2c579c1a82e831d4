//! In-memory row store for the tables produced by a write pass.
//!
//! [`MetadataTable`] is a 1-indexed, append-only collection of fixed-shape rows. Rows can be
//! created at the end or overwritten in place; they are never removed or reordered, which
//! is what keeps a row index stable once it has been handed out.

use std::slice::Iter;

use crate::{
    metadata::tables::{
        AssemblyRefRaw, EventMapRaw, EventPtrRaw, EventRaw, FieldPtrRaw, FieldRaw, MemberRefRaw,
        MethodDefRaw, MethodPtrRaw, MethodSpecRaw, ModuleRefRaw, ParamPtrRaw, ParamRaw,
        PropertyMapRaw, PropertyPtrRaw, PropertyRaw, StandAloneSigRaw, TableId, TypeDefRaw,
        TypeRefRaw, TypeSpecRaw,
    },
    Error, Result,
};

/// Largest row index a metadata token can carry.
pub const MAX_ROWS: u32 = 0x00FF_FFFF;

/// A single metadata table under construction.
#[derive(Debug, Clone)]
pub struct MetadataTable<R> {
    id: TableId,
    rows: Vec<R>,
}

impl<R> MetadataTable<R> {
    /// Creates an empty table.
    #[must_use]
    pub fn new(id: TableId) -> Self {
        MetadataTable {
            id,
            rows: Vec::new(),
        }
    }

    /// The table this store holds rows for.
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Appends `row` and returns its row index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableOverflow`] if the table already holds [`MAX_ROWS`] rows.
    pub fn create(&mut self, row: R) -> Result<u32> {
        if self.rows.len() >= MAX_ROWS as usize {
            return Err(Error::TableOverflow {
                table: self.id,
                rows: self.rows.len() + 1,
            });
        }

        self.rows.push(row);
        Ok(self.rows.len() as u32)
    }

    /// Overwrites the row at `rid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRid`] if `rid` is 0 or beyond the last row.
    pub fn set(&mut self, rid: u32, row: R) -> Result<()> {
        let slot = self.slot_mut(rid)?;
        *slot = row;
        Ok(())
    }

    /// Returns the row at `rid`, or `None` if it has not been created.
    #[must_use]
    pub fn get(&self, rid: u32) -> Option<&R> {
        if rid == 0 {
            return None;
        }
        self.rows.get(rid as usize - 1)
    }

    /// Returns a mutable reference to the row at `rid`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRid`] if `rid` is 0 or beyond the last row.
    pub fn get_mut(&mut self, rid: u32) -> Result<&mut R> {
        self.slot_mut(rid)
    }

    fn slot_mut(&mut self, rid: u32) -> Result<&mut R> {
        let table = self.id;
        if rid == 0 {
            return Err(Error::InvalidRid { table, rid });
        }
        self.rows
            .get_mut(rid as usize - 1)
            .ok_or(Error::InvalidRid { table, rid })
    }

    /// Number of rows currently in the table.
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Returns `true` if no row has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates rows in row index order.
    pub fn iter(&self) -> Iter<'_, R> {
        self.rows.iter()
    }

    /// All rows as a slice, row index `n` at position `n - 1`.
    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }
}

impl<'a, R> IntoIterator for &'a MetadataTable<R> {
    type Item = &'a R;
    type IntoIter = Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// The full set of tables written by one pass.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct MetadataTables {
    pub type_ref: MetadataTable<TypeRefRaw>,
    pub type_def: MetadataTable<TypeDefRaw>,
    pub field_ptr: MetadataTable<FieldPtrRaw>,
    pub field: MetadataTable<FieldRaw>,
    pub method_ptr: MetadataTable<MethodPtrRaw>,
    pub method_def: MetadataTable<MethodDefRaw>,
    pub param_ptr: MetadataTable<ParamPtrRaw>,
    pub param: MetadataTable<ParamRaw>,
    pub member_ref: MetadataTable<MemberRefRaw>,
    pub standalone_sig: MetadataTable<StandAloneSigRaw>,
    pub event_map: MetadataTable<EventMapRaw>,
    pub event_ptr: MetadataTable<EventPtrRaw>,
    pub event: MetadataTable<EventRaw>,
    pub property_map: MetadataTable<PropertyMapRaw>,
    pub property_ptr: MetadataTable<PropertyPtrRaw>,
    pub property: MetadataTable<PropertyRaw>,
    pub module_ref: MetadataTable<ModuleRefRaw>,
    pub type_spec: MetadataTable<TypeSpecRaw>,
    pub assembly_ref: MetadataTable<AssemblyRefRaw>,
    pub method_spec: MetadataTable<MethodSpecRaw>,
}

impl Default for MetadataTables {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataTables {
    /// Creates an empty set of tables.
    #[must_use]
    pub fn new() -> Self {
        MetadataTables {
            type_ref: MetadataTable::new(TableId::TypeRef),
            type_def: MetadataTable::new(TableId::TypeDef),
            field_ptr: MetadataTable::new(TableId::FieldPtr),
            field: MetadataTable::new(TableId::Field),
            method_ptr: MetadataTable::new(TableId::MethodPtr),
            method_def: MetadataTable::new(TableId::MethodDef),
            param_ptr: MetadataTable::new(TableId::ParamPtr),
            param: MetadataTable::new(TableId::Param),
            member_ref: MetadataTable::new(TableId::MemberRef),
            standalone_sig: MetadataTable::new(TableId::StandAloneSig),
            event_map: MetadataTable::new(TableId::EventMap),
            event_ptr: MetadataTable::new(TableId::EventPtr),
            event: MetadataTable::new(TableId::Event),
            property_map: MetadataTable::new(TableId::PropertyMap),
            property_ptr: MetadataTable::new(TableId::PropertyPtr),
            property: MetadataTable::new(TableId::Property),
            module_ref: MetadataTable::new(TableId::ModuleRef),
            type_spec: MetadataTable::new(TableId::TypeSpec),
            assembly_ref: MetadataTable::new(TableId::AssemblyRef),
            method_spec: MetadataTable::new(TableId::MethodSpec),
        }
    }

    /// Row count of `table`. The `Module` table always has exactly one row.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        match table {
            TableId::Module => 1,
            TableId::TypeRef => self.type_ref.row_count(),
            TableId::TypeDef => self.type_def.row_count(),
            TableId::FieldPtr => self.field_ptr.row_count(),
            TableId::Field => self.field.row_count(),
            TableId::MethodPtr => self.method_ptr.row_count(),
            TableId::MethodDef => self.method_def.row_count(),
            TableId::ParamPtr => self.param_ptr.row_count(),
            TableId::Param => self.param.row_count(),
            TableId::MemberRef => self.member_ref.row_count(),
            TableId::StandAloneSig => self.standalone_sig.row_count(),
            TableId::EventMap => self.event_map.row_count(),
            TableId::EventPtr => self.event_ptr.row_count(),
            TableId::Event => self.event.row_count(),
            TableId::PropertyMap => self.property_map.row_count(),
            TableId::PropertyPtr => self.property_ptr.row_count(),
            TableId::Property => self.property.row_count(),
            TableId::ModuleRef => self.module_ref.row_count(),
            TableId::TypeSpec => self.type_spec.row_count(),
            TableId::AssemblyRef => self.assembly_ref.row_count(),
            TableId::MethodSpec => self.method_spec.row_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_set() {
        let mut table = MetadataTable::<FieldRaw>::new(TableId::Field);
        assert!(table.is_empty());

        assert_eq!(table.create(FieldRaw::default()).unwrap(), 1);
        assert_eq!(table.create(FieldRaw::default()).unwrap(), 2);
        assert_eq!(table.row_count(), 2);

        table
            .set(
                2,
                FieldRaw {
                    flags: 0x16,
                    name: 7,
                    signature: 3,
                },
            )
            .unwrap();
        assert_eq!(table.get(2).unwrap().flags, 0x16);
        assert_eq!(table.get(1).unwrap(), &FieldRaw::default());
        assert!(table.get(0).is_none());
        assert!(table.get(3).is_none());
    }

    #[test]
    fn test_set_invalid_rid() {
        let mut table = MetadataTable::<TypeSpecRaw>::new(TableId::TypeSpec);
        table.create(TypeSpecRaw::default()).unwrap();

        assert!(matches!(
            table.set(0, TypeSpecRaw::default()),
            Err(Error::InvalidRid { rid: 0, .. })
        ));
        assert!(matches!(
            table.set(2, TypeSpecRaw::default()),
            Err(Error::InvalidRid {
                table: TableId::TypeSpec,
                rid: 2
            })
        ));
    }

    #[test]
    fn test_tables_row_count() {
        let mut tables = MetadataTables::new();
        tables.event_map.create(EventMapRaw::default()).unwrap();
        assert_eq!(tables.row_count(TableId::EventMap), 1);
        assert_eq!(tables.row_count(TableId::Event), 0);
        assert_eq!(tables.row_count(TableId::Module), 1);
    }
}
