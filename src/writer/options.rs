//! Configuration of a write pass.
//!
//! Which tables keep the row indices of the input module is the only decision a caller
//! has to make; everything else follows from the object graph.

use bitflags::bitflags;

use crate::metadata::tables::TableId;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Tables whose original row indices the writer keeps.
    pub struct MetadataFlags: u32 {
        /// Keep `TypeRef` rows.
        const PRESERVE_TYPE_REF_RIDS = 0x0001;
        /// Keep `TypeDef` rows.
        const PRESERVE_TYPE_DEF_RIDS = 0x0002;
        /// Keep `Field` rows.
        const PRESERVE_FIELD_RIDS = 0x0004;
        /// Keep `MethodDef` rows.
        const PRESERVE_METHOD_RIDS = 0x0008;
        /// Keep `Param` rows.
        const PRESERVE_PARAM_RIDS = 0x0010;
        /// Keep `MemberRef` rows.
        const PRESERVE_MEMBER_REF_RIDS = 0x0020;
        /// Keep `StandAloneSig` rows.
        const PRESERVE_STANDALONE_SIG_RIDS = 0x0040;
        /// Keep `Event` rows.
        const PRESERVE_EVENT_RIDS = 0x0080;
        /// Keep `Property` rows.
        const PRESERVE_PROPERTY_RIDS = 0x0100;
        /// Keep `TypeSpec` rows.
        const PRESERVE_TYPE_SPEC_RIDS = 0x0200;
        /// Keep `MethodSpec` rows.
        const PRESERVE_METHOD_SPEC_RIDS = 0x0400;
        /// Keep the rows of every table above.
        const PRESERVE_RIDS = Self::PRESERVE_TYPE_REF_RIDS.bits()
            | Self::PRESERVE_TYPE_DEF_RIDS.bits()
            | Self::PRESERVE_FIELD_RIDS.bits()
            | Self::PRESERVE_METHOD_RIDS.bits()
            | Self::PRESERVE_PARAM_RIDS.bits()
            | Self::PRESERVE_MEMBER_REF_RIDS.bits()
            | Self::PRESERVE_STANDALONE_SIG_RIDS.bits()
            | Self::PRESERVE_EVENT_RIDS.bits()
            | Self::PRESERVE_PROPERTY_RIDS.bits()
            | Self::PRESERVE_TYPE_SPEC_RIDS.bits()
            | Self::PRESERVE_METHOD_SPEC_RIDS.bits();
    }
}

impl Default for MetadataFlags {
    fn default() -> Self {
        MetadataFlags::empty()
    }
}

impl MetadataFlags {
    /// The flag that controls `table`, if the table can be preserved at all.
    #[must_use]
    pub fn for_table(table: TableId) -> Option<MetadataFlags> {
        match table {
            TableId::TypeRef => Some(MetadataFlags::PRESERVE_TYPE_REF_RIDS),
            TableId::TypeDef => Some(MetadataFlags::PRESERVE_TYPE_DEF_RIDS),
            TableId::Field => Some(MetadataFlags::PRESERVE_FIELD_RIDS),
            TableId::MethodDef => Some(MetadataFlags::PRESERVE_METHOD_RIDS),
            TableId::Param => Some(MetadataFlags::PRESERVE_PARAM_RIDS),
            TableId::MemberRef => Some(MetadataFlags::PRESERVE_MEMBER_REF_RIDS),
            TableId::StandAloneSig => Some(MetadataFlags::PRESERVE_STANDALONE_SIG_RIDS),
            TableId::Event => Some(MetadataFlags::PRESERVE_EVENT_RIDS),
            TableId::Property => Some(MetadataFlags::PRESERVE_PROPERTY_RIDS),
            TableId::TypeSpec => Some(MetadataFlags::PRESERVE_TYPE_SPEC_RIDS),
            TableId::MethodSpec => Some(MetadataFlags::PRESERVE_METHOD_SPEC_RIDS),
            _ => None,
        }
    }
}

/// Configuration for a metadata write pass.
///
/// The default preserves nothing, which renumbers every table densely in traversal
/// order. Use [`WriterOptions::preserve_all`] to keep every token the input module had.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriterOptions {
    /// Tables whose rows keep their original index.
    pub flags: MetadataFlags,
}

impl WriterOptions {
    /// Creates options with an explicit set of flags.
    #[must_use]
    pub fn new(flags: MetadataFlags) -> Self {
        WriterOptions { flags }
    }

    /// Keep the original row of every preservable table.
    #[must_use]
    pub fn preserve_all() -> Self {
        WriterOptions {
            flags: MetadataFlags::PRESERVE_RIDS,
        }
    }

    /// Renumber every table.
    #[must_use]
    pub fn preserve_none() -> Self {
        WriterOptions {
            flags: MetadataFlags::empty(),
        }
    }

    /// Returns `true` if rows of `table` keep their original index.
    #[must_use]
    pub fn preserves(&self, table: TableId) -> bool {
        MetadataFlags::for_table(table).is_some_and(|flag| self.flags.contains(flag))
    }
}
