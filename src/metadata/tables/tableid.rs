use strum::{EnumCount, EnumIter};

use crate::{Error, Result};

/// Identifiers for the metadata tables the writer produces or references.
///
/// The numeric values correspond to the table IDs as defined in the CLI specification and
/// form the high byte of every [`crate::metadata::token::Token`].
///
/// ## Table Categories
///
/// ### Definitions (owned ranges)
/// - **`TypeDef`**: Type definitions, owning contiguous field and method ranges
/// - **`Field`**, **`MethodDef`**: Members owned by a type
/// - **`Param`**: Parameters owned by a method
/// - **`Event`**, **`Property`**: Members owned through `EventMap` / `PropertyMap`
///
/// ### Indirection
/// - **`FieldPtr`**, **`MethodPtr`**, **`ParamPtr`**, **`EventPtr`**, **`PropertyPtr`**:
///   logical position to physical row mapping, present only when needed
///
/// ### References
/// - **`TypeRef`**, **`MemberRef`**, **`StandAloneSig`**, **`TypeSpec`**, **`MethodSpec`**
/// - **`ModuleRef`**, **`AssemblyRef`**: resolution scopes, appended on demand
///
/// ## Reference
/// * [ECMA-335 Partition II, Section 22](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Metadata Tables
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TableId {
    /// `Module` table (0x00) - The single row describing the module itself.
    #[default]
    Module = 0x00,

    /// `TypeRef` table (0x01) - References to types defined in other modules or assemblies.
    TypeRef = 0x01,

    /// `TypeDef` table (0x02) - Definitions of types within this module.
    ///
    /// Row 1 is always the module-level global type.
    TypeDef = 0x02,

    /// `FieldPtr` table (0x03) - Indirection for the `Field` table.
    FieldPtr = 0x03,

    /// `Field` table (0x04) - Field definitions, owned by `TypeDef` rows through `field_list`.
    Field = 0x04,

    /// `MethodPtr` table (0x05) - Indirection for the `MethodDef` table.
    MethodPtr = 0x05,

    /// `MethodDef` table (0x06) - Method definitions, owned by `TypeDef` rows through `method_list`.
    MethodDef = 0x06,

    /// `ParamPtr` table (0x07) - Indirection for the `Param` table.
    ParamPtr = 0x07,

    /// `Param` table (0x08) - Parameter definitions, owned by `MethodDef` rows through `param_list`.
    Param = 0x08,

    /// `MemberRef` table (0x0A) - References to fields and methods of other types.
    MemberRef = 0x0A,

    /// `StandAloneSig` table (0x11) - Signatures not attached to a member, mostly local variable lists.
    StandAloneSig = 0x11,

    /// `EventMap` table (0x12) - Maps a type to the first of its events.
    EventMap = 0x12,

    /// `EventPtr` table (0x13) - Indirection for the `Event` table.
    EventPtr = 0x13,

    /// `Event` table (0x14) - Event definitions.
    Event = 0x14,

    /// `PropertyMap` table (0x15) - Maps a type to the first of its properties.
    PropertyMap = 0x15,

    /// `PropertyPtr` table (0x16) - Indirection for the `Property` table.
    PropertyPtr = 0x16,

    /// `Property` table (0x17) - Property definitions.
    Property = 0x17,

    /// `ModuleRef` table (0x1A) - References to other modules of the same assembly.
    ModuleRef = 0x1A,

    /// `TypeSpec` table (0x1B) - Constructed types described by a signature blob.
    TypeSpec = 0x1B,

    /// `AssemblyRef` table (0x23) - References to other assemblies.
    AssemblyRef = 0x23,

    /// `MethodSpec` table (0x2B) - Generic method instantiations.
    MethodSpec = 0x2B,
}

impl TableId {
    /// Returns the indirection table that maps logical positions into this table, if any.
    #[must_use]
    pub fn ptr_table(&self) -> Option<TableId> {
        match self {
            TableId::Field => Some(TableId::FieldPtr),
            TableId::MethodDef => Some(TableId::MethodPtr),
            TableId::Param => Some(TableId::ParamPtr),
            TableId::Event => Some(TableId::EventPtr),
            TableId::Property => Some(TableId::PropertyPtr),
            _ => None,
        }
    }

    /// Returns the token prefix (the table id shifted into the high byte).
    #[must_use]
    pub fn token_prefix(&self) -> u32 {
        (*self as u32) << 24
    }
}

impl TryFrom<u8> for TableId {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        let table = match value {
            0x00 => TableId::Module,
            0x01 => TableId::TypeRef,
            0x02 => TableId::TypeDef,
            0x03 => TableId::FieldPtr,
            0x04 => TableId::Field,
            0x05 => TableId::MethodPtr,
            0x06 => TableId::MethodDef,
            0x07 => TableId::ParamPtr,
            0x08 => TableId::Param,
            0x0A => TableId::MemberRef,
            0x11 => TableId::StandAloneSig,
            0x12 => TableId::EventMap,
            0x13 => TableId::EventPtr,
            0x14 => TableId::Event,
            0x15 => TableId::PropertyMap,
            0x16 => TableId::PropertyPtr,
            0x17 => TableId::Property,
            0x1A => TableId::ModuleRef,
            0x1B => TableId::TypeSpec,
            0x23 => TableId::AssemblyRef,
            0x2B => TableId::MethodSpec,
            _ => return Err(invariant_error!("Unknown table ID: 0x{:02x}", value)),
        };

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_try_from_roundtrips_every_table() {
        for table in TableId::iter() {
            assert_eq!(TableId::try_from(table as u8).unwrap(), table);
        }
        assert!(TableId::try_from(0x09).is_err());
    }

    #[test]
    fn test_ptr_tables() {
        assert_eq!(TableId::Field.ptr_table(), Some(TableId::FieldPtr));
        assert_eq!(TableId::Property.ptr_table(), Some(TableId::PropertyPtr));
        assert_eq!(TableId::TypeDef.ptr_table(), None);
        assert_eq!(TableId::StandAloneSig.token_prefix(), 0x1100_0000);
    }
}
