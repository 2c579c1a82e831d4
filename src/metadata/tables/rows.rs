//! Raw row layouts of the tables the writer emits.
//!
//! Rows only carry numbers: heap offsets for names and signatures, plain row indices for
//! lists, and [`CodedIndex`] values for polymorphic references. Every row type implements
//! `Default`, which is the empty row the writer reserves before it knows the contents.

use crate::metadata::tables::CodedIndex;

/// The `TypeRef` table row. `TableId` = 0x01
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeRefRaw {
    /// an index into a `Module`, `ModuleRef`, `AssemblyRef` or `TypeRef` table; more precisely, a `ResolutionScope`
    pub resolution_scope: CodedIndex,
    /// an index into the String heap
    pub type_name: u32,
    /// an index into the String heap
    pub type_namespace: u32,
}

/// The `TypeDef` table row. `TableId` = 0x02
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeDefRaw {
    /// a 4-byte bitmask of type `TypeAttributes`
    pub flags: u32,
    /// an index into the String heap
    pub type_name: u32,
    /// an index into the String heap
    pub type_namespace: u32,
    /// an index into the `TypeDef`, `TypeRef`, or `TypeSpec` table; more precisely, a `TypeDefOrRef`
    pub extends: CodedIndex,
    /// an index into the Field table; it marks the first of a contiguous run of Fields owned by this Type
    pub field_list: u32,
    /// an index into the `MethodDef` table; it marks the first of a contiguous run of Methods owned by this Type
    pub method_list: u32,
}

/// The `FieldPtr` table row. `TableId` = 0x03
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPtrRaw {
    /// an index into the `Field` table
    pub field: u32,
}

/// The `Field` table row. `TableId` = 0x04
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldRaw {
    /// a 2-byte bitmask of type `FieldAttributes`
    pub flags: u32,
    /// an index into the String heap
    pub name: u32,
    /// an index into the Blob heap
    pub signature: u32,
}

/// The `MethodPtr` table row. `TableId` = 0x05
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MethodPtrRaw {
    /// an index into the `MethodDef` table
    pub method: u32,
}

/// The `MethodDef` table row. `TableId` = 0x06
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MethodDefRaw {
    /// a 4-byte constant, the RVA of the method body; owned by the body writer
    pub rva: u32,
    /// a 2-byte bitmask of type `MethodImplAttributes`
    pub impl_flags: u32,
    /// a 2-byte bitmask of type `MethodAttributes`
    pub flags: u32,
    /// an index into the String heap
    pub name: u32,
    /// an index into the Blob heap
    pub signature: u32,
    /// an index into the Param table; it marks the first of a contiguous run of Parameters owned by this method
    pub param_list: u32,
}

/// The `ParamPtr` table row. `TableId` = 0x07
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamPtrRaw {
    /// an index into the `Param` table
    pub param: u32,
}

/// The `Param` table row. `TableId` = 0x08
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamRaw {
    /// a 2-byte bitmask of type `ParamAttributes`
    pub flags: u32,
    /// a 2-byte constant, 0 for the return value
    pub sequence: u32,
    /// an index into the String heap
    pub name: u32,
}

/// The `MemberRef` table row. `TableId` = 0x0A
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberRefRaw {
    /// an index into the `TypeDef`, `TypeRef`, `ModuleRef`, `MethodDef` or `TypeSpec` table; more precisely, a `MemberRefParent`
    pub class: CodedIndex,
    /// an index into the String heap
    pub name: u32,
    /// an index into the Blob heap
    pub signature: u32,
}

/// The `StandAloneSig` table row. `TableId` = 0x11
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StandAloneSigRaw {
    /// an index into the Blob heap
    pub signature: u32,
}

/// The `EventMap` table row. `TableId` = 0x12
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventMapRaw {
    /// an index into the `TypeDef` table
    pub parent: u32,
    /// an index into the Event table; it marks the first of a contiguous run of Events owned by this Type
    pub event_list: u32,
}

/// The `EventPtr` table row. `TableId` = 0x13
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventPtrRaw {
    /// an index into the `Event` table
    pub event: u32,
}

/// The `Event` table row. `TableId` = 0x14
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventRaw {
    /// a 2-byte bitmask of type `EventAttributes`
    pub flags: u32,
    /// an index into the String heap
    pub name: u32,
    /// an index into a `TypeDef`, a `TypeRef`, or `TypeSpec` table; more precisely, a `TypeDefOrRef`
    pub event_type: CodedIndex,
}

/// The `PropertyMap` table row. `TableId` = 0x15
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyMapRaw {
    /// an index into the `TypeDef` table
    pub parent: u32,
    /// an index into the Property table; it marks the first of a contiguous run of Properties owned by this Type
    pub property_list: u32,
}

/// The `PropertyPtr` table row. `TableId` = 0x16
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyPtrRaw {
    /// an index into the `Property` table
    pub property: u32,
}

/// The `Property` table row. `TableId` = 0x17
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyRaw {
    /// a 2-byte bitmask of type `PropertyAttributes`
    pub flags: u32,
    /// an index into the String heap
    pub name: u32,
    /// an index into the Blob heap
    pub signature: u32,
}

/// The `ModuleRef` table row. `TableId` = 0x1A
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleRefRaw {
    /// an index into the String heap
    pub name: u32,
}

/// The `TypeSpec` table row. `TableId` = 0x1B
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSpecRaw {
    /// an index into the Blob heap
    pub signature: u32,
}

/// The `AssemblyRef` table row. `TableId` = 0x23
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssemblyRefRaw {
    /// a 2-byte constant
    pub major_version: u32,
    /// a 2-byte constant
    pub minor_version: u32,
    /// a 2-byte constant
    pub build_number: u32,
    /// a 2-byte constant
    pub revision_number: u32,
    /// a 4-byte bitmask of type `AssemblyFlags`
    pub flags: u32,
    /// an index into the Blob heap
    pub public_key_or_token: u32,
    /// an index into the String heap
    pub name: u32,
    /// an index into the String heap
    pub culture: u32,
    /// an index into the Blob heap
    pub hash_value: u32,
}

/// The `MethodSpec` table row. `TableId` = 0x2B
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MethodSpecRaw {
    /// an index into the `MethodDef` or `MemberRef` table; more precisely, a `MethodDefOrRef`
    pub method: CodedIndex,
    /// an index into the Blob heap
    pub instantiation: u32,
}
