//! # Coded Index Types Module
//!
//! Coded indices combine a table identifier and row index into a single value by using the
//! lower bits to encode which table type is being referenced, and the remaining bits for
//! the actual row index. Table rows store the decoded [`CodedIndex`]; the tag bits are only
//! computed when a value is written, for example into a signature blob.
//!
//! ## References
//!
//! - [ECMA-335 Standard](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Section II.24.2.6

use strum::{EnumCount, EnumIter};

use crate::{
    metadata::{tables::TableId, token::Token},
    Error, Result,
};

/// The coded index combinations used by the tables the writer emits.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, EnumIter, EnumCount)]
#[repr(usize)]
pub enum CodedIndexType {
    /// References `TypeDef`, `TypeRef`, or `TypeSpec` tables.
    ///
    /// Used for base types, event types, and every class or value type inside a signature.
    TypeDefOrRef,

    /// References `TypeDef`, `TypeRef`, `ModuleRef`, `MethodDef`, or `TypeSpec` tables.
    ///
    /// Used as the parent reference for member references.
    MemberRefParent,

    /// References `MethodDef` or `MemberRef` tables.
    ///
    /// Used by method specifications to name the generic method being instantiated.
    MethodDefOrRef,

    /// References `Module`, `ModuleRef`, `AssemblyRef`, or `TypeRef` tables.
    ///
    /// Used to specify the scope in which a type reference should be resolved.
    ResolutionScope,
}

impl CodedIndexType {
    /// Returns the array of table IDs that can be referenced by this coded index type.
    ///
    /// The order of tables in the returned slice corresponds to the encoded tag values.
    #[must_use]
    pub fn tables(&self) -> &'static [TableId] {
        match self {
            CodedIndexType::TypeDefOrRef => {
                &[TableId::TypeDef, TableId::TypeRef, TableId::TypeSpec]
            }
            CodedIndexType::MemberRefParent => &[
                TableId::TypeDef,
                TableId::TypeRef,
                TableId::ModuleRef,
                TableId::MethodDef,
                TableId::TypeSpec,
            ],
            CodedIndexType::MethodDefOrRef => &[TableId::MethodDef, TableId::MemberRef],
            CodedIndexType::ResolutionScope => &[
                TableId::Module,
                TableId::ModuleRef,
                TableId::AssemblyRef,
                TableId::TypeRef,
            ],
        }
    }

    /// Number of low bits used for the tag.
    #[must_use]
    pub fn tag_bits(&self) -> u32 {
        let count = self.tables().len() as u32;
        u32::BITS - (count - 1).leading_zeros()
    }
}

/// A decoded representation of a coded index value.
///
/// ## Fields
///
/// - `tag`: The specific metadata table being referenced
/// - `row`: The 1-based row index within that table, 0 for a null reference
/// - `token`: The computed metadata token for direct table access
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CodedIndex {
    /// The [`TableId`] this index is referring to.
    pub tag: TableId,

    /// The row ID that this `CodedIndex` is pointing to.
    pub row: u32,

    /// The computed metadata token for this coded index.
    pub token: Token,
}

impl CodedIndex {
    /// Creates a new `CodedIndex` with the specified table and row.
    ///
    /// ## Arguments
    ///
    /// * `tag` - The [`TableId`] specifying which metadata table is being referenced
    /// * `row` - The 1-based row index within the specified table
    #[must_use]
    pub fn new(tag: TableId, row: u32) -> CodedIndex {
        CodedIndex {
            tag,
            row,
            token: Token::from_parts(tag, row),
        }
    }

    /// Creates the null reference of a coded index kind.
    ///
    /// The tag is the first table of `ci_type`, which encodes to the value 0.
    #[must_use]
    pub fn null(ci_type: CodedIndexType) -> CodedIndex {
        CodedIndex::new(ci_type.tables()[0], 0)
    }

    /// Returns `true` if this index does not point at any row.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row == 0
    }

    /// Encodes this index as a coded value of `ci_type`.
    ///
    /// A null index always encodes to 0.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Invariant`] if `tag` is not one of the tables `ci_type`
    /// can reference, or if the row does not fit next to the tag bits.
    pub fn encode(&self, ci_type: CodedIndexType) -> Result<u32> {
        if self.row == 0 {
            return Ok(0);
        }

        let Some(tag) = ci_type.tables().iter().position(|table| *table == self.tag) else {
            return Err(invariant_error!(
                "Table {:?} cannot be referenced by a {:?} coded index",
                self.tag,
                ci_type
            ));
        };

        let bits = ci_type.tag_bits();
        if self.row > (u32::MAX >> bits) {
            return Err(invariant_error!(
                "Row {} is too large for a {:?} coded index",
                self.row,
                ci_type
            ));
        }

        Ok((self.row << bits) | tag as u32)
    }
}

impl TryFrom<Token> for CodedIndex {
    type Error = Error;

    /// Converts a Token to a CodedIndex.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is null or contains an unrecognized table type.
    fn try_from(token: Token) -> Result<Self> {
        if token.is_null() {
            return Err(invariant_error!("Cannot convert null token to CodedIndex"));
        }

        let table = TableId::try_from(token.table())?;
        Ok(CodedIndex::new(table, token.row()))
    }
}
