//! The live object graph of a module under edit.
//!
//! Every definable or referenceable entity lives behind an `Arc`, and identity is the
//! allocation, never the contents: two fields with the same name and signature are still
//! two fields. Each object records its [`Origin`], which is how the writer tells entries
//! that came from the input module (and may keep their row) from entries created by the
//! edit session.
//!
//! Member collections are lock-protected so an edit session can insert and delete through
//! shared references, as the loaders of the original graph do. A write pass assumes the
//! graph is not mutated while it runs.
//!
//! # Key Components
//!
//! - [`Module`] - Root of the graph, owns the type list
//! - Definitions: [`TypeDef`], [`Field`], [`MethodDef`], [`Param`], [`Event`], [`Property`]
//! - References: [`TypeRef`], [`MemberRef`], [`StandAloneSig`], [`TypeSpec`], [`MethodSpec`],
//!   [`ModuleRef`], [`AssemblyRef`]
//! - [`MetadataObject`] - Any of the above, used at the accessor and attribute seams
//! - [`ObjectKey`] - Identity key derived from the `Arc` allocation

mod definitions;
mod references;

use std::sync::Arc;

pub use definitions::*;
pub use references::*;

use crate::metadata::{tables::TableId, token::Token};

/// Where a graph object comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Read from the input module at the given row.
    Loaded(u32),
    /// Added by the edit session.
    Created,
}

impl Origin {
    /// The row the object had in the input module, 0 for created objects.
    #[must_use]
    pub fn original_rid(&self) -> u32 {
        match self {
            Origin::Loaded(rid) => *rid,
            Origin::Created => 0,
        }
    }

    /// Returns `true` if the object was read from the input module.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Origin::Loaded(rid) if *rid != 0)
    }
}

/// Access to the [`Origin`] of a graph object.
pub trait HasOrigin {
    /// Where this object comes from.
    fn origin(&self) -> Origin;
}

/// Identity of a graph object, the address of its shared allocation.
///
/// Only meaningful while the `Arc` is alive; the writer holds a clone of every object it
/// has keyed for the duration of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(usize);

impl ObjectKey {
    /// Key of the object behind `item`.
    #[must_use]
    pub fn of<T>(item: &Arc<T>) -> Self {
        ObjectKey(Arc::as_ptr(item).cast::<()>() as usize)
    }
}

macro_rules! impl_has_origin {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HasOrigin for $ty {
                fn origin(&self) -> Origin {
                    self.origin
                }
            }
        )*
    };
}

impl_has_origin!(
    TypeDef,
    Field,
    MethodDef,
    Param,
    Event,
    Property,
    TypeRef,
    MemberRef,
    StandAloneSig,
    TypeSpec,
    MethodSpec,
    ModuleRef,
    AssemblyRef,
);

/// Any object that can own a metadata row.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum MetadataObject {
    TypeDef(TypeDefRc),
    Field(FieldRc),
    MethodDef(MethodDefRc),
    Param(ParamRc),
    Event(EventRc),
    Property(PropertyRc),
    TypeRef(TypeRefRc),
    MemberRef(MemberRefRc),
    StandAloneSig(StandAloneSigRc),
    TypeSpec(TypeSpecRc),
    MethodSpec(MethodSpecRc),
    ModuleRef(ModuleRefRc),
    AssemblyRef(AssemblyRefRc),
}

impl MetadataObject {
    /// The table rows of this kind of object live in.
    #[must_use]
    pub fn table(&self) -> TableId {
        match self {
            MetadataObject::TypeDef(_) => TableId::TypeDef,
            MetadataObject::Field(_) => TableId::Field,
            MetadataObject::MethodDef(_) => TableId::MethodDef,
            MetadataObject::Param(_) => TableId::Param,
            MetadataObject::Event(_) => TableId::Event,
            MetadataObject::Property(_) => TableId::Property,
            MetadataObject::TypeRef(_) => TableId::TypeRef,
            MetadataObject::MemberRef(_) => TableId::MemberRef,
            MetadataObject::StandAloneSig(_) => TableId::StandAloneSig,
            MetadataObject::TypeSpec(_) => TableId::TypeSpec,
            MetadataObject::MethodSpec(_) => TableId::MethodSpec,
            MetadataObject::ModuleRef(_) => TableId::ModuleRef,
            MetadataObject::AssemblyRef(_) => TableId::AssemblyRef,
        }
    }

    /// Identity key of the wrapped object.
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        match self {
            MetadataObject::TypeDef(item) => ObjectKey::of(item),
            MetadataObject::Field(item) => ObjectKey::of(item),
            MetadataObject::MethodDef(item) => ObjectKey::of(item),
            MetadataObject::Param(item) => ObjectKey::of(item),
            MetadataObject::Event(item) => ObjectKey::of(item),
            MetadataObject::Property(item) => ObjectKey::of(item),
            MetadataObject::TypeRef(item) => ObjectKey::of(item),
            MetadataObject::MemberRef(item) => ObjectKey::of(item),
            MetadataObject::StandAloneSig(item) => ObjectKey::of(item),
            MetadataObject::TypeSpec(item) => ObjectKey::of(item),
            MetadataObject::MethodSpec(item) => ObjectKey::of(item),
            MetadataObject::ModuleRef(item) => ObjectKey::of(item),
            MetadataObject::AssemblyRef(item) => ObjectKey::of(item),
        }
    }

    /// Origin of the wrapped object.
    #[must_use]
    pub fn origin(&self) -> Origin {
        match self {
            MetadataObject::TypeDef(item) => item.origin,
            MetadataObject::Field(item) => item.origin,
            MetadataObject::MethodDef(item) => item.origin,
            MetadataObject::Param(item) => item.origin,
            MetadataObject::Event(item) => item.origin,
            MetadataObject::Property(item) => item.origin,
            MetadataObject::TypeRef(item) => item.origin,
            MetadataObject::MemberRef(item) => item.origin,
            MetadataObject::StandAloneSig(item) => item.origin,
            MetadataObject::TypeSpec(item) => item.origin,
            MetadataObject::MethodSpec(item) => item.origin,
            MetadataObject::ModuleRef(item) => item.origin,
            MetadataObject::AssemblyRef(item) => item.origin,
        }
    }

    /// The token the object had in the input module, if it was loaded.
    #[must_use]
    pub fn original_token(&self) -> Option<Token> {
        match self.origin() {
            Origin::Loaded(rid) if rid != 0 => Some(Token::from_parts(self.table(), rid)),
            _ => None,
        }
    }

    /// Returns `true` if both wrap the very same object.
    #[must_use]
    pub fn is_same(&self, other: &MetadataObject) -> bool {
        self.table() == other.table() && self.key() == other.key()
    }
}

macro_rules! impl_from_rc {
    ($($variant:ident => $rc:ty),* $(,)?) => {
        $(
            impl From<$rc> for MetadataObject {
                fn from(item: $rc) -> Self {
                    MetadataObject::$variant(item)
                }
            }
        )*
    };
}

impl_from_rc!(
    TypeDef => TypeDefRc,
    Field => FieldRc,
    MethodDef => MethodDefRc,
    Param => ParamRc,
    Event => EventRc,
    Property => PropertyRc,
    TypeRef => TypeRefRc,
    MemberRef => MemberRefRc,
    StandAloneSig => StandAloneSigRc,
    TypeSpec => TypeSpecRc,
    MethodSpec => MethodSpecRc,
    ModuleRef => ModuleRefRc,
    AssemblyRef => AssemblyRefRc,
);
