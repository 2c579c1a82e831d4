use std::sync::{Arc, OnceLock};

use crate::metadata::{
    model::{MethodDefRc, Origin, TypeDefRc},
    signatures::{
        MemberRefSignature, SignatureLocalVariables, SignatureMethodSpec, StandAloneSignature,
        TypeSignature,
    },
};

/// A reference to a `TypeRef`
pub type TypeRefRc = Arc<TypeRef>;
/// A reference to a `MemberRef`
pub type MemberRefRc = Arc<MemberRef>;
/// A reference to a `StandAloneSig`
pub type StandAloneSigRc = Arc<StandAloneSig>;
/// A reference to a `TypeSpec`
pub type TypeSpecRc = Arc<TypeSpec>;
/// A reference to a `MethodSpec`
pub type MethodSpecRc = Arc<MethodSpec>;
/// A reference to a `ModuleRef`
pub type ModuleRefRc = Arc<ModuleRef>;
/// A reference to an `AssemblyRef`
pub type AssemblyRefRc = Arc<AssemblyRef>;

/// Where a `TypeRef` is resolved
#[derive(Debug, Clone)]
pub enum ResolutionScope {
    /// The current module
    Module,
    /// Another module of the same assembly
    ModuleRef(ModuleRefRc),
    /// Another assembly
    AssemblyRef(AssemblyRefRc),
    /// The enclosing type of a nested type reference
    TypeRef(TypeRefRc),
}

/// A type named by a `TypeDefOrRef` coded index
#[derive(Debug, Clone)]
pub enum TypeDefOrRef {
    /// A type of this module
    TypeDef(TypeDefRc),
    /// A type of another module
    TypeRef(TypeRefRc),
    /// A constructed type
    TypeSpec(TypeSpecRc),
}

impl PartialEq for TypeDefOrRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeDefOrRef::TypeDef(a), TypeDefOrRef::TypeDef(b)) => Arc::ptr_eq(a, b),
            (TypeDefOrRef::TypeRef(a), TypeDefOrRef::TypeRef(b)) => Arc::ptr_eq(a, b),
            (TypeDefOrRef::TypeSpec(a), TypeDefOrRef::TypeSpec(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The owner of a `MemberRef`
#[derive(Debug, Clone)]
pub enum MemberRefParent {
    /// A type of this module
    TypeDef(TypeDefRc),
    /// A type of another module
    TypeRef(TypeRefRc),
    /// A global member of another module
    ModuleRef(ModuleRefRc),
    /// A vararg call site of a method of this module
    MethodDef(MethodDefRc),
    /// A member of a constructed type
    TypeSpec(TypeSpecRc),
}

/// The generic method of a `MethodSpec`
#[derive(Debug, Clone)]
pub enum MethodDefOrRef {
    /// A method of this module
    MethodDef(MethodDefRc),
    /// A method of another type or module
    MemberRef(MemberRefRc),
}

/// Represents a reference to a type defined elsewhere
pub struct TypeRef {
    /// Where this reference comes from
    pub origin: Origin,
    /// Namespace
    pub namespace: String,
    /// Name
    pub name: String,
    scope: OnceLock<ResolutionScope>,
}

impl TypeRef {
    /// Create a type reference; the scope is set separately so scope chains can be built
    pub fn new(origin: Origin, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeRef {
            origin,
            namespace: namespace.into(),
            name: name.into(),
            scope: OnceLock::new(),
        }
    }

    /// The resolution scope, if set
    pub fn scope(&self) -> Option<&ResolutionScope> {
        self.scope.get()
    }

    /// Set the resolution scope. Returns `false` if it was already set.
    pub fn set_scope(&self, scope: ResolutionScope) -> bool {
        self.scope.set(scope).is_ok()
    }

    /// Returns the full name (Namespace.Name) of the entity
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{0}.{1}", self.namespace, self.name)
        }
    }
}

impl std::fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRef")
            .field("origin", &self.origin)
            .field("name", &self.fullname())
            .finish_non_exhaustive()
    }
}

/// Represents a reference to a field or method of another type or module
#[derive(Debug)]
pub struct MemberRef {
    /// Where this reference comes from
    pub origin: Origin,
    /// Owner of the member
    pub parent: MemberRefParent,
    /// Name
    pub name: String,
    /// Signature
    pub signature: MemberRefSignature,
}

impl MemberRef {
    /// Create a member reference
    pub fn new(
        origin: Origin,
        parent: MemberRefParent,
        name: impl Into<String>,
        signature: MemberRefSignature,
    ) -> Self {
        MemberRef {
            origin,
            parent,
            name: name.into(),
            signature,
        }
    }
}

/// Represents a signature that is not attached to a member
#[derive(Debug)]
pub struct StandAloneSig {
    /// Where this signature comes from
    pub origin: Origin,
    /// Signature
    pub signature: StandAloneSignature,
}

impl StandAloneSig {
    /// Create a stand-alone signature
    pub fn new(origin: Origin, signature: StandAloneSignature) -> Self {
        StandAloneSig { origin, signature }
    }

    /// Create a local variable list of plain locals
    pub fn local_variables(origin: Origin, locals: Vec<TypeSignature>) -> Self {
        StandAloneSig {
            origin,
            signature: StandAloneSignature::LocalVariables(SignatureLocalVariables::new(locals)),
        }
    }
}

/// Represents a constructed type, such as a generic instantiation or an array
pub struct TypeSpec {
    /// Where this type comes from
    pub origin: Origin,
    signature: OnceLock<TypeSignature>,
}

impl TypeSpec {
    /// Create a type specification with `signature`
    pub fn new(origin: Origin, signature: TypeSignature) -> Self {
        let spec = Self::deferred(origin);
        let _ = spec.signature.set(signature);
        spec
    }

    /// Create a type specification whose signature is set later, so it may refer to itself
    pub fn deferred(origin: Origin) -> Self {
        TypeSpec {
            origin,
            signature: OnceLock::new(),
        }
    }

    /// The signature, if set
    pub fn signature(&self) -> Option<&TypeSignature> {
        self.signature.get()
    }

    /// Set the signature. Returns `false` if it was already set.
    pub fn set_signature(&self, signature: TypeSignature) -> bool {
        self.signature.set(signature).is_ok()
    }
}

impl std::fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The signature may contain this very spec
        f.debug_struct("TypeSpec")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Represents an instantiation of a generic method
#[derive(Debug)]
pub struct MethodSpec {
    /// Where this instantiation comes from
    pub origin: Origin,
    /// The generic method
    pub method: MethodDefOrRef,
    /// The generic arguments
    pub instantiation: SignatureMethodSpec,
}

impl MethodSpec {
    /// Create a method instantiation
    pub fn new(origin: Origin, method: MethodDefOrRef, instantiation: SignatureMethodSpec) -> Self {
        MethodSpec {
            origin,
            method,
            instantiation,
        }
    }
}

/// Represents a reference to another module of the assembly
#[derive(Debug)]
pub struct ModuleRef {
    /// Where this reference comes from
    pub origin: Origin,
    /// Module file name
    pub name: String,
}

impl ModuleRef {
    /// Create a module reference
    pub fn new(origin: Origin, name: impl Into<String>) -> Self {
        ModuleRef {
            origin,
            name: name.into(),
        }
    }
}

/// Represents a reference to another assembly
#[derive(Debug)]
pub struct AssemblyRef {
    /// Where this reference comes from
    pub origin: Origin,
    /// Simple name
    pub name: String,
    /// Culture, empty for neutral
    pub culture: String,
    /// major, minor, build, revision
    pub version: [u16; 4],
    /// a 4-byte bitmask of type `AssemblyFlags`
    pub flags: u32,
    /// Public key or public key token
    pub public_key_or_token: Vec<u8>,
    /// Hash of the referenced file
    pub hash_value: Vec<u8>,
}

impl AssemblyRef {
    /// Create an assembly reference without key or hash
    pub fn new(origin: Origin, name: impl Into<String>, version: [u16; 4]) -> Self {
        AssemblyRef {
            origin,
            name: name.into(),
            culture: String::new(),
            version,
            flags: 0,
            public_key_or_token: Vec::new(),
            hash_value: Vec::new(),
        }
    }

    /// Set the public key token
    #[must_use]
    pub fn with_public_key_token(mut self, token: Vec<u8>) -> Self {
        self.public_key_or_token = token;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_scope_cycle_can_be_expressed() {
        let nested = Arc::new(TypeRef::new(Origin::Loaded(4), "", "Inner"));
        assert!(nested.set_scope(ResolutionScope::TypeRef(nested.clone())));
        assert!(!nested.set_scope(ResolutionScope::Module));

        match nested.scope() {
            Some(ResolutionScope::TypeRef(scope)) => assert!(Arc::ptr_eq(scope, &nested)),
            other => panic!("unexpected scope {other:?}"),
        }
    }

    #[test]
    fn test_type_def_or_ref_identity() {
        let a = Arc::new(TypeRef::new(Origin::Loaded(1), "System", "Object"));
        let b = Arc::new(TypeRef::new(Origin::Loaded(1), "System", "Object"));

        assert_eq!(TypeDefOrRef::TypeRef(a.clone()), TypeDefOrRef::TypeRef(a.clone()));
        assert_ne!(TypeDefOrRef::TypeRef(a), TypeDefOrRef::TypeRef(b));
    }

    #[test]
    fn test_deferred_type_spec() {
        let spec = Arc::new(TypeSpec::deferred(Origin::Created));
        assert!(spec.signature().is_none());
        assert!(spec.set_signature(TypeSignature::SzArray(Default::default())));
        assert!(spec.signature().is_some());
    }
}
