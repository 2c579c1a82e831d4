use crate::metadata::model::TypeDefOrRef;

/// Represents a type in various signatures
///
/// Class and value types point at graph objects rather than tokens, so the writer can
/// decide their row when the signature is encoded.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypeSignature {
    /// void
    #[default]
    Void,
    /// bool
    Boolean,
    /// char
    Char,
    /// signed 8bit integer
    I1,
    /// unsigned 8bit integer
    U1,
    /// signed 16bit integer
    I2,
    /// unsigned 16bit integer
    U2,
    /// signed 32bit integer
    I4,
    /// unsigned 32bit integer
    U4,
    /// signed 64bit integer
    I8,
    /// unsigned 64bit integer
    U8,
    /// 32bit floating-point
    R4,
    /// 64bit floating-point
    R8,
    /// System.String
    String,
    /// A pointer to a type
    Ptr(SignaturePointer),
    /// Type by reference
    ByRef(Box<TypeSignature>),
    /// CIL value-type
    ValueType(TypeDefOrRef),
    /// CIL Class
    Class(TypeDefOrRef),
    /// Generic type parameter
    GenericParamType(u32),
    /// Array
    Array(SignatureArray),
    /// Generic type and its arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    /// Type is referenced during runtime
    TypedByRef,
    /// signed integer, sized to executing platform
    I,
    /// unsigned integer, sized to executing platform
    U,
    /// Function pointer
    FnPtr(Box<SignatureMethod>),
    /// System.Object
    Object,
    /// Single dimension array
    SzArray(SignatureSzArray),
    /// Generic method parameter
    GenericParamMethod(u32),
    /// A pinned type
    Pinned(Box<TypeSignature>),
}

/// A required or optional custom modifier
#[derive(Debug, Clone, PartialEq)]
pub struct CustomModifier {
    /// `modreq` if set, `modopt` otherwise
    pub is_required: bool,
    /// The modifier type
    pub modifier_type: TypeDefOrRef,
}

/// A general array with rank, sizes and lower bounds
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureArray {
    /// The type in the array
    pub base: Box<TypeSignature>,
    /// The number of dimensions
    pub rank: u32,
    /// Sizes of the leading dimensions
    pub sizes: Vec<u32>,
    /// Lower bounds of the leading dimensions
    pub lower_bounds: Vec<i32>,
}

/// A single dimension, zero based array
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureSzArray {
    /// Custom modifiers of the element type
    pub modifiers: Vec<CustomModifier>,
    /// The type in the array
    pub base: Box<TypeSignature>,
}

/// A pointer to a type
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignaturePointer {
    /// Custom modifiers of the pointed-to type
    pub modifiers: Vec<CustomModifier>,
    /// The type pointed to
    pub base: Box<TypeSignature>,
}

/// Parameter with optional custom modifiers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureParameter {
    /// Custom modifiers of the parameter
    pub modifiers: Vec<CustomModifier>,
    /// Parameter is passed by reference
    pub by_ref: bool,
    /// The type of the parameter
    pub base: TypeSignature,
}

impl SignatureParameter {
    /// A plain parameter of type `base`, without modifiers.
    #[must_use]
    pub fn new(base: TypeSignature) -> Self {
        SignatureParameter {
            modifiers: Vec::new(),
            by_ref: false,
            base,
        }
    }
}

/// Represents a method signature (II.23.2.1)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureMethod {
    /// Used to encode the keyword instance in the calling convention, see §II.15.3
    pub has_this: bool,
    /// Used to encode the keyword explicit in the calling convention, see §II.15.3
    pub explicit_this: bool,
    /// Used to encode the keyword vararg in the calling convention, see §II.15.3
    pub vararg: bool,
    /// Used to indicate that the method has one or more generic parameters.
    pub param_count_generic: u32,
    /// The return type of this `Method`
    pub return_type: SignatureParameter,
    /// The parameters of this `Method`
    pub params: Vec<SignatureParameter>,
    /// The vararg parameters, written after the sentinel
    pub varargs: Vec<SignatureParameter>,
}

impl SignatureMethod {
    /// A static, default calling convention signature.
    #[must_use]
    pub fn new(return_type: TypeSignature, params: Vec<TypeSignature>) -> Self {
        SignatureMethod {
            return_type: SignatureParameter::new(return_type),
            params: params.into_iter().map(SignatureParameter::new).collect(),
            ..Default::default()
        }
    }

    /// An instance (`HASTHIS`) signature.
    #[must_use]
    pub fn instance(return_type: TypeSignature, params: Vec<TypeSignature>) -> Self {
        SignatureMethod {
            has_this: true,
            ..Self::new(return_type, params)
        }
    }
}

/// Field signature (II.23.2.4)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureField {
    /// The custom modifiers for this field
    pub modifiers: Vec<CustomModifier>,
    /// The signature of this type
    pub base: TypeSignature,
}

impl SignatureField {
    /// A field of type `base`, without modifiers.
    #[must_use]
    pub fn new(base: TypeSignature) -> Self {
        SignatureField {
            modifiers: Vec::new(),
            base,
        }
    }
}

/// Property signature (II.23.2.5)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureProperty {
    /// Indicates the passing of a 'this' pointer
    pub has_this: bool,
    /// The custom modifiers for this property
    pub modifiers: Vec<CustomModifier>,
    /// The signature of this property
    pub base: TypeSignature,
    /// The parameters of this property
    pub params: Vec<SignatureParameter>,
}

/// Local variable signature (II.23.2.6)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureLocalVariables {
    /// The local variables
    pub locals: Vec<SignatureLocalVariable>,
}

impl SignatureLocalVariables {
    /// A local list of plain, unpinned variables.
    #[must_use]
    pub fn new(locals: Vec<TypeSignature>) -> Self {
        SignatureLocalVariables {
            locals: locals
                .into_iter()
                .map(|base| SignatureLocalVariable {
                    base,
                    ..Default::default()
                })
                .collect(),
        }
    }
}

/// Represents a local variable in a method body
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureLocalVariable {
    /// Custom modifiers
    pub modifiers: Vec<CustomModifier>,
    /// Is passed by reference
    pub is_byref: bool,
    /// This variable is pinned
    pub is_pinned: bool,
    /// The signature of this variable
    pub base: TypeSignature,
}

/// Represents a method specification (II.23.2.15)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureMethodSpec {
    /// Types of the generic arguments
    pub generic_args: Vec<TypeSignature>,
}

/// The signature carried by a `MemberRef`
#[derive(Debug, Clone, PartialEq)]
pub enum MemberRefSignature {
    /// Reference to a field
    Field(SignatureField),
    /// Reference to a method
    Method(SignatureMethod),
}

/// The signature carried by a `StandAloneSig`
#[derive(Debug, Clone, PartialEq)]
pub enum StandAloneSignature {
    /// A method signature, used by `calli`
    Method(SignatureMethod),
    /// A local variable list of a method body
    LocalVariables(SignatureLocalVariables),
}
