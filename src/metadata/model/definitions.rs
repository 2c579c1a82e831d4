use std::sync::{Arc, OnceLock, RwLock};

use uguid::Guid;

use crate::metadata::{
    model::{Origin, TypeDefOrRef, TypeRefRc},
    signatures::{SignatureField, SignatureLocalVariables, SignatureMethod, SignatureProperty},
    token::Token,
};

/// A reference to a `TypeDef`
pub type TypeDefRc = Arc<TypeDef>;
/// A reference to a `Field`
pub type FieldRc = Arc<Field>;
/// A reference to a `MethodDef`
pub type MethodDefRc = Arc<MethodDef>;
/// A reference to a `Param`
pub type ParamRc = Arc<Param>;
/// A reference to an `Event`
pub type EventRc = Arc<Event>;
/// A reference to a `Property`
pub type PropertyRc = Arc<Property>;

/// Root of the object graph.
///
/// `types` is the flat list of every type in the module, nested types included. The
/// first entry is the module-level global type (`<Module>`), which always ends up at
/// `TypeDef` row 1.
pub struct Module {
    /// Module name
    pub name: String,
    /// Module version id
    pub mvid: Guid,
    /// Reference to `System.Object` in the core library, base of synthetic types
    pub corlib_object: TypeRefRc,
    types: RwLock<Vec<TypeDefRc>>,
}

/// Name of the module-level type that holds global fields and methods
pub const GLOBAL_TYPE_NAME: &str = "<Module>";

impl Module {
    /// Create a module without types
    pub fn new(name: impl Into<String>, mvid: Guid, corlib_object: TypeRefRc) -> Self {
        Module {
            name: name.into(),
            mvid,
            corlib_object,
            types: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of all types, in module order
    pub fn types(&self) -> Vec<TypeDefRc> {
        snapshot!(self.types)
    }

    /// The module-level global type: `<Module>` in the empty namespace.
    ///
    /// The write pass places the first listed type in row 1 and uses this lookup to check
    /// that it is the global type.
    pub fn global_type(&self) -> Option<TypeDefRc> {
        read_lock!(self.types)
            .iter()
            .find(|type_def| type_def.name == GLOBAL_TYPE_NAME && type_def.namespace.is_empty())
            .cloned()
    }

    /// Append a type
    pub fn add_type(&self, type_def: TypeDefRc) {
        write_lock!(self.types).push(type_def);
    }

    /// Remove a type; returns whether it was present
    pub fn remove_type(&self, type_def: &TypeDefRc) -> bool {
        remove_by_identity!(self.types, type_def)
    }
}

/// Represents a type definition and the members it declares.
pub struct TypeDef {
    /// Where this type comes from
    pub origin: Origin,
    /// a 4-byte bitmask of type `TypeAttributes`
    pub flags: u32,
    /// Namespace, empty for nested and global types
    pub namespace: String,
    /// Name
    pub name: String,
    base: OnceLock<TypeDefOrRef>,
    fields: RwLock<Vec<FieldRc>>,
    methods: RwLock<Vec<MethodDefRc>>,
    events: RwLock<Vec<EventRc>>,
    properties: RwLock<Vec<PropertyRc>>,
}

impl TypeDef {
    /// Create a new type without members
    pub fn new(
        origin: Origin,
        flags: u32,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        TypeDef {
            origin,
            flags,
            namespace: namespace.into(),
            name: name.into(),
            base: OnceLock::new(),
            fields: RwLock::new(Vec::new()),
            methods: RwLock::new(Vec::new()),
            events: RwLock::new(Vec::new()),
            properties: RwLock::new(Vec::new()),
        }
    }

    /// The base type, if any
    pub fn base(&self) -> Option<&TypeDefOrRef> {
        self.base.get()
    }

    /// Set the base type. Returns `false` if it was already set.
    pub fn set_base(&self, base: TypeDefOrRef) -> bool {
        self.base.set(base).is_ok()
    }

    /// Returns the full name (Namespace.Name) of the entity
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{0}.{1}", self.namespace, self.name)
        }
    }

    /// Snapshot of the declared fields, in declaration order
    pub fn fields(&self) -> Vec<FieldRc> {
        snapshot!(self.fields)
    }

    /// Declare a field
    pub fn add_field(&self, field: FieldRc) {
        write_lock!(self.fields).push(field);
    }

    /// Remove a field; returns whether it was declared here
    pub fn remove_field(&self, field: &FieldRc) -> bool {
        remove_by_identity!(self.fields, field)
    }

    /// Snapshot of the declared methods, in declaration order
    pub fn methods(&self) -> Vec<MethodDefRc> {
        snapshot!(self.methods)
    }

    /// Declare a method
    pub fn add_method(&self, method: MethodDefRc) {
        write_lock!(self.methods).push(method);
    }

    /// Remove a method; returns whether it was declared here
    pub fn remove_method(&self, method: &MethodDefRc) -> bool {
        remove_by_identity!(self.methods, method)
    }

    /// Snapshot of the declared events, in declaration order
    pub fn events(&self) -> Vec<EventRc> {
        snapshot!(self.events)
    }

    /// Declare an event
    pub fn add_event(&self, event: EventRc) {
        write_lock!(self.events).push(event);
    }

    /// Remove an event; returns whether it was declared here
    pub fn remove_event(&self, event: &EventRc) -> bool {
        remove_by_identity!(self.events, event)
    }

    /// Snapshot of the declared properties, in declaration order
    pub fn properties(&self) -> Vec<PropertyRc> {
        snapshot!(self.properties)
    }

    /// Declare a property
    pub fn add_property(&self, property: PropertyRc) {
        write_lock!(self.properties).push(property);
    }

    /// Remove a property; returns whether it was declared here
    pub fn remove_property(&self, property: &PropertyRc) -> bool {
        remove_by_identity!(self.properties, property)
    }
}

/// Represents a field definition
pub struct Field {
    /// Where this field comes from
    pub origin: Origin,
    /// a 2-byte bitmask of type `FieldAttributes`
    pub flags: u32,
    /// Name
    pub name: String,
    /// Signature
    pub signature: SignatureField,
}

impl Field {
    /// Create a new field
    pub fn new(origin: Origin, flags: u32, name: impl Into<String>, signature: SignatureField) -> Self {
        Field {
            origin,
            flags,
            name: name.into(),
            signature,
        }
    }
}

/// The parts of a method body the metadata writer cares about
#[derive(Debug, Clone, Default)]
pub struct MethodBody {
    /// Local variable list, `None` if the body declares no locals
    pub local_var_sig: Option<SignatureLocalVariables>,
    /// `StandAloneSig` token the body used in the input module, null for new bodies
    pub original_local_var_token: Token,
}

/// Represents a method definition and its parameters
pub struct MethodDef {
    /// Where this method comes from
    pub origin: Origin,
    /// a 2-byte bitmask of type `MethodAttributes`
    pub flags: u32,
    /// a 2-byte bitmask of type `MethodImplAttributes`
    pub impl_flags: u32,
    /// Name
    pub name: String,
    /// Signature
    pub signature: SignatureMethod,
    /// Body, if the method has one
    pub body: Option<MethodBody>,
    params: RwLock<Vec<ParamRc>>,
}

impl MethodDef {
    /// Create a new method without parameters or body
    pub fn new(
        origin: Origin,
        flags: u32,
        name: impl Into<String>,
        signature: SignatureMethod,
    ) -> Self {
        MethodDef {
            origin,
            flags,
            impl_flags: 0,
            name: name.into(),
            signature,
            body: None,
            params: RwLock::new(Vec::new()),
        }
    }

    /// Attach a body
    #[must_use]
    pub fn with_body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the implementation flags
    #[must_use]
    pub fn with_impl_flags(mut self, impl_flags: u32) -> Self {
        self.impl_flags = impl_flags;
        self
    }

    /// Snapshot of the declared parameters, in declaration order
    pub fn params(&self) -> Vec<ParamRc> {
        snapshot!(self.params)
    }

    /// Declare a parameter
    pub fn add_param(&self, param: ParamRc) {
        write_lock!(self.params).push(param);
    }

    /// Remove a parameter; returns whether it was declared here
    pub fn remove_param(&self, param: &ParamRc) -> bool {
        remove_by_identity!(self.params, param)
    }
}

/// Represents a parameter definition
pub struct Param {
    /// Where this parameter comes from
    pub origin: Origin,
    /// a 2-byte bitmask of type `ParamAttributes`
    pub flags: u32,
    /// Position in the signature, 0 is the return value
    pub sequence: u32,
    /// Name
    pub name: String,
}

impl Param {
    /// Create a new parameter
    pub fn new(origin: Origin, flags: u32, sequence: u32, name: impl Into<String>) -> Self {
        Param {
            origin,
            flags,
            sequence,
            name: name.into(),
        }
    }
}

/// Represents an event definition
pub struct Event {
    /// Where this event comes from
    pub origin: Origin,
    /// a 2-byte bitmask of type `EventAttributes`
    pub flags: u32,
    /// Name
    pub name: String,
    /// Delegate type of the event
    pub event_type: Option<TypeDefOrRef>,
}

impl Event {
    /// Create a new event
    pub fn new(
        origin: Origin,
        flags: u32,
        name: impl Into<String>,
        event_type: Option<TypeDefOrRef>,
    ) -> Self {
        Event {
            origin,
            flags,
            name: name.into(),
            event_type,
        }
    }
}

/// Represents a property definition
pub struct Property {
    /// Where this property comes from
    pub origin: Origin,
    /// a 2-byte bitmask of type `PropertyAttributes`
    pub flags: u32,
    /// Name
    pub name: String,
    /// Signature
    pub signature: SignatureProperty,
}

impl Property {
    /// Create a new property
    pub fn new(
        origin: Origin,
        flags: u32,
        name: impl Into<String>,
        signature: SignatureProperty,
    ) -> Self {
        Property {
            origin,
            flags,
            name: name.into(),
            signature,
        }
    }
}

macro_rules! impl_debug_named {
    ($($ty:ty),* $(,)?) => {
        $(
            impl std::fmt::Debug for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.debug_struct(stringify!($ty))
                        .field("origin", &self.origin)
                        .field("name", &self.name)
                        .finish_non_exhaustive()
                }
            }
        )*
    };
}

impl_debug_named!(TypeDef, Field, MethodDef, Param, Event, Property);

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("mvid", &self.mvid)
            .field("types", &read_lock!(self.types).len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{model::TypeRef, signatures::TypeSignature};

    #[test]
    fn test_member_edits() {
        let ty = TypeDef::new(Origin::Loaded(2), 0x0010_0001, "App", "Program");
        let a = Arc::new(Field::new(
            Origin::Loaded(1),
            0x0001,
            "a",
            SignatureField::new(TypeSignature::I4),
        ));
        let b = Arc::new(Field::new(
            Origin::Created,
            0x0001,
            "b",
            SignatureField::new(TypeSignature::I4),
        ));

        ty.add_field(a.clone());
        ty.add_field(b.clone());
        assert_eq!(ty.fields().len(), 2);

        assert!(ty.remove_field(&a));
        assert!(!ty.remove_field(&a));

        let remaining = ty.fields();
        assert_eq!(remaining.len(), 1);
        assert!(Arc::ptr_eq(&remaining[0], &b));
    }

    #[test]
    fn test_module_types() {
        let object = Arc::new(TypeRef::new(Origin::Loaded(1), "System", "Object"));
        let module = Module::new("test.dll", Guid::ZERO, object);
        assert!(module.global_type().is_none());

        let global = Arc::new(TypeDef::new(Origin::Loaded(1), 0, "", "<Module>"));
        let program = Arc::new(TypeDef::new(Origin::Loaded(2), 0, "App", "Program"));
        module.add_type(program.clone());
        assert!(module.global_type().is_none());
        module.add_type(global.clone());

        assert!(Arc::ptr_eq(&module.global_type().unwrap(), &global));
        assert_eq!(program.fullname(), "App.Program");
        assert!(module.remove_type(&program));
        assert_eq!(module.types().len(), 1);
    }

    #[test]
    fn test_base_is_set_once() {
        let object = Arc::new(TypeRef::new(Origin::Loaded(1), "System", "Object"));
        let ty = TypeDef::new(Origin::Created, 0, "App", "Derived");
        assert!(ty.set_base(TypeDefOrRef::TypeRef(object.clone())));
        assert!(!ty.set_base(TypeDefOrRef::TypeRef(object)));
        assert!(ty.base().is_some());
    }
}
