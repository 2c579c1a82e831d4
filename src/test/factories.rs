//! Factories for graph objects and a loaded module fixture.

use std::sync::Arc;

use uguid::Guid;

use crate::metadata::{
    model::{
        AssemblyRef, AssemblyRefRc, Event, EventRc, Field, FieldRc, MetadataObject, MethodDef,
        MethodDefRc, Module, Origin, Param, ParamRc, Property, PropertyRc, ResolutionScope,
        StandAloneSig, StandAloneSigRc, TypeDef, TypeDefOrRef, TypeDefRc, TypeRef, TypeRefRc,
    },
    signatures::{SignatureField, SignatureMethod, SignatureProperty, TypeSignature},
    source::SourceModule,
};

pub fn field(origin: Origin, name: &str) -> FieldRc {
    Arc::new(Field::new(
        origin,
        0x0006,
        name,
        SignatureField::new(TypeSignature::I4),
    ))
}

/// An instance method taking one `int`, without its `Param` row
pub fn method(origin: Origin, name: &str) -> MethodDefRc {
    Arc::new(MethodDef::new(
        origin,
        0x0086,
        name,
        SignatureMethod::instance(TypeSignature::Void, vec![TypeSignature::I4]),
    ))
}

pub fn param(origin: Origin, sequence: u32, name: &str) -> ParamRc {
    Arc::new(Param::new(origin, 0, sequence, name))
}

pub fn event(origin: Origin, name: &str) -> EventRc {
    Arc::new(Event::new(origin, 0, name, None))
}

pub fn property(origin: Origin, name: &str) -> PropertyRc {
    Arc::new(Property::new(
        origin,
        0,
        name,
        SignatureProperty {
            has_this: true,
            base: TypeSignature::I4,
            ..Default::default()
        },
    ))
}

pub fn type_def(origin: Origin, name: &str) -> TypeDefRc {
    Arc::new(TypeDef::new(origin, 0x0010_0001, "Fixture", name))
}

/// `System.Object` of `mscorlib`
pub fn object_ref(scope: &AssemblyRefRc) -> TypeRefRc {
    let object = Arc::new(TypeRef::new(Origin::Loaded(1), "System", "Object"));
    object.set_scope(ResolutionScope::AssemblyRef(scope.clone()));
    object
}

/// A module as a loader would leave it, with the input module captured in `source`.
pub struct ModuleFixture {
    pub module: Module,
    pub source: SourceModule,
    /// Types in input order, the global type first
    pub types: Vec<TypeDefRc>,
    pub corlib: AssemblyRefRc,
}

impl ModuleFixture {
    /// Builds a module with a global type and one type per `(fields, methods)` entry.
    ///
    /// Type `i` is named `Type{i}` and sits at row `i + 1`. Members get consecutive rows
    /// across types and are named `field{i}_{n}` and `method{i}_{n}`. Every method has
    /// one parameter.
    pub fn loaded(shape: &[(u32, u32)]) -> Self {
        let corlib = Arc::new(
            AssemblyRef::new(Origin::Loaded(1), "mscorlib", [4, 0, 0, 0])
                .with_public_key_token(vec![0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89]),
        );
        let object = object_ref(&corlib);
        let module = Module::new("fixture.dll", Guid::from_bytes([0x42; 16]), object.clone());

        let global = Arc::new(TypeDef::new(Origin::Loaded(1), 0, "", "<Module>"));
        module.add_type(global.clone());
        let mut types = vec![global];

        let mut field_rid = 0;
        let mut method_rid = 0;
        for (i, (fields, methods)) in shape.iter().enumerate() {
            let index = i + 1;
            let type_def = type_def(Origin::Loaded(index as u32 + 1), &format!("Type{index}"));
            type_def.set_base(TypeDefOrRef::TypeRef(object.clone()));

            for n in 0..*fields {
                field_rid += 1;
                type_def.add_field(field(Origin::Loaded(field_rid), &format!("field{index}_{n}")));
            }
            for n in 0..*methods {
                method_rid += 1;
                let method = method(Origin::Loaded(method_rid), &format!("method{index}_{n}"));
                method.add_param(param(Origin::Loaded(method_rid), 1, "value"));
                type_def.add_method(method);
            }

            module.add_type(type_def.clone());
            types.push(type_def);
        }

        let source = SourceModule::capture(&module);
        source.insert(MetadataObject::AssemblyRef(corlib.clone()));

        ModuleFixture {
            module,
            source,
            types,
            corlib,
        }
    }

    /// Adds a type to the module; loaded types are recorded in the source too
    pub fn add_type(&self, origin: Origin, name: &str) -> TypeDefRc {
        let type_def = type_def(origin, name);
        type_def.set_base(TypeDefOrRef::TypeRef(self.module.corlib_object.clone()));
        self.module.add_type(type_def.clone());
        self.source.insert(type_def.clone().into());
        type_def
    }

    /// Adds an event to `types[type_index]`
    pub fn add_event(&self, type_index: usize, origin: Origin, name: &str) -> EventRc {
        let event = event(origin, name);
        self.types[type_index].add_event(event.clone());
        self.source.insert(event.clone().into());
        event
    }

    /// Adds a property to `types[type_index]`
    pub fn add_property(&self, type_index: usize, origin: Origin, name: &str) -> PropertyRc {
        let property = property(origin, name);
        self.types[type_index].add_property(property.clone());
        self.source.insert(property.clone().into());
        property
    }

    /// A `TypeRef` scoped to the core library
    pub fn add_type_ref(&self, origin: Origin, namespace: &str, name: &str) -> TypeRefRc {
        let type_ref = Arc::new(TypeRef::new(origin, namespace, name));
        type_ref.set_scope(ResolutionScope::AssemblyRef(self.corlib.clone()));
        self.source.insert(type_ref.clone().into());
        type_ref
    }

    /// A local variable `StandAloneSig`
    pub fn add_standalone_sig(&self, origin: Origin, locals: Vec<TypeSignature>) -> StandAloneSigRc {
        let sig = Arc::new(StandAloneSig::local_variables(origin, locals));
        self.source.insert(sig.clone().into());
        sig
    }
}
