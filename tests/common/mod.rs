//! A small loaded module shared by the integration tests.
//!
//! | Row | Type       | Fields            | Methods (param)              | Events / Properties |
//! |-----|------------|-------------------|------------------------------|---------------------|
//! | 1   | `<Module>` |                   |                              |                     |
//! | 2   | `Program`  | 1 counter, 2 name | 1 Main (1 args), 2 Run (2 count) |                 |
//! | 3   | `Helper`   | 3 cache           | 3 Help (3 x)                 | event 1, property 1 |
//! | 4   | `Extra`    |                   | 4 Extra                      |                     |
//!
//! `System.Object` is `TypeRef` row 1, scoped to `mscorlib` (`AssemblyRef` row 1).

#![allow(dead_code)]

use std::sync::Arc;

use dotscope_preserve::prelude::*;
use uguid::Guid;

pub struct Sample {
    pub module: Module,
    pub source: SourceModule,
    pub corlib: AssemblyRefRc,
    pub object: TypeRefRc,
    pub program: TypeDefRc,
    pub helper: TypeDefRc,
    pub extra: TypeDefRc,
}

fn int_field(rid: u32, name: &str) -> FieldRc {
    Arc::new(Field::new(
        Origin::Loaded(rid),
        0x0001,
        name,
        SignatureField::new(TypeSignature::I4),
    ))
}

fn static_method(rid: u32, name: &str, params: &[(u32, &str)]) -> MethodDefRc {
    let method = Arc::new(MethodDef::new(
        Origin::Loaded(rid),
        0x0096,
        name,
        SignatureMethod::new(
            TypeSignature::Void,
            params.iter().map(|_| TypeSignature::I4).collect(),
        ),
    ));
    for (sequence, (param_rid, param_name)) in params.iter().enumerate() {
        method.add_param(Arc::new(Param::new(
            Origin::Loaded(*param_rid),
            0,
            sequence as u32 + 1,
            *param_name,
        )));
    }
    method
}

impl Sample {
    pub fn new() -> Self {
        let corlib = Arc::new(
            AssemblyRef::new(Origin::Loaded(1), "mscorlib", [4, 0, 0, 0])
                .with_public_key_token(vec![0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89]),
        );
        let object = Arc::new(TypeRef::new(Origin::Loaded(1), "System", "Object"));
        object.set_scope(ResolutionScope::AssemblyRef(corlib.clone()));

        let module = Module::new(
            "Sample.dll",
            Guid::from_bytes([
                0x3f, 0x2b, 0x8a, 0x61, 0x0c, 0x4d, 0x4e, 0x27, 0x9b, 0x11, 0x52, 0xe6, 0x0a, 0x7d,
                0x93, 0xc4,
            ]),
            object.clone(),
        );
        let base = || TypeDefOrRef::TypeRef(object.clone());

        module.add_type(Arc::new(TypeDef::new(Origin::Loaded(1), 0, "", "<Module>")));

        let program = Arc::new(TypeDef::new(Origin::Loaded(2), 0x0010_0001, "Sample", "Program"));
        program.set_base(base());
        program.add_field(int_field(1, "counter"));
        program.add_field(int_field(2, "name"));
        program.add_method(static_method(1, "Main", &[(1, "args")]));
        program.add_method(static_method(2, "Run", &[(2, "count")]));
        module.add_type(program.clone());

        let helper = Arc::new(TypeDef::new(Origin::Loaded(3), 0x0010_0001, "Sample", "Helper"));
        helper.set_base(base());
        helper.add_field(int_field(3, "cache"));
        helper.add_method(static_method(3, "Help", &[(3, "x")]));
        helper.add_event(Arc::new(Event::new(
            Origin::Loaded(1),
            0,
            "Changed",
            Some(base()),
        )));
        helper.add_property(Arc::new(Property::new(
            Origin::Loaded(1),
            0,
            "Value",
            SignatureProperty {
                has_this: true,
                base: TypeSignature::I4,
                ..Default::default()
            },
        )));
        module.add_type(helper.clone());

        let extra = Arc::new(TypeDef::new(Origin::Loaded(4), 0x0010_0001, "Sample", "Extra"));
        extra.set_base(base());
        extra.add_method(static_method(4, "Extra", &[]));
        module.add_type(extra.clone());

        let source = SourceModule::capture(&module);
        source.insert(MetadataObject::AssemblyRef(corlib.clone()));

        Sample {
            module,
            source,
            corlib,
            object,
            program,
            helper,
            extra,
        }
    }

    /// Every definition of the module as it was loaded
    pub fn definitions(&self) -> Vec<MetadataObject> {
        let mut objects = Vec::new();
        for type_def in self.module.types() {
            for field in type_def.fields() {
                objects.push(field.into());
            }
            for method in type_def.methods() {
                for param in method.params() {
                    objects.push(param.into());
                }
                objects.push(method.into());
            }
            for event in type_def.events() {
                objects.push(event.into());
            }
            for property in type_def.properties() {
                objects.push(property.into());
            }
            objects.push(type_def.into());
        }
        objects
    }

    pub fn writer(&self, options: WriterOptions) -> MetadataWriter<'_, HeapBuilder> {
        MetadataWriter::new(&self.module, &self.source, HeapBuilder::new(), options)
    }
}
