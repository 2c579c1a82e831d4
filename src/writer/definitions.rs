//! Filling the definition rows.
//!
//! Every row already exists at this point, so this stage only fills columns. Resolving a
//! base type or a signature type may still append reference rows.

use crate::{
    metadata::{
        model::{MetadataObject, TypeDefRc},
        signatures::{
            encode_field_signature, encode_method_signature, encode_property_signature,
        },
        streams::HeapWriter,
        tables::{CodedIndex, CodedIndexType, TableId},
        token::Token,
    },
    writer::{
        progress::WritePhase,
        reconcile::{placeholder_type_name, PLACEHOLDER_TYPE_FLAGS},
        state::Stage,
        types::TypeSlot,
        MetadataWriter,
    },
    Result,
};

const DEFINITION_STEPS: u32 = 6;

impl<H: HeapWriter> MetadataWriter<'_, H> {
    /// Fills every `TypeDef`, `Field`, `MethodDef`, `Param`, `Event` and `Property` row.
    ///
    /// List columns and placeholder rows written during member allocation are left as
    /// they are.
    ///
    /// # Errors
    ///
    /// Returns an error if called out of order, or on a fatal condition while encoding a
    /// signature or resolving a reference.
    pub fn write_definitions(&mut self) -> Result<()> {
        self.state.expect(Stage::MembersAllocated)?;

        self.progress
            .report(WritePhase::WriteDefinitions, 0, DEFINITION_STEPS);
        self.write_type_rows()?;
        self.progress
            .report(WritePhase::WriteDefinitions, 1, DEFINITION_STEPS);
        self.write_field_rows()?;
        self.progress
            .report(WritePhase::WriteDefinitions, 2, DEFINITION_STEPS);
        self.write_method_rows()?;
        self.progress
            .report(WritePhase::WriteDefinitions, 3, DEFINITION_STEPS);
        self.write_param_rows()?;
        self.progress
            .report(WritePhase::WriteDefinitions, 4, DEFINITION_STEPS);
        self.write_event_rows()?;
        self.progress
            .report(WritePhase::WriteDefinitions, 5, DEFINITION_STEPS);
        self.write_property_rows()?;
        self.progress
            .report(WritePhase::WriteDefinitions, 6, DEFINITION_STEPS);

        self.state
            .advance(Stage::MembersAllocated, Stage::DefinitionsWritten)
    }

    fn write_type_rows(&mut self) -> Result<()> {
        let slots = self.slots.clone();
        for (i, slot) in slots.iter().enumerate() {
            let rid = i as u32 + 1;
            match slot {
                TypeSlot::Live(type_def) => self.write_type_row(type_def, rid)?,
                TypeSlot::Dummy => {
                    let extends = self.object_type()?;
                    let type_name = self.heaps.intern_string(&placeholder_type_name(
                        &self.module.mvid,
                        "dummy",
                        rid,
                    ))?;
                    let type_namespace = self.heaps.intern_string("dummy")?;

                    let row = self.tables.type_def.get_mut(rid)?;
                    row.flags = PLACEHOLDER_TYPE_FLAGS;
                    row.type_name = type_name;
                    row.type_namespace = type_namespace;
                    row.extends = extends;
                }
            }
        }
        Ok(())
    }

    fn write_type_row(&mut self, type_def: &TypeDefRc, rid: u32) -> Result<()> {
        let extends = match type_def.base() {
            Some(base) => self.add_type_def_or_ref(base)?,
            None => CodedIndex::null(CodedIndexType::TypeDefOrRef),
        };
        let type_name = self.heaps.intern_string(&type_def.name)?;
        let type_namespace = self.heaps.intern_string(&type_def.namespace)?;

        let row = self.tables.type_def.get_mut(rid)?;
        row.flags = type_def.flags;
        row.type_name = type_name;
        row.type_namespace = type_namespace;
        row.extends = extends;

        self.notify(&MetadataObject::TypeDef(type_def.clone()), TableId::TypeDef, rid);
        Ok(())
    }

    fn write_field_rows(&mut self) -> Result<()> {
        let fields: Vec<_> = self
            .members
            .fields
            .physical()
            .map(|entry| (entry.item.clone(), entry.rid))
            .collect();

        for (field, rid) in fields {
            let signature = encode_field_signature(&field.signature, self)?;
            let name = self.heaps.intern_string(&field.name)?;
            let signature = self.heaps.intern_blob(&signature)?;

            let row = self.tables.field.get_mut(rid)?;
            row.flags = field.flags;
            row.name = name;
            row.signature = signature;

            self.notify(&MetadataObject::Field(field), TableId::Field, rid);
        }
        Ok(())
    }

    fn write_method_rows(&mut self) -> Result<()> {
        let methods: Vec<_> = self
            .members
            .methods
            .physical()
            .map(|entry| (entry.item.clone(), entry.rid))
            .collect();

        for (method, rid) in methods {
            let signature = encode_method_signature(&method.signature, self)?;
            let name = self.heaps.intern_string(&method.name)?;
            let signature = self.heaps.intern_blob(&signature)?;

            if let Some(body) = &method.body {
                if let Some(locals) = &body.local_var_sig {
                    let sig_rid = self.add_local_sig(locals, body.original_local_var_token)?;
                    self.local_var_sigs
                        .insert(rid, Token::from_parts(TableId::StandAloneSig, sig_rid));
                }
            }

            let row = self.tables.method_def.get_mut(rid)?;
            row.impl_flags = method.impl_flags;
            row.flags = method.flags;
            row.name = name;
            row.signature = signature;

            self.notify(&MetadataObject::MethodDef(method), TableId::MethodDef, rid);
        }
        Ok(())
    }

    fn write_param_rows(&mut self) -> Result<()> {
        let params: Vec<_> = self
            .members
            .params
            .physical()
            .map(|entry| (entry.item.clone(), entry.rid))
            .collect();

        for (param, rid) in params {
            let name = self.heaps.intern_string(&param.name)?;

            let row = self.tables.param.get_mut(rid)?;
            row.flags = param.flags;
            row.sequence = param.sequence;
            row.name = name;

            self.notify(&MetadataObject::Param(param), TableId::Param, rid);
        }
        Ok(())
    }

    fn write_event_rows(&mut self) -> Result<()> {
        let events: Vec<_> = self
            .members
            .events
            .physical()
            .map(|entry| (entry.item.clone(), entry.rid))
            .collect();

        for (event, rid) in events {
            let event_type = match &event.event_type {
                Some(ty) => self.add_type_def_or_ref(ty)?,
                None => CodedIndex::null(CodedIndexType::TypeDefOrRef),
            };
            let name = self.heaps.intern_string(&event.name)?;

            let row = self.tables.event.get_mut(rid)?;
            row.flags = event.flags;
            row.name = name;
            row.event_type = event_type;

            self.notify(&MetadataObject::Event(event), TableId::Event, rid);
        }
        Ok(())
    }

    fn write_property_rows(&mut self) -> Result<()> {
        let properties: Vec<_> = self
            .members
            .properties
            .physical()
            .map(|entry| (entry.item.clone(), entry.rid))
            .collect();

        for (property, rid) in properties {
            let signature = encode_property_signature(&property.signature, self)?;
            let name = self.heaps.intern_string(&property.name)?;
            let signature = self.heaps.intern_blob(&signature)?;

            let row = self.tables.property.get_mut(rid)?;
            row.flags = property.flags;
            row.name = name;
            row.signature = signature;

            self.notify(&MetadataObject::Property(property), TableId::Property, rid);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        metadata::{
            model::{MethodBody, MethodDef, Origin},
            signatures::{SignatureLocalVariables, SignatureMethod, TypeSignature},
            streams::HeapBuilder,
            tables::TableId,
            token::Token,
        },
        test::factories::ModuleFixture,
        writer::{MetadataWriter, RecordingSink, Stage, WriterOptions},
        Error,
    };
    use std::sync::Arc;

    fn written(fixture: &ModuleFixture) -> MetadataWriter<'_, HeapBuilder> {
        let mut writer = MetadataWriter::new(
            &fixture.module,
            &fixture.source,
            HeapBuilder::new(),
            WriterOptions::preserve_all(),
        );
        writer.allocate_type_rows().unwrap();
        writer.allocate_member_rows().unwrap();
        writer.write_definitions().unwrap();
        writer
    }

    #[test]
    fn test_rows_carry_names() {
        let fixture = ModuleFixture::loaded(&[(1, 1)]);
        let writer = written(&fixture);
        let tables = writer.tables();
        let heaps = writer.heaps();

        let type_row = tables.type_def.get(2).unwrap();
        assert_eq!(heaps.get_string(type_row.type_name), Some("Type1"));
        assert_eq!(type_row.extends.tag, TableId::TypeRef);
        assert_eq!(type_row.extends.row, 1);
        assert_eq!(type_row.field_list, 1);
        assert_eq!(type_row.method_list, 1);

        let field_row = tables.field.get(1).unwrap();
        assert_eq!(heaps.get_string(field_row.name), Some("field1_0"));
        let method_row = tables.method_def.get(1).unwrap();
        assert_eq!(heaps.get_string(method_row.name), Some("method1_0"));
        assert_eq!(method_row.param_list, 1);
        assert_eq!(tables.param.get(1).unwrap().sequence, 1);

        // The global type has no base type
        assert_eq!(tables.type_def.get(1).unwrap().extends.row, 0);
    }

    #[test]
    fn test_dummy_type_row() {
        let fixture = ModuleFixture::loaded(&[(0, 0), (0, 0)]);
        fixture.module.remove_type(&fixture.types[1]);
        let writer = written(&fixture);

        let row = writer.tables().type_def.get(2).unwrap();
        assert_eq!(row.flags, 0x80);
        assert_eq!(writer.heaps().get_string(row.type_namespace), Some("dummy"));
        let name = writer.heaps().get_string(row.type_name).unwrap();
        assert!(name.starts_with('{') && name.ends_with('}'));
        assert_eq!(row.extends.row, 1);
    }

    #[test]
    fn test_local_signature_keeps_token() {
        let fixture = ModuleFixture::loaded(&[]);
        fixture.add_standalone_sig(Origin::Loaded(1), vec![TypeSignature::I4]);
        let method = Arc::new(
            MethodDef::new(
                Origin::Created,
                0x0006,
                "WithLocals",
                SignatureMethod::new(TypeSignature::Void, Vec::new()),
            )
            .with_body(MethodBody {
                local_var_sig: Some(SignatureLocalVariables::new(vec![TypeSignature::I4])),
                original_local_var_token: Token::new(0x1100_0001),
            }),
        );
        fixture.types[0].add_method(method);

        let mut writer = MetadataWriter::new(
            &fixture.module,
            &fixture.source,
            HeapBuilder::new(),
            WriterOptions::preserve_all(),
        );
        writer.run().unwrap();
        let output = writer.finish().unwrap();
        assert_eq!(output.local_var_sigs.get(&1), Some(&Token::new(0x1100_0001)));
        assert_eq!(output.tables.standalone_sig.row_count(), 1);
    }

    #[test]
    fn test_sink_sees_every_definition() {
        let fixture = ModuleFixture::loaded(&[(2, 1)]);
        let mut sink = RecordingSink::default();
        {
            let mut writer = MetadataWriter::new(
                &fixture.module,
                &fixture.source,
                HeapBuilder::new(),
                WriterOptions::preserve_all(),
            )
            .with_attribute_sink(&mut sink);
            writer.allocate_type_rows().unwrap();
            writer.allocate_member_rows().unwrap();
            writer.write_definitions().unwrap();
        }

        let count = |table| sink.records.iter().filter(|r| r.0 == table).count();
        assert_eq!(count(TableId::TypeDef), 2);
        assert_eq!(count(TableId::Field), 2);
        assert_eq!(count(TableId::MethodDef), 1);
        assert_eq!(count(TableId::Param), 1);
        assert!(sink
            .records
            .iter()
            .any(|(table, rid, original)| *table == TableId::Field && *rid == 2 && *original == Some(0x0400_0002)));
    }

    #[test]
    fn test_out_of_order() {
        let fixture = ModuleFixture::loaded(&[]);
        let mut writer = MetadataWriter::new(
            &fixture.module,
            &fixture.source,
            HeapBuilder::new(),
            WriterOptions::preserve_all(),
        );
        writer.allocate_type_rows().unwrap();
        assert!(matches!(
            writer.write_definitions(),
            Err(Error::StageOrder { .. })
        ));
        assert_eq!(writer.stage(), Stage::TypesAllocated);
    }
}
