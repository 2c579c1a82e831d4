//! Integration tests for row preservation of definition tables.

mod common;

use std::sync::Arc;

use common::Sample;
use dotscope_preserve::prelude::*;

fn name_of(output: &WriteOutput<HeapBuilder>, offset: u32) -> &str {
    output.heaps.get_string(offset).unwrap_or_default()
}

#[test]
fn unchanged_module_keeps_every_token() -> Result<()> {
    let sample = Sample::new();
    let originals = sample.definitions();

    let mut writer = sample.writer(WriterOptions::preserve_all());
    writer.run()?;
    for object in &originals {
        assert_eq!(
            writer.token(object),
            object.original_token(),
            "{:?} moved",
            object
        );
    }
    let output = writer.finish()?;

    let tables = &output.tables;
    assert_eq!(tables.type_def.row_count(), 4);
    assert_eq!(tables.field.row_count(), 3);
    assert_eq!(tables.method_def.row_count(), 4);
    assert_eq!(tables.param.row_count(), 3);
    assert_eq!(tables.event.row_count(), 1);
    assert_eq!(tables.property.row_count(), 1);
    for ptr in [
        TableId::FieldPtr,
        TableId::MethodPtr,
        TableId::ParamPtr,
        TableId::EventPtr,
        TableId::PropertyPtr,
    ] {
        assert_eq!(tables.row_count(ptr), 0, "{ptr:?} should not be needed");
    }

    let lists: Vec<(u32, u32)> = tables
        .type_def
        .iter()
        .map(|row| (row.field_list, row.method_list))
        .collect();
    assert_eq!(lists, vec![(1, 1), (1, 1), (3, 3), (4, 4)]);
    let param_lists: Vec<u32> = tables.method_def.iter().map(|row| row.param_list).collect();
    assert_eq!(param_lists, vec![1, 2, 3, 4]);

    assert_eq!(output.placeholder_type, None);
    assert!(!output.diagnostics.has_any());
    Ok(())
}

#[test]
fn deleted_field_is_replaced_by_placeholder() -> Result<()> {
    let sample = Sample::new();
    let name = sample.program.fields()[1].clone();
    sample.program.remove_field(&name);
    let cache = sample.helper.fields()[0].clone();

    let mut writer = sample.writer(WriterOptions::preserve_all());
    writer.run()?;
    assert_eq!(
        writer.token(&cache.clone().into()),
        Some(Token::new(0x0400_0003))
    );
    let output = writer.finish()?;
    let tables = &output.tables;

    assert_eq!(tables.field.row_count(), 3);
    let ptr: Vec<u32> = tables.field_ptr.iter().map(|row| row.field).collect();
    assert_eq!(ptr, vec![1, 3, 2]);

    let placeholder = output.placeholder_type.unwrap_or_default();
    assert_eq!(placeholder, 5);
    let owner = tables.type_def.get(placeholder).unwrap();
    assert_eq!(name_of(&output, owner.type_namespace), "dummy_ptr");
    assert_eq!(owner.field_list, 3);

    // Helper's list starts at the logical position of `cache`
    assert_eq!(tables.type_def.get(3).unwrap().field_list, 2);
    assert_eq!(name_of(&output, tables.field.get(2).unwrap().name), "f000002");
    Ok(())
}

#[test]
fn deleted_last_field_keeps_table_size() -> Result<()> {
    let sample = Sample::new();
    let cache = sample.helper.fields()[0].clone();
    sample.helper.remove_field(&cache);
    let kept = sample.program.fields();

    let mut writer = sample.writer(WriterOptions::preserve_all());
    writer.run()?;
    assert_eq!(writer.token(&kept[0].clone().into()), Some(Token::new(0x0400_0001)));
    assert_eq!(writer.token(&kept[1].clone().into()), Some(Token::new(0x0400_0002)));
    let output = writer.finish()?;
    let tables = &output.tables;

    assert_eq!(tables.field.row_count(), 3);
    let ptr: Vec<u32> = tables.field_ptr.iter().map(|row| row.field).collect();
    assert_eq!(ptr, vec![1, 2, 3]);
    assert_eq!(name_of(&output, tables.field.get(3).unwrap().name), "f000003");

    // Helper and Extra own no fields, the placeholder type owns row 3
    assert_eq!(tables.type_def.get(3).unwrap().field_list, 3);
    assert_eq!(tables.type_def.get(4).unwrap().field_list, 3);
    assert_eq!(output.placeholder_type, Some(5));
    assert_eq!(tables.type_def.get(5).unwrap().field_list, 3);

    let filled = output.diagnostics.by_category(DiagnosticCategory::Table);
    assert_eq!(filled.len(), 1);
    assert_eq!(filled[0].severity, DiagnosticSeverity::Info);
    assert_eq!(filled[0].table_row, Some((TableId::Field as u8, 3)));
    Ok(())
}

#[test]
fn deleted_type_leaves_dummy_type() -> Result<()> {
    let sample = Sample::new();
    sample.module.remove_type(&sample.helper);
    let extra_method = sample.extra.methods()[0].clone();

    let mut writer = sample.writer(WriterOptions::preserve_all());
    writer.run()?;
    assert_eq!(
        writer.token(&sample.extra.clone().into()),
        Some(Token::new(0x0200_0004))
    );
    assert_eq!(
        writer.token(&extra_method.into()),
        Some(Token::new(0x0600_0004))
    );
    let output = writer.finish()?;
    let tables = &output.tables;

    assert_eq!(tables.type_def.row_count(), 5);
    let dummy = tables.type_def.get(3).unwrap();
    assert_eq!(dummy.flags, 0x80);
    assert_eq!(name_of(&output, dummy.type_namespace), "dummy");
    assert_eq!(dummy.extends.row, 1);

    // Method 3 belonged to the deleted type and is now a placeholder; method 5 is the
    // synthetic owner of its orphaned parameter
    let ptr: Vec<u32> = tables.method_ptr.iter().map(|row| row.method).collect();
    assert_eq!(ptr, vec![1, 2, 4, 3, 5]);
    assert_eq!(tables.type_def.get(4).unwrap().method_list, 3);
    assert_eq!(name_of(&output, tables.method_def.get(3).unwrap().name), "m000003");
    assert_eq!(name_of(&output, tables.method_def.get(5).unwrap().name), "mp000003");

    // Every deleted row was the last of its table, and still exists
    assert_eq!(output.placeholder_type, Some(5));
    let placeholder = tables.type_def.get(5).unwrap();
    assert_eq!((placeholder.field_list, placeholder.method_list), (3, 4));
    assert_eq!(tables.field.row_count(), 3);
    assert_eq!(name_of(&output, tables.field.get(3).unwrap().name), "f000003");
    assert_eq!(tables.param.row_count(), 3);
    let ptr: Vec<u32> = tables.param_ptr.iter().map(|row| row.param).collect();
    assert_eq!(ptr, vec![1, 2, 3]);

    assert_eq!(tables.event.row_count(), 1);
    assert_eq!(tables.event_ptr.row_count(), 1);
    assert_eq!(tables.event_map.get(1).unwrap().parent, 5);
    assert_eq!(tables.property.row_count(), 1);
    assert_eq!(tables.property_ptr.row_count(), 1);
    assert_eq!(tables.property_map.get(1).unwrap().parent, 5);
    Ok(())
}

#[test]
fn no_preservation_renumbers_densely() -> Result<()> {
    let sample = Sample::new();
    sample.module.remove_type(&sample.helper);
    let extra_method = sample.extra.methods()[0].clone();

    let mut writer = sample.writer(WriterOptions::preserve_none());
    writer.run()?;
    assert_eq!(
        writer.token(&sample.extra.clone().into()),
        Some(Token::new(0x0200_0003))
    );
    assert_eq!(
        writer.token(&extra_method.into()),
        Some(Token::new(0x0600_0003))
    );
    let output = writer.finish()?;

    assert_eq!(output.tables.type_def.row_count(), 3);
    assert!(output.tables.method_ptr.is_empty());
    assert_eq!(output.placeholder_type, None);
    Ok(())
}

#[test]
fn added_definitions_follow_originals() -> Result<()> {
    let sample = Sample::new();
    let added_field = Arc::new(Field::new(
        Origin::Created,
        0x0001,
        "added",
        SignatureField::new(TypeSignature::String),
    ));
    sample.helper.add_field(added_field.clone());

    let fresh_type = Arc::new(TypeDef::new(Origin::Created, 0x0010_0001, "Sample", "Fresh"));
    fresh_type.set_base(TypeDefOrRef::TypeRef(sample.object.clone()));
    let fresh_method = Arc::new(MethodDef::new(
        Origin::Created,
        0x0086,
        "Go",
        SignatureMethod::instance(TypeSignature::Void, vec![TypeSignature::I4]),
    ));
    let fresh_param = Arc::new(Param::new(Origin::Created, 0, 1, "value"));
    fresh_method.add_param(fresh_param.clone());
    fresh_type.add_method(fresh_method.clone());
    sample.module.add_type(fresh_type.clone());

    let mut writer = sample.writer(WriterOptions::preserve_all());
    writer.run()?;

    assert_eq!(writer.token(&added_field.into()), Some(Token::new(0x0400_0004)));
    assert_eq!(writer.token(&fresh_type.into()), Some(Token::new(0x0200_0005)));
    assert_eq!(writer.token(&fresh_method.into()), Some(Token::new(0x0600_0005)));
    assert_eq!(writer.token(&fresh_param.into()), Some(Token::new(0x0800_0004)));

    let output = writer.finish()?;
    assert!(output.tables.field_ptr.is_empty());
    assert!(output.tables.method_ptr.is_empty());
    assert_eq!(output.tables.type_def.get(5).unwrap().method_list, 5);
    Ok(())
}

#[test]
fn partial_preservation() -> Result<()> {
    let sample = Sample::new();
    sample.program.remove_field(&sample.program.fields()[0]);
    let name = sample.program.fields()[0].clone();

    let options = WriterOptions::new(MetadataFlags::PRESERVE_TYPE_DEF_RIDS);
    let mut writer = sample.writer(options);
    writer.run()?;

    // Fields are renumbered, types are not
    assert_eq!(writer.token(&name.into()), Some(Token::new(0x0400_0001)));
    assert_eq!(
        writer.token(&sample.helper.clone().into()),
        Some(Token::new(0x0200_0003))
    );
    writer.finish()?;
    Ok(())
}

#[test]
fn progress_reaches_every_phase() -> Result<()> {
    let sample = Sample::new();
    let mut seen = Vec::new();
    {
        let mut writer = sample
            .writer(WriterOptions::preserve_all())
            .with_progress(|phase, fraction| seen.push((phase, fraction)));
        writer.run()?;
    }

    for phase in [
        WritePhase::AllocateTypes,
        WritePhase::AllocateMembers,
        WritePhase::WriteDefinitions,
        WritePhase::SweepReferences,
    ] {
        let last = seen
            .iter()
            .filter(|(p, _)| *p == phase)
            .map(|(_, fraction)| *fraction)
            .last();
        assert_eq!(last, Some(1.0), "{phase} did not complete");
    }
    Ok(())
}

#[test]
fn entry_points_run_in_order() -> Result<()> {
    let sample = Sample::new();
    let mut writer = sample.writer(WriterOptions::preserve_all());

    assert!(matches!(
        writer.write_definitions(),
        Err(Error::StageOrder { .. })
    ));
    writer.run()?;
    assert_eq!(writer.stage(), Stage::DefinitionsWritten);
    assert!(matches!(writer.run(), Err(Error::StageOrder { .. })));

    // The sweep may run again without effect
    let rows = writer.tables().type_ref.row_count();
    writer.sweep_untouched_references()?;
    assert_eq!(writer.tables().type_ref.row_count(), rows);
    Ok(())
}
