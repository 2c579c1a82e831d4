//! Integration tests for reference resolution and the untouched-row sweep.

mod common;

use std::sync::Arc;

use common::Sample;
use dotscope_preserve::prelude::*;

#[test]
fn scope_cycle_is_reported_once() -> Result<()> {
    let sample = Sample::new();
    let outer = Arc::new(TypeRef::new(Origin::Created, "Looping", "Outer"));
    let inner = Arc::new(TypeRef::new(Origin::Created, "Looping", "Inner"));
    outer.set_scope(ResolutionScope::TypeRef(inner.clone()));
    inner.set_scope(ResolutionScope::TypeRef(outer.clone()));

    let looped = Arc::new(TypeDef::new(Origin::Created, 0x0010_0001, "Sample", "Looped"));
    looped.set_base(TypeDefOrRef::TypeRef(outer.clone()));
    sample.module.add_type(looped);

    let mut writer = sample.writer(WriterOptions::preserve_all());
    writer.run()?;

    // Inner finishes first; its scope is the edge that closes the loop
    assert_eq!(writer.token(&inner.clone().into()), Some(Token::new(0x0100_0002)));
    assert_eq!(writer.token(&outer.clone().into()), Some(Token::new(0x0100_0003)));

    let output = writer.finish()?;
    let inner_row = output.tables.type_ref.get(2).unwrap();
    assert_eq!(inner_row.resolution_scope.row, 0);
    let outer_row = output.tables.type_ref.get(3).unwrap();
    assert_eq!(outer_row.resolution_scope.tag, TableId::TypeRef);
    assert_eq!(outer_row.resolution_scope.row, 2);

    assert_eq!(output.diagnostics.error_count(), 1);
    assert_eq!(
        output.diagnostics.by_category(DiagnosticCategory::Reference).len(),
        1
    );
    Ok(())
}

#[test]
fn conflicting_local_signature_gets_new_row() -> Result<()> {
    let sample = Sample::new();
    sample
        .source
        .insert(Arc::new(StandAloneSig::local_variables(Origin::Loaded(1), vec![TypeSignature::I4])).into());

    let original = Token::new(0x1100_0001);
    let with_locals = |name: &str, locals: Vec<TypeSignature>| {
        Arc::new(
            MethodDef::new(
                Origin::Created,
                0x0096,
                name,
                SignatureMethod::new(TypeSignature::Void, Vec::new()),
            )
            .with_body(MethodBody {
                local_var_sig: Some(SignatureLocalVariables::new(locals)),
                original_local_var_token: original,
            }),
        )
    };
    sample.extra.add_method(with_locals("Same", vec![TypeSignature::I4]));
    sample.extra.add_method(with_locals("Other", vec![TypeSignature::String]));

    let mut writer = sample.writer(WriterOptions::preserve_all());
    writer.run()?;
    let output = writer.finish()?;

    // Methods 5 and 6 are the new ones, written in that order
    assert_eq!(output.local_var_sigs.get(&5), Some(&original));
    assert_eq!(output.local_var_sigs.get(&6), Some(&Token::new(0x1100_0002)));
    assert_eq!(output.tables.standalone_sig.row_count(), 2);

    let warnings = output.diagnostics.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].category, DiagnosticCategory::Signature);
    assert_eq!(warnings[0].token, Some(original));
    Ok(())
}

#[test]
fn untouched_references_are_swept() -> Result<()> {
    let sample = Sample::new();
    let console = Arc::new(TypeRef::new(Origin::Loaded(2), "System", "Console"));
    console.set_scope(ResolutionScope::AssemblyRef(sample.corlib.clone()));
    let write_line = Arc::new(MemberRef::new(
        Origin::Loaded(1),
        MemberRefParent::TypeRef(console.clone()),
        "WriteLine",
        MemberRefSignature::Method(SignatureMethod::new(
            TypeSignature::Void,
            vec![TypeSignature::String],
        )),
    ));
    sample.source.insert(console.into());
    sample.source.insert(write_line.into());

    let mut writer = sample.writer(WriterOptions::preserve_all());
    writer.run()?;
    let output = writer.finish()?;

    let names: Vec<&str> = output
        .tables
        .type_ref
        .iter()
        .map(|row| output.heaps.get_string(row.type_name).unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["Object", "Console"]);

    assert_eq!(output.tables.member_ref.row_count(), 1);
    let member = output.tables.member_ref.get(1).unwrap();
    assert_eq!(output.heaps.get_string(member.name), Some("WriteLine"));
    assert_eq!(member.class.tag, TableId::TypeRef);
    assert_eq!(member.class.row, 2);
    // HASTHIS clear, one parameter, void (string)
    assert_eq!(
        output.heaps.get_blob(member.signature),
        Some(&[0x00, 0x01, 0x01, 0x0e][..])
    );
    Ok(())
}

#[test]
fn type_spec_resolves_nested_references() -> Result<()> {
    let sample = Sample::new();
    let list = Arc::new(TypeRef::new(Origin::Created, "System.Collections.Generic", "List`1"));
    list.set_scope(ResolutionScope::AssemblyRef(sample.corlib.clone()));
    let list_of_int = Arc::new(TypeSpec::new(
        Origin::Created,
        TypeSignature::GenericInst(
            Box::new(TypeSignature::Class(TypeDefOrRef::TypeRef(list))),
            vec![TypeSignature::I4],
        ),
    ));

    let derived = Arc::new(TypeDef::new(Origin::Created, 0x0010_0001, "Sample", "Numbers"));
    derived.set_base(TypeDefOrRef::TypeSpec(list_of_int.clone()));
    sample.module.add_type(derived);

    let mut writer = sample.writer(WriterOptions::preserve_all());
    writer.run()?;
    assert_eq!(writer.token(&list_of_int.into()), Some(Token::new(0x1b00_0001)));
    let output = writer.finish()?;

    let numbers = output.tables.type_def.get(5).unwrap();
    assert_eq!(numbers.extends.tag, TableId::TypeSpec);
    assert_eq!(numbers.extends.row, 1);

    // GENERICINST CLASS TypeRef(2) 1 I4
    let spec = output.tables.type_spec.get(1).unwrap();
    assert_eq!(
        output.heaps.get_blob(spec.signature),
        Some(&[0x15, 0x12, 0x09, 0x01, 0x08][..])
    );
    assert!(!output.diagnostics.has_any());
    Ok(())
}

#[test]
fn reference_to_deleted_method_is_reported() -> Result<()> {
    let sample = Sample::new();
    let run = sample.program.methods()[1].clone();
    sample.program.remove_method(&run);

    let mut writer = sample.writer(WriterOptions::preserve_all());
    writer.run()?;

    let dangling = Arc::new(MemberRef::new(
        Origin::Created,
        MemberRefParent::MethodDef(run),
        "Run",
        MemberRefSignature::Method(SignatureMethod::new(TypeSignature::Void, Vec::new())),
    ));
    let rid = writer.add_member_ref(&dangling)?;
    assert_eq!(rid, 1);
    assert_eq!(writer.tables().member_ref.get(rid).unwrap().class.row, 0);

    let errors = writer.diagnostics().errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category, DiagnosticCategory::Method);
    assert_eq!(errors[0].token, Some(Token::new(0x0600_0002)));
    assert!(errors[0].message.contains("is not defined in this module"));
    Ok(())
}

#[test]
fn attribute_sink_sees_final_rows() -> Result<()> {
    let sample = Sample::new();
    sample.module.remove_type(&sample.helper);

    let mut sink = RecordingSink::default();
    {
        let mut writer = sample
            .writer(WriterOptions::preserve_all())
            .with_attribute_sink(&mut sink);
        writer.run()?;
    }

    // Extra keeps row 4 and is reported with its original token
    assert!(sink
        .records
        .iter()
        .any(|record| *record == (TableId::TypeDef, 4, Some(0x0200_0004))));
    // The dummy type has no object behind it
    assert!(!sink
        .records
        .iter()
        .any(|(table, rid, _)| *table == TableId::TypeDef && *rid == 3));
    assert!(sink
        .records
        .iter()
        .any(|record| *record == (TableId::TypeRef, 1, Some(0x0100_0001))));
    Ok(())
}
