//! Reference resolution.
//!
//! References (`TypeRef`, `MemberRef`, `StandAloneSig`, `TypeSpec`, `MethodSpec`) are not
//! collected up front; they get a row the first time something being written points at
//! them. Each kind keeps an identity-keyed ledger. A reference is entered with row 0
//! before its own nested references are resolved, so meeting a 0 again means the graph
//! loops back onto itself: that edge is reported and written as 0, and the rest of the
//! graph still resolves.
//!
//! An original row is reused only if its table is preserved and the input module resolves
//! that very row to the very same object. Anything else is appended.

use std::{collections::HashMap, sync::Arc};

use crate::{
    metadata::{
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity},
        model::{
            AssemblyRef, AssemblyRefRc, MemberRefParent, MemberRefRc, MetadataObject,
            MethodDefOrRef, MethodSpecRc, ModuleRef, ModuleRefRc, ObjectKey, Origin,
            ResolutionScope, StandAloneSig, StandAloneSigRc, TypeDefOrRef, TypeRef, TypeRefRc,
            TypeSpec, TypeSpecRc, MemberRef, MethodSpec,
        },
        signatures::{
            encode_local_var_signature, encode_member_ref_signature,
            encode_method_spec_signature, encode_standalone_signature, encode_typespec_signature,
            SignatureLocalVariables, TypeDefOrRefResolver,
        },
        streams::HeapWriter,
        tables::{
            AssemblyRefRaw, CodedIndex, CodedIndexType, MemberRefRaw, MethodSpecRaw, ModuleRefRaw,
            StandAloneSigRaw, TableId, TypeRefRaw, TypeSpecRaw,
        },
        token::Token,
    },
    writer::{progress::WritePhase, state::Stage, types::PRESERVED_REFERENCE_TABLES, MetadataWriter},
    Result,
};

/// Rows handed out for one reference kind. Row 0 marks a reference being resolved.
#[derive(Debug)]
pub(crate) struct RefLedger<T> {
    rids: HashMap<ObjectKey, (Arc<T>, u32)>,
}

impl<T> RefLedger<T> {
    fn new() -> Self {
        RefLedger {
            rids: HashMap::new(),
        }
    }

    /// Returns the row of `item`. The row is `Some(0)` while `item` is still being resolved.
    pub(crate) fn get(&self, item: &Arc<T>) -> Option<u32> {
        self.rids.get(&ObjectKey::of(item)).map(|(_, rid)| *rid)
    }

    fn begin(&mut self, item: &Arc<T>) {
        self.rids.insert(ObjectKey::of(item), (item.clone(), 0));
    }

    fn finish(&mut self, item: &Arc<T>, rid: u32) {
        self.rids.insert(ObjectKey::of(item), (item.clone(), rid));
    }

    pub(crate) fn len(&self) -> usize {
        self.rids.len()
    }
}

/// The ledgers of all reference kinds.
#[derive(Debug)]
pub(crate) struct ReferenceLedgers {
    pub(crate) type_refs: RefLedger<TypeRef>,
    pub(crate) member_refs: RefLedger<MemberRef>,
    pub(crate) standalone_sigs: RefLedger<StandAloneSig>,
    pub(crate) type_specs: RefLedger<TypeSpec>,
    pub(crate) method_specs: RefLedger<MethodSpec>,
    pub(crate) module_refs: RefLedger<ModuleRef>,
    pub(crate) assembly_refs: RefLedger<AssemblyRef>,
}

impl ReferenceLedgers {
    pub(crate) fn new() -> Self {
        ReferenceLedgers {
            type_refs: RefLedger::new(),
            member_refs: RefLedger::new(),
            standalone_sigs: RefLedger::new(),
            type_specs: RefLedger::new(),
            method_specs: RefLedger::new(),
            module_refs: RefLedger::new(),
            assembly_refs: RefLedger::new(),
        }
    }
}

impl<H: HeapWriter> MetadataWriter<'_, H> {
    /// `TypeRef` row of `type_ref`, resolving its scope chain first.
    ///
    /// # Errors
    ///
    /// Returns an error if called before types are allocated, or on a fatal condition
    /// while writing the row.
    pub fn add_type_ref(&mut self, type_ref: &TypeRefRc) -> Result<u32> {
        self.state.expect_at_least(Stage::TypesAllocated)?;
        if let Some(rid) = self.refs.type_refs.get(type_ref) {
            if rid == 0 {
                self.report_cycle("TypeRef", &type_ref.fullname(), type_ref.origin);
            }
            return Ok(rid);
        }

        self.refs.type_refs.begin(type_ref);
        let resolution_scope = self.add_resolution_scope(type_ref.scope())?;
        let row = TypeRefRaw {
            resolution_scope,
            type_name: self.heaps.intern_string(&type_ref.name)?,
            type_namespace: self.heaps.intern_string(&type_ref.namespace)?,
        };

        let object = MetadataObject::from(type_ref.clone());
        let rid = match self.reusable_rid(&object) {
            Some(rid) => {
                self.tables.type_ref.set(rid, row)?;
                rid
            }
            None => self.tables.type_ref.create(row)?,
        };

        self.refs.type_refs.finish(type_ref, rid);
        self.notify(&object, TableId::TypeRef, rid);
        Ok(rid)
    }

    /// `MemberRef` row of `member_ref`, resolving its parent and signature first.
    ///
    /// # Errors
    ///
    /// Returns an error if called before types are allocated, or on a fatal condition
    /// while encoding the signature or writing the row.
    pub fn add_member_ref(&mut self, member_ref: &MemberRefRc) -> Result<u32> {
        self.state.expect_at_least(Stage::TypesAllocated)?;
        if let Some(rid) = self.refs.member_refs.get(member_ref) {
            if rid == 0 {
                self.report_cycle("MemberRef", &member_ref.name, member_ref.origin);
            }
            return Ok(rid);
        }

        self.refs.member_refs.begin(member_ref);
        let class = self.add_member_ref_parent(&member_ref.parent)?;
        let signature = encode_member_ref_signature(&member_ref.signature, self)?;
        let row = MemberRefRaw {
            class,
            name: self.heaps.intern_string(&member_ref.name)?,
            signature: self.heaps.intern_blob(&signature)?,
        };

        let object = MetadataObject::from(member_ref.clone());
        let rid = match self.reusable_rid(&object) {
            Some(rid) => {
                self.tables.member_ref.set(rid, row)?;
                rid
            }
            None => self.tables.member_ref.create(row)?,
        };

        self.refs.member_refs.finish(member_ref, rid);
        self.notify(&object, TableId::MemberRef, rid);
        Ok(rid)
    }

    /// `StandAloneSig` row of `sig`.
    ///
    /// The original row is only reused if no local variable signature already claimed it
    /// with different bytes; otherwise a warning is reported and a new row appended.
    ///
    /// # Errors
    ///
    /// Returns an error if called before types are allocated, or on a fatal condition
    /// while encoding the signature or writing the row.
    pub fn add_standalone_sig(&mut self, sig: &StandAloneSigRc) -> Result<u32> {
        self.state.expect_at_least(Stage::TypesAllocated)?;
        if let Some(rid) = self.refs.standalone_sigs.get(sig) {
            if rid == 0 {
                self.report_cycle("StandAloneSig", "signature", sig.origin);
            }
            return Ok(rid);
        }

        self.refs.standalone_sigs.begin(sig);
        let bytes = encode_standalone_signature(&sig.signature, self)?;
        let row = StandAloneSigRaw {
            signature: self.heaps.intern_blob(&bytes)?,
        };

        let object = MetadataObject::from(sig.clone());
        let rid = match self.reusable_rid(&object) {
            Some(rid) => match self.standalone_claims.get(&rid) {
                Some(claimed) if *claimed == bytes => rid,
                Some(_) => {
                    self.report_unpreserved_sig(Token::from_parts(TableId::StandAloneSig, rid));
                    self.tables.standalone_sig.create(row)?
                }
                None => {
                    self.standalone_claims.insert(rid, bytes);
                    self.tables.standalone_sig.set(rid, row)?;
                    rid
                }
            },
            None => self.tables.standalone_sig.create(row)?,
        };

        self.refs.standalone_sigs.finish(sig, rid);
        self.notify(&object, TableId::StandAloneSig, rid);
        Ok(rid)
    }

    /// `StandAloneSig` row for the local variables of a method body.
    ///
    /// `original` is the token the body referenced in the input module. Its row is reused
    /// if the table is preserved and the row is either unclaimed or claimed with exactly
    /// the same bytes. A conflicting claim degrades to a new row and a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if called before types are allocated, or on a fatal condition
    /// while encoding the signature or writing the row.
    pub fn add_local_sig(
        &mut self,
        locals: &SignatureLocalVariables,
        original: Token,
    ) -> Result<u32> {
        self.state.expect_at_least(Stage::TypesAllocated)?;
        let bytes = encode_local_var_signature(locals, self)?;
        let row = StandAloneSigRaw {
            signature: self.heaps.intern_blob(&bytes)?,
        };

        let rid = original.row();
        let reusable = self.options.preserves(TableId::StandAloneSig)
            && original.is_table(TableId::StandAloneSig)
            && self.source.is_valid_rid(TableId::StandAloneSig, rid);
        if !reusable {
            return self.tables.standalone_sig.create(row);
        }

        match self.standalone_claims.get(&rid) {
            Some(claimed) if *claimed == bytes => Ok(rid),
            Some(_) => {
                self.report_unpreserved_sig(original);
                self.tables.standalone_sig.create(row)
            }
            None => {
                self.standalone_claims.insert(rid, bytes);
                self.tables.standalone_sig.set(rid, row)?;
                if let Some(MetadataObject::StandAloneSig(sig)) =
                    self.source.resolve(TableId::StandAloneSig, rid)
                {
                    if self.refs.standalone_sigs.get(&sig).is_none() {
                        self.refs.standalone_sigs.finish(&sig, rid);
                        self.notify(&MetadataObject::StandAloneSig(sig), TableId::StandAloneSig, rid);
                    }
                }
                Ok(rid)
            }
        }
    }

    /// `TypeSpec` row of `type_spec`, resolving the types in its signature first.
    ///
    /// # Errors
    ///
    /// Returns an error if called before types are allocated, or on a fatal condition
    /// while encoding the signature or writing the row.
    pub fn add_type_spec(&mut self, type_spec: &TypeSpecRc) -> Result<u32> {
        self.state.expect_at_least(Stage::TypesAllocated)?;
        if let Some(rid) = self.refs.type_specs.get(type_spec) {
            if rid == 0 {
                self.report_cycle("TypeSpec", "type specification", type_spec.origin);
            }
            return Ok(rid);
        }

        self.refs.type_specs.begin(type_spec);
        let bytes = match type_spec.signature() {
            Some(signature) => encode_typespec_signature(signature, self)?,
            None => {
                self.diagnostics.error(
                    DiagnosticCategory::Signature,
                    "TypeSpec has no signature, an empty blob is written",
                );
                Vec::new()
            }
        };
        let row = TypeSpecRaw {
            signature: self.heaps.intern_blob(&bytes)?,
        };

        let object = MetadataObject::from(type_spec.clone());
        let rid = match self.reusable_rid(&object) {
            Some(rid) => {
                self.tables.type_spec.set(rid, row)?;
                rid
            }
            None => self.tables.type_spec.create(row)?,
        };

        self.refs.type_specs.finish(type_spec, rid);
        self.notify(&object, TableId::TypeSpec, rid);
        Ok(rid)
    }

    /// `MethodSpec` row of `method_spec`, resolving its method and arguments first.
    ///
    /// # Errors
    ///
    /// Returns an error if called before types are allocated, or on a fatal condition
    /// while encoding the instantiation or writing the row.
    pub fn add_method_spec(&mut self, method_spec: &MethodSpecRc) -> Result<u32> {
        self.state.expect_at_least(Stage::TypesAllocated)?;
        if let Some(rid) = self.refs.method_specs.get(method_spec) {
            if rid == 0 {
                self.report_cycle("MethodSpec", "method instantiation", method_spec.origin);
            }
            return Ok(rid);
        }

        self.refs.method_specs.begin(method_spec);
        let method = self.add_method_def_or_ref(&method_spec.method)?;
        let instantiation = encode_method_spec_signature(&method_spec.instantiation, self)?;
        let row = MethodSpecRaw {
            method,
            instantiation: self.heaps.intern_blob(&instantiation)?,
        };

        let object = MetadataObject::from(method_spec.clone());
        let rid = match self.reusable_rid(&object) {
            Some(rid) => {
                self.tables.method_spec.set(rid, row)?;
                rid
            }
            None => self.tables.method_spec.create(row)?,
        };

        self.refs.method_specs.finish(method_spec, rid);
        self.notify(&object, TableId::MethodSpec, rid);
        Ok(rid)
    }

    /// Returns the `ModuleRef` row of `module_ref`, appending the row on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the table overflows.
    pub fn add_module_ref(&mut self, module_ref: &ModuleRefRc) -> Result<u32> {
        if let Some(rid) = self.refs.module_refs.get(module_ref) {
            return Ok(rid);
        }

        let name = self.heaps.intern_string(&module_ref.name)?;
        let rid = self.tables.module_ref.create(ModuleRefRaw { name })?;
        self.refs.module_refs.finish(module_ref, rid);
        self.notify(
            &MetadataObject::ModuleRef(module_ref.clone()),
            TableId::ModuleRef,
            rid,
        );
        Ok(rid)
    }

    /// Returns the `AssemblyRef` row of `assembly_ref`, appending the row on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the table overflows.
    pub fn add_assembly_ref(&mut self, assembly_ref: &AssemblyRefRc) -> Result<u32> {
        if let Some(rid) = self.refs.assembly_refs.get(assembly_ref) {
            return Ok(rid);
        }

        let row = AssemblyRefRaw {
            major_version: u32::from(assembly_ref.version[0]),
            minor_version: u32::from(assembly_ref.version[1]),
            build_number: u32::from(assembly_ref.version[2]),
            revision_number: u32::from(assembly_ref.version[3]),
            flags: assembly_ref.flags,
            public_key_or_token: self.heaps.intern_blob(&assembly_ref.public_key_or_token)?,
            name: self.heaps.intern_string(&assembly_ref.name)?,
            culture: self.heaps.intern_string(&assembly_ref.culture)?,
            hash_value: self.heaps.intern_blob(&assembly_ref.hash_value)?,
        };
        let rid = self.tables.assembly_ref.create(row)?;
        self.refs.assembly_refs.finish(assembly_ref, rid);
        self.notify(
            &MetadataObject::AssemblyRef(assembly_ref.clone()),
            TableId::AssemblyRef,
            rid,
        );
        Ok(rid)
    }

    /// `TypeDefOrRef` coded index of `ty`.
    ///
    /// # Errors
    ///
    /// Returns an error on a fatal condition while resolving a reference.
    pub fn add_type_def_or_ref(&mut self, ty: &TypeDefOrRef) -> Result<CodedIndex> {
        Ok(match ty {
            TypeDefOrRef::TypeDef(type_def) => {
                CodedIndex::new(TableId::TypeDef, self.type_def_rid(type_def))
            }
            TypeDefOrRef::TypeRef(type_ref) => {
                CodedIndex::new(TableId::TypeRef, self.add_type_ref(type_ref)?)
            }
            TypeDefOrRef::TypeSpec(type_spec) => {
                CodedIndex::new(TableId::TypeSpec, self.add_type_spec(type_spec)?)
            }
        })
    }

    fn add_resolution_scope(&mut self, scope: Option<&ResolutionScope>) -> Result<CodedIndex> {
        Ok(match scope {
            None => CodedIndex::null(CodedIndexType::ResolutionScope),
            Some(ResolutionScope::Module) => CodedIndex::new(TableId::Module, 1),
            Some(ResolutionScope::ModuleRef(module_ref)) => {
                CodedIndex::new(TableId::ModuleRef, self.add_module_ref(module_ref)?)
            }
            Some(ResolutionScope::AssemblyRef(assembly_ref)) => {
                CodedIndex::new(TableId::AssemblyRef, self.add_assembly_ref(assembly_ref)?)
            }
            Some(ResolutionScope::TypeRef(type_ref)) => {
                CodedIndex::new(TableId::TypeRef, self.add_type_ref(type_ref)?)
            }
        })
    }

    fn add_member_ref_parent(&mut self, parent: &MemberRefParent) -> Result<CodedIndex> {
        Ok(match parent {
            MemberRefParent::TypeDef(type_def) => {
                CodedIndex::new(TableId::TypeDef, self.type_def_rid(type_def))
            }
            MemberRefParent::TypeRef(type_ref) => {
                CodedIndex::new(TableId::TypeRef, self.add_type_ref(type_ref)?)
            }
            MemberRefParent::ModuleRef(module_ref) => {
                CodedIndex::new(TableId::ModuleRef, self.add_module_ref(module_ref)?)
            }
            MemberRefParent::MethodDef(method) => {
                CodedIndex::new(TableId::MethodDef, self.method_rid(method))
            }
            MemberRefParent::TypeSpec(type_spec) => {
                CodedIndex::new(TableId::TypeSpec, self.add_type_spec(type_spec)?)
            }
        })
    }

    fn add_method_def_or_ref(&mut self, method: &MethodDefOrRef) -> Result<CodedIndex> {
        Ok(match method {
            MethodDefOrRef::MethodDef(method) => {
                CodedIndex::new(TableId::MethodDef, self.method_rid(method))
            }
            MethodDefOrRef::MemberRef(member_ref) => {
                CodedIndex::new(TableId::MemberRef, self.add_member_ref(member_ref)?)
            }
        })
    }

    /// Resolves any reference object through the entry point of its kind.
    ///
    /// Definitions are looked up, not allocated.
    ///
    /// # Errors
    ///
    /// Returns an error on a fatal condition while resolving.
    pub fn add_reference(&mut self, object: &MetadataObject) -> Result<u32> {
        match object {
            MetadataObject::TypeRef(item) => self.add_type_ref(item),
            MetadataObject::MemberRef(item) => self.add_member_ref(item),
            MetadataObject::StandAloneSig(item) => self.add_standalone_sig(item),
            MetadataObject::TypeSpec(item) => self.add_type_spec(item),
            MetadataObject::MethodSpec(item) => self.add_method_spec(item),
            MetadataObject::ModuleRef(item) => self.add_module_ref(item),
            MetadataObject::AssemblyRef(item) => self.add_assembly_ref(item),
            MetadataObject::TypeDef(item) => Ok(self.type_def_rid(item)),
            MetadataObject::Field(item) => Ok(self.field_rid(item)),
            MetadataObject::MethodDef(item) => Ok(self.method_rid(item)),
            MetadataObject::Param(item) => Ok(self.param_rid(item)),
            MetadataObject::Event(item) => Ok(self.event_rid(item)),
            MetadataObject::Property(item) => Ok(self.property_rid(item)),
        }
    }

    /// Re-adds every original row of a preserved reference table the rewrite never reached.
    ///
    /// Rows claimed by local variable signatures are left alone. Rows the input module
    /// cannot resolve stay empty. Running this more than once is harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if called before definitions are written, or on a fatal condition
    /// while resolving a row.
    pub fn sweep_untouched_references(&mut self) -> Result<()> {
        // Local signatures claim their rows while definitions are written
        self.state.expect_at_least(Stage::DefinitionsWritten)?;

        let steps = PRESERVED_REFERENCE_TABLES.len() as u32;
        for (step, table) in PRESERVED_REFERENCE_TABLES.into_iter().enumerate() {
            self.progress
                .report(WritePhase::SweepReferences, step as u32, steps);
            if !self.options.preserves(table) || !self.state.mark_swept(table) {
                continue;
            }

            for rid in 1..=self.source.row_count(table) {
                if table == TableId::StandAloneSig && self.standalone_claims.contains_key(&rid) {
                    continue;
                }
                if let Some(object) = self.source.resolve(table, rid) {
                    if object.table() == table {
                        self.add_reference(&object)?;
                    }
                }
            }
        }
        self.progress
            .report(WritePhase::SweepReferences, steps, steps);
        Ok(())
    }

    /// Returns the original row of `object` if it may be reused.
    fn reusable_rid(&self, object: &MetadataObject) -> Option<u32> {
        let table = object.table();
        if !self.options.preserves(table) {
            return None;
        }

        let rid = match object.origin() {
            Origin::Loaded(rid) if rid != 0 => rid,
            _ => return None,
        };
        if !self.source.is_valid_rid(table, rid) {
            return None;
        }

        self.source
            .resolve(table, rid)
            .filter(|original| original.is_same(object))
            .map(|_| rid)
    }

    fn report_cycle(&self, kind: &str, name: &str, origin: Origin) {
        let mut diagnostic = Diagnostic::new(
            DiagnosticSeverity::Error,
            DiagnosticCategory::Reference,
            format!("{kind} '{name}' refers back to itself, the recursive reference is written as 0"),
        );
        if let Some(table) = reference_table(kind) {
            if origin.is_loaded() {
                diagnostic =
                    diagnostic.with_token(Token::from_parts(table, origin.original_rid()));
            }
        }
        self.diagnostics.push(diagnostic);
    }

    fn report_unpreserved_sig(&self, original: Token) {
        self.diagnostics.push(
            Diagnostic::new(
                DiagnosticSeverity::Warning,
                DiagnosticCategory::Signature,
                format!("Could not preserve StandAloneSig token {original}"),
            )
            .with_token(original),
        );
    }
}

fn reference_table(kind: &str) -> Option<TableId> {
    match kind {
        "TypeRef" => Some(TableId::TypeRef),
        "MemberRef" => Some(TableId::MemberRef),
        "StandAloneSig" => Some(TableId::StandAloneSig),
        "TypeSpec" => Some(TableId::TypeSpec),
        "MethodSpec" => Some(TableId::MethodSpec),
        _ => None,
    }
}

impl<H: HeapWriter> TypeDefOrRefResolver for MetadataWriter<'_, H> {
    fn resolve_type_def_or_ref(&mut self, ty: &TypeDefOrRef) -> Result<CodedIndex> {
        self.add_type_def_or_ref(ty)
    }
}
