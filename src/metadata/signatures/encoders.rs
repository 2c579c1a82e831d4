//! Dedicated signature encoders for .NET metadata blob encoding.
//!
//! Each encoder implements the ECMA-335 binary format of one signature kind. Class and
//! value types inside a signature are graph references, so every encoder takes a
//! [`TypeDefOrRefResolver`] that turns such a reference into a row. During a write pass
//! the resolver is the writer itself, which is how references reachable only through
//! signatures end up in the `TypeRef` and `TypeSpec` tables.
//!
//! # Available Encoders
//!
//! - [`encode_method_signature`] - Method signatures for MethodDef, MemberRef, StandAloneSig
//! - [`encode_field_signature`] - Field signatures for Field and MemberRef tables
//! - [`encode_property_signature`] - Property signatures for Property table
//! - [`encode_local_var_signature`] - Local variable signatures for StandAloneSig table
//! - [`encode_typespec_signature`] - Type specification signatures for TypeSpec table
//! - [`encode_method_spec_signature`] - Generic instantiations for MethodSpec table

use crate::{
    metadata::{
        model::TypeDefOrRef,
        signatures::{
            CustomModifier, MemberRefSignature, SignatureField, SignatureLocalVariables,
            SignatureMethod, SignatureMethodSpec, SignatureParameter, SignatureProperty,
            StandAloneSignature, TypeSignature, CALLING_CONVENTION, ELEMENT_TYPE,
            SIGNATURE_HEADER,
        },
        tables::{CodedIndex, CodedIndexType},
    },
    utils::{write_compressed_int, write_compressed_uint},
    Error, Result,
};

/// Maps a type reference found inside a signature to its row.
pub trait TypeDefOrRefResolver {
    /// Returns the `TypeDefOrRef` coded index of `ty`.
    ///
    /// Implementations that cannot resolve `ty` return a null index; only conditions that
    /// must abort the whole encoding are reported as `Err`.
    ///
    /// # Errors
    ///
    /// Returns an error if resolving `ty` hits a fatal condition.
    fn resolve_type_def_or_ref(&mut self, ty: &TypeDefOrRef) -> Result<CodedIndex>;
}

fn write_count(len: usize, what: &str, buffer: &mut Vec<u8>) -> Result<()> {
    let count = u32::try_from(len)
        .map_err(|_| Error::SignatureEncoding(format!("Too many {what} in signature: {len}")))?;
    write_compressed_uint(count, buffer)
}

/// Encodes a `TypeDefOrRefEncoded` value (II.23.2.8).
fn encode_type_def_or_ref(
    ty: &TypeDefOrRef,
    resolver: &mut dyn TypeDefOrRefResolver,
    buffer: &mut Vec<u8>,
) -> Result<()> {
    let index = resolver.resolve_type_def_or_ref(ty)?;
    let coded = index.encode(CodedIndexType::TypeDefOrRef)?;
    write_compressed_uint(coded, buffer)
}

fn encode_custom_modifiers(
    modifiers: &[CustomModifier],
    resolver: &mut dyn TypeDefOrRefResolver,
    buffer: &mut Vec<u8>,
) -> Result<()> {
    for modifier in modifiers {
        buffer.push(if modifier.is_required {
            ELEMENT_TYPE::CMOD_REQD
        } else {
            ELEMENT_TYPE::CMOD_OPT
        });
        encode_type_def_or_ref(&modifier.modifier_type, resolver, buffer)?;
    }
    Ok(())
}

/// Encodes a single type (II.23.2.12) into `buffer`.
///
/// # Errors
///
/// Returns an error if a nested count or integer cannot be encoded, or if the resolver
/// reports a fatal condition.
pub fn encode_type_signature(
    signature: &TypeSignature,
    resolver: &mut dyn TypeDefOrRefResolver,
    buffer: &mut Vec<u8>,
) -> Result<()> {
    match signature {
        TypeSignature::Void => buffer.push(ELEMENT_TYPE::VOID),
        TypeSignature::Boolean => buffer.push(ELEMENT_TYPE::BOOLEAN),
        TypeSignature::Char => buffer.push(ELEMENT_TYPE::CHAR),
        TypeSignature::I1 => buffer.push(ELEMENT_TYPE::I1),
        TypeSignature::U1 => buffer.push(ELEMENT_TYPE::U1),
        TypeSignature::I2 => buffer.push(ELEMENT_TYPE::I2),
        TypeSignature::U2 => buffer.push(ELEMENT_TYPE::U2),
        TypeSignature::I4 => buffer.push(ELEMENT_TYPE::I4),
        TypeSignature::U4 => buffer.push(ELEMENT_TYPE::U4),
        TypeSignature::I8 => buffer.push(ELEMENT_TYPE::I8),
        TypeSignature::U8 => buffer.push(ELEMENT_TYPE::U8),
        TypeSignature::R4 => buffer.push(ELEMENT_TYPE::R4),
        TypeSignature::R8 => buffer.push(ELEMENT_TYPE::R8),
        TypeSignature::String => buffer.push(ELEMENT_TYPE::STRING),
        TypeSignature::TypedByRef => buffer.push(ELEMENT_TYPE::TYPEDBYREF),
        TypeSignature::I => buffer.push(ELEMENT_TYPE::I),
        TypeSignature::U => buffer.push(ELEMENT_TYPE::U),
        TypeSignature::Object => buffer.push(ELEMENT_TYPE::OBJECT),
        TypeSignature::Ptr(pointer) => {
            buffer.push(ELEMENT_TYPE::PTR);
            encode_custom_modifiers(&pointer.modifiers, resolver, buffer)?;
            encode_type_signature(&pointer.base, resolver, buffer)?;
        }
        TypeSignature::ByRef(inner) => {
            buffer.push(ELEMENT_TYPE::BYREF);
            encode_type_signature(inner, resolver, buffer)?;
        }
        TypeSignature::Pinned(inner) => {
            buffer.push(ELEMENT_TYPE::PINNED);
            encode_type_signature(inner, resolver, buffer)?;
        }
        TypeSignature::ValueType(ty) => {
            buffer.push(ELEMENT_TYPE::VALUETYPE);
            encode_type_def_or_ref(ty, resolver, buffer)?;
        }
        TypeSignature::Class(ty) => {
            buffer.push(ELEMENT_TYPE::CLASS);
            encode_type_def_or_ref(ty, resolver, buffer)?;
        }
        TypeSignature::GenericParamType(index) => {
            buffer.push(ELEMENT_TYPE::VAR);
            write_compressed_uint(*index, buffer)?;
        }
        TypeSignature::GenericParamMethod(index) => {
            buffer.push(ELEMENT_TYPE::MVAR);
            write_compressed_uint(*index, buffer)?;
        }
        TypeSignature::Array(array) => {
            buffer.push(ELEMENT_TYPE::ARRAY);
            encode_type_signature(&array.base, resolver, buffer)?;
            write_compressed_uint(array.rank, buffer)?;
            write_count(array.sizes.len(), "array sizes", buffer)?;
            for size in &array.sizes {
                write_compressed_uint(*size, buffer)?;
            }
            write_count(array.lower_bounds.len(), "array lower bounds", buffer)?;
            for bound in &array.lower_bounds {
                write_compressed_int(*bound, buffer)?;
            }
        }
        TypeSignature::SzArray(array) => {
            buffer.push(ELEMENT_TYPE::SZARRAY);
            encode_custom_modifiers(&array.modifiers, resolver, buffer)?;
            encode_type_signature(&array.base, resolver, buffer)?;
        }
        TypeSignature::GenericInst(generic, args) => {
            buffer.push(ELEMENT_TYPE::GENERICINST);
            encode_type_signature(generic, resolver, buffer)?;
            write_count(args.len(), "generic arguments", buffer)?;
            for arg in args {
                encode_type_signature(arg, resolver, buffer)?;
            }
        }
        TypeSignature::FnPtr(method) => {
            buffer.push(ELEMENT_TYPE::FNPTR);
            encode_method_signature_into(method, resolver, buffer)?;
        }
    }

    Ok(())
}

/// Encodes a parameter or return type: `CustomMod* [BYREF] Type`.
fn encode_parameter(
    parameter: &SignatureParameter,
    resolver: &mut dyn TypeDefOrRefResolver,
    buffer: &mut Vec<u8>,
) -> Result<()> {
    encode_custom_modifiers(&parameter.modifiers, resolver, buffer)?;
    if parameter.by_ref {
        buffer.push(ELEMENT_TYPE::BYREF);
    }
    encode_type_signature(&parameter.base, resolver, buffer)
}

fn encode_method_signature_into(
    signature: &SignatureMethod,
    resolver: &mut dyn TypeDefOrRefResolver,
    buffer: &mut Vec<u8>,
) -> Result<()> {
    let mut calling_convention = if signature.vararg {
        CALLING_CONVENTION::VARARG
    } else {
        CALLING_CONVENTION::DEFAULT
    };
    if signature.has_this {
        calling_convention |= CALLING_CONVENTION::HASTHIS;
    }
    if signature.explicit_this {
        calling_convention |= CALLING_CONVENTION::EXPLICITTHIS;
    }
    if signature.param_count_generic > 0 {
        calling_convention |= CALLING_CONVENTION::GENERIC;
    }
    buffer.push(calling_convention);

    if signature.param_count_generic > 0 {
        write_compressed_uint(signature.param_count_generic, buffer)?;
    }

    write_count(
        signature.params.len() + signature.varargs.len(),
        "parameters",
        buffer,
    )?;

    encode_parameter(&signature.return_type, resolver, buffer)?;
    for param in &signature.params {
        encode_parameter(param, resolver, buffer)?;
    }
    if !signature.varargs.is_empty() {
        buffer.push(ELEMENT_TYPE::SENTINEL);
        for param in &signature.varargs {
            encode_parameter(param, resolver, buffer)?;
        }
    }

    Ok(())
}

/// Encodes a method signature into binary format according to ECMA-335.
///
/// # Errors
///
/// Returns an error if a count or integer cannot be encoded, or if the resolver reports
/// a fatal condition.
pub fn encode_method_signature(
    signature: &SignatureMethod,
    resolver: &mut dyn TypeDefOrRefResolver,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    encode_method_signature_into(signature, resolver, &mut buffer)?;
    Ok(buffer)
}

/// Encodes a field signature into binary format according to ECMA-335.
///
/// # Errors
///
/// Returns an error if the field type cannot be encoded.
pub fn encode_field_signature(
    signature: &SignatureField,
    resolver: &mut dyn TypeDefOrRefResolver,
) -> Result<Vec<u8>> {
    let mut buffer = vec![SIGNATURE_HEADER::FIELD];
    encode_custom_modifiers(&signature.modifiers, resolver, &mut buffer)?;
    encode_type_signature(&signature.base, resolver, &mut buffer)?;
    Ok(buffer)
}

/// Encodes a property signature into binary format according to ECMA-335.
///
/// # Errors
///
/// Returns an error if the property type or any index parameter cannot be encoded.
pub fn encode_property_signature(
    signature: &SignatureProperty,
    resolver: &mut dyn TypeDefOrRefResolver,
) -> Result<Vec<u8>> {
    let mut prolog = SIGNATURE_HEADER::PROPERTY;
    if signature.has_this {
        prolog |= CALLING_CONVENTION::HASTHIS;
    }

    let mut buffer = vec![prolog];
    write_count(signature.params.len(), "parameters", &mut buffer)?;
    encode_custom_modifiers(&signature.modifiers, resolver, &mut buffer)?;
    encode_type_signature(&signature.base, resolver, &mut buffer)?;
    for param in &signature.params {
        encode_parameter(param, resolver, &mut buffer)?;
    }

    Ok(buffer)
}

/// Encodes a local variable signature into binary format according to ECMA-335.
///
/// # Errors
///
/// Returns an error if the local count or a local's type cannot be encoded.
pub fn encode_local_var_signature(
    signature: &SignatureLocalVariables,
    resolver: &mut dyn TypeDefOrRefResolver,
) -> Result<Vec<u8>> {
    let mut buffer = vec![SIGNATURE_HEADER::LOCAL_SIG];
    write_count(signature.locals.len(), "locals", &mut buffer)?;

    for local in &signature.locals {
        encode_custom_modifiers(&local.modifiers, resolver, &mut buffer)?;
        if local.is_pinned {
            buffer.push(ELEMENT_TYPE::PINNED);
        }
        if local.is_byref {
            buffer.push(ELEMENT_TYPE::BYREF);
        }
        encode_type_signature(&local.base, resolver, &mut buffer)?;
    }

    Ok(buffer)
}

/// Encodes a type specification signature, which is a bare type.
///
/// # Errors
///
/// Returns an error if the type cannot be encoded.
pub fn encode_typespec_signature(
    signature: &TypeSignature,
    resolver: &mut dyn TypeDefOrRefResolver,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    encode_type_signature(signature, resolver, &mut buffer)?;
    Ok(buffer)
}

/// Encodes a generic method instantiation (II.23.2.15).
///
/// # Errors
///
/// Returns an error if the argument count or an argument cannot be encoded.
pub fn encode_method_spec_signature(
    signature: &SignatureMethodSpec,
    resolver: &mut dyn TypeDefOrRefResolver,
) -> Result<Vec<u8>> {
    let mut buffer = vec![SIGNATURE_HEADER::GENERIC_INST];
    write_count(signature.generic_args.len(), "generic arguments", &mut buffer)?;
    for arg in &signature.generic_args {
        encode_type_signature(arg, resolver, &mut buffer)?;
    }
    Ok(buffer)
}

/// Encodes the signature of a `MemberRef`.
///
/// # Errors
///
/// Returns an error if the underlying field or method signature cannot be encoded.
pub fn encode_member_ref_signature(
    signature: &MemberRefSignature,
    resolver: &mut dyn TypeDefOrRefResolver,
) -> Result<Vec<u8>> {
    match signature {
        MemberRefSignature::Field(field) => encode_field_signature(field, resolver),
        MemberRefSignature::Method(method) => encode_method_signature(method, resolver),
    }
}

/// Encodes the signature of a `StandAloneSig`.
///
/// # Errors
///
/// Returns an error if the underlying method or local signature cannot be encoded.
pub fn encode_standalone_signature(
    signature: &StandAloneSignature,
    resolver: &mut dyn TypeDefOrRefResolver,
) -> Result<Vec<u8>> {
    match signature {
        StandAloneSignature::Method(method) => encode_method_signature(method, resolver),
        StandAloneSignature::LocalVariables(locals) => {
            encode_local_var_signature(locals, resolver)
        }
    }
}
