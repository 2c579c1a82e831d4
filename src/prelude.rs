//! # dotscope-preserve Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! of the library. Import it to get quick access to everything a write pass needs.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all operations
pub use crate::Error;

/// The result type used throughout the crate
pub use crate::Result;

// ================================================================================================
// Write Pass
// ================================================================================================

/// The pass and its output
pub use crate::writer::{MetadataWriter, TypeSlot, WriteOutput};

/// Configuration of a pass
pub use crate::writer::{MetadataFlags, WriterOptions};

/// Observers of a pass
pub use crate::writer::{AttributeSink, NoAttributes, RecordingSink, WritePhase};

/// Pass state
pub use crate::writer::Stage;

// ================================================================================================
// Object Graph
// ================================================================================================

/// Module and definitions
pub use crate::metadata::model::{
    Event, EventRc, Field, FieldRc, MethodBody, MethodDef, MethodDefRc, Module, Param, ParamRc,
    Property, PropertyRc, TypeDef, TypeDefRc,
};

/// References
pub use crate::metadata::model::{
    AssemblyRef, AssemblyRefRc, MemberRef, MemberRefParent, MemberRefRc, MethodDefOrRef,
    MethodSpec, MethodSpecRc, ModuleRef, ModuleRefRc, ResolutionScope, StandAloneSig,
    StandAloneSigRc, TypeDefOrRef, TypeRef, TypeRefRc, TypeSpec, TypeSpecRc,
};

/// Identity and provenance
pub use crate::metadata::model::{MetadataObject, ObjectKey, Origin};

/// The input module
pub use crate::metadata::source::{OriginalModule, SourceModule};

// ================================================================================================
// Signatures
// ================================================================================================

/// Signature model
pub use crate::metadata::signatures::{
    MemberRefSignature, SignatureField, SignatureLocalVariables, SignatureMethod,
    SignatureMethodSpec, SignatureProperty, StandAloneSignature, TypeSignature,
};

// ================================================================================================
// Tables, Heaps and Tokens
// ================================================================================================

/// Table identifiers and the table store
pub use crate::metadata::tables::{CodedIndex, MetadataTable, MetadataTables, TableId};

/// Heaps
pub use crate::metadata::streams::{HeapBuilder, HeapWriter};

/// Metadata tokens
pub use crate::metadata::token::Token;

/// Diagnostics
pub use crate::metadata::diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics,
};
