//! Per-pass state record.
//!
//! The pass entry points have to run in a fixed order, and some work (the reference
//! sweep) must happen at most once per table. Both facts live here, scoped to one
//! [`crate::writer::MetadataWriter`], instead of as loose booleans.

use bitflags::bitflags;

use crate::{metadata::tables::TableId, Error, Result};

/// How far a write pass has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Nothing allocated yet.
    Created,
    /// `TypeDef` rows and preserved reference rows exist.
    TypesAllocated,
    /// Member rows, ptr tables, list columns and placeholders exist.
    MembersAllocated,
    /// Definition rows are filled.
    DefinitionsWritten,
    /// The output has been taken.
    Finished,
}

impl Stage {
    /// Name used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Created => "Created",
            Stage::TypesAllocated => "TypesAllocated",
            Stage::MembersAllocated => "MembersAllocated",
            Stage::DefinitionsWritten => "DefinitionsWritten",
            Stage::Finished => "Finished",
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Reference tables whose untouched original rows were already re-added.
    pub struct SweptTables: u8 {
        /// `TypeRef`.
        const TYPE_REF = 0x01;
        /// `MemberRef`.
        const MEMBER_REF = 0x02;
        /// `StandAloneSig`.
        const STANDALONE_SIG = 0x04;
        /// `TypeSpec`.
        const TYPE_SPEC = 0x08;
        /// `MethodSpec`.
        const METHOD_SPEC = 0x10;
    }
}

impl SweptTables {
    /// The flag of a sweepable reference table.
    #[must_use]
    pub fn for_table(table: TableId) -> Option<SweptTables> {
        match table {
            TableId::TypeRef => Some(SweptTables::TYPE_REF),
            TableId::MemberRef => Some(SweptTables::MEMBER_REF),
            TableId::StandAloneSig => Some(SweptTables::STANDALONE_SIG),
            TableId::TypeSpec => Some(SweptTables::TYPE_SPEC),
            TableId::MethodSpec => Some(SweptTables::METHOD_SPEC),
            _ => None,
        }
    }
}

/// Stage and one-shot flags of a pass.
#[derive(Debug, Clone)]
pub(crate) struct PassState {
    stage: Stage,
    swept: SweptTables,
}

impl PassState {
    pub(crate) fn new() -> Self {
        PassState {
            stage: Stage::Created,
            swept: SweptTables::empty(),
        }
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    /// Fails unless the pass is exactly at `expected`.
    pub(crate) fn expect(&self, expected: Stage) -> Result<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(Error::StageOrder {
                expected: expected.name(),
                actual: self.stage.name(),
            })
        }
    }

    /// Fails unless the pass reached at least `minimum` and is not finished.
    pub(crate) fn expect_at_least(&self, minimum: Stage) -> Result<()> {
        if self.stage >= minimum && self.stage != Stage::Finished {
            Ok(())
        } else {
            Err(Error::StageOrder {
                expected: minimum.name(),
                actual: self.stage.name(),
            })
        }
    }

    pub(crate) fn advance(&mut self, from: Stage, to: Stage) -> Result<()> {
        self.expect(from)?;
        self.stage = to;
        Ok(())
    }

    /// Marks `table` as swept; returns `false` if it already was.
    pub(crate) fn mark_swept(&mut self, table: TableId) -> bool {
        let Some(flag) = SweptTables::for_table(table) else {
            return false;
        };
        if self.swept.contains(flag) {
            return false;
        }
        self.swept.insert(flag);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let mut state = PassState::new();
        assert!(state.expect(Stage::Created).is_ok());
        assert!(matches!(
            state.advance(Stage::TypesAllocated, Stage::MembersAllocated),
            Err(Error::StageOrder {
                expected: "TypesAllocated",
                actual: "Created"
            })
        ));

        state.advance(Stage::Created, Stage::TypesAllocated).unwrap();
        assert!(state.expect_at_least(Stage::TypesAllocated).is_ok());
        assert!(state.expect_at_least(Stage::MembersAllocated).is_err());
    }

    #[test]
    fn test_sweep_once() {
        let mut state = PassState::new();
        assert!(state.mark_swept(TableId::TypeRef));
        assert!(!state.mark_swept(TableId::TypeRef));
        assert!(state.mark_swept(TableId::TypeSpec));
        assert!(!state.mark_swept(TableId::Field));
    }
}
