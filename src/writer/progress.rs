//! Progress reporting for a write pass.
//!
//! Progress is purely observational: the writer reports fractional progress at fixed
//! milestones of each phase, and the observer cannot influence the result.

use std::fmt;

/// The phase of a write pass a progress notification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WritePhase {
    /// Ordering types and reserving `TypeDef` and reference rows.
    AllocateTypes,
    /// Collecting, sorting and reserving member rows.
    AllocateMembers,
    /// Filling definition rows.
    WriteDefinitions,
    /// Re-adding untouched reference rows.
    SweepReferences,
}

impl fmt::Display for WritePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WritePhase::AllocateTypes => write!(f, "allocate types"),
            WritePhase::AllocateMembers => write!(f, "allocate members"),
            WritePhase::WriteDefinitions => write!(f, "write definitions"),
            WritePhase::SweepReferences => write!(f, "sweep references"),
        }
    }
}

/// Observer invoked with the phase and a fraction in `0.0..=1.0`.
pub type ProgressFn<'a> = Box<dyn FnMut(WritePhase, f64) + 'a>;

/// Holds the optional observer of a pass.
#[derive(Default)]
pub(crate) struct Progress<'a> {
    observer: Option<ProgressFn<'a>>,
}

impl<'a> Progress<'a> {
    pub(crate) fn set(&mut self, observer: ProgressFn<'a>) {
        self.observer = Some(observer);
    }

    /// Report `step` of `steps` for `phase`.
    pub(crate) fn report(&mut self, phase: WritePhase, step: u32, steps: u32) {
        if let Some(observer) = self.observer.as_mut() {
            let fraction = if steps == 0 {
                1.0
            } else {
                f64::from(step) / f64::from(steps)
            };
            observer(phase, fraction);
        }
    }
}
