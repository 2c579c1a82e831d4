//! Access to the module the edit session started from.
//!
//! The writer needs to know which object sat at which row of the input module, for two
//! reasons: reference rows are only reused when the live object is literally the object
//! the input resolves at that row, and the final sweep re-adds input rows nothing in the
//! rewritten graph referenced. [`OriginalModule`] is the narrow interface for that;
//! [`SourceModule`] is the in-memory implementation loaders fill while they build the graph.

use crossbeam_skiplist::SkipMap;

use crate::metadata::{
    model::{MetadataObject, Module},
    tables::TableId,
    token::Token,
};

/// Read access to the rows of the input module.
pub trait OriginalModule {
    /// The object the input module has at `rid` of `table`, if any.
    fn resolve(&self, table: TableId, rid: u32) -> Option<MetadataObject>;

    /// Number of rows `table` had in the input module.
    fn row_count(&self, table: TableId) -> u32;

    /// Returns `true` if `rid` addresses an existing row of `table`.
    fn is_valid_rid(&self, table: TableId, rid: u32) -> bool {
        rid != 0 && rid <= self.row_count(table)
    }
}

/// Token-indexed map of the objects a module was loaded into.
pub type SourceObjectMap = SkipMap<Token, MetadataObject>;

/// In-memory [`OriginalModule`].
///
/// Row counts grow with the highest row inserted, and can be raised independently for
/// rows whose object is unknown (e.g. stripped or unreadable entries).
#[derive(Default)]
pub struct SourceModule {
    objects: SourceObjectMap,
    row_counts: SkipMap<TableId, u32>,
}

impl SourceModule {
    /// Create an empty source
    #[must_use]
    pub fn new() -> Self {
        SourceModule {
            objects: SkipMap::new(),
            row_counts: SkipMap::new(),
        }
    }

    /// Build a source from every loaded definition reachable from `module`.
    ///
    /// References are not reachable from the type list alone and must be added with
    /// [`SourceModule::insert`].
    #[must_use]
    pub fn capture(module: &Module) -> Self {
        let source = SourceModule::new();

        source.insert(module.corlib_object.clone().into());
        for type_def in module.types() {
            source.insert(type_def.clone().into());
            for field in type_def.fields() {
                source.insert(field.into());
            }
            for method in type_def.methods() {
                for param in method.params() {
                    source.insert(param.into());
                }
                source.insert(method.into());
            }
            for event in type_def.events() {
                source.insert(event.into());
            }
            for property in type_def.properties() {
                source.insert(property.into());
            }
        }

        source
    }

    /// Record `object` at its original row. Objects created by the edit session are ignored.
    ///
    /// Returns `false` if the object was not recorded.
    pub fn insert(&self, object: MetadataObject) -> bool {
        let Some(token) = object.original_token() else {
            return false;
        };

        self.raise_row_count(object.table(), token.row());
        self.objects.insert(token, object);
        true
    }

    /// Declare that `table` had at least `rows` rows.
    pub fn set_row_count(&self, table: TableId, rows: u32) {
        self.raise_row_count(table, rows);
    }

    /// Number of objects recorded
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn raise_row_count(&self, table: TableId, rows: u32) {
        let current = self
            .row_counts
            .get(&table)
            .map_or(0, |entry| *entry.value());
        if rows > current {
            self.row_counts.insert(table, rows);
        }
    }
}

impl OriginalModule for SourceModule {
    fn resolve(&self, table: TableId, rid: u32) -> Option<MetadataObject> {
        self.objects
            .get(&Token::from_parts(table, rid))
            .map(|entry| entry.value().clone())
    }

    fn row_count(&self, table: TableId) -> u32 {
        self.row_counts
            .get(&table)
            .map_or(0, |entry| *entry.value())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::model::{ModuleRef, Origin, StandAloneSig};

    #[test]
    fn test_insert_and_resolve() {
        let source = SourceModule::new();
        let sig: MetadataObject =
            Arc::new(StandAloneSig::local_variables(Origin::Loaded(3), Vec::new())).into();

        assert!(source.insert(sig.clone()));
        assert_eq!(source.row_count(TableId::StandAloneSig), 3);
        assert!(source.is_valid_rid(TableId::StandAloneSig, 2));
        assert!(!source.is_valid_rid(TableId::StandAloneSig, 4));
        assert!(!source.is_valid_rid(TableId::StandAloneSig, 0));

        let resolved = source.resolve(TableId::StandAloneSig, 3).unwrap();
        assert!(resolved.is_same(&sig));
        assert!(source.resolve(TableId::StandAloneSig, 2).is_none());
    }

    #[test]
    fn test_created_objects_are_ignored() {
        let source = SourceModule::new();
        assert!(!source.insert(Arc::new(ModuleRef::new(Origin::Created, "a.dll")).into()));
        assert!(source.is_empty());
    }

    #[test]
    fn test_row_count_only_grows() {
        let source = SourceModule::new();
        source.set_row_count(TableId::TypeSpec, 10);
        source.set_row_count(TableId::TypeSpec, 4);
        assert_eq!(source.row_count(TableId::TypeSpec), 10);
    }
}
