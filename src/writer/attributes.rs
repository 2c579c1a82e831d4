//! Propagation of custom attributes and debug information.
//!
//! The writer does not own custom attributes, declarative security or debug rows; it
//! only knows when an object has received its final row. An [`AttributeSink`] is told
//! exactly then, so whoever owns those rows can re-target them.

use crate::metadata::{model::MetadataObject, tables::TableId};

/// Receives the final row of every definition written and every reference resolved.
pub trait AttributeSink {
    /// `object` now lives at `rid` of `table`.
    fn copy_attributes(&mut self, object: &MetadataObject, table: TableId, rid: u32);
}

/// Sink that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAttributes;

impl AttributeSink for NoAttributes {
    fn copy_attributes(&mut self, _object: &MetadataObject, _table: TableId, _rid: u32) {}
}

/// Sink that records every notification, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    /// Table, row and original token (if any) of each notification.
    pub records: Vec<(TableId, u32, Option<u32>)>,
}

impl AttributeSink for RecordingSink {
    fn copy_attributes(&mut self, object: &MetadataObject, table: TableId, rid: u32) {
        self.records
            .push((table, rid, object.original_token().map(|token| token.value())));
    }
}

impl<S: AttributeSink + ?Sized> AttributeSink for &mut S {
    fn copy_attributes(&mut self, object: &MetadataObject, table: TableId, rid: u32) {
        (**self).copy_attributes(object, table, rid);
    }
}
