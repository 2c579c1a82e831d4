//! Identity-keyed row ledger for definition tables.
//!
//! A [`RidLedger`] tracks, for one definition table, three separate orders:
//!
//! - registration order, in which the collector discovered the objects,
//! - physical order, the row index each object ends up at,
//! - logical order, the order the format requires (grouped by owner, then by declaration).
//!
//! With preservation off, all three coincide. With preservation on, loaded objects keep
//! their original row, new objects are appended after the highest original row, and the
//! logical order is mapped onto the physical rows through a ptr table whenever the two
//! disagree.

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    metadata::{
        model::{HasOrigin, ObjectKey},
        tables::{TableId, MAX_ROWS},
    },
    Error, Result,
};

/// Provisional rows of new objects start here so they sort after every original row.
const CREATED_RID_BASE: u32 = 0x0100_0000;

/// One object registered in a [`RidLedger`], together with its assigned rows.
#[derive(Debug)]
pub struct LedgerEntry<T> {
    /// The registered object.
    pub item: Arc<T>,
    /// Physical row the object is written to.
    pub rid: u32,
    /// Position in the logical order, 1-based. Equals `rid` unless a ptr table is used.
    pub logical: u32,
    /// Row of the owning type or method.
    pub owner: u32,
    /// Index within the owner's declared list.
    pub position: u32,
    preserved: bool,
}

impl<T> LedgerEntry<T> {
    /// Returns `true` if the entry kept the row it had in the input module.
    #[must_use]
    pub fn is_preserved(&self) -> bool {
        self.preserved
    }
}

/// Row assignments of one definition table.
#[derive(Debug)]
pub struct RidLedger<T> {
    table: TableId,
    preserve: bool,
    entries: Vec<LedgerEntry<T>>,
    index: HashMap<ObjectKey, usize>,
    claimed: HashSet<u32>,
    logical_order: Vec<usize>,
    by_rid: Option<HashMap<u32, usize>>,
    next_rid: u32,
    next_created: u32,
    table_size: u32,
    need_ptr: bool,
}

impl<T: HasOrigin> RidLedger<T> {
    /// Creates an empty ledger for `table`.
    ///
    /// `reverse_lookup` enables [`RidLedger::by_rid`]; it costs one map entry per row and
    /// is only worth it for tables that are walked by row later on.
    #[must_use]
    pub fn new(table: TableId, preserve: bool, reverse_lookup: bool) -> Self {
        RidLedger {
            table,
            preserve,
            entries: Vec::new(),
            index: HashMap::new(),
            claimed: HashSet::new(),
            logical_order: Vec::new(),
            by_rid: reverse_lookup.then(HashMap::new),
            next_rid: 0,
            next_created: CREATED_RID_BASE,
            table_size: 0,
            need_ptr: false,
        }
    }

    /// Registers `item`, owned by row `owner` at index `position` of the owner's list.
    ///
    /// Returns `false` if `item` was already registered; the first registration wins.
    ///
    /// A loaded object keeps its original row when preservation is on, unless another
    /// object already claimed that row, in which case it is treated as new.
    pub fn add(&mut self, item: &Arc<T>, owner: u32, position: u32) -> bool {
        let key = ObjectKey::of(item);
        if self.index.contains_key(&key) {
            return false;
        }

        let origin = item.origin();
        let original = origin.original_rid();
        let (rid, preserved) = if self.preserve {
            if origin.is_loaded() && original <= MAX_ROWS && self.claimed.insert(original) {
                (original, true)
            } else {
                let rid = self.next_created;
                self.next_created = self.next_created.saturating_add(1);
                (rid, false)
            }
        } else {
            self.next_rid += 1;
            (self.next_rid, false)
        };

        self.index.insert(key, self.entries.len());
        self.entries.push(LedgerEntry {
            item: item.clone(),
            rid,
            logical: rid,
            owner,
            position,
            preserved,
        });
        true
    }

    /// Fixes the physical rows and the table size.
    ///
    /// With preservation on, entries are ordered by row and new entries are renumbered to
    /// follow the original rows directly. `original_rows` is the row count of the table in
    /// the input module: the table never shrinks below it, so rows of deleted originals at
    /// the end of the table keep existing and new entries start after them. The table size
    /// may therefore exceed the number of entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableOverflow`] if the table would exceed `0x00FF_FFFF` rows.
    pub fn sort_defs(&mut self, original_rows: u32) -> Result<()> {
        if self.preserve {
            self.entries.sort_by_key(|entry| entry.rid);

            let mut next = self
                .entries
                .iter()
                .filter(|entry| entry.preserved)
                .map(|entry| entry.rid)
                .max()
                .unwrap_or(0)
                .max(original_rows);
            for entry in self.entries.iter_mut().filter(|entry| !entry.preserved) {
                next = next.saturating_add(1);
                entry.rid = next;
            }

            self.table_size = next;
            if self.table_size > MAX_ROWS {
                return Err(Error::TableOverflow {
                    table: self.table,
                    rows: self.table_size as usize,
                });
            }
        } else {
            self.table_size = match u32::try_from(self.entries.len()) {
                Ok(rows) if rows <= MAX_ROWS => rows,
                _ => {
                    return Err(Error::TableOverflow {
                        table: self.table,
                        rows: self.entries.len(),
                    })
                }
            };
        }

        self.index.clear();
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.logical = entry.rid;
            self.index.insert(ObjectKey::of(&entry.item), i);
        }

        if let Some(by_rid) = self.by_rid.as_mut() {
            by_rid.clear();
            by_rid.extend(
                self.entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| (entry.rid, i)),
            );
        }

        self.logical_order = (0..self.entries.len()).collect();
        self.need_ptr = false;
        Ok(())
    }

    /// Computes the logical order with `compare` and decides whether a ptr table is needed.
    ///
    /// Must run after [`RidLedger::sort_defs`]. With preservation off the physical order
    /// already is the logical order and `compare` is not consulted.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&LedgerEntry<T>, &LedgerEntry<T>) -> Ordering,
    {
        if !self.preserve {
            for entry in &mut self.entries {
                entry.logical = entry.rid;
            }
            self.logical_order = (0..self.entries.len()).collect();
            self.need_ptr = false;
            return;
        }

        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by(|&a, &b| compare(&self.entries[a], &self.entries[b]));

        let mut in_order = true;
        for (position, &i) in order.iter().enumerate() {
            let entry = &mut self.entries[i];
            entry.logical = position as u32 + 1;
            in_order &= entry.logical == entry.rid;
        }

        // Rows nobody owns can only be reached through a ptr table
        self.logical_order = order;
        self.need_ptr = !in_order || self.entries.len() as u32 != self.table_size;
    }

    /// Returns the physical row of `item`, or `None` if it is not registered.
    #[must_use]
    pub fn try_rid(&self, item: &Arc<T>) -> Option<u32> {
        self.entry(item).map(|entry| entry.rid)
    }

    /// Returns the entry of `item`, or `None` if it is not registered.
    #[must_use]
    pub fn entry(&self, item: &Arc<T>) -> Option<&LedgerEntry<T>> {
        self.index
            .get(&ObjectKey::of(item))
            .map(|&i| &self.entries[i])
    }

    /// Returns `true` if `item` is registered.
    #[must_use]
    pub fn contains(&self, item: &Arc<T>) -> bool {
        self.index.contains_key(&ObjectKey::of(item))
    }

    /// The entry at physical row `rid`.
    ///
    /// Always `None` unless the ledger was created with reverse lookup enabled.
    #[must_use]
    pub fn by_rid(&self, rid: u32) -> Option<&LedgerEntry<T>> {
        self.by_rid
            .as_ref()?
            .get(&rid)
            .map(|&i| &self.entries[i])
    }

    /// Returns the entries in physical row order. Before [`RidLedger::sort_defs`] this is the
    /// registration order.
    pub fn physical(&self) -> impl Iterator<Item = &LedgerEntry<T>> {
        self.entries.iter()
    }

    /// Returns the entries in logical order.
    pub fn logical(&self) -> impl Iterator<Item = &LedgerEntry<T>> {
        self.logical_order.iter().map(|&i| &self.entries[i])
    }

    /// Counts the entries owned by each owner row.
    #[must_use]
    pub fn owner_counts(&self) -> HashMap<u32, u32> {
        let mut counts = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.owner).or_insert(0) += 1;
        }
        counts
    }

    /// Returns the number of rows the table needs, including rows of deleted originals.
    #[must_use]
    pub fn table_size(&self) -> u32 {
        self.table_size
    }

    /// Returns `true` if the table has to be reached through a ptr table.
    #[must_use]
    pub fn need_ptr(&self) -> bool {
        self.need_ptr
    }

    /// Returns `true` if original rows are kept.
    #[must_use]
    pub fn preserves(&self) -> bool {
        self.preserve
    }

    /// Returns the table this ledger assigns rows of.
    #[must_use]
    pub fn table(&self) -> TableId {
        self.table
    }

    /// Returns the number of registered objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Orders entries by owner row, then by position within the owner.
pub fn by_owner<T>(a: &LedgerEntry<T>, b: &LedgerEntry<T>) -> Ordering {
    a.owner
        .cmp(&b.owner)
        .then_with(|| a.position.cmp(&b.position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            model::{Field, Origin},
            tables::TableId,
        },
        test::factories::field,
    };

    #[test]
    fn test_preserve_keeps_original_rows() {
        let mut ledger = RidLedger::new(TableId::Field, true, false);
        let a = field(Origin::Loaded(2), "a");
        let b = field(Origin::Loaded(1), "b");
        let c = field(Origin::Created, "c");

        assert!(ledger.add(&a, 1, 0));
        assert!(ledger.add(&c, 1, 1));
        assert!(ledger.add(&b, 2, 0));
        assert!(!ledger.add(&a, 2, 1));

        ledger.sort_defs(2).unwrap();
        assert_eq!(ledger.try_rid(&b), Some(1));
        assert_eq!(ledger.try_rid(&a), Some(2));
        assert_eq!(ledger.try_rid(&c), Some(3));
        assert_eq!(ledger.table_size(), 3);
    }

    #[test]
    fn test_new_rows_follow_highest_original() {
        let mut ledger = RidLedger::new(TableId::Field, true, true);
        let a = field(Origin::Loaded(5), "a");
        let b = field(Origin::Created, "b");
        let c = field(Origin::Created, "c");

        ledger.add(&b, 1, 0);
        ledger.add(&a, 1, 1);
        ledger.add(&c, 1, 2);
        ledger.sort_defs(5).unwrap();

        assert_eq!(ledger.try_rid(&a), Some(5));
        assert_eq!(ledger.try_rid(&b), Some(6));
        assert_eq!(ledger.try_rid(&c), Some(7));
        assert_eq!(ledger.table_size(), 7);
        assert!(ledger.by_rid(3).is_none());
        assert!(Arc::ptr_eq(&ledger.by_rid(6).unwrap().item, &b));
    }

    #[test]
    fn test_duplicate_original_row_is_demoted() {
        let mut ledger = RidLedger::new(TableId::Field, true, false);
        let a = field(Origin::Loaded(1), "a");
        let b = field(Origin::Loaded(1), "b");

        ledger.add(&a, 1, 0);
        ledger.add(&b, 1, 1);
        ledger.sort_defs(1).unwrap();

        assert_eq!(ledger.try_rid(&a), Some(1));
        assert_eq!(ledger.try_rid(&b), Some(2));
        assert!(ledger.entry(&a).unwrap().is_preserved());
        assert!(!ledger.entry(&b).unwrap().is_preserved());
    }

    #[test]
    fn test_no_preserve_renumbers_densely() {
        let mut ledger = RidLedger::new(TableId::Field, false, false);
        let a = field(Origin::Loaded(9), "a");
        let b = field(Origin::Loaded(3), "b");

        ledger.add(&a, 1, 0);
        ledger.add(&b, 1, 1);
        ledger.sort_defs(9).unwrap();
        ledger.sort_by(|_, _| panic!("comparator must not run"));

        assert_eq!(ledger.try_rid(&a), Some(1));
        assert_eq!(ledger.try_rid(&b), Some(2));
        assert_eq!(ledger.table_size(), 2);
        assert!(!ledger.need_ptr());
    }

    #[test]
    fn test_need_ptr_when_owner_order_differs() {
        let mut ledger = RidLedger::new(TableId::Field, true, false);
        // Type 1 declares row 2, type 2 declares row 1
        let a = field(Origin::Loaded(2), "a");
        let b = field(Origin::Loaded(1), "b");
        ledger.add(&a, 1, 0);
        ledger.add(&b, 2, 0);
        ledger.sort_defs(2).unwrap();
        ledger.sort_by(by_owner);

        assert!(ledger.need_ptr());
        assert_eq!(ledger.entry(&a).unwrap().logical, 1);
        assert_eq!(ledger.entry(&b).unwrap().logical, 2);

        let logical: Vec<u32> = ledger.logical().map(|entry| entry.rid).collect();
        assert_eq!(logical, vec![2, 1]);
    }

    #[test]
    fn test_no_ptr_when_orders_agree() {
        let mut ledger = RidLedger::new(TableId::Field, true, false);
        let a = field(Origin::Loaded(1), "a");
        let b = field(Origin::Loaded(2), "b");
        let c = field(Origin::Created, "c");
        ledger.add(&a, 1, 0);
        ledger.add(&b, 1, 1);
        ledger.add(&c, 2, 0);
        ledger.sort_defs(2).unwrap();
        ledger.sort_by(by_owner);

        assert!(!ledger.need_ptr());
        assert_eq!(ledger.owner_counts().get(&1), Some(&2));
    }

    #[test]
    fn test_gap_forces_ptr() {
        let mut ledger = RidLedger::new(TableId::Field, true, false);
        let a = field(Origin::Loaded(1), "a");
        let c = field(Origin::Loaded(3), "c");
        ledger.add(&a, 1, 0);
        ledger.add(&c, 1, 1);
        ledger.sort_defs(3).unwrap();
        ledger.sort_by(by_owner);

        assert_eq!(ledger.table_size(), 3);
        assert_eq!(ledger.len(), 2);
        assert!(ledger.need_ptr());
    }

    #[test]
    fn test_deleted_last_row_keeps_table_size() {
        let mut ledger = RidLedger::new(TableId::Field, true, false);
        let a = field(Origin::Loaded(1), "a");
        let b = field(Origin::Loaded(2), "b");
        let c = field(Origin::Created, "c");
        ledger.add(&a, 1, 0);
        ledger.add(&b, 1, 1);
        ledger.add(&c, 2, 0);
        // Row 3 was deleted
        ledger.sort_defs(3).unwrap();
        ledger.sort_by(by_owner);

        assert_eq!(ledger.try_rid(&c), Some(4));
        assert_eq!(ledger.table_size(), 4);
        assert!(ledger.need_ptr());
    }

    #[test]
    fn test_every_row_deleted_still_needs_ptr() {
        let mut ledger: RidLedger<Field> = RidLedger::new(TableId::Field, true, false);
        ledger.sort_defs(2).unwrap();
        ledger.sort_by(by_owner);

        assert_eq!(ledger.table_size(), 2);
        assert!(ledger.is_empty());
        assert!(ledger.need_ptr());
    }

    #[test]
    fn test_overflow() {
        let mut ledger = RidLedger::new(TableId::Field, true, false);
        ledger.add(&field(Origin::Loaded(MAX_ROWS), "last"), 1, 0);
        ledger.add(&field(Origin::Created, "one_too_many"), 1, 1);

        assert!(matches!(
            ledger.sort_defs(MAX_ROWS),
            Err(Error::TableOverflow {
                table: TableId::Field,
                rows: 0x0100_0000
            })
        ));
    }
}
