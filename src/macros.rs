#![allow(unused_macros)]

/// Helper macro for reading locked items
///
/// ```rust, ignore
///  let fields = read_lock!(self.fields);
///  println!("{}", fields.len());
/// ```
macro_rules! read_lock {
    ($rwlock:expr) => {
        $rwlock.read().expect("Failed to acquire read lock")
    };
}

/// Helper macro for writing to locked items
///
/// ```rust, ignore
///  let mut fields = write_lock!(self.fields);
///  fields.push(field);
/// ```
macro_rules! write_lock {
    ($rwlock:expr) => {
        $rwlock.write().expect("Failed to acquire write lock")
    };
}

/// Takes a snapshot of a locked member list, so iteration does not hold the lock
///
/// ```rust, ignore
///  for field in snapshot!(type_def.fields) { ... }
/// ```
macro_rules! snapshot {
    ($rwlock:expr) => {
        read_lock!($rwlock).clone()
    };
}

/// Removes an entry from a locked list by `Arc` identity, returning whether it was present
///
/// ```rust, ignore
///  let removed = remove_by_identity!(self.fields, field);
/// ```
macro_rules! remove_by_identity {
    ($rwlock:expr, $item:expr) => {{
        let mut guard = write_lock!($rwlock);
        let before = guard.len();
        guard.retain(|entry| !std::sync::Arc::ptr_eq(entry, $item));
        guard.len() != before
    }};
}
