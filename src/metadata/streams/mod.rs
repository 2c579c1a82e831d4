//! Heap interfaces consumed by the write pass.
//!
//! The writer only needs two things from the heaps: an offset for a name in `#Strings`
//! and an offset for a signature in `#Blob`. [`HeapWriter`] is that narrow interface,
//! and [`HeapBuilder`] is an in-memory implementation that de-duplicates content and can
//! read entries back, which the tests and the local signature path rely on.
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 24.2.3 - `#Strings` heap
//! - ECMA-335 6th Edition, Partition II, Section 24.2.4 - `#Blob` heap

mod heaps;

pub use heaps::{HeapBuilder, HeapWriter};
