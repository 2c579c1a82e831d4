//! Small encoding helpers shared by the heap builder and the signature encoder.

mod compressed;

pub use compressed::{
    read_compressed_uint, write_compressed_int, write_compressed_uint, MAX_COMPRESSED_UINT,
};
