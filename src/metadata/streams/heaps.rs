use std::collections::HashMap;

use crate::{
    utils::{read_compressed_uint, write_compressed_uint},
    Result,
};

/// Interning interface of the `#Strings` and `#Blob` heaps.
///
/// The write pass never lays out heaps itself; it only asks for offsets. Implementations
/// are expected to de-duplicate, so interning the same content twice yields the same offset.
pub trait HeapWriter {
    /// Interns `value` into the `#Strings` heap and returns its offset.
    ///
    /// The empty string is always offset 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be stored, for example because it contains a NUL.
    fn intern_string(&mut self, value: &str) -> Result<u32>;

    /// Interns `data` into the `#Blob` heap and returns its offset.
    ///
    /// The empty blob is always offset 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the length cannot be encoded as a compressed integer.
    fn intern_blob(&mut self, data: &[u8]) -> Result<u32>;
}

/// In-memory `#Strings` and `#Blob` heaps with content de-duplication.
///
/// Both heaps start with the mandatory empty entry at offset 0. Blobs are stored with their
/// compressed length prefix, exactly as they end up in the stream.
#[derive(Debug, Clone)]
pub struct HeapBuilder {
    strings: Vec<u8>,
    string_offsets: HashMap<String, u32>,
    blobs: Vec<u8>,
    blob_offsets: HashMap<Vec<u8>, u32>,
}

impl Default for HeapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapBuilder {
    /// Creates heaps holding only the empty entries.
    #[must_use]
    pub fn new() -> Self {
        HeapBuilder {
            strings: vec![0],
            string_offsets: HashMap::new(),
            blobs: vec![0],
            blob_offsets: HashMap::new(),
        }
    }

    /// Reads back the string stored at `offset`.
    #[must_use]
    pub fn get_string(&self, offset: u32) -> Option<&str> {
        let start = offset as usize;
        let tail = self.strings.get(start..)?;
        let end = tail.iter().position(|b| *b == 0)?;
        std::str::from_utf8(&tail[..end]).ok()
    }

    /// Reads back the blob stored at `offset`, without its length prefix.
    #[must_use]
    pub fn get_blob(&self, offset: u32) -> Option<&[u8]> {
        let start = offset as usize;
        let tail = self.blobs.get(start..)?;
        let (len, skip) = read_compressed_uint(tail)?;
        tail.get(skip..skip + len as usize)
    }

    /// Raw bytes of the `#Strings` heap.
    #[must_use]
    pub fn strings_data(&self) -> &[u8] {
        &self.strings
    }

    /// Raw bytes of the `#Blob` heap.
    #[must_use]
    pub fn blob_data(&self) -> &[u8] {
        &self.blobs
    }
}

impl HeapWriter for HeapBuilder {
    fn intern_string(&mut self, value: &str) -> Result<u32> {
        if value.is_empty() {
            return Ok(0);
        }
        if let Some(offset) = self.string_offsets.get(value) {
            return Ok(*offset);
        }
        if value.as_bytes().contains(&0) {
            return Err(invariant_error!(
                "String {:?} contains a NUL and cannot be stored in #Strings",
                value
            ));
        }

        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(value.as_bytes());
        self.strings.push(0);
        self.string_offsets.insert(value.to_string(), offset);
        Ok(offset)
    }

    fn intern_blob(&mut self, data: &[u8]) -> Result<u32> {
        if data.is_empty() {
            return Ok(0);
        }
        if let Some(offset) = self.blob_offsets.get(data) {
            return Ok(*offset);
        }

        let offset = self.blobs.len() as u32;
        write_compressed_uint(data.len() as u32, &mut self.blobs)?;
        self.blobs.extend_from_slice(data);
        self.blob_offsets.insert(data.to_vec(), offset);
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strings_dedup() {
        let mut heaps = HeapBuilder::new();
        assert_eq!(heaps.intern_string("").unwrap(), 0);

        let a = heaps.intern_string("Program").unwrap();
        let b = heaps.intern_string("Main").unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 9);
        assert_eq!(heaps.intern_string("Program").unwrap(), a);
        assert_eq!(heaps.get_string(b), Some("Main"));
        assert_eq!(heaps.get_string(0), Some(""));
    }

    #[test]
    fn test_string_with_nul_is_rejected() {
        let mut heaps = HeapBuilder::new();
        assert!(heaps.intern_string("a\0b").is_err());
    }

    #[test]
    fn test_blobs_dedup_and_read_back() {
        let mut heaps = HeapBuilder::new();
        assert_eq!(heaps.intern_blob(&[]).unwrap(), 0);

        let sig = heaps.intern_blob(&[0x06, 0x08]).unwrap();
        assert_eq!(sig, 1);
        assert_eq!(heaps.blob_data(), &[0x00, 0x02, 0x06, 0x08]);
        assert_eq!(heaps.intern_blob(&[0x06, 0x08]).unwrap(), sig);
        assert_eq!(heaps.get_blob(sig), Some(&[0x06u8, 0x08][..]));
        assert_eq!(heaps.get_blob(0), Some(&[][..]));
    }
}
