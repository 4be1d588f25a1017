//! Immutable byte buffer backing a parsing session.
//!
//! All positions handed to the lexer and the xref resolver are absolute
//! offsets into a [`ByteSource`]. Cloning is cheap (reference counted), and
//! stream payloads are sliced out of it without copying.

use bytes::Bytes;
use std::ops::Range;
use std::path::Path;

use crate::error::Result;

/// Read-only view over a document's bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteSource {
    data: Bytes,
}

impl ByteSource {
    /// Wrap an existing buffer.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Read a whole file into memory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        log::debug!("Loaded {} bytes from {}", data.len(), path.as_ref().display());
        Ok(Self::new(data))
    }

    /// Total length in bytes (the largest valid end position).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte at `pos`, if in range.
    pub fn get(&self, pos: usize) -> Option<u8> {
        self.data.get(pos).copied()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Bytes from `pos` to the end, empty when `pos` is past the end.
    pub fn tail(&self, pos: usize) -> &[u8] {
        self.data.get(pos..).unwrap_or(&[])
    }

    /// Zero-copy sub-range. The range is clamped to the buffer.
    pub fn slice(&self, range: Range<usize>) -> Bytes {
        let end = range.end.min(self.data.len());
        let start = range.start.min(end);
        self.data.slice(start..end)
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&'static [u8]> for ByteSource {
    fn from(data: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(data))
    }
}

impl From<Bytes> for ByteSource {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}
