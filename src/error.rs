//! Error types for the PDF object layer.
//!
//! Each subsystem has its own error type so callers can tell a malformed
//! object apart from a broken cross-reference chain or a corrupt stream.
//! All of them convert into the crate-wide [`Error`].

use crate::object::ObjectRef;

/// Result type alias for PDF library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for stream filters.
pub type FilterResult<T> = std::result::Result<T, FilterError>;

/// Error types that can occur while reading a PDF.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid PDF header (expected '%PDF-')
    #[error("Invalid PDF header: expected '%PDF-', found '{0}'")]
    InvalidHeader(String),

    /// No `startxref` keyword followed by an offset near the end of the file
    #[error("startxref not found")]
    MissingStartxref,

    /// Malformed object syntax
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Malformed cross-reference data
    #[error(transparent)]
    XRef(#[from] XRefError),

    /// Stream filter failure
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Bit-level read out of range
    #[error(transparent)]
    BitRange(#[from] BitRangeError),

    /// Referenced object not found in cross-reference table
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectRef),

    /// The object at the recorded offset carries a different number
    #[error("Expected object {expected} at byte {offset}, found {found}")]
    ObjectMismatch {
        /// Requested reference
        expected: ObjectRef,
        /// Header found at the offset
        found: ObjectRef,
        /// Byte offset taken from the xref table
        offset: u64,
    },

    /// Object lives inside an object stream
    #[error("Object {object_num} is stored in object stream {container} at index {index}")]
    CompressedObject {
        /// Requested object number
        object_num: u32,
        /// Object number of the containing object stream
        container: u32,
        /// Index within the container
        index: u32,
    },

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the object lexer was doing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unterminated literal string")]
    UnterminatedString,
    #[error("unterminated hex string")]
    UnterminatedHexString,
    #[error("invalid hex string")]
    InvalidHexString,
    #[error("unbalanced dictionary")]
    UnbalancedDictionary,
    #[error("dictionary key is not a name")]
    InvalidDictionaryKey,
    #[error("dictionary key without value")]
    MissingDictionaryValue,
    #[error("unbalanced array")]
    UnbalancedArray,
    #[error("invalid numeric literal")]
    InvalidNumber,
    #[error("missing 'obj' keyword")]
    MissingObjKeyword,
    #[error("missing object value")]
    MissingObjectValue,
    #[error("missing 'endstream' keyword")]
    MissingEndstream,
    #[error("missing 'endobj' keyword")]
    MissingEndobjKeyword,
    #[error("nesting too deep")]
    NestingTooDeep,
}

/// Object syntax error at an absolute byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Lex error at byte {offset}: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub offset: usize,
}

impl LexError {
    pub fn new(kind: LexErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

/// What went wrong while reading a cross-reference section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum XRefErrorKind {
    #[error("offset beyond end of file")]
    InvalidOffset,
    #[error("bad subsection header")]
    BadSubsectionHeader,
    #[error("bad entry line")]
    BadEntryLine,
    #[error("trailer before subsection was complete")]
    IncompleteSubsection,
    #[error("missing trailer")]
    MissingTrailer,
    #[error("invalid trailer")]
    InvalidTrailer,
    #[error("object at offset is not a cross-reference stream")]
    NotAStream,
    #[error("invalid cross-reference stream dictionary")]
    InvalidStreamDictionary,
    #[error("unsupported entry type")]
    UnsupportedEntryType,
    #[error("truncated cross-reference stream")]
    TruncatedStream,
    #[error("cycle detected in xref chain")]
    CycleDetected,
    #[error("too many xref sections")]
    TooManySections,
}

/// Cross-reference error at an absolute byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("XRef error at byte {offset}: {kind}")]
pub struct XRefError {
    pub kind: XRefErrorKind,
    pub offset: u64,
}

impl XRefError {
    pub fn new(kind: XRefErrorKind, offset: u64) -> Self {
        Self { kind, offset }
    }
}

/// Stream filter error. Scoped to the stream being decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// Filter name outside the supported set
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Out-of-range or mistyped /DecodeParms entry
    #[error("Invalid filter parameter: {0}")]
    InvalidFilterParameter(String),

    /// Corrupt encoded data
    #[error("Stream decoding error: {0}")]
    DecodeFailure(String),

    /// Decoded output exceeds configured limits
    #[error("Decoded size {size} bytes exceeds limit ({limit})")]
    LimitExceeded {
        /// Decoded size so far
        size: usize,
        /// Human readable limit
        limit: String,
    },
}

/// Bit-level access outside the buffer or with an unsupported width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BitRangeError {
    #[error("invalid bit width {0} (expected 1..=32)")]
    InvalidWidth(u32),
    #[error("read of {requested} bits at bit {position} exceeds {len_bits} bits")]
    OutOfBounds {
        requested: u32,
        position: u64,
        len_bits: u64,
    },
}
