//! Parser limits.
//!
//! Malformed or hostile files can nest objects without bound, chain xref
//! sections forever or expand a few bytes into gigabytes. [`ParserOptions`]
//! caps each of these.
//!
//! # Example
//!
//! ```
//! use pdf_objects::parser_config::ParserOptions;
//!
//! let options = ParserOptions::default()
//!     .with_max_nesting(64)
//!     .with_max_decompressed_size(16 * 1024 * 1024);
//! assert_eq!(options.max_nesting, 64);
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Maximum array/dictionary nesting depth
    ///
    /// Prevents stack overflow from deeply nested arrays/dictionaries.
    pub max_nesting: usize,

    /// Maximum decompressed stream size in bytes
    ///
    /// Default: 100 MB. Set to 0 to disable check.
    pub max_decompressed_size: usize,

    /// Maximum decompression ratio (decompressed:compressed)
    ///
    /// Default: 1000. Set to 0 to disable check.
    pub max_decompression_ratio: u32,

    /// Maximum number of sections followed through Prev/XRefStm
    pub max_xref_sections: usize,

    /// Maximum entry count accepted in one classic subsection header
    pub max_subsection_count: u32,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_nesting: 256,
            max_decompressed_size: 100 * 1024 * 1024, // 100 MB
            max_decompression_ratio: 1000,
            max_xref_sections: 1024,
            max_subsection_count: 1_000_000,
        }
    }
}

impl ParserOptions {
    pub fn with_max_nesting(mut self, depth: usize) -> Self {
        self.max_nesting = depth;
        self
    }

    pub fn with_max_decompressed_size(mut self, bytes: usize) -> Self {
        self.max_decompressed_size = bytes;
        self
    }

    pub fn with_max_decompression_ratio(mut self, ratio: u32) -> Self {
        self.max_decompression_ratio = ratio;
        self
    }

    pub fn with_max_xref_sections(mut self, sections: usize) -> Self {
        self.max_xref_sections = sections;
        self
    }

    pub fn with_max_subsection_count(mut self, count: u32) -> Self {
        self.max_subsection_count = count;
        self
    }
}
