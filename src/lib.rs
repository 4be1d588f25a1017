// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::needless_range_loop)]
#![allow(clippy::enum_variant_names)]

//! # PDF Objects
//!
//! The object layer of a PDF reader: everything between raw file bytes and
//! typed PDF objects.
//!
//! ## Core Features
//!
//! - **Object lexer**: all PDF object kinds, indirect objects and streams,
//!   each carrying its byte span (ISO 32000-1:2008 §7.3)
//! - **Cross-reference resolver**: classic tables, cross-reference streams
//!   and hybrid files, merged across incremental updates (§7.5.4-7.5.8)
//! - **Stream filters**: ASCIIHex, ASCII85, LZW, Flate and RunLength, with
//!   TIFF and PNG predictors (§7.4)
//! - **Bit cursor**: MSB-first bit reads for LZW codes and packed samples
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_objects::PdfDocument;
//! use pdf_objects::object::ObjectRef;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = PdfDocument::open("paper.pdf")?;
//! let root = doc.trailer().root.ok_or("no catalog")?;
//! let catalog = doc.load_object(root)?;
//! println!("{} is a {}", root, catalog.value.value.type_name());
//!
//! let first_page = doc.load_object(ObjectRef::new(3, 0))?;
//! if let Some(stream) = first_page.value.value.as_stream() {
//!     println!("{} decoded bytes", stream.decode()?.len());
//! }
//! # Ok(())
//! # }
//! ```

// Error handling
pub mod error;

// Core PDF parsing
pub mod bits;
pub mod document;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod source;
pub mod trailer;
pub mod xref;

/// Parser limits (nesting, decompression, xref chain)
pub mod parser_config;

// Stream decoders
pub mod decoders;

// Diagnostics
pub mod scanner;

// Re-exports
pub use document::PdfDocument;
pub use error::{Error, Result};
pub use object::{Dictionary, IndirectObject, Object, ObjectRef, ParsedObject, Stream};
pub use parser::ObjectLexer;
pub use parser_config::ParserOptions;
pub use source::ByteSource;
pub use xref::{CrossRefEntry, ResolvedXRefTable, XRefResolver};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
