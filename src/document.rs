//! PDF document model.
//!
//! [`PdfDocument`] ties the pieces together: it checks the header, finds
//! `startxref`, resolves the cross-reference chain and then loads
//! individual objects on demand.

use crate::error::{Error, Result, XRefError, XRefErrorKind};
use crate::object::{IndirectObject, ObjectRef};
use crate::parser::ObjectLexer;
use crate::parser_config::ParserOptions;
use crate::source::ByteSource;
use crate::trailer::Trailer;
use crate::xref::{find_startxref, CrossRefEntry, ResolvedXRefTable, XRefResolver};
use bytes::Bytes;
use std::path::Path;

/// How far into the file the `%PDF-` marker may appear.
const HEADER_SEARCH_LIMIT: usize = 1024;

/// PDF document.
///
/// This structure represents an open PDF document, providing access to:
/// - Document metadata (version, trailer)
/// - The merged cross-reference table
/// - Object loading
///
/// # Example
///
/// ```no_run
/// use pdf_objects::document::PdfDocument;
///
/// let doc = PdfDocument::open("sample.pdf")?;
/// println!("PDF version: {}.{}", doc.version().0, doc.version().1);
/// println!("Objects: {}", doc.xref().len());
/// # Ok::<(), pdf_objects::error::Error>(())
/// ```
#[derive(Debug)]
pub struct PdfDocument {
    source: ByteSource,
    options: ParserOptions,
    /// PDF version (major, minor)
    version: (u8, u8),
    xref: ResolvedXRefTable,
}

impl PdfDocument {
    /// Open a PDF file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(ByteSource::open(path)?, ParserOptions::default())
    }

    /// Open a document that is already in memory.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        Self::with_options(ByteSource::new(data), ParserOptions::default())
    }

    /// Open `source` with explicit parser limits.
    pub fn with_options(source: ByteSource, options: ParserOptions) -> Result<Self> {
        let version = parse_header(source.as_bytes())?;
        let startxref = find_startxref(source.as_bytes()).ok_or(Error::MissingStartxref)?;
        log::debug!("PDF {}.{}, startxref {}", version.0, version.1, startxref);

        let xref = XRefResolver::with_options(&source, options).resolve(startxref)?;
        log::info!(
            "Resolved {} cross-reference entries from {} section(s)",
            xref.len(),
            xref.section_offsets().len()
        );

        Ok(Self {
            source,
            options,
            version,
            xref,
        })
    }

    /// Get the PDF version.
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    pub fn xref(&self) -> &ResolvedXRefTable {
        &self.xref
    }

    /// Trailer of the newest cross-reference section.
    pub fn trailer(&self) -> &Trailer {
        self.xref.trailer()
    }

    pub fn source(&self) -> &ByteSource {
        &self.source
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Lexer over the document bytes with the document's limits.
    pub fn lexer(&self) -> ObjectLexer<'_> {
        ObjectLexer::with_options(&self.source, self.options)
    }

    /// Load an uncompressed object by reference.
    ///
    /// Free and unknown objects are `ObjectNotFound`. Objects stored in an
    /// object stream are reported as `CompressedObject`; see
    /// [`locate_compressed`](Self::locate_compressed).
    pub fn load_object(&self, obj_ref: ObjectRef) -> Result<IndirectObject> {
        log::debug!("Loading object {}", obj_ref);

        let offset = match self.xref.get(obj_ref.object_num) {
            Some(CrossRefEntry::InUse { offset, generation }) if *generation == obj_ref.generation_num => *offset,
            Some(CrossRefEntry::InUse { generation, .. }) => {
                log::debug!("Object {} is at generation {}", obj_ref.object_num, generation);
                return Err(Error::ObjectNotFound(obj_ref));
            },
            Some(CrossRefEntry::Compressed { container, index }) => {
                return Err(Error::CompressedObject {
                    object_num: obj_ref.object_num,
                    container: *container,
                    index: *index,
                });
            },
            Some(CrossRefEntry::Free { .. }) | None => return Err(Error::ObjectNotFound(obj_ref)),
        };

        let pos = usize::try_from(offset)
            .ok()
            .filter(|&pos| pos < self.source.len())
            .ok_or(XRefError::new(XRefErrorKind::InvalidOffset, offset))?;

        let object = self.lexer().parse_indirect_object(pos)?;
        let found = object.reference();
        if found != obj_ref {
            return Err(Error::ObjectMismatch {
                expected: obj_ref,
                found,
                offset,
            });
        }
        Ok(object)
    }

    /// Find the object stream holding compressed object `object_num`.
    ///
    /// Returns the container reference and the index within it, after
    /// checking that the container is an in-use `/Type /ObjStm` stream.
    pub fn locate_compressed(&self, object_num: u32) -> Result<(ObjectRef, u32)> {
        let (container, index) = match self.xref.get(object_num) {
            Some(CrossRefEntry::Compressed { container, index }) => (*container, *index),
            _ => return Err(Error::ObjectNotFound(ObjectRef::new(object_num, 0))),
        };

        let container_ref = ObjectRef::new(container, 0);
        let object = self.load_object(container_ref)?;
        let stream = object.value.value.as_stream().ok_or_else(|| Error::InvalidObjectType {
            expected: "Stream".to_string(),
            found: object.value.value.type_name().to_string(),
        })?;
        match stream.dict().get_name("Type") {
            Some("ObjStm") => Ok((container_ref, index)),
            other => Err(Error::InvalidObjectType {
                expected: "ObjStm".to_string(),
                found: other.unwrap_or("no /Type").to_string(),
            }),
        }
    }
}

/// Parse the `%PDF-M.m` header.
///
/// The marker may be preceded by junk, as long as it starts within the
/// first 1024 bytes.
///
/// ```rust
/// # use pdf_objects::document::parse_header;
/// assert_eq!(parse_header(b"%PDF-1.7\n").unwrap(), (1, 7));
/// ```
pub fn parse_header(data: &[u8]) -> Result<(u8, u8)> {
    let window = &data[..data.len().min(HEADER_SEARCH_LIMIT)];
    let start = window.windows(5).position(|w| w == b"%PDF-").ok_or_else(|| {
        Error::InvalidHeader(String::from_utf8_lossy(&window[..window.len().min(8)]).into_owned())
    })?;

    match &data[start + 5..] {
        [major, b'.', minor, ..] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            let version = (major - b'0', minor - b'0');
            if !(1..=2).contains(&version.0) {
                return Err(Error::InvalidHeader(format!("%PDF-{}.{}", version.0, version.1)));
            }
            Ok(version)
        },
        rest => Err(Error::InvalidHeader(format!(
            "%PDF-{}",
            String::from_utf8_lossy(&rest[..rest.len().min(3)])
        ))),
    }
}
