//! Cross-reference table parser.
//!
//! The xref table maps object numbers to byte offsets in the PDF file,
//! enabling random access to PDF objects.
//!
//! Supports both traditional xref tables (PDF 1.0-1.4) and
//! cross-reference streams (PDF 1.5+). [`XRefResolver::resolve`] walks the
//! `/Prev` and `/XRefStm` chain from the final `startxref` and merges all
//! sections into one [`ResolvedXRefTable`].

use crate::bits::BitCursor;
use crate::error::{Error, Result, XRefError, XRefErrorKind};
use crate::lexer::{self, keyword};
use crate::object::Object;
use crate::parser::ObjectLexer;
use crate::parser_config::ParserOptions;
use crate::source::ByteSource;
use crate::trailer::Trailer;
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::{char, digit1, one_of, space1};
use nom::combinator::{all_consuming, map_res};
use nom::sequence::{separated_pair, tuple};
use nom::IResult;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// Cross-reference table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrossRefEntry {
    /// Uncompressed object at a byte offset
    InUse { offset: u64, generation: u32 },
    /// Free object, linked into the free list
    Free { next_free: u64, generation: u32 },
    /// Object stored inside an object stream (PDF 1.5+)
    Compressed { container: u32, index: u32 },
}

impl CrossRefEntry {
    /// Generation number; objects in object streams always have generation 0.
    pub fn generation(&self) -> u32 {
        match self {
            Self::InUse { generation, .. } | Self::Free { generation, .. } => *generation,
            Self::Compressed { .. } => 0,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free { .. })
    }
}

/// Which syntax a section was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum XRefSectionKind {
    Table,
    Stream,
}

/// One classic table or one cross-reference stream.
#[derive(Debug, Clone)]
pub struct XRefSection {
    /// Offset the section was read from
    pub offset: u64,
    pub kind: XRefSectionKind,
    /// Entries in the order they appear
    pub entries: Vec<(u32, CrossRefEntry)>,
    pub trailer: Trailer,
}

/// All sections of a document merged into one lookup table.
///
/// Sections are merged newest first and an entry is never overwritten, so
/// an update always shadows the revision it updates.
#[derive(Debug, Clone)]
pub struct ResolvedXRefTable {
    entries: HashMap<u32, CrossRefEntry>,
    trailer: Trailer,
    section_offsets: Vec<u64>,
}

impl ResolvedXRefTable {
    fn from_newest(section: XRefSection) -> Self {
        let mut table = Self {
            entries: HashMap::with_capacity(section.entries.len()),
            trailer: section.trailer.clone(),
            section_offsets: Vec::new(),
        };
        table.merge(section);
        table
    }

    /// Add an older section. Entries already present win.
    fn merge(&mut self, section: XRefSection) {
        for (object_num, entry) in section.entries {
            self.entries.entry(object_num).or_insert(entry);
        }
        self.section_offsets.push(section.offset);
    }

    /// Get an entry by object number.
    pub fn get(&self, object_num: u32) -> Option<&CrossRefEntry> {
        self.entries.get(&object_num)
    }

    pub fn contains(&self, object_num: u32) -> bool {
        self.entries.contains_key(&object_num)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &CrossRefEntry)> {
        self.entries.iter().map(|(num, entry)| (*num, entry))
    }

    /// Trailer of the newest section.
    pub fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    /// Offsets of the sections in the order they were visited.
    pub fn section_offsets(&self) -> &[u64] {
        &self.section_offsets
    }
}

/// Find the offset after the last `startxref` keyword.
///
/// A missing `%%EOF` after the offset is tolerated.
pub fn find_startxref(data: &[u8]) -> Option<u64> {
    const KEYWORD: &[u8] = b"startxref";
    let pos = data.windows(KEYWORD.len()).rposition(|w| w == KEYWORD)?;
    let after = lexer::skip_ws(&data[pos + KEYWORD.len()..]);
    let (rest, offset) = map_res(digit1::<_, nom::error::Error<&[u8]>>, |d: &[u8]| {
        std::str::from_utf8(d).map_err(|_| ()).and_then(|s| s.parse::<u64>().map_err(|_| ()))
    })(after)
    .ok()?;

    if !rest.windows(5).any(|w| w == b"%%EOF") {
        log::warn!("No %%EOF after startxref {}", offset);
    }
    Some(offset)
}

/// Line iterator that accepts CR, LF and CRLF line endings.
///
/// Yields each line's absolute start offset and its bytes without the
/// line ending.
struct Lines<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Lines<'a> {
    type Item = (usize, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.data[start..];
        let len = rest.iter().position(|&b| b == b'\r' || b == b'\n').unwrap_or(rest.len());
        self.pos = start + len;
        if rest[len..].starts_with(b"\r\n") {
            self.pos += 2;
        } else if len < rest.len() {
            self.pos += 1;
        }
        Some((start, &rest[..len]))
    }
}

fn trim(line: &[u8]) -> &[u8] {
    let start = line.iter().position(|&b| !lexer::is_whitespace(b)).unwrap_or(line.len());
    let end = line.iter().rposition(|&b| !lexer::is_whitespace(b)).map_or(start, |p| p + 1);
    &line[start..end]
}

fn decimal<T: std::str::FromStr>(digits: &[u8]) -> std::result::Result<T, ()> {
    std::str::from_utf8(digits).map_err(|_| ())?.parse().map_err(|_| ())
}

/// Subsection header: `FIRST COUNT`.
fn subsection_header(line: &[u8]) -> IResult<&[u8], (u32, u32)> {
    all_consuming(separated_pair(
        map_res(digit1, decimal::<u32>),
        space1,
        map_res(digit1, decimal::<u32>),
    ))(line)
}

fn fixed_digits<'a>(n: usize) -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], u64> {
    map_res(take_while_m_n(n, n, |c: u8| c.is_ascii_digit()), decimal::<u64>)
}

/// Entry line: 10-digit offset, 5-digit generation, `f` or `n`.
fn entry_line(line: &[u8]) -> IResult<&[u8], CrossRefEntry> {
    let (rest, (offset, _, generation, _, state)) = all_consuming(tuple((
        fixed_digits(10),
        char(' '),
        fixed_digits(5),
        char(' '),
        one_of("fn"),
    )))(line)?;
    // Five digits always fit a u32
    let generation = generation as u32;
    let entry = match state {
        'n' => CrossRefEntry::InUse { offset, generation },
        _ => CrossRefEntry::Free {
            next_free: offset,
            generation,
        },
    };
    Ok((rest, entry))
}

/// Parses cross-reference sections out of a [`ByteSource`].
#[derive(Debug, Clone, Copy)]
pub struct XRefResolver<'a> {
    source: &'a ByteSource,
    options: ParserOptions,
}

impl<'a> XRefResolver<'a> {
    pub fn new(source: &'a ByteSource) -> Self {
        Self::with_options(source, ParserOptions::default())
    }

    pub fn with_options(source: &'a ByteSource, options: ParserOptions) -> Self {
        Self { source, options }
    }

    fn error(kind: XRefErrorKind, offset: u64) -> Error {
        Error::XRef(XRefError::new(kind, offset))
    }

    /// Walk the section chain starting at `startxref` and merge it.
    ///
    /// Sections are visited breadth first. A hybrid file's `/XRefStm` is
    /// queued before its `/Prev`. An offset that is already queued is not
    /// queued twice; reaching an offset that was already parsed is a cycle.
    pub fn resolve(&self, startxref: u64) -> Result<ResolvedXRefTable> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut table: Option<ResolvedXRefTable> = None;
        queue.push_back(startxref);

        while let Some(offset) = queue.pop_front() {
            if !visited.insert(offset) {
                log::warn!("Cross-reference chain revisits section at {}", offset);
                return Err(Self::error(XRefErrorKind::CycleDetected, offset));
            }
            if visited.len() > self.options.max_xref_sections {
                return Err(Self::error(XRefErrorKind::TooManySections, offset));
            }

            let section = self.parse_section(offset)?;
            log::debug!(
                "Parsed {:?} xref section at {} with {} entries",
                section.kind,
                offset,
                section.entries.len()
            );

            for next in [section.trailer.xref_stream, section.trailer.prev].into_iter().flatten() {
                if queue.contains(&next) {
                    log::debug!("Section at {} is already queued", next);
                } else {
                    queue.push_back(next);
                }
            }

            match table.as_mut() {
                Some(table) => table.merge(section),
                None => table = Some(ResolvedXRefTable::from_newest(section)),
            }
        }

        table.ok_or_else(|| Self::error(XRefErrorKind::InvalidOffset, startxref))
    }

    /// Parse the single section at `offset`, without following `/Prev`.
    pub fn parse_section(&self, offset: u64) -> Result<XRefSection> {
        let start = usize::try_from(offset)
            .ok()
            .filter(|&pos| pos < self.source.len())
            .ok_or_else(|| Self::error(XRefErrorKind::InvalidOffset, offset))?;

        let rest = lexer::skip_ws(self.source.tail(start));
        match keyword("xref")(rest) {
            Ok((after, _)) => self.parse_table(offset, self.source.len() - after.len()),
            Err(_) => self.parse_stream(offset, start),
        }
    }

    /// Classic table; `body` is the position right after the `xref` keyword.
    ///
    /// The table format is:
    /// ```text
    /// xref
    /// 0 6
    /// 0000000000 65535 f
    /// 0000000018 00000 n
    /// ...
    /// trailer
    /// << /Size 6 /Root 1 0 R >>
    /// ```
    fn parse_table(&self, offset: u64, body: usize) -> Result<XRefSection> {
        let mut lines = Lines {
            data: self.source.as_bytes(),
            pos: body,
        };
        let mut entries = Vec::new();

        // Rest of the `xref` line
        if let Some((line_start, line)) = lines.next() {
            if !trim(line).is_empty() {
                return Err(Self::error(XRefErrorKind::BadSubsectionHeader, line_start as u64));
            }
        }

        loop {
            let (line_start, line) = lines
                .next()
                .ok_or_else(|| Self::error(XRefErrorKind::MissingTrailer, offset))?;
            let line = trim(line);
            if line.is_empty() {
                continue;
            }
            if line.starts_with(b"trailer") {
                let keyword_end = self.keyword_end(line_start, b"trailer");
                let trailer = self.parse_trailer_dict(offset, keyword_end)?;
                return Ok(XRefSection {
                    offset,
                    kind: XRefSectionKind::Table,
                    entries,
                    trailer,
                });
            }

            let (_, (first, count)) = subsection_header(line)
                .map_err(|_| Self::error(XRefErrorKind::BadSubsectionHeader, line_start as u64))?;
            if count > self.options.max_subsection_count {
                log::warn!("Subsection {} claims {} entries", first, count);
                return Err(Self::error(XRefErrorKind::BadSubsectionHeader, line_start as u64));
            }

            let mut read = 0;
            while read < count {
                let (entry_start, line) = lines
                    .next()
                    .ok_or_else(|| Self::error(XRefErrorKind::MissingTrailer, offset))?;
                let line = trim(line);
                if line.is_empty() {
                    continue;
                }
                if line.starts_with(b"trailer") {
                    log::debug!("Subsection {} ended after {} of {} entries", first, read, count);
                    return Err(Self::error(XRefErrorKind::IncompleteSubsection, entry_start as u64));
                }
                let (_, entry) = entry_line(line)
                    .map_err(|_| Self::error(XRefErrorKind::BadEntryLine, entry_start as u64))?;
                let object_num = first
                    .checked_add(read)
                    .ok_or_else(|| Self::error(XRefErrorKind::BadSubsectionHeader, line_start as u64))?;
                entries.push((object_num, entry));
                read += 1;
            }
        }
    }

    /// Position right after `kw` on the line starting at `line_start`.
    fn keyword_end(&self, line_start: usize, kw: &[u8]) -> usize {
        let line = self.source.tail(line_start);
        let leading = line.iter().take_while(|&&b| lexer::is_whitespace(b)).count();
        line_start + leading + kw.len()
    }

    fn parse_trailer_dict(&self, offset: u64, pos: usize) -> Result<Trailer> {
        let lexer = ObjectLexer::with_options(self.source, self.options);
        let parsed = lexer
            .parse_object(pos)?
            .ok_or_else(|| Self::error(XRefErrorKind::MissingTrailer, offset))?;
        match &parsed.value {
            Object::Dictionary(dict) => Ok(Trailer::from_dictionary(dict, offset)?),
            other => {
                log::debug!("Trailer at {} is {}, not a dictionary", offset, other.type_name());
                Err(Self::error(XRefErrorKind::InvalidTrailer, offset))
            },
        }
    }

    /// Cross-reference stream object at `start`.
    ///
    /// The stream dictionary contains:
    /// - `/W [w1 w2 w3]` - Field widths in bytes
    /// - `/Size` - Total number of entries
    /// - `/Index [start1 count1 start2 count2...]` - Optional subsection ranges
    fn parse_stream(&self, offset: u64, start: usize) -> Result<XRefSection> {
        let lexer = ObjectLexer::with_options(self.source, self.options);
        let object = lexer.parse_indirect_object(start)?;
        let stream = object
            .value
            .value
            .as_stream()
            .ok_or_else(|| Self::error(XRefErrorKind::NotAStream, offset))?;
        let dict = stream.dict();

        if let Some(kind) = dict.get_name("Type") {
            if kind != "XRef" {
                log::debug!("Expected /Type /XRef at {}, got /{}", offset, kind);
                return Err(Self::error(XRefErrorKind::InvalidStreamDictionary, offset));
            }
        }
        if !dict.contains_key("W") || !dict.contains_key("Size") {
            return Err(Self::error(XRefErrorKind::InvalidStreamDictionary, offset));
        }

        let trailer = Trailer::from_dictionary(dict, offset)?;
        let widths = trailer
            .widths
            .ok_or_else(|| Self::error(XRefErrorKind::InvalidStreamDictionary, offset))?;
        if widths.iter().any(|&w| w > 8) {
            log::debug!("/W {:?} has a field wider than 8 bytes", widths);
            return Err(Self::error(XRefErrorKind::InvalidStreamDictionary, offset));
        }
        let index = trailer.index.clone().unwrap_or_else(|| vec![0, trailer.size]);

        let data = stream.decode_with_options(&self.options)?;
        let mut cursor = BitCursor::new(data);
        let mut entries = Vec::new();

        for pair in index.chunks_exact(2) {
            let (first, count) = (pair[0], pair[1]);
            if count > self.options.max_subsection_count {
                return Err(Self::error(XRefErrorKind::InvalidStreamDictionary, offset));
            }
            for i in 0..count {
                let object_num = first
                    .checked_add(i)
                    .ok_or_else(|| Self::error(XRefErrorKind::InvalidStreamDictionary, offset))?;
                let entry_type = read_field(&mut cursor, widths[0], 1, offset)?;
                let field1 = read_field(&mut cursor, widths[1], 0, offset)?;
                let field2 = read_field(&mut cursor, widths[2], 0, offset)?;
                entries.push((object_num, stream_entry(entry_type, field1, field2, offset)?));
            }
        }

        if !cursor.is_eod() {
            log::debug!("{} unused bits after xref stream entries", cursor.remaining());
        }

        Ok(XRefSection {
            offset,
            kind: XRefSectionKind::Stream,
            entries,
            trailer,
        })
    }
}

/// Big-endian field of `width` bytes; a zero width yields `default`.
fn read_field(cursor: &mut BitCursor, width: u8, default: u64, offset: u64) -> Result<u64> {
    if width == 0 {
        return Ok(default);
    }
    let mut value = 0u64;
    for _ in 0..width {
        let byte = cursor
            .read(8)
            .map_err(|_| XRefResolver::error(XRefErrorKind::TruncatedStream, offset))?;
        value = (value << 8) | u64::from(byte);
    }
    Ok(value)
}

fn stream_entry(entry_type: u64, field1: u64, field2: u64, offset: u64) -> Result<CrossRefEntry> {
    let narrow = |v: u64| u32::try_from(v).map_err(|_| XRefResolver::error(XRefErrorKind::BadEntryLine, offset));
    match entry_type {
        0 => Ok(CrossRefEntry::Free {
            next_free: field1,
            generation: narrow(field2)?,
        }),
        1 => Ok(CrossRefEntry::InUse {
            offset: field1,
            generation: narrow(field2)?,
        }),
        2 => Ok(CrossRefEntry::Compressed {
            container: narrow(field1)?,
            index: narrow(field2)?,
        }),
        other => {
            log::debug!("Cross-reference stream entry type {}", other);
            Err(XRefResolver::error(XRefErrorKind::UnsupportedEntryType, offset))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xref_kind(result: Result<impl std::fmt::Debug>) -> XRefErrorKind {
        match result {
            Err(Error::XRef(e)) => e.kind,
            other => panic!("expected an xref error, got {:?}", other),
        }
    }

    /// Assembles a file and remembers where each piece starts.
    #[derive(Default)]
    struct Builder {
        buf: Vec<u8>,
    }

    impl Builder {
        fn push(&mut self, text: &str) -> u64 {
            let offset = self.buf.len() as u64;
            self.buf.extend_from_slice(text.as_bytes());
            offset
        }

        fn source(self) -> ByteSource {
            ByteSource::from(self.buf)
        }
    }

    #[test]
    fn test_find_startxref() {
        let pdf = b"%PDF-1.4\nstartxref\n10\n%%EOF\nxref\nstartxref\n  12345\n%%EOF\n";
        assert_eq!(find_startxref(pdf), Some(12345));
    }

    #[test]
    fn test_find_startxref_without_eof() {
        assert_eq!(find_startxref(b"trailer\nstartxref\r\n99"), Some(99));
    }

    #[test]
    fn test_find_startxref_missing() {
        assert_eq!(find_startxref(b"%PDF-1.4\nxref\n"), None);
        assert_eq!(find_startxref(b"startxref\n%%EOF"), None);
    }

    #[test]
    fn test_parse_table_single_subsection() {
        let source = ByteSource::from(
            &b"xref\n0 3\n0000000000 65535 f \n0000000018 00000 n \n0000000154 00000 n \ntrailer\n<< /Size 3 >>\n"[..],
        );
        let section = XRefResolver::new(&source).parse_section(0).unwrap();

        assert_eq!(section.kind, XRefSectionKind::Table);
        assert_eq!(
            section.entries,
            vec![
                (
                    0,
                    CrossRefEntry::Free {
                        next_free: 0,
                        generation: 65535
                    }
                ),
                (
                    1,
                    CrossRefEntry::InUse {
                        offset: 18,
                        generation: 0
                    }
                ),
                (
                    2,
                    CrossRefEntry::InUse {
                        offset: 154,
                        generation: 0
                    }
                ),
            ]
        );
        assert_eq!(section.trailer.size, 3);
    }

    #[test]
    fn test_parse_table_multiple_subsections_and_blank_lines() {
        let source = ByteSource::from(
            &b"  xref\n0 1\n0000000000 65535 f\n\n5 2\n0000000200 00000 n\n0000000300 00001 n\ntrailer << /Size 7 >>"[..],
        );
        let section = XRefResolver::new(&source).parse_section(0).unwrap();
        let nums: Vec<u32> = section.entries.iter().map(|(n, _)| *n).collect();
        assert_eq!(nums, vec![0, 5, 6]);
        assert_eq!(section.entries[2].1.generation(), 1);
        assert_eq!(section.trailer.size, 7);
    }

    #[test]
    fn test_parse_table_cr_only_line_endings() {
        let source =
            ByteSource::from(&b"xref\r0 2\r0000000000 65535 f\r0000000018 00000 n\rtrailer\r<< /Size 2 >>\r"[..]);
        let section = XRefResolver::new(&source).parse_section(0).unwrap();
        assert_eq!(section.entries.len(), 2);
    }

    #[test]
    fn test_parse_table_crlf_line_endings() {
        let source = ByteSource::from(
            &b"xref\r\n0 2\r\n0000000000 65535 f\r\n0000000018 00000 n\r\ntrailer\r\n<< /Size 2 >>\r\n"[..],
        );
        let section = XRefResolver::new(&source).parse_section(0).unwrap();
        assert_eq!(
            section.entries[1].1,
            CrossRefEntry::InUse {
                offset: 18,
                generation: 0
            }
        );
    }

    #[test]
    fn test_parse_table_errors() {
        let cases: &[(&[u8], XRefErrorKind)] = &[
            (b"xref\n0 x\n", XRefErrorKind::BadSubsectionHeader),
            (b"xref\n0 1 2\n", XRefErrorKind::BadSubsectionHeader),
            (b"xref\n0 1\n000000000 65535 f\ntrailer\n<< /Size 1 >>", XRefErrorKind::BadEntryLine),
            (b"xref\n0 1\n0000000000 65535 x\ntrailer\n<< /Size 1 >>", XRefErrorKind::BadEntryLine),
            (b"xref\n0 2\n0000000000 65535 f\ntrailer\n<< /Size 2 >>", XRefErrorKind::IncompleteSubsection),
            (b"xref\n0 1\n0000000000 65535 f\n", XRefErrorKind::MissingTrailer),
            (b"xref\n0 1\n0000000000 65535 f\ntrailer\n[1 2]", XRefErrorKind::InvalidTrailer),
            (b"xref\n0 1\n0000000000 65535 f\ntrailer\n<< /Root 1 0 R >>", XRefErrorKind::InvalidTrailer),
        ];
        for (data, expected) in cases {
            let source = ByteSource::from(data.to_vec());
            let result = XRefResolver::new(&source).parse_section(0);
            assert_eq!(xref_kind(result), *expected, "{:?}", String::from_utf8_lossy(data));
        }
    }

    #[test]
    fn test_parse_table_excessive_count() {
        let source = ByteSource::from(&b"xref\n0 2000001\n0000000000 65535 f\n"[..]);
        let result = XRefResolver::new(&source).parse_section(0);
        assert_eq!(xref_kind(result), XRefErrorKind::BadSubsectionHeader);

        let options = ParserOptions::default().with_max_subsection_count(1);
        let source = ByteSource::from(&b"xref\n0 2\n"[..]);
        let result = XRefResolver::with_options(&source, options).parse_section(0);
        assert_eq!(xref_kind(result), XRefErrorKind::BadSubsectionHeader);
    }

    #[test]
    fn test_offset_beyond_end() {
        let source = ByteSource::from(&b"xref\n"[..]);
        let result = XRefResolver::new(&source).parse_section(5);
        assert_eq!(xref_kind(result), XRefErrorKind::InvalidOffset);
    }

    const XREF_STREAM: &str = "1 0 obj\n<<\n    /Type /XRef\n    /Size 100\n    /Index [2 10]\n    \
        /W [1 2 1]\n    /Filter /ASCIIHexDecode\n>>\nstream\n01 0E8A 00\n02 0002 00\n02 0002 01\n\
        02 0002 02\n02 0002 03\n02 0002 04\n02 0002 05\n02 0002 06\n02 0002 07\n01 1323 0\n\
        endstream\nendobj\n";

    #[test]
    fn test_parse_xref_stream() {
        let source = ByteSource::from(XREF_STREAM.as_bytes());
        let section = XRefResolver::new(&source).parse_section(0).unwrap();

        assert_eq!(section.kind, XRefSectionKind::Stream);
        assert_eq!(section.entries.len(), 10);
        assert_eq!(
            section.entries[0],
            (
                2,
                CrossRefEntry::InUse {
                    offset: 3722,
                    generation: 0
                }
            )
        );
        for (i, (num, entry)) in section.entries[1..9].iter().enumerate() {
            assert_eq!(*num, 3 + i as u32);
            assert_eq!(
                *entry,
                CrossRefEntry::Compressed {
                    container: 2,
                    index: i as u32
                }
            );
        }
        assert_eq!(
            section.entries[9],
            (
                11,
                CrossRefEntry::InUse {
                    offset: 4899,
                    generation: 0
                }
            )
        );
        assert_eq!(section.trailer.size, 100);
        assert_eq!(section.trailer.widths, Some([1, 2, 1]));
    }

    #[test]
    fn test_xref_stream_default_index_and_zero_width() {
        // /W [0 1 0]: every entry is type 1 with generation 0
        let source = ByteSource::from(
            &b"5 0 obj\n<< /Type /XRef /Size 3 /W [0 1 0] /Filter /ASCIIHexDecode >>\nstream\n00 10 20>\nendstream\nendobj\n"[..],
        );
        let section = XRefResolver::new(&source).parse_section(0).unwrap();
        assert_eq!(
            section.entries,
            vec![
                (
                    0,
                    CrossRefEntry::InUse {
                        offset: 0,
                        generation: 0
                    }
                ),
                (
                    1,
                    CrossRefEntry::InUse {
                        offset: 16,
                        generation: 0
                    }
                ),
                (
                    2,
                    CrossRefEntry::InUse {
                        offset: 32,
                        generation: 0
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_xref_stream_errors() {
        let cases: &[(&[u8], XRefErrorKind)] = &[
            (
                b"1 0 obj\n<< /Type /XRef /Size 1 /W [1 1 1] /Filter /AHx >>\nstream\n03 00 00\nendstream\nendobj\n",
                XRefErrorKind::UnsupportedEntryType,
            ),
            (
                b"1 0 obj\n<< /Type /XRef /Size 2 /W [1 1 1] /Filter /AHx >>\nstream\n01 00 00\nendstream\nendobj\n",
                XRefErrorKind::TruncatedStream,
            ),
            (
                b"1 0 obj\n<< /Type /XRef /Size 1 >>\nstream\n\x01\x00\x00\nendstream\nendobj\n",
                XRefErrorKind::InvalidStreamDictionary,
            ),
            (
                b"1 0 obj\n<< /Type /XRef /Size 1 /W [1 9 1] >>\nstream\n\x01\x00\x00\nendstream\nendobj\n",
                XRefErrorKind::InvalidStreamDictionary,
            ),
            (
                b"1 0 obj\n<< /Type /ObjStm /Size 1 /W [1 1 1] >>\nstream\n\x01\x00\x00\nendstream\nendobj\n",
                XRefErrorKind::InvalidStreamDictionary,
            ),
            (b"1 0 obj\n<< /Size 1 >>\nendobj\n", XRefErrorKind::NotAStream),
        ];
        for (data, expected) in cases {
            let source = ByteSource::from(data.to_vec());
            let result = XRefResolver::new(&source).parse_section(0);
            assert_eq!(xref_kind(result), *expected, "{:?}", String::from_utf8_lossy(data));
        }
    }

    #[test]
    fn test_xref_stream_filter_error_propagates() {
        let source = ByteSource::from(
            &b"1 0 obj\n<< /Type /XRef /Size 1 /W [1 1 1] /Filter /DCTDecode >>\nstream\nxyz\nendstream\nendobj\n"[..],
        );
        let result = XRefResolver::new(&source).parse_section(0);
        assert!(matches!(result, Err(Error::Filter(_))));
    }

    #[test]
    fn test_resolve_newer_section_wins() {
        let mut b = Builder::default();
        b.push("%PDF-1.4\n");
        let older = b.push("xref\n0 1\n0000000000 65535 f \n7 1\n0000000050 00000 n \ntrailer\n<< /Size 8 >>\n");
        let newer = b.push(&format!(
            "xref\n7 1\n0000000100 00000 n \ntrailer\n<< /Size 8 /Root 7 0 R /Prev {} >>\n",
            older
        ));
        let source = b.source();

        let table = XRefResolver::new(&source).resolve(newer).unwrap();
        assert_eq!(
            table.get(7),
            Some(&CrossRefEntry::InUse {
                offset: 100,
                generation: 0
            })
        );
        assert!(table.get(0).unwrap().is_free());
        assert_eq!(table.len(), 2);
        assert_eq!(table.section_offsets(), &[newer, older]);
        assert_eq!(table.trailer().prev, Some(older));
        assert!(table.trailer().root.is_some());
    }

    #[test]
    fn test_resolve_hybrid_uses_xref_stream_before_prev() {
        let mut b = Builder::default();
        b.push("%PDF-1.5\n");
        let prev = b.push("xref\n2 1\n0000000077 00000 n \ntrailer\n<< /Size 3 >>\n");
        let stm = b.push(
            "9 0 obj\n<< /Type /XRef /Size 3 /Index [2 1] /W [1 1 0] /Filter /ASCIIHexDecode >>\n\
             stream\n02 05\nendstream\nendobj\n",
        );
        let table = b.push(&format!(
            "xref\n1 1\n0000000010 00000 n \ntrailer\n<< /Size 3 /Prev {} /XRefStm {} >>\n",
            prev, stm
        ));
        let source = b.source();

        let resolved = XRefResolver::new(&source).resolve(table).unwrap();
        assert_eq!(resolved.section_offsets(), &[table, stm, prev]);
        assert_eq!(
            resolved.get(2),
            Some(&CrossRefEntry::Compressed {
                container: 5,
                index: 0
            })
        );
        assert!(resolved.contains(1));
    }

    #[test]
    fn test_resolve_self_cycle() {
        let mut b = Builder::default();
        b.push("%PDF-1.4\n");
        // The section's own offset is 9
        let offset = b.push("xref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 /Prev 9 >>\n");
        assert_eq!(offset, 9);
        let source = b.source();
        let result = XRefResolver::new(&source).resolve(offset);
        assert_eq!(xref_kind(result), XRefErrorKind::CycleDetected);
    }

    #[test]
    fn test_resolve_too_many_sections() {
        let mut b = Builder::default();
        b.push("%PDF-1.4\n");
        let mut prev: Option<u64> = None;
        for _ in 0..3 {
            let prev_entry = prev.map(|p| format!(" /Prev {}", p)).unwrap_or_default();
            prev = Some(b.push(&format!(
                "xref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1{} >>\n",
                prev_entry
            )));
        }
        let start = prev.unwrap();
        let source = b.source();

        let options = ParserOptions::default().with_max_xref_sections(2);
        let result = XRefResolver::with_options(&source, options).resolve(start);
        assert_eq!(xref_kind(result), XRefErrorKind::TooManySections);
        assert_eq!(XRefResolver::new(&source).resolve(start).unwrap().section_offsets().len(), 3);
    }

    #[test]
    fn test_resolve_aborts_on_broken_prev() {
        let mut b = Builder::default();
        b.push("%PDF-1.4\n");
        let start = b.push("xref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 /Prev 5000 >>\n");
        let source = b.source();
        let result = XRefResolver::new(&source).resolve(start);
        assert_eq!(xref_kind(result), XRefErrorKind::InvalidOffset);
    }

    #[test]
    fn test_entry_serializes_with_type_tag() {
        let json = serde_json::to_string(&CrossRefEntry::Compressed {
            container: 4,
            index: 1,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"compressed","container":4,"index":1}"#);
    }
}
