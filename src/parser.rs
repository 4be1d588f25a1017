//! PDF object parser.
//!
//! [`ObjectLexer`] turns bytes at an absolute offset of a [`ByteSource`]
//! into [`ParsedObject`]s and [`IndirectObject`]s. It is a thin recursive
//! descent layer over the nom primitives in [`crate::lexer`]; all state is
//! local to each call, so one lexer can be shared between threads.

use crate::error::{LexError, LexErrorKind, Result};
use crate::lexer::{self, Keyword, Numeric};
use crate::object::{Dictionary, IndirectObject, Object, ObjectRef, ParsedObject, Stream};
use crate::parser_config::ParserOptions;
use crate::source::ByteSource;

/// Recursive-descent parser over a [`ByteSource`].
#[derive(Debug, Clone, Copy)]
pub struct ObjectLexer<'a> {
    source: &'a ByteSource,
    options: ParserOptions,
}

impl<'a> ObjectLexer<'a> {
    pub fn new(source: &'a ByteSource) -> Self {
        Self::with_options(source, ParserOptions::default())
    }

    pub fn with_options(source: &'a ByteSource, options: ParserOptions) -> Self {
        Self { source, options }
    }

    pub fn source(&self) -> &'a ByteSource {
        self.source
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Absolute offset of a suffix of the source.
    fn offset_of(&self, rest: &[u8]) -> usize {
        self.source.len() - rest.len()
    }

    /// Offset of the next byte that is neither whitespace nor inside a comment.
    pub fn next_token_pos(&self, pos: usize) -> usize {
        self.offset_of(lexer::skip_ws(self.source.tail(pos)))
    }

    /// Parse one object starting at or after `pos`.
    ///
    /// Returns `Ok(None)` when no object starts there (end of input, a
    /// closing delimiter, or an unknown keyword such as `endobj`). Returns an
    /// error once a token kind has been recognised but is malformed.
    ///
    /// Streams are only recognised by [`parse_indirect_object`](Self::parse_indirect_object).
    pub fn parse_object(&self, pos: usize) -> Result<Option<ParsedObject>> {
        self.parse_at(pos, 0)
    }

    fn parse_at(&self, pos: usize, depth: usize) -> Result<Option<ParsedObject>> {
        let start = self.next_token_pos(pos);
        let input = self.source.tail(start);
        let Some(&first) = input.first() else {
            return Ok(None);
        };

        let (value, end) = match first {
            b'0'..=b'9' => match lexer::reference(input) {
                Ok((rest, (num, gen))) => (Object::Reference(ObjectRef::new(num, gen)), self.offset_of(rest)),
                // Not `N G R`; reparse the same bytes as a number
                Err(_) => self.parse_number(input, start)?,
            },
            b'+' | b'-' | b'.' => self.parse_number(input, start)?,
            b'(' => self.parse_literal_string(input, start)?,
            b'/' => match lexer::name_token(input) {
                Ok((rest, raw)) => (Object::Name(lexer::decode_name(raw)), self.offset_of(rest)),
                Err(_) => return Ok(None),
            },
            b'[' => self.parse_array(start, depth)?,
            b'<' if input.get(1) == Some(&b'<') => {
                let (dict, end) = self.parse_dictionary(start, depth)?;
                (Object::Dictionary(dict), end)
            },
            b'<' => self.parse_hex_string(input, start)?,
            _ => match lexer::literal_keyword(input) {
                Ok((rest, keyword)) => {
                    let value = match keyword {
                        Keyword::True => Object::Boolean(true),
                        Keyword::False => Object::Boolean(false),
                        Keyword::Null => Object::Null,
                    };
                    (value, self.offset_of(rest))
                },
                Err(_) => return Ok(None),
            },
        };

        Ok(Some(ParsedObject::new(value, start, end)))
    }

    fn parse_number(&self, input: &[u8], start: usize) -> Result<(Object, usize)> {
        let invalid = || LexError::new(LexErrorKind::InvalidNumber, start);
        let (rest, raw) = lexer::number_token(input).map_err(|_| invalid())?;
        let value = match lexer::parse_numeric(raw).ok_or_else(invalid)? {
            Numeric::Integer(i) => Object::Integer(i),
            Numeric::Real(r) => Object::Real(r),
        };
        Ok((value, self.offset_of(rest)))
    }

    fn parse_literal_string(&self, input: &[u8], start: usize) -> Result<(Object, usize)> {
        let body = &input[1..];
        let close = lexer::literal_string_end(body)
            .ok_or_else(|| LexError::new(LexErrorKind::UnterminatedString, start))?;
        let bytes = lexer::decode_literal_string(&body[..close]);
        Ok((Object::String(bytes), start + close + 2))
    }

    fn parse_hex_string(&self, input: &[u8], start: usize) -> Result<(Object, usize)> {
        let body = &input[1..];
        let close = body
            .iter()
            .position(|&c| c == b'>')
            .ok_or_else(|| LexError::new(LexErrorKind::UnterminatedHexString, start))?;
        let bytes = lexer::decode_hex_string(&body[..close])
            .ok_or_else(|| LexError::new(LexErrorKind::InvalidHexString, start))?;
        Ok((Object::String(bytes), start + close + 2))
    }

    fn check_depth(&self, depth: usize, pos: usize) -> Result<()> {
        if depth >= self.options.max_nesting {
            return Err(LexError::new(LexErrorKind::NestingTooDeep, pos).into());
        }
        Ok(())
    }

    /// `start` points at `[`.
    fn parse_array(&self, start: usize, depth: usize) -> Result<(Object, usize)> {
        self.check_depth(depth, start)?;
        let mut items = Vec::new();
        let mut pos = start + 1;

        loop {
            let next = self.next_token_pos(pos);
            match self.source.get(next) {
                None => return Err(LexError::new(LexErrorKind::UnbalancedArray, next).into()),
                Some(b']') => return Ok((Object::Array(items), next + 1)),
                Some(_) => {},
            }
            let item = self
                .parse_at(next, depth + 1)?
                .ok_or_else(|| LexError::new(LexErrorKind::UnbalancedArray, next))?;
            pos = item.end_pos;
            items.push(item);
        }
    }

    /// `start` points at `<<`.
    fn parse_dictionary(&self, start: usize, depth: usize) -> Result<(Dictionary, usize)> {
        self.check_depth(depth, start)?;
        let mut dict = Dictionary::new();
        let mut pos = start + 2;

        loop {
            let next = self.next_token_pos(pos);
            let input = self.source.tail(next);
            match input.first() {
                None => return Err(LexError::new(LexErrorKind::UnbalancedDictionary, next).into()),
                Some(b'>') if input.get(1) == Some(&b'>') => return Ok((dict, next + 2)),
                Some(b'>') => return Err(LexError::new(LexErrorKind::UnbalancedDictionary, next).into()),
                Some(b'/') => {},
                Some(_) => return Err(LexError::new(LexErrorKind::InvalidDictionaryKey, next).into()),
            }

            let (rest, raw) = lexer::name_token(input)
                .map_err(|_| LexError::new(LexErrorKind::InvalidDictionaryKey, next))?;
            let value_pos = self.offset_of(rest);
            let value = self.parse_at(value_pos, depth + 1)?.ok_or_else(|| {
                LexError::new(LexErrorKind::MissingDictionaryValue, self.next_token_pos(value_pos))
            })?;
            pos = value.end_pos;
            dict.insert(lexer::decode_name(raw), value);
        }
    }

    /// Parse `N G obj <object> endobj` starting at or after `pos`.
    ///
    /// A dictionary followed by the `stream` keyword becomes a
    /// [`Stream`] whose payload is sliced from the source without copying.
    pub fn parse_indirect_object(&self, pos: usize) -> Result<IndirectObject> {
        let start = self.next_token_pos(pos);
        let (rest, (object_num, generation_num)) = lexer::object_header(self.source.tail(start))
            .map_err(|_| LexError::new(LexErrorKind::MissingObjKeyword, start))?;

        let body_pos = self.offset_of(rest);
        let mut value = self.parse_object(body_pos)?.ok_or_else(|| {
            LexError::new(LexErrorKind::MissingObjectValue, self.next_token_pos(body_pos))
        })?;

        if let Object::Dictionary(dict) = &value.value {
            let after = self.next_token_pos(value.end_pos);
            if let Ok((rest, _)) = lexer::keyword("stream")(self.source.tail(after)) {
                value = self.parse_stream(dict.clone(), value.start_pos, self.offset_of(rest))?;
            }
        }

        let endobj_pos = self.next_token_pos(value.end_pos);
        let (rest, _) = lexer::keyword("endobj")(self.source.tail(endobj_pos))
            .map_err(|_| LexError::new(LexErrorKind::MissingEndobjKeyword, endobj_pos))?;

        log::trace!("Parsed object {} {} at {}..{}", object_num, generation_num, start, self.offset_of(rest));

        Ok(IndirectObject {
            object_num,
            generation_num,
            value,
            start_pos: start,
            end_pos: self.offset_of(rest),
        })
    }

    /// `keyword_end` is the offset right after `stream`.
    fn parse_stream(&self, dict: Dictionary, dict_start: usize, keyword_end: usize) -> Result<ParsedObject> {
        let after_keyword = self.source.tail(keyword_end);
        let data_start = if after_keyword.starts_with(b"\r\n") || after_keyword.starts_with(b"\n") {
            keyword_end + if after_keyword[0] == b'\r' { 2 } else { 1 }
        } else if after_keyword.starts_with(b"\r") {
            log::warn!("Stream keyword at {} followed by CR alone (expected CRLF or LF)", keyword_end);
            keyword_end + 1
        } else {
            log::warn!("No EOL after stream keyword at {}", keyword_end);
            keyword_end
        };

        let data_end = match self.declared_stream_end(&dict, data_start) {
            Some(end) => end,
            None => self.scan_stream_end(data_start)?,
        };

        let endstream_pos = self.next_token_pos(data_end);
        if !self.source.tail(endstream_pos).starts_with(b"endstream") {
            return Err(LexError::new(LexErrorKind::MissingEndstream, endstream_pos).into());
        }

        let stream = Stream::new(dict, self.source.slice(data_start..data_end));
        Ok(ParsedObject::new(
            Object::Stream(stream),
            dict_start,
            endstream_pos + b"endstream".len(),
        ))
    }

    /// Payload end from a direct `/Length`, if `endstream` actually follows it.
    fn declared_stream_end(&self, dict: &Dictionary, data_start: usize) -> Option<usize> {
        let length = match dict.get_object("Length")? {
            Object::Integer(length) => usize::try_from(*length).ok()?,
            Object::Reference(r) => {
                log::debug!("Stream /Length is indirect ({}), scanning for endstream", r);
                return None;
            },
            _ => return None,
        };
        let end = data_start.checked_add(length).filter(|&end| end <= self.source.len())?;
        let after = self.next_token_pos(end);
        if self.source.tail(after).starts_with(b"endstream") {
            Some(end)
        } else {
            log::warn!("Stream /Length {} at {} does not end at endstream, scanning", length, data_start);
            None
        }
    }

    /// Scan for `endstream` and drop the single EOL before it.
    fn scan_stream_end(&self, data_start: usize) -> Result<usize> {
        let idx = find_endstream(self.source.tail(data_start))
            .ok_or_else(|| LexError::new(LexErrorKind::MissingEndstream, data_start))?;
        let payload = &self.source.tail(data_start)[..idx];
        let eol = if payload.ends_with(b"\r\n") {
            2
        } else if payload.ends_with(b"\n") || payload.ends_with(b"\r") {
            1
        } else {
            0
        };
        Ok(data_start + idx - eol)
    }
}

/// Find the position of 'endstream' keyword in input.
fn find_endstream(input: &[u8]) -> Option<usize> {
    let keyword = b"endstream";
    input
        .windows(keyword.len())
        .position(|window| window == keyword)
}
