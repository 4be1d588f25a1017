//! PDF lexer primitives.
//!
//! Low-level nom parsers and byte decoders that the [`ObjectLexer`] composes
//! into whole objects. Nothing here knows about absolute offsets; callers
//! compute them from the remaining input.
//!
//! # PDF Syntax Overview
//!
//! - Numbers: integers (42, -123) and reals (3.14, -2.5, .5)
//! - Strings: literal ((Hello)) and hexadecimal (<48656C6C6F>)
//! - Names: identifiers starting with / (/Type, /A#42)
//! - Keywords: true, false, null, obj, endobj, stream, endstream
//! - References: indirect object references (10 0 R)
//!
//! Whitespace (space, \t, \r, \n, \0, \f) and comments (% to EOL) are skipped.
//!
//! [`ObjectLexer`]: crate::parser::ObjectLexer

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{char, digit1},
    combinator::{map_res, value},
    sequence::{preceded, tuple},
    IResult,
};

/// PDF whitespace (ISO 32000-1:2008, Table 1).
pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// PDF delimiter characters (ISO 32000-1:2008, Table 2).
pub fn is_delimiter(c: u8) -> bool {
    matches!(c, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Anything that can appear inside a name or keyword.
pub fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

/// True when a token ending here is complete (end of input, whitespace or delimiter).
pub fn at_token_boundary(input: &[u8]) -> bool {
    input.first().map_or(true, |&c| !is_regular(c))
}

/// Value of a single hex digit.
pub fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Parse at least one whitespace character.
fn whitespace(input: &[u8]) -> IResult<&[u8], ()> {
    value((), take_while1(is_whitespace))(input)
}

/// Parse a comment (% to end of line).
fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    value((), preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n')))(input)
}

/// Skip all whitespace and comments.
pub fn skip_ws(input: &[u8]) -> &[u8] {
    let mut remaining = input;
    loop {
        if let Ok((rest, _)) = whitespace(remaining) {
            remaining = rest;
            continue;
        }
        if let Ok((rest, _)) = comment(remaining) {
            remaining = rest;
            continue;
        }
        return remaining;
    }
}

/// Match a keyword that must end at a token boundary, so `nullx` is not `null`.
pub fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], &'a [u8]> {
    move |input: &'a [u8]| {
        let (rest, matched) = tag::<_, _, nom::error::Error<&'a [u8]>>(kw)(input)?;
        if at_token_boundary(rest) {
            Ok((rest, matched))
        } else {
            Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)))
        }
    }
}

/// The three literal keywords that denote values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    True,
    False,
    Null,
}

pub fn literal_keyword(input: &[u8]) -> IResult<&[u8], Keyword> {
    alt((
        value(Keyword::True, keyword("true")),
        value(Keyword::False, keyword("false")),
        value(Keyword::Null, keyword("null")),
    ))(input)
}

/// Unsigned decimal integer as used in object numbers.
fn unsigned(input: &[u8]) -> IResult<&[u8], u32> {
    map_res(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|s| s.parse::<u32>().map_err(|_| ()))
    })(input)
}

/// Parse an indirect reference `N G R`.
///
/// Both numbers must be plain unsigned integers separated by whitespace, and
/// the `R` must end at a token boundary. Callers fall back to a plain number
/// when this fails.
pub fn reference(input: &[u8]) -> IResult<&[u8], (u32, u32)> {
    let (rest, (num, _, gen, _, _)) =
        tuple((unsigned, whitespace, unsigned, whitespace, char('R')))(input)?;
    if !at_token_boundary(rest) {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Verify)));
    }
    Ok((rest, (num, gen)))
}

/// Parse an indirect object header `N G obj`.
pub fn object_header(input: &[u8]) -> IResult<&[u8], (u32, u32)> {
    let (rest, (num, _, gen)) = tuple((unsigned, whitespace, unsigned))(input)?;
    let (rest, _) = keyword("obj")(skip_ws(rest))?;
    Ok((rest, (num, gen)))
}

/// Raw number token: the run of `0-9 + - .` bytes.
pub fn number_token(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while1(|c: u8| c.is_ascii_digit() || matches!(c, b'+' | b'-' | b'.'))(input)
}

/// Numeric value of a number token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Integer(i64),
    Real(f64),
}

/// Interpret a number token. Tokens with a `.` are reals.
///
/// Returns `None` for runs such as `--5`, `1.2.3` or a bare `-`.
pub fn parse_numeric(raw: &[u8]) -> Option<Numeric> {
    let text = std::str::from_utf8(raw).ok()?;
    if text.contains('.') {
        text.parse::<f64>().ok().map(Numeric::Real)
    } else {
        text.parse::<i64>().ok().map(Numeric::Integer)
    }
}

/// Length of a literal string body.
///
/// `input` starts right after the opening `(`. Returns the index of the
/// matching `)`, or `None` if the string is unterminated. A parenthesis
/// preceded by an odd number of backslashes is not counted.
pub fn literal_string_end(input: &[u8]) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = 0;
    while i < input.len() {
        match input[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            },
            _ => {},
        }
        i += 1;
    }
    None
}

/// Decode the body of a literal string.
///
/// Handles the escapes `\n \r \t \b \f \( \) \\`, line continuation, and
/// octal `\ddd` (high bits beyond a byte are dropped). Any unescaped run
/// of CR/LF bytes becomes a single `\n`. An unknown escape keeps the
/// backslash.
pub fn decode_literal_string(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        match raw[i] {
            b'\\' => {
                let Some(&next) = raw.get(i + 1) else {
                    out.push(b'\\');
                    break;
                };
                i += 2;
                match next {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b'(' | b')' | b'\\' => out.push(next),
                    // Line continuation
                    b'\r' => {
                        if raw.get(i) == Some(&b'\n') {
                            i += 1;
                        }
                    },
                    b'\n' => {},
                    b'0'..=b'7' => {
                        let mut code = u32::from(next - b'0');
                        let mut digits = 1;
                        while digits < 3 {
                            match raw.get(i) {
                                Some(&d @ b'0'..=b'7') => {
                                    code = code * 8 + u32::from(d - b'0');
                                    i += 1;
                                    digits += 1;
                                },
                                _ => break,
                            }
                        }
                        out.push((code & 0xFF) as u8);
                    },
                    other => {
                        out.push(b'\\');
                        out.push(other);
                    },
                }
            },
            b'\r' | b'\n' => {
                out.push(b'\n');
                while i < raw.len() && matches!(raw[i], b'\r' | b'\n') {
                    i += 1;
                }
            },
            c => {
                out.push(c);
                i += 1;
            },
        }
    }

    out
}

/// Decode a hex string body (between `<` and `>`).
///
/// Whitespace is ignored and an odd digit count is padded with `0`.
/// Returns `None` on any other non-hex byte.
pub fn decode_hex_string(raw: &[u8]) -> Option<Vec<u8>> {
    let mut nibbles = Vec::with_capacity(raw.len());
    for &c in raw {
        if is_whitespace(c) {
            continue;
        }
        nibbles.push(hex_value(c)?);
    }
    if nibbles.len() % 2 == 1 {
        nibbles.push(0);
    }
    Some(nibbles.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

/// Raw name token after the leading `/`.
pub fn name_token(input: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(char('/'), take_while(is_regular))(input)
}

/// Decode `#XX` escapes in a name.
///
/// The bytes are interpreted as UTF-8, falling back to Latin-1.
/// A `#` not followed by two hex digits is kept literally.
pub fn decode_name(raw: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' {
            let high = raw.get(i + 1).and_then(|&c| hex_value(c));
            let low = raw.get(i + 2).and_then(|&c| hex_value(c));
            if let (Some(high), Some(low)) = (high, low) {
                bytes.push((high << 4) | low);
                i += 3;
                continue;
            }
        }
        bytes.push(raw[i]);
        i += 1;
    }

    match String::from_utf8(bytes) {
        Ok(name) => name,
        Err(err) => err.into_bytes().iter().map(|&b| b as char).collect(),
    }
}
