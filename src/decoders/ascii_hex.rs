//! ASCIIHexDecode implementation.
//!
//! Decodes hexadecimal-encoded data (e.g., "48656C6C6F" -> "Hello").
//! Bytes that are not hex digits are ignored, `>` ends the data, and
//! odd-length input is padded with an implicit '0'.

use crate::decoders::StreamDecoder;
use crate::error::FilterResult;
use crate::lexer::hex_value;

/// ASCIIHexDecode filter implementation.
pub struct AsciiHexDecoder;

impl StreamDecoder for AsciiHexDecoder {
    fn decode(&self, input: &[u8]) -> FilterResult<Vec<u8>> {
        let data = match input.iter().position(|&c| c == b'>') {
            Some(end) => &input[..end],
            None => input,
        };

        let mut output = Vec::with_capacity(data.len() / 2 + 1);
        let mut digits = data.iter().filter_map(|&c| hex_value(c));

        while let Some(high) = digits.next() {
            // If odd length, pad with '0'
            let low = digits.next().unwrap_or(0);
            output.push((high << 4) | low);
        }

        Ok(output)
    }

    fn name(&self) -> &str {
        "ASCIIHexDecode"
    }
}
