//! ASCII85Decode (Base85) implementation.
//!
//! Decodes ASCII85/Base85 encoded data. This encoding represents 4 bytes
//! as 5 ASCII characters in the range '!' to 'u'.
//! Special case: 'z' represents 4 zero bytes (00000000).

use crate::decoders::StreamDecoder;
use crate::error::{FilterError, FilterResult};
use crate::lexer::is_whitespace;

/// ASCII85Decode filter implementation.
pub struct Ascii85Decoder;

fn push_digit(acc: u32, digit: u32) -> FilterResult<u32> {
    acc.checked_mul(85)
        .and_then(|v| v.checked_add(digit))
        .ok_or_else(|| FilterError::DecodeFailure("ASCII85Decode: group value overflow".to_string()))
}

impl StreamDecoder for Ascii85Decoder {
    fn decode(&self, input: &[u8]) -> FilterResult<Vec<u8>> {
        let start = input.iter().position(|&b| !is_whitespace(b)).unwrap_or(input.len());
        let data = input[start..].strip_prefix(b"<~").unwrap_or(&input[start..]);
        let mut output = Vec::with_capacity(data.len() * 4 / 5 + 4);
        let mut acc: u32 = 0;
        let mut count = 0;

        for &byte in data {
            match byte {
                b'~' => break, // End marker '~>'
                b'z' => {
                    if count != 0 {
                        return Err(FilterError::DecodeFailure(
                            "ASCII85Decode: 'z' inside a group".to_string(),
                        ));
                    }
                    output.extend_from_slice(&[0, 0, 0, 0]);
                },
                b'!'..=b'u' => {
                    acc = push_digit(acc, u32::from(byte - b'!'))?;
                    count += 1;

                    if count == 5 {
                        output.extend_from_slice(&acc.to_be_bytes());
                        acc = 0;
                        count = 0;
                    }
                },
                _ if is_whitespace(byte) => {},
                _ => {
                    return Err(FilterError::DecodeFailure(format!(
                        "ASCII85Decode: invalid character 0x{:02x}",
                        byte
                    )));
                },
            }
        }

        // Final partial group of n characters yields n-1 bytes
        if count > 1 {
            // Pad with 'u' (84 = 117 - 33) to complete the group
            for _ in count..5 {
                acc = push_digit(acc, 84)?;
            }
            output.extend_from_slice(&acc.to_be_bytes()[..count - 1]);
        }

        Ok(output)
    }

    fn name(&self) -> &str {
        "ASCII85Decode"
    }
}
