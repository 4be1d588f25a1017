//! RunLengthDecode implementation.
//!
//! Decodes run-length encoded data according to PDF specification:
//! - Length byte 0-127: Copy next N+1 bytes literally
//! - Length byte 128: EOD marker
//! - Length byte 129-255: Repeat next byte 257-N times

use crate::decoders::StreamDecoder;
use crate::error::{FilterError, FilterResult};

/// RunLengthDecode filter implementation.
pub struct RunLengthDecoder;

impl StreamDecoder for RunLengthDecoder {
    fn decode(&self, input: &[u8]) -> FilterResult<Vec<u8>> {
        let mut output = Vec::new();
        let mut i = 0;

        while i < input.len() {
            let length = input[i];
            i += 1;

            match length {
                0..=127 => {
                    let count = length as usize + 1;
                    let literal = input.get(i..i + count).ok_or_else(|| {
                        FilterError::DecodeFailure(format!(
                            "RunLengthDecode: literal run needs {} bytes, {} left",
                            count,
                            input.len() - i
                        ))
                    })?;
                    output.extend_from_slice(literal);
                    i += count;
                },
                128 => break,
                129..=255 => {
                    let count = 257 - length as usize;
                    let &byte = input.get(i).ok_or_else(|| {
                        FilterError::DecodeFailure("RunLengthDecode: missing byte for run".to_string())
                    })?;
                    i += 1;
                    output.resize(output.len() + count, byte);
                },
            }
        }

        Ok(output)
    }

    fn name(&self) -> &str {
        "RunLengthDecode"
    }
}
