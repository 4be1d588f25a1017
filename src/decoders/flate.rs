//! FlateDecode (zlib/deflate) implementation.
//!
//! This is the most common PDF compression filter.
//! Uses the flate2 crate for zlib decompression.

use crate::decoders::StreamDecoder;
use crate::error::{FilterError, FilterResult};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// FlateDecode filter implementation.
///
/// Decompresses zlib data. Payloads without a zlib header are retried as
/// raw deflate; anything else is a decode failure.
pub struct FlateDecoder;

impl StreamDecoder for FlateDecoder {
    fn decode(&self, input: &[u8]) -> FilterResult<Vec<u8>> {
        let mut output = Vec::new();
        let zlib_err = match ZlibDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => return Ok(output),
            Err(e) => e,
        };

        // Some producers write raw deflate data without the zlib wrapper
        log::warn!("FlateDecode: zlib decode failed ({}), trying raw deflate", zlib_err);
        output.clear();
        match DeflateDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => {
                log::info!("Raw deflate recovery succeeded: {} bytes", output.len());
                Ok(output)
            },
            Err(deflate_err) => Err(FilterError::DecodeFailure(format!(
                "FlateDecode: {} (raw deflate: {})",
                zlib_err, deflate_err
            ))),
        }
    }

    fn name(&self) -> &str {
        "FlateDecode"
    }
}
