//! Stream decoder implementations for PDF filters.
//!
//! This module provides decoders for the PDF data filters:
//! - FlateDecode (zlib/deflate) - most common
//! - ASCIIHexDecode - hexadecimal encoding
//! - ASCII85Decode - base85 encoding
//! - LZWDecode - LZW compression
//! - RunLengthDecode - run-length encoding
//!
//! Flate and LZW output may additionally pass through PNG/TIFF predictor
//! reversal. Image codecs (DCT, JPX, JBIG2, CCITT) and Crypt are reported
//! as [`FilterError::UnsupportedFilter`].
//!
//! Decoders can be chained together in a filter pipeline.

use crate::error::{FilterError, FilterResult};
use crate::parser_config::ParserOptions;

mod ascii85;
mod ascii_hex;
mod flate;
mod lzw;
mod predictor;
mod runlength;

pub use ascii85::Ascii85Decoder;
pub use ascii_hex::AsciiHexDecoder;
pub use flate::FlateDecoder;
pub use lzw::LzwDecoder;
pub use predictor::{decode_predictor, DecodeParams};
pub use runlength::RunLengthDecoder;

/// Supported PDF stream filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// ASCIIHexDecode (hexadecimal encoding)
    ASCIIHexDecode,
    /// ASCII85Decode (base-85 encoding)
    ASCII85Decode,
    /// LZWDecode (Lempel-Ziv-Welch compression)
    LZWDecode,
    /// FlateDecode (deflate/zlib compression)
    FlateDecode,
    /// RunLengthDecode (run-length encoding)
    RunLengthDecode,
}

impl Filter {
    /// Map a `/Filter` name, including the inline-image abbreviations.
    pub fn from_name(name: &str) -> FilterResult<Self> {
        match name {
            "ASCIIHexDecode" | "AHx" => Ok(Filter::ASCIIHexDecode),
            "ASCII85Decode" | "A85" => Ok(Filter::ASCII85Decode),
            "LZWDecode" | "LZW" => Ok(Filter::LZWDecode),
            "FlateDecode" | "Fl" => Ok(Filter::FlateDecode),
            "RunLengthDecode" | "RL" => Ok(Filter::RunLengthDecode),
            other => Err(FilterError::UnsupportedFilter(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Filter::ASCIIHexDecode => "ASCIIHexDecode",
            Filter::ASCII85Decode => "ASCII85Decode",
            Filter::LZWDecode => "LZWDecode",
            Filter::FlateDecode => "FlateDecode",
            Filter::RunLengthDecode => "RunLengthDecode",
        }
    }

    /// Whether `/Predictor` applies to this filter's output.
    pub fn uses_predictor(&self) -> bool {
        matches!(self, Filter::LZWDecode | Filter::FlateDecode)
    }

    fn decoder(&self, params: &DecodeParams) -> Box<dyn StreamDecoder> {
        match self {
            Filter::ASCIIHexDecode => Box::new(AsciiHexDecoder),
            Filter::ASCII85Decode => Box::new(Ascii85Decoder),
            Filter::LZWDecode => Box::new(LzwDecoder::new(params.early_change)),
            Filter::FlateDecode => Box::new(FlateDecoder),
            Filter::RunLengthDecode => Box::new(RunLengthDecoder),
        }
    }
}

/// True for filters whose output is an image codec rather than bytes.
///
/// Lets callers tell "this is a JPEG" apart from "this stream is corrupt"
/// when [`decode`] reports [`FilterError::UnsupportedFilter`].
pub fn is_image_filter(name: &str) -> bool {
    matches!(
        name,
        "DCTDecode" | "DCT" | "JPXDecode" | "JBIG2Decode" | "CCITTFaxDecode" | "CCF"
    )
}

/// Trait for PDF stream decoders.
///
/// Each decoder implements a specific PDF filter algorithm and can decode
/// compressed or encoded stream data.
pub trait StreamDecoder {
    /// Decode the input data.
    fn decode(&self, input: &[u8]) -> FilterResult<Vec<u8>>;

    /// Get the name of this decoder (e.g., "FlateDecode").
    fn name(&self) -> &str;
}

/// Decode data with a single filter, then reverse its predictor if any.
///
/// # Examples
///
/// ```
/// use pdf_objects::decoders::{decode, DecodeParams};
///
/// let decoded = decode(b"48656C6C6F>", "ASCIIHexDecode", &DecodeParams::default()).unwrap();
/// assert_eq!(decoded, b"Hello");
/// ```
pub fn decode(data: &[u8], filter_name: &str, params: &DecodeParams) -> FilterResult<Vec<u8>> {
    let filter = Filter::from_name(filter_name)?;
    let decoder = filter.decoder(params);
    let decoded = decoder.decode(data)?;
    log::trace!("{}: {} -> {} bytes", decoder.name(), data.len(), decoded.len());

    if filter.uses_predictor() && params.predictor > 1 {
        decode_predictor(&decoded, params)
    } else {
        Ok(decoded)
    }
}

/// Apply a filter chain in order, enforcing the decompression limits.
///
/// # Security
///
/// After each filter the output is checked against
/// `options.max_decompressed_size` and, relative to the encoded input,
/// `options.max_decompression_ratio`. A zero limit disables that check.
pub fn decode_pipeline(
    data: &[u8],
    filters: &[(String, DecodeParams)],
    options: &ParserOptions,
) -> FilterResult<Vec<u8>> {
    let compressed_size = data.len();
    let mut current = data.to_vec();

    for (name, params) in filters {
        current = decode(&current, name, params).map_err(|e| {
            if is_image_filter(name) {
                log::debug!("{} is an image codec, leaving the stream encoded", name);
            }
            e
        })?;

        let max_size = options.max_decompressed_size;
        if max_size > 0 && current.len() > max_size {
            return Err(FilterError::LimitExceeded {
                size: current.len(),
                limit: format!("{} bytes", max_size),
            });
        }

        let max_ratio = options.max_decompression_ratio;
        if max_ratio > 0 {
            let ratio = current.len() as u64 / compressed_size.max(1) as u64;
            if ratio > u64::from(max_ratio) {
                return Err(FilterError::LimitExceeded {
                    size: current.len(),
                    limit: format!("ratio {}:1 from {} encoded bytes", max_ratio, compressed_size),
                });
            }
        }
    }

    Ok(current)
}
