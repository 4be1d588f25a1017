//! Predictor reversal for Flate and LZW output.
//!
//! PDF streams can use TIFF Predictor 2 or PNG predictors (algorithms 10-15)
//! to improve compression. These predictors encode differences between
//! adjacent samples, which are then reversed during decoding.

use crate::bits::{BitCursor, BitWriter};
use crate::error::{BitRangeError, FilterError, FilterResult};
use crate::object::{Dictionary, Object};

/// Decode parameters (`/DecodeParms`) for one filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeParams {
    /// Predictor algorithm (1 = none, 2 = TIFF, 10-15 = PNG)
    pub predictor: i64,
    /// Number of color components per sample (default 1)
    pub colors: usize,
    /// Bits per component (default 8)
    pub bits_per_component: usize,
    /// Number of samples per row (default 1)
    pub columns: usize,
    /// LZW code width switches one code early (default true)
    pub early_change: bool,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
            early_change: true,
        }
    }
}

fn invalid(msg: String) -> FilterError {
    FilterError::InvalidFilterParameter(msg)
}

fn integer_entry(dict: &Dictionary, key: &str, default: i64) -> FilterResult<i64> {
    match dict.get_object(key) {
        None | Some(Object::Null) => Ok(default),
        Some(Object::Integer(i)) => Ok(*i),
        Some(other) => Err(invalid(format!("/{} is {}, expected Integer", key, other.type_name()))),
    }
}

fn usize_entry(dict: &Dictionary, key: &str, default: usize) -> FilterResult<usize> {
    let value = integer_entry(dict, key, default as i64)?;
    usize::try_from(value).map_err(|_| invalid(format!("/{} {} is negative", key, value)))
}

impl DecodeParams {
    /// Read and validate a `/DecodeParms` dictionary.
    pub fn from_dictionary(dict: &Dictionary) -> FilterResult<Self> {
        let defaults = Self::default();
        let early_change = match integer_entry(dict, "EarlyChange", 1)? {
            0 => false,
            1 => true,
            other => return Err(invalid(format!("/EarlyChange {} (expected 0 or 1)", other))),
        };
        let params = Self {
            predictor: integer_entry(dict, "Predictor", defaults.predictor)?,
            colors: usize_entry(dict, "Colors", defaults.colors)?,
            bits_per_component: usize_entry(dict, "BitsPerComponent", defaults.bits_per_component)?,
            columns: usize_entry(dict, "Columns", defaults.columns)?,
            early_change,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check the ranges the predictor algorithms rely on.
    pub fn validate(&self) -> FilterResult<()> {
        if !matches!(self.predictor, 1 | 2 | 10..=15) {
            return Err(invalid(format!("/Predictor {}", self.predictor)));
        }
        if !(1..=4).contains(&self.colors) {
            return Err(invalid(format!("/Colors {} (expected 1-4)", self.colors)));
        }
        if !matches!(self.bits_per_component, 1 | 2 | 4 | 8 | 16) {
            return Err(invalid(format!(
                "/BitsPerComponent {} (expected 1, 2, 4, 8 or 16)",
                self.bits_per_component
            )));
        }
        if self.columns == 0 {
            return Err(invalid("/Columns 0".to_string()));
        }
        if self.row_bits().is_none() {
            return Err(invalid(format!(
                "/Columns {} overflows the row size",
                self.columns
            )));
        }
        Ok(())
    }

    fn row_bits(&self) -> Option<usize> {
        self.columns
            .checked_mul(self.colors)?
            .checked_mul(self.bits_per_component)
    }

    /// Bytes of sample data per row (without the PNG tag byte).
    ///
    /// Saturates for parameters that [`validate`](Self::validate) rejects.
    pub fn pixel_bytes_per_row(&self) -> usize {
        self.row_bits().unwrap_or(usize::MAX).div_ceil(8)
    }

    /// Bytes per row as stored, including the PNG tag byte.
    pub fn bytes_per_row(&self) -> usize {
        if self.predictor >= 10 {
            self.pixel_bytes_per_row() + 1
        } else {
            self.pixel_bytes_per_row()
        }
    }

    /// Distance in bytes to the corresponding byte of the previous pixel.
    fn bytes_per_pixel(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8).max(1)
    }
}

/// Reverse the predictor named in `params`.
///
/// A short final row is reconstructed as far as its bytes go.
pub fn decode_predictor(data: &[u8], params: &DecodeParams) -> FilterResult<Vec<u8>> {
    params.validate()?;
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => decode_tiff_predictor(data, params),
        _ => decode_png_predictor(data, params),
    }
}

fn bit_error(err: BitRangeError) -> FilterError {
    FilterError::DecodeFailure(format!("TIFF predictor: {}", err))
}

/// Decode TIFF Predictor 2.
///
/// Each component is stored as the difference from the same component of
/// the previous pixel in the row, modulo `2^BitsPerComponent`.
fn decode_tiff_predictor(data: &[u8], params: &DecodeParams) -> FilterResult<Vec<u8>> {
    let row_len = params.pixel_bytes_per_row();
    let colors = params.colors;
    let bpc = params.bits_per_component as u32;
    let mask = (1u32 << bpc) - 1;
    let samples_per_row = params.columns.saturating_mul(colors);

    if data.len() % row_len != 0 {
        log::warn!("TIFF predictor: {} bytes is not a whole number of {}-byte rows", data.len(), row_len);
    }

    let mut output = Vec::with_capacity(data.len());
    for row in data.chunks(row_len) {
        if bpc == 8 {
            let start = output.len();
            for (i, &byte) in row.iter().enumerate() {
                let left = if i >= colors { output[start + i - colors] } else { 0 };
                output.push(byte.wrapping_add(left));
            }
            continue;
        }

        let samples = (row.len() * 8 / bpc as usize).min(samples_per_row);
        let mut cursor = BitCursor::new(row);
        let mut writer = BitWriter::new();
        let mut left = vec![0u32; colors];
        for s in 0..samples {
            let component = s % colors;
            let value = (cursor.read(bpc).map_err(bit_error)? + left[component]) & mask;
            left[component] = value;
            writer.write(value, bpc).map_err(bit_error)?;
        }
        let decoded = writer.into_bytes();
        // Keep any padding bits past the last whole sample
        let kept = decoded.len();
        output.extend_from_slice(&decoded);
        output.extend_from_slice(&row[kept.min(row.len())..]);
    }

    Ok(output)
}

/// Decode PNG predictors (10-15).
///
/// Each row starts with a tag byte selecting None/Sub/Up/Average/Paeth for
/// that row; the `/Predictor` value itself only says "PNG".
fn decode_png_predictor(data: &[u8], params: &DecodeParams) -> FilterResult<Vec<u8>> {
    let bytes_per_row = params.bytes_per_row(); // Includes predictor tag byte
    let pixel_bytes = params.pixel_bytes_per_row();
    let bpp = params.bytes_per_pixel();

    if data.len() % bytes_per_row != 0 {
        log::warn!(
            "PNG predictor: {} bytes is not a whole number of {}-byte rows",
            data.len(),
            bytes_per_row
        );
    }

    // Rows never hold more bytes than the input, whatever /Columns claims
    let mut output: Vec<u8> = Vec::with_capacity(data.len());
    let mut prior = vec![0u8; pixel_bytes.min(data.len())];

    for row_data in data.chunks(bytes_per_row) {
        let tag = row_data[0];
        let encoded = &row_data[1..];
        let mut current = vec![0u8; encoded.len()];

        for (i, &byte) in encoded.iter().enumerate() {
            let left = if i >= bpp { current[i - bpp] } else { 0 };
            let up = prior[i];
            let up_left = if i >= bpp { prior[i - bpp] } else { 0 };

            let predicted = match tag {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth_predictor(left, up, up_left),
                _ => {
                    return Err(FilterError::DecodeFailure(format!("Invalid PNG predictor tag: {}", tag)));
                },
            };
            current[i] = byte.wrapping_add(predicted);
        }

        prior[..current.len()].copy_from_slice(&current);
        output.extend_from_slice(&current);
    }

    Ok(output)
}

/// Paeth predictor function from PNG specification.
///
/// Ties go to left, then up, then upper-left.
fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ParsedObject;

    fn int(value: i64) -> ParsedObject {
        ParsedObject::from(Object::Integer(value))
    }

    fn params(predictor: i64, colors: usize, bpc: usize, columns: usize) -> DecodeParams {
        DecodeParams {
            predictor,
            colors,
            bits_per_component: bpc,
            columns,
            early_change: true,
        }
    }

    #[test]
    fn test_row_sizes() {
        let p = params(12, 3, 8, 10);
        assert_eq!(p.pixel_bytes_per_row(), 30);
        assert_eq!(p.bytes_per_row(), 31);
        assert_eq!(params(2, 1, 1, 10).pixel_bytes_per_row(), 2);
        assert_eq!(params(2, 1, 1, 10).bytes_per_row(), 2);
        assert_eq!(params(11, 1, 4, 3).bytes_per_pixel(), 1);
        assert_eq!(params(11, 2, 16, 3).bytes_per_pixel(), 4);
    }

    #[test]
    fn test_from_dictionary_defaults_and_values() {
        let dict: Dictionary = vec![
            ("Predictor", int(12)),
            ("Columns", int(5)),
            ("EarlyChange", int(0)),
        ]
        .into_iter()
        .collect();
        let p = DecodeParams::from_dictionary(&dict).unwrap();
        assert_eq!(p.predictor, 12);
        assert_eq!(p.columns, 5);
        assert_eq!(p.colors, 1);
        assert_eq!(p.bits_per_component, 8);
        assert!(!p.early_change);
    }

    #[test]
    fn test_invalid_parameters() {
        for (key, value) in [
            ("Colors", 5),
            ("Colors", 0),
            ("BitsPerComponent", 3),
            ("Columns", 0),
            ("Columns", -4),
            ("Predictor", 7),
            ("EarlyChange", 2),
        ] {
            let dict: Dictionary = vec![(key, int(value))].into_iter().collect();
            assert!(
                matches!(DecodeParams::from_dictionary(&dict), Err(FilterError::InvalidFilterParameter(_))),
                "{} {} should be rejected",
                key,
                value
            );
        }
        let dict: Dictionary = vec![("Colors", ParsedObject::from(Object::Name("RGB".to_string())))].into_iter().collect();
        assert!(DecodeParams::from_dictionary(&dict).is_err());
    }

    #[test]
    fn test_columns_overflowing_row_size() {
        let huge = usize::MAX / 4;
        for predictor in [2, 12] {
            let result = decode_predictor(&[1, 2, 3, 4], &params(predictor, 1, 8, huge));
            assert!(matches!(result, Err(FilterError::InvalidFilterParameter(_))));
        }
        assert_eq!(params(2, 1, 8, huge).pixel_bytes_per_row(), usize::MAX.div_ceil(8));

        let dict: Dictionary = vec![("Columns", int(i64::MAX))].into_iter().collect();
        assert!(matches!(
            DecodeParams::from_dictionary(&dict),
            Err(FilterError::InvalidFilterParameter(_))
        ));
    }

    #[test]
    fn test_huge_columns_sized_by_input() {
        let wide = usize::MAX / 64;
        let out = decode_predictor(&[0, 1, 2, 3], &params(12, 1, 8, wide)).unwrap();
        assert_eq!(out, vec![1, 2, 3]);

        let out = decode_predictor(&[1, 2, 3], &params(2, 1, 8, wide)).unwrap();
        assert_eq!(out, vec![1, 3, 6]);
    }

    #[test]
    fn test_no_predictor() {
        assert_eq!(decode_predictor(b"abc", &DecodeParams::default()).unwrap(), b"abc");
    }

    #[test]
    fn test_png_none_and_sub() {
        let data = [0, 1, 2, 3, 1, 1, 1, 1];
        let out = decode_predictor(&data, &params(10, 1, 8, 3)).unwrap();
        assert_eq!(out, vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_png_up() {
        let data = [2, 10, 20, 2, 1, 2, 2, 1, 2];
        let out = decode_predictor(&data, &params(12, 1, 8, 2)).unwrap();
        assert_eq!(out, vec![10, 20, 11, 22, 12, 24]);
    }

    #[test]
    fn test_png_average() {
        // Row 1 (Sub): 10 20 ; Row 2 (Average): left/up
        let data = [1, 10, 10, 3, 5, 5];
        let out = decode_predictor(&data, &params(13, 1, 8, 2)).unwrap();
        // byte0: 5 + (0 + 10)/2 = 10; byte1: 5 + (10 + 20)/2 = 20
        assert_eq!(out, vec![10, 20, 10, 20]);
    }

    #[test]
    fn test_png_paeth_rgb() {
        let data = [0, 1, 2, 3, 4, 5, 6, 4, 0, 0, 0, 0, 0, 0];
        let out = decode_predictor(&data, &params(14, 3, 8, 2)).unwrap();
        // Zero residuals under Paeth reproduce the row above
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_paeth_tie_breaking() {
        assert_eq!(paeth_predictor(5, 5, 5), 5);
        // p = 10 + 20 - 10 = 20 -> pa 10, pb 0, pc 10
        assert_eq!(paeth_predictor(10, 20, 10), 20);
        // p = 3 + 3 - 0 = 6 -> pa 3, pb 3, pc 6: left wins the tie
        assert_eq!(paeth_predictor(3, 3, 0), 3);
        // p = 0 + 10 - 10 = 0 -> pa 0
        assert_eq!(paeth_predictor(0, 10, 10), 0);
    }

    #[test]
    fn test_png_invalid_tag() {
        let result = decode_predictor(&[5, 1, 2], &params(15, 1, 8, 2));
        assert!(matches!(result, Err(FilterError::DecodeFailure(_))));
    }

    #[test]
    fn test_png_partial_last_row() {
        let data = [0, 7, 8, 2, 1];
        let out = decode_predictor(&data, &params(12, 1, 8, 2)).unwrap();
        assert_eq!(out, vec![7, 8, 8]);
    }

    #[test]
    fn test_tiff_8bit_rgb() {
        let data = [10, 20, 30, 1, 2, 3, 1, 2, 3];
        let out = decode_predictor(&data, &params(2, 3, 8, 3)).unwrap();
        assert_eq!(out, vec![10, 20, 30, 11, 22, 33, 12, 24, 36]);
    }

    #[test]
    fn test_tiff_8bit_wraps() {
        let data = [250, 10];
        let out = decode_predictor(&data, &params(2, 1, 8, 2)).unwrap();
        assert_eq!(out, vec![250, 4]);
    }

    #[test]
    fn test_tiff_4bit() {
        // Samples 3, +1, +1, +15 (== -1) -> 3, 4, 5, 4
        let data = [0x31, 0x1F];
        let out = decode_predictor(&data, &params(2, 1, 4, 4)).unwrap();
        assert_eq!(out, vec![0x34, 0x54]);
    }

    #[test]
    fn test_tiff_1bit_per_row_reset() {
        // 3 columns of 1 bit: row bits 1 1 0 -> 1 0 0
        let data = [0b1100_0000, 0b0100_0000];
        let out = decode_predictor(&data, &params(2, 1, 1, 3)).unwrap();
        assert_eq!(out, vec![0b1000_0000, 0b0110_0000]);
    }

    #[test]
    fn test_tiff_16bit_two_colors() {
        // Pixel 1: (0x0100, 0xFFFF); pixel 2 deltas (0x0001, 0x0002)
        let data = [0x01, 0x00, 0xFF, 0xFF, 0x00, 0x01, 0x00, 0x02];
        let out = decode_predictor(&data, &params(2, 2, 16, 2)).unwrap();
        assert_eq!(out, vec![0x01, 0x00, 0xFF, 0xFF, 0x01, 0x01, 0x00, 0x01]);
    }
}
