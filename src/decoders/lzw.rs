//! LZWDecode implementation.
//!
//! Variable-width (9 to 12 bit) MSB-first LZW as used by PDF and TIFF.
//! Code 256 clears the table, code 257 ends the data. With `EarlyChange`
//! set (the default) the code width grows one code before the table
//! actually needs the extra bit.

use crate::bits::BitCursor;
use crate::decoders::StreamDecoder;
use crate::error::{FilterError, FilterResult};

const CLEAR_CODE: usize = 256;
const EOD_CODE: usize = 257;
const FIRST_CODE: usize = 258;
const MAX_TABLE_SIZE: usize = 4096;
const MIN_CODE_BITS: u32 = 9;
const MAX_CODE_BITS: u32 = 12;

/// LZWDecode filter implementation.
#[derive(Debug, Clone, Copy)]
pub struct LzwDecoder {
    early_change: bool,
}

impl LzwDecoder {
    pub fn new(early_change: bool) -> Self {
        Self { early_change }
    }
}

impl Default for LzwDecoder {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Table of strings, indexed by code. 256 and 257 are placeholders.
fn initial_table() -> Vec<Vec<u8>> {
    let mut table: Vec<Vec<u8>> = (0..=255u8).map(|b| vec![b]).collect();
    table.push(Vec::new());
    table.push(Vec::new());
    table
}

impl StreamDecoder for LzwDecoder {
    fn decode(&self, input: &[u8]) -> FilterResult<Vec<u8>> {
        let early = usize::from(self.early_change);
        let mut cursor = BitCursor::new(input);
        let mut table = initial_table();
        let mut code_bits = MIN_CODE_BITS;
        let mut prev: Option<usize> = None;
        let mut output = Vec::new();

        loop {
            if cursor.remaining() < u64::from(code_bits) {
                log::debug!("LZWDecode: data ended without EOD after {} bytes", output.len());
                break;
            }
            let code = cursor
                .read(code_bits)
                .map_err(|e| FilterError::DecodeFailure(format!("LZWDecode: {}", e)))?
                as usize;

            match code {
                CLEAR_CODE => {
                    table.truncate(FIRST_CODE);
                    code_bits = MIN_CODE_BITS;
                    prev = None;
                    continue;
                },
                EOD_CODE => break,
                _ => {},
            }

            let entry = match prev {
                None if code < CLEAR_CODE => table[code].clone(),
                Some(_) if code < table.len() => table[code].clone(),
                // KwKwK: the code being defined by this very step
                Some(p) if code == table.len() => {
                    let mut entry = table[p].clone();
                    entry.push(table[p][0]);
                    entry
                },
                _ => {
                    return Err(FilterError::DecodeFailure(format!(
                        "LZWDecode: invalid code {} (table size {}, {} bits)",
                        code,
                        table.len(),
                        code_bits
                    )));
                },
            };

            if let Some(p) = prev {
                if table.len() < MAX_TABLE_SIZE {
                    let mut new_entry = table[p].clone();
                    new_entry.push(entry[0]);
                    table.push(new_entry);
                }
            }

            output.extend_from_slice(&entry);
            prev = Some(code);

            if code_bits < MAX_CODE_BITS && table.len() + early >= (1 << code_bits) {
                code_bits += 1;
            }
        }

        Ok(output)
    }

    fn name(&self) -> &str {
        "LZWDecode"
    }
}
