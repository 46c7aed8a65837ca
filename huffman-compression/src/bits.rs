use bit_vec::BitVec;
use log::debug;

use crate::{
    cancel::CancellationToken,
    code_table::CodeTable,
    error::{HuffmanError, Result},
};

const BITS_PER_BYTE: usize = 8;

/// An encoded bit sequence: whole bytes packed MSB first, plus the trailing
/// bits that did not fill a byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBits {
    bytes: Vec<u8>,
    leftover: BitVec,
}

impl PackedBits {
    pub fn new(bytes: Vec<u8>, leftover: BitVec) -> Result<Self> {
        if leftover.len() >= BITS_PER_BYTE {
            return Err(HuffmanError::malformed(format!(
                "{} leftover bits do not fit in a partial byte",
                leftover.len()
            )));
        }
        Ok(Self { bytes, leftover })
    }

    /// Concatenates the code of every input symbol, in input order.
    pub fn pack(input: &[u8], table: &CodeTable, cancel: &CancellationToken) -> Result<Self> {
        let mut codes = Vec::new();
        codes.try_reserve_exact(input.len())?;
        for (offset, &symbol) in input.iter().enumerate() {
            cancel.check()?;
            let code = table
                .get(symbol)
                .ok_or(HuffmanError::UnsupportedSymbol { symbol, offset })?;
            codes.push(code);
        }

        let bits = codes.iter().flat_map(|code| code.bits()).collect::<BitVec>();
        let packed = Self::from_bits(&bits);

        debug!(
            "packed {} bits into {} bytes and {} leftover bits",
            packed.bit_count(),
            packed.bytes.len(),
            packed.leftover.len()
        );
        Ok(packed)
    }

    /// Splits a plain bit sequence into whole bytes and leftover bits.
    pub fn from_bits(bits: &BitVec) -> Self {
        let whole_bytes = bits.len() / BITS_PER_BYTE;
        let mut bytes = bits.to_bytes();
        bytes.truncate(whole_bytes);
        let leftover = bits.iter().skip(whole_bytes * BITS_PER_BYTE).collect();
        Self { bytes, leftover }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn leftover(&self) -> &BitVec {
        &self.leftover
    }

    pub fn bit_count(&self) -> usize {
        self.bytes.len() * BITS_PER_BYTE + self.leftover.len()
    }

    /// Every bit in order: each byte expanded MSB first, then the leftover bits.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.bytes
            .iter()
            .flat_map(|&byte| (0..BITS_PER_BYTE).rev().map(move |shift| (byte >> shift) & 1 == 1))
            .chain(self.leftover.iter())
    }

    pub fn unpack(&self) -> BitVec {
        self.bits().collect()
    }
}
