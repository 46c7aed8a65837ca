use std::{collections::BTreeMap, fmt};

use bit_vec::BitVec;
use itertools::Itertools;
use log::debug;

use crate::{
    error::{HuffmanError, Result},
    frequency::{is_supported_symbol, FrequencyTable},
    tree::{HuffmanNode, HuffmanTree, Side},
};

/// The bits identifying one symbol, first bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code(BitVec);

impl Code {
    /// Parses the ASCII `0`/`1` form used in the table section.
    pub fn parse(text: &[u8]) -> Option<Self> {
        text.iter()
            .map(|&ch| match ch {
                b'0' => Some(false),
                b'1' => Some(true),
                _ => None,
            })
            .collect::<Option<BitVec>>()
            .map(Code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter()
    }

    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len() <= other.len() && self.bits().zip(other.bits()).all(|(a, b)| a == b)
    }
}

impl FromIterator<bool> for Code {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Code(iter.into_iter().collect())
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.bits()
            .try_for_each(|bit| f.write_str(if bit { "1" } else { "0" }))
    }
}

/// Symbol to code mapping, in ascending symbol order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable(BTreeMap<u8, Code>);

impl CodeTable {
    /// Derives every code in a single depth-first walk.
    ///
    /// A tree made of a single leaf gets the code `0`, since an empty code
    /// could not be told apart in the bit stream.
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        let mut codes = BTreeMap::new();
        match tree.root() {
            HuffmanNode::Leaf { symbol, .. } => {
                codes.insert(*symbol, Code::from_iter([Side::Zero.bit()]));
            }
            root => {
                let mut current_code = BitVec::new();
                generate_codes(root, &mut current_code, &mut codes);
            }
        }

        debug!("generated {} codes", codes.len());
        Self(codes)
    }

    /// Rebuilds a table read back from a compressed stream.
    pub fn from_entries(entries: impl IntoIterator<Item = (u8, Code)>) -> Result<Self> {
        let mut codes = BTreeMap::new();
        for (symbol, code) in entries {
            if !is_supported_symbol(symbol) {
                return Err(HuffmanError::malformed(format!(
                    "symbol {symbol:#04x} is outside the alphabet"
                )));
            }
            if code.is_empty() {
                return Err(HuffmanError::malformed(format!(
                    "symbol {symbol:#04x} has an empty code"
                )));
            }
            if codes.insert(symbol, code).is_some() {
                return Err(HuffmanError::malformed(format!(
                    "symbol {symbol:#04x} appears twice in the table"
                )));
            }
        }

        let table = Self(codes);
        if table.is_empty() {
            return Err(HuffmanError::malformed("the code table is empty"));
        }
        if !table.is_prefix_free() {
            return Err(HuffmanError::malformed("the code table is not prefix-free"));
        }
        Ok(table)
    }

    pub fn get(&self, symbol: u8) -> Option<&Code> {
        self.0.get(&symbol)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &Code)> + '_ {
        self.0.iter().map(|(&symbol, code)| (symbol, code))
    }

    pub fn longest_code(&self) -> usize {
        self.0.values().map(Code::len).max().unwrap_or_default()
    }

    /// In lexicographic order a code and any code it prefixes are separated
    /// only by codes sharing that prefix, so checking neighbours is enough.
    pub fn is_prefix_free(&self) -> bool {
        self.0
            .values()
            .sorted_by_key(|code| code.to_string())
            .tuple_windows()
            .all(|(shorter, longer)| !shorter.is_prefix_of(longer))
    }

    /// Number of bits needed to encode an input with these frequencies.
    pub fn encoded_bit_count(&self, frequencies: &FrequencyTable) -> usize {
        frequencies
            .iter()
            .map(|(symbol, count)| count * self.get(symbol).map(Code::len).unwrap_or_default())
            .sum()
    }
}

fn generate_codes(
    node: &HuffmanNode,
    current_code: &mut BitVec,
    result: &mut BTreeMap<u8, Code>,
) {
    match node {
        HuffmanNode::Leaf { symbol, .. } => {
            result.insert(*symbol, Code(current_code.clone()));
        }
        HuffmanNode::Internal { left, right, .. } => {
            current_code.push(Side::Zero.bit());
            generate_codes(left, current_code, result);
            current_code.pop();

            current_code.push(Side::One.bit());
            generate_codes(right, current_code, result);
            current_code.pop();
        }
    }
}
