use std::collections::BTreeMap;

use itertools::Itertools;
use log::debug;

use crate::{
    cancel::CancellationToken,
    error::{HuffmanError, Result},
};

/// Number of entries in the byte alphabet.
pub const ALPHABET_SIZE: u8 = 128;

/// Byte value reserved as the table's empty-slot marker.
pub const SENTINEL: u8 = 0;

pub fn is_supported_symbol(byte: u8) -> bool {
    byte != SENTINEL && byte < ALPHABET_SIZE
}

/// Occurrence count of every symbol seen in the input, in ascending symbol order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable(BTreeMap<u8, usize>);

impl FrequencyTable {
    pub fn count(input: &[u8], cancel: &CancellationToken) -> Result<Self> {
        if input.is_empty() {
            return Err(HuffmanError::EmptyInput);
        }

        if let Some((offset, &symbol)) = input
            .iter()
            .find_position(|&&byte| !is_supported_symbol(byte))
        {
            return Err(HuffmanError::UnsupportedSymbol { symbol, offset });
        }

        let checked = input
            .iter()
            .map(|&symbol| cancel.check().map(|()| (symbol, 1)));
        let table = itertools::process_results(checked, |counts| counts.collect::<Self>())?;

        debug!(
            "counted {} distinct symbols over {} bytes",
            table.len(),
            input.len()
        );
        Ok(table)
    }

    pub fn get(&self, symbol: u8) -> usize {
        self.0.get(&symbol).copied().unwrap_or_default()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts, which is the input length.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.0.iter().map(|(&symbol, &count)| (symbol, count))
    }
}

impl FromIterator<(u8, usize)> for FrequencyTable {
    /// Builds a table from precomputed counts; zero counts are dropped.
    fn from_iter<T: IntoIterator<Item = (u8, usize)>>(iter: T) -> Self {
        let counts = iter
            .into_iter()
            .filter(|&(_, count)| count > 0)
            .into_grouping_map()
            .sum();
        Self(counts.into_iter().collect())
    }
}
