use std::{collections::TryReserveError, io};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HuffmanError>;

/// Errors returned by a single compression or decompression run.
#[derive(Debug, Error)]
pub enum HuffmanError {
    /// The input holds no symbols, so there is no tree to build.
    #[error("input is empty")]
    EmptyInput,
    /// A node, table or buffer could not be allocated.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
    /// The compressed stream does not follow the exchange format.
    #[error("malformed stream: {0}")]
    MalformedStream(String),
    /// A byte outside the supported alphabet, or the reserved zero byte.
    #[error("unsupported symbol {symbol:#04x} at offset {offset}")]
    UnsupportedSymbol { symbol: u8, offset: usize },
    /// File names are stored on a single line.
    #[error("file name {0:?} contains a line terminator")]
    InvalidFileName(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HuffmanError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        HuffmanError::MalformedStream(message.into())
    }
}
