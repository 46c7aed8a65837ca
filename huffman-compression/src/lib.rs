//! Static Huffman compression over the 7-bit byte alphabet.
//!
//! Compression counts symbol frequencies, builds the Huffman tree, derives one
//! code per symbol and packs the codes of the whole input into bytes. The code
//! table travels with the packed bits in a [`Payload`], which is all the
//! decompressor needs.
//!
//! ```
//! use huffman_compression::{compress, decompress, Payload};
//!
//! let payload = compress(b"aaabbc", "notes.txt")?;
//! let bytes = payload.to_bytes()?;
//!
//! let payload = Payload::from_bytes(&bytes)?;
//! assert_eq!(payload.file_name(), "notes.txt");
//! assert_eq!(decompress(&payload)?, b"aaabbc");
//! # Ok::<(), huffman_compression::HuffmanError>(())
//! ```

pub mod bits;
pub mod cancel;
pub mod code_table;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod frequency;
pub mod stats;
pub mod tree;

use log::debug;

pub use bits::PackedBits;
pub use cancel::CancellationToken;
pub use code_table::{Code, CodeTable};
pub use codec::Payload;
pub use decoder::Decoder;
pub use error::{HuffmanError, Result};
pub use frequency::FrequencyTable;
pub use stats::CompressionStats;
pub use tree::HuffmanTree;

pub fn compress(input: &[u8], file_name: impl Into<String>) -> Result<Payload> {
    compress_with_cancellation(input, file_name, &CancellationToken::default())
}

pub fn compress_with_cancellation(
    input: &[u8],
    file_name: impl Into<String>,
    cancel: &CancellationToken,
) -> Result<Payload> {
    let table = {
        let frequencies = FrequencyTable::count(input, cancel)?;
        let tree = HuffmanTree::build(&frequencies, cancel)?;
        CodeTable::from_tree(&tree)
    };
    let packed = PackedBits::pack(input, &table, cancel)?;

    let payload = Payload::new(table, file_name, packed)?;
    debug!(
        "compressed {} bytes of {:?} into {} bits",
        input.len(),
        payload.file_name(),
        payload.packed().bit_count()
    );
    Ok(payload)
}

pub fn decompress(payload: &Payload) -> Result<Vec<u8>> {
    decompress_with_cancellation(payload, &CancellationToken::default())
}

pub fn decompress_with_cancellation(
    payload: &Payload,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    Decoder::new(payload.table()).decode(payload.packed(), cancel)
}
