use log::debug;

use crate::{
    bits::PackedBits,
    cancel::CancellationToken,
    code_table::CodeTable,
    error::{HuffmanError, Result},
};

const ROOT: usize = 0;

#[derive(Debug, Default, Clone, Copy)]
struct TrieNode {
    symbol: Option<u8>,
    children: [Option<usize>; 2],
}

/// Binary trie over the codes of a table, built once per decompression.
#[derive(Debug)]
pub struct Decoder {
    nodes: Vec<TrieNode>,
    longest_code: usize,
}

impl Decoder {
    pub fn new(table: &CodeTable) -> Self {
        let mut nodes = vec![TrieNode::default()];
        for (symbol, code) in table.iter() {
            let mut current = ROOT;
            for bit in code.bits() {
                let bit = usize::from(bit);
                current = match nodes[current].children[bit] {
                    Some(child) => child,
                    None => {
                        nodes.push(TrieNode::default());
                        let child = nodes.len() - 1;
                        nodes[current].children[bit] = Some(child);
                        child
                    }
                };
            }
            nodes[current].symbol = Some(symbol);
        }

        Self {
            nodes,
            longest_code: table.longest_code(),
        }
    }

    /// Walks the trie bit by bit, emitting a symbol at every leaf.
    ///
    /// The stream has to end exactly on a code boundary, otherwise it was
    /// truncated or corrupted.
    pub fn decode(&self, packed: &PackedBits, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        output.try_reserve(packed.bit_count() / self.longest_code.max(1))?;

        let mut current = ROOT;
        let mut candidate_bits = 0;
        for (position, bit) in packed.bits().enumerate() {
            let next = self.nodes[current].children[usize::from(bit)].ok_or_else(|| {
                HuffmanError::malformed(format!("bit {position} does not continue any code"))
            })?;

            match self.nodes[next].symbol {
                Some(symbol) => {
                    cancel.check()?;
                    output.try_reserve(1)?;
                    output.push(symbol);
                    current = ROOT;
                    candidate_bits = 0;
                }
                None => {
                    current = next;
                    candidate_bits += 1;
                }
            }
        }

        if candidate_bits > 0 {
            return Err(HuffmanError::malformed(format!(
                "stream ends with {candidate_bits} bits that do not form a code"
            )));
        }

        debug!(
            "decoded {} symbols from {} bits",
            output.len(),
            packed.bit_count()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use bit_vec::BitVec;
    use rstest::rstest;

    use super::Decoder;
    use crate::{
        bits::PackedBits,
        cancel::CancellationToken,
        code_table::{Code, CodeTable},
        error::HuffmanError,
    };

    fn table(entries: &[(u8, &str)]) -> CodeTable {
        CodeTable::from_entries(
            entries
                .iter()
                .map(|&(symbol, text)| (symbol, Code::parse(text.as_bytes()).unwrap())),
        )
        .unwrap()
    }

    fn packed(text: &str) -> PackedBits {
        let bits = Code::parse(text.as_bytes())
            .unwrap()
            .bits()
            .collect::<BitVec>();
        PackedBits::from_bits(&bits)
    }

    #[rstest]
    #[case("000111110", b"aaabbc")]
    #[case("1011", b"cb")]
    #[case("", b"")]
    #[case("0000000000", b"aaaaaaaaaa")]
    fn test_decode(#[case] bits: &str, #[case] expected: &[u8]) {
        let decoder = Decoder::new(&table(&[(b'a', "0"), (b'b', "11"), (b'c', "10")]));
        let decoded = decoder
            .decode(&packed(bits), &CancellationToken::new())
            .unwrap();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_truncated_code() {
        let decoder = Decoder::new(&table(&[(b'a', "0"), (b'b', "11"), (b'c', "10")]));
        // "aaabbc" with the last bit of c cut off
        let result = decoder.decode(&packed("00011111"), &CancellationToken::new());
        assert!(matches!(result, Err(HuffmanError::MalformedStream(_))));
    }

    #[test]
    fn test_bits_outside_the_table() {
        // a single-symbol table only knows the code 0
        let decoder = Decoder::new(&table(&[(b'z', "0")]));
        let result = decoder.decode(&packed("001"), &CancellationToken::new());
        assert!(matches!(result, Err(HuffmanError::MalformedStream(_))));
    }

    #[test]
    fn test_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let decoder = Decoder::new(&table(&[(b'a', "0"), (b'b', "1")]));
        let result = decoder.decode(&packed("0101"), &cancel);
        assert!(matches!(result, Err(HuffmanError::Cancelled)));
    }
}
