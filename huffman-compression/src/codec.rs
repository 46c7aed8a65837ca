//! The compressed file layout:
//!
//! ```text
//! <symbol><code>\n     one line per symbol, the newline symbol first
//! \n                   end of the table
//! <file name>\n
//! <N>\n                number of packed bytes, decimal
//! <N packed bytes>
//! <leftover bits>      ASCII '0'/'1', at most 7
//! ```

use std::io::{BufRead, Read, Write};

use bit_vec::BitVec;
use itertools::Itertools;
use log::trace;

use crate::{
    bits::PackedBits,
    code_table::{Code, CodeTable},
    error::{HuffmanError, Result},
    frequency::is_supported_symbol,
};

const LINE_END: u8 = b'\n';

/// Everything one compressed file holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    table: CodeTable,
    file_name: String,
    packed: PackedBits,
}

impl Payload {
    pub fn new(
        table: CodeTable,
        file_name: impl Into<String>,
        packed: PackedBits,
    ) -> Result<Self> {
        let file_name = file_name.into();
        if file_name.contains(char::from(LINE_END)) {
            return Err(HuffmanError::InvalidFileName(file_name));
        }
        Ok(Self {
            table,
            file_name,
            packed,
        })
    }

    pub fn table(&self) -> &CodeTable {
        &self.table
    }

    /// Name of the file that was compressed.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn packed(&self) -> &PackedBits {
        &self.packed
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_header(writer, &self.table)?;

        writeln!(writer, "{}", self.file_name)?;
        writeln!(writer, "{}", self.packed.bytes().len())?;
        writer.write_all(self.packed.bytes())?;

        let leftover = self
            .packed
            .leftover()
            .iter()
            .map(|bit| if bit { b'1' } else { b'0' })
            .collect_vec();
        writer.write_all(&leftover)?;

        Ok(())
    }

    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self> {
        let mut reader = FrameReader::new(reader);

        let table = read_header(&mut reader)?;

        let file_name = reader.read_line("the file name")?;
        let file_name = String::from_utf8(file_name)
            .map_err(|_| HuffmanError::malformed("the file name is not valid UTF-8"))?;

        let count = reader.read_line("the packed byte count")?;
        let count = std::str::from_utf8(&count)
            .ok()
            .filter(|count| !count.is_empty() && count.bytes().all(|ch| ch.is_ascii_digit()))
            .and_then(|count| count.parse::<usize>().ok())
            .ok_or_else(|| {
                HuffmanError::malformed(format!(
                    "packed byte count {:?} is not a number",
                    String::from_utf8_lossy(&count)
                ))
            })?;

        let bytes = reader.read_exact(count)?;
        let leftover = reader
            .read_to_end()?
            .into_iter()
            .map(|ch| match ch {
                b'0' => Ok(false),
                b'1' => Ok(true),
                ch => Err(HuffmanError::malformed(format!(
                    "leftover bits hold the byte {ch:#04x}"
                ))),
            })
            .collect::<Result<BitVec>>()?;

        let packed = PackedBits::new(bytes, leftover)?;
        trace!(
            "read {} codes, file name {file_name:?} and {} bits",
            table.len(),
            packed.bit_count()
        );
        Self::new(table, file_name, packed)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self> {
        Self::read_from(&mut bytes)
    }
}

fn write_header<W: Write>(writer: &mut W, table: &CodeTable) -> Result<()> {
    // A line starting with the newline symbol is only told apart from the
    // end of the table when it comes first.
    let entries = table
        .iter()
        .sorted_by_key(|&(symbol, _)| symbol != LINE_END);

    for (symbol, code) in entries {
        writer.write_all(&[symbol])?;
        writeln!(writer, "{code}")?;
    }

    writer.write_all(&[LINE_END])?;
    Ok(())
}

fn read_header<R: BufRead>(reader: &mut FrameReader<'_, R>) -> Result<CodeTable> {
    let mut entries = Vec::new();

    loop {
        let offset = reader.offset;
        let mut line = reader.read_line("the code table")?;

        if line.is_empty() {
            let is_newline_entry =
                entries.is_empty() && matches!(reader.peek()?, Some(b'0' | b'1'));
            if !is_newline_entry {
                break;
            }
            line.push(LINE_END);
            line.extend(reader.read_line("the code table")?);
        }

        let symbol = line[0];
        if !is_supported_symbol(symbol) {
            return Err(HuffmanError::UnsupportedSymbol { symbol, offset });
        }
        let code = Code::parse(&line[1..]).ok_or_else(|| {
            HuffmanError::malformed(format!(
                "the code for symbol {symbol:#04x} at offset {offset} is not made of 0 and 1"
            ))
        })?;
        entries.push((symbol, code));
    }

    CodeTable::from_entries(entries)
}

/// Byte-counting wrapper over the input.
struct FrameReader<'a, R> {
    inner: &'a mut R,
    offset: usize,
}

impl<'a, R: BufRead> FrameReader<'a, R> {
    fn new(inner: &'a mut R) -> Self {
        Self { inner, offset: 0 }
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        Ok(self.inner.fill_buf()?.first().copied())
    }

    /// Reads up to the next line terminator, which is consumed but not returned.
    fn read_line(&mut self, what: &str) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        let read = self.inner.read_until(LINE_END, &mut line)?;
        self.offset += read;

        if line.pop() != Some(LINE_END) {
            return Err(HuffmanError::malformed(format!("stream ends inside {what}")));
        }
        Ok(line)
    }

    fn read_exact(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let read = self.inner.by_ref().take(count as u64).read_to_end(&mut bytes)?;
        self.offset += read;

        if read != count {
            return Err(HuffmanError::malformed(format!(
                "expected {count} packed bytes but the stream holds {read}"
            )));
        }
        Ok(bytes)
    }

    fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.offset += self.inner.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use bit_vec::BitVec;
    use rstest::rstest;

    use super::Payload;
    use crate::{
        bits::PackedBits,
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

    fn sample() -> Payload {
        let table = table(&[(b'a', "0"), (b'b', "11"), (b'c', "10")]);
        let leftover = [false].into_iter().collect::<BitVec>();
        let packed = PackedBits::new(vec![0b0001_1111], leftover).unwrap();
        Payload::new(table, "notes.txt", packed).unwrap()
    }

    #[test]
    fn test_layout() {
        let bytes = sample().to_bytes().unwrap();

        let mut expected = b"a0\nb11\nc10\n\nnotes.txt\n1\n".to_vec();
        expected.push(0b0001_1111);
        expected.push(b'0');
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_read_back() {
        let payload = sample();
        let bytes = payload.to_bytes().unwrap();
        assert_eq!(Payload::from_bytes(&bytes).unwrap(), payload);
    }

    #[test]
    fn test_newline_symbol_goes_first() {
        let table = table(&[(b'\t', "00"), (b'\n', "01"), (b'x', "1")]);
        let packed = PackedBits::new(vec![0x0a, 0x0a], BitVec::new()).unwrap();
        let payload = Payload::new(table, "0.txt", packed).unwrap();

        let bytes = payload.to_bytes().unwrap();
        assert!(bytes.starts_with(b"\n01\n\t00\nx1\n\n0.txt\n2\n"));
        assert_eq!(Payload::from_bytes(&bytes).unwrap(), payload);
    }

    #[test]
    fn test_file_name_on_one_line() {
        let packed = PackedBits::new(vec![], BitVec::new()).unwrap();
        let result = Payload::new(table(&[(b'a', "0")]), "two\nlines", packed);
        assert!(matches!(result, Err(HuffmanError::InvalidFileName(_))));
    }

    #[rstest]
    #[case::missing_table_end(b"a0\nb1\n".as_slice())]
    #[case::empty_table(b"\nname\n0\n".as_slice())]
    #[case::bad_code(b"a0\nb12\n\nname\n0\n".as_slice())]
    #[case::prefix_clash(b"a0\nb01\n\nname\n0\n".as_slice())]
    #[case::missing_file_name(b"a0\nb1\n\nname".as_slice())]
    #[case::missing_count(b"a0\nb1\n\nname\n".as_slice())]
    #[case::count_not_a_number(b"a0\nb1\n\nname\nten\n".as_slice())]
    #[case::signed_count(b"a0\nb1\n\nname\n+1\n\x01".as_slice())]
    #[case::short_payload(b"a0\nb1\n\nname\n3\n\x01\x02".as_slice())]
    #[case::leftover_not_bits(b"a0\nb1\n\nname\n0\n01x".as_slice())]
    #[case::leftover_too_long(b"a0\nb1\n\nname\n0\n01010101".as_slice())]
    fn test_malformed(#[case] input: &[u8]) {
        let result = Payload::from_bytes(input);
        assert!(
            matches!(result, Err(HuffmanError::MalformedStream(_))),
            "{result:?}"
        );
    }

    #[test]
    fn test_sentinel_symbol_in_table() {
        let result = Payload::from_bytes(b"a0\n\x001\n\nname\n0\n");
        assert!(matches!(
            result,
            Err(HuffmanError::UnsupportedSymbol {
                symbol: 0,
                offset: 3
            })
        ));
    }
}
