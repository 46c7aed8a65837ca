use std::fmt;

use crate::codec::Payload;

/// Size of the encoded bit stream relative to the original input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionStats {
    pub original_bytes: usize,
    pub encoded_bits: usize,
}

impl CompressionStats {
    pub fn new(original_bytes: usize, encoded_bits: usize) -> Self {
        Self {
            original_bytes,
            encoded_bits,
        }
    }

    pub fn of(original: &[u8], payload: &Payload) -> Self {
        Self::new(original.len(), payload.packed().bit_count())
    }

    /// Share of the original bits saved by the encoding, in percent.
    /// The table and the other header lines are not counted.
    pub fn space_saving_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        let original_bits = (self.original_bytes * 8) as f64;
        (1.0 - self.encoded_bits as f64 / original_bits) * 100.0
    }
}

impl fmt::Display for CompressionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes encoded in {} bits, {:.2}% smaller",
            self.original_bytes,
            self.encoded_bits,
            self.space_saving_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::CompressionStats;

    #[rstest]
    #[case(6, 9, 81.25)]
    #[case(4, 32, 0.0)]
    #[case(0, 0, 0.0)]
    #[case(1, 16, -100.0)]
    fn test_space_saving(#[case] bytes: usize, #[case] bits: usize, #[case] expected: f64) {
        let stats = CompressionStats::new(bytes, bits);
        assert!((stats.space_saving_percent() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_display() {
        let stats = CompressionStats::new(6, 9);
        assert_eq!(stats.to_string(), "6 bytes encoded in 9 bits, 81.25% smaller");
    }
}
