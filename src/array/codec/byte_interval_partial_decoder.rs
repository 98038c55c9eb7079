use crate::byte_range::{ByteLength, ByteOffset, ByteRange, InvalidByteRangeError};

use super::{BytesPartialDecoderTraits, CodecError};

/// A partial decoder for a byte interval of a [`BytesPartialDecoderTraits`] partial decoder.
///
/// Byte ranges requested from this decoder are relative to the interval, not the underlying input.
/// This is how an inner chunk is read from a shard without reading the rest of the shard.
pub struct ByteIntervalPartialDecoder<'a> {
    inner: &'a dyn BytesPartialDecoderTraits,
    byte_offset: ByteOffset,
    byte_length: ByteLength,
}

impl<'a> ByteIntervalPartialDecoder<'a> {
    /// Create a new byte interval partial decoder.
    pub fn new(
        inner: &'a dyn BytesPartialDecoderTraits,
        byte_offset: ByteOffset,
        byte_length: ByteLength,
    ) -> Self {
        Self {
            inner,
            byte_offset,
            byte_length,
        }
    }

    fn to_inner_byte_range(&self, byte_range: &ByteRange) -> ByteRange {
        let start = self.byte_offset + byte_range.start(self.byte_length);
        let length = byte_range.length(self.byte_length);
        ByteRange::FromStart(start, Some(length))
    }
}

impl BytesPartialDecoderTraits for ByteIntervalPartialDecoder<'_> {
    fn partial_decode(
        &self,
        byte_ranges: &[ByteRange],
    ) -> Result<Option<Vec<Vec<u8>>>, CodecError> {
        for byte_range in byte_ranges {
            if !byte_range.is_within(self.byte_length) {
                return Err(InvalidByteRangeError::new(*byte_range, self.byte_length).into());
            }
        }
        let byte_ranges: Vec<ByteRange> = byte_ranges
            .iter()
            .map(|byte_range| self.to_inner_byte_range(byte_range))
            .collect();
        self.inner.partial_decode(&byte_ranges)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn byte_interval_partial_decoder() {
        let bytes: Vec<u8> = (0..20).collect();
        let inner = Cursor::new(bytes);
        let decoder = ByteIntervalPartialDecoder::new(&inner, 5, 10);
        assert_eq!(decoder.decode().unwrap().unwrap(), (5..15).collect::<Vec<u8>>());
        let decoded = decoder
            .partial_decode(&[
                ByteRange::FromStart(1, Some(2)),
                ByteRange::FromEnd(0, Some(3)),
                ByteRange::FromStart(8, None),
            ])
            .unwrap()
            .unwrap();
        assert_eq!(decoded, vec![vec![6, 7], vec![12, 13, 14], vec![13, 14]]);
        assert!(decoder
            .partial_decode(&[ByteRange::FromStart(9, Some(2))])
            .is_err());
    }
}
