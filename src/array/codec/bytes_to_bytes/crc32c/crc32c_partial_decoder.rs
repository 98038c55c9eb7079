use crate::{
    array::codec::{BytesPartialDecoderTraits, CodecError},
    byte_range::ByteRange,
};

use super::CHECKSUM_SIZE;

/// The partial decoder for the `crc32c` codec.
///
/// Reads the requested regions directly from the input, skipping the trailing checksum.
/// The checksum is not verified.
pub struct Crc32cPartialDecoder<'a> {
    input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
}

impl<'a> Crc32cPartialDecoder<'a> {
    /// Create a new partial decoder for the `crc32c` codec.
    pub fn new(input_handle: Box<dyn BytesPartialDecoderTraits + 'a>) -> Self {
        Self { input_handle }
    }
}

impl BytesPartialDecoderTraits for Crc32cPartialDecoder<'_> {
    fn partial_decode(
        &self,
        decoded_regions: &[ByteRange],
    ) -> Result<Option<Vec<Vec<u8>>>, CodecError> {
        const CHECKSUM_SIZE_U64: u64 = CHECKSUM_SIZE as u64;
        let encoded_regions: Vec<ByteRange> = decoded_regions
            .iter()
            .map(|byte_range| match byte_range {
                ByteRange::FromStart(..) => *byte_range,
                ByteRange::FromEnd(offset, length) => {
                    ByteRange::FromEnd(offset + CHECKSUM_SIZE_U64, *length)
                }
            })
            .collect();
        let Some(mut bytes) = self.input_handle.partial_decode(&encoded_regions)? else {
            return Ok(None);
        };

        // Drop the trailing checksum
        for (bytes, byte_range) in bytes.iter_mut().zip(decoded_regions) {
            if let ByteRange::FromStart(_, None) = byte_range {
                if bytes.len() < CHECKSUM_SIZE {
                    return Err(CodecError::CorruptData(
                        "crc32c: missing checksum".to_string(),
                    ));
                }
                bytes.truncate(bytes.len() - CHECKSUM_SIZE);
            }
        }

        Ok(Some(bytes))
    }
}
