use crate::{
    array::BytesRepresentation,
    byte_range::{extract_byte_ranges, ByteRange},
};

use super::{BytesPartialDecoderTraits, BytesToBytesCodecTraits, CodecError};

/// The default bytes-to-bytes partial decoder. Decodes the entire input and extracts the desired regions.
pub struct BytesToBytesPartialDecoderDefault<'a> {
    input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
    decoded_representation: BytesRepresentation,
    codec: &'a dyn BytesToBytesCodecTraits,
}

impl<'a> BytesToBytesPartialDecoderDefault<'a> {
    /// Create a new [`BytesToBytesPartialDecoderDefault`].
    #[must_use]
    pub fn new(
        input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
        decoded_representation: BytesRepresentation,
        codec: &'a dyn BytesToBytesCodecTraits,
    ) -> Self {
        Self {
            input_handle,
            decoded_representation,
            codec,
        }
    }
}

impl BytesPartialDecoderTraits for BytesToBytesPartialDecoderDefault<'_> {
    fn partial_decode(
        &self,
        decoded_regions: &[ByteRange],
    ) -> Result<Option<Vec<Vec<u8>>>, CodecError> {
        let Some(encoded_value) = self.input_handle.decode()? else {
            return Ok(None);
        };
        let decoded_value = self
            .codec
            .decode(encoded_value, &self.decoded_representation)?;
        Ok(Some(extract_byte_ranges(&decoded_value, decoded_regions)?))
    }
}
