use crate::{
    array::{
        codec::{
            ArrayCodecTraits, ArrayPartialDecoderTraits, ArrayToBytesCodecTraits,
            BytesPartialDecoderTraits, CodecError, CodecTraits,
        },
        BytesRepresentation, ChunkRepresentation, Endianness, NATIVE_ENDIAN,
    },
    metadata::Metadata,
};

use super::{
    bytes_partial_decoder, has_endianness, reverse_endianness, BytesCodecConfiguration,
    BytesCodecConfigurationV1, IDENTIFIER,
};

/// A `bytes` codec implementation.
#[derive(Debug, Clone)]
pub struct BytesCodec {
    endian: Option<Endianness>,
}

impl Default for BytesCodec {
    fn default() -> Self {
        Self::new(Some(NATIVE_ENDIAN))
    }
}

impl BytesCodec {
    /// Create a new `bytes` codec.
    ///
    /// `endian` is optional because an 8-bit type has no endianness.
    #[must_use]
    pub const fn new(endian: Option<Endianness>) -> Self {
        Self { endian }
    }

    /// Create a new `bytes` codec for little endian data.
    #[must_use]
    pub const fn little() -> Self {
        Self::new(Some(Endianness::Little))
    }

    /// Create a new `bytes` codec for big endian data.
    #[must_use]
    pub const fn big() -> Self {
        Self::new(Some(Endianness::Big))
    }

    /// Create a new `bytes` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &BytesCodecConfiguration) -> Self {
        let BytesCodecConfiguration::V1(configuration) = configuration;
        Self::new(configuration.endian)
    }

    /// Returns the endianness of the codec.
    #[must_use]
    pub const fn endian(&self) -> Option<Endianness> {
        self.endian
    }

    fn validate(&self, decoded_representation: &ChunkRepresentation) -> Result<(), CodecError> {
        let data_type = *decoded_representation.data_type();
        if has_endianness(data_type) && self.endian.is_none() {
            Err(CodecError::Other(format!(
                "the bytes codec requires an endian for data type {data_type} with element size {}",
                data_type.size()
            )))
        } else {
            Ok(())
        }
    }

    fn do_encode_or_decode(
        &self,
        mut value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        self.validate(decoded_representation)?;
        let array_size = decoded_representation.size();
        if value.len() as u64 != array_size {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                value.len(),
                array_size,
            ));
        }
        if let Some(endian) = self.endian {
            if !endian.is_native() {
                reverse_endianness(&mut value, *decoded_representation.data_type());
            }
        }
        Ok(value)
    }
}

impl CodecTraits for BytesCodec {
    fn create_metadata(&self) -> Option<Metadata> {
        let configuration = BytesCodecConfigurationV1::new(self.endian);
        Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration).ok()
    }
}

impl ArrayCodecTraits for BytesCodec {
    fn encode(
        &self,
        decoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        self.do_encode_or_decode(decoded_value, decoded_representation)
    }

    fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        self.do_encode_or_decode(encoded_value, decoded_representation)
    }
}

impl ArrayToBytesCodecTraits for BytesCodec {
    fn partial_decoder<'a>(
        &'a self,
        input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Box<dyn ArrayPartialDecoderTraits + 'a>, CodecError> {
        self.validate(decoded_representation)?;
        Ok(Box::new(bytes_partial_decoder::BytesPartialDecoder::new(
            input_handle,
            decoded_representation.clone(),
            self.endian,
        )))
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        self.validate(decoded_representation)?;
        Ok(BytesRepresentation::FixedSize(decoded_representation.size()))
    }
}
