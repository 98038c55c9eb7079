use crate::{
    array::{
        codec::{
            ArrayCodecTraits, ArrayPartialDecoderTraits, ArrayToArrayCodecTraits,
            ArrayToArrayPartialDecoderDefault, CodecError, CodecTraits,
        },
        ChunkRepresentation, ChunkShape,
    },
    metadata::Metadata,
};

use super::{
    inverse_permutation, permute, transpose_array, TransposeCodecConfiguration,
    TransposeCodecConfigurationV1, TransposeOrder, IDENTIFIER,
};

/// A `transpose` codec implementation.
#[derive(Clone, Debug)]
pub struct TransposeCodec {
    order: TransposeOrder,
}

impl TransposeCodec {
    /// Create a new `transpose` codec from configuration.
    #[must_use]
    pub fn new_with_configuration(configuration: &TransposeCodecConfiguration) -> Self {
        let TransposeCodecConfiguration::V1(configuration) = configuration;
        Self::new(configuration.order.clone())
    }

    /// Create a new `transpose` codec.
    #[must_use]
    pub const fn new(order: TransposeOrder) -> Self {
        Self { order }
    }

    /// Return the transpose order.
    #[must_use]
    pub const fn order(&self) -> &TransposeOrder {
        &self.order
    }

    fn permutation(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<usize>, CodecError> {
        self.order
            .permutation(decoded_representation.dimensionality())
            .ok_or_else(|| {
                CodecError::Other(format!(
                    "transpose order {:?} is incompatible with a chunk of dimensionality {}",
                    self.order,
                    decoded_representation.dimensionality()
                ))
            })
    }
}

impl CodecTraits for TransposeCodec {
    fn create_metadata(&self) -> Option<Metadata> {
        let configuration = TransposeCodecConfigurationV1::new(self.order.clone());
        Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration).ok()
    }
}

impl ArrayCodecTraits for TransposeCodec {
    fn encode(
        &self,
        decoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        if decoded_value.len() as u64 != decoded_representation.size() {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                decoded_value.len(),
                decoded_representation.size(),
            ));
        }
        let permutation = self.permutation(decoded_representation)?;
        transpose_array(
            &permutation,
            &decoded_representation.shape_u64(),
            decoded_representation.element_size(),
            &decoded_value,
        )
    }

    fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        if encoded_value.len() as u64 != decoded_representation.size() {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                encoded_value.len(),
                decoded_representation.size(),
            ));
        }
        let permutation = self.permutation(decoded_representation)?;
        let transposed_shape = permute(&decoded_representation.shape_u64(), &permutation);
        transpose_array(
            &inverse_permutation(&permutation),
            &transposed_shape,
            decoded_representation.element_size(),
            &encoded_value,
        )
    }
}

impl ArrayToArrayCodecTraits for TransposeCodec {
    fn partial_decoder<'a>(
        &'a self,
        input_handle: Box<dyn ArrayPartialDecoderTraits + 'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Box<dyn ArrayPartialDecoderTraits + 'a>, CodecError> {
        self.permutation(decoded_representation)?;
        Ok(Box::new(ArrayToArrayPartialDecoderDefault::new(
            input_handle,
            decoded_representation.clone(),
            self,
        )))
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ChunkRepresentation, CodecError> {
        let permutation = self.permutation(decoded_representation)?;
        let transposed_shape: ChunkShape =
            permute(decoded_representation.shape(), &permutation).into();
        ChunkRepresentation::new(
            transposed_shape,
            *decoded_representation.data_type(),
            decoded_representation.fill_value().clone(),
        )
        .map_err(|err| CodecError::Other(err.to_string()))
    }
}
