use crate::{
    array::ChunkRepresentation,
    array_subset::ArraySubset,
};

use super::{ArrayPartialDecoderTraits, ArrayToArrayCodecTraits, CodecError};

/// The default array-to-array partial decoder.
///
/// Decodes the entire chunk and extracts the requested array subsets.
/// Needed for codecs that change the element layout, where a decoded subset does not map to an encoded subset.
pub struct ArrayToArrayPartialDecoderDefault<'a> {
    input_handle: Box<dyn ArrayPartialDecoderTraits + 'a>,
    decoded_representation: ChunkRepresentation,
    codec: &'a dyn ArrayToArrayCodecTraits,
}

impl<'a> ArrayToArrayPartialDecoderDefault<'a> {
    /// Create a new [`ArrayToArrayPartialDecoderDefault`].
    #[must_use]
    pub fn new(
        input_handle: Box<dyn ArrayPartialDecoderTraits + 'a>,
        decoded_representation: ChunkRepresentation,
        codec: &'a dyn ArrayToArrayCodecTraits,
    ) -> Self {
        Self {
            input_handle,
            decoded_representation,
            codec,
        }
    }
}

impl ArrayPartialDecoderTraits for ArrayToArrayPartialDecoderDefault<'_> {
    fn partial_decode(&self, array_subsets: &[ArraySubset]) -> Result<Vec<Vec<u8>>, CodecError> {
        let encoded_representation = self
            .codec
            .compute_encoded_size(&self.decoded_representation)?;
        let encoded_subset = ArraySubset::new_with_shape(encoded_representation.shape_u64());
        let encoded_value = self
            .input_handle
            .partial_decode(&[encoded_subset])?
            .pop()
            .unwrap_or_default();
        let decoded_value = self
            .codec
            .decode(encoded_value, &self.decoded_representation)?;

        let shape = self.decoded_representation.shape_u64();
        let element_size = self.decoded_representation.element_size();
        array_subsets
            .iter()
            .map(|array_subset| {
                Ok(array_subset.extract_bytes(&decoded_value, &shape, element_size)?)
            })
            .collect()
    }
}
