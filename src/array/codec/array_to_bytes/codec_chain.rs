//! An array to bytes codec formed by joining an array to array sequence, an array to bytes codec, and a bytes to bytes sequence of codecs.

use crate::{
    array::{
        codec::{
            ArrayCodecTraits, ArrayPartialDecoderTraits, ArrayToArrayCodecTraits,
            ArrayToBytesCodecTraits, BytesPartialDecoderTraits, BytesToBytesCodecTraits, Codec,
            CodecError, CodecTraits,
        },
        BytesRepresentation, ChunkRepresentation,
    },
    array_subset::ArraySubset,
    metadata::Metadata,
    plugin::PluginCreateError,
};

/// A codec chain is a sequence of array to array codecs, one array to bytes codec, and a sequence of bytes to bytes codecs.
///
/// On encode the codecs are applied in order. On decode they are applied in reverse.
#[derive(Debug, Clone)]
pub struct CodecChain {
    array_to_array: Vec<Box<dyn ArrayToArrayCodecTraits>>,
    array_to_bytes: Box<dyn ArrayToBytesCodecTraits>,
    bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>>,
}

impl CodecChain {
    /// Create a new codec chain.
    #[must_use]
    pub fn new(
        array_to_array: Vec<Box<dyn ArrayToArrayCodecTraits>>,
        array_to_bytes: Box<dyn ArrayToBytesCodecTraits>,
        bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>>,
    ) -> Self {
        Self {
            array_to_array,
            array_to_bytes,
            bytes_to_bytes,
        }
    }

    /// Create a new codec chain from a list of metadata.
    ///
    /// # Errors
    /// Returns a [`PluginCreateError`] if:
    ///  - a codec could not be created,
    ///  - no array to bytes codec is supplied,
    ///  - more than one array to bytes codec is supplied, or
    ///  - the codecs are out of order (array to array, then array to bytes, then bytes to bytes).
    pub fn from_metadata(metadatas: &[Metadata]) -> Result<Self, PluginCreateError> {
        let mut array_to_array: Vec<Box<dyn ArrayToArrayCodecTraits>> = vec![];
        let mut array_to_bytes: Option<Box<dyn ArrayToBytesCodecTraits>> = None;
        let mut bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>> = vec![];
        for metadata in metadatas {
            match Codec::from_metadata(metadata)? {
                Codec::ArrayToArray(codec) => {
                    if array_to_bytes.is_some() {
                        return Err(PluginCreateError::Other(format!(
                            "array to array codec {} follows the array to bytes codec",
                            metadata.name()
                        )));
                    }
                    array_to_array.push(codec);
                }
                Codec::ArrayToBytes(codec) => {
                    if array_to_bytes.is_some() {
                        return Err("multiple array to bytes codecs".into());
                    }
                    array_to_bytes = Some(codec);
                }
                Codec::BytesToBytes(codec) => {
                    if array_to_bytes.is_none() {
                        return Err(PluginCreateError::Other(format!(
                            "bytes to bytes codec {} precedes the array to bytes codec",
                            metadata.name()
                        )));
                    }
                    bytes_to_bytes.push(codec);
                }
            }
        }

        array_to_bytes
            .map(|array_to_bytes| Self::new(array_to_array, array_to_bytes, bytes_to_bytes))
            .ok_or_else(|| "missing array to bytes codec".into())
    }

    /// Create codec chain metadata.
    #[must_use]
    pub fn create_metadatas(&self) -> Vec<Metadata> {
        let mut metadatas =
            Vec::with_capacity(self.array_to_array.len() + 1 + self.bytes_to_bytes.len());
        for codec in &self.array_to_array {
            if let Some(metadata) = codec.create_metadata() {
                metadatas.push(metadata);
            }
        }
        if let Some(metadata) = self.array_to_bytes.create_metadata() {
            metadatas.push(metadata);
        }
        for codec in &self.bytes_to_bytes {
            if let Some(metadata) = codec.create_metadata() {
                metadatas.push(metadata);
            }
        }
        metadatas
    }

    /// Get the array to array codecs.
    #[must_use]
    pub fn array_to_array_codecs(&self) -> &[Box<dyn ArrayToArrayCodecTraits>] {
        &self.array_to_array
    }

    /// Get the array to bytes codec.
    #[allow(clippy::borrowed_box)]
    #[must_use]
    pub fn array_to_bytes_codec(&self) -> &Box<dyn ArrayToBytesCodecTraits> {
        &self.array_to_bytes
    }

    /// Get the bytes to bytes codecs.
    #[must_use]
    pub fn bytes_to_bytes_codecs(&self) -> &[Box<dyn BytesToBytesCodecTraits>] {
        &self.bytes_to_bytes
    }

    /// The decoded representation of the chunk at the input of each array to array codec,
    /// followed by the representation at the input of the array to bytes codec.
    fn get_array_representations(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<ChunkRepresentation>, CodecError> {
        let mut array_representations = Vec::with_capacity(self.array_to_array.len() + 1);
        let mut representation = decoded_representation.clone();
        for codec in &self.array_to_array {
            let encoded_representation = codec.compute_encoded_size(&representation)?;
            array_representations.push(representation);
            representation = encoded_representation;
        }
        array_representations.push(representation);
        Ok(array_representations)
    }

    /// The representation of the bytes at the input of each bytes to bytes codec, followed by the encoded representation.
    fn get_bytes_representations(
        &self,
        array_representation_last: &ChunkRepresentation,
    ) -> Result<Vec<BytesRepresentation>, CodecError> {
        let mut bytes_representations = Vec::with_capacity(self.bytes_to_bytes.len() + 1);
        let mut representation = self
            .array_to_bytes
            .compute_encoded_size(array_representation_last)?;
        bytes_representations.push(representation);
        for codec in &self.bytes_to_bytes {
            representation = codec.compute_encoded_size(&representation);
            bytes_representations.push(representation);
        }
        Ok(bytes_representations)
    }
}

impl CodecTraits for CodecChain {
    /// A codec chain has no metadata of its own, see [`CodecChain::create_metadatas`].
    fn create_metadata(&self) -> Option<Metadata> {
        None
    }
}

impl ArrayCodecTraits for CodecChain {
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

        let mut value = decoded_value;
        let mut decoded_representation = decoded_representation.clone();

        // array->array
        for codec in &self.array_to_array {
            value = codec.encode(value, &decoded_representation)?;
            decoded_representation = codec.compute_encoded_size(&decoded_representation)?;
        }

        // array->bytes
        value = self.array_to_bytes.encode(value, &decoded_representation)?;

        // bytes->bytes
        for codec in &self.bytes_to_bytes {
            value = codec.encode(value)?;
        }

        Ok(value)
    }

    fn decode(
        &self,
        mut encoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        let array_representations = self.get_array_representations(decoded_representation)?;
        let Some(array_representation_last) = array_representations.last() else {
            unreachable!("there is always an array to bytes representation")
        };
        let bytes_representations = self.get_bytes_representations(array_representation_last)?;

        // bytes->bytes
        for (codec, bytes_representation) in std::iter::zip(
            self.bytes_to_bytes.iter().rev(),
            bytes_representations.iter().rev().skip(1),
        ) {
            encoded_value = codec.decode(encoded_value, bytes_representation)?;
        }

        // bytes->array
        encoded_value = self
            .array_to_bytes
            .decode(encoded_value, array_representation_last)?;

        // array->array
        for (codec, array_representation) in std::iter::zip(
            self.array_to_array.iter().rev(),
            array_representations.iter().rev().skip(1),
        ) {
            encoded_value = codec.decode(encoded_value, array_representation)?;
        }

        if encoded_value.len() as u64 != decoded_representation.size() {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                encoded_value.len(),
                decoded_representation.size(),
            ));
        }

        Ok(encoded_value)
    }
}

impl ArrayToBytesCodecTraits for CodecChain {
    fn partial_decoder<'a>(
        &'a self,
        mut input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Box<dyn ArrayPartialDecoderTraits + 'a>, CodecError> {
        let array_representations = self.get_array_representations(decoded_representation)?;
        let Some(array_representation_last) = array_representations.last() else {
            unreachable!("there is always an array to bytes representation")
        };
        let bytes_representations = self.get_bytes_representations(array_representation_last)?;

        for (codec, bytes_representation) in std::iter::zip(
            self.bytes_to_bytes.iter().rev(),
            bytes_representations.iter().rev().skip(1),
        ) {
            input_handle = codec.partial_decoder(input_handle, bytes_representation)?;
        }

        let mut input_handle = self
            .array_to_bytes
            .partial_decoder(input_handle, array_representation_last)?;

        for (codec, array_representation) in std::iter::zip(
            self.array_to_array.iter().rev(),
            array_representations.iter().rev().skip(1),
        ) {
            input_handle = codec.partial_decoder(input_handle, array_representation)?;
        }

        Ok(input_handle)
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        let array_representations = self.get_array_representations(decoded_representation)?;
        let Some(array_representation_last) = array_representations.last() else {
            unreachable!("there is always an array to bytes representation")
        };
        let bytes_representations = self.get_bytes_representations(array_representation_last)?;
        Ok(*bytes_representations
            .last()
            .unwrap_or(&BytesRepresentation::UnboundedSize))
    }

    /// A chain with only an array to bytes codec defers to the partial encoder of that codec (e.g. sharding).
    fn partial_encode(
        &self,
        encoded_value: Option<Vec<u8>>,
        decoded_representation: &ChunkRepresentation,
        array_subset: &ArraySubset,
        subset_bytes: &[u8],
    ) -> Result<Option<Vec<u8>>, CodecError> {
        if self.array_to_array.is_empty() && self.bytes_to_bytes.is_empty() {
            return self.array_to_bytes.partial_encode(
                encoded_value,
                decoded_representation,
                array_subset,
                subset_bytes,
            );
        }

        let mut decoded_value = match encoded_value {
            Some(encoded_value) => self.decode(encoded_value, decoded_representation)?,
            None => decoded_representation.fill_value_bytes(),
        };
        array_subset.store_bytes(
            subset_bytes,
            &mut decoded_value,
            &decoded_representation.shape_u64(),
            decoded_representation.element_size(),
        )?;
        if decoded_representation
            .fill_value()
            .equals_all(&decoded_value)
        {
            Ok(None)
        } else {
            Ok(Some(self.encode(decoded_value, decoded_representation)?))
        }
    }
}
