use crate::{
    array::{
        codec::{ArrayPartialDecoderTraits, BytesPartialDecoderTraits, CodecError},
        ChunkRepresentation, Endianness,
    },
    array_subset::ArraySubset,
    byte_range::ByteRange,
    storage::StorageError,
};

use super::reverse_endianness;

/// Partial decoder for the `bytes` codec.
///
/// Only the byte ranges of the requested array subsets are read from the input,
/// plus the (normally empty) tail past the end of the chunk to check the encoded size.
pub struct BytesPartialDecoder<'a> {
    input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
    decoded_representation: ChunkRepresentation,
    endian: Option<Endianness>,
}

impl<'a> BytesPartialDecoder<'a> {
    /// Create a new partial decoder for the `bytes` codec.
    pub fn new(
        input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
        decoded_representation: ChunkRepresentation,
        endian: Option<Endianness>,
    ) -> Self {
        Self {
            input_handle,
            decoded_representation,
            endian,
        }
    }
}

impl ArrayPartialDecoderTraits for BytesPartialDecoder<'_> {
    fn partial_decode(&self, decoded_regions: &[ArraySubset]) -> Result<Vec<Vec<u8>>, CodecError> {
        let chunk_shape = self.decoded_representation.shape_u64();
        let chunk_size = self.decoded_representation.size();
        let mut bytes = Vec::with_capacity(decoded_regions.len());
        for array_subset in decoded_regions {
            let mut byte_ranges = array_subset
                .byte_ranges(&chunk_shape, self.decoded_representation.element_size())?;
            byte_ranges.push(ByteRange::FromStart(chunk_size, None));

            let decoded = self
                .input_handle
                .partial_decode(&byte_ranges)
                .map_err(|err| size_mismatch_to_corrupt(err, chunk_size))?
                .map(|mut decoded| match decoded.pop() {
                    Some(tail) if tail.is_empty() => Ok(decoded),
                    Some(tail) => Err(CodecError::CorruptData(format!(
                        "encoded chunk has {} bytes, expected {chunk_size}",
                        chunk_size + tail.len() as u64
                    ))),
                    None => Err(CodecError::from("the partial decoder returned no output")),
                })
                .transpose()?;

            let bytes_subset = decoded.map_or_else(
                || {
                    self.decoded_representation
                        .fill_value()
                        .repeat(array_subset.num_elements_usize())
                },
                |decoded| {
                    let mut bytes_subset = decoded.concat();
                    if let Some(endian) = self.endian {
                        if !endian.is_native() {
                            reverse_endianness(
                                &mut bytes_subset,
                                *self.decoded_representation.data_type(),
                            );
                        }
                    }
                    bytes_subset
                },
            );

            bytes.push(bytes_subset);
        }
        Ok(bytes)
    }
}

/// The encoded chunk is shorter than the chunk.
fn size_mismatch_to_corrupt(err: CodecError, chunk_size: u64) -> CodecError {
    match err {
        CodecError::InvalidByteRangeError(err)
        | CodecError::StorageError(StorageError::InvalidByteRangeError(err)) => {
            CodecError::CorruptData(format!("encoded chunk is smaller than {chunk_size} bytes: {err}"))
        }
        err => err,
    }
}
